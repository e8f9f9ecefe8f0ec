use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::{
    Color, DataValidation, Format, FormatAlign, FormatBorder, Formula, Table, TableColumn,
    TableStyle, Workbook, Worksheet,
};

use crate::dates::DateRange;
use crate::error::{GeneratorError, Result};
use crate::models::DimensionDataset;
use crate::settings::Palette;

pub const UPLOAD_SHEET: &str = "Upload_to_SAC";
pub const MAX_SHEET_NAME: usize = 31;
const MAX_COLUMNS: usize = 16_384;

const DIM_WIDTH: f64 = 18.0;
const DATE_WIDTH: f64 = 10.0;
const TITLE_FILL: u32 = 0xA9D08E;
const LOOKUP_HEADER_FILL: u32 = 0xC6E0B4;

/// One dimension column of a template with its resolved lookup data.
pub struct LookupColumn<'a> {
    pub name: &'a str,
    pub table_name: String,
    pub dataset: &'a DimensionDataset,
}

pub struct WorkbookLayout<'a> {
    pub columns: Vec<LookupColumn<'a>>,
    pub dates: &'a DateRange,
    pub data_rows: u32,
    pub palette: &'a Palette,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sheet names may not contain `[]:*?/\` and are capped at 31 characters.
pub fn sheet_name(column: &str) -> String {
    column
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect()
}

/// Sheet name for `column` that no earlier sheet uses. Names compare
/// case-insensitively; a clash gets a numeric suffix inside the length cap.
pub fn unique_sheet_name(column: &str, used: &mut HashSet<String>) -> String {
    let base = sheet_name(column);
    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!("_{n}");
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        candidate = base.chars().take(keep).chain(suffix.chars()).collect();
        n += 1;
    }
    if candidate != base {
        tracing::info!(column, sheet = %candidate, "renamed clashing sheet");
    }
    used.insert(candidate.to_lowercase());
    candidate
}

/// Dynamic reference to a lookup table's ID column, so edits to the table
/// flow into the dropdown.
pub fn validation_formula(table_name: &str) -> String {
    format!("INDIRECT(\"{table_name}[ID]\")")
}

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_color(hex: &str) -> Option<Color> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(Color::RGB)
}

fn palette_color(configured: &str, fallback: &str) -> Color {
    parse_color(configured).unwrap_or_else(|| {
        tracing::warn!(color = configured, "invalid color, using default");
        parse_color(fallback).unwrap_or(Color::White)
    })
}

struct UploadStyles {
    dim_header: Format,
    dim_header_edge: Format,
    date_header: Format,
    dim_cell: Format,
    dim_cell_edge: Format,
    date_cell: Format,
}

impl UploadStyles {
    fn new(palette: &Palette) -> Self {
        let defaults = Palette::default();
        let dim_header = palette_color(&palette.dim_header, &defaults.dim_header);
        let date_header = palette_color(&palette.date_header, &defaults.date_header);
        let dim_cell = palette_color(&palette.dim_cell, &defaults.dim_cell);

        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin);
        let body = Format::new().set_border(FormatBorder::Thin);

        Self {
            dim_header: header.clone().set_background_color(dim_header),
            dim_header_edge: header
                .clone()
                .set_background_color(dim_header)
                .set_border_right(FormatBorder::Thick),
            date_header: header.set_background_color(date_header),
            dim_cell: body.clone().set_background_color(dim_cell),
            dim_cell_edge: body
                .clone()
                .set_background_color(dim_cell)
                .set_border_right(FormatBorder::Thick),
            date_cell: body,
        }
    }

    fn header(&self, col: usize, dim_count: usize) -> &Format {
        match col {
            c if c + 1 == dim_count => &self.dim_header_edge,
            c if c < dim_count => &self.dim_header,
            _ => &self.date_header,
        }
    }

    fn body(&self, col: usize, dim_count: usize) -> &Format {
        match col {
            c if c + 1 == dim_count => &self.dim_cell_edge,
            c if c < dim_count => &self.dim_cell,
            _ => &self.date_cell,
        }
    }
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

fn upload_sheet(layout: &WorkbookLayout) -> Result<Worksheet> {
    let mut ws = Worksheet::new();
    ws.set_name(UPLOAD_SHEET)?;

    let headers: Vec<&str> = layout
        .columns
        .iter()
        .map(|c| c.name)
        .chain(layout.dates.tokens().iter().map(String::as_str))
        .collect();
    if layout.dates.is_empty() {
        return Err(GeneratorError::Workbook("Date range is empty".to_string()));
    }
    if headers.len() > MAX_COLUMNS {
        return Err(GeneratorError::Workbook(format!(
            "Upload sheet needs {} columns, more than the {MAX_COLUMNS} a sheet allows",
            headers.len()
        )));
    }
    let dim_count = layout.columns.len();
    let styles = UploadStyles::new(layout.palette);

    for (c, header) in headers.iter().enumerate() {
        let col = c as u16;
        ws.write_string_with_format(0, col, *header, styles.header(c, dim_count))?;
        ws.set_column_width(col, if c < dim_count { DIM_WIDTH } else { DATE_WIDTH })?;
    }
    for row in 1..=layout.data_rows {
        for c in 0..headers.len() {
            ws.write_blank(row, c as u16, styles.body(c, dim_count))?;
        }
    }

    if layout.data_rows > 0 {
        for (c, column) in layout.columns.iter().enumerate() {
            let validation = DataValidation::new()
                .allow_list_formula(Formula::new(validation_formula(&column.table_name)))
                .ignore_blank(true)
                .set_input_message(format!("Select {}", column.name))?
                .set_error_message(format!("Please select a valid {}", column.name))?;
            ws.add_data_validation(1, c as u16, layout.data_rows, c as u16, &validation)?;
        }
    }
    Ok(ws)
}

fn lookup_sheet(column: &LookupColumn, sheet: &str) -> Result<Worksheet> {
    let mut ws = Worksheet::new();
    ws.set_name(sheet)?;

    let title = Format::new()
        .set_bold()
        .set_font_size(12)
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(TITLE_FILL));
    ws.merge_range(0, 0, 0, 1, column.name, &title)?;

    for (i, member) in column.dataset.members.iter().enumerate() {
        let row = 2 + i as u32;
        ws.write_string(row, 0, &member.description)?;
        ws.write_string(row, 1, &member.id)?;
    }
    ws.set_column_width(0, 40)?;
    ws.set_column_width(1, 30)?;

    // An empty dataset still gets one blank body row so the table, and the
    // dropdown referencing it, resolve to an empty list.
    let body_rows = column.dataset.len().max(1) as u32;
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(LOOKUP_HEADER_FILL));
    let table = Table::new()
        .set_name(&column.table_name)
        .set_style(TableStyle::Light9)
        .set_columns(&[
            TableColumn::new().set_header("Description"),
            TableColumn::new().set_header("ID"),
        ]);
    ws.add_table(1, 0, 1 + body_rows, 1, &table)?;
    ws.write_string_with_format(1, 0, "Description", &header_format)?;
    ws.write_string_with_format(1, 1, "ID", &header_format)?;
    Ok(ws)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Build the workbook and serialize it to XLSX bytes.
pub fn render_workbook(layout: &WorkbookLayout) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    workbook.push_worksheet(upload_sheet(layout)?);
    let mut used = HashSet::from([UPLOAD_SHEET.to_lowercase()]);
    for column in &layout.columns {
        let sheet = unique_sheet_name(column.name, &mut used);
        workbook.push_worksheet(lookup_sheet(column, &sheet)?);
    }
    let bytes = workbook.save_to_buffer()?;
    tracing::debug!(bytes = bytes.len(), sheets = layout.columns.len() + 1, "rendered workbook");
    Ok(bytes)
}

pub fn write_workbook(bytes: &[u8], path: &Path) -> Result<()> {
    let save_error = |e: std::io::Error| {
        let hint = if e.kind() == std::io::ErrorKind::PermissionDenied {
            " - file may be open in Excel"
        } else {
            ""
        };
        GeneratorError::Workbook(format!("Cannot save {}{hint}: {e}", path.display()))
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(save_error)?;
    }
    std::fs::write(path, bytes).map_err(save_error)?;
    tracing::info!(path = %path.display(), "saved workbook");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use calamine::{Reader, Xlsx};

    use super::*;
    use crate::dates::expand_range;
    use crate::models::MemberRecord;

    fn dataset(ids: &[(&str, &str)]) -> DimensionDataset {
        DimensionDataset {
            members: ids
                .iter()
                .map(|(id, desc)| MemberRecord {
                    id: id.to_string(),
                    description: desc.to_string(),
                })
                .collect(),
        }
    }

    fn open(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
        Xlsx::new(Cursor::new(bytes)).unwrap()
    }

    fn part_xml(bytes: &[u8], part: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut xml = String::new();
        archive.by_name(part).unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_sheet_name_sanitized_and_truncated() {
        assert_eq!(sheet_name("G/L Account"), "G_L Account");
        let long = "A very long dimension name that exceeds the limit";
        assert_eq!(sheet_name(long).chars().count(), 31);
        assert_eq!(sheet_name(long), "A very long dimension name that");
    }

    #[test]
    fn test_validation_formula_is_indirect() {
        assert_eq!(validation_formula("tbl_entity"), "INDIRECT(\"tbl_entity[ID]\")");
    }

    #[test]
    fn test_unique_sheet_name_resolves_clashes() {
        let mut used = HashSet::from([UPLOAD_SHEET.to_lowercase()]);
        let north = unique_sheet_name("Profit Center Standard Hierarchy North", &mut used);
        let south = unique_sheet_name("Profit Center Standard Hierarchy South", &mut used);
        assert_eq!(north, "Profit Center Standard Hierarch");
        assert_eq!(south, "Profit Center Standard Hierar_2");
        assert_eq!(unique_sheet_name("Entity", &mut used), "Entity");
        assert_eq!(unique_sheet_name("ENTITY", &mut used), "ENTITY_2");
        assert_eq!(unique_sheet_name("entity", &mut used), "entity_3");
        assert_eq!(unique_sheet_name("Upload_to_SAC", &mut used), "Upload_to_SAC_2");
        for name in [&north, &south] {
            assert!(name.chars().count() <= MAX_SHEET_NAME);
        }
    }

    #[test]
    fn test_parse_color() {
        assert!(matches!(parse_color("#C6E0B4"), Some(Color::RGB(0xC6E0B4))));
        assert!(matches!(parse_color("bdd7ee"), Some(Color::RGB(0xBDD7EE))));
        assert!(parse_color("green").is_none());
        assert!(parse_color("#FFF").is_none());
    }

    #[test]
    fn test_render_upload_header_and_lookup_tables() {
        let entity = dataset(&[("E100", "Germany"), ("E200", "France")]);
        let account = dataset(&[("0042", "Travel")]);
        let dates = expand_range("202501", "202503").unwrap();
        let palette = Palette::default();
        let layout = WorkbookLayout {
            columns: vec![
                LookupColumn {
                    name: "Entity",
                    table_name: "tbl_entity".into(),
                    dataset: &entity,
                },
                LookupColumn {
                    name: "Account",
                    table_name: "tbl_account".into(),
                    dataset: &account,
                },
            ],
            dates: &dates,
            data_rows: 10,
            palette: &palette,
        };
        let mut wb = open(render_workbook(&layout).unwrap());
        assert_eq!(wb.sheet_names(), vec!["Upload_to_SAC", "Entity", "Account"]);

        let upload = wb.worksheet_range(UPLOAD_SHEET).unwrap();
        let header: Vec<String> = upload.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header, vec!["Entity", "Account", "202501", "202502", "202503"]);

        let lookup = wb.worksheet_range("Account").unwrap();
        let cell = |r: u32, c: u32| lookup.get_value((r, c)).map(|v| v.to_string()).unwrap_or_default();
        assert_eq!(cell(0, 0), "Account");
        assert_eq!(cell(1, 0), "Description");
        assert_eq!(cell(1, 1), "ID");
        assert_eq!(cell(2, 1), "0042");

        wb.load_tables().unwrap();
        let table = wb.table_by_name("tbl_entity").unwrap();
        assert_eq!(table.sheet_name(), "Entity");
        assert_eq!(table.columns(), ["Description", "ID"]);
        let table = wb.table_by_name("tbl_account").unwrap();
        assert_eq!(table.sheet_name(), "Account");
        assert_eq!(table.columns()[1], "ID");
    }

    #[test]
    fn test_render_clashing_sheet_names() {
        let data = dataset(&[("X1", "One")]);
        let dates = expand_range("202501", "202501").unwrap();
        let palette = Palette::default();
        let names = [
            "Profit Center Standard Hierarchy North",
            "Profit Center Standard Hierarchy South",
            "Entity",
            "ENTITY",
            "Upload_to_SAC",
        ];
        let layout = WorkbookLayout {
            columns: names
                .iter()
                .enumerate()
                .map(|(i, &name)| LookupColumn {
                    name,
                    table_name: format!("tbl_dim{i}"),
                    dataset: &data,
                })
                .collect(),
            dates: &dates,
            data_rows: 2,
            palette: &palette,
        };
        let wb = open(render_workbook(&layout).unwrap());
        assert_eq!(
            wb.sheet_names(),
            vec![
                "Upload_to_SAC",
                "Profit Center Standard Hierarch",
                "Profit Center Standard Hierar_2",
                "Entity",
                "ENTITY_2",
                "Upload_to_SAC_2",
            ]
        );
    }

    #[test]
    fn test_upload_sheet_validation_and_styles() {
        let entity = dataset(&[("E100", "Germany")]);
        let account = dataset(&[("0042", "Travel")]);
        let dates = expand_range("202501", "202502").unwrap();
        let palette = Palette::default();
        let layout = WorkbookLayout {
            columns: vec![
                LookupColumn {
                    name: "Entity",
                    table_name: "tbl_entity".into(),
                    dataset: &entity,
                },
                LookupColumn {
                    name: "Account",
                    table_name: "tbl_account".into(),
                    dataset: &account,
                },
            ],
            dates: &dates,
            data_rows: 10,
            palette: &palette,
        };
        let bytes = render_workbook(&layout).unwrap();

        let sheet = part_xml(&bytes, "xl/worksheets/sheet1.xml");
        assert_eq!(sheet.matches("<dataValidation ").count(), 2);
        assert_eq!(sheet.matches("type=\"list\"").count(), 2);
        assert_eq!(sheet.matches("allowBlank=\"1\"").count(), 2);
        assert!(sheet.contains("sqref=\"A2:A11\""));
        assert!(sheet.contains("sqref=\"B2:B11\""));
        assert!(!sheet.contains("sqref=\"C2:C11\""));
        assert!(sheet.contains("prompt=\"Select Entity\""));
        assert!(sheet.contains("error=\"Please select a valid Account\""));
        assert!(sheet.contains("<formula1>INDIRECT("));
        assert!(sheet.contains("tbl_entity[ID]"));
        assert!(sheet.contains("tbl_account[ID]"));

        let styles = part_xml(&bytes, "xl/styles.xml");
        for fill in ["FFC6E0B4", "FFBDD7EE", "FFE2EFDA"] {
            assert!(styles.contains(fill), "missing fill {fill}");
        }
        assert!(styles.contains("style=\"thick\""));
    }

    #[test]
    fn test_empty_dataset_still_gets_table() {
        let empty = DimensionDataset::empty();
        let dates = expand_range("202501", "202501").unwrap();
        let palette = Palette::default();
        let layout = WorkbookLayout {
            columns: vec![LookupColumn {
                name: "Plant",
                table_name: "tbl_plant".into(),
                dataset: &empty,
            }],
            dates: &dates,
            data_rows: 5,
            palette: &palette,
        };
        let mut wb = open(render_workbook(&layout).unwrap());
        wb.load_tables().unwrap();
        assert_eq!(wb.table_names_in_sheet("Plant").len(), 1);
    }

    #[test]
    fn test_write_workbook_reports_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("output");
        std::fs::write(&blocker, "not a directory").unwrap();
        let err = write_workbook(b"data", &blocker.join("Opex.xlsx")).unwrap_err();
        assert!(matches!(err, GeneratorError::Workbook(_)));
    }

    #[test]
    fn test_write_workbook_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("Opex.xlsx");
        write_workbook(b"data", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
    }
}
