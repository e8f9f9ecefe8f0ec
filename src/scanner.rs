use serde::Serialize;

use crate::dates::VERSION_FILE;
use crate::dimension::find_parent_columns;
use crate::error::Result;
use crate::models::{Dimension, DimensionsDoc, FilterSpec};
use crate::store::ProjectStore;
use crate::table::load_table;

/// One source file in `downloads/` and the dimension it suggests.
#[derive(Debug, Clone, Serialize)]
pub struct ScannedFile {
    pub file: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub parent_columns: Vec<String>,
    pub suggestion: Option<Dimension>,
    pub error: Option<String>,
}

/// Strip the export suffix: `ENTITYMasterWithHierarchy.csv` -> `ENTITY`.
pub fn sac_name_from_file(file: &str) -> String {
    ["MasterWithHierarchy.csv", "Master.csv", ".csv"]
        .iter()
        .find_map(|suffix| file.strip_suffix(suffix))
        .unwrap_or(file)
        .to_string()
}

/// `COL_COST_CENTER` -> `Cost Center`.
pub fn display_name(sac_name: &str) -> String {
    let spaced = sac_name.replace("COL_", "").replace('_', " ");
    let mut out = String::with_capacity(spaced.len());
    let mut word_start = true;
    for c in spaced.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

pub fn suggested_table_name(sac_name: &str) -> String {
    format!("tbl_{}", sac_name.to_lowercase().replace("col_", ""))
}

pub fn suggest_dimension(file: &str) -> Dimension {
    let sac_name = sac_name_from_file(file);
    Dimension {
        name: display_name(&sac_name),
        table_name: Some(suggested_table_name(&sac_name)),
        has_hierarchy: file.contains("WithHierarchy"),
        sac_name,
        filters: FilterSpec::default(),
        extract_column: None,
        numeric_sort: false,
    }
}

/// Inspect every source CSV except the version table.
pub fn scan_sources(store: &ProjectStore) -> Result<Vec<ScannedFile>> {
    let mut scanned = Vec::new();
    for source in store.list_source_files()? {
        if source.name == VERSION_FILE {
            continue;
        }
        let entry = match load_table(&store.source_path(&source.name)) {
            Ok(table) => ScannedFile {
                rows: table.len(),
                parent_columns: find_parent_columns(&table.headers),
                columns: table.headers,
                suggestion: Some(suggest_dimension(&source.name)),
                error: None,
                file: source.name,
            },
            Err(e) => {
                tracing::warn!(file = %source.name, error = %e, "could not scan source file");
                ScannedFile {
                    rows: 0,
                    columns: Vec::new(),
                    parent_columns: Vec::new(),
                    suggestion: None,
                    error: Some(e.to_string()),
                    file: source.name,
                }
            }
        };
        scanned.push(entry);
    }
    Ok(scanned)
}

pub fn suggestions(scanned: &[ScannedFile]) -> DimensionsDoc {
    DimensionsDoc {
        dimensions: scanned.iter().filter_map(|s| s.suggestion.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sac_name_from_file() {
        assert_eq!(sac_name_from_file("ENTITYMasterWithHierarchy.csv"), "ENTITY");
        assert_eq!(sac_name_from_file("ACCOUNTMaster.csv"), "ACCOUNT");
        assert_eq!(sac_name_from_file("COL_PLANT.csv"), "COL_PLANT");
    }

    #[test]
    fn test_display_and_table_names() {
        assert_eq!(display_name("COL_COST_CENTER"), "Cost Center");
        assert_eq!(display_name("ENTITY"), "Entity");
        assert_eq!(suggested_table_name("COL_COST_CENTER"), "tbl_cost_center");
    }

    #[test]
    fn test_suggest_dimension_detects_hierarchy() {
        let d = suggest_dimension("COL_PROFIT_CENTERMasterWithHierarchy.csv");
        assert_eq!(d.name, "Profit Center");
        assert_eq!(d.sac_name, "COL_PROFIT_CENTER");
        assert!(d.has_hierarchy);
        assert_eq!(d.table_name(), "tbl_profit_center");
        assert!(!suggest_dimension("ACCOUNTMaster.csv").has_hierarchy);
    }

    #[test]
    fn test_scan_skips_version_and_reports_parents() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::create(dir.path(), "demo").unwrap();
        std::fs::write(
            store.source_path("ENTITYMasterWithHierarchy.csv"),
            "ID,Description,H1_PARENTID\nTOTAL,Total,\nE1,One,TOTAL\n",
        )
        .unwrap();
        std::fs::write(store.source_path(VERSION_FILE), "ID,StartMonth,EndMonth\n").unwrap();
        std::fs::write(store.source_path("EMPTY.csv"), "").unwrap();

        let scanned = scan_sources(&store).unwrap();
        assert_eq!(scanned.len(), 2);
        let empty = &scanned[0];
        assert_eq!(empty.file, "EMPTY.csv");
        assert!(empty.error.is_some());
        let entity = &scanned[1];
        assert_eq!(entity.rows, 2);
        assert_eq!(entity.parent_columns, vec!["H1_PARENTID"]);

        let doc = suggestions(&scanned);
        assert_eq!(doc.dimensions.len(), 1);
        assert_eq!(doc.dimensions[0].name, "Entity");
    }
}
