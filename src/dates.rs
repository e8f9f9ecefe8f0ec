use std::path::Path;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::dimension::ID_COLUMN;
use crate::outcome::Diagnostics;
use crate::settings::ProjectSettings;
use crate::table::load_table;

pub const VERSION_FILE: &str = "VersionMaster.csv";
const DEFAULT_YEAR: i32 = 2025;

/// Ordered, gap-free sequence of `YYYYMM` tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DateRange(Vec<String>);

impl DateRange {
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `first - last` for display.
    pub fn label(&self) -> String {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => format!("{first} - {last}"),
            _ => "(empty)".to_string(),
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// January through December of the fallback year.
pub fn default_range() -> DateRange {
    DateRange((1..=12).map(|m| format!("{DEFAULT_YEAR}{m:02}")).collect())
}

/// Parse a `YYYYMM` token to the first day of that month.
pub fn parse_period(token: &str) -> Option<NaiveDate> {
    let token = token.trim();
    if token.len() != 6 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = token[..4].parse().ok()?;
    let month: u32 = token[4..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Inclusive month-by-month expansion. `None` when either token is malformed
/// or the start falls after the end.
pub fn expand_range(start: &str, end: &str) -> Option<DateRange> {
    let start = parse_period(start)?;
    let end = parse_period(end)?;
    if start > end {
        return None;
    }
    let mut tokens = Vec::new();
    let mut current = start;
    while current <= end {
        tokens.push(format!("{:04}{:02}", current.year(), current.month()));
        current = current.checked_add_months(Months::new(1))?;
    }
    Some(DateRange(tokens))
}

/// Manual override, then the version table, then the default year. Never fails;
/// every fallback is recorded in `diag`.
pub fn resolve_date_range(
    settings: &ProjectSettings,
    downloads_dir: &Path,
    diag: &mut Diagnostics,
) -> DateRange {
    if let Some(manual) = &settings.date_range {
        let (start, end) = (manual.start_month.trim(), manual.end_month.trim());
        if !start.is_empty() && !end.is_empty() {
            return match expand_range(start, end) {
                Some(range) => {
                    tracing::info!(range = %range.label(), "using manual date range");
                    range
                }
                None => {
                    diag.warn(format!(
                        "Invalid manual date range {start} - {end}, using default date range"
                    ));
                    default_range()
                }
            };
        }
    }

    match version_range(settings, downloads_dir) {
        Ok(range) => {
            tracing::info!(range = %range.label(), "date range from version");
            range
        }
        Err(reason) => {
            diag.warn(format!("{reason}, using default date range"));
            default_range()
        }
    }
}

fn version_range(settings: &ProjectSettings, downloads_dir: &Path) -> Result<DateRange, String> {
    let path = downloads_dir.join(VERSION_FILE);
    if !path.is_file() {
        return Err(format!("{VERSION_FILE} not found"));
    }
    let table = load_table(&path).map_err(|e| format!("Could not read {VERSION_FILE}: {e}"))?;

    if table.is_empty() {
        return Err(format!("{VERSION_FILE} has no rows"));
    }
    let version_id = settings.version.version_id.trim();
    let (start_col, end_col) = (settings.version.start_column(), settings.version.end_column());
    if !table.has_column(ID_COLUMN) {
        return Err(format!("{VERSION_FILE} has no {ID_COLUMN} column"));
    }
    if !table.has_column(start_col) || !table.has_column(end_col) {
        return Err(format!(
            "Columns '{start_col}' or '{end_col}' not found in {VERSION_FILE} (available: {})",
            table.headers.join(", ")
        ));
    }
    let row = table
        .find_row(ID_COLUMN, version_id)
        .ok_or_else(|| format!("Version '{version_id}' not found"))?;

    let value = |col: &str| {
        table
            .column_index(col)
            .and_then(|i| row.get(i))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };
    let (start, end) = (value(start_col), value(end_col));
    expand_range(&start, &end)
        .ok_or_else(|| format!("Invalid version dates {start} - {end} for '{version_id}'"))
}
