use std::path::Path;

use crate::error::{GeneratorError, Result};

/// In-memory delimited table. Every cell is kept as text so coded identifiers
/// with leading zeros survive; an empty cell stands for a missing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// First row whose `key_column` equals `key`.
    pub fn find_row(&self, key_column: &str, key: &str) -> Option<&[String]> {
        let idx = self.column_index(key_column)?;
        self.rows
            .iter()
            .find(|row| row.get(idx).map(String::as_str) == Some(key))
            .map(Vec::as_slice)
    }
}

/// Decode raw bytes: UTF-8 first (BOM stripped), Latin-1 as the fallback.
pub fn decode(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.trim_start_matches('\u{feff}').to_string(), false),
        Err(_) => (bytes.iter().map(|&b| b as char).collect(), true),
    }
}

pub fn load_table(path: &Path) -> Result<Table> {
    if !path.is_file() {
        return Err(GeneratorError::Csv(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| GeneratorError::Csv(format!("Cannot read {}: {e}", path.display())))?;
    let (text, fallback) = decode(&bytes);
    if fallback {
        tracing::warn!(path = %path.display(), "UTF-8 decode failed, read as latin-1");
    }
    if text.trim().is_empty() {
        return Err(GeneratorError::Csv(format!(
            "CSV file is empty: {}",
            path.display()
        )));
    }
    let table = parse_table(&text)
        .map_err(|e| GeneratorError::Csv(format!("CSV parsing error in {}: {e}", path.display())))?;
    tracing::debug!(
        path = %path.display(),
        rows = table.len(),
        cols = table.headers.len(),
        "loaded table"
    );
    Ok(table)
}

fn parse_table(text: &str) -> std::result::Result<Table, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .escape(Some(b'\\'))
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_load_keeps_codes_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.csv", b"ID,Description\n00042,Leading zeros\n1.50,Decimal\n");
        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["ID", "Description"]);
        assert_eq!(table.rows[0][0], "00042");
        assert_eq!(table.rows[1][0], "1.50");
    }

    #[test]
    fn test_load_strips_bom_and_handles_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.csv",
            "\u{feff}ID,Description\nA,\"Sales, North\"\nB,\"Say \\\"hi\\\"\"\n".as_bytes(),
        );
        let table = load_table(&path).unwrap();
        assert_eq!(table.headers[0], "ID");
        assert_eq!(table.rows[0][1], "Sales, North");
        assert_eq!(table.rows[1][1], "Say \"hi\"");
    }

    #[test]
    fn test_latin1_fallback() {
        let dir = tempfile::tempdir().unwrap();
        // "Café" with 0xE9 as a single latin-1 byte
        let path = write(dir.path(), "a.csv", b"ID,Description\nC1,Caf\xe9\n");
        let table = load_table(&path).unwrap();
        assert_eq!(table.rows[0][1], "Café");
    }

    #[test]
    fn test_missing_and_empty_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_table(&dir.path().join("none.csv")),
            Err(GeneratorError::Csv(_))
        ));
        let path = write(dir.path(), "empty.csv", b"  \n");
        let err = load_table(&path).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_ragged_rows_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.csv", b"ID,Description\nA,One,Extra\n");
        assert!(matches!(load_table(&path), Err(GeneratorError::Csv(_))));
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "h.csv", b"ID,Description\n");
        let table = load_table(&path).unwrap();
        assert!(table.is_empty());
        assert!(table.has_column("Description"));
    }

    #[test]
    fn test_find_row_and_column_values() {
        let table = Table {
            headers: vec!["ID".into(), "StartMonth".into()],
            rows: vec![
                vec!["public.Actual".into(), "202401".into()],
                vec!["public.RF_CURRENT".into(), "202503".into()],
            ],
        };
        let row = table.find_row("ID", "public.RF_CURRENT").unwrap();
        assert_eq!(row[1], "202503");
        assert!(table.find_row("ID", "nope").is_none());
        assert_eq!(table.column_values("StartMonth").unwrap(), vec!["202401", "202503"]);
        assert!(table.column_values("Missing").is_none());
    }
}
