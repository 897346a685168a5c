//! In-memory tables and CSV output

use crate::error::ExtractorError;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Rectangular table with named columns
///
/// Rows are stored sparsely; a column a row does not set renders as an empty
/// cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexSet<String>,
    rows: Vec<IndexMap<String, Value>>,
}

impl Table {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row; unseen columns are added in first-seen order
    pub fn push_row(&mut self, row: IndexMap<String, Value>) {
        for key in row.keys() {
            if !self.columns.contains(key) {
                self.columns.insert(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Column names, in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, if set
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Cells of row `row` rendered as CSV text, in column order
    pub fn row_cells(&self, row: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| render_cell(self.cell(row, column)))
            .collect()
    }

    /// Write as CSV with a leading unnamed row-index column
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExtractorError> {
        let mut csv = csv::Writer::from_writer(writer);

        let mut header = vec![String::new()];
        header.extend(self.columns.iter().cloned());
        csv.write_record(&header)?;

        for index in 0..self.rows.len() {
            let mut record = vec![index.to_string()];
            record.extend(self.row_cells(index));
            csv.write_record(&record)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// CSV rendering as a string
    pub fn to_csv_string(&self) -> Result<String, ExtractorError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ExtractorError::JsonParse(e.to_string()))
    }

    /// Write the CSV rendering to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ExtractorError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}

/// Strings render verbatim, null and missing cells as empty, everything
/// else in its JSON form
fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
