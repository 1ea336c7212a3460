//! In-memory numeric tables read from CSV files.

use std::path::Path;

/// Column-named table of numeric cells. Empty or non-numeric cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl Table {
    /// Table with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Self {
        Self { columns, rows }
    }

    /// Read a CSV file with a header row
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path.as_ref())?;
        Self::from_csv_reader(reader)
    }

    pub fn from_csv_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self, csv::Error> {
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = (0..columns.len())
                .map(|i| record.get(i).and_then(parse_cell))
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_header(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All cells of a column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Numeric columns: at least one cell parsed as a number
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.rows.iter().any(|row| row[*idx].is_some()))
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Column pairs `(x, y)` for rows where both cells are present.
    ///
    /// If `x` is `None` or not a column, the row index is used as x.
    pub fn series(&self, x: Option<&str>, y: &str) -> Vec<(f64, f64)> {
        let Some(y_idx) = self.column_index(y) else {
            return Vec::new();
        };
        let x_idx = x.and_then(|name| self.column_index(name));

        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let xv = match x_idx {
                    Some(idx) => row[idx]?,
                    None => i as f64,
                };
                Some((xv, row[y_idx]?))
            })
            .collect()
    }

    /// Rows where `column` equals `value`
    pub fn filter_eq(&self, column: &str, value: f64) -> Table {
        let Some(idx) = self.column_index(column) else {
            return Table::empty();
        };
        let rows = self
            .rows
            .iter()
            .filter(|row| row[idx] == Some(value))
            .cloned()
            .collect();
        Table::new(self.columns.clone(), rows)
    }

    /// Distinct values of a column, in first-seen order
    pub fn distinct(&self, column: &str) -> Vec<f64> {
        let mut values: Vec<f64> = Vec::new();
        if let Some(cells) = self.column(column) {
            for v in cells.into_iter().flatten() {
                if !values.contains(&v) {
                    values.push(v);
                }
            }
        }
        values
    }
}

fn parse_cell(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => Some(1.0),
        "false" => Some(0.0),
        _ => raw.parse::<f64>().ok().filter(|v| !v.is_nan()),
    }
}
