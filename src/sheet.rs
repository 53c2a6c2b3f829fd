//! Tabular input for spreadsheet exports.
//!
//! Loads `.xlsx`/`.xls` worksheets and `.csv` files into a common [`Table`],
//! and writes filtered/merged tables back out as CSV.

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Reader, open_workbook_auto};

/// A single spreadsheet cell, normalized across input formats.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(chrono::NaiveDateTime),
}

impl Cell {
    /// Text content of the cell. Numbers render through Rust's shortest float
    /// formatting, datetimes as `YYYY-MM-DD HH:MM:SS`. Empty cells yield `None`.
    pub fn as_str(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.is_finite() => Some(n.to_string()),
            Cell::Number(_) => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// Numeric content. NaN and infinities sanitize to `None`, as do
    /// non-numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Non-negative integer content, truncated from the numeric value.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// A loaded worksheet or CSV file: one header row plus data rows.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Loads a table from `.xlsx`/`.xls` or `.csv`, selected by extension.
    ///
    /// `header_row` is the number of rows to skip before the header line; the
    /// influencer exports carry one banner row above their headers.
    pub fn load(path: &Path, header_row: usize) -> Result<Table> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Self::from_csv(path, header_row),
            _ => Self::from_workbook(path, header_row),
        }
    }

    fn from_workbook(path: &Path, header_row: usize) -> Result<Table> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("opening workbook {}", path.display()))?;
        let range = workbook
            .worksheet_range_at(0)
            .context("workbook has no sheets")??;

        let mut rows = range.rows().skip(header_row);
        let headers = match rows.next() {
            Some(row) => row.iter().map(header_name).collect(),
            None => Vec::new(),
        };
        let rows = rows
            .map(|row| row.iter().map(convert_cell).collect())
            .collect();

        Ok(Table { headers, rows })
    }

    fn from_csv(path: &Path, header_row: usize) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("opening csv {}", path.display()))?;

        let mut records = reader.records();
        for _ in 0..header_row {
            if records.next().is_none() {
                return Ok(Table {
                    headers: Vec::new(),
                    rows: Vec::new(),
                });
            }
        }

        let headers: Vec<String> = match records.next() {
            Some(row) => row?.iter().map(|s| s.trim().to_string()).collect(),
            None => {
                return Ok(Table {
                    headers: Vec::new(),
                    rows: Vec::new(),
                });
            }
        };

        let mut rows = Vec::new();
        for record in records {
            let record = record?;
            let mut row: Vec<Cell> = record
                .iter()
                .map(|s| {
                    if s.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(s.to_string())
                    }
                })
                .collect();
            row.resize(headers.len(), Cell::Empty);
            rows.push(row);
        }

        Ok(Table { headers, rows })
    }

    /// Index of the column with the given header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the table as CSV with a single header row. Empty cells become
    /// empty fields.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;

        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|c| c.as_str().unwrap_or_default()))?;
        }
        writer.flush()?;

        Ok(())
    }
}

fn header_name(cell: &Data) -> String {
    convert_cell(cell)
        .as_str()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt.as_datetime().map(Cell::DateTime).unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}
