//! Ordered, string-typed in-memory table backed by the `csv` crate.
//!
//! Every cell is `Option<String>`. An empty CSV field, or one of the usual
//! null markers (`NA`, `N/A`, `null`, `nan`, ...), reads as `None`; a `None`
//! cell writes back out as an empty field.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use thiserror::Error;

pub type Row = Vec<Option<String>>;

/// Field values read as missing cells.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(field: &str) -> bool {
    NA_TOKENS.contains(&field)
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {line} has {found} fields, header has {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Column {0} has {1} values but the table has {2} rows")]
    ColumnLength(String, usize, usize),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

/// Rename repeated header names to `name.1`, `name.2`, ... so every column
/// stays addressable.
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for name in raw {
        let count = seen.entry(name.to_string()).or_insert(0);
        if *count == 0 {
            out.push(name.to_string());
        } else {
            out.push(format!("{}.{}", name, count));
        }
        *count += 1;
    }
    out
}

impl Table {
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Parse CSV with a header row. Short rows are padded with missing cells;
    /// rows longer than the header are rejected.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = unique_headers(rdr.headers()?.iter());
        let width = columns.len();
        let mut rows = Vec::new();

        for record in rdr.records() {
            let record = record?;
            if record.len() > width {
                return Err(TableError::RaggedRow {
                    line: record.position().map(|p| p.line()).unwrap_or(0),
                    expected: width,
                    found: record.len(),
                });
            }
            let mut row: Row = record
                .iter()
                .map(|field| (!is_missing(field)).then(|| field.to_string()))
                .collect();
            row.resize(width, None);
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn from_csv_str(text: &str) -> Result<Self, TableError> {
        Self::from_csv_reader(text.as_bytes())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell values of one column, or `None` if the column does not exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = Option<&str>> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_deref()))
    }

    /// Keep only `names`, in that order. Unknown names are ignored.
    pub fn select(&self, names: &[String]) -> Table {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Append a column, or overwrite it in place if the name already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<String>>) -> Result<(), TableError> {
        if values.len() != self.rows.len() {
            return Err(TableError::ColumnLength(
                name.to_string(),
                values.len(),
                self.rows.len(),
            ));
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&Row) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Stack tables vertically in order. The result carries the union of all
    /// columns in first-seen order; cells a part lacks are missing.
    pub fn concat(parts: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for part in &parts {
            for col in &part.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(parts.iter().map(Table::len).sum());
        for part in parts {
            let mapping: Vec<Option<usize>> = columns
                .iter()
                .map(|c| part.column_index(c))
                .collect();
            for mut row in part.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|&idx| idx.and_then(|i| row[i].take()))
                        .collect(),
                );
            }
        }

        Table { columns, rows }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut w = WriterBuilder::new().from_writer(writer);
        w.write_record(&self.columns)?;
        for row in &self.rows {
            w.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: &Path) -> Result<(), TableError> {
        let file = File::create(path).map_err(|source| TableError::Write {
            path: path.display().to_string(),
            source,
        })?;
        self.write_csv(BufWriter::with_capacity(512 * 1024, file))
    }
}
