// Metadata table
// Delimited text table held in memory as raw strings so untouched cells round-trip unchanged

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write table {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row} has {found} cells but the header has {expected}")]
    TooManyCells {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Field delimiter implied by a file extension: tab for .tsv/.tab, comma otherwise
pub fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}

/// Header plus rows of raw cells
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    delimiter: u8,
}

impl MetadataTable {
    /// Build a table; short rows are padded, rows wider than the header are rejected
    /// (`row` in the error is 1-based, counting data rows only)
    pub fn new(
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        delimiter: u8,
    ) -> Result<Self, TableError> {
        let width = headers.len();
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() > width) {
            return Err(TableError::TooManyCells {
                row: index + 1,
                expected: width,
                found: row.len(),
            });
        }

        let mut table = MetadataTable {
            headers,
            rows,
            delimiter,
        };
        table.pad_rows();
        Ok(table)
    }

    /// Read a whole table from disk, choosing the delimiter from the extension
    pub fn read(path: &Path) -> Result<Self, TableError> {
        let file = std::fs::File::open(path).map_err(|e| TableError::Read {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;

        Self::from_reader(file, delimiter_for(path)).map_err(|e| match e {
            TableError::Csv(source) => TableError::Read {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse a table whose first record is the header
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect());
        }

        Self::new(headers, rows, delimiter)
    }

    /// Write the whole table, replacing any existing file
    pub fn write(&self, path: &Path) -> Result<(), TableError> {
        let file = std::fs::File::create(path).map_err(|e| TableError::Write {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;

        self.to_writer(file).map_err(|e| match e {
            TableError::Csv(source) => TableError::Write {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Serialize header and rows with this table's delimiter
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;

        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Append a column filled with `default`, or reset an existing one in place
    pub fn ensure_column(&mut self, name: &str, default: &str) -> usize {
        match self.column_index(name) {
            Some(index) => {
                for row in &mut self.rows {
                    row[index] = default.to_string();
                }
                index
            }
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(default.to_string());
                }
                self.headers.len() - 1
            }
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.into();
        }
    }

    /// Short rows get empty cells up to the header width
    fn pad_rows(&mut self) {
        let width = self.headers.len();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
    }
}
