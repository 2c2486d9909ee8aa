//! CSV record reader
//!
//! Turns a CSV byte stream into [`RawRecord`]s. The header row is resolved
//! once per call into a [`HeaderIndex`], and every data row is then mapped
//! positionally through it.
//!
//! # Format
//! ```text
//! Name,Description
//! Widget,A thing
//! "Bolt, hex","M6, zinc plated"
//! ```
//!
//! Rows may be shorter than the header; missing trailing fields come back as
//! `None`. A completely empty input has no header and yields no records.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::error::{ImportError, ImportResult};

/// Header column names the reader looks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub name: String,
    pub description: String,
    /// Match header cells exactly (default) or ignoring case
    pub case_sensitive: bool,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            description: "Description".to_string(),
            case_sensitive: true,
        }
    }
}

impl ColumnMapping {
    /// Exact match apart from a leading byte order mark; surrounding
    /// whitespace is part of the header name
    fn matches(&self, header: &str, wanted: &str) -> bool {
        let header = header.strip_prefix('\u{feff}').unwrap_or(header);
        if self.case_sensitive {
            header == wanted
        } else {
            header.to_lowercase() == wanted.to_lowercase()
        }
    }
}

/// One unvalidated input row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl RawRecord {
    pub fn new(name: Option<&str>, description: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            description: description.map(str::to_string),
        }
    }
}

/// Field positions resolved from the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeaderIndex {
    name: usize,
    description: usize,
}

impl HeaderIndex {
    /// Resolve column positions, first occurrence wins
    fn build(headers: &StringRecord, mapping: &ColumnMapping) -> Result<Self, String> {
        let position = |wanted: &str| {
            headers
                .iter()
                .position(|h| mapping.matches(h, wanted))
                .ok_or_else(|| {
                    format!(
                        "missing required column '{}' (found: {})",
                        wanted,
                        headers.iter().collect::<Vec<_>>().join(", ")
                    )
                })
        };

        Ok(Self {
            name: position(&mapping.name)?,
            description: position(&mapping.description)?,
        })
    }

    fn record(&self, row: &StringRecord) -> RawRecord {
        RawRecord::new(row.get(self.name), row.get(self.description))
    }
}

/// Reads item rows from CSV sources
#[derive(Debug, Clone)]
pub struct CsvRecordReader {
    mapping: ColumnMapping,
    delimiter: u8,
}

impl Default for CsvRecordReader {
    fn default() -> Self {
        Self {
            mapping: ColumnMapping::default(),
            delimiter: b',',
        }
    }
}

impl CsvRecordReader {
    /// Create a reader expecting `Name,Description` with comma delimiters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Open `path` and read every record from it
    pub fn extract_path(&self, path: impl AsRef<Path>) -> ImportResult<Vec<RawRecord>> {
        let path = path.as_ref();
        let source_name = path.display().to_string();

        let file = File::open(path).map_err(|source| ImportError::SourceUnavailable {
            source_name: source_name.clone(),
            source,
        })?;

        self.extract(&source_name, file)
    }

    /// Read every record from `source`.
    ///
    /// The whole stream is consumed before returning.
    pub fn extract<R: Read>(&self, source_name: &str, source: R) -> ImportResult<Vec<RawRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let headers = reader
            .headers()
            .map_err(|e| csv_error(source_name, e))?
            .clone();

        if headers.is_empty() {
            info!(source = %source_name, "Source is empty, nothing to extract");
            return Ok(Vec::new());
        }

        let index = HeaderIndex::build(&headers, &self.mapping)
            .map_err(|message| ImportError::parse(source_name, message))?;
        debug!(
            source = %source_name,
            name_column = index.name,
            description_column = index.description,
            "Resolved header columns"
        );

        let mut records = Vec::new();
        let mut row = StringRecord::new();
        loop {
            match reader.read_record(&mut row) {
                Ok(true) => records.push(index.record(&row)),
                Ok(false) => break,
                Err(e) => return Err(csv_error(source_name, e)),
            }
        }

        info!(source = %source_name, rows = records.len(), "Extracted rows");
        Ok(records)
    }
}

/// I/O failures mean the source is unavailable, anything else is malformed input
fn csv_error(source_name: &str, err: csv::Error) -> ImportError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => ImportError::SourceUnavailable {
            source_name: source_name.to_string(),
            source,
        },
        _ => ImportError::parse(source_name, message),
    }
}
