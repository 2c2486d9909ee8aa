//! Importer configuration (environment variables, `.env` supported)
//!
//! - `DATABASE_URL` (falls back to `CONNECTION_STRING`)
//! - `DB_MAX_CONNECTIONS`, `DB_MIN_CONNECTIONS`, `DB_CONNECT_TIMEOUT`
//! - `ITEMFLOW_NAME_COLUMN`, `ITEMFLOW_DESCRIPTION_COLUMN`
//! - `ITEMFLOW_HEADERS_CASE_INSENSITIVE` (true/false)
//! - `ITEMFLOW_DELIMITER` (single byte, default `,`)
//! - `ITEMFLOW_COMMIT_POLICY` (`atomic` or `best-effort`)

use itemflow_common::{ItemflowError, Result};

use crate::db::DbConfig;
use crate::reader::{ColumnMapping, CsvRecordReader};
use crate::repository::CommitPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Required only when importing into PostgreSQL
    pub database: Option<DbConfig>,
    pub columns: ColumnMapping,
    pub delimiter: u8,
    pub commit_policy: CommitPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database: None,
            columns: ColumnMapping::default(),
            delimiter: b',',
            commit_policy: CommitPolicy::default(),
        }
    }
}

impl IngestConfig {
    /// Load `.env` if present, then read the process environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = get("DATABASE_URL").or_else(|| get("CONNECTION_STRING")) {
            let mut db = DbConfig::new(url);
            if let Some(v) = get("DB_MAX_CONNECTIONS") {
                db.max_connections = parse_number("DB_MAX_CONNECTIONS", &v)?;
            }
            if let Some(v) = get("DB_MIN_CONNECTIONS") {
                db.min_connections = parse_number("DB_MIN_CONNECTIONS", &v)?;
            }
            if let Some(v) = get("DB_CONNECT_TIMEOUT") {
                db.connect_timeout_secs = parse_number("DB_CONNECT_TIMEOUT", &v)?;
            }
            config.database = Some(db);
        }

        if let Some(name) = get("ITEMFLOW_NAME_COLUMN") {
            config.columns.name = name;
        }

        if let Some(description) = get("ITEMFLOW_DESCRIPTION_COLUMN") {
            config.columns.description = description;
        }

        if let Some(v) = get("ITEMFLOW_HEADERS_CASE_INSENSITIVE") {
            let insensitive: bool = v
                .parse()
                .map_err(|_| ItemflowError::invalid_value("ITEMFLOW_HEADERS_CASE_INSENSITIVE", v))?;
            config.columns.case_sensitive = !insensitive;
        }

        if let Some(v) = get("ITEMFLOW_DELIMITER") {
            config.delimiter = parse_delimiter(&v)?;
        }

        if let Some(v) = get("ITEMFLOW_COMMIT_POLICY") {
            config.commit_policy = v
                .parse()
                .map_err(|_| ItemflowError::invalid_value("ITEMFLOW_COMMIT_POLICY", v))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(db) = &self.database {
            if db.url.trim().is_empty() {
                return Err(ItemflowError::config("Database URL cannot be empty"));
            }

            if db.max_connections == 0 {
                return Err(ItemflowError::config(
                    "Database max_connections must be greater than 0",
                ));
            }

            if db.min_connections > db.max_connections {
                return Err(ItemflowError::config(format!(
                    "Database min_connections ({}) cannot be greater than max_connections ({})",
                    db.min_connections, db.max_connections
                )));
            }
        }

        if self.columns.name.trim().is_empty() || self.columns.description.trim().is_empty() {
            return Err(ItemflowError::config("Column names cannot be empty"));
        }

        if self.columns.name == self.columns.description {
            return Err(ItemflowError::config(format!(
                "Name and description columns must differ (both '{}')",
                self.columns.name
            )));
        }

        Ok(())
    }

    /// The database settings, or an error naming the missing variable
    pub fn require_database(&self) -> Result<&DbConfig> {
        self.database
            .as_ref()
            .ok_or_else(|| ItemflowError::config("DATABASE_URL (or CONNECTION_STRING) is required"))
    }

    /// Record reader configured with these columns and delimiter
    pub fn reader(&self) -> CsvRecordReader {
        CsvRecordReader::new()
            .with_mapping(self.columns.clone())
            .with_delimiter(self.delimiter)
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ItemflowError::invalid_value(field, value))
}

/// Accepts a single ASCII character, or `\t` / `tab`
pub fn parse_delimiter(value: &str) -> Result<u8> {
    if value == "\\t" || value == "tab" {
        return Ok(b'\t');
    }

    match value.as_bytes() {
        [b] if b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r' => Ok(*b),
        _ => Err(ItemflowError::invalid_value("ITEMFLOW_DELIMITER", value)),
    }
}
