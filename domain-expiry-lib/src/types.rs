//! Core data types for domain expiry lookups.
//!
//! This module defines the main data structures used throughout the library:
//! the values a backing store can hand back, the discovered table schemas,
//! and the payload shapes the HTTP layer serializes.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::DomainExpiryError;

/// Well-known default table name tried before any discovered table.
pub const DEFAULT_TABLE: &str = "domains";

/// Column holding the stored domain name.
pub const DOMAIN_COLUMN: &str = "domain_name";

/// Column holding the stored expiration value.
pub const EXPIRE_COLUMN: &str = "expire_date";

/// An expiration value as it came out of the backing store.
///
/// MySQL `expire_date` columns are not schema-controlled by this service, so
/// a value may decode as a datetime, a bare date, or free text that still has
/// to be parsed. Parsing and formatting live in [`crate::format`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExpireValue {
    /// A full timestamp (DATETIME / TIMESTAMP column)
    DateTime(NaiveDateTime),

    /// A calendar date (DATE column)
    Date(NaiveDate),

    /// Unparsed text (VARCHAR column or anything else)
    Text(String),
}

impl ExpireValue {
    /// Whether this value is effectively absent (empty or whitespace text).
    ///
    /// A matched row with a blank expiration counts as "no result," the same
    /// as a NULL column.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

impl std::fmt::Display for ExpireValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A row matched by the lookup engine.
///
/// Both fields are optional because neither column is NOT NULL in the wild;
/// absence of the whole record means "not found."
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpiryRecord {
    /// The stored domain name, as written in the table
    pub domain_name: Option<String>,

    /// The stored expiration value, if the column was non-NULL
    pub expire: Option<ExpireValue>,
}

/// A candidate table qualified for lookup: the relation name plus the two
/// columns that hold domain and expiration data.
///
/// Produced by a [`crate::store::SchemaLocator`], either through live
/// introspection or from static configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Backing relation name (e.g. "domains")
    pub table: String,

    /// Column holding domain names
    #[serde(default = "default_domain_column")]
    pub domain_column: String,

    /// Column holding expiration values
    #[serde(default = "default_expire_column")]
    pub expire_column: String,
}

fn default_domain_column() -> String {
    DOMAIN_COLUMN.to_string()
}

fn default_expire_column() -> String {
    EXPIRE_COLUMN.to_string()
}

impl TableSchema {
    /// Create a schema with explicit column names.
    pub fn new<T, D, E>(table: T, domain_column: D, expire_column: E) -> Self
    where
        T: Into<String>,
        D: Into<String>,
        E: Into<String>,
    {
        Self {
            table: table.into(),
            domain_column: domain_column.into(),
            expire_column: expire_column.into(),
        }
    }

    /// Create a schema for `table` with the well-known column names.
    pub fn with_default_columns<T: Into<String>>(table: T) -> Self {
        Self::new(table, DOMAIN_COLUMN, EXPIRE_COLUMN)
    }
}

/// The successful outcome of an expiry check.
///
/// Carries the resolved domain name, the expiration as a calendar date, and
/// the Thai rendering when the formatter produced one.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryReport {
    /// The domain name reported back to the caller
    pub domain_name: String,

    /// Expiration as a calendar date
    pub expiration_date: NaiveDate,

    /// Thai long-form rendering; `None` when localization failed
    pub expiration_date_thai: Option<String>,
}

impl ExpiryReport {
    /// The expiration date in ISO calendar form (`YYYY-MM-DD`).
    pub fn iso_date(&self) -> String {
        self.expiration_date.format("%Y-%m-%d").to_string()
    }

    /// The date shown to users: the Thai rendering, or the ISO form when
    /// localization failed.
    pub fn display_date(&self) -> String {
        self.expiration_date_thai
            .clone()
            .unwrap_or_else(|| self.iso_date())
    }

    /// The human-readable success message.
    pub fn message(&self) -> String {
        format!(
            "วันหมดอายุของโดเมน {} คือ {}",
            self.domain_name,
            self.display_date()
        )
    }
}

/// JSON payload for a check, success or failure.
///
/// Field names follow the public API contract (`domainName`,
/// `expirationDate`, `expirationDateThai`); optional fields are omitted from
/// the serialized form when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    /// Whether the check produced an expiration date
    pub success: bool,

    /// The domain the response is about, when one could be determined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,

    /// Expiration date in `YYYY-MM-DD` form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    /// Localized (Thai) expiration string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date_thai: Option<String>,

    /// Human-readable success message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// User-facing error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The raw value that was searched (not-found diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searched: Option<String>,

    /// What the raw value normalized to (not-found diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,
}

impl CheckResponse {
    /// Build the success payload for a completed check.
    pub fn success(report: &ExpiryReport) -> Self {
        Self {
            success: true,
            domain_name: Some(report.domain_name.clone()),
            expiration_date: Some(report.iso_date()),
            expiration_date_thai: Some(report.display_date()),
            message: Some(report.message()),
            error: None,
            searched: None,
            normalized: None,
        }
    }

    /// Build the failure payload for an error.
    ///
    /// Echoes the domain the error knows about; not-found errors additionally
    /// carry what was searched and what it normalized to.
    pub fn failure(error: &DomainExpiryError) -> Self {
        let mut response = Self {
            success: false,
            domain_name: None,
            expiration_date: None,
            expiration_date_thai: None,
            message: None,
            error: Some(error.user_message()),
            searched: None,
            normalized: None,
        };

        match error {
            DomainExpiryError::InvalidDomain { domain }
            | DomainExpiryError::NoExpiryData { domain }
            | DomainExpiryError::InvalidExpiry { domain, .. }
            | DomainExpiryError::RdapError { domain, .. }
            | DomainExpiryError::WhoisError { domain, .. } => {
                response.domain_name = Some(domain.clone());
            }
            DomainExpiryError::NotFound {
                searched,
                normalized,
            } => {
                response.domain_name =
                    Some(normalized.clone().unwrap_or_else(|| searched.clone()));
                response.searched = Some(searched.clone());
                response.normalized = normalized.clone();
            }
            _ => {}
        }

        response
    }
}
