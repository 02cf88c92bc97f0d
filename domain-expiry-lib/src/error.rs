//! Error handling for domain expiry lookups.
//!
//! This module defines a comprehensive error type that covers all the different
//! ways an expiry check can fail, from missing input to datastore trouble.
//! Every variant knows its HTTP status and its Thai user-facing message, so
//! transport layers can map errors without matching on variants themselves.

use std::fmt;

/// Main error type for domain expiry operations.
///
/// This enum covers all possible failure modes in the expiry checking process,
/// providing detailed context for debugging alongside user-friendly messages.
#[derive(Debug, Clone)]
pub enum DomainExpiryError {
    /// No domain field present in the request query or body
    MissingDomain,

    /// Input did not normalize to a valid domain name
    InvalidDomain {
        domain: String,
    },

    /// No candidate table held a row for the searched values
    NotFound {
        searched: String,
        normalized: Option<String>,
    },

    /// Live lookup found no expiration data (or the domain is unregistered)
    NoExpiryData {
        domain: String,
    },

    /// A row matched but its expiration value does not parse as a date
    InvalidExpiry {
        domain: String,
        value: String,
    },

    /// Datastore failure that escaped the per-table scan
    StoreError {
        message: String,
    },

    /// Network-related errors (connection, timeout, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// RDAP protocol specific errors
    RdapError {
        domain: String,
        message: String,
        status_code: Option<u16>,
    },

    /// WHOIS protocol specific errors
    WhoisError {
        domain: String,
        message: String,
    },

    /// Configuration errors (invalid settings, unreadable file, etc.)
    ConfigError {
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl DomainExpiryError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>>(domain: D) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
        }
    }

    /// Create a new not-found error carrying what was searched.
    pub fn not_found<S: Into<String>>(searched: S, normalized: Option<String>) -> Self {
        Self::NotFound {
            searched: searched.into(),
            normalized,
        }
    }

    /// Create a new no-expiry-data error.
    pub fn no_expiry_data<D: Into<String>>(domain: D) -> Self {
        Self::NoExpiryData {
            domain: domain.into(),
        }
    }

    /// Create a new invalid expiry error.
    pub fn invalid_expiry<D: Into<String>, V: Into<String>>(domain: D, value: V) -> Self {
        Self::InvalidExpiry {
            domain: domain.into(),
            value: value.into(),
        }
    }

    /// Create a new datastore error.
    pub fn store<M: Into<String>>(message: M) -> Self {
        Self::StoreError {
            message: message.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new RDAP error.
    pub fn rdap<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::RdapError {
            domain: domain.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new RDAP error with HTTP status code.
    pub fn rdap_with_status<D: Into<String>, M: Into<String>>(
        domain: D,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::RdapError {
            domain: domain.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new WHOIS error.
    pub fn whois<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::WhoisError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The HTTP status this error maps to.
    ///
    /// Input problems are 400, misses and unusable stored data are 404,
    /// everything else is a 500. Kept as a plain `u16` so the library stays
    /// free of HTTP framework types.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingDomain | Self::InvalidDomain { .. } => 400,
            Self::NotFound { .. } | Self::NoExpiryData { .. } | Self::InvalidExpiry { .. } => 404,
            _ => 500,
        }
    }

    /// The Thai user-facing message for the response `error` field.
    ///
    /// `Display` stays English for logs; this is what callers see.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingDomain => {
                "กรุณาระบุชื่อโดเมนใน query parameter หรือ request body (เช่น { \"domain\": \"example.com\" })"
                    .to_string()
            }
            Self::InvalidDomain { .. } => {
                "รูปแบบโดเมนไม่ถูกต้อง กรุณาระบุชื่อโดเมน เช่น google.com".to_string()
            }
            Self::NotFound { .. } => {
                "ไม่พบข้อมูลวันหมดอายุสำหรับโดเมนนี้ในฐานข้อมูล".to_string()
            }
            Self::NoExpiryData { .. } => {
                "ไม่พบข้อมูลวันหมดอายุสำหรับโดเมนนี้ หรือโดเมนไม่มีอยู่จริง".to_string()
            }
            Self::InvalidExpiry { .. } => "ข้อมูลวันหมดอายุไม่ถูกต้อง".to_string(),
            Self::NetworkError { .. } | Self::RdapError { .. } | Self::WhoisError { .. } => {
                "เกิดข้อผิดพลาดในการดึงข้อมูล WHOIS".to_string()
            }
            Self::StoreError { message }
            | Self::ConfigError { message }
            | Self::Internal { message } => {
                format!("เกิดข้อผิดพลาดในการดึงข้อมูลจากฐานข้อมูล: {}", message)
            }
        }
    }
}

impl fmt::Display for DomainExpiryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDomain => {
                write!(f, "No domain provided in query or body")
            }
            Self::InvalidDomain { domain } => {
                write!(f, "Invalid domain format: '{}'", domain)
            }
            Self::NotFound {
                searched,
                normalized,
            } => {
                if let Some(normalized) = normalized {
                    write!(
                        f,
                        "No expiry data for '{}' (normalized: '{}')",
                        searched, normalized
                    )
                } else {
                    write!(f, "No expiry data for '{}'", searched)
                }
            }
            Self::NoExpiryData { domain } => {
                write!(f, "No expiration data found for '{}'", domain)
            }
            Self::InvalidExpiry { domain, value } => {
                write!(f, "Unparseable expiry value '{}' for '{}'", value, domain)
            }
            Self::StoreError { message } => {
                write!(f, "Datastore error: {}", message)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::RdapError {
                domain,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "RDAP error for '{}' (HTTP {}): {}", domain, code, message)
                } else {
                    write!(f, "RDAP error for '{}': {}", domain, message)
                }
            }
            Self::WhoisError { domain, message } => {
                write!(f, "WHOIS error for '{}': {}", domain, message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for DomainExpiryError {}

// Implement From conversions for common error types
impl From<sqlx::Error> for DomainExpiryError {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreError {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for DomainExpiryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for DomainExpiryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON parsing failed: {}", err),
        }
    }
}

impl From<std::io::Error> for DomainExpiryError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
