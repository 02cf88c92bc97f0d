//! Main expiry checker implementation.
//!
//! This module provides the primary `ExpiryChecker` struct that orchestrates
//! a single check from raw request input to a rendered report: normalize the
//! input, resolve the expiration through the configured backend, and format
//! the result.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::DomainExpiryError;
use crate::format::{expire_to_datetime, format_thai_datetime, parse_expire_text};
use crate::lookup::LookupEngine;
use crate::normalize::normalize_domain;
use crate::protocols::{RdapClient, WhoisClient};
use crate::store::{ExpiryStore, SchemaLocator};
use crate::types::ExpiryReport;

/// How a checker resolves expirations.
enum Backend {
    /// Scan the backing database through the lookup engine
    Database(LookupEngine),
    /// Ask the domain's registry: RDAP first, WHOIS fallback
    Live {
        rdap: RdapClient,
        whois: WhoisClient,
    },
}

/// Answers "when does this domain expire?" for one raw input at a time.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use domain_expiry_lib::{ExpiryChecker, MemoryStore, StaticLocator, TableSchema};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let schemas = vec![TableSchema::with_default_columns("domains")];
///     let checker = ExpiryChecker::with_database(
///         Arc::new(StaticLocator::new(schemas)),
///         Arc::new(MemoryStore::new()),
///     );
///     let report = checker.check("https://www.example.com/page").await?;
///     println!("{} expires {}", report.domain_name, report.iso_date());
///     Ok(())
/// }
/// ```
pub struct ExpiryChecker {
    backend: Backend,
}

impl ExpiryChecker {
    /// Create a checker that answers from a relational store.
    pub fn with_database(locator: Arc<dyn SchemaLocator>, store: Arc<dyn ExpiryStore>) -> Self {
        Self {
            backend: Backend::Database(LookupEngine::new(locator, store)),
        }
    }

    /// Create a checker that asks the domain's registry directly.
    pub fn live() -> Result<Self, DomainExpiryError> {
        Ok(Self {
            backend: Backend::Live {
                rdap: RdapClient::new()?,
                whois: WhoisClient::new(),
            },
        })
    }

    /// Resolve the expiration for one raw domain input.
    ///
    /// Normalization failure is not a dead end for the database backend: the
    /// lookup still runs with the raw value, since oddly formatted stored
    /// rows are exactly what the candidate matching exists to catch. Only
    /// when the lookup also misses does the failed normalization decide the
    /// error (invalid format rather than not found).
    pub async fn check(&self, raw_input: &str) -> Result<ExpiryReport, DomainExpiryError> {
        let normalized = normalize_domain(raw_input);
        tracing::debug!(
            raw = %raw_input,
            normalized = normalized.as_deref().unwrap_or("<none>"),
            "checking domain"
        );

        match &self.backend {
            Backend::Database(engine) => self.check_database(engine, raw_input, normalized).await,
            Backend::Live { rdap, whois } => {
                self.check_live(rdap, whois, raw_input, normalized).await
            }
        }
    }

    async fn check_database(
        &self,
        engine: &LookupEngine,
        raw_input: &str,
        normalized: Option<String>,
    ) -> Result<ExpiryReport, DomainExpiryError> {
        let record = engine.lookup(raw_input, normalized.as_deref()).await?;

        let Some(record) = record else {
            return Err(miss_error(raw_input, normalized));
        };

        // A row whose expiration is NULL or blank answers nothing; treat it
        // exactly like a miss.
        let Some(expire) = record.expire.filter(|value| !value.is_blank()) else {
            return Err(miss_error(raw_input, normalized));
        };

        let Some(timestamp) = expire_to_datetime(&expire) else {
            return Err(DomainExpiryError::invalid_expiry(
                normalized.unwrap_or_else(|| raw_input.trim().to_string()),
                expire.to_string(),
            ));
        };

        let domain_name = record
            .domain_name
            .or(normalized)
            .unwrap_or_else(|| raw_input.trim().to_string());

        Ok(build_report(domain_name, timestamp))
    }

    async fn check_live(
        &self,
        rdap: &RdapClient,
        whois: &WhoisClient,
        raw_input: &str,
        normalized: Option<String>,
    ) -> Result<ExpiryReport, DomainExpiryError> {
        // A registry query needs a well-formed registrable domain; there is
        // no stored row to rescue odd input.
        let domain = normalized.ok_or_else(|| DomainExpiryError::invalid_domain(raw_input))?;

        let text = match rdap.fetch_expiration(&domain).await {
            Ok(value) => value,
            // The registry answered: unregistered, or no expiration event
            // published. WHOIS would only repeat the answer.
            Err(err @ DomainExpiryError::NoExpiryData { .. }) => return Err(err),
            Err(err) => {
                tracing::debug!(domain = %domain, error = %err, "RDAP failed, falling back to WHOIS");
                whois.fetch_expiration(&domain).await?
            }
        };

        let Some(timestamp) = parse_expire_text(&text) else {
            return Err(DomainExpiryError::invalid_expiry(domain, text));
        };

        Ok(build_report(domain, timestamp))
    }
}

/// The error for a lookup that found nothing: invalid format when the input
/// never normalized, not-found otherwise.
fn miss_error(raw_input: &str, normalized: Option<String>) -> DomainExpiryError {
    match normalized {
        Some(normalized) => DomainExpiryError::not_found(raw_input, Some(normalized)),
        None => DomainExpiryError::invalid_domain(raw_input),
    }
}

fn build_report(domain_name: String, timestamp: NaiveDateTime) -> ExpiryReport {
    ExpiryReport {
        domain_name,
        expiration_date: timestamp.date(),
        expiration_date_thai: format_thai_datetime(timestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StaticLocator};
    use crate::types::{ExpireValue, ExpiryRecord, TableSchema};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn record(domain: &str, expire: Option<ExpireValue>) -> ExpiryRecord {
        ExpiryRecord {
            domain_name: Some(domain.to_string()),
            expire,
        }
    }

    fn date_expire(year: i32, month: u32, day: u32) -> Option<ExpireValue> {
        Some(ExpireValue::Date(
            NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        ))
    }

    fn database_checker(rows: Vec<ExpiryRecord>) -> ExpiryChecker {
        let schemas = vec![TableSchema::with_default_columns("domains")];
        let store = MemoryStore::new().with_table("domains", rows);
        ExpiryChecker::with_database(Arc::new(StaticLocator::new(schemas)), Arc::new(store))
    }

    #[tokio::test]
    async fn test_check_finds_stored_domain() {
        let checker = database_checker(vec![record("example.com", date_expire(2030, 1, 15))]);

        let report = checker.check("  EXAMPLE.COM  ").await.unwrap();
        assert_eq!(report.domain_name, "example.com");
        assert_eq!(report.iso_date(), "2030-01-15");
        assert_eq!(
            report.expiration_date_thai.as_deref(),
            Some("15 มกราคม 2573 เวลา 07:00")
        );
    }

    #[tokio::test]
    async fn test_check_normalizes_url_input() {
        let checker = database_checker(vec![record("example.com", date_expire(2030, 1, 15))]);

        let report = checker
            .check("https://www.example.com/landing?x=1")
            .await
            .unwrap();
        assert_eq!(report.domain_name, "example.com");
    }

    #[tokio::test]
    async fn test_check_miss_reports_not_found_with_diagnostics() {
        let checker = database_checker(vec![]);

        let err = checker.check("missing.example").await.unwrap_err();
        match err {
            DomainExpiryError::NotFound {
                searched,
                normalized,
            } => {
                assert_eq!(searched, "missing.example");
                assert_eq!(normalized.as_deref(), Some("missing.example"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_miss_with_failed_normalization_is_invalid_domain() {
        let checker = database_checker(vec![]);

        let err = checker.check("not a domain").await.unwrap_err();
        assert!(matches!(err, DomainExpiryError::InvalidDomain { .. }));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_check_rescues_stored_row_despite_failed_normalization() {
        // The stored value itself would never normalize, but a verbatim row
        // match must still succeed.
        let checker = database_checker(vec![record("xn--zzz", date_expire(2031, 6, 1))]);

        let report = checker.check("xn--zzz").await.unwrap();
        assert_eq!(report.domain_name, "xn--zzz");
        assert_eq!(report.iso_date(), "2031-06-01");
    }

    #[tokio::test]
    async fn test_check_blank_expiration_counts_as_miss() {
        let checker = database_checker(vec![record(
            "blank.example",
            Some(ExpireValue::Text("   ".to_string())),
        )]);

        let err = checker.check("blank.example").await.unwrap_err();
        assert!(matches!(err, DomainExpiryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_check_null_expiration_counts_as_miss() {
        let checker = database_checker(vec![record("null.example", None)]);

        let err = checker.check("null.example").await.unwrap_err();
        assert!(matches!(err, DomainExpiryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_check_unparseable_expiration_is_invalid_expiry() {
        let checker = database_checker(vec![record(
            "weird.example",
            Some(ExpireValue::Text("sometime next year".to_string())),
        )]);

        let err = checker.check("weird.example").await.unwrap_err();
        match &err {
            DomainExpiryError::InvalidExpiry { domain, value } => {
                assert_eq!(domain, "weird.example");
                assert_eq!(value, "sometime next year");
            }
            other => panic!("expected InvalidExpiry, got {:?}", other),
        }
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_check_falls_back_to_normalized_name_when_row_has_none() {
        struct NamelessStore;

        #[async_trait]
        impl ExpiryStore for NamelessStore {
            async fn fetch(
                &self,
                _schema: &TableSchema,
                _candidates: &[String],
            ) -> Result<Option<ExpiryRecord>, DomainExpiryError> {
                Ok(Some(ExpiryRecord {
                    domain_name: None,
                    expire: date_expire(2030, 1, 15),
                }))
            }
        }

        let schemas = vec![TableSchema::with_default_columns("domains")];
        let checker = ExpiryChecker::with_database(
            Arc::new(StaticLocator::new(schemas)),
            Arc::new(NamelessStore),
        );

        let report = checker.check("WWW.EXAMPLE.COM").await.unwrap();
        assert_eq!(report.domain_name, "example.com");
    }

    #[tokio::test]
    async fn test_live_checker_rejects_unnormalizable_input_before_any_network() {
        let checker = ExpiryChecker::live().unwrap();

        let err = checker.check("definitely not a domain").await.unwrap_err();
        assert!(matches!(err, DomainExpiryError::InvalidDomain { .. }));
    }
}
