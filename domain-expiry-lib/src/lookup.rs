//! The schema-discovery lookup engine.
//!
//! Given the raw user input and its normalized form, the engine builds the
//! candidate search-value set, asks its [`SchemaLocator`] for the qualified
//! tables, and scans them in order. The scan is a short-circuiting fold: each
//! table yields `Found` or `Skip`, the first `Found` wins, and per-table
//! failures are downgraded to `Skip` so one broken table never takes the
//! whole lookup down. Only total exhaustion reads as "not found."

use std::sync::Arc;

use crate::error::DomainExpiryError;
use crate::store::{ExpiryStore, SchemaLocator};
use crate::types::{ExpiryRecord, TableSchema};

/// Outcome of scanning one candidate table.
enum TableScan {
    /// The table produced a matching row; the scan stops here.
    Found(ExpiryRecord),
    /// No match, missing columns, or a swallowed per-table error.
    Skip,
}

/// Runs expiry lookups across whatever tables the locator qualifies.
pub struct LookupEngine {
    locator: Arc<dyn SchemaLocator>,
    store: Arc<dyn ExpiryStore>,
}

impl LookupEngine {
    pub fn new(locator: Arc<dyn SchemaLocator>, store: Arc<dyn ExpiryStore>) -> Self {
        Self { locator, store }
    }

    /// Find the first row matching the input in any qualified table.
    ///
    /// Runs even when normalization failed (`normalized` = `None`): the raw
    /// value may still match an oddly formatted stored row. Errors from
    /// [`SchemaLocator::locate`] propagate; per-table fetch errors do not.
    pub async fn lookup(
        &self,
        raw_input: &str,
        normalized: Option<&str>,
    ) -> Result<Option<ExpiryRecord>, DomainExpiryError> {
        let candidates = candidate_values(raw_input, normalized);
        let schemas = self.locator.locate().await?;

        if schemas.is_empty() {
            tracing::debug!("no tables qualified for lookup");
            return Ok(None);
        }

        for schema in &schemas {
            match self.scan_table(schema, &candidates).await {
                TableScan::Found(record) => {
                    tracing::debug!(table = %schema.table, "lookup matched");
                    return Ok(Some(record));
                }
                TableScan::Skip => continue,
            }
        }

        Ok(None)
    }

    async fn scan_table(&self, schema: &TableSchema, candidates: &[String]) -> TableScan {
        match self.store.fetch(schema, candidates).await {
            Ok(Some(record)) => TableScan::Found(record),
            Ok(None) => TableScan::Skip,
            Err(err) => {
                tracing::debug!(table = %schema.table, "table scan failed, trying next: {}", err);
                TableScan::Skip
            }
        }
    }
}

/// Build the deduplicated search-value set for a lookup.
///
/// The trimmed input, its lowercase and uppercase forms, and the normalized
/// form when it differs from the raw input. Order is preserved and the first
/// occurrence of a duplicate wins.
pub fn candidate_values(raw_input: &str, normalized: Option<&str>) -> Vec<String> {
    let trimmed = raw_input.trim();

    let mut values = vec![
        trimmed.to_string(),
        trimmed.to_lowercase(),
        trimmed.to_uppercase(),
    ];
    if let Some(normalized) = normalized {
        if normalized != raw_input {
            values.push(normalized.to_string());
        }
    }

    let mut unique = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}
