//! Static and in-memory store implementations.
//!
//! [`StaticLocator`] serves a fixed schema list, which is what configured
//! (non-introspecting) deployments use. [`MemoryStore`] keeps rows in a map
//! and exists for tests and local development, where running MySQL just to
//! exercise the lookup path is not worth it.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::DomainExpiryError;
use crate::store::{ExpiryStore, SchemaLocator};
use crate::types::{ExpiryRecord, TableSchema};

/// A schema locator that returns a fixed, pre-ordered table list.
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    schemas: Vec<TableSchema>,
}

impl StaticLocator {
    /// Create a locator serving `schemas` in the order given.
    pub fn new(schemas: Vec<TableSchema>) -> Self {
        Self { schemas }
    }
}

#[async_trait]
impl SchemaLocator for StaticLocator {
    async fn locate(&self) -> Result<Vec<TableSchema>, DomainExpiryError> {
        Ok(self.schemas.clone())
    }
}

/// An in-memory row store keyed by table name.
///
/// Matching follows the SQL the MySQL store runs: a row matches when its
/// trimmed domain equals a trimmed candidate or its raw domain equals a raw
/// candidate. Tables can be marked as failing to exercise the
/// swallow-and-continue scan behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<ExpiryRecord>>,
    failing: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with its rows.
    pub fn with_table<T: Into<String>>(mut self, table: T, rows: Vec<ExpiryRecord>) -> Self {
        self.tables.insert(table.into(), rows);
        self
    }

    /// Mark a table so any fetch against it fails.
    pub fn with_failing_table<T: Into<String>>(mut self, table: T) -> Self {
        self.failing.insert(table.into());
        self
    }
}

#[async_trait]
impl ExpiryStore for MemoryStore {
    async fn fetch(
        &self,
        schema: &TableSchema,
        candidates: &[String],
    ) -> Result<Option<ExpiryRecord>, DomainExpiryError> {
        if self.failing.contains(&schema.table) {
            return Err(DomainExpiryError::store(format!(
                "table '{}' unavailable",
                schema.table
            )));
        }

        let rows = match self.tables.get(&schema.table) {
            Some(rows) => rows,
            None => return Ok(None),
        };

        let hit = rows.iter().find(|row| {
            row.domain_name.as_deref().is_some_and(|stored| {
                candidates
                    .iter()
                    .any(|candidate| stored.trim() == candidate.trim() || stored == candidate)
            })
        });

        Ok(hit.cloned())
    }
}
