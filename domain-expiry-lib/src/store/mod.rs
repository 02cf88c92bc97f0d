//! Backing-store access for expiry lookups.
//!
//! Two capabilities, each behind an async trait so the lookup engine can run
//! against live MySQL or fixtures: a [`SchemaLocator`] produces the ordered
//! list of tables qualified for lookup, and an [`ExpiryStore`] fetches a
//! matching row from one of them. The MySQL types implement both; the static
//! and in-memory types let configuration pin schemas and let tests run
//! without a server.

mod memory;
mod mysql;

pub use memory::{MemoryStore, StaticLocator};
pub use mysql::MySqlStore;

use async_trait::async_trait;

use crate::error::DomainExpiryError;
use crate::types::{ExpiryRecord, TableSchema};

/// Discovers which backing tables qualify for an expiry lookup.
///
/// Implementations return the candidate tables in lookup order: the
/// well-known default table first, then the rest in discovery order. An
/// empty list is a valid answer and simply means every lookup misses.
#[async_trait]
pub trait SchemaLocator: Send + Sync {
    /// Produce the ordered list of qualified tables.
    async fn locate(&self) -> Result<Vec<TableSchema>, DomainExpiryError>;
}

/// Fetches at most one expiry row from a qualified table.
#[async_trait]
pub trait ExpiryStore: Send + Sync {
    /// Look for a row in `schema` whose domain column matches any of
    /// `candidates`, comparing both trimmed and raw stored values, and
    /// return the first hit.
    async fn fetch(
        &self,
        schema: &TableSchema,
        candidates: &[String],
    ) -> Result<Option<ExpiryRecord>, DomainExpiryError>;
}
