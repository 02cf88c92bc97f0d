//! # Domain Expiry Library
//!
//! A library for answering one question: when does this domain expire?
//!
//! It normalizes free-form domain input (URLs, stray whitespace, trailing
//! dots), finds expiration data in whatever tables the backing MySQL database
//! happens to hold, or asks the domain's registry directly over RDAP and
//! WHOIS, and renders the answer as a Thai Buddhist-era date.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_expiry_lib::{ExpiryChecker, MemoryStore, StaticLocator, TableSchema};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schemas = vec![TableSchema::with_default_columns("domains")];
//!     let checker = ExpiryChecker::with_database(
//!         Arc::new(StaticLocator::new(schemas)),
//!         Arc::new(MemoryStore::new()),
//!     );
//!
//!     let report = checker.check("https://www.example.com/page").await?;
//!     println!("{} expires {}", report.domain_name, report.iso_date());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Schema discovery**: candidate tables are found at runtime, not assumed
//! - **Pluggable stores**: [`SchemaLocator`] and [`ExpiryStore`] traits with
//!   MySQL, static, and in-memory implementations
//! - **Live lookups**: RDAP with system-WHOIS fallback for domains no
//!   database knows about
//! - **Thai rendering**: Buddhist-era dates in the Asia/Bangkok offset

// Re-export the public API so callers use domain_expiry_lib::TypeName.
pub use checker::ExpiryChecker;
pub use config::{
    apply_env_overrides, load_config, DatabaseConfig, FileConfig, LookupBackend, LookupConfig,
    ServerConfig, ServiceConfig,
};
pub use error::DomainExpiryError;
pub use format::{
    expire_to_datetime, format_thai_datetime, format_thailand_date, parse_expire_text,
};
pub use lookup::{candidate_values, LookupEngine};
pub use normalize::normalize_domain;
pub use protocols::{RdapClient, WhoisClient};
pub use store::{ExpiryStore, MemoryStore, MySqlStore, SchemaLocator, StaticLocator};
pub use types::{
    CheckResponse, ExpireValue, ExpiryRecord, ExpiryReport, TableSchema, DEFAULT_TABLE,
};

// Internal modules - these are not part of the public API
mod checker;
mod config;
mod error;
mod format;
mod lookup;
mod normalize;
mod protocols;
mod store;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainExpiryError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
