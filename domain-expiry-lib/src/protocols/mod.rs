//! Live lookup protocols.
//!
//! When no database row answers the question, the domain's registry can:
//! RDAP first for the TLDs that support it, the system WHOIS command for the
//! rest.

/// RDAP (Registration Data Access Protocol) implementation
pub mod rdap;

/// Registry mappings and WHOIS server discovery
pub mod registry;

/// WHOIS protocol implementation
pub mod whois;

pub use rdap::RdapClient;
pub use whois::WhoisClient;
