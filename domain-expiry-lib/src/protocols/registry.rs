//! TLD registry knowledge: RDAP endpoints and WHOIS server discovery cache.
//!
//! RDAP endpoints for common TLDs are bundled so the usual case needs no
//! extra network round trip. WHOIS servers are discovered once per TLD via
//! IANA referral and cached for the lifetime of the process.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::DomainExpiryError;

lazy_static::lazy_static! {
    /// TLD -> WHOIS server hostname, discovered via IANA referral.
    /// An empty string records "no server found" so the referral query
    /// is not repeated for a TLD known to lack one.
    static ref WHOIS_SERVERS: Mutex<HashMap<String, String>> = Mutex::new(HashMap::new());
}

/// Built-in RDAP registry mappings.
///
/// Maps TLD strings (like "com", "org") to RDAP endpoint base URLs. TLDs
/// missing here fall through to the WHOIS path at lookup time.
pub fn rdap_registry_map() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        // Popular gTLDs
        ("com", "https://rdap.verisign.com/com/v1/domain/"),
        ("net", "https://rdap.verisign.com/net/v1/domain/"),
        (
            "org",
            "https://rdap.publicinterestregistry.org/rdap/domain/",
        ),
        ("info", "https://rdap.identitydigital.services/rdap/domain/"),
        ("biz", "https://rdap.nic.biz/domain/"),
        // Google registry TLDs
        ("app", "https://pubapi.registry.google/rdap/domain/"),
        ("dev", "https://pubapi.registry.google/rdap/domain/"),
        ("page", "https://pubapi.registry.google/rdap/domain/"),
        // CentralNic managed gTLDs
        ("xyz", "https://rdap.centralnic.com/xyz/domain/"),
        ("tech", "https://rdap.centralnic.com/tech/domain/"),
        ("online", "https://rdap.centralnic.com/online/domain/"),
        ("site", "https://rdap.centralnic.com/site/domain/"),
        ("website", "https://rdap.centralnic.com/website/domain/"),
        // Other gTLDs
        ("blog", "https://rdap.blog.fury.ca/rdap/domain/"),
        ("shop", "https://rdap.gmoregistry.net/rdap/domain/"),
        // Identity Digital managed TLDs
        ("ai", "https://rdap.identitydigital.services/rdap/domain/"),
        ("io", "https://rdap.identitydigital.services/rdap/domain/"),
        ("me", "https://rdap.identitydigital.services/rdap/domain/"),
        ("zone", "https://rdap.identitydigital.services/rdap/domain/"),
        (
            "digital",
            "https://rdap.identitydigital.services/rdap/domain/",
        ),
        // ccTLDs with working RDAP endpoints
        ("us", "https://rdap.nic.us/domain/"),
        ("uk", "https://rdap.nominet.uk/domain/"),
        ("de", "https://rdap.denic.de/domain/"),
        ("ca", "https://rdap.ca.fury.ca/rdap/domain/"),
        ("au", "https://rdap.cctld.au/rdap/domain/"),
        ("fr", "https://rdap.nic.fr/domain/"),
        ("nl", "https://rdap.sidn.nl/domain/"),
        ("br", "https://rdap.registro.br/domain/"),
        ("in", "https://rdap.nixiregistry.in/rdap/domain/"),
        // Verisign managed ccTLDs
        ("tv", "https://rdap.nic.tv/domain/"),
        ("cc", "https://tld-rdap.verisign.com/cc/v1/domain/"),
        // Specialty TLDs
        ("cloud", "https://rdap.registry.cloud/rdap/domain/"),
        // NOTE: co, eu, it, jp, es, cn omitted: their RDAP endpoints are
        // defunct with no working alternatives. Those TLDs resolve through
        // WHOIS instead. th (and most other ccTLDs) never had RDAP.
    ])
}

/// Look up the RDAP endpoint for a TLD, if one is bundled.
pub fn rdap_endpoint(tld: &str) -> Option<String> {
    rdap_registry_map()
        .get(tld.to_lowercase().as_str())
        .map(|endpoint| endpoint.to_string())
}

/// Extract the TLD from a domain name (`example.co.uk` yields `uk`).
pub fn extract_tld(domain: &str) -> Result<String, DomainExpiryError> {
    let parts: Vec<&str> = domain.split('.').collect();

    if parts.len() < 2 {
        return Err(DomainExpiryError::invalid_domain(domain));
    }

    match parts.last() {
        Some(tld) if !tld.is_empty() => Ok(tld.to_lowercase()),
        _ => Err(DomainExpiryError::invalid_domain(domain)),
    }
}

/// Cache a discovered WHOIS server for a TLD.
///
/// Pass an empty `server` to record a negative result.
pub fn cache_whois_server(tld: &str, server: &str) {
    if let Ok(mut cache) = WHOIS_SERVERS.lock() {
        cache.insert(tld.to_lowercase(), server.to_string());
    }
}

/// Look up a previously discovered WHOIS server for a TLD.
pub fn cached_whois_server(tld: &str) -> Option<String> {
    let cache = WHOIS_SERVERS.lock().ok()?;
    let server = cache.get(&tld.to_lowercase())?;
    if server.is_empty() {
        None
    } else {
        Some(server.clone())
    }
}

/// Whether a TLD is negatively cached (referral found no WHOIS server).
pub fn is_whois_negatively_cached(tld: &str) -> bool {
    if let Ok(cache) = WHOIS_SERVERS.lock() {
        matches!(cache.get(&tld.to_lowercase()), Some(s) if s.is_empty())
    } else {
        false
    }
}

/// Get the WHOIS server for a TLD, discovering it via IANA referral on a
/// cache miss and caching the outcome either way.
pub async fn get_whois_server(tld: &str) -> Option<String> {
    let tld_lower = tld.to_lowercase();

    if let Some(server) = cached_whois_server(&tld_lower) {
        return Some(server);
    }
    if is_whois_negatively_cached(&tld_lower) {
        return None;
    }

    match crate::protocols::whois::discover_whois_server(&tld_lower).await {
        Some(server) => {
            cache_whois_server(&tld_lower, &server);
            Some(server)
        }
        None => {
            cache_whois_server(&tld_lower, "");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tld() {
        assert_eq!(extract_tld("example.com").unwrap(), "com");
        assert_eq!(extract_tld("example.co.th").unwrap(), "th");
        assert_eq!(extract_tld("sub.example.com").unwrap(), "com");
        assert_eq!(extract_tld("EXAMPLE.COM").unwrap(), "com");
        assert!(extract_tld("invalid").is_err());
        assert!(extract_tld("").is_err());
        assert!(extract_tld("example.").is_err());
    }

    #[test]
    fn test_registry_map_contains_common_tlds() {
        let registry = rdap_registry_map();
        assert!(registry.contains_key("com"));
        assert!(registry.contains_key("org"));
        assert!(registry.contains_key("net"));
        assert!(registry.contains_key("io"));
        // No RDAP for .th; it must go through WHOIS.
        assert!(!registry.contains_key("th"));
    }

    #[test]
    fn test_rdap_endpoint_lookup() {
        assert!(rdap_endpoint("com").unwrap().contains("verisign.com"));
        assert!(rdap_endpoint("COM").is_some());
        assert!(rdap_endpoint("unknowntld123").is_none());
    }

    #[test]
    fn test_all_endpoints_are_valid_https_urls() {
        for (tld, endpoint) in &rdap_registry_map() {
            assert!(
                endpoint.starts_with("https://"),
                "Endpoint for '{}' must use HTTPS: {}",
                tld,
                endpoint
            );
            assert!(
                endpoint.ends_with("/domain/"),
                "Endpoint for '{}' must end with /domain/: {}",
                tld,
                endpoint
            );
        }
    }

    #[test]
    fn test_whois_server_caching() {
        // Unique TLDs per assertion so parallel tests sharing the global
        // cache cannot interfere.
        cache_whois_server("zz-cache-positive", "whois.example-registry.test");
        assert_eq!(
            cached_whois_server("zz-cache-positive"),
            Some("whois.example-registry.test".to_string())
        );
        assert!(!is_whois_negatively_cached("zz-cache-positive"));

        cache_whois_server("zz-cache-negative", "");
        assert_eq!(cached_whois_server("zz-cache-negative"), None);
        assert!(is_whois_negatively_cached("zz-cache-negative"));

        assert_eq!(cached_whois_server("zz-cache-missing"), None);
        assert!(!is_whois_negatively_cached("zz-cache-missing"));
    }

    #[test]
    fn test_whois_cache_is_case_insensitive() {
        cache_whois_server("ZZ-Cache-Case", "whois.case.test");
        assert_eq!(
            cached_whois_server("zz-cache-case"),
            Some("whois.case.test".to_string())
        );
    }
}
