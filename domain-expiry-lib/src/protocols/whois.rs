//! WHOIS fallback for expiration lookups.
//!
//! WHOIS is the traditional protocol for registration data and the only
//! option for TLDs without RDAP (notably .th and most other ccTLDs). It
//! answers in unstructured text, so expiration extraction is a matter of
//! scanning for the handful of field names registries actually use.
//!
//! Queries go through the system `whois` command rather than a hand-rolled
//! port-43 client: the installed tool already knows how to follow registrar
//! referrals and pick servers for odd TLDs.

use std::future::Future;
use std::time::Duration;
use tokio::process::Command;

use crate::error::DomainExpiryError;
use crate::protocols::registry::{self, extract_tld};

/// Expiration field names scanned in priority order across the response.
///
/// Matched case-insensitively against the part of each line before the first
/// colon. `registry expiry date` outranks `expiration date` because registrar
/// sections sometimes carry a stale copy under the looser name.
const EXPIRATION_KEYS: [&str; 5] = [
    "registry expiry date",
    "registrar registration expiration date",
    "expiry date",
    "expiration date",
    "paid-till",
];

/// Pause before the single retry after a rate-limited response.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_millis(1000);

/// WHOIS client that extracts expiration timestamps via the system `whois`.
#[derive(Clone)]
pub struct WhoisClient {
    /// Timeout for a whole lookup, including referral queries
    timeout: Duration,
}

impl WhoisClient {
    /// Create a new WHOIS client with default settings.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }

    /// Create a new WHOIS client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Fetch the expiration timestamp text for a domain.
    ///
    /// Returns `NoExpiryData` when the responses say the domain is not
    /// registered, and `WhoisError` when no response carried an expiration
    /// field or the command itself failed.
    pub async fn fetch_expiration(&self, domain: &str) -> Result<String, DomainExpiryError> {
        match tokio::time::timeout(self.timeout, self.query_expiration(domain)).await {
            Ok(result) => result,
            Err(_) => Err(DomainExpiryError::whois(
                domain,
                format!("WHOIS query timed out after {:?}", self.timeout),
            )),
        }
    }

    async fn query_expiration(&self, domain: &str) -> Result<String, DomainExpiryError> {
        let response = self.run_whois(domain, None).await?;

        if let Some(value) = parse_expiration(&response) {
            return Ok(value);
        }
        if is_no_match(&response) {
            return Err(DomainExpiryError::no_expiry_data(domain));
        }

        // The default server answered without an expiration field; usually a
        // registrar response that hides registry dates. Ask the registry
        // server IANA refers to for this TLD.
        let tld = extract_tld(domain)?;
        if let Some(server) = registry::get_whois_server(&tld).await {
            tracing::debug!(domain = %domain, server = %server, "retrying WHOIS against referred server");
            let referred = self.run_whois(domain, Some(&server)).await?;

            if let Some(value) = parse_expiration(&referred) {
                return Ok(value);
            }
            if is_no_match(&referred) {
                return Err(DomainExpiryError::no_expiry_data(domain));
            }
        }

        Err(DomainExpiryError::whois(
            domain,
            "no expiration field in WHOIS response",
        ))
    }

    /// Run the system whois command, retrying once if the response reads as
    /// rate limiting.
    async fn run_whois(
        &self,
        domain: &str,
        server: Option<&str>,
    ) -> Result<String, DomainExpiryError> {
        retry_once_if_rate_limited(domain, || execute_whois(domain, server)).await
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one query, retrying it once when the response reads as rate limiting.
///
/// The second response is returned as-is, throttled or not.
async fn retry_once_if_rate_limited<F, Fut>(
    domain: &str,
    mut query: F,
) -> Result<String, DomainExpiryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, DomainExpiryError>>,
{
    let response = query().await?;

    if is_rate_limited(&response) {
        tracing::debug!(domain = %domain, "WHOIS rate limited, retrying once");
        tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
        return query().await;
    }

    Ok(response)
}

async fn execute_whois(domain: &str, server: Option<&str>) -> Result<String, DomainExpiryError> {
    let mut command = Command::new("whois");
    if let Some(server) = server {
        command.arg("-h").arg(server);
    }

    let output = command.arg(domain).output().await.map_err(|e| {
        DomainExpiryError::whois(
            domain,
            format!(
                "Failed to execute whois command: {}. Make sure 'whois' is installed.",
                e
            ),
        )
    })?;

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Find the first expiration value in a WHOIS response.
///
/// Keys are tried in priority order across the whole response, not line
/// order, so a high-confidence registry field wins over a looser registrar
/// one even when it appears later. The value keeps its original casing
/// (timestamps carry `T` and `Z`).
fn parse_expiration(response: &str) -> Option<String> {
    for key in EXPIRATION_KEYS {
        for line in response.lines() {
            if let Some((name, value)) = line.split_once(':') {
                if name.trim().to_lowercase() == key {
                    let value = value.trim();
                    if !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }
    None
}

/// Whether a WHOIS response says the domain is not registered.
fn is_no_match(response: &str) -> bool {
    let response_lower = response.to_lowercase();
    let no_match_patterns = [
        "no match",
        "not found",
        "no data found",
        "no entries found",
        "domain not found",
        "no matching record",
        "object does not exist",
        "the queried object does not exist",
        "this domain name has not been registered",
        "not registered",
    ];

    no_match_patterns
        .iter()
        .any(|pattern| response_lower.contains(pattern))
}

/// Whether a WHOIS response indicates rate limiting.
fn is_rate_limited(response: &str) -> bool {
    let response_lower = response.to_lowercase();
    let rate_limit_patterns = [
        "rate limit exceeded",
        "too many requests",
        "try again later",
        "quota exceeded",
        "limit exceeded",
        "throttled",
        "rate-limited",
        "too many requests from your ip",
    ];

    rate_limit_patterns
        .iter()
        .any(|pattern| response_lower.contains(pattern))
}

/// Discover the authoritative WHOIS server for a TLD via IANA referral.
///
/// Queries `whois.iana.org` for the TLD and parses the response for the
/// referred server hostname. Returns None when no referral was found or the
/// query failed; the result is cached by the registry module either way.
pub async fn discover_whois_server(tld: &str) -> Option<String> {
    let result = tokio::time::timeout(Duration::from_secs(10), async {
        let output = Command::new("whois")
            .arg("-h")
            .arg("whois.iana.org")
            .arg(tld)
            .output()
            .await
            .ok()?;

        let response = String::from_utf8_lossy(&output.stdout);
        parse_iana_refer_response(&response)
    })
    .await;

    result.unwrap_or(None)
}

/// Parse an IANA WHOIS response for the authoritative WHOIS server.
///
/// The IANA response may use either `refer:` or `whois:` for the server
/// field; `refer:` is canonical and takes precedence.
///
/// ```text
/// whois:        whois.verisign-grs.com
/// refer:        whois.verisign-grs.com
/// ```
fn parse_iana_refer_response(response: &str) -> Option<String> {
    let mut whois_server = None;

    for line in response.lines() {
        let line_trimmed = line.trim();
        if let Some(server) = line_trimmed.strip_prefix("refer:") {
            let server = server.trim();
            if !server.is_empty() {
                return Some(server.to_string());
            }
        } else if let Some(server) = line_trimmed.strip_prefix("whois:") {
            let server = server.trim();
            if !server.is_empty() {
                whois_server = Some(server.to_string());
            }
        }
    }

    whois_server
}
