//! RDAP (Registration Data Access Protocol) expiration lookups.
//!
//! RDAP is tried before WHOIS for live checks: responses are structured JSON
//! (the `events` array carries an `expiration` event), endpoints are known
//! for common TLDs, and an unregistered domain answers with a clean HTTP 404
//! instead of free-text prose.

use reqwest::StatusCode;
use std::time::Duration;

use crate::error::DomainExpiryError;
use crate::protocols::registry::{extract_tld, rdap_endpoint};

/// Pause before the single retry after a 429.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// RDAP client that extracts expiration timestamps.
#[derive(Clone)]
pub struct RdapClient {
    /// HTTP client for making RDAP requests
    http_client: reqwest::Client,
    /// Timeout for a whole lookup, including the retry
    timeout: Duration,
}

impl RdapClient {
    /// Create a new RDAP client with default settings.
    pub fn new() -> Result<Self, DomainExpiryError> {
        Self::with_timeout(Duration::from_secs(5))
    }

    /// Create a new RDAP client with a custom lookup timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainExpiryError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout + Duration::from_secs(2)) // Buffer for the HTTP layer
            .build()
            .map_err(|e| {
                DomainExpiryError::network_with_source(
                    "Failed to create RDAP HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    /// Fetch the expiration timestamp text for a domain.
    ///
    /// Two outcomes matter to callers: `NoExpiryData` is terminal (the
    /// registry answered and the domain is unregistered, or it publishes no
    /// expiration event), while every other error means RDAP could not
    /// answer and WHOIS should be consulted instead.
    pub async fn fetch_expiration(&self, domain: &str) -> Result<String, DomainExpiryError> {
        let tld = extract_tld(domain)?;
        let endpoint = rdap_endpoint(&tld).ok_or_else(|| {
            DomainExpiryError::rdap(domain, format!("no RDAP endpoint known for .{}", tld))
        })?;

        let rdap_url = format!("{}{}", endpoint, domain);

        match tokio::time::timeout(self.timeout, self.request_expiration(&rdap_url, domain)).await
        {
            Ok(result) => result,
            Err(_) => Err(DomainExpiryError::rdap(
                domain,
                format!("RDAP request timed out after {:?}", self.timeout),
            )),
        }
    }

    /// Issue the RDAP request, retrying once on rate limiting.
    async fn request_expiration(
        &self,
        rdap_url: &str,
        domain: &str,
    ) -> Result<String, DomainExpiryError> {
        let response = self
            .http_client
            .get(rdap_url)
            .send()
            .await
            .map_err(|e| DomainExpiryError::rdap(domain, format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK => self.expiration_from_response(response, domain).await,
            StatusCode::NOT_FOUND => Err(DomainExpiryError::no_expiry_data(domain)),
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::debug!(domain = %domain, "RDAP rate limited, retrying once");
                tokio::time::sleep(RETRY_BACKOFF).await;

                let retry = self.http_client.get(rdap_url).send().await.map_err(|e| {
                    DomainExpiryError::rdap(domain, format!("retry request failed: {}", e))
                })?;

                match retry.status() {
                    StatusCode::OK => self.expiration_from_response(retry, domain).await,
                    StatusCode::NOT_FOUND => Err(DomainExpiryError::no_expiry_data(domain)),
                    status => Err(DomainExpiryError::rdap_with_status(
                        domain,
                        format!("RDAP server error after retry: {}", status),
                        status.as_u16(),
                    )),
                }
            }
            status => Err(DomainExpiryError::rdap_with_status(
                domain,
                format!("RDAP server returned error: {}", status),
                status.as_u16(),
            )),
        }
    }

    async fn expiration_from_response(
        &self,
        response: reqwest::Response,
        domain: &str,
    ) -> Result<String, DomainExpiryError> {
        let json: serde_json::Value = response.json().await.map_err(|e| {
            DomainExpiryError::rdap(domain, format!("failed to parse RDAP response: {}", e))
        })?;

        // A registered domain whose registry omits the expiration event gives
        // the caller nothing to fall back on; WHOIS would show the same.
        extract_expiration_event(&json).ok_or_else(|| DomainExpiryError::no_expiry_data(domain))
    }
}

/// Pull the expiration `eventDate` out of an RDAP response body.
pub fn extract_expiration_event(json: &serde_json::Value) -> Option<String> {
    let events = json.get("events")?.as_array()?;

    for event in events {
        let action = event.get("eventAction").and_then(|a| a.as_str());
        if action == Some("expiration") {
            if let Some(date) = event.get("eventDate").and_then(|d| d.as_str()) {
                return Some(date.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn canned_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\ncontent-type: application/rdap+json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    /// Serve each canned response on its own connection, counting requests.
    async fn serve_responses(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut chunk = [0u8; 512];
                loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&chunk[..n]);
                    if request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                socket.write_all(response.as_bytes()).await.unwrap();
            }
        });

        (base, hits)
    }

    #[test]
    fn test_extract_expiration_event() {
        let response = json!({
            "objectClassName": "domain",
            "ldhName": "EXAMPLE.COM",
            "events": [
                { "eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z" },
                { "eventAction": "expiration", "eventDate": "2030-01-15T04:00:00Z" },
                { "eventAction": "last changed", "eventDate": "2024-08-14T07:01:44Z" }
            ]
        });

        assert_eq!(
            extract_expiration_event(&response),
            Some("2030-01-15T04:00:00Z".to_string())
        );
    }

    #[test]
    fn test_extract_expiration_event_missing() {
        let no_expiration = json!({
            "events": [
                { "eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z" }
            ]
        });
        assert_eq!(extract_expiration_event(&no_expiration), None);

        let no_events = json!({ "objectClassName": "domain" });
        assert_eq!(extract_expiration_event(&no_events), None);

        let events_not_array = json!({ "events": "oops" });
        assert_eq!(extract_expiration_event(&events_not_array), None);
    }

    #[test]
    fn test_extract_expiration_event_skips_dateless_entries() {
        let response = json!({
            "events": [
                { "eventAction": "expiration" },
                { "eventAction": "expiration", "eventDate": "2031-06-01T00:00:00Z" }
            ]
        });

        assert_eq!(
            extract_expiration_event(&response),
            Some("2031-06-01T00:00:00Z".to_string())
        );
    }

    #[test]
    fn test_client_creation() {
        assert!(RdapClient::new().is_ok());
        assert!(RdapClient::with_timeout(Duration::from_secs(10)).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_expiration_requires_known_endpoint() {
        let client = RdapClient::new().unwrap();
        // .th has no bundled RDAP endpoint, so this fails without any
        // network traffic; the caller is expected to fall back to WHOIS.
        let result = client.fetch_expiration("example.co.th").await;
        assert!(matches!(
            result,
            Err(DomainExpiryError::RdapError { .. })
        ));
    }

    #[tokio::test]
    async fn test_rate_limited_request_is_retried_once() {
        let body = json!({
            "events": [
                { "eventAction": "expiration", "eventDate": "2030-01-15T04:00:00Z" }
            ]
        })
        .to_string();
        let (base, hits) = serve_responses(vec![
            canned_response("429 Too Many Requests", ""),
            canned_response("200 OK", &body),
        ])
        .await;

        let client = RdapClient::new().unwrap();
        let url = format!("{}/domain/example.com", base);
        let result = client.request_expiration(&url, "example.com").await;

        assert_eq!(result.unwrap(), "2030-01-15T04:00:00Z");
        assert_eq!(hits.load(Ordering::SeqCst), 2, "expected one retry");
    }

    #[tokio::test]
    async fn test_still_rate_limited_after_retry_is_an_error() {
        let (base, hits) = serve_responses(vec![
            canned_response("429 Too Many Requests", ""),
            canned_response("429 Too Many Requests", ""),
        ])
        .await;

        let client = RdapClient::new().unwrap();
        let url = format!("{}/domain/example.com", base);
        let result = client.request_expiration(&url, "example.com").await;

        match result {
            Err(DomainExpiryError::RdapError { status_code, .. }) => {
                assert_eq!(status_code, Some(429));
            }
            other => panic!("expected an RDAP error after the retry, got {:?}", other),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2, "expected no second retry");
    }
}
