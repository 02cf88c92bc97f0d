//! Domain normalization.
//!
//! This module turns free-form user input (URLs, mixed case, stray paths,
//! trailing FQDN dots) into a canonical registrable domain name. Every step
//! is a hard gate: input that cannot be salvaged yields `None` rather than a
//! best-guess string.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    /// Character class a normalized domain must satisfy (ASCII only, so raw
    /// unicode IDNs are rejected and punycode input is required).
    static ref DOMAIN_SHAPE: Regex = Regex::new(r"^[a-z0-9.-]+$").unwrap();
}

/// Normalize a raw domain string to its registrable form.
///
/// Steps, in order, each failing to `None`:
/// 1. Trim whitespace; empty input fails.
/// 2. `http://` / `https://` input is parsed as a URL and reduced to its
///    hostname; a malformed URL is a hard failure, not a fallback.
/// 3. Anything after the first `/`, `?` or `#` is dropped (covers a path
///    given without a scheme).
/// 4. Lowercase.
/// 5. One trailing FQDN root dot comes off; a dot still remaining after that
///    fails (keeps normalization idempotent for inputs like `a.b..`).
/// 6. The result must match `[a-z0-9.-]+` and contain at least one dot.
/// 7. The registrable domain (public suffix + one label) is resolved; when
///    resolution yields nothing the validated string itself is returned.
///
/// IP-literal-looking strings pass the character test and come back as typed.
///
/// # Arguments
///
/// * `input` - The raw domain string from the caller
///
/// # Returns
///
/// The canonical domain, or `None` when the input is not a usable domain.
pub fn normalize_domain(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut value = trimmed.to_string();

    if value.starts_with("http://") || value.starts_with("https://") {
        let url = Url::parse(&value).ok()?;
        value = url.host_str()?.to_string();
    }

    for separator in ['/', '?', '#'] {
        if let Some(index) = value.find(separator) {
            value.truncate(index);
        }
    }

    value = value.to_lowercase();

    if let Some(stripped) = value.strip_suffix('.') {
        value = stripped.to_string();
    }
    if value.ends_with('.') {
        return None;
    }

    if !DOMAIN_SHAPE.is_match(&value) || !value.contains('.') {
        return None;
    }

    let registrable = addr::parse_domain_name(&value)
        .ok()
        .and_then(|name| name.root().map(str::to_string));

    Some(registrable.unwrap_or(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_scheme_and_path() {
        assert_eq!(
            normalize_domain("https://WWW.Example.com/path?q=1"),
            Some("example.com".to_string())
        );
        assert_eq!(
            normalize_domain("http://example.com/"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_normalize_strips_path_without_scheme() {
        assert_eq!(
            normalize_domain("example.com/some/path"),
            Some("example.com".to_string())
        );
        assert_eq!(
            normalize_domain("example.com?q=1"),
            Some("example.com".to_string())
        );
        assert_eq!(
            normalize_domain("example.com#fragment"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_normalize_lowercases() {
        assert_eq!(
            normalize_domain("EXAMPLE.COM"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_normalize_strips_single_trailing_dot() {
        assert_eq!(
            normalize_domain("example.com."),
            Some("example.com".to_string())
        );
        // A second trailing dot is not salvageable.
        assert_eq!(normalize_domain("a.b.."), None);
    }

    #[test]
    fn test_normalize_rejects_free_text() {
        assert_eq!(normalize_domain("not a domain"), None);
        assert_eq!(normalize_domain("hello_world.com"), None);
    }

    #[test]
    fn test_normalize_rejects_empty_input() {
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("   "), None);
    }

    #[test]
    fn test_normalize_requires_a_dot() {
        assert_eq!(normalize_domain("xn--zzz"), None);
        assert_eq!(normalize_domain("localhost"), None);
    }

    #[test]
    fn test_normalize_malformed_url_is_hard_failure() {
        // Scheme present but no usable host: never falls back to the raw string.
        assert_eq!(normalize_domain("http://"), None);
        assert_eq!(normalize_domain("https://exa mple.com"), None);
    }

    #[test]
    fn test_normalize_resolves_registrable_domain() {
        assert_eq!(
            normalize_domain("sub.example.com"),
            Some("example.com".to_string())
        );
        assert_eq!(
            normalize_domain("deep.sub.example.co.uk"),
            Some("example.co.uk".to_string())
        );
    }

    #[test]
    fn test_normalize_keeps_unresolvable_values_as_is() {
        // IP-literal-looking input passes the character test and is returned
        // as typed; there is no IP detection.
        assert_eq!(
            normalize_domain("192.168.1.1"),
            Some("192.168.1.1".to_string())
        );
    }

    #[test]
    fn test_normalize_unicode_requires_punycode() {
        assert_eq!(normalize_domain("münchen.de"), None);
        assert_eq!(
            normalize_domain("xn--mnchen-3ya.de"),
            Some("xn--mnchen-3ya.de".to_string())
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://WWW.Example.com/path?q=1",
            "example.com.",
            "EXAMPLE.COM",
            "sub.example.co.uk",
            "192.168.1.1",
            "example.com/path",
        ];

        for input in inputs {
            let once = normalize_domain(input);
            let normalized = once.clone().unwrap();
            assert_eq!(normalize_domain(&normalized), once, "input: {}", input);
        }
    }
}
