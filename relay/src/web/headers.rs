//! Header-name normalization for case-insensitive lookups.

use std::collections::HashMap;

/// Lower-case every header name so later lookups are case-insensitive.
///
/// Names that collide after folding are last-write-wins.
pub fn normalize_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| (name.to_lowercase(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_headers_lowercases_names() {
        let headers = header_map(&[
            ("X-Hub-Signature", "sha256=abc"),
            ("Content-Type", "application/json"),
        ]);

        let normalized = normalize_headers(&headers);

        assert_eq!(
            normalized.get("x-hub-signature").map(String::as_str),
            Some("sha256=abc")
        );
        assert_eq!(
            normalized.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert!(!normalized.contains_key("X-Hub-Signature"));
    }

    #[test]
    fn test_normalize_headers_preserves_values() {
        let headers = header_map(&[("X-Event-Key", "Diagnostics:Ping")]);

        let normalized = normalize_headers(&headers);

        // Only names fold, values pass through untouched.
        assert_eq!(
            normalized.get("x-event-key").map(String::as_str),
            Some("Diagnostics:Ping")
        );
    }

    #[test]
    fn test_normalize_headers_idempotent() {
        let headers = header_map(&[("x-event-key", "diagnostics:ping")]);

        let once = normalize_headers(&headers);
        let twice = normalize_headers(&once);

        assert_eq!(once, twice);
        assert_eq!(once, headers);
    }

    #[test]
    fn test_normalize_headers_empty() {
        assert!(normalize_headers(&HashMap::new()).is_empty());
    }
}
