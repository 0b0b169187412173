//! Bitbucket Server webhook signature verification.
//!
//! Bitbucket Server signs each webhook delivery with HMAC-SHA256 over the
//! raw body and sends the digest as `X-Hub-Signature: sha256=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook delivery signature.
///
/// The digest is the portion of `signature_header` after the first `=`
/// (wire format `<algorithm>=<hexdigest>`). A header without a digest
/// fails closed, as does an empty signing secret.
///
/// # Returns
///
/// `true` if the digest matches the HMAC-SHA256 of `raw_body` keyed with
/// `signing_secret`.
pub fn verify_signature(signing_secret: &str, signature_header: &str, raw_body: &str) -> bool {
    if signing_secret.is_empty() || signature_header.is_empty() {
        warn!(
            has_signing_secret = !signing_secret.is_empty(),
            has_signature = !signature_header.is_empty(),
            "signature_missing_fields"
        );
        return false;
    }

    let Some((_, digest)) = signature_header.split_once('=') else {
        warn!("signature_header_malformed");
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(signing_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("signature_invalid_key");
            return false;
        }
    };

    mac.update(raw_body.as_bytes());

    let expected = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected, digest);

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = digest.len(),
            "signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_verify_signature_valid() {
        let secret = "webhook-signing-secret";
        let body = r#"{"eventKey":"repo:refs_changed"}"#;
        let header = format!("sha256={}", sign(secret, body));

        assert!(verify_signature(secret, &header, body));
    }

    #[test]
    fn test_verify_signature_flipped_digit_fails() {
        let secret = "webhook-signing-secret";
        let body = r#"{"eventKey":"repo:refs_changed"}"#;
        let digest = sign(secret, body);

        // Flip every hex character in turn; none may verify.
        for i in 0..digest.len() {
            let mut flipped: Vec<char> = digest.chars().collect();
            flipped[i] = if flipped[i] == '0' { '1' } else { '0' };
            let header = format!("sha256={}", flipped.iter().collect::<String>());
            assert!(!verify_signature(secret, &header, body));
        }
    }

    #[test]
    fn test_verify_signature_wrong_secret_fails() {
        let body = r#"{"eventKey":"repo:refs_changed"}"#;
        let header = format!("sha256={}", sign("right-secret", body));

        assert!(!verify_signature("wrong-secret", &header, body));
    }

    #[test]
    fn test_verify_signature_header_without_digest_fails() {
        let secret = "webhook-signing-secret";
        let body = "{}";

        assert!(!verify_signature(secret, "sha256", body));
        assert!(!verify_signature(secret, sign(secret, body).as_str(), body));
    }

    #[test]
    fn test_verify_signature_missing_fields() {
        assert!(!verify_signature("", "sha256=abc", "{}"));
        assert!(!verify_signature("secret", "", "{}"));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
