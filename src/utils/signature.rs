//! HMAC-SHA256 request signing shared by the IoT sync endpoint and the
//! payment gateway webhook.
//!
//! The signed message is `"{timestamp}.{raw_body}"`, the signature is sent as
//! lowercase hex. Timestamps are unix seconds and must fall within the
//! configured tolerance of the server clock.

use crate::error::{AppError, AppResult};
use actix_web::http::StatusCode;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";

pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::ConfigError(format!("invalid signing secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn unauthorized(code: &str, message: &str) -> AppError {
    AppError::service(code, message).with_status(StatusCode::UNAUTHORIZED)
}

/// Checks the timestamp window first, then the signature in constant time.
pub fn verify_signed_payload(
    secret: &str,
    payload: &[u8],
    signature: Option<&str>,
    timestamp: Option<&str>,
    tolerance_secs: i64,
    now: i64,
) -> AppResult<()> {
    if secret.is_empty() {
        return Err(AppError::ConfigError("signing secret is not configured".into()));
    }

    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| unauthorized("invalid_signature", "Missing signature header"))?;
    let timestamp: i64 = timestamp
        .and_then(|t| t.trim().parse().ok())
        .ok_or_else(|| unauthorized("invalid_timestamp", "Missing or malformed timestamp"))?;

    if now.abs_diff(timestamp) > tolerance_secs.max(0).unsigned_abs() {
        return Err(unauthorized(
            "timestamp_expired",
            "Request timestamp outside the allowed window",
        ));
    }

    let expected = sign_payload(secret, timestamp, payload)?;
    let provided = signature.to_ascii_lowercase();
    if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
        Ok(())
    } else {
        Err(unauthorized("invalid_signature", "Signature mismatch"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "station-fleet-secret";
    const BODY: &[u8] = br#"{"type":"status","data":{"device_serial":"CG-001","status":"ONLINE"}}"#;

    #[test]
    fn test_valid_signature_accepted() {
        let now = 1_760_000_000;
        let sig = sign_payload(SECRET, now, BODY).unwrap();
        let ts = now.to_string();
        assert!(verify_signed_payload(SECRET, BODY, Some(&sig), Some(&ts), 300, now).is_ok());
        // upper case hex is tolerated
        let upper = sig.to_uppercase();
        assert!(verify_signed_payload(SECRET, BODY, Some(&upper), Some(&ts), 300, now + 10).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let now = 1_760_000_000;
        let sig = sign_payload(SECRET, now, BODY).unwrap();
        let ts = now.to_string();
        let err = verify_signed_payload(SECRET, b"{}", Some(&sig), Some(&ts), 300, now).unwrap_err();
        assert_eq!(err.code(), "invalid_signature");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = 1_760_000_000;
        let sig = sign_payload("other", now, BODY).unwrap();
        let ts = now.to_string();
        let err = verify_signed_payload(SECRET, BODY, Some(&sig), Some(&ts), 300, now).unwrap_err();
        assert_eq!(err.code(), "invalid_signature");
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let signed_at = 1_760_000_000;
        let sig = sign_payload(SECRET, signed_at, BODY).unwrap();
        let ts = signed_at.to_string();
        let err = verify_signed_payload(SECRET, BODY, Some(&sig), Some(&ts), 300, signed_at + 301)
            .unwrap_err();
        assert_eq!(err.code(), "timestamp_expired");
        // clock skew the other way is bounded too
        let err = verify_signed_payload(SECRET, BODY, Some(&sig), Some(&ts), 300, signed_at - 301)
            .unwrap_err();
        assert_eq!(err.code(), "timestamp_expired");
    }

    #[test]
    fn test_missing_headers_rejected() {
        let now = 1_760_000_000;
        let ts = now.to_string();
        let err = verify_signed_payload(SECRET, BODY, None, Some(&ts), 300, now).unwrap_err();
        assert_eq!(err.code(), "invalid_signature");
        let err = verify_signed_payload(SECRET, BODY, Some("abc"), None, 300, now).unwrap_err();
        assert_eq!(err.code(), "invalid_timestamp");
        let err =
            verify_signed_payload(SECRET, BODY, Some("abc"), Some("yesterday"), 300, now).unwrap_err();
        assert_eq!(err.code(), "invalid_timestamp");
    }

    #[test]
    fn test_extreme_timestamps_rejected() {
        let now = 1_760_000_000;
        for ts in [i64::MIN.to_string(), i64::MAX.to_string()] {
            let err = verify_signed_payload(SECRET, BODY, Some("00"), Some(&ts), 300, now)
                .unwrap_err();
            assert_eq!(err.code(), "timestamp_expired");
        }
    }

    #[test]
    fn test_unconfigured_secret_is_server_error() {
        let err = verify_signed_payload("", BODY, Some("abc"), Some("1"), 300, 1).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
