//! Unverified JWT payload decoding
//!
//! Reads the claims segment of a compact `header.payload.signature` token
//! without checking the signature. The result is only a hint for skipping
//! requests that are bound to fail; the backend remains the sole authority
//! on whether a token is valid.

use crate::error::TokenError;
use crate::types::Claims;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine as _, alphabet};
use chrono::{DateTime, Utc};

/// base64url with optional padding, as produced by common JWT issuers
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the claims of a token
pub fn decode(token: &str) -> Result<Claims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(TokenError::Malformed {
            segments: segments.len(),
        });
    };

    let bytes = PAYLOAD_ENGINE
        .decode(payload)
        .map_err(|e| TokenError::base64(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| TokenError::json(e.to_string()))
}

/// Whether the token is expired at the current time
///
/// Any decode failure counts as expired.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now().timestamp())
}

/// Whether the token is expired at `now` (epoch seconds)
pub fn is_expired_at(token: &str, now: i64) -> bool {
    decode(token).map_or(true, |claims| claims.exp < now)
}

/// Expiry instant of the token, if it can be decoded
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    decode(token)
        .ok()
        .and_then(|claims| DateTime::from_timestamp(claims.exp, 0))
}
