// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Token codec: compact three-part self-signed bearer tokens.
//!
//! Wire format: `base64url(header) "." base64url(claims) "."
//! base64url(hmac_sha256(header_b64 "." claims_b64, secret))`, all segments
//! unpadded. The header is exactly `{"alg":"HS256","typ":"TOKEN"}`.
//!
//! Tokens are immutable once issued and there is no revocation list; expiry
//! is the only deactivation mechanism. A token is dead exactly at `exp`,
//! not only after it.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::claims::Claims;
use super::error::AuthError;

/// Signing algorithm identifier in the token header.
pub const TOKEN_ALG: &str = "HS256";
/// Token type identifier in the token header.
pub const TOKEN_TYP: &str = "TOKEN";

type HmacSha256 = Hmac<Sha256>;

/// Current UNIX timestamp in seconds.
pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

fn mac(secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length.
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}

fn b64(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

fn b64_decode(segment: &str) -> Result<Vec<u8>, AuthError> {
    Base64UrlUnpadded::decode_vec(segment).map_err(|_| AuthError::MalformedToken)
}

/// Encode and sign `claims`.
///
/// Pure function of claims + secret; repeated calls with identical input
/// produce identical tokens. The `exp` precondition is carried by the type:
/// [`Claims`] cannot be built without an integer expiry.
pub fn encode(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    let header = serde_json::json!({ "alg": TOKEN_ALG, "typ": TOKEN_TYP });
    let header_b64 = b64(&serde_json::to_vec(&header).map_err(|_| AuthError::InvalidClaims)?);
    let payload_b64 = b64(&serde_json::to_vec(claims).map_err(|_| AuthError::InvalidClaims)?);

    let mut mac = mac(secret);
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    let signature = b64(&mac.finalize().into_bytes());

    Ok(format!("{header_b64}.{payload_b64}.{signature}"))
}

/// Decode and verify a token against the current clock.
pub fn decode(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode_at(token, secret, now_ts())
}

/// Decode and verify a token at an explicit point in time.
///
/// Verification order: structure, header constants, signature
/// (constant-time), claims shape, expiry. The signature is checked before
/// the payload is parsed, so claim contents are never inspected on a forged
/// token.
pub fn decode_at(token: &str, secret: &str, now: i64) -> Result<Claims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(AuthError::MalformedToken);
    }
    let (header_b64, payload_b64, signature_b64) = (parts[0], parts[1], parts[2]);

    let header: serde_json::Value =
        serde_json::from_slice(&b64_decode(header_b64)?).map_err(|_| AuthError::MalformedToken)?;
    if header.get("alg").and_then(|v| v.as_str()) != Some(TOKEN_ALG)
        || header.get("typ").and_then(|v| v.as_str()) != Some(TOKEN_TYP)
    {
        return Err(AuthError::UnsupportedHeader);
    }

    let signature = b64_decode(signature_b64)?;
    let mut mac = mac(secret);
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    // verify_slice is constant-time; a plain == would leak the first
    // mismatching byte position.
    mac.verify_slice(&signature)
        .map_err(|_| AuthError::InvalidSignature)?;

    let payload: serde_json::Value =
        serde_json::from_slice(&b64_decode(payload_b64)?).map_err(|_| AuthError::MalformedToken)?;
    let exp = payload
        .get("exp")
        .and_then(|v| v.as_i64())
        .ok_or(AuthError::InvalidClaims)?;
    if now >= exp {
        return Err(AuthError::TokenExpired);
    }

    serde_json::from_value(payload).map_err(|_| AuthError::InvalidClaims)
}
