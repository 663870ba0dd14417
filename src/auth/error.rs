// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Authentication and authorization errors.
//!
//! The wire representation is deliberately coarse: every credential failure
//! (missing header, bad signature, expired, malformed) answers with the same
//! generic 401 body so callers cannot distinguish why a token was rejected.
//! The precise variant is still available internally for logging.

use axum::{
    http::{header::WWW_AUTHENTICATE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong while authenticating or authorizing a
/// request. The `Display` text is for logs, never for response bodies of
/// the 401 class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingAuthHeader,
    #[error("invalid Authorization header (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token does not split into three non-empty dot-separated parts, or a
    /// segment is not valid base64url/JSON.
    #[error("token is malformed")]
    MalformedToken,
    /// Header `alg`/`typ` differ from the expected constants.
    #[error("unsupported token header")]
    UnsupportedHeader,
    #[error("token signature mismatch")]
    InvalidSignature,
    /// `exp` missing or not an integer, or `sub` missing.
    #[error("token claims are invalid")]
    InvalidClaims,
    #[error("token has expired")]
    TokenExpired,
    /// Login rejected: unknown subject, bad password, or expired code.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("insufficient permissions")]
    InsufficientPermissions,
    #[error("insufficient roles")]
    InsufficientRoles,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl AuthError {
    /// Short machine-readable code, used in structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnsupportedHeader => "unsupported_header",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::InsufficientRoles => "insufficient_roles",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPermissions | AuthError::InsufficientRoles => {
                StatusCode::FORBIDDEN
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self.status_code() {
            StatusCode::FORBIDDEN => {
                let detail = match self {
                    AuthError::InsufficientRoles => "Insufficient roles",
                    _ => "Insufficient permissions",
                };
                (
                    StatusCode::FORBIDDEN,
                    Json(ErrorBody {
                        detail: detail.to_string(),
                    }),
                )
                    .into_response()
            }
            status => (
                status,
                [(WWW_AUTHENTICATE, "Bearer")],
                Json(ErrorBody {
                    detail: "Unauthorized".to_string(),
                }),
            )
                .into_response(),
        }
    }
}
