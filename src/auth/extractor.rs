// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Axum extractors for authenticated identities.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is a verified Identity
//! }
//! ```
//!
//! When the authorization gate already ran for the route, the identity
//! comes from request extensions; otherwise the extractor verifies the
//! bearer token itself.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::claims::Identity;
use super::error::AuthError;
use super::gate::extract_bearer;
use super::token;
use crate::state::AppState;
use crate::store::ConfigStore;

/// Extractor for a verified identity.
pub struct Auth(pub Identity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>().cloned() {
            return Ok(Auth(identity));
        }

        let token = extract_bearer(&parts.headers)?;
        let claims = token::decode(&token, &state.store.secret())?;
        Ok(Auth(Identity::from_claims(claims)))
    }
}

/// Extractor that additionally requires the `admin` role (or the
/// break-glass username).
pub struct AdminOnly(pub Identity);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(identity) = Auth::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            return Err(AuthError::InsufficientRoles);
        }
        Ok(AdminOnly(identity))
    }
}
