// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Token claims and the per-request identity derived from them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How the token was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    /// Username + password login.
    Password,
    /// Time-limited access code.
    Code,
}

impl std::fmt::Display for LoginMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginMode::Password => write!(f, "password"),
            LoginMode::Code => write!(f, "code"),
        }
    }
}

/// Payload of an issued token.
///
/// Validated once at the codec boundary; everything downstream works with
/// this struct instead of probing a raw JSON map. `exp` and `sub` are
/// mandatory; the list fields default to empty for tokens issued before a
/// field existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Subject identifier: username, or the access code itself.
    pub sub: String,
    pub login_mode: LoginMode,
    /// Issued-at, UNIX seconds.
    #[serde(default)]
    pub iat: i64,
    /// Expiry, UNIX seconds. The token is dead exactly at `exp`.
    pub exp: i64,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Verified identity attached to a request by the authorization gate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub sub: String,
    pub login_mode: LoginMode,
    pub roles: Vec<String>,
    pub groups: Vec<String>,
    pub permissions: Vec<String>,
    /// Token expiry, kept for logging; not serialized in responses.
    #[serde(skip)]
    pub expires_at: i64,
}

impl Identity {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            sub: claims.sub,
            login_mode: claims.login_mode,
            roles: claims.roles,
            groups: claims.groups,
            permissions: claims.permissions,
            expires_at: claims.exp,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Break-glass rule included: the exact username `admin` is always
    /// treated as an administrator regardless of its resolved roles.
    pub fn is_admin(&self) -> bool {
        self.sub == "admin" || self.has_role("admin")
    }
}
