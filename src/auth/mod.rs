// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! # Authentication & Authorization
//!
//! Self-signed bearer tokens plus an RBAC/ABAC-hybrid permission engine.
//!
//! ## Flow
//!
//! 1. A subject logs in with a password or an access code
//! 2. The identity resolver computes its effective
//!    `(roles, groups, permissions)` triple from the config store
//! 3. The token codec signs the claims (HS256, `typ: "TOKEN"`)
//! 4. Requests present `Authorization: Bearer <token>`; the gate matches
//!    the route table, verifies the token, and checks permissions
//!
//! ## Security
//!
//! - Signature comparison is constant-time
//! - Expiry is the only deactivation mechanism; tokens die exactly at `exp`
//! - Every credential failure answers the same generic 401 (no oracle)
//! - Unlisted routes are public by an explicit, tested default

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod matcher;
pub mod resolver;
pub mod token;

pub use claims::{Claims, Identity, LoginMode};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use gate::{default_route_table, Access, RouteTable};
pub use matcher::MatchMode;
