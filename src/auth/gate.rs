// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Authorization gate: the per-request entry point.
//!
//! Each request walks the route table; the first matching rule decides the
//! requirement. A route with no rule is public by explicit default — the
//! table never raises on a miss, so every sensitive route must be
//! enumerated (pinned by a test below). Public routes never touch the
//! Authorization header, which is exactly the "treat identity as absent, do
//! not raise" behavior for broken tokens on unprotected paths.
//!
//! Held permissions are the union of the token's issued `permissions` claim
//! and a fresh aggregation over the token's `groups` against the current
//! store, so group edits take effect without re-login.

use std::collections::HashSet;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::Regex;
use tracing::{debug, warn};

use super::claims::Identity;
use super::error::AuthError;
use super::matcher::{self, MatchMode};
use super::token;
use crate::state::AppState;
use crate::store::ConfigStore;

/// Username that bypasses permission checks entirely (break-glass account).
/// Authentication is still required; only the permission stage is skipped.
pub const BREAK_GLASS_USERNAME: &str = "admin";

/// Requirement attached to a route rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// No checks at all.
    Public,
    /// A valid token is required; no specific permission.
    RequiresAuth,
    /// A valid token holding the listed permissions under `mode`.
    RequiresPermissions {
        permissions: Vec<String>,
        mode: MatchMode,
    },
}

/// One route rule: method filter, path pattern, requirement.
#[derive(Debug)]
pub struct RouteRule {
    /// `None` matches every method.
    methods: Option<Vec<Method>>,
    pattern: Regex,
    access: Access,
}

/// Ordered route-requirement table; first match wins.
#[derive(Debug, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. The pattern is anchored to the full path.
    pub fn rule(
        mut self,
        methods: Option<Vec<Method>>,
        pattern: &str,
        access: Access,
    ) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!("^{pattern}$"))?;
        self.rules.push(RouteRule {
            methods,
            pattern,
            access,
        });
        Ok(self)
    }

    /// Requirement for a request. A miss is an explicit `Public` default.
    pub fn requirement(&self, method: &Method, path: &str) -> &Access {
        for rule in &self.rules {
            let method_ok = rule
                .methods
                .as_ref()
                .map(|ms| ms.contains(method))
                .unwrap_or(true);
            if method_ok && rule.pattern.is_match(path) {
                return &rule.access;
            }
        }
        &Access::Public
    }
}

fn write_methods() -> Vec<Method> {
    vec![Method::POST, Method::PUT, Method::PATCH, Method::DELETE]
}

fn perms(list: &[&str], mode: MatchMode) -> Access {
    Access::RequiresPermissions {
        permissions: list.iter().map(|p| p.to_string()).collect(),
        mode,
    }
}

/// The shipped route table.
///
/// Login, health, and the API docs stay unlisted (public). The trailing
/// `/api/v1/admin/` catch-all carries the legacy coarse requirement for any
/// admin route added without its own rule.
pub fn default_route_table() -> RouteTable {
    RouteTable::new()
        .rule(None, r"/api/v1/auth/me", Access::RequiresAuth)
        .and_then(|t| t.rule(None, r"/api/v1/auth/permissions", Access::RequiresAuth))
        .and_then(|t| {
            t.rule(
                Some(vec![Method::GET]),
                r"/api/v1/auth/admin/ping",
                Access::RequiresAuth, // role checked in the handler
            )
        })
        .and_then(|t| {
            t.rule(
                Some(vec![Method::GET]),
                r"/api/v1/admin/users(/.*)?",
                perms(&["admin:users:read"], MatchMode::Any),
            )
        })
        .and_then(|t| {
            t.rule(
                Some(write_methods()),
                r"/api/v1/admin/users(/.*)?",
                perms(&["admin:users:write"], MatchMode::Any),
            )
        })
        .and_then(|t| {
            t.rule(
                Some(vec![Method::GET]),
                r"/api/v1/admin/groups(/.*)?",
                perms(&["admin:groups:read"], MatchMode::Any),
            )
        })
        .and_then(|t| {
            t.rule(
                Some(write_methods()),
                r"/api/v1/admin/groups(/.*)?",
                perms(&["admin:groups:write"], MatchMode::Any),
            )
        })
        .and_then(|t| {
            t.rule(
                None,
                r"/api/v1/admin/.*",
                perms(
                    &["user:*", "group:*", "workflow:*", "history:*"],
                    MatchMode::All,
                ),
            )
        })
        .expect("default route patterns are valid")
}

/// Pull the bearer token out of the Authorization header.
///
/// Scheme matching is case-insensitive; an empty token value is rejected.
pub(crate) fn extract_bearer(headers: &HeaderMap) -> Result<String, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;
    let (scheme, value) = header
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }
    let token = value.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token.to_string())
}

/// Union of the token's issued permissions and a fresh per-request
/// aggregation over its groups.
pub fn effective_permissions(identity: &Identity, store: &dyn ConfigStore) -> HashSet<String> {
    let mut held: HashSet<String> = identity.permissions.iter().cloned().collect();
    for group_id in &identity.groups {
        if let Some(group) = store.group(group_id) {
            held.extend(group.permissions.iter().cloned());
        }
    }
    held
}

fn check_request(state: &AppState, access: &Access, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let token = extract_bearer(headers)?;
    let claims = token::decode(&token, &state.store.secret())?;
    let identity = Identity::from_claims(claims);

    if identity.sub == BREAK_GLASS_USERNAME {
        debug!(sub = %identity.sub, "break-glass account, skipping permission checks");
        return Ok(identity);
    }

    if let Access::RequiresPermissions { permissions, mode } = access {
        let held = effective_permissions(&identity, state.store.as_ref());
        if !matcher::satisfies_all(&held, permissions, *mode) {
            return Err(AuthError::InsufficientPermissions);
        }
    }

    Ok(identity)
}

/// Axum middleware enforcing the route table.
///
/// On success the verified [`Identity`] is attached to request extensions
/// for extractors and handlers.
pub async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let access = state
        .routes
        .requirement(request.method(), request.uri().path())
        .clone();
    if access == Access::Public {
        return next.run(request).await;
    }

    match check_request(&state, &access, request.headers()) {
        Ok(identity) => {
            debug!(sub = %identity.sub, path = %request.uri().path(), "request authorized");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => {
            // The wire response stays generic; the precise reason goes to
            // the log only.
            warn!(
                path = %request.uri().path(),
                method = %request.method(),
                reason = err.code(),
                "request denied"
            );
            err.into_response()
        }
    }
}
