// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Login endpoints and identity echo.
//!
//! Two login modes exist: username + password, and a time-limited access
//! code. Both resolve the subject's effective identity and return a signed
//! bearer token whose claims are self-contained. Failed logins answer the
//! same generic 401 regardless of which step rejected them.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::claims::{Claims, Identity, LoginMode};
use crate::auth::error::AuthError;
use crate::auth::extractor::Auth;
use crate::auth::resolver::{self, Resolved};
use crate::auth::token;
use crate::models::SubjectRecord;
use crate::state::AppState;
use crate::store::ConfigStore;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    pub ok: bool,
    pub sub: String,
}

fn issue_token(
    state: &AppState,
    subject: &str,
    login_mode: LoginMode,
    resolved: Resolved,
) -> Result<TokenResponse, AuthError> {
    let iat = token::now_ts();
    let expires_in = state.store.token_expires_seconds();
    let claims = Claims {
        sub: subject.to_string(),
        login_mode,
        iat,
        exp: iat + expires_in,
        roles: resolved.roles,
        groups: resolved.groups,
        permissions: resolved.permissions,
    };
    let token = token::encode(&claims, &state.store.secret())?;
    Ok(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        expires_in,
    })
}

/// Username + password login.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn password_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let Some(user) = state.store.find_user(&body.username) else {
        warn!(username = %body.username, "login rejected: unknown user");
        return Err(AuthError::InvalidCredentials);
    };
    if !user.check_password(&body.password) {
        warn!(username = %body.username, "login rejected: bad password");
        return Err(AuthError::InvalidCredentials);
    }

    let resolved = resolver::resolve(&user, state.store.as_ref());
    info!(username = %body.username, roles = ?resolved.roles, "password login");
    Ok(Json(issue_token(
        &state,
        &body.username,
        LoginMode::Password,
        resolved,
    )?))
}

/// Access-code login. The code must exist and its `expires_at` must lie in
/// the future; the code string itself becomes the token subject.
#[utoipa::path(
    post,
    path = "/api/v1/auth/code",
    tag = "Auth",
    request_body = CodeRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Unknown or expired code"),
    )
)]
pub async fn code_login(
    State(state): State<AppState>,
    Json(body): Json<CodeRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let Some(code) = state.store.find_code(&body.code) else {
        warn!("code login rejected: unknown code");
        return Err(AuthError::InvalidCredentials);
    };
    if code.is_expired(token::now_ts()) {
        warn!("code login rejected: code expired");
        return Err(AuthError::InvalidCredentials);
    }

    let resolved = resolver::resolve(&code, state.store.as_ref());
    info!(roles = ?resolved.roles, "code login");
    Ok(Json(issue_token(
        &state,
        code.subject_id(),
        LoginMode::Code,
        resolved,
    )?))
}

/// Echo of the verified claims behind the current token.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current identity", body = Identity),
        (status = 401, description = "Invalid or missing token"),
    )
)]
pub async fn me(Auth(identity): Auth) -> Json<Identity> {
    Json(identity)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionEntry {
    pub id: String,
    pub name: String,
}

/// The caller's effective permissions as issued in the token, with display
/// names from the system catalog.
#[utoipa::path(
    get,
    path = "/api/v1/auth/permissions",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Permission list", body = [PermissionEntry]),
        (status = 401, description = "Invalid or missing token"),
    )
)]
pub async fn my_permissions(Auth(identity): Auth) -> Json<Vec<PermissionEntry>> {
    Json(
        identity
            .permissions
            .iter()
            .map(|id| PermissionEntry {
                id: id.clone(),
                name: super::groups::permission_name(id).to_string(),
            })
            .collect(),
    )
}

/// Admin smoke-test endpoint; requires the `admin` role.
#[utoipa::path(
    get,
    path = "/api/v1/auth/admin/ping",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller is an admin", body = PingResponse),
        (status = 403, description = "Caller lacks the admin role"),
    )
)]
pub async fn admin_ping(Auth(identity): Auth) -> Result<Json<PingResponse>, AuthError> {
    if !identity.is_admin() {
        return Err(AuthError::InsufficientRoles);
    }
    Ok(Json(PingResponse {
        ok: true,
        sub: identity.sub,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::decode;
    use crate::models::{AccessCode, AuthConfigData, Group, User};
    use crate::store::JsonConfigStore;
    use std::collections::BTreeMap;

    fn demo_state() -> AppState {
        let mut groups = BTreeMap::new();
        groups.insert(
            "viewer".to_string(),
            Group {
                name: "Viewer".into(),
                description: String::new(),
                permissions: vec!["workflow:read".into()],
                level: 10,
                created_at: None,
            },
        );
        groups.insert(
            "admin".to_string(),
            Group {
                name: "Administrators".into(),
                description: String::new(),
                permissions: vec!["admin:access".into(), "admin:users:read".into()],
                level: 100,
                created_at: None,
            },
        );
        let data = AuthConfigData {
            users: vec![User {
                id: None,
                username: "demo".into(),
                password: Some("demo123".into()),
                password_hash: None,
                email: None,
                roles: vec![],
                groups: vec!["viewer".into()],
                created_at: None,
            }],
            codes: vec![
                AccessCode {
                    code: "ADMIN-ONCALL".into(),
                    expires_at: "2099-01-01T00:00:00Z".into(),
                    roles: vec![],
                    groups: vec!["admin".into()],
                    permissions: vec![],
                },
                AccessCode {
                    code: "STALE".into(),
                    expires_at: "2000-01-01T00:00:00Z".into(),
                    roles: vec![],
                    groups: vec!["viewer".into()],
                    permissions: vec![],
                },
            ],
            groups,
            default_user_groups: vec!["viewer".into()],
            token_secret: Some("s3cret".into()),
            token_expires_seconds: Some(3600),
        };
        AppState::new(JsonConfigStore::in_memory(data))
    }

    #[tokio::test]
    async fn password_login_round_trips() {
        let state = demo_state();
        let response = password_login(
            State(state.clone()),
            Json(LoginRequest {
                username: "demo".into(),
                password: "demo123".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.token_type, "bearer");
        assert_eq!(response.expires_in, 3600);

        let claims = decode(&response.access_token, "s3cret").unwrap();
        assert_eq!(claims.sub, "demo");
        assert_eq!(claims.login_mode, LoginMode::Password);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.groups, vec!["viewer".to_string()]);
        assert!(claims.permissions.contains(&"workflow:read".to_string()));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let state = demo_state();
        let err = password_login(
            State(state),
            Json(LoginRequest {
                username: "demo".into(),
                password: "nope".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn unknown_user_is_invalid_credentials() {
        let state = demo_state();
        let err = password_login(
            State(state),
            Json(LoginRequest {
                username: "ghost".into(),
                password: "x".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn admin_code_login_escalates() {
        let state = demo_state();
        let response = code_login(
            State(state),
            Json(CodeRequest {
                code: "ADMIN-ONCALL".into(),
            }),
        )
        .await
        .unwrap();

        let claims = decode(&response.access_token, "s3cret").unwrap();
        assert_eq!(claims.sub, "ADMIN-ONCALL");
        assert_eq!(claims.login_mode, LoginMode::Code);
        assert!(claims.roles.contains(&"admin".to_string()));
        assert!(claims.permissions.contains(&"admin:access".to_string()));
    }

    #[tokio::test]
    async fn expired_code_is_rejected() {
        let state = demo_state();
        let err = code_login(State(state), Json(CodeRequest { code: "STALE".into() }))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn my_permissions_echoes_claims_with_names() {
        use crate::auth::claims::Claims;
        use crate::auth::token::now_ts;

        let identity = Identity::from_claims(Claims {
            sub: "demo".into(),
            login_mode: LoginMode::Password,
            iat: now_ts(),
            exp: now_ts() + 60,
            roles: vec![],
            groups: vec![],
            permissions: vec!["admin:access".into(), "custom:grant".into()],
        });
        let listed = my_permissions(Auth(identity)).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "admin:access");
        assert_eq!(listed[0].name, "Access the admin panel");
        // Unknown ids fall back to the id itself.
        assert_eq!(listed[1].name, "custom:grant");
    }

    #[tokio::test]
    async fn admin_ping_checks_role() {
        use crate::auth::claims::Claims;
        use crate::auth::token::now_ts;

        let plain = Identity::from_claims(Claims {
            sub: "demo".into(),
            login_mode: LoginMode::Password,
            iat: now_ts(),
            exp: now_ts() + 60,
            roles: vec!["user".into()],
            groups: vec![],
            permissions: vec![],
        });
        let err = admin_ping(Auth(plain)).await.unwrap_err();
        assert_eq!(err, AuthError::InsufficientRoles);

        let admin = Identity::from_claims(Claims {
            sub: "ops".into(),
            login_mode: LoginMode::Password,
            iat: now_ts(),
            exp: now_ts() + 60,
            roles: vec!["admin".into()],
            groups: vec![],
            permissions: vec![],
        });
        let response = admin_ping(Auth(admin)).await.unwrap();
        assert!(response.ok);
        assert_eq!(response.sub, "ops");
    }
}
