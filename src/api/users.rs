// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Administrative user management.
//!
//! Gated by the route table (`admin:users:read` / `admin:users:write`);
//! destructive operations additionally require the `admin` role via the
//! `AdminOnly` extractor.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::extractor::{AdminOnly, Auth};
use crate::auth::resolver;
use crate::error::ApiError;
use crate::models::{hash_password, User};
use crate::state::AppState;
use crate::store::ConfigStore;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Primary resolved role; `user` when the subject has none.
    pub role: String,
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub groups: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserGroupsRequest {
    pub groups: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

fn user_info(user: &User, state: &AppState) -> UserInfo {
    let resolved = resolver::resolve(user, state.store.as_ref());
    UserInfo {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: resolved
            .roles
            .first()
            .cloned()
            .unwrap_or_else(|| "user".to_string()),
        groups: resolved.groups,
        created_at: user.created_at.clone(),
    }
}

fn ensure_groups_exist(state: &AppState, groups: &[String]) -> Result<(), ApiError> {
    for group_id in groups {
        if state.store.group(group_id).is_none() {
            return Err(ApiError::bad_request(format!(
                "unknown group: {group_id}"
            )));
        }
    }
    Ok(())
}

/// List all configured users with their resolved role and groups.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User list", body = [UserInfo]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing admin:users:read"),
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<UserInfo>> {
    let users = state.store.data().users;
    Json(users.iter().map(|u| user_info(u, &state)).collect())
}

/// Create a user. The password is stored as a salted hash, never verbatim.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users",
    tag = "Users",
    security(("bearer" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Username already exists"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserInfo>), ApiError> {
    if body.username.trim().is_empty() {
        return Err(ApiError::bad_request("username must not be empty"));
    }
    if body.password.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }
    if state.store.find_user(&body.username).is_some() {
        return Err(ApiError::conflict("username already exists"));
    }
    let groups = body.groups.unwrap_or_default();
    ensure_groups_exist(&state, &groups)?;

    let user = User {
        id: Some(Uuid::new_v4().to_string()),
        username: body.username.clone(),
        password: None,
        password_hash: Some(hash_password(&body.password)),
        email: body.email,
        roles: vec![],
        groups,
        created_at: Some(Utc::now().to_rfc3339()),
    };
    let info = user_info(&user, &state);
    state.store.mutate(|data| data.users.push(user))?;
    info!(actor = %identity.sub, username = %body.username, "user created");
    Ok((StatusCode::CREATED, Json(info)))
}

/// Replace a user's group memberships.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{username}/groups",
    tag = "Users",
    security(("bearer" = [])),
    request_body = UpdateUserGroupsRequest,
    responses(
        (status = 200, description = "Groups updated", body = UserInfo),
        (status = 400, description = "Unknown group"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn update_user_groups(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Path(username): Path<String>,
    Json(body): Json<UpdateUserGroupsRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    ensure_groups_exist(&state, &body.groups)?;

    let updated = state.store.mutate(|data| {
        let user = data.users.iter_mut().find(|u| u.username == username)?;
        user.groups = body.groups.clone();
        Some(user.clone())
    })?;
    let Some(user) = updated else {
        return Err(ApiError::not_found("user not found"));
    };
    info!(actor = %identity.sub, %username, groups = ?user.groups, "user groups updated");
    Ok(Json(user_info(&user, &state)))
}

/// Reset another user's password (admin role required).
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{username}/reset-password",
    tag = "Users",
    security(("bearer" = [])),
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 403, description = "Caller lacks the admin role"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    AdminOnly(identity): AdminOnly,
    Path(username): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if body.new_password.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }
    let found = state.store.mutate(|data| {
        match data.users.iter_mut().find(|u| u.username == username) {
            Some(user) => {
                user.password_hash = Some(hash_password(&body.new_password));
                // Plaintext field, if any, is retired on reset.
                user.password = None;
                true
            }
            None => false,
        }
    })?;
    if !found {
        return Err(ApiError::not_found("user not found"));
    }
    info!(actor = %identity.sub, %username, "password reset");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user. The break-glass `admin` account cannot be deleted.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{username}",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Refusing to delete the admin account"),
        (status = 403, description = "Caller lacks the admin role"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminOnly(identity): AdminOnly,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    if username == "admin" {
        return Err(ApiError::bad_request(
            "the admin account cannot be deleted",
        ));
    }
    let removed = state.store.mutate(|data| {
        let before = data.users.len();
        data.users.retain(|u| u.username != username);
        data.users.len() != before
    })?;
    if !removed {
        return Err(ApiError::not_found("user not found"));
    }
    info!(actor = %identity.sub, %username, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
