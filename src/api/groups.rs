// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Administrative group management and the system permission catalog.
//!
//! Group permissions are validated against the catalog at write time. A
//! candidate ending in `:*` is accepted when at least one catalog entry
//! falls under its prefix, so a config author can grant `user:*` without
//! enumerating every `user:` permission.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::auth::extractor::Auth;
use crate::auth::matcher;
use crate::error::ApiError;
use crate::models::Group;
use crate::state::AppState;
use crate::store::ConfigStore;

/// Every concrete permission the system knows about, with a human-readable
/// name for admin UIs. Route requirements and group grants are validated
/// against this list.
pub const SYSTEM_PERMISSIONS: &[(&str, &str)] = &[
    ("admin:access", "Access the admin panel"),
    ("admin:users:read", "View user accounts"),
    ("admin:users:write", "Manage user accounts"),
    ("admin:groups:read", "View groups"),
    ("admin:groups:write", "Manage groups"),
    ("admin:workflows:read", "View the workflow list"),
    ("admin:workflows:write", "Manage workflows"),
    ("admin:history:read", "View all execution history"),
    ("admin:codes:read", "View access codes"),
    ("admin:codes:write", "Manage access codes"),
    ("workflow:read:*", "Read any workflow"),
    ("workflow:execute:*", "Execute any workflow"),
    ("user:read:self", "View own account"),
    ("user:update:self", "Update own account"),
    ("user:reset_password:self", "Reset own password"),
    ("history:read:self", "View own execution history"),
];

/// Human-readable name for a permission id; unknown ids echo back.
pub fn permission_name(id: &str) -> &str {
    SYSTEM_PERMISSIONS
        .iter()
        .find(|(perm, _)| *perm == id)
        .map(|(_, name)| *name)
        .unwrap_or(id)
}

/// A candidate grant is valid when it names a catalog entry, or when it is a
/// wildcard under which at least one catalog entry falls.
fn is_valid_permission(candidate: &str) -> bool {
    let catalog = SYSTEM_PERMISSIONS
        .iter()
        .map(|(perm, _)| perm.to_string())
        .collect();
    matcher::wildcard_overlaps(&catalog, candidate)
}

fn validate_permissions(permissions: &[String]) -> Result<(), ApiError> {
    let invalid: Vec<&String> = permissions
        .iter()
        .filter(|p| !is_valid_permission(p))
        .collect();
    if !invalid.is_empty() {
        return Err(ApiError::bad_request(format!(
            "unknown permissions: {invalid:?}"
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub level: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default = "default_level")]
    pub level: i64,
}

fn default_level() -> i64 {
    50
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub level: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionInfo {
    pub id: String,
    pub name: String,
}

fn group_info(id: &str, group: &Group) -> GroupInfo {
    GroupInfo {
        id: id.to_string(),
        name: if group.name.is_empty() {
            id.to_string()
        } else {
            group.name.clone()
        },
        description: group.description.clone(),
        permissions: group.permissions.clone(),
        level: group.level,
        created_at: group.created_at.clone(),
    }
}

/// List all groups.
#[utoipa::path(
    get,
    path = "/api/v1/admin/groups",
    tag = "Groups",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Group list", body = [GroupInfo]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing admin:groups:read"),
    )
)]
pub async fn list_groups(State(state): State<AppState>) -> Json<Vec<GroupInfo>> {
    let groups = state.store.data().groups;
    Json(
        groups
            .iter()
            .map(|(id, group)| group_info(id, group))
            .collect(),
    )
}

/// Fetch a single group by id.
#[utoipa::path(
    get,
    path = "/api/v1/admin/groups/{group_id}",
    tag = "Groups",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Group", body = GroupInfo),
        (status = 404, description = "Group not found"),
    )
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupInfo>, ApiError> {
    match state.store.data().groups.get(&group_id) {
        Some(group) => Ok(Json(group_info(&group_id, group))),
        None => Err(ApiError::not_found("group not found")),
    }
}

/// Create a group. Grants are validated against the permission catalog.
#[utoipa::path(
    post,
    path = "/api/v1/admin/groups",
    tag = "Groups",
    security(("bearer" = [])),
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupInfo),
        (status = 400, description = "Invalid id or unknown permission"),
        (status = 409, description = "Group id already exists"),
    )
)]
pub async fn create_group(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupInfo>), ApiError> {
    let id = body.id.trim();
    if id.is_empty() {
        return Err(ApiError::bad_request("group id must not be empty"));
    }
    if state.store.data().groups.contains_key(id) {
        return Err(ApiError::conflict("group id already exists"));
    }
    validate_permissions(&body.permissions)?;

    let group = Group {
        name: body.name,
        description: body.description,
        permissions: body.permissions,
        level: body.level,
        created_at: Some(Utc::now().to_rfc3339()),
    };
    let info = group_info(id, &group);
    let id = id.to_string();
    state.store.mutate(|data| {
        data.groups.insert(id.clone(), group);
    })?;
    info!(actor = %identity.sub, group = %id, "group created");
    Ok((StatusCode::CREATED, Json(info)))
}

/// Partial group update; `created_at` is immutable.
#[utoipa::path(
    put,
    path = "/api/v1/admin/groups/{group_id}",
    tag = "Groups",
    security(("bearer" = [])),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = GroupInfo),
        (status = 400, description = "Unknown permission"),
        (status = 404, description = "Group not found"),
    )
)]
pub async fn update_group(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Path(group_id): Path<String>,
    Json(body): Json<UpdateGroupRequest>,
) -> Result<Json<GroupInfo>, ApiError> {
    if let Some(permissions) = &body.permissions {
        validate_permissions(permissions)?;
    }

    let updated = state.store.mutate(|data| {
        let group = data.groups.get_mut(&group_id)?;
        if let Some(name) = body.name {
            group.name = name;
        }
        if let Some(description) = body.description {
            group.description = description;
        }
        if let Some(permissions) = body.permissions {
            group.permissions = permissions;
        }
        if let Some(level) = body.level {
            group.level = level;
        }
        Some(group.clone())
    })?;
    let Some(group) = updated else {
        return Err(ApiError::not_found("group not found"));
    };
    info!(actor = %identity.sub, group = %group_id, "group updated");
    Ok(Json(group_info(&group_id, &group)))
}

/// Delete a group. The `admin` group and any group named in
/// `default_user_groups` are protected.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/groups/{group_id}",
    tag = "Groups",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 400, description = "Group is protected"),
        (status = 404, description = "Group not found"),
    )
)]
pub async fn delete_group(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if group_id == "admin" {
        return Err(ApiError::bad_request("the admin group cannot be deleted"));
    }
    if state.store.default_user_groups().contains(&group_id) {
        return Err(ApiError::bad_request(
            "group is referenced by default_user_groups",
        ));
    }
    let removed = state
        .store
        .mutate(|data| data.groups.remove(&group_id).is_some())?;
    if !removed {
        return Err(ApiError::not_found("group not found"));
    }
    info!(actor = %identity.sub, group = %group_id, "group deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// The full permission catalog with display names.
#[utoipa::path(
    get,
    path = "/api/v1/admin/groups/permissions/list",
    tag = "Groups",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Permission catalog", body = [PermissionInfo]),
    )
)]
pub async fn list_system_permissions() -> Json<Vec<PermissionInfo>> {
    Json(
        SYSTEM_PERMISSIONS
            .iter()
            .map(|(id, name)| PermissionInfo {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect(),
    )
}
