// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! HTTP surface.
//!
//! Every route under `/api/v1` passes through the authorization gate
//! middleware before reaching its handler; the route table in
//! [`crate::auth::gate`] decides what each path requires. Swagger UI and
//! the OpenAPI document are served outside the gated subtree.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::claims::{Identity, LoginMode};
use crate::auth::gate;
use crate::state::AppState;

pub mod auth;
pub mod groups;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/login", post(auth::password_login))
        .route("/auth/code", post(auth::code_login))
        .route("/auth/me", get(auth::me))
        .route("/auth/permissions", get(auth::my_permissions))
        .route("/auth/admin/ping", get(auth::admin_ping))
        .route(
            "/admin/users",
            get(users::list_users).post(users::create_user),
        )
        .route("/admin/users/{username}", delete(users::delete_user))
        .route(
            "/admin/users/{username}/groups",
            put(users::update_user_groups),
        )
        .route(
            "/admin/users/{username}/reset-password",
            post(users::reset_password),
        )
        .route(
            "/admin/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route(
            "/admin/groups/permissions/list",
            get(groups::list_system_permissions),
        )
        .route(
            "/admin/groups/{group_id}",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route("/health", get(health::health))
        .with_state(state.clone());

    // Nesting strips the `/api/v1` prefix before inner layers run, so the
    // gate must sit outside the nest to match the table's full paths.
    Router::new()
        .nest("/api/v1", v1_routes)
        .layer(middleware::from_fn_with_state(state, gate::authorize))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::password_login,
        auth::code_login,
        auth::me,
        auth::my_permissions,
        auth::admin_ping,
        users::list_users,
        users::create_user,
        users::update_user_groups,
        users::reset_password,
        users::delete_user,
        groups::list_groups,
        groups::get_group,
        groups::create_group,
        groups::update_group,
        groups::delete_group,
        groups::list_system_permissions,
        health::health
    ),
    components(
        schemas(
            Identity,
            LoginMode,
            auth::LoginRequest,
            auth::CodeRequest,
            auth::TokenResponse,
            auth::PermissionEntry,
            auth::PingResponse,
            users::UserInfo,
            users::CreateUserRequest,
            users::UpdateUserGroupsRequest,
            users::ResetPasswordRequest,
            groups::GroupInfo,
            groups::CreateGroupRequest,
            groups::UpdateGroupRequest,
            groups::PermissionInfo,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Login and identity"),
        (name = "Users", description = "User administration"),
        (name = "Groups", description = "Group administration and permission catalog"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;
