// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Workflow Gate - token identity and permission resolution service
//!
//! A self-contained bearer-token layer for a workflow execution backend:
//! HMAC-signed tokens, group-based permission aggregation, and a
//! route-table authorization gate in front of the HTTP API.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, identity resolution, permission matching, gate
//! - `store` - JSON-file-backed auth configuration
//! - `models` - Users, access codes, groups

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
