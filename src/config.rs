// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH_CONFIG_PATH` | Path to the JSON auth config (users, codes, groups) | `auth.json` |
//! | `TOKEN_SECRET` | HMAC signing secret, overrides the config file value | config / `change-me` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable naming the JSON auth configuration file.
///
/// The file holds users, access codes, group definitions,
/// `default_user_groups`, and optionally the signing secret and token
/// lifetime. A missing or unreadable file yields an empty configuration
/// with defaults (logged as a warning), not a startup failure.
pub const AUTH_CONFIG_PATH_ENV: &str = "AUTH_CONFIG_PATH";

/// Default auth configuration path, relative to the working directory.
pub const DEFAULT_AUTH_CONFIG_PATH: &str = "auth.json";

/// Environment variable for the token signing secret.
///
/// Resolution order: this variable, then `token_secret` in the config file,
/// then [`DEFAULT_TOKEN_SECRET`].
pub const TOKEN_SECRET_ENV: &str = "TOKEN_SECRET";

/// Hard fallback signing secret. Insecure; startup logs a warning whenever
/// the effective secret resolves to this value.
pub const DEFAULT_TOKEN_SECRET: &str = "change-me";

/// Default token lifetime in seconds (1 hour).
pub const DEFAULT_TOKEN_EXPIRES_SECONDS: i64 = 3600;
