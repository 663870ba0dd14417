// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Configuration store.
//!
//! The identity resolver and the authorization gate depend only on the
//! [`ConfigStore`] trait; callers decide caching and reload policy. The
//! shipped implementation is a JSON file store with an in-memory mode for
//! tests. Reads always reflect the latest committed write; no snapshot is
//! held across requests.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::warn;

use crate::config::{DEFAULT_TOKEN_EXPIRES_SECONDS, DEFAULT_TOKEN_SECRET, TOKEN_SECRET_ENV};
use crate::models::{AccessCode, AuthConfigData, Group, User};

/// Read interface consumed by the auth core.
///
/// All methods return owned snapshots so callers never hold the store lock
/// across await points.
pub trait ConfigStore: Send + Sync {
    fn find_user(&self, username: &str) -> Option<User>;
    fn find_code(&self, code: &str) -> Option<AccessCode>;
    fn group(&self, id: &str) -> Option<Group>;
    fn groups(&self) -> BTreeMap<String, Group>;
    fn default_user_groups(&self) -> Vec<String>;
    /// Effective signing secret: `TOKEN_SECRET` env, then the config file,
    /// then the insecure hard fallback.
    fn secret(&self) -> String;
    fn token_expires_seconds(&self) -> i64;
}

/// JSON-file-backed configuration store.
///
/// With a path, every mutation is persisted: a `.bak` copy of the previous
/// file is kept and the new content is written to a temp file and renamed
/// into place. Without a path (tests), mutations stay in memory.
pub struct JsonConfigStore {
    path: Option<PathBuf>,
    inner: RwLock<AuthConfigData>,
}

impl JsonConfigStore {
    /// Load from `path`. A missing or invalid file logs a warning and
    /// yields an empty configuration; it is not a startup failure.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<AuthConfigData>(&raw) {
                Ok(data) => data,
                Err(err) => {
                    warn!(path = %path.display(), %err, "invalid auth config, starting empty");
                    AuthConfigData::default()
                }
            },
            Err(err) => {
                warn!(path = %path.display(), %err, "auth config not readable, starting empty");
                AuthConfigData::default()
            }
        };
        Self {
            path: Some(path),
            inner: RwLock::new(data),
        }
    }

    /// Purely in-memory store seeded with `data`.
    pub fn in_memory(data: AuthConfigData) -> Self {
        Self {
            path: None,
            inner: RwLock::new(data),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, AuthConfigData> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a mutation and persist the result.
    ///
    /// Both the mutation and the write to disk run under the write lock, so
    /// the file always holds the latest committed state in write order;
    /// concurrent mutations cannot persist out of order.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut AuthConfigData) -> R) -> io::Result<R> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut guard);
        if let Some(path) = &self.path {
            persist(path, &guard)?;
        }
        Ok(result)
    }

    /// Owned copy of the full document (admin listing endpoints).
    pub fn data(&self) -> AuthConfigData {
        self.read().clone()
    }
}

fn persist(path: &Path, data: &AuthConfigData) -> io::Result<()> {
    if path.exists() {
        let backup = path.with_extension("json.bak");
        if let Err(err) = std::fs::copy(path, &backup) {
            warn!(path = %backup.display(), %err, "failed to write auth config backup");
        }
    }
    let serialized = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serialized.as_bytes())?;
    std::fs::rename(&tmp, path)
}

impl ConfigStore for JsonConfigStore {
    fn find_user(&self, username: &str) -> Option<User> {
        if username.is_empty() {
            return None;
        }
        self.read()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    fn find_code(&self, code: &str) -> Option<AccessCode> {
        if code.is_empty() {
            return None;
        }
        self.read().codes.iter().find(|c| c.code == code).cloned()
    }

    fn group(&self, id: &str) -> Option<Group> {
        self.read().groups.get(id).cloned()
    }

    fn groups(&self) -> BTreeMap<String, Group> {
        self.read().groups.clone()
    }

    fn default_user_groups(&self) -> Vec<String> {
        self.read().default_user_groups.clone()
    }

    fn secret(&self) -> String {
        if let Ok(secret) = std::env::var(TOKEN_SECRET_ENV) {
            if !secret.is_empty() {
                return secret;
            }
        }
        self.read()
            .token_secret
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_SECRET.to_string())
    }

    fn token_expires_seconds(&self) -> i64 {
        self.read()
            .token_expires_seconds
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_TOKEN_EXPIRES_SECONDS)
    }
}
