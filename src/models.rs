// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Configuration-domain records: subjects (users and access codes), groups,
//! and the on-disk auth configuration document.
//!
//! The auth config file is hand-edited JSON, so list fields deserialize
//! leniently: non-string entries are silently discarded rather than failing
//! the whole document.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Salt appended to passwords before hashing.
///
/// Adaptive hashing (bcrypt/scrypt) is an explicit non-goal; stored hashes
/// are salted SHA-256 hex digests.
const PASSWORD_SALT: &str = "workflow_gate_salt";

/// Deserialize a JSON value into a list of strings, discarding anything that
/// is not a string. Missing fields and non-array values become empty lists.
pub(crate) fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// A persistent user identity from the auth configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier; generated on creation via the admin API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    /// Plaintext password (legacy hand-edited configs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Salted SHA-256 hex digest, written by the admin API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Explicit roles. Never invented by the resolver, only expanded.
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub roles: Vec<String>,
    /// Explicit group memberships.
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A time-limited access code (standalone bearer secret).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCode {
    pub code: String,
    /// ISO-8601 expiry. `Z` and offsets are accepted; a naive datetime is
    /// treated as local time. Unparseable values count as expired.
    pub expires_at: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub roles: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub groups: Vec<String>,
    /// Explicit fine-grained grants carried by the code itself.
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub permissions: Vec<String>,
}

/// A group definition. Groups are mutually independent; there is no
/// inheritance hierarchy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub permissions: Vec<String>,
    /// Legacy privilege tier; `>= 100` historically meant admin-equivalent.
    #[serde(default)]
    pub level: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// The on-disk auth configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfigData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub codes: Vec<AccessCode>,
    #[serde(default)]
    pub groups: BTreeMap<String, Group>,
    /// Baseline groups for subjects with neither roles nor groups.
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub default_user_groups: Vec<String>,
    /// Signing secret; overridden by the `TOKEN_SECRET` env variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expires_seconds: Option<i64>,
}

/// A record the identity resolver can turn into an effective
/// `(roles, groups, permissions)` triple.
pub trait SubjectRecord {
    /// Token `sub` value for this subject.
    fn subject_id(&self) -> &str;
    fn roles(&self) -> &[String];
    fn groups(&self) -> &[String];
    /// Explicit subject-level grants (access codes only).
    fn explicit_permissions(&self) -> &[String] {
        &[]
    }
}

impl SubjectRecord for User {
    fn subject_id(&self) -> &str {
        &self.username
    }
    fn roles(&self) -> &[String] {
        &self.roles
    }
    fn groups(&self) -> &[String] {
        &self.groups
    }
}

impl SubjectRecord for AccessCode {
    fn subject_id(&self) -> &str {
        &self.code
    }
    fn roles(&self) -> &[String] {
        &self.roles
    }
    fn groups(&self) -> &[String] {
        &self.groups
    }
    fn explicit_permissions(&self) -> &[String] {
        &self.permissions
    }
}

/// Hash a password with the fixed salt. Empty input hashes to the empty
/// string so an absent password can never verify.
pub fn hash_password(password: &str) -> String {
    if password.is_empty() {
        return String::new();
    }
    let digest = Sha256::digest(format!("{password}{PASSWORD_SALT}").as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compare a candidate password against a stored salted hash.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    if password.is_empty() || hashed.is_empty() {
        return false;
    }
    hash_password(password) == hashed
}

impl User {
    /// Check a login attempt against this record.
    ///
    /// A plaintext `password` field wins when present (hand-edited configs);
    /// otherwise the salted hash is consulted. A record with neither never
    /// authenticates.
    pub fn check_password(&self, candidate: &str) -> bool {
        if let Some(stored) = &self.password {
            return !stored.is_empty() && stored == candidate;
        }
        if let Some(hash) = &self.password_hash {
            return verify_password(candidate, hash);
        }
        false
    }
}

impl AccessCode {
    /// Whether this code's `expires_at` lies in the past (or is unparseable).
    pub fn is_expired(&self, now: i64) -> bool {
        match parse_expires_at(&self.expires_at) {
            Some(ts) => now >= ts,
            None => true,
        }
    }
}

/// Parse an ISO-8601 datetime into epoch seconds.
///
/// Accepts a trailing `Z` or an explicit offset; a naive datetime is taken
/// as local time. Returns `None` on any parse failure.
pub fn parse_expires_at(expires_at: &str) -> Option<i64> {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

    let s = expires_at.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }

    // Naive datetime, treated as local time.
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_list_discards_non_strings() {
        let user: User = serde_json::from_str(
            r#"{"username": "u", "roles": ["a", 1, null, "b"], "groups": "oops"}"#,
        )
        .unwrap();
        assert_eq!(user.roles, vec!["a", "b"]);
        assert!(user.groups.is_empty());
    }

    #[test]
    fn hash_round_trip() {
        let hash = hash_password("demo123");
        assert_eq!(hash.len(), 64);
        assert!(verify_password("demo123", &hash));
        assert!(!verify_password("demo124", &hash));
    }

    #[test]
    fn empty_password_never_verifies() {
        assert_eq!(hash_password(""), "");
        assert!(!verify_password("", ""));
        assert!(!verify_password("x", ""));
    }

    #[test]
    fn check_password_prefers_plaintext_field() {
        let user = User {
            id: None,
            username: "u".into(),
            password: Some("plain".into()),
            password_hash: Some(hash_password("other")),
            email: None,
            roles: vec![],
            groups: vec![],
            created_at: None,
        };
        assert!(user.check_password("plain"));
        assert!(!user.check_password("other"));
    }

    #[test]
    fn check_password_falls_back_to_hash() {
        let user = User {
            id: None,
            username: "u".into(),
            password: None,
            password_hash: Some(hash_password("secret")),
            email: None,
            roles: vec![],
            groups: vec![],
            created_at: None,
        };
        assert!(user.check_password("secret"));
        assert!(!user.check_password("wrong"));
    }

    #[test]
    fn parse_expires_at_accepts_zulu_and_offset() {
        assert_eq!(parse_expires_at("1970-01-01T00:00:10Z"), Some(10));
        assert_eq!(parse_expires_at("1970-01-01T01:00:10+01:00"), Some(10));
        assert_eq!(parse_expires_at("not-a-date"), None);
        assert_eq!(parse_expires_at(""), None);
    }

    #[test]
    fn expired_code_detection() {
        let code = AccessCode {
            code: "X".into(),
            expires_at: "1970-01-01T00:00:10Z".into(),
            roles: vec![],
            groups: vec![],
            permissions: vec![],
        };
        assert!(code.is_expired(10)); // dead exactly at expiry
        assert!(code.is_expired(11));
        assert!(!code.is_expired(9));
    }

    #[test]
    fn unparseable_expiry_counts_as_expired() {
        let code = AccessCode {
            code: "X".into(),
            expires_at: "garbage".into(),
            roles: vec![],
            groups: vec![],
            permissions: vec![],
        };
        assert!(code.is_expired(0));
    }
}
