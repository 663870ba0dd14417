// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Identity resolution.
//!
//! Turns a subject record into an effective `(roles, groups, permissions)`
//! triple. Permissions are the ground truth; roles are a derived label
//! layer computed from them, so a new high-privilege group grants the
//! `admin` role without a mapping table.
//!
//! Resolution reads the store fresh on every call; nothing is cached.

use std::collections::BTreeSet;

use crate::models::SubjectRecord;
use crate::store::ConfigStore;

/// Permission prefix that marks a group as admin-bearing.
const ADMIN_PERMISSION_PREFIX: &str = "admin:";

/// Legacy privilege tier at or above which a group counts as
/// admin-equivalent. Kept alongside the permission-prefix trigger; either
/// alone is sufficient.
const ADMIN_LEVEL_THRESHOLD: i64 = 100;

/// Permission every holder of the `admin` role is guaranteed, however the
/// role was obtained.
pub const ADMIN_ACCESS_PERMISSION: &str = "admin:access";

/// Effective identity of a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Deduplicated; explicit roles first in their original order, a
    /// synthesized `admin` appended last.
    pub roles: Vec<String>,
    /// The group set actually used for permission aggregation.
    pub groups: Vec<String>,
    /// Unordered; returned sorted for determinism.
    pub permissions: Vec<String>,
}

/// Resolve a subject against the current store snapshot.
///
/// The subject's explicit `roles`/`groups` are never invented here, only
/// expanded: the `default_user_groups` fallback applies only when the
/// subject carries neither roles nor groups. Unknown group ids contribute
/// nothing.
pub fn resolve(subject: &dyn SubjectRecord, store: &dyn ConfigStore) -> Resolved {
    let mut roles: Vec<String> = subject.roles().to_vec();
    let mut groups: Vec<String> = subject.groups().to_vec();

    if roles.is_empty() && groups.is_empty() {
        groups = store.default_user_groups();
    }

    let mut permissions: BTreeSet<String> = BTreeSet::new();
    let mut admin_bearing = false;

    for group_id in &groups {
        let Some(group) = store.group(group_id) else {
            continue;
        };
        if group.level >= ADMIN_LEVEL_THRESHOLD
            || group
                .permissions
                .iter()
                .any(|p| p.starts_with(ADMIN_PERMISSION_PREFIX))
        {
            admin_bearing = true;
        }
        permissions.extend(group.permissions.iter().cloned());
    }

    // Subject-level explicit grants (access codes) join the union, but only
    // groups can trigger admin escalation.
    permissions.extend(subject.explicit_permissions().iter().cloned());

    if admin_bearing && !roles.iter().any(|r| r == "admin") {
        roles.push("admin".to_string());
    }

    if roles.iter().any(|r| r == "admin") {
        permissions.insert(ADMIN_ACCESS_PERMISSION.to_string());
    }

    let mut seen = BTreeSet::new();
    let roles = roles
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect();

    Resolved {
        roles,
        groups,
        permissions: permissions.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccessCode, AuthConfigData, Group, User};
    use crate::store::JsonConfigStore;
    use std::collections::BTreeMap;

    fn store_with(groups: &[(&str, &[&str], i64)], defaults: &[&str]) -> JsonConfigStore {
        let mut map = BTreeMap::new();
        for (id, perms, level) in groups {
            map.insert(
                id.to_string(),
                Group {
                    name: id.to_string(),
                    description: String::new(),
                    permissions: perms.iter().map(|p| p.to_string()).collect(),
                    level: *level,
                    created_at: None,
                },
            );
        }
        JsonConfigStore::in_memory(AuthConfigData {
            groups: map,
            default_user_groups: defaults.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        })
    }

    fn user(roles: &[&str], groups: &[&str]) -> User {
        User {
            id: None,
            username: "subject".into(),
            password: None,
            password_hash: None,
            email: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            created_at: None,
        }
    }

    #[test]
    fn bare_subject_falls_back_to_default_groups() {
        let store = store_with(&[("viewer", &["workflow:read"], 10)], &["viewer"]);
        let resolved = resolve(&user(&[], &[]), &store);
        assert_eq!(resolved.groups, vec!["viewer".to_string()]);
        assert_eq!(resolved.permissions, vec!["workflow:read".to_string()]);
        assert!(resolved.roles.is_empty());
    }

    #[test]
    fn explicit_roles_suppress_default_fallback() {
        let store = store_with(&[("viewer", &["workflow:read"], 10)], &["viewer"]);
        let resolved = resolve(&user(&["operator"], &[]), &store);
        assert!(resolved.groups.is_empty());
        assert!(resolved.permissions.is_empty());
        assert_eq!(resolved.roles, vec!["operator".to_string()]);
    }

    #[test]
    fn group_permissions_are_unioned() {
        let store = store_with(
            &[
                ("viewer", &["workflow:read"], 10),
                ("editor", &["workflow:read", "workflow:write"], 20),
            ],
            &[],
        );
        let resolved = resolve(&user(&[], &["viewer", "editor"]), &store);
        assert_eq!(
            resolved.permissions,
            vec!["workflow:read".to_string(), "workflow:write".to_string()]
        );
    }

    #[test]
    fn admin_permission_prefix_escalates() {
        let store = store_with(&[("managers", &["admin:users:manage"], 10)], &[]);
        let resolved = resolve(&user(&[], &["managers"]), &store);
        assert!(resolved.roles.contains(&"admin".to_string()));
        assert!(resolved
            .permissions
            .contains(&ADMIN_ACCESS_PERMISSION.to_string()));
    }

    #[test]
    fn legacy_level_escalates_without_admin_permissions() {
        let store = store_with(&[("power", &["workflow:write"], 100)], &[]);
        let resolved = resolve(&user(&[], &["power"]), &store);
        assert!(resolved.roles.contains(&"admin".to_string()));
        assert!(resolved
            .permissions
            .contains(&ADMIN_ACCESS_PERMISSION.to_string()));
    }

    #[test]
    fn level_below_threshold_does_not_escalate() {
        let store = store_with(&[("power", &["workflow:write"], 99)], &[]);
        let resolved = resolve(&user(&[], &["power"]), &store);
        assert!(!resolved.roles.contains(&"admin".to_string()));
        assert!(!resolved
            .permissions
            .contains(&ADMIN_ACCESS_PERMISSION.to_string()));
    }

    #[test]
    fn explicit_admin_role_gains_admin_access() {
        let store = store_with(&[], &[]);
        let resolved = resolve(&user(&["admin"], &[]), &store);
        assert_eq!(resolved.roles, vec!["admin".to_string()]);
        assert_eq!(
            resolved.permissions,
            vec![ADMIN_ACCESS_PERMISSION.to_string()]
        );
    }

    #[test]
    fn explicit_roles_come_first_and_admin_is_not_duplicated() {
        let store = store_with(&[("ops", &["admin:groups:write"], 0)], &[]);
        let resolved = resolve(&user(&["user", "admin", "user"], &["ops"]), &store);
        assert_eq!(
            resolved.roles,
            vec!["user".to_string(), "admin".to_string()]
        );
    }

    #[test]
    fn unknown_groups_contribute_nothing() {
        let store = store_with(&[], &[]);
        let resolved = resolve(&user(&[], &["ghost"]), &store);
        assert_eq!(resolved.groups, vec!["ghost".to_string()]);
        assert!(resolved.permissions.is_empty());
        assert!(resolved.roles.is_empty());
    }

    #[test]
    fn access_code_explicit_permissions_join_without_escalating() {
        let store = store_with(&[], &[]);
        let code = AccessCode {
            code: "ONCALL".into(),
            expires_at: "2099-01-01T00:00:00Z".into(),
            roles: vec![],
            groups: vec!["nonexistent".into()],
            permissions: vec!["admin:users:manage".into()],
        };
        let resolved = resolve(&code, &store);
        // Subject-level admin:* grants do not mint the admin role.
        assert!(!resolved.roles.contains(&"admin".to_string()));
        assert!(resolved
            .permissions
            .contains(&"admin:users:manage".to_string()));
    }
}
