// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

//! Permission matching.
//!
//! Permission strings follow the grammar `segment(":"segment)*`; a final
//! `*` segment is a prefix grant. All wildcard logic in the crate lives
//! here; callers never reimplement prefix rules.
//!
//! The authorization path uses [`satisfies`], where only held permissions
//! expand wildcards. A wildcard on the required side is a configuration-time
//! construct and is resolved by [`wildcard_overlaps`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How a multi-permission requirement combines its entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// At least one required permission must be satisfied.
    #[default]
    Any,
    /// Every required permission must be satisfied.
    All,
}

/// Decide whether a held permission set satisfies a single concrete
/// required permission.
///
/// Rules, in order:
/// - exact containment;
/// - the supreme grant `"*"`;
/// - a held entry `prefix:*` satisfies any required permission of the form
///   `prefix:<non-empty suffix>` (`ns:*` does not satisfy the bare `ns:`).
///
/// Wildcards are never expanded on the required side here: a caller holding
/// only `workflow:read` does not satisfy a literal requirement of
/// `workflow:*` (that exact string can still be held, and then matches by
/// containment).
pub fn satisfies(held: &HashSet<String>, required: &str) -> bool {
    if held.contains(required) {
        return true;
    }
    if held.contains("*") {
        return true;
    }
    held.iter().any(|grant| {
        grant
            .strip_suffix(":*")
            .is_some_and(|prefix| is_prefixed(required, prefix))
    })
}

/// The symmetric, configuration-time rule: does any held permission fall
/// under a wildcard-shaped `required` string?
///
/// Used when a wildcard appears on the requirement side (route-table
/// authoring, permission-catalog validation). The same non-empty-suffix
/// prefix rule applies. A concrete `required` degrades to [`satisfies`].
pub fn wildcard_overlaps(held: &HashSet<String>, required: &str) -> bool {
    match required.strip_suffix(":*") {
        Some(prefix) => {
            satisfies(held, required) || held.iter().any(|grant| is_prefixed(grant, prefix))
        }
        None => satisfies(held, required),
    }
}

/// `candidate` starts with `prefix:` and has at least one character after
/// the separator.
fn is_prefixed(candidate: &str, prefix: &str) -> bool {
    candidate
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(':'))
        .is_some_and(|suffix| !suffix.is_empty())
}

/// Check a full requirement list under the given mode.
///
/// An empty requirement list is vacuously satisfied (the route then only
/// needs authentication). Requirement entries may themselves be
/// wildcard-shaped (the legacy admin catch-all carries `user:*` etc.), so
/// each entry is evaluated with [`wildcard_overlaps`]; for concrete entries
/// that is exactly [`satisfies`].
pub fn satisfies_all(held: &HashSet<String>, required: &[String], mode: MatchMode) -> bool {
    if required.is_empty() {
        return true;
    }
    match mode {
        MatchMode::All => required.iter().all(|r| wildcard_overlaps(held, r)),
        MatchMode::Any => required.iter().any(|r| wildcard_overlaps(held, r)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(perms: &[&str]) -> HashSet<String> {
        perms.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match() {
        assert!(satisfies(&held(&["workflow:read"]), "workflow:read"));
        assert!(!satisfies(&held(&["workflow:read"]), "workflow:write"));
    }

    #[test]
    fn supreme_grant_matches_everything() {
        assert!(satisfies(&held(&["*"]), "anything:at:all"));
        assert!(satisfies(&held(&["*"]), "x"));
    }

    #[test]
    fn held_wildcard_grants_prefixed_permissions() {
        let h = held(&["workflow:*"]);
        assert!(satisfies(&h, "workflow:read"));
        assert!(satisfies(&h, "workflow:forms:submit"));
        assert!(!satisfies(&h, "history:read"));
    }

    #[test]
    fn wildcard_needs_non_empty_suffix() {
        // "workflow:" has a zero-length suffix after the separator.
        assert!(!satisfies(&held(&["workflow:*"]), "workflow:"));
        // Nor does the prefix alone qualify.
        assert!(!satisfies(&held(&["workflow:*"]), "workflow"));
    }

    #[test]
    fn required_side_wildcard_is_not_expanded_in_auth_path() {
        // Holding a concrete leaf does not satisfy a wildcard requirement.
        assert!(!satisfies(&held(&["workflow:read"]), "workflow:*"));
        // Holding the identical wildcard string does, by containment.
        assert!(satisfies(&held(&["workflow:*"]), "workflow:*"));
    }

    #[test]
    fn wildcard_overlaps_expands_the_required_side() {
        assert!(wildcard_overlaps(&held(&["user:read"]), "user:*"));
        assert!(!wildcard_overlaps(&held(&["usertrailing"]), "user:*"));
        assert!(!wildcard_overlaps(&held(&["other:read"]), "user:*"));
        // Concrete requirements degrade to the primary rule.
        assert!(wildcard_overlaps(&held(&["user:read"]), "user:read"));
        assert!(!wildcard_overlaps(&held(&["user:read"]), "user:write"));
    }

    #[test]
    fn empty_requirement_is_vacuously_satisfied() {
        assert!(satisfies_all(&held(&[]), &[], MatchMode::Any));
        assert!(satisfies_all(&held(&[]), &[], MatchMode::All));
    }

    #[test]
    fn any_mode_needs_one() {
        let h = held(&["workflow:read"]);
        let req = vec!["history:read".to_string(), "workflow:read".to_string()];
        assert!(satisfies_all(&h, &req, MatchMode::Any));
        assert!(!satisfies_all(&h, &req, MatchMode::All));
    }

    #[test]
    fn all_mode_needs_every() {
        let h = held(&["workflow:read", "history:read"]);
        let req = vec!["history:read".to_string(), "workflow:read".to_string()];
        assert!(satisfies_all(&h, &req, MatchMode::All));
    }

    #[test]
    fn wildcard_requirement_entries_accept_concrete_holders() {
        // The legacy admin catch-all requires one grant under each prefix;
        // holding a concrete permission per prefix must satisfy it.
        let h = held(&["user:read:self", "group:read", "workflow:read", "history:read"]);
        let req: Vec<String> = ["user:*", "group:*", "workflow:*", "history:*"]
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert!(satisfies_all(&h, &req, MatchMode::All));

        // A holder missing one prefix entirely still fails under `all`.
        let partial = held(&["user:read:self", "group:read", "workflow:read"]);
        assert!(!satisfies_all(&partial, &req, MatchMode::All));
    }

    #[test]
    fn prefix_must_align_on_separator() {
        // "work:*" must not match "workflow:read".
        assert!(!satisfies(&held(&["work:*"]), "workflow:read"));
        // Deep prefixes match deeper leaves.
        assert!(satisfies(&held(&["admin:users:*"]), "admin:users:manage"));
        assert!(!satisfies(&held(&["admin:users:*"]), "admin:users:"));
    }
}
