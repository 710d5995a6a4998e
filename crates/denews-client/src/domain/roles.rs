//! # Role Classification
//!
//! Pure derivation of a caller's permitted views from the active identity
//! and the ledger-reported role assignment. No side effects, no network
//! access; the caller fetches the assignment first.

use serde::{Deserialize, Serialize};

use super::entities::{Address, RoleAssignment};

/// The view set a caller is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May manage the authors set. Classification as admin does not remove
    /// any author capability the identity also holds.
    Admin,
    /// May publish articles.
    Author,
    /// May browse public articles.
    Reader,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Author => f.write_str("author"),
            Self::Reader => f.write_str("reader"),
        }
    }
}

/// Classify `identity` against `assignment`.
///
/// Admin takes precedence for panel-access purposes; publish capability is
/// still decided by [`RoleAssignment::can_publish`] independently.
pub fn role_for(identity: &Address, assignment: &RoleAssignment) -> Role {
    if *identity == assignment.admin {
        Role::Admin
    } else if assignment.authors.contains(identity) {
        Role::Author
    } else {
        Role::Reader
    }
}
