// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy evaluation.
//!
//! Evaluation is two-phase:
//!
//! 1. **Role check**: the action's [`Requirement`] against the principal's role
//! 2. **Row check**: for user-scoped actions, the target user's attributes
//!
//! Both phases are pure functions. A denial is a value, never an error.

use libris_core::Role;
use tracing::instrument;

use super::types::{Action, Decision, DenyReason, Requirement, UserTarget};
use crate::principal::Principal;

/// Decide whether `principal` (or an anonymous caller) may perform `action`.
#[instrument(
	level = "debug",
	skip(principal),
	fields(
		user_id = ?principal.map(|p| p.user_id),
		role = ?principal.map(|p| p.role),
		action = ?action,
	)
)]
pub fn authorize(principal: Option<&Principal>, action: Action) -> Decision {
	let decision = match (action.requirement(), principal) {
		(Requirement::Public, _) => Decision::Allow,
		(_, None) => Decision::Deny(DenyReason::AuthenticationRequired),
		(Requirement::Authenticated, Some(_)) => Decision::Allow,
		(Requirement::Permission(set), Some(p)) => {
			if set.contains(p.role) {
				Decision::Allow
			} else {
				Decision::Deny(DenyReason::PermissionDenied)
			}
		}
	};

	tracing::debug!(?decision, "policy evaluated");
	decision
}

/// Decide a user-scoped action against a specific target row.
///
/// Runs [`authorize`] first, then:
/// - deletion of one's own account is denied
/// - plain staff may only list, create or edit members
/// - profile edits only reach the principal's own record
#[instrument(
	level = "debug",
	skip(principal, target),
	fields(user_id = %principal.user_id, action = ?action, target_id = %target.id, target_role = %target.role)
)]
pub fn authorize_user_target(principal: &Principal, action: Action, target: &UserTarget) -> Decision {
	if let Decision::Deny(reason) = authorize(Some(principal), action) {
		return Decision::Deny(reason);
	}

	let decision = match action {
		Action::DeleteUser if target.id == principal.user_id => Decision::Deny(DenyReason::SelfDeletion),
		Action::EditOwnProfile if target.id != principal.user_id => {
			Decision::Deny(DenyReason::PermissionDenied)
		}
		Action::ListUsers | Action::CreateUser | Action::EditUser
			if !can_view_user(principal, target.role) =>
		{
			Decision::Deny(DenyReason::StaffMemberOnly)
		}
		_ => Decision::Allow,
	};

	tracing::debug!(?decision, "row policy evaluated");
	decision
}

/// Whether a user with `target_role` is within the principal's reach.
pub fn can_view_user(principal: &Principal, target_role: Role) -> bool {
	!principal.is_plain_staff() || target_role == Role::Member
}
