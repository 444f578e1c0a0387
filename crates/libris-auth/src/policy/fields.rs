// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Which user-form fields a principal may see and set.
//!
//! The same [`UserFieldSet`] is rendered into the form context and consulted
//! by the validator, so a field that is not offered is never read back.

use libris_core::Role;
use serde::Serialize;

use super::types::UserTarget;
use crate::principal::Principal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserFieldSet {
	/// The role selector is shown and its value honoured.
	pub role_visible: bool,
	/// Roles offered by the selector.
	pub role_choices: Vec<Role>,
	/// Creating a user needs a password; editing keeps the old one when blank.
	pub password_required: bool,
}

impl UserFieldSet {
	pub fn allows_role(&self, role: Role) -> bool {
		self.role_visible && self.role_choices.contains(&role)
	}
}

/// Shape the user form for `principal`. `target` is `None` when creating.
pub fn allowed_user_fields(principal: &Principal, target: Option<&UserTarget>) -> UserFieldSet {
	let editing_self = target.is_some_and(|t| t.id == principal.user_id);

	let (role_visible, role_choices) = match principal.role {
		Role::Admin => (true, Role::all().to_vec()),
		Role::Staff if editing_self => (false, Vec::new()),
		Role::Staff => {
			let visible = target.map_or(true, |t| t.role == Role::Member);
			(visible, vec![Role::Member])
		}
		Role::Member => (false, Vec::new()),
	};

	UserFieldSet {
		role_visible,
		role_choices,
		password_required: target.is_none(),
	}
}

/// The role actually persisted when `principal` saves a user with `requested`.
///
/// Plain staff always save members, whatever the form carried.
pub fn enforce_role_on_save(principal: &Principal, requested: Role) -> Role {
	if principal.is_plain_staff() {
		if requested != Role::Member {
			tracing::warn!(
				user_id = %principal.user_id,
				requested = %requested,
				"staff save carried a non-member role; forcing member"
			);
		}
		return Role::Member;
	}
	requested
}
