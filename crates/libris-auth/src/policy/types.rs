// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use libris_core::{Role, User, UserId};
use serde::{Deserialize, Serialize};

/// Named groups of roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSet {
	/// Admin and staff.
	Management,
	/// Admin only.
	AdminOnly,
}

impl PermissionSet {
	pub fn roles(&self) -> &'static [Role] {
		match self {
			PermissionSet::Management => &[Role::Admin, Role::Staff],
			PermissionSet::AdminOnly => &[Role::Admin],
		}
	}

	pub fn contains(&self, role: Role) -> bool {
		self.roles().contains(&role)
	}
}

/// What an action demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
	Public,
	Authenticated,
	Permission(PermissionSet),
}

/// Every operation exposed at the action boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	ViewHome,
	ListBooks,
	CreateBook,
	EditBook,
	DeleteBook,
	ListUsers,
	CreateUser,
	EditUser,
	DeleteUser,
	EditOwnProfile,
	Checkout,
	SearchActiveLoans,
	ReturnLoan,
	ListReturnedLoans,
	EditLoan,
	Register,
	Login,
	Logout,
}

impl Action {
	pub fn requirement(&self) -> Requirement {
		use Action::*;
		match self {
			ViewHome | ListBooks | Register | Login | Logout => Requirement::Public,
			EditOwnProfile => Requirement::Authenticated,
			CreateBook | EditBook | ListUsers | CreateUser | EditUser | Checkout
			| SearchActiveLoans | ReturnLoan | ListReturnedLoans | EditLoan => {
				Requirement::Permission(PermissionSet::Management)
			}
			DeleteBook | DeleteUser => Requirement::Permission(PermissionSet::AdminOnly),
		}
	}

	/// Actions whose target row is a user and so fall under the staff rule.
	pub fn is_user_scoped(&self) -> bool {
		matches!(
			self,
			Action::ListUsers | Action::CreateUser | Action::EditUser | Action::DeleteUser
		)
	}
}

/// Row attributes of a user targeted by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserTarget {
	pub id: UserId,
	pub role: Role,
}

impl From<&User> for UserTarget {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			role: user.role,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
	AuthenticationRequired,
	PermissionDenied,
	StaffMemberOnly,
	SelfDeletion,
}

impl DenyReason {
	pub fn message_key(&self) -> &'static str {
		match self {
			DenyReason::AuthenticationRequired => "policy.authentication_required",
			DenyReason::PermissionDenied => "policy.permission_denied",
			DenyReason::StaffMemberOnly => "policy.staff_member_only",
			DenyReason::SelfDeletion => "policy.self_deletion",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Allow,
	Deny(DenyReason),
}

impl Decision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, Decision::Allow)
	}

	pub fn into_result(self) -> Result<(), DenyReason> {
		match self {
			Decision::Allow => Ok(()),
			Decision::Deny(reason) => Err(reason),
		}
	}
}
