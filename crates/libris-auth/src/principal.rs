// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use libris_core::{Role, User, UserId};
use serde::{Deserialize, Serialize};

/// The authenticated actor behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	pub user_id: UserId,
	pub role: Role,
	pub name: String,
	pub login: String,
}

impl Principal {
	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}

	/// Staff without admin rights; subject to the member-only row rule.
	pub fn is_plain_staff(&self) -> bool {
		self.role == Role::Staff
	}
}

impl From<&User> for Principal {
	fn from(user: &User) -> Self {
		Self {
			user_id: user.id,
			role: user.role,
			name: user.name.clone(),
			login: user.login.clone(),
		}
	}
}
