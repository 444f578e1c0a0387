// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::search::{SearchQuery, Searchable};
use crate::types::{Role, UserId};

/// A registered library user.
///
/// `is_staff` and `is_superuser` are derived from `role`; use [`User::set_role`]
/// rather than writing them directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
	pub id: UserId,
	pub reference_id: Option<String>,
	pub name: String,
	pub contact: Option<String>,
	pub address: Option<String>,
	pub email: Option<String>,
	pub login: String,
	#[serde(skip_serializing)]
	pub password_hash: String,
	pub role: Role,
	pub is_active: bool,
	pub is_staff: bool,
	pub is_superuser: bool,
	pub joined_at: DateTime<Utc>,
}

impl User {
	pub fn new(name: impl Into<String>, login: impl Into<String>, password_hash: String, role: Role) -> Self {
		Self {
			id: UserId::generate(),
			reference_id: None,
			name: name.into(),
			contact: None,
			address: None,
			email: None,
			login: login.into(),
			password_hash,
			role,
			is_active: true,
			is_staff: role.is_staff(),
			is_superuser: role.is_superuser(),
			joined_at: Utc::now(),
		}
	}

	/// Change the role and recompute the derived flags.
	pub fn set_role(&mut self, role: Role) {
		self.role = role;
		self.is_staff = role.is_staff();
		self.is_superuser = role.is_superuser();
	}

	pub fn flags_consistent(&self) -> bool {
		self.is_staff == self.role.is_staff() && self.is_superuser == self.role.is_superuser()
	}
}

impl Searchable for User {
	fn matches(&self, query: &SearchQuery) -> bool {
		query.matches_any([
			Some(self.name.as_str()),
			self.contact.as_deref(),
			Some(self.login.as_str()),
			self.email.as_deref(),
		])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_user_derives_flags() {
		let admin = User::new("Ana", "ana", "hash".into(), Role::Admin);
		assert!(admin.is_staff && admin.is_superuser);
		let member = User::new("Rui", "rui", "hash".into(), Role::Member);
		assert!(!member.is_staff && !member.is_superuser);
	}

	#[test]
	fn set_role_keeps_flags_consistent() {
		let mut user = User::new("Ana", "ana", "hash".into(), Role::Admin);
		user.set_role(Role::Staff);
		assert!(user.flags_consistent());
		assert!(user.is_staff && !user.is_superuser);
	}

	#[test]
	fn password_hash_is_not_serialized() {
		let user = User::new("Ana", "ana", "$argon2id$secret".into(), Role::Member);
		let json = serde_json::to_string(&user).unwrap();
		assert!(!json.contains("argon2id"));
	}

	#[test]
	fn search_covers_name_contact_login_email() {
		let mut user = User::new("Maria Souza", "msouza", "h".into(), Role::Member);
		user.contact = Some("9999-1234".into());
		user.email = Some("maria@biblioteca.org".into());

		assert!(user.matches(&SearchQuery::new("SOUZA")));
		assert!(user.matches(&SearchQuery::new("1234")));
		assert!(user.matches(&SearchQuery::new("msou")));
		assert!(user.matches(&SearchQuery::new("biblioteca")));
		assert!(!user.matches(&SearchQuery::new("pedro")));
	}
}
