// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier newtypes and the user role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			pub fn into_inner(self) -> Uuid {
				self.0
			}

			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a library user.");
define_id_type!(BookId, "Unique identifier for a catalog title.");
define_id_type!(LoanId, "Unique identifier for a loan.");

// =============================================================================
// Role
// =============================================================================

/// Role of a library user. Determines permission sets and derived flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Full access, including deletions.
	Admin,
	/// Circulation desk. Manages books, loans and member accounts.
	#[serde(alias = "funcionario")]
	Staff,
	/// Ordinary library member.
	#[default]
	#[serde(alias = "membro_comum")]
	Member,
}

impl Role {
	pub fn all() -> &'static [Role] {
		&[Role::Admin, Role::Staff, Role::Member]
	}

	/// Admin and staff both carry the staff flag.
	pub fn is_staff(&self) -> bool {
		matches!(self, Role::Admin | Role::Staff)
	}

	pub fn is_superuser(&self) -> bool {
		matches!(self, Role::Admin)
	}

	/// Roles other than member must be claimed at registration.
	pub fn is_elevated(&self) -> bool {
		!matches!(self, Role::Member)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Admin => "admin",
			Role::Staff => "staff",
			Role::Member => "member",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
	type Err = ParseRoleError;

	/// Accepts the canonical names and the legacy labels stored by older deployments.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"admin" => Ok(Role::Admin),
			"staff" | "funcionario" => Ok(Role::Staff),
			"member" | "membro_comum" => Ok(Role::Member),
			_ => Err(ParseRoleError(s.to_string())),
		}
	}
}
