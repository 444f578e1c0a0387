// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session adapter.
//!
//! [`authenticate`] checks a login attempt against the stored user record and
//! yields the [`Principal`] that every policy and lending call receives.
//! [`Session`] is the value handed to the presentation layer to keep the
//! principal between requests; cookie transport is not handled here.

use chrono::{DateTime, Duration, Utc};
use libris_core::User;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AuthError;
use crate::password::verify_password;
use crate::principal::Principal;

/// Lifetime of a login session.
pub const SESSION_EXPIRY_HOURS: i64 = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
	pub token: String,
	pub principal: Principal,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

impl Session {
	#[instrument(level = "debug", skip(principal), fields(user_id = %principal.user_id))]
	pub fn establish(principal: Principal) -> Self {
		let now = Utc::now();
		Self {
			token: generate_session_token(),
			principal,
			created_at: now,
			expires_at: now + Duration::hours(SESSION_EXPIRY_HOURS),
		}
	}

	pub fn is_expired(&self) -> bool {
		Utc::now() > self.expires_at
	}

	/// The principal, if the session is still valid.
	pub fn principal(&self) -> Option<&Principal> {
		if self.is_expired() {
			None
		} else {
			Some(&self.principal)
		}
	}
}

/// Generates a random 256-bit session token, hex encoded.
pub fn generate_session_token() -> String {
	use rand::Rng;
	let mut rng = rand::thread_rng();
	let bytes: [u8; 32] = rng.gen();
	hex::encode(bytes)
}

/// Verify a login attempt.
///
/// `user` is the record found for the submitted login, if any.
#[instrument(level = "debug", skip(user, password), fields(found = user.is_some()))]
pub fn authenticate(user: Option<&User>, password: &str) -> Result<Principal, AuthError> {
	let Some(user) = user else {
		return Err(AuthError::InvalidCredentials);
	};

	if !verify_password(password, &user.password_hash) {
		return Err(AuthError::InvalidCredentials);
	}

	if !user.is_active {
		return Err(AuthError::InactiveAccount);
	}

	Ok(Principal::from(user))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::password::hash_password;
	use libris_common_secret::SecretString;
	use libris_core::Role;

	fn user_with_password(password: &str) -> User {
		let hash = hash_password(&SecretString::from(password)).unwrap();
		User::new("Ana Lima", "ana", hash, Role::Staff)
	}

	#[test]
	fn authenticate_yields_principal() {
		let user = user_with_password("pa55word");
		let principal = authenticate(Some(&user), "pa55word").unwrap();
		assert_eq!(principal.user_id, user.id);
		assert_eq!(principal.role, Role::Staff);
		assert!(principal.is_plain_staff());
	}

	#[test]
	fn wrong_password_rejected() {
		let user = user_with_password("pa55word");
		assert!(matches!(
			authenticate(Some(&user), "nope"),
			Err(AuthError::InvalidCredentials)
		));
	}

	#[test]
	fn unknown_user_rejected() {
		assert!(matches!(
			authenticate(None, "whatever"),
			Err(AuthError::InvalidCredentials)
		));
	}

	#[test]
	fn inactive_user_rejected() {
		let mut user = user_with_password("pa55word");
		user.is_active = false;
		assert!(matches!(
			authenticate(Some(&user), "pa55word"),
			Err(AuthError::InactiveAccount)
		));
	}

	#[test]
	fn session_carries_principal_until_expiry() {
		let user = user_with_password("pa55word");
		let mut session = Session::establish(Principal::from(&user));
		assert_eq!(session.token.len(), 64);
		assert!(session.principal().is_some());

		session.expires_at = Utc::now() - Duration::minutes(1);
		assert!(session.principal().is_none());
	}

	#[test]
	fn session_tokens_are_unique() {
		assert_ne!(generate_session_token(), generate_session_token());
	}
}
