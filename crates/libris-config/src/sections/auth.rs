// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Registration and account settings.

use libris_common_secret::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// When set, claiming an admin or staff role at registration requires
	/// this key. When unset, the requested role is accepted as submitted.
	pub registration_secret: Option<SecretString>,
	pub allow_self_registration: bool,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			registration_secret: None,
			allow_self_registration: true,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub registration_secret: Option<SecretString>,
	#[serde(default)]
	pub allow_self_registration: Option<bool>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.registration_secret.is_some() {
			self.registration_secret = other.registration_secret;
		}
		if other.allow_self_registration.is_some() {
			self.allow_self_registration = other.allow_self_registration;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			registration_secret: self.registration_secret.filter(|s| !s.is_blank()),
			allow_self_registration: self.allow_self_registration.unwrap_or(true),
		}
	}
}
