// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use libris_core::ValidationErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
	// =========================================================================
	// Input
	// =========================================================================
	#[error("validation failed: {0}")]
	Validation(ValidationErrors),

	// =========================================================================
	// Credentials
	// =========================================================================
	#[error("invalid credentials")]
	InvalidCredentials,

	#[error("account is inactive")]
	InactiveAccount,

	// =========================================================================
	// Internal
	// =========================================================================
	#[error("password hashing failed: {0}")]
	PasswordHash(String),

	#[error("user directory lookup failed: {0}")]
	Directory(String),
}

impl AuthError {
	pub fn validation_errors(&self) -> Option<&ValidationErrors> {
		match self {
			AuthError::Validation(errors) => Some(errors),
			_ => None,
		}
	}
}

impl From<ValidationErrors> for AuthError {
	fn from(errors: ValidationErrors) -> Self {
		AuthError::Validation(errors)
	}
}
