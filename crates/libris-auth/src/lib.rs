// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication and authorization for libris.
//!
//! - [`policy`]: role-based permission sets and the staff row-level rule
//! - [`credentials`]: registration and user-edit validation
//! - [`password`]: argon2 hashing
//! - [`session`]: turning verified credentials into a [`Principal`]
//!
//! Every decision takes an explicit [`Principal`]; nothing reads ambient
//! request state.

mod argon2_config;
pub mod credentials;
pub mod error;
pub mod password;
pub mod policy;
pub mod principal;
pub mod session;

pub use credentials::{
	validate_registration, validate_user_create, validate_user_edit, OpenElevation, RegistrationForm,
	RoleElevation, SharedSecretElevation, UserDirectory, UserForm,
};
pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use policy::{
	allowed_user_fields, authorize, authorize_user_target, can_view_user, enforce_role_on_save,
	Action, Decision, DenyReason, PermissionSet, Requirement, UserFieldSet, UserTarget,
};
pub use principal::Principal;
pub use session::{authenticate, generate_session_token, Session, SESSION_EXPIRY_HOURS};
