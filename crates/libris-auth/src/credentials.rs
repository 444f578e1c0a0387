// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Registration and user-form validation.
//!
//! Validators check every rule and report all failures together as
//! [`ValidationErrors`] wrapped in [`AuthError::Validation`]. On success they
//! return a [`User`] ready to persist, with the password already hashed and
//! the role flags derived.
//!
//! Uniqueness is checked through the [`UserDirectory`] trait so this crate
//! stays independent of storage.

use async_trait::async_trait;
use libris_common_secret::SecretString;
use libris_core::{Field, Role, User, UserId, ValidationErrors};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AuthError;
use crate::password::hash_password;
use crate::policy::{allowed_user_fields, enforce_role_on_save, UserTarget};
use crate::principal::Principal;

/// Lookups needed for uniqueness checks.
#[async_trait]
pub trait UserDirectory: Send + Sync {
	async fn login_owner(&self, login: &str) -> Result<Option<UserId>, AuthError>;
	async fn email_owner(&self, email: &str) -> Result<Option<UserId>, AuthError>;
	async fn reference_owner(&self, reference_id: &str) -> Result<Option<UserId>, AuthError>;
}

/// Decides whether a registration may claim an elevated role.
pub trait RoleElevation: Send + Sync {
	fn permits(&self, role: Role, secret_key: &SecretString) -> bool;
}

/// Accepts any requested role. Used when no registration secret is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenElevation;

impl RoleElevation for OpenElevation {
	fn permits(&self, _role: Role, _secret_key: &SecretString) -> bool {
		true
	}
}

/// Requires the configured secret for admin and staff registrations.
#[derive(Debug, Clone)]
pub struct SharedSecretElevation {
	secret: SecretString,
}

impl SharedSecretElevation {
	pub fn new(secret: SecretString) -> Self {
		Self { secret }
	}
}

impl RoleElevation for SharedSecretElevation {
	fn permits(&self, role: Role, secret_key: &SecretString) -> bool {
		!role.is_elevated() || self.secret.matches(secret_key.expose())
	}
}

/// Self-service registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
	pub name: String,
	pub email: String,
	pub login: String,
	pub password: SecretString,
	pub password_confirm: SecretString,
	pub contact: String,
	pub address: String,
	pub role: Role,
	pub secret_key: SecretString,
}

/// User form used by staff and admins, and for profile edits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserForm {
	pub reference_id: String,
	pub name: String,
	pub contact: String,
	pub address: String,
	pub email: String,
	pub login: String,
	pub password: SecretString,
	pub password_confirm: SecretString,
	pub role: Option<Role>,
}

/// Prefill for editing `user`. Password fields stay blank.
impl From<&User> for UserForm {
	fn from(user: &User) -> Self {
		Self {
			reference_id: user.reference_id.clone().unwrap_or_default(),
			name: user.name.clone(),
			contact: user.contact.clone().unwrap_or_default(),
			address: user.address.clone().unwrap_or_default(),
			email: user.email.clone().unwrap_or_default(),
			login: user.login.clone(),
			role: Some(user.role),
			..Default::default()
		}
	}
}

/// Validate a registration and build the new user.
#[instrument(skip_all, fields(login = %form.login, role = %form.role))]
pub async fn validate_registration(
	form: &RegistrationForm,
	directory: &dyn UserDirectory,
	elevation: &dyn RoleElevation,
) -> Result<User, AuthError> {
	let mut errors = ValidationErrors::new();

	require(&mut errors, Field::Name, &form.name);
	require(&mut errors, Field::Login, &form.login);
	check_email_format(&mut errors, &form.email);
	check_new_password(&mut errors, &form.password, &form.password_confirm);
	check_unique(&mut errors, directory, &form.login, &form.email, "", None).await?;

	if form.role == Role::Member && !form.secret_key.is_blank() {
		errors.add(Field::SecretKey, "validation.secret_key.unexpected");
	} else if form.role.is_elevated() && !elevation.permits(form.role, &form.secret_key) {
		errors.add(Field::SecretKey, "validation.secret_key.invalid");
	}

	if !errors.is_empty() {
		tracing::debug!(errors = errors.len(), "registration rejected");
		return Err(errors.into());
	}

	let mut user = User::new(
		form.name.trim(),
		form.login.trim(),
		hash_password(&form.password)?,
		form.role,
	);
	user.email = non_blank(&form.email);
	user.contact = non_blank(&form.contact);
	user.address = non_blank(&form.address);
	Ok(user)
}

/// Validate an administrative user creation.
#[instrument(skip_all, fields(actor = %principal.user_id, login = %form.login))]
pub async fn validate_user_create(
	form: &UserForm,
	principal: &Principal,
	directory: &dyn UserDirectory,
) -> Result<User, AuthError> {
	let fields = allowed_user_fields(principal, None);
	let mut errors = ValidationErrors::new();

	// An out-of-range role is not rejected here; the save below coerces it.
	let requested = if fields.role_visible {
		form.role.unwrap_or_default()
	} else {
		Role::Member
	};

	require(&mut errors, Field::Name, &form.name);
	require(&mut errors, Field::Login, &form.login);
	check_email_format(&mut errors, &form.email);
	check_new_password(&mut errors, &form.password, &form.password_confirm);
	check_unique(
		&mut errors,
		directory,
		&form.login,
		&form.email,
		&form.reference_id,
		None,
	)
	.await?;

	if !errors.is_empty() {
		return Err(errors.into());
	}

	let mut user = User::new(
		form.name.trim(),
		form.login.trim(),
		hash_password(&form.password)?,
		enforce_role_on_save(principal, requested),
	);
	apply_profile(&mut user, form);
	Ok(user)
}

/// Validate an edit of `existing`, administrative or self-service.
///
/// Blank passwords keep the stored hash. The role is only read from the form
/// when the principal's field set shows it.
#[instrument(skip_all, fields(actor = %principal.user_id, target = %existing.id))]
pub async fn validate_user_edit(
	existing: &User,
	form: &UserForm,
	principal: &Principal,
	directory: &dyn UserDirectory,
) -> Result<User, AuthError> {
	let fields = allowed_user_fields(principal, Some(&UserTarget::from(existing)));
	let mut errors = ValidationErrors::new();

	let role = if fields.role_visible {
		let requested = form.role.unwrap_or(existing.role);
		if !fields.allows_role(requested) {
			errors.add(Field::Role, "validation.role.member_only");
		}
		enforce_role_on_save(principal, requested)
	} else {
		existing.role
	};

	require(&mut errors, Field::Name, &form.name);
	require(&mut errors, Field::Login, &form.login);
	check_email_format(&mut errors, &form.email);
	check_password_change(&mut errors, &form.password, &form.password_confirm);
	check_unique(
		&mut errors,
		directory,
		&form.login,
		&form.email,
		&form.reference_id,
		Some(existing.id),
	)
	.await?;

	if !errors.is_empty() {
		return Err(errors.into());
	}

	let mut user = existing.clone();
	user.name = form.name.trim().to_string();
	user.login = form.login.trim().to_string();
	apply_profile(&mut user, form);
	user.set_role(role);
	if !form.password.is_blank() {
		user.password_hash = hash_password(&form.password)?;
	}
	Ok(user)
}

fn apply_profile(user: &mut User, form: &UserForm) {
	user.reference_id = non_blank(&form.reference_id);
	user.contact = non_blank(&form.contact);
	user.address = non_blank(&form.address);
	user.email = non_blank(&form.email);
}

fn non_blank(value: &str) -> Option<String> {
	let trimmed = value.trim();
	(!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn require(errors: &mut ValidationErrors, field: Field, value: &str) {
	if value.trim().is_empty() {
		errors.add(field, "validation.required");
	}
}

fn check_email_format(errors: &mut ValidationErrors, email: &str) {
	let email = email.trim();
	if email.is_empty() {
		return;
	}
	let valid = match email.split_once('@') {
		Some((local, domain)) => {
			!local.is_empty()
				&& !domain.contains('@')
				&& domain.contains('.')
				&& !domain.starts_with('.')
				&& !domain.ends_with('.')
				&& !email.chars().any(char::is_whitespace)
		}
		None => false,
	};
	if !valid {
		errors.add(Field::Email, "validation.email.invalid");
	}
}

/// Both fields required and equal. Reports the missing one when only one is given.
fn check_new_password(errors: &mut ValidationErrors, password: &SecretString, confirm: &SecretString) {
	match (password.is_blank(), confirm.is_blank()) {
		(false, false) => {
			if password.expose() != confirm.expose() {
				errors.add(Field::PasswordConfirm, "validation.password.mismatch");
			}
		}
		(true, _) => errors.add(Field::Password, "validation.password.missing"),
		(false, true) => errors.add(Field::PasswordConfirm, "validation.password_confirm.missing"),
	}
}

/// Both blank keeps the password. Exactly one filled is an error on the blank one.
fn check_password_change(errors: &mut ValidationErrors, password: &SecretString, confirm: &SecretString) {
	match (password.is_blank(), confirm.is_blank()) {
		(true, true) => {}
		(false, false) => {
			if password.expose() != confirm.expose() {
				errors.add(Field::PasswordConfirm, "validation.password.mismatch");
			}
		}
		(true, false) => errors.add(Field::Password, "validation.password.missing"),
		(false, true) => errors.add(Field::PasswordConfirm, "validation.password_confirm.missing"),
	}
}

async fn check_unique(
	errors: &mut ValidationErrors,
	directory: &dyn UserDirectory,
	login: &str,
	email: &str,
	reference_id: &str,
	exclude: Option<UserId>,
) -> Result<(), AuthError> {
	let taken_by_other = |owner: Option<UserId>| owner.is_some_and(|id| Some(id) != exclude);

	let login = login.trim();
	if !login.is_empty() && taken_by_other(directory.login_owner(login).await?) {
		errors.add(Field::Login, "validation.login.taken");
	}

	let email = email.trim();
	if !email.is_empty() && taken_by_other(directory.email_owner(email).await?) {
		errors.add(Field::Email, "validation.email.taken");
	}

	let reference_id = reference_id.trim();
	if !reference_id.is_empty() && taken_by_other(directory.reference_owner(reference_id).await?) {
		errors.add(Field::ReferenceId, "validation.reference_id.taken");
	}

	Ok(())
}
