// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Field-level validation errors.
//!
//! Validators never stop at the first problem: every failing rule adds a
//! message key to the field it concerns, so a re-rendered form can show all
//! of them at once. Message keys resolve through `libris-common-i18n`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Form fields that can carry validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
	ReferenceId,
	Name,
	Contact,
	Address,
	Email,
	Login,
	Password,
	PasswordConfirm,
	Role,
	SecretKey,
	Title,
	Author,
	PublicationYear,
	Genre,
	Book,
	User,
}

impl Field {
	pub fn as_str(&self) -> &'static str {
		match self {
			Field::ReferenceId => "reference_id",
			Field::Name => "name",
			Field::Contact => "contact",
			Field::Address => "address",
			Field::Email => "email",
			Field::Login => "login",
			Field::Password => "password",
			Field::PasswordConfirm => "password_confirm",
			Field::Role => "role",
			Field::SecretKey => "secret_key",
			Field::Title => "title",
			Field::Author => "author",
			Field::PublicationYear => "publication_year",
			Field::Genre => "genre",
			Field::Book => "book",
			Field::User => "user",
		}
	}
}

impl fmt::Display for Field {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Collected validation failures, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
	fields: BTreeMap<Field, Vec<&'static str>>,
}

impl ValidationErrors {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a message key against a field. Duplicates are ignored.
	pub fn add(&mut self, field: Field, key: &'static str) {
		let messages = self.fields.entry(field).or_default();
		if !messages.contains(&key) {
			messages.push(key);
		}
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn has(&self, field: Field) -> bool {
		self.fields.contains_key(&field)
	}

	pub fn has_message(&self, field: Field, key: &str) -> bool {
		self.messages(field).iter().any(|k| *k == key)
	}

	pub fn messages(&self, field: Field) -> &[&'static str] {
		self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn iter(&self) -> impl Iterator<Item = (Field, &[&'static str])> {
		self.fields.iter().map(|(f, m)| (*f, m.as_slice()))
	}

	pub fn len(&self) -> usize {
		self.fields.values().map(Vec::len).sum()
	}

	pub fn merge(&mut self, other: ValidationErrors) {
		for (field, keys) in other.fields {
			for key in keys {
				self.add(field, key);
			}
		}
	}

	/// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
	pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
		if self.is_empty() {
			Ok(value)
		} else {
			Err(self)
		}
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (field, keys) in &self.fields {
			for key in keys {
				if !first {
					f.write_str(", ")?;
				}
				write!(f, "{field}: {key}")?;
				first = false;
			}
		}
		Ok(())
	}
}

impl std::error::Error for ValidationErrors {}
