// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use libris_auth::{OpenElevation, RoleElevation, SharedSecretElevation, UserDirectory};
use libris_common_i18n::{resolve_locale, t, t_fmt};
use libris_config::LibrisConfig;
use libris_db::{BookRepository, BookStore, LoanRepository, UserRepository, UserStore};
use libris_lending::LendingService;
use sqlx::SqlitePool;

/// Shared collaborators for every action.
///
/// Cloning is cheap; [`ActionContext::for_locale`] derives a per-request
/// copy with the caller's preferred language.
#[derive(Clone)]
pub struct ActionContext {
	pub users: Arc<dyn UserStore>,
	pub books: Arc<dyn BookStore>,
	pub directory: Arc<dyn UserDirectory>,
	pub elevation: Arc<dyn RoleElevation>,
	pub lending: LendingService,
	pub locale: &'static str,
	pub allow_self_registration: bool,
}

impl ActionContext {
	pub fn new(pool: SqlitePool, config: &LibrisConfig) -> Self {
		let users = Arc::new(UserRepository::new(pool.clone()));
		let books = Arc::new(BookRepository::new(pool.clone()));
		let loans = Arc::new(LoanRepository::new(pool));

		let elevation: Arc<dyn RoleElevation> = match &config.auth.registration_secret {
			Some(secret) => Arc::new(SharedSecretElevation::new(secret.clone())),
			None => Arc::new(OpenElevation),
		};

		Self {
			lending: LendingService::new(loans, books.clone(), users.clone()),
			users: users.clone(),
			books,
			directory: users,
			elevation,
			locale: config.logging.locale,
			allow_self_registration: config.auth.allow_self_registration,
		}
	}

	/// Copy of this context speaking `requested` if supported.
	pub fn for_locale(&self, requested: Option<&str>) -> Self {
		Self {
			locale: resolve_locale(requested, self.locale),
			..self.clone()
		}
	}

	pub(crate) fn t(&self, key: &str) -> String {
		t(self.locale, key)
	}

	pub(crate) fn t_fmt(&self, key: &str, args: &[(&str, &str)]) -> String {
		t_fmt(self.locale, key, args)
	}
}
