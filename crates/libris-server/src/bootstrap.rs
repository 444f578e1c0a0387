// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator bootstrap: creating the first administrator.
//!
//! Goes through the same validator as the user-management screen, acting as
//! a synthetic admin principal, so uniqueness and password rules hold.

use libris_auth::{validate_user_create, AuthError, Principal, UserDirectory, UserForm};
use libris_common_secret::SecretString;
use libris_core::{Role, User, UserId};
use libris_db::{DbError, UserStore};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
	#[error(transparent)]
	Auth(#[from] AuthError),

	#[error(transparent)]
	Db(#[from] DbError),
}

#[derive(Debug, Clone)]
pub struct AdminRequest {
	pub login: String,
	pub name: String,
	pub email: Option<String>,
	pub password: SecretString,
}

fn system_principal() -> Principal {
	Principal {
		user_id: UserId::generate(),
		role: Role::Admin,
		name: "system".to_string(),
		login: "system".to_string(),
	}
}

#[tracing::instrument(skip(store, request), fields(login = %request.login))]
pub async fn create_admin<S>(store: &S, request: AdminRequest) -> Result<User, BootstrapError>
where
	S: UserStore + UserDirectory,
{
	let form = UserForm {
		name: request.name,
		login: request.login,
		email: request.email.unwrap_or_default(),
		password: request.password.clone(),
		password_confirm: request.password,
		role: Some(Role::Admin),
		..Default::default()
	};

	let user = validate_user_create(&form, &system_principal(), store).await?;
	store.create_user(&user).await?;

	let admins = store.count_users_with_role(Role::Admin).await?;
	tracing::info!(user_id = %user.id, admins, "administrator created");
	Ok(user)
}

#[cfg(test)]
mod tests {
	use super::*;
	use libris_core::Field;
	use libris_db::{create_pool, run_migrations, UserRepository};

	async fn repository() -> UserRepository {
		let pool = create_pool("sqlite::memory:").await.unwrap();
		run_migrations(&pool).await.unwrap();
		UserRepository::new(pool)
	}

	fn request(login: &str, password: &str) -> AdminRequest {
		AdminRequest {
			login: login.into(),
			name: "Diretora".into(),
			email: Some(format!("{login}@biblioteca.org")),
			password: password.into(),
		}
	}

	#[tokio::test]
	async fn creates_a_superuser() {
		let repo = repository().await;
		let user = create_admin(&repo, request("diretora", "forte-senha")).await.unwrap();
		assert_eq!(user.role, Role::Admin);
		assert!(user.is_superuser && user.is_staff);

		let stored = repo.get_user_by_login("diretora").await.unwrap().unwrap();
		assert_eq!(stored.id, user.id);
		assert_ne!(stored.password_hash, "forte-senha");
	}

	#[tokio::test]
	async fn rejects_a_taken_login() {
		let repo = repository().await;
		create_admin(&repo, request("diretora", "forte-senha")).await.unwrap();

		let mut second = request("diretora", "outra-senha");
		second.email = None;
		let err = create_admin(&repo, second).await.unwrap_err();
		match err {
			BootstrapError::Auth(e) => {
				assert!(e.validation_errors().unwrap().has_message(Field::Login, "validation.login.taken"))
			}
			other => panic!("expected validation error, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn blank_password_is_rejected() {
		let repo = repository().await;
		let err = create_admin(&repo, request("diretora", "")).await.unwrap_err();
		assert!(matches!(err, BootstrapError::Auth(AuthError::Validation(_))));
		assert!(repo.get_user_by_login("diretora").await.unwrap().is_none());
	}
}
