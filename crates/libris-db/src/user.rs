// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User repository.
//!
//! Also implements [`UserDirectory`] so credential validation can check
//! login, email and reference-id uniqueness against the table.

use async_trait::async_trait;
use libris_auth::{AuthError, UserDirectory};
use libris_core::{Role, User, UserId};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::{conflict_on_unique, DbError};
use crate::time;

const USER_COLUMNS: &str = r#"
	id, reference_id, name, contact, address, email, login, password_hash,
	role, is_active, is_staff, is_superuser, joined_at
"#;

#[async_trait]
pub trait UserStore: Send + Sync {
	async fn create_user(&self, user: &User) -> Result<(), DbError>;
	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError>;
	async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, DbError>;
	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
	async fn get_user_by_reference_id(&self, reference_id: &str) -> Result<Option<User>, DbError>;
	async fn update_user(&self, user: &User) -> Result<(), DbError>;
	async fn delete_user(&self, id: &UserId) -> Result<bool, DbError>;
	async fn list_users(&self) -> Result<Vec<User>, DbError>;
	async fn list_users_by_name(&self) -> Result<Vec<User>, DbError>;
	async fn count_users_with_role(&self, role: Role) -> Result<i64, DbError>;
}

#[async_trait]
impl UserStore for UserRepository {
	async fn create_user(&self, user: &User) -> Result<(), DbError> {
		self.create_user(user).await
	}

	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		self.get_user_by_id(id).await
	}

	async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, DbError> {
		self.get_user_by_login(login).await
	}

	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		self.get_user_by_email(email).await
	}

	async fn get_user_by_reference_id(&self, reference_id: &str) -> Result<Option<User>, DbError> {
		self.get_user_by_reference_id(reference_id).await
	}

	async fn update_user(&self, user: &User) -> Result<(), DbError> {
		self.update_user(user).await
	}

	async fn delete_user(&self, id: &UserId) -> Result<bool, DbError> {
		self.delete_user(id).await
	}

	async fn list_users(&self) -> Result<Vec<User>, DbError> {
		self.list_users().await
	}

	async fn list_users_by_name(&self) -> Result<Vec<User>, DbError> {
		self.list_users_by_name().await
	}

	async fn count_users_with_role(&self, role: Role) -> Result<i64, DbError> {
		self.count_users_with_role(role).await
	}
}

#[async_trait]
impl UserDirectory for UserRepository {
	async fn login_owner(&self, login: &str) -> Result<Option<UserId>, AuthError> {
		self.owner_of("login", login).await
	}

	async fn email_owner(&self, email: &str) -> Result<Option<UserId>, AuthError> {
		self.owner_of("email", email).await
	}

	async fn reference_owner(&self, reference_id: &str) -> Result<Option<UserId>, AuthError> {
		self.owner_of("reference_id", reference_id).await
	}
}

/// Repository for library users.
#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a new user.
	///
	/// # Errors
	/// `DbError::Conflict` if the login, email or reference id is taken.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id, login = %user.login, role = %user.role))]
	pub async fn create_user(&self, user: &User) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO users (
				id, reference_id, name, contact, address, email, login, password_hash,
				role, is_active, is_staff, is_superuser, joined_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.reference_id)
		.bind(&user.name)
		.bind(&user.contact)
		.bind(&user.address)
		.bind(&user.email)
		.bind(&user.login)
		.bind(&user.password_hash)
		.bind(user.role.as_str())
		.bind(user.is_active)
		.bind(user.is_staff)
		.bind(user.is_superuser)
		.bind(time::encode(&user.joined_at))
		.execute(&self.pool)
		.await
		.map_err(|e| conflict_on_unique(e, "user"))?;

		tracing::debug!(user_id = %user.id, "user created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		self.get_user_where("id", &id.to_string()).await
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, DbError> {
		self.get_user_where("login", login).await
	}

	#[tracing::instrument(skip(self, email))]
	pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		self.get_user_where("email", email).await
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_user_by_reference_id(&self, reference_id: &str) -> Result<Option<User>, DbError> {
		self.get_user_where("reference_id", reference_id).await
	}

	/// Overwrite every column of an existing user.
	///
	/// # Errors
	/// `DbError::NotFound` if no row has this id; `DbError::Conflict` on a
	/// uniqueness violation.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
	pub async fn update_user(&self, user: &User) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE users SET
				reference_id = ?, name = ?, contact = ?, address = ?, email = ?, login = ?,
				password_hash = ?, role = ?, is_active = ?, is_staff = ?, is_superuser = ?
			WHERE id = ?
			"#,
		)
		.bind(&user.reference_id)
		.bind(&user.name)
		.bind(&user.contact)
		.bind(&user.address)
		.bind(&user.email)
		.bind(&user.login)
		.bind(&user.password_hash)
		.bind(user.role.as_str())
		.bind(user.is_active)
		.bind(user.is_staff)
		.bind(user.is_superuser)
		.bind(user.id.to_string())
		.execute(&self.pool)
		.await
		.map_err(|e| conflict_on_unique(e, "user"))?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("user {}", user.id)));
		}
		Ok(())
	}

	/// Delete a user and, by cascade, their loans.
	///
	/// Books the user still holds are made available again first, in the
	/// same transaction, since their loans disappear with the user.
	///
	/// # Returns
	/// `true` if a row was deleted.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn delete_user(&self, id: &UserId) -> Result<bool, DbError> {
		let mut tx = self.pool.begin().await?;

		let released = sqlx::query(
			"UPDATE books SET available = 1 \
			 WHERE id IN (SELECT book_id FROM loans WHERE user_id = ? AND returned = 0)",
		)
		.bind(id.to_string())
		.execute(&mut *tx)
		.await?;

		let result = sqlx::query("DELETE FROM users WHERE id = ?")
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		if released.rows_affected() > 0 {
			tracing::info!(books = released.rows_affected(), "released books held by deleted user");
		}
		Ok(result.rows_affected() > 0)
	}

	/// All users in registration order.
	#[tracing::instrument(skip(self))]
	pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
		let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY rowid"))
			.fetch_all(&self.pool)
			.await?;
		rows.iter().map(parse_user_row).collect()
	}

	/// All users ordered by display name, for selection lists.
	#[tracing::instrument(skip(self))]
	pub async fn list_users_by_name(&self) -> Result<Vec<User>, DbError> {
		let rows = sqlx::query(&format!(
			"SELECT {USER_COLUMNS} FROM users ORDER BY name COLLATE NOCASE, rowid"
		))
		.fetch_all(&self.pool)
		.await?;
		rows.iter().map(parse_user_row).collect()
	}

	#[tracing::instrument(skip(self))]
	pub async fn count_users_with_role(&self, role: Role) -> Result<i64, DbError> {
		let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE role = ?")
			.bind(role.as_str())
			.fetch_one(&self.pool)
			.await?;
		Ok(row.get("n"))
	}

	async fn get_user_where(&self, column: &'static str, value: &str) -> Result<Option<User>, DbError> {
		let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?"))
			.bind(value)
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some(row) => Ok(Some(parse_user_row(&row)?)),
			None => Ok(None),
		}
	}

	async fn owner_of(&self, column: &'static str, value: &str) -> Result<Option<UserId>, AuthError> {
		self.get_user_where(column, value)
			.await
			.map(|user| user.map(|u| u.id))
			.map_err(|e| AuthError::Directory(e.to_string()))
	}
}

fn parse_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, DbError> {
	let id_str: String = row.get("id");
	let role_str: String = row.get("role");
	let joined_at_str: String = row.get("joined_at");

	let id = Uuid::parse_str(&id_str)
		.map_err(|e| DbError::Internal(format!("Invalid user UUID: {e}")))?;
	let role: Role = role_str
		.parse()
		.map_err(|e| DbError::Internal(format!("Invalid role: {e}")))?;

	Ok(User {
		id: UserId::new(id),
		reference_id: row.get("reference_id"),
		name: row.get("name"),
		contact: row.get("contact"),
		address: row.get("address"),
		email: row.get("email"),
		login: row.get("login"),
		password_hash: row.get("password_hash"),
		role,
		is_active: row.get("is_active"),
		is_staff: row.get("is_staff"),
		is_superuser: row.get("is_superuser"),
		joined_at: time::decode("joined_at", &joined_at_str)?,
	})
}
