// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use libris_core::{Book, BookId};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;
use crate::time;

#[async_trait]
pub trait BookStore: Send + Sync {
	async fn create_book(&self, book: &Book) -> Result<(), DbError>;
	async fn get_book_by_id(&self, id: &BookId) -> Result<Option<Book>, DbError>;
	async fn update_book(&self, book: &Book) -> Result<(), DbError>;
	async fn delete_book(&self, id: &BookId) -> Result<bool, DbError>;
	async fn list_books(&self) -> Result<Vec<Book>, DbError>;
	async fn list_available_books(&self) -> Result<Vec<Book>, DbError>;
	async fn count_active_loans(&self, id: &BookId) -> Result<i64, DbError>;
}

#[async_trait]
impl BookStore for BookRepository {
	async fn create_book(&self, book: &Book) -> Result<(), DbError> {
		self.create_book(book).await
	}

	async fn get_book_by_id(&self, id: &BookId) -> Result<Option<Book>, DbError> {
		self.get_book_by_id(id).await
	}

	async fn update_book(&self, book: &Book) -> Result<(), DbError> {
		self.update_book(book).await
	}

	async fn delete_book(&self, id: &BookId) -> Result<bool, DbError> {
		self.delete_book(id).await
	}

	async fn list_books(&self) -> Result<Vec<Book>, DbError> {
		self.list_books().await
	}

	async fn list_available_books(&self) -> Result<Vec<Book>, DbError> {
		self.list_available_books().await
	}

	async fn count_active_loans(&self, id: &BookId) -> Result<i64, DbError> {
		self.count_active_loans(id).await
	}
}

/// Repository for the book catalog.
#[derive(Clone)]
pub struct BookRepository {
	pool: SqlitePool,
}

impl BookRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, book), fields(book_id = %book.id, title = %book.title))]
	pub async fn create_book(&self, book: &Book) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO books (id, title, author, publication_year, genre, available, registered_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(book.id.to_string())
		.bind(&book.title)
		.bind(&book.author)
		.bind(book.publication_year)
		.bind(&book.genre)
		.bind(book.available)
		.bind(time::encode(&book.registered_at))
		.execute(&self.pool)
		.await?;

		tracing::debug!(book_id = %book.id, "book created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(book_id = %id))]
	pub async fn get_book_by_id(&self, id: &BookId) -> Result<Option<Book>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, title, author, publication_year, genre, available, registered_at
			FROM books
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => Ok(Some(parse_book_row(&row)?)),
			None => Ok(None),
		}
	}

	/// Overwrite the catalog fields and availability of a book.
	///
	/// # Errors
	/// `DbError::NotFound` if no row has this id.
	#[tracing::instrument(skip(self, book), fields(book_id = %book.id, available = book.available))]
	pub async fn update_book(&self, book: &Book) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE books
			SET title = ?, author = ?, publication_year = ?, genre = ?, available = ?
			WHERE id = ?
			"#,
		)
		.bind(&book.title)
		.bind(&book.author)
		.bind(book.publication_year)
		.bind(&book.genre)
		.bind(book.available)
		.bind(book.id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("book {}", book.id)));
		}
		Ok(())
	}

	/// Delete a book and, by cascade, its loans.
	#[tracing::instrument(skip(self), fields(book_id = %id))]
	pub async fn delete_book(&self, id: &BookId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM books WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	/// All books in registration order.
	#[tracing::instrument(skip(self))]
	pub async fn list_books(&self) -> Result<Vec<Book>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, title, author, publication_year, genre, available, registered_at
			FROM books
			ORDER BY rowid
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(parse_book_row).collect()
	}

	/// Books that can be checked out, by title.
	#[tracing::instrument(skip(self))]
	pub async fn list_available_books(&self) -> Result<Vec<Book>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, title, author, publication_year, genre, available, registered_at
			FROM books
			WHERE available = 1
			ORDER BY title COLLATE NOCASE, rowid
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(parse_book_row).collect()
	}

	/// Number of unreturned loans on this book.
	#[tracing::instrument(skip(self), fields(book_id = %id))]
	pub async fn count_active_loans(&self, id: &BookId) -> Result<i64, DbError> {
		let row = sqlx::query("SELECT COUNT(*) AS n FROM loans WHERE book_id = ? AND returned = 0")
			.bind(id.to_string())
			.fetch_one(&self.pool)
			.await?;
		Ok(row.get("n"))
	}
}

fn parse_book_row(row: &sqlx::sqlite::SqliteRow) -> Result<Book, DbError> {
	let id_str: String = row.get("id");
	let registered_at_str: String = row.get("registered_at");

	let id = Uuid::parse_str(&id_str)
		.map_err(|e| DbError::Internal(format!("Invalid book UUID: {e}")))?;

	Ok(Book {
		id: BookId::new(id),
		title: row.get("title"),
		author: row.get("author"),
		publication_year: row.get("publication_year"),
		genre: row.get("genre"),
		available: row.get("available"),
		registered_at: time::decode("registered_at", &registered_at_str)?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{book, create_test_pool};

	async fn make_repo() -> BookRepository {
		BookRepository::new(create_test_pool().await)
	}

	#[tokio::test]
	async fn test_create_and_get_book() {
		let repo = make_repo().await;
		let mut b = book("Dom Casmurro", "Machado de Assis");
		b.publication_year = Some(1899);
		repo.create_book(&b).await.unwrap();

		let fetched = repo.get_book_by_id(&b.id).await.unwrap().unwrap();
		assert_eq!(fetched, b);
		assert!(fetched.available);
	}

	#[tokio::test]
	async fn test_get_missing_book() {
		let repo = make_repo().await;
		assert!(repo.get_book_by_id(&BookId::generate()).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_update_book() {
		let repo = make_repo().await;
		let mut b = book("Iracema", "Alencar");
		repo.create_book(&b).await.unwrap();

		b.author = "José de Alencar".into();
		b.available = false;
		repo.update_book(&b).await.unwrap();

		let fetched = repo.get_book_by_id(&b.id).await.unwrap().unwrap();
		assert_eq!(fetched.author, "José de Alencar");
		assert!(!fetched.available);
	}

	#[tokio::test]
	async fn test_update_missing_book_is_not_found() {
		let repo = make_repo().await;
		let err = repo.update_book(&book("Ghost", "Nobody")).await.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));
	}

	#[tokio::test]
	async fn test_delete_book() {
		let repo = make_repo().await;
		let b = book("Iracema", "Alencar");
		repo.create_book(&b).await.unwrap();
		assert!(repo.delete_book(&b.id).await.unwrap());
		assert!(!repo.delete_book(&b.id).await.unwrap());
	}

	#[tokio::test]
	async fn test_list_available_excludes_loaned() {
		let repo = make_repo().await;
		let a = book("b title", "A");
		let mut b = book("A title", "B");
		b.available = false;
		let c = book("C title", "C");
		for x in [&a, &b, &c] {
			repo.create_book(x).await.unwrap();
		}

		assert_eq!(repo.list_books().await.unwrap().len(), 3);
		let titles: Vec<_> = repo
			.list_available_books()
			.await
			.unwrap()
			.into_iter()
			.map(|b| b.title)
			.collect();
		assert_eq!(titles, vec!["b title", "C title"]);
	}
}
