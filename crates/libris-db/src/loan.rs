// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loan repository.
//!
//! Checkout and return are the only operations that move a book's
//! availability; each runs the loan write and the book write in one
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libris_core::{BookId, Loan, LoanDetails, LoanId, UserId};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;
use crate::time;

const DETAIL_SELECT: &str = r#"
	SELECT
		l.id, l.book_id, l.user_id, l.loaned_at, l.due_at, l.returned_at, l.returned,
		b.title AS book_title, b.author AS book_author,
		u.name AS user_name, u.contact AS user_contact
	FROM loans l
	JOIN books b ON b.id = l.book_id
	JOIN users u ON u.id = l.user_id
"#;

/// Result of a return request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
	Returned(Loan),
	/// The loan was already closed; nothing was written.
	AlreadyReturned(Loan),
}

impl ReturnOutcome {
	pub fn loan(&self) -> &Loan {
		match self {
			ReturnOutcome::Returned(loan) | ReturnOutcome::AlreadyReturned(loan) => loan,
		}
	}
}

#[async_trait]
pub trait LoanStore: Send + Sync {
	async fn checkout(&self, book_id: &BookId, user_id: &UserId, now: DateTime<Utc>) -> Result<Loan, DbError>;
	async fn return_loan(&self, id: &LoanId, now: DateTime<Utc>) -> Result<ReturnOutcome, DbError>;
	async fn get_loan_by_id(&self, id: &LoanId) -> Result<Option<Loan>, DbError>;
	async fn get_loan_details(&self, id: &LoanId) -> Result<Option<LoanDetails>, DbError>;
	async fn update_loan(&self, loan: &Loan) -> Result<(), DbError>;
	async fn list_active_loans(&self) -> Result<Vec<LoanDetails>, DbError>;
	async fn list_active_loans_oldest_first(&self) -> Result<Vec<LoanDetails>, DbError>;
	async fn list_returned_loans(&self) -> Result<Vec<LoanDetails>, DbError>;
}

#[async_trait]
impl LoanStore for LoanRepository {
	async fn checkout(&self, book_id: &BookId, user_id: &UserId, now: DateTime<Utc>) -> Result<Loan, DbError> {
		self.checkout(book_id, user_id, now).await
	}

	async fn return_loan(&self, id: &LoanId, now: DateTime<Utc>) -> Result<ReturnOutcome, DbError> {
		self.return_loan(id, now).await
	}

	async fn get_loan_by_id(&self, id: &LoanId) -> Result<Option<Loan>, DbError> {
		self.get_loan_by_id(id).await
	}

	async fn get_loan_details(&self, id: &LoanId) -> Result<Option<LoanDetails>, DbError> {
		self.get_loan_details(id).await
	}

	async fn update_loan(&self, loan: &Loan) -> Result<(), DbError> {
		self.update_loan(loan).await
	}

	async fn list_active_loans(&self) -> Result<Vec<LoanDetails>, DbError> {
		self.list_active_loans().await
	}

	async fn list_active_loans_oldest_first(&self) -> Result<Vec<LoanDetails>, DbError> {
		self.list_active_loans_oldest_first().await
	}

	async fn list_returned_loans(&self) -> Result<Vec<LoanDetails>, DbError> {
		self.list_returned_loans().await
	}
}

#[derive(Clone)]
pub struct LoanRepository {
	pool: SqlitePool,
}

impl LoanRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Open a loan and mark the book unavailable.
	///
	/// # Errors
	/// - `DbError::NotFound` if the book does not exist
	/// - `DbError::Conflict` if the book is not available, including when a
	///   concurrent checkout won the race
	#[tracing::instrument(skip(self, now), fields(book_id = %book_id, user_id = %user_id))]
	pub async fn checkout(&self, book_id: &BookId, user_id: &UserId, now: DateTime<Utc>) -> Result<Loan, DbError> {
		let mut tx = self.pool.begin().await?;

		let row = sqlx::query("SELECT available FROM books WHERE id = ?")
			.bind(book_id.to_string())
			.fetch_optional(&mut *tx)
			.await?;
		let available: bool = match row {
			Some(row) => row.get("available"),
			None => return Err(DbError::NotFound(format!("book {book_id}"))),
		};
		if !available {
			return Err(DbError::Conflict(format!("book {book_id} is not available")));
		}

		let loan = Loan::open(*book_id, *user_id, now);
		sqlx::query(
			r#"
			INSERT INTO loans (id, book_id, user_id, loaned_at, due_at, returned_at, returned)
			VALUES (?, ?, ?, ?, ?, NULL, 0)
			"#,
		)
		.bind(loan.id.to_string())
		.bind(loan.book_id.to_string())
		.bind(loan.user_id.to_string())
		.bind(time::encode(&loan.loaned_at))
		.bind(loan.due_at.as_ref().map(time::encode))
		.execute(&mut *tx)
		.await?;

		let claimed = sqlx::query("UPDATE books SET available = 0 WHERE id = ? AND available = 1")
			.bind(book_id.to_string())
			.execute(&mut *tx)
			.await?;
		if claimed.rows_affected() != 1 {
			return Err(DbError::Conflict(format!("book {book_id} is not available")));
		}

		tx.commit().await?;
		tracing::info!(loan_id = %loan.id, due_at = ?loan.due_at, "loan opened");
		Ok(loan)
	}

	/// Close a loan and mark its book available again.
	///
	/// Returning an already-returned loan writes nothing and yields
	/// [`ReturnOutcome::AlreadyReturned`].
	#[tracing::instrument(skip(self, now), fields(loan_id = %id))]
	pub async fn return_loan(&self, id: &LoanId, now: DateTime<Utc>) -> Result<ReturnOutcome, DbError> {
		let mut tx = self.pool.begin().await?;

		let row = sqlx::query(
			r#"
			SELECT id, book_id, user_id, loaned_at, due_at, returned_at, returned
			FROM loans
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&mut *tx)
		.await?;
		let mut loan = match row {
			Some(row) => parse_loan_row(&row)?,
			None => return Err(DbError::NotFound(format!("loan {id}"))),
		};

		if !loan.mark_returned(now) {
			tracing::debug!("loan already returned");
			return Ok(ReturnOutcome::AlreadyReturned(loan));
		}

		let closed = sqlx::query("UPDATE loans SET returned = 1, returned_at = ? WHERE id = ? AND returned = 0")
			.bind(loan.returned_at.as_ref().map(time::encode))
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;
		if closed.rows_affected() != 1 {
			return Err(DbError::Conflict(format!("loan {id} changed concurrently")));
		}

		sqlx::query("UPDATE books SET available = 1 WHERE id = ?")
			.bind(loan.book_id.to_string())
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;
		tracing::info!(book_id = %loan.book_id, returned_at = ?loan.returned_at, "loan returned");
		Ok(ReturnOutcome::Returned(loan))
	}

	#[tracing::instrument(skip(self), fields(loan_id = %id))]
	pub async fn get_loan_by_id(&self, id: &LoanId) -> Result<Option<Loan>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, book_id, user_id, loaned_at, due_at, returned_at, returned
			FROM loans
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => Ok(Some(parse_loan_row(&row)?)),
			None => Ok(None),
		}
	}

	#[tracing::instrument(skip(self), fields(loan_id = %id))]
	pub async fn get_loan_details(&self, id: &LoanId) -> Result<Option<LoanDetails>, DbError> {
		let row = sqlx::query(&format!("{DETAIL_SELECT} WHERE l.id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some(row) => Ok(Some(parse_details_row(&row)?)),
			None => Ok(None),
		}
	}

	/// Overwrite a loan as-is. Book availability is not adjusted.
	#[tracing::instrument(skip(self, loan), fields(loan_id = %loan.id, returned = loan.returned))]
	pub async fn update_loan(&self, loan: &Loan) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE loans
			SET book_id = ?, user_id = ?, loaned_at = ?, due_at = ?, returned_at = ?, returned = ?
			WHERE id = ?
			"#,
		)
		.bind(loan.book_id.to_string())
		.bind(loan.user_id.to_string())
		.bind(time::encode(&loan.loaned_at))
		.bind(loan.due_at.as_ref().map(time::encode))
		.bind(loan.returned_at.as_ref().map(time::encode))
		.bind(loan.returned)
		.bind(loan.id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("loan {}", loan.id)));
		}
		Ok(())
	}

	/// Active loans, most recent first.
	#[tracing::instrument(skip(self))]
	pub async fn list_active_loans(&self) -> Result<Vec<LoanDetails>, DbError> {
		self.list_details("WHERE l.returned = 0 ORDER BY l.loaned_at DESC, l.rowid DESC").await
	}

	/// Active loans, oldest first, for the return screen.
	#[tracing::instrument(skip(self))]
	pub async fn list_active_loans_oldest_first(&self) -> Result<Vec<LoanDetails>, DbError> {
		self.list_details("WHERE l.returned = 0 ORDER BY l.loaned_at, l.rowid").await
	}

	/// Returned loans in the order they were opened.
	#[tracing::instrument(skip(self))]
	pub async fn list_returned_loans(&self) -> Result<Vec<LoanDetails>, DbError> {
		self.list_details("WHERE l.returned = 1 ORDER BY l.rowid").await
	}

	async fn list_details(&self, tail: &'static str) -> Result<Vec<LoanDetails>, DbError> {
		let rows = sqlx::query(&format!("{DETAIL_SELECT} {tail}"))
			.fetch_all(&self.pool)
			.await?;
		rows.iter().map(parse_details_row).collect()
	}
}

fn parse_uuid(row: &sqlx::sqlite::SqliteRow, column: &str, what: &str) -> Result<Uuid, DbError> {
	let value: String = row.get(column);
	Uuid::parse_str(&value).map_err(|e| DbError::Internal(format!("Invalid {what} UUID: {e}")))
}

fn parse_loan_row(row: &sqlx::sqlite::SqliteRow) -> Result<Loan, DbError> {
	let loaned_at_str: String = row.get("loaned_at");

	Ok(Loan {
		id: LoanId::new(parse_uuid(row, "id", "loan")?),
		book_id: BookId::new(parse_uuid(row, "book_id", "book")?),
		user_id: UserId::new(parse_uuid(row, "user_id", "user")?),
		loaned_at: time::decode("loaned_at", &loaned_at_str)?,
		due_at: time::decode_opt("due_at", row.get("due_at"))?,
		returned_at: time::decode_opt("returned_at", row.get("returned_at"))?,
		returned: row.get("returned"),
	})
}

fn parse_details_row(row: &sqlx::sqlite::SqliteRow) -> Result<LoanDetails, DbError> {
	Ok(LoanDetails {
		loan: parse_loan_row(row)?,
		book_title: row.get("book_title"),
		book_author: row.get("book_author"),
		user_name: row.get("user_name"),
		user_contact: row.get("user_contact"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{at, book, create_test_pool, member};
	use crate::{BookRepository, UserRepository};
	use chrono::Duration;

	struct Fixture {
		loans: LoanRepository,
		books: BookRepository,
		users: UserRepository,
	}

	async fn fixture() -> Fixture {
		let pool = create_test_pool().await;
		Fixture {
			loans: LoanRepository::new(pool.clone()),
			books: BookRepository::new(pool.clone()),
			users: UserRepository::new(pool),
		}
	}

	async fn seed(f: &Fixture, title: &str, name: &str, login: &str) -> (BookId, UserId) {
		let b = book(title, "Author");
		let u = member(name, login);
		f.books.create_book(&b).await.unwrap();
		f.users.create_user(&u).await.unwrap();
		(b.id, u.id)
	}

	#[tokio::test]
	async fn test_checkout_marks_book_unavailable() {
		let f = fixture().await;
		let (book_id, user_id) = seed(&f, "Iracema", "Ana", "ana").await;
		let now = at(2024, 3, 1, 10, 0);

		let loan = f.loans.checkout(&book_id, &user_id, now).await.unwrap();
		assert!(!loan.returned);
		assert_eq!(loan.due_at, Some(now + Duration::days(7)));

		let stored = f.loans.get_loan_by_id(&loan.id).await.unwrap().unwrap();
		assert_eq!(stored, loan);
		assert!(!f.books.get_book_by_id(&book_id).await.unwrap().unwrap().available);
	}

	#[tokio::test]
	async fn test_checkout_unavailable_book_is_conflict() {
		let f = fixture().await;
		let (book_id, user_id) = seed(&f, "Iracema", "Ana", "ana").await;
		let now = at(2024, 3, 1, 10, 0);

		f.loans.checkout(&book_id, &user_id, now).await.unwrap();
		let err = f.loans.checkout(&book_id, &user_id, now).await.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
		assert_eq!(f.loans.list_active_loans().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_checkout_missing_book_is_not_found() {
		let f = fixture().await;
		let (_, user_id) = seed(&f, "Iracema", "Ana", "ana").await;
		let err = f
			.loans
			.checkout(&BookId::generate(), &user_id, at(2024, 3, 1, 10, 0))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));
	}

	#[tokio::test]
	async fn test_checkout_missing_user_rolls_back() {
		let f = fixture().await;
		let (book_id, _) = seed(&f, "Iracema", "Ana", "ana").await;
		let result = f
			.loans
			.checkout(&book_id, &UserId::generate(), at(2024, 3, 1, 10, 0))
			.await;
		assert!(result.is_err());
		assert!(f.books.get_book_by_id(&book_id).await.unwrap().unwrap().available);
	}

	#[tokio::test]
	async fn test_return_restores_availability() {
		let f = fixture().await;
		let (book_id, user_id) = seed(&f, "Iracema", "Ana", "ana").await;
		let loaned = at(2024, 3, 1, 10, 0);
		let loan = f.loans.checkout(&book_id, &user_id, loaned).await.unwrap();

		let outcome = f.loans.return_loan(&loan.id, at(2024, 3, 5, 9, 0)).await.unwrap();
		let ReturnOutcome::Returned(returned) = outcome else {
			panic!("expected Returned");
		};
		assert!(returned.returned);
		assert_eq!(returned.returned_at, Some(at(2024, 3, 5, 9, 0)));
		assert!(f.books.get_book_by_id(&book_id).await.unwrap().unwrap().available);
		assert_eq!(f.loans.list_returned_loans().await.unwrap().len(), 1);
		assert!(f.loans.list_active_loans().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_immediate_return_is_floored_to_one_minute() {
		let f = fixture().await;
		let (book_id, user_id) = seed(&f, "Iracema", "Ana", "ana").await;
		let loaned = at(2024, 3, 1, 10, 0);
		let loan = f.loans.checkout(&book_id, &user_id, loaned).await.unwrap();

		let outcome = f.loans.return_loan(&loan.id, loaned).await.unwrap();
		assert_eq!(outcome.loan().returned_at, Some(loaned + Duration::minutes(1)));
	}

	#[tokio::test]
	async fn test_second_return_is_noop() {
		let f = fixture().await;
		let (book_id, user_id) = seed(&f, "Iracema", "Ana", "ana").await;
		let loan = f.loans.checkout(&book_id, &user_id, at(2024, 3, 1, 10, 0)).await.unwrap();
		f.loans.return_loan(&loan.id, at(2024, 3, 2, 10, 0)).await.unwrap();

		let outcome = f.loans.return_loan(&loan.id, at(2024, 3, 9, 10, 0)).await.unwrap();
		assert!(matches!(outcome, ReturnOutcome::AlreadyReturned(_)));
		assert_eq!(outcome.loan().returned_at, Some(at(2024, 3, 2, 10, 0)));
	}

	#[tokio::test]
	async fn test_return_missing_loan_is_not_found() {
		let f = fixture().await;
		let err = f
			.loans
			.return_loan(&LoanId::generate(), at(2024, 3, 1, 10, 0))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));
	}

	#[tokio::test]
	async fn test_active_loan_ordering() {
		let f = fixture().await;
		let (b1, u) = seed(&f, "First", "Ana", "ana").await;
		let b2 = book("Second", "Author");
		f.books.create_book(&b2).await.unwrap();

		f.loans.checkout(&b1, &u, at(2024, 3, 1, 10, 0)).await.unwrap();
		f.loans.checkout(&b2.id, &u, at(2024, 3, 2, 10, 0)).await.unwrap();

		let newest: Vec<_> = f
			.loans
			.list_active_loans()
			.await
			.unwrap()
			.into_iter()
			.map(|d| d.book_title)
			.collect();
		assert_eq!(newest, vec!["Second", "First"]);

		let oldest: Vec<_> = f
			.loans
			.list_active_loans_oldest_first()
			.await
			.unwrap()
			.into_iter()
			.map(|d| d.book_title)
			.collect();
		assert_eq!(oldest, vec!["First", "Second"]);
	}

	#[tokio::test]
	async fn test_details_join() {
		let f = fixture().await;
		let (book_id, user_id) = seed(&f, "Iracema", "Ana Lima", "ana").await;
		let loan = f.loans.checkout(&book_id, &user_id, at(2024, 3, 1, 10, 0)).await.unwrap();

		let details = f.loans.get_loan_details(&loan.id).await.unwrap().unwrap();
		assert_eq!(details.book_title, "Iracema");
		assert_eq!(details.user_name, "Ana Lima");
		assert_eq!(details.loan, loan);
	}

	#[tokio::test]
	async fn test_update_loan_keeps_invariant() {
		let f = fixture().await;
		let (book_id, user_id) = seed(&f, "Iracema", "Ana", "ana").await;
		let mut loan = f.loans.checkout(&book_id, &user_id, at(2024, 3, 1, 10, 0)).await.unwrap();

		loan.apply_admin_edit(book_id, user_id, true, at(2024, 3, 3, 10, 0));
		f.loans.update_loan(&loan).await.unwrap();
		let stored = f.loans.get_loan_by_id(&loan.id).await.unwrap().unwrap();
		assert!(stored.returned && stored.is_consistent());

		let mut broken = stored.clone();
		broken.returned_at = None;
		assert!(f.loans.update_loan(&broken).await.is_err());
	}

	#[tokio::test]
	async fn test_deleting_book_cascades_to_loans() {
		let f = fixture().await;
		let (book_id, user_id) = seed(&f, "Iracema", "Ana", "ana").await;
		let loan = f.loans.checkout(&book_id, &user_id, at(2024, 3, 1, 10, 0)).await.unwrap();

		assert!(f.books.delete_book(&book_id).await.unwrap());
		assert!(f.loans.get_loan_by_id(&loan.id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_deleting_borrower_releases_held_books() {
		let f = fixture().await;
		let (held, user_id) = seed(&f, "Dune", "Ana", "ana").await;
		let returned = book("Emma", "Austen");
		f.books.create_book(&returned).await.unwrap();
		let (other, other_user) = seed(&f, "Iracema", "Rui", "rui").await;

		let active = f.loans.checkout(&held, &user_id, at(2024, 3, 1, 10, 0)).await.unwrap();
		let done = f.loans.checkout(&returned.id, &user_id, at(2024, 3, 1, 11, 0)).await.unwrap();
		f.loans.return_loan(&done.id, at(2024, 3, 2, 11, 0)).await.unwrap();
		f.loans.checkout(&other, &other_user, at(2024, 3, 1, 12, 0)).await.unwrap();

		assert!(f.users.delete_user(&user_id).await.unwrap());

		assert!(f.loans.get_loan_by_id(&active.id).await.unwrap().is_none());
		assert!(f.books.get_book_by_id(&held).await.unwrap().unwrap().available);
		assert!(f.books.get_book_by_id(&returned.id).await.unwrap().unwrap().available);
		assert!(!f.books.get_book_by_id(&other).await.unwrap().unwrap().available);
		assert_eq!(f.loans.list_active_loans().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_count_active_loans_ignores_returned() {
		let f = fixture().await;
		let (book_id, user_id) = seed(&f, "Dune", "Ana", "ana").await;
		assert_eq!(f.books.count_active_loans(&book_id).await.unwrap(), 0);

		let loan = f.loans.checkout(&book_id, &user_id, at(2024, 3, 1, 10, 0)).await.unwrap();
		assert_eq!(f.books.count_active_loans(&book_id).await.unwrap(), 1);

		f.loans.return_loan(&loan.id, at(2024, 3, 2, 10, 0)).await.unwrap();
		assert_eq!(f.books.count_active_loans(&book_id).await.unwrap(), 0);
	}
}
