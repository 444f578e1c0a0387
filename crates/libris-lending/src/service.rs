// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use libris_auth::{authorize, Action, Principal};
use libris_core::{Book, BookId, LoanDetails, LoanId, SearchQuery, User, UserId};
use libris_db::{BookStore, DbError, LoanStore, ReturnOutcome, UserStore};
use serde::Serialize;
use tracing::instrument;

use crate::error::{LendingError, Result};

/// A loan as shown in listings, with its fine as of today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanView {
	#[serde(flatten)]
	pub details: LoanDetails,
	pub fine: i64,
	pub overdue: bool,
}

impl LoanView {
	pub fn new(details: LoanDetails, today: NaiveDate) -> Self {
		let fine = details.loan.fine_as_of(today);
		let overdue = details.loan.is_overdue(today);
		Self { details, fine, overdue }
	}
}

/// Everything the checkout screen lists.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutPage {
	pub books: Vec<Book>,
	pub users: Vec<User>,
	pub active_loans: Vec<LoanView>,
}

/// Choices offered when editing a loan: available books plus the loan's
/// current book, and every user.
#[derive(Debug, Clone, Serialize)]
pub struct LoanEditPage {
	pub loan: LoanDetails,
	pub books: Vec<Book>,
	pub users: Vec<User>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanEdit {
	pub book_id: BookId,
	pub user_id: UserId,
	pub returned: bool,
}

/// Outcome of a return together with the names needed to report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnReceipt {
	pub outcome: ReturnOutcome,
	pub book_title: String,
	pub user_name: String,
}

impl ReturnReceipt {
	pub fn already_returned(&self) -> bool {
		matches!(self.outcome, ReturnOutcome::AlreadyReturned(_))
	}
}

/// Drives loans through `Active` to `Returned`.
///
/// Every operation re-checks the principal against the access policy before
/// touching storage.
#[derive(Clone)]
pub struct LendingService {
	loans: Arc<dyn LoanStore>,
	books: Arc<dyn BookStore>,
	users: Arc<dyn UserStore>,
}

impl LendingService {
	pub fn new(loans: Arc<dyn LoanStore>, books: Arc<dyn BookStore>, users: Arc<dyn UserStore>) -> Self {
		Self { loans, books, users }
	}

	/// Lend a book to a user.
	///
	/// # Errors
	/// - `Forbidden` unless the principal is admin or staff
	/// - `NotFound` if the book or the user does not exist
	/// - `Unavailable` if the book is already lent; nothing is written
	#[instrument(skip(self, principal), fields(actor = %principal.user_id, %book_id, %user_id))]
	pub async fn checkout(&self, principal: &Principal, book_id: &BookId, user_id: &UserId) -> Result<LoanDetails> {
		authorize(Some(principal), Action::Checkout).into_result()?;

		let book = self
			.books
			.get_book_by_id(book_id)
			.await?
			.ok_or_else(|| LendingError::NotFound(format!("book {book_id}")))?;
		let user = self
			.users
			.get_user_by_id(user_id)
			.await?
			.ok_or_else(|| LendingError::NotFound(format!("user {user_id}")))?;

		if !book.available {
			return Err(LendingError::Unavailable { title: book.title });
		}

		let loan = match self.loans.checkout(book_id, user_id, now()).await {
			Ok(loan) => loan,
			Err(DbError::Conflict(_)) => return Err(LendingError::Unavailable { title: book.title }),
			Err(DbError::NotFound(what)) => return Err(LendingError::NotFound(what)),
			Err(e) => return Err(e.into()),
		};

		Ok(LoanDetails {
			loan,
			book_title: book.title,
			book_author: book.author,
			user_name: user.name,
			user_contact: user.contact,
		})
	}

	/// Close a loan. An already-returned loan is reported, not an error.
	#[instrument(skip(self, principal), fields(actor = %principal.user_id, %loan_id))]
	pub async fn return_loan(&self, principal: &Principal, loan_id: &LoanId) -> Result<ReturnReceipt> {
		authorize(Some(principal), Action::ReturnLoan).into_result()?;

		let details = self.find_loan(loan_id).await?;
		let outcome = match self.loans.return_loan(loan_id, now()).await {
			Ok(outcome) => outcome,
			Err(DbError::NotFound(what)) => return Err(LendingError::NotFound(what)),
			Err(e) => return Err(e.into()),
		};

		Ok(ReturnReceipt {
			outcome,
			book_title: details.book_title,
			user_name: details.user_name,
		})
	}

	/// Administrative overwrite of a loan's book, user and returned state.
	///
	/// Book availability is not adjusted; a change that leaves it out of step
	/// is logged.
	#[instrument(skip(self, principal, edit), fields(actor = %principal.user_id, %loan_id, returned = edit.returned))]
	pub async fn edit_loan(&self, principal: &Principal, loan_id: &LoanId, edit: LoanEdit) -> Result<LoanDetails> {
		authorize(Some(principal), Action::EditLoan).into_result()?;

		let mut loan = self
			.loans
			.get_loan_by_id(loan_id)
			.await?
			.ok_or_else(|| LendingError::NotFound(format!("loan {loan_id}")))?;
		let book = self
			.books
			.get_book_by_id(&edit.book_id)
			.await?
			.ok_or_else(|| LendingError::NotFound(format!("book {}", edit.book_id)))?;
		if self.users.get_user_by_id(&edit.user_id).await?.is_none() {
			return Err(LendingError::NotFound(format!("user {}", edit.user_id)));
		}

		let previous_book = loan.book_id;
		let was_returned = loan.returned;
		loan.apply_admin_edit(edit.book_id, edit.user_id, edit.returned, now());
		self.loans.update_loan(&loan).await?;

		if previous_book != loan.book_id || was_returned != loan.returned {
			tracing::warn!(
				%previous_book,
				book_id = %loan.book_id,
				was_returned,
				returned = loan.returned,
				book_available = book.available,
				"loan edited without adjusting book availability"
			);
		}

		self.find_loan(loan_id).await
	}

	#[instrument(skip(self, principal), fields(actor = %principal.user_id, %loan_id))]
	pub async fn edit_loan_page(&self, principal: &Principal, loan_id: &LoanId) -> Result<LoanEditPage> {
		authorize(Some(principal), Action::EditLoan).into_result()?;

		let loan = self.find_loan(loan_id).await?;
		let mut books = self.books.list_available_books().await?;
		if !books.iter().any(|b| b.id == loan.loan.book_id) {
			if let Some(current) = self.books.get_book_by_id(&loan.loan.book_id).await? {
				books.insert(0, current);
			}
		}
		let users = self.users.list_users_by_name().await?;

		Ok(LoanEditPage { loan, books, users })
	}

	/// Active loans matching `query`, newest first.
	#[instrument(skip(self, principal, query), fields(actor = %principal.user_id, query = %query.as_str()))]
	pub async fn active_loans(&self, principal: &Principal, query: &SearchQuery) -> Result<Vec<LoanView>> {
		authorize(Some(principal), Action::SearchActiveLoans).into_result()?;

		let loans = query.filter(self.loans.list_active_loans().await?);
		Ok(with_fines(loans))
	}

	/// Returned loans matching `query`, in the order they were opened.
	#[instrument(skip(self, principal, query), fields(actor = %principal.user_id, query = %query.as_str()))]
	pub async fn returned_loans(&self, principal: &Principal, query: &SearchQuery) -> Result<Vec<LoanView>> {
		authorize(Some(principal), Action::ListReturnedLoans).into_result()?;

		let loans = query.filter(self.loans.list_returned_loans().await?);
		Ok(with_fines(loans))
	}

	#[instrument(skip(self, principal), fields(actor = %principal.user_id))]
	pub async fn checkout_page(&self, principal: &Principal) -> Result<CheckoutPage> {
		authorize(Some(principal), Action::Checkout).into_result()?;

		let books = self.books.list_available_books().await?;
		let users = self.users.list_users_by_name().await?;
		let active_loans = with_fines(self.loans.list_active_loans_oldest_first().await?);

		Ok(CheckoutPage {
			books,
			users,
			active_loans,
		})
	}

	async fn find_loan(&self, loan_id: &LoanId) -> Result<LoanDetails> {
		self.loans
			.get_loan_details(loan_id)
			.await?
			.ok_or_else(|| LendingError::NotFound(format!("loan {loan_id}")))
	}
}

fn with_fines(loans: Vec<LoanDetails>) -> Vec<LoanView> {
	let today = now().date_naive();
	loans.into_iter().map(|d| LoanView::new(d, today)).collect()
}

/// Storage keeps microseconds; truncating here keeps returned values equal
/// to what a later read yields.
fn now() -> DateTime<Utc> {
	Utc::now().trunc_subsecs(6)
}
