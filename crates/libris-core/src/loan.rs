// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loans and the arithmetic around them.
//!
//! A loan is `Active` until returned, then `Returned`; there are no other
//! states. The functions here are pure. The transactional checkout and return
//! live in `libris-db`, orchestrated by `libris-lending`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::search::{SearchQuery, Searchable};
use crate::types::{BookId, LoanId, UserId};

/// Days between checkout and the expected return.
pub const LOAN_PERIOD_DAYS: i64 = 7;

/// A return is never recorded sooner than this after the checkout.
pub const MIN_RETURN_DELAY_MINUTES: i64 = 1;

/// Fine charged per whole day late, in currency units.
pub const FINE_PER_DAY: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
	Active,
	Returned,
}

/// A checkout of one book by one user.
///
/// Invariant: `returned == returned_at.is_some()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loan {
	pub id: LoanId,
	pub book_id: BookId,
	pub user_id: UserId,
	pub loaned_at: DateTime<Utc>,
	pub due_at: Option<DateTime<Utc>>,
	pub returned_at: Option<DateTime<Utc>>,
	pub returned: bool,
}

impl Loan {
	/// A fresh active loan starting at `now`.
	pub fn open(book_id: BookId, user_id: UserId, now: DateTime<Utc>) -> Self {
		Self {
			id: LoanId::generate(),
			book_id,
			user_id,
			loaned_at: now,
			due_at: Some(now + Duration::days(LOAN_PERIOD_DAYS)),
			returned_at: None,
			returned: false,
		}
	}

	pub fn status(&self) -> LoanStatus {
		if self.returned {
			LoanStatus::Returned
		} else {
			LoanStatus::Active
		}
	}

	pub fn is_consistent(&self) -> bool {
		self.returned == self.returned_at.is_some()
	}

	/// Transition to `Returned`. Returns `false` if the loan was already returned.
	pub fn mark_returned(&mut self, now: DateTime<Utc>) -> bool {
		if self.returned {
			return false;
		}
		self.returned_at = Some(return_timestamp(self.loaned_at, now));
		self.returned = true;
		true
	}

	/// Administrative overwrite of the book, user and returned state.
	///
	/// Becoming returned without a timestamp stamps `now`; becoming active
	/// again clears the timestamp. Book availability is not touched here.
	pub fn apply_admin_edit(&mut self, book_id: BookId, user_id: UserId, returned: bool, now: DateTime<Utc>) {
		self.book_id = book_id;
		self.user_id = user_id;
		self.returned = returned;
		if returned {
			if self.returned_at.is_none() {
				self.returned_at = Some(now);
			}
		} else {
			self.returned_at = None;
		}
	}

	pub fn fine_as_of(&self, today: NaiveDate) -> i64 {
		compute_fine(self, today)
	}

	pub fn is_overdue(&self, today: NaiveDate) -> bool {
		!self.returned && compute_fine(self, today) > 0
	}
}

/// The instant recorded for a return: `max(now, loaned_at + 1 minute)`.
pub fn return_timestamp(loaned_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
	let floor = loaned_at + Duration::minutes(MIN_RETURN_DELAY_MINUTES);
	now.max(floor)
}

/// Fine owed on a loan, in currency units.
///
/// Only calendar dates count; time of day is ignored.
///
/// - returned: days between the due date and the return date
/// - active: days between the due date and `today`, a running fine
/// - no due date recorded: nothing
pub fn compute_fine(loan: &Loan, today: NaiveDate) -> i64 {
	let Some(due_at) = loan.due_at else {
		return 0;
	};
	let due = due_at.date_naive();

	let end = if loan.returned {
		match loan.returned_at {
			Some(returned_at) => returned_at.date_naive(),
			None => return 0,
		}
	} else {
		today
	};

	let days_late = (end - due).num_days();
	days_late.max(0) * FINE_PER_DAY
}

/// A loan joined with the book and user columns shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanDetails {
	#[serde(flatten)]
	pub loan: Loan,
	pub book_title: String,
	pub book_author: String,
	pub user_name: String,
	pub user_contact: Option<String>,
}

impl Searchable for LoanDetails {
	fn matches(&self, query: &SearchQuery) -> bool {
		query.matches_any([
			Some(self.book_title.as_str()),
			Some(self.book_author.as_str()),
			Some(self.user_name.as_str()),
			self.user_contact.as_deref(),
		])
	}
}
