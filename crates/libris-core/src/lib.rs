// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entity model for libris.
//!
//! - [`User`], [`Book`] and [`Loan`] with their invariants
//! - loan arithmetic: due dates, the return timestamp floor and fines
//! - [`SearchQuery`] for case-insensitive substring filtering
//! - [`ValidationErrors`] shared by every form validator
//!
//! Everything here is pure; persistence lives in `libris-db`.

pub mod book;
pub mod loan;
pub mod search;
pub mod types;
pub mod user;
pub mod validation;

pub use book::{Book, BookDraft, BookForm};
pub use loan::{
	compute_fine, return_timestamp, Loan, LoanDetails, LoanStatus, FINE_PER_DAY, LOAN_PERIOD_DAYS,
	MIN_RETURN_DELAY_MINUTES,
};
pub use search::{SearchQuery, Searchable};
pub use types::{BookId, LoanId, ParseRoleError, Role, UserId};
pub use user::User;
pub use validation::{Field, ValidationErrors};
