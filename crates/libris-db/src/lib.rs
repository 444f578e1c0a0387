// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for libris.
//!
//! Each entity has a `*Store` trait and a `*Repository` implementing it over
//! a [`SqlitePool`](sqlx::SqlitePool). Foreign keys are enforced; deleting a
//! user or a book cascades to its loans.

pub mod book;
pub mod error;
pub mod loan;
pub mod migrations;
pub mod pool;
mod time;
pub mod user;

#[cfg(test)]
mod testing;

pub use book::{BookRepository, BookStore};
pub use error::{DbError, Result};
pub use loan::{LoanRepository, LoanStore, ReturnOutcome};
pub use migrations::run_migrations;
pub use pool::create_pool;
pub use user::{UserRepository, UserStore};
