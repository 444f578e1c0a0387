// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loan lifecycle engine.
//!
//! [`LendingService`] authorizes the acting [`Principal`](libris_auth::Principal),
//! then runs checkout, return and administrative edits against the stores.
//! Fine arithmetic is pure and lives in `libris-core`; it is re-exported here.

pub mod error;
pub mod service;

pub use error::{LendingError, Result};
pub use libris_core::{compute_fine, return_timestamp, FINE_PER_DAY, LOAN_PERIOD_DAYS};
pub use libris_db::ReturnOutcome;
pub use service::{CheckoutPage, LendingService, LoanEdit, LoanEditPage, LoanView, ReturnReceipt};
