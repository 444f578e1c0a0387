// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use libris_auth::DenyReason;
use libris_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum LendingError {
	#[error("Access denied: {0:?}")]
	Forbidden(DenyReason),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Book '{title}' is not available")]
	Unavailable { title: String },

	#[error(transparent)]
	Db(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, LendingError>;

impl From<DenyReason> for LendingError {
	fn from(reason: DenyReason) -> Self {
		LendingError::Forbidden(reason)
	}
}
