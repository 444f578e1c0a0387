// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Timestamp columns.
//!
//! Stored as fixed-width RFC 3339 UTC text (microseconds, `Z` suffix) so that
//! `ORDER BY` on the column is chronological.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DbError;

pub(crate) fn encode(ts: &DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode(column: &str, value: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn decode_opt(column: &str, value: Option<String>) -> Result<Option<DateTime<Utc>>, DbError> {
	value.map(|v| decode(column, &v)).transpose()
}
