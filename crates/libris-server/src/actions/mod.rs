// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request handlers.
//!
//! Each action takes an [`ActionContext`] and the optional acting
//! [`Principal`], and returns an [`ActionOutcome`]: a view to render or a
//! redirect, plus queued notifications. Policy denials, validation failures
//! and storage failures all become outcomes; only a missing record is
//! surfaced as [`ActionError::NotFound`].
//!
//! # Authorization Matrix
//!
//! | Action | Required |
//! |---|---|
//! | `home`, `list_books`, `register`, `login`, `logout` | public |
//! | `edit_own_profile` | authenticated |
//! | book create/edit, user list/create/edit, loans | admin or staff |
//! | `delete_book`, `delete_user` | admin |
//!
//! Staff only reach member accounts, and nobody deletes their own account.

pub mod auth;
pub mod books;
pub mod context;
pub mod loans;
pub mod outcome;
pub mod users;

pub use context::ActionContext;
pub use outcome::{
	routes, views, ActionError, ActionOutcome, ActionResult, Notification, Response, SessionChange, Severity,
};

use std::future::Future;

use libris_auth::{authorize, Action, DenyReason, Principal};
use libris_core::ValidationErrors;
use serde_json::{Map, Value};

#[cfg(test)]
pub(crate) mod test_support;

/// Why a handler stopped before reaching its happy path.
pub(crate) enum Halt {
	Outcome(ActionOutcome),
	NotFound(ActionError),
}

impl From<ActionOutcome> for Halt {
	fn from(outcome: ActionOutcome) -> Self {
		Halt::Outcome(outcome)
	}
}

impl From<ActionError> for Halt {
	fn from(error: ActionError) -> Self {
		Halt::NotFound(error)
	}
}

/// Run a handler body, folding early exits back into an [`ActionResult`].
async fn handle(body: impl Future<Output = Result<ActionOutcome, Halt>>) -> ActionResult {
	match body.await {
		Ok(outcome) | Err(Halt::Outcome(outcome)) => Ok(outcome),
		Err(Halt::NotFound(error)) => Err(error),
	}
}

/// Log a storage failure and turn it into a redirect with an error.
fn storage_failure(ctx: &ActionContext, error: &dyn std::fmt::Display, target: &'static str, key: &str) -> Halt {
	tracing::error!(error = %error, target, "storage failure");
	Halt::Outcome(ActionOutcome::redirect(target).error(ctx.t(key)))
}

/// Check `action` against the policy; a denial becomes a redirect with an
/// error notification.
fn gate<'p>(
	ctx: &ActionContext,
	principal: Option<&'p Principal>,
	action: Action,
) -> Result<Option<&'p Principal>, ActionOutcome> {
	match authorize(principal, action).into_result() {
		Ok(()) => Ok(principal),
		Err(reason) => Err(denied(ctx, principal, action, reason)),
	}
}

/// Like [`gate`] for actions that always need a principal.
fn gate_authenticated<'p>(
	ctx: &ActionContext,
	principal: Option<&'p Principal>,
	action: Action,
) -> Result<&'p Principal, ActionOutcome> {
	match gate(ctx, principal, action)? {
		Some(principal) => Ok(principal),
		None => Err(denied(ctx, None, action, DenyReason::AuthenticationRequired)),
	}
}

fn denied(ctx: &ActionContext, principal: Option<&Principal>, action: Action, reason: DenyReason) -> ActionOutcome {
	tracing::warn!(
		actor = ?principal.map(|p| p.user_id),
		role = ?principal.map(|p| p.role),
		?action,
		?reason,
		"action denied"
	);

	let target = match reason {
		DenyReason::AuthenticationRequired => routes::LOGIN,
		DenyReason::StaffMemberOnly | DenyReason::SelfDeletion => routes::USERS,
		DenyReason::PermissionDenied => routes::HOME,
	};
	ActionOutcome::redirect(target).error(ctx.t(reason.message_key()))
}

/// Field errors with each message key translated for the active locale.
fn localized_errors(ctx: &ActionContext, errors: &ValidationErrors) -> Value {
	let mut map = Map::new();
	for (field, keys) in errors.iter() {
		let messages = keys.iter().map(|key| Value::String(ctx.t(key))).collect();
		map.insert(field.as_str().to_string(), Value::Array(messages));
	}
	Value::Object(map)
}

/// Parse a record id from a request parameter. A malformed id cannot name
/// an existing record, so it is reported as not found.
fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, ActionError> {
	raw.trim()
		.parse()
		.map_err(|_| ActionError::NotFound(format!("{what} {raw}")))
}
