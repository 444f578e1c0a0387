// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use libris_auth::{Principal, Session};
use serde::Serialize;
use serde_json::Value;

/// Redirect targets, by route name.
pub mod routes {
	pub const HOME: &str = "home";
	pub const LOGIN: &str = "login";
	pub const BOOKS: &str = "books";
	pub const USERS: &str = "users";
	pub const CHECKOUT: &str = "checkout";
	pub const RETURNS: &str = "returns";
}

/// Template names handed to the renderer.
pub mod views {
	pub const HOME: &str = "home";
	pub const LOGIN: &str = "login";
	pub const REGISTER: &str = "register";
	pub const BOOKS: &str = "books";
	pub const BOOK_EDIT: &str = "book_edit";
	pub const USERS: &str = "users";
	pub const USER_EDIT: &str = "user_edit";
	pub const PROFILE: &str = "profile";
	pub const CHECKOUT: &str = "checkout";
	pub const RETURNS: &str = "returns";
	pub const LOAN_EDIT: &str = "loan_edit";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Success,
	Error,
	Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
	pub severity: Severity,
	pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
	Render { view: &'static str, context: Value },
	Redirect { target: &'static str },
}

/// What the transport should do with the caller's session.
#[derive(Debug, Clone)]
pub enum SessionChange {
	Establish(Session),
	/// Same session, refreshed principal (e.g. after a profile edit).
	Refresh(Principal),
	Clear,
}

#[derive(Debug, Clone)]
pub struct ActionOutcome {
	pub response: Response,
	pub notifications: Vec<Notification>,
	pub session: Option<SessionChange>,
}

impl ActionOutcome {
	pub fn render(view: &'static str, context: Value) -> Self {
		Self {
			response: Response::Render { view, context },
			notifications: Vec::new(),
			session: None,
		}
	}

	pub fn redirect(target: &'static str) -> Self {
		Self {
			response: Response::Redirect { target },
			notifications: Vec::new(),
			session: None,
		}
	}

	pub fn notify(mut self, severity: Severity, message: impl Into<String>) -> Self {
		self.notifications.push(Notification {
			severity,
			message: message.into(),
		});
		self
	}

	pub fn success(self, message: impl Into<String>) -> Self {
		self.notify(Severity::Success, message)
	}

	pub fn error(self, message: impl Into<String>) -> Self {
		self.notify(Severity::Error, message)
	}

	pub fn info(self, message: impl Into<String>) -> Self {
		self.notify(Severity::Info, message)
	}

	pub fn with_session(mut self, change: SessionChange) -> Self {
		self.session = Some(change);
		self
	}

	pub fn view(&self) -> Option<&'static str> {
		match self.response {
			Response::Render { view, .. } => Some(view),
			Response::Redirect { .. } => None,
		}
	}

	pub fn redirect_target(&self) -> Option<&'static str> {
		match self.response {
			Response::Redirect { target } => Some(target),
			Response::Render { .. } => None,
		}
	}

	pub fn context(&self) -> Option<&Value> {
		match &self.response {
			Response::Render { context, .. } => Some(context),
			Response::Redirect { .. } => None,
		}
	}

	pub fn has_notification(&self, severity: Severity) -> bool {
		self.notifications.iter().any(|n| n.severity == severity)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
	#[error("Not found: {0}")]
	NotFound(String),
}

pub type ActionResult = Result<ActionOutcome, ActionError>;
