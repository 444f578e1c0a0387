// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Logging and locale configuration.

use std::fmt;
use std::str::FromStr;

use libris_common_i18n::{resolve_locale, DEFAULT_LOCALE};
use serde::Deserialize;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"pretty" | "text" => Ok(LogFormat::Pretty),
			"json" => Ok(LogFormat::Json),
			other => Err(format!("unknown log format '{other}', expected 'pretty' or 'json'")),
		}
	}
}

impl fmt::Display for LogFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LogFormat::Pretty => write!(f, "pretty"),
			LogFormat::Json => write!(f, "json"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
	/// `EnvFilter` directive used when `RUST_LOG` is unset.
	pub level: String,
	/// Locale for user-facing messages; always a supported code.
	pub locale: &'static str,
	pub format: LogFormat,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			locale: DEFAULT_LOCALE,
			format: LogFormat::Pretty,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfigLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub locale: Option<String>,
	#[serde(default)]
	pub format: Option<LogFormat>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: LoggingConfigLayer) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if other.locale.is_some() {
			self.locale = other.locale;
		}
		if other.format.is_some() {
			self.format = other.format;
		}
	}

	/// Unsupported locales fall back to the default rather than failing.
	pub fn finalize(self) -> LoggingConfig {
		let locale = match self.locale.as_deref() {
			Some(requested) => {
				let resolved = resolve_locale(Some(requested), DEFAULT_LOCALE);
				if !requested.to_ascii_lowercase().starts_with(resolved) {
					tracing::warn!(requested, resolved, "unsupported locale, using default");
				}
				resolved
			}
			None => DEFAULT_LOCALE,
		};

		LoggingConfig {
			level: self.level.unwrap_or_else(|| "info".to_string()),
			locale,
			format: self.format.unwrap_or_default(),
		}
	}
}
