// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `[database]` section: location of the SQLite store.

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./libris.db";

const SQLITE_SCHEME: &str = "sqlite:";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	/// Always a `sqlite:` URL naming a file or `:memory:`.
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_DATABASE_URL.to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if let Some(url) = other.url {
			self.url = Some(url);
		}
	}

	pub fn finalize(self) -> Result<DatabaseConfig, ConfigError> {
		let url = match self.url {
			Some(url) => check_sqlite_url(url.trim())?.to_string(),
			None => DEFAULT_DATABASE_URL.to_string(),
		};
		Ok(DatabaseConfig { url })
	}
}

/// The store is SQLite only; reject other schemes and URLs with no location.
fn check_sqlite_url(url: &str) -> Result<&str, ConfigError> {
	let invalid = |message: String| ConfigError::InvalidValue {
		key: "database.url".to_string(),
		message,
	};

	let location = url
		.strip_prefix(SQLITE_SCHEME)
		.ok_or_else(|| invalid(format!("expected a sqlite: URL, got '{url}'")))?;
	if location.trim_start_matches('/').is_empty() {
		return Err(invalid(format!("'{url}' does not name a database file")));
	}
	Ok(url)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn layer(url: &str) -> DatabaseConfigLayer {
		DatabaseConfigLayer {
			url: Some(url.to_string()),
		}
	}

	#[test]
	fn test_default_url() {
		let config = DatabaseConfigLayer::default().finalize().unwrap();
		assert_eq!(config.url, "sqlite:./libris.db");
	}

	#[test]
	fn test_file_and_memory_urls_accepted() {
		assert_eq!(
			layer(" sqlite:/var/lib/libris/data.db ").finalize().unwrap().url,
			"sqlite:/var/lib/libris/data.db"
		);
		assert_eq!(layer("sqlite::memory:").finalize().unwrap().url, "sqlite::memory:");
	}

	#[test]
	fn test_other_schemes_rejected() {
		for url in ["postgres://localhost/libris", "mysql://db/libris", "./libris.db", ""] {
			let err = layer(url).finalize().unwrap_err();
			assert!(
				matches!(&err, ConfigError::InvalidValue { key, .. } if key == "database.url"),
				"{url}: {err}"
			);
		}
	}

	#[test]
	fn test_sqlite_url_without_location_rejected() {
		assert!(layer("sqlite:").finalize().is_err());
		assert!(layer("sqlite://").finalize().is_err());
	}

	#[test]
	fn test_later_layer_replaces_url() {
		let mut base = layer("sqlite:base.db");
		base.merge(DatabaseConfigLayer::default());
		assert_eq!(base.url.as_deref(), Some("sqlite:base.db"));
		base.merge(layer("sqlite:override.db"));
		assert_eq!(base.url.as_deref(), Some("sqlite:override.db"));
	}
}
