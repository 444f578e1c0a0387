// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for libris.
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults
//! 2. a TOML file (`/etc/libris/libris.toml`, or a path given explicitly)
//! 3. environment variables (`LIBRIS_*`)
//!
//! # Usage
//!
//! ```ignore
//! use libris_config::load_config;
//!
//! let config = load_config()?;
//! println!("database at {}", config.database.url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::LibrisConfigLayer;
pub use sections::*;
pub use sources::{
	load_secret_env, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct LibrisConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub auth: AuthConfig,
}

/// Load configuration from defaults, the system TOML file and the environment.
pub fn load_config() -> Result<LibrisConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<LibrisConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<LibrisConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = LibrisConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Resolve a merged layer into the runtime configuration.
pub fn finalize(layer: LibrisConfigLayer) -> Result<LibrisConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();
	let auth = layer.auth.unwrap_or_default().finalize();

	info!(
		database = %database.url,
		locale = logging.locale,
		log_format = %logging.format,
		registration_secret_configured = auth.registration_secret.is_some(),
		allow_self_registration = auth.allow_self_registration,
		"Configuration loaded"
	);

	Ok(LibrisConfig {
		database,
		logging,
		auth,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	struct FixedSource(Precedence, LibrisConfigLayer);

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<LibrisConfigLayer, ConfigError> {
			Ok(self.1.clone())
		}
	}

	fn db_layer(url: &str) -> LibrisConfigLayer {
		LibrisConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some(url.to_string()),
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_defaults() {
		let config = finalize(LibrisConfigLayer::default()).unwrap();
		assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
		assert_eq!(config.logging.locale, "pt");
		assert!(config.auth.allow_self_registration);
		assert!(config.auth.registration_secret.is_none());
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let config = load_from(vec![
			Box::new(FixedSource(Precedence::Environment, db_layer("sqlite:env.db"))),
			Box::new(FixedSource(Precedence::ConfigFile, db_layer("sqlite:file.db"))),
		])
		.unwrap();
		assert_eq!(config.database.url, "sqlite:env.db");
	}

	#[test]
	fn test_non_sqlite_url_rejected() {
		let err = finalize(db_layer("postgres://localhost/libris")).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}
}
