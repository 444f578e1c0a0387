// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file and the environment.

use std::path::{Path, PathBuf};

use libris_common_secret::SecretString;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::LibrisConfigLayer;
use crate::sections::{AuthConfigLayer, DatabaseConfigLayer, LogFormat, LoggingConfigLayer};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/libris/libris.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<LibrisConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<LibrisConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(LibrisConfigLayer::default())
	}
}

/// TOML file source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<LibrisConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(LibrisConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: LibrisConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// | Variable | Setting |
/// |---|---|
/// | `LIBRIS_DATABASE_URL` | `database.url` |
/// | `LIBRIS_LOG_LEVEL` | `logging.level` |
/// | `LIBRIS_LOCALE` | `logging.locale` |
/// | `LIBRIS_LOG_FORMAT` | `logging.format` |
/// | `LIBRIS_REGISTRATION_SECRET` or `LIBRIS_REGISTRATION_SECRET_FILE` | `auth.registration_secret` |
/// | `LIBRIS_ALLOW_SELF_REGISTRATION` | `auth.allow_self_registration` |
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<LibrisConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(LibrisConfigLayer {
			database: Some(load_database_from_env()),
			logging: Some(load_logging_from_env()?),
			auth: Some(load_auth_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Result<Option<bool>, ConfigError> {
	match env_var(name) {
		Some(v) => parse_bool(&v).map(Some).ok_or_else(|| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid boolean value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn parse_bool(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

/// Read a secret from `NAME`, or from the file named by `NAME_FILE`.
///
/// Setting both is an error. Trailing newlines in the file are dropped.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, ConfigError> {
	let file_var = format!("{name}_FILE");
	match (env_var(name), env_var(&file_var)) {
		(Some(_), Some(_)) => Err(ConfigError::Secret(format!(
			"both {name} and {file_var} are set"
		))),
		(Some(value), None) => Ok(Some(SecretString::new(value))),
		(None, Some(path)) => read_secret_file(Path::new(&path)).map(Some),
		(None, None) => Ok(None),
	}
}

fn read_secret_file(path: &Path) -> Result<SecretString, ConfigError> {
	let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
		path: path.to_path_buf(),
		source: e,
	})?;
	Ok(SecretString::new(content.trim_end_matches(['\r', '\n']).to_string()))
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("LIBRIS_DATABASE_URL"),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("LIBRIS_LOG_FORMAT") {
		Some(v) => Some(v.parse::<LogFormat>().map_err(|message| ConfigError::InvalidValue {
			key: "LIBRIS_LOG_FORMAT".to_string(),
			message,
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("LIBRIS_LOG_LEVEL"),
		locale: env_var("LIBRIS_LOCALE"),
		format,
	})
}

fn load_auth_from_env() -> Result<AuthConfigLayer, ConfigError> {
	Ok(AuthConfigLayer {
		registration_secret: load_secret_env("LIBRIS_REGISTRATION_SECRET")?,
		allow_self_registration: env_bool("LIBRIS_ALLOW_SELF_REGISTRATION")?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.database.is_none());
		assert!(layer.auth.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let layer = TomlSource::new("/nonexistent/libris.toml").load().unwrap();
		assert!(layer.database.is_none());
	}

	#[test]
	fn test_toml_source_parses_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[database]
url = "sqlite:/srv/libris.db"

[logging]
level = "debug"
format = "json"

[auth]
registration_secret = "s3cret"
allow_self_registration = false
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.database.unwrap().url.as_deref(), Some("sqlite:/srv/libris.db"));
		let logging = layer.logging.unwrap();
		assert_eq!(logging.format, Some(LogFormat::Json));
		let auth = layer.auth.unwrap();
		assert!(auth.registration_secret.unwrap().matches("s3cret"));
		assert_eq!(auth.allow_self_registration, Some(false));
	}

	#[test]
	fn test_toml_source_reports_parse_errors() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[database\nurl = 1").unwrap();
		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_secret_file_strips_trailing_newline() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "from-file").unwrap();
		let secret = read_secret_file(file.path()).unwrap();
		assert!(secret.matches("from-file"));
	}

	#[test]
	fn test_parse_bool() {
		assert_eq!(parse_bool("TRUE"), Some(true));
		assert_eq!(parse_bool("off"), Some(false));
		assert_eq!(parse_bool("maybe"), None);
	}
}
