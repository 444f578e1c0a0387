// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wrapper for credentials that must never reach logs.
//!
//! Passwords typed into registration and edit forms, and the shared
//! registration secret from configuration, travel as [`SecretString`]:
//!
//! - `Debug` and `Display` print [`REDACTED`]
//! - memory is zeroized on drop
//! - the value is only reachable through [`Secret::expose`]
//!
//! ```
//! use libris_common_secret::SecretString;
//!
//! let password = SecretString::from("hunter2");
//! assert_eq!(format!("{password}"), "[REDACTED]");
//! assert_eq!(password.expose(), "hunter2");
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Placeholder printed instead of secret values.
pub const REDACTED: &str = "[REDACTED]";

/// A sensitive value with redacted formatting.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T: Zeroize> {
	inner: T,
}

/// Secret text such as a password or a shared key.
pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Access the wrapped value. Call sites opt in explicitly.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl Secret<String> {
	/// True when the value is empty or whitespace only.
	///
	/// Form fields left blank arrive as blank secrets.
	pub fn is_blank(&self) -> bool {
		self.inner.trim().is_empty()
	}

	/// Compare against a candidate in constant time.
	pub fn matches(&self, candidate: &str) -> bool {
		let expected = self.inner.as_bytes();
		let given = candidate.as_bytes();
		if expected.len() != given.len() {
			return false;
		}
		expected.ct_eq(given).into()
	}
}

impl From<&str> for Secret<String> {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

impl From<String> for Secret<String> {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl Default for Secret<String> {
	fn default() -> Self {
		Self::new(String::new())
	}
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
	fn clone(&self) -> Self {
		Self::new(self.inner.clone())
	}
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T: Zeroize> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<'de, T> Deserialize<'de> for Secret<T>
where
	T: Deserialize<'de> + Zeroize,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		T::deserialize(deserializer).map(Secret::new)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_and_display_are_redacted() {
		let secret = SecretString::from("s3cret");
		assert_eq!(format!("{secret:?}"), "Secret(\"[REDACTED]\")");
		assert_eq!(format!("{secret}"), REDACTED);
	}

	#[test]
	fn blank_detection() {
		assert!(SecretString::default().is_blank());
		assert!(SecretString::from("   ").is_blank());
		assert!(!SecretString::from("x").is_blank());
	}

	#[test]
	fn matches_exact_value_only() {
		let secret = SecretString::from("library-key");
		assert!(secret.matches("library-key"));
		assert!(!secret.matches("library-kez"));
		assert!(!secret.matches("library"));
		assert!(!secret.matches(""));
	}

	#[test]
	fn deserializes_from_plain_string() {
		let secret: SecretString = serde_json::from_str("\"abc\"").unwrap();
		assert_eq!(secret.expose(), "abc");
	}

	proptest! {
		#[test]
		fn never_leaks_through_formatting(value in "[0-9]{6,32}") {
			let secret = SecretString::from(value.as_str());
			let debug_output = format!("{:?}", secret);
			let display_output = format!("{}", secret);
			prop_assert!(!debug_output.contains(&value));
			prop_assert!(!display_output.contains(&value));
			prop_assert!(secret.matches(&value));
		}
	}
}
