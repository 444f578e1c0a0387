// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Supported locales.

/// Metadata about a supported locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleInfo {
	/// Language code (e.g., "pt", "en")
	pub code: &'static str,
	/// English name of the language
	pub name: &'static str,
	/// Native name of the language
	pub native_name: &'static str,
}

/// Fallback locale. The catalog in this locale is complete.
pub const DEFAULT_LOCALE: &str = "pt";

pub const LOCALES: &[LocaleInfo] = &[
	LocaleInfo {
		code: "pt",
		name: "Portuguese",
		native_name: "Português",
	},
	LocaleInfo {
		code: "en",
		name: "English",
		native_name: "English",
	},
];

pub fn is_supported(code: &str) -> bool {
	LOCALES.iter().any(|l| l.code == code)
}

pub fn locale_info(code: &str) -> Option<&'static LocaleInfo> {
	LOCALES.iter().find(|l| l.code == code)
}

pub fn available_locales() -> &'static [LocaleInfo] {
	LOCALES
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_locale_is_supported() {
		assert!(is_supported(DEFAULT_LOCALE));
	}

	#[test]
	fn test_locale_info_lookup() {
		let info = locale_info("pt").unwrap();
		assert_eq!(info.native_name, "Português");
		assert!(locale_info("xx").is_none());
	}

	#[test]
	fn test_available_locales_unique() {
		let codes: std::collections::HashSet<_> = available_locales().iter().map(|l| l.code).collect();
		assert_eq!(codes.len(), LOCALES.len());
	}
}
