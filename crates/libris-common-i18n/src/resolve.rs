// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Locale resolution logic.

use crate::locale::{LOCALES, DEFAULT_LOCALE};

/// Resolve the effective locale from a request preference and the configured default.
///
/// Resolution order:
/// 1. Requested locale (if supported)
/// 2. Configured default (if supported)
/// 3. [`DEFAULT_LOCALE`]
///
/// Regional variants such as `pt-BR` resolve to their base language.
///
/// ```
/// use libris_common_i18n::resolve_locale;
///
/// assert_eq!(resolve_locale(Some("en"), "pt"), "en");
/// assert_eq!(resolve_locale(Some("pt-BR"), "en"), "pt");
/// assert_eq!(resolve_locale(Some("fr"), "de"), "pt");
/// ```
pub fn resolve_locale(requested: Option<&str>, configured: &str) -> &'static str {
	if let Some(locale) = requested.and_then(to_static) {
		return locale;
	}

	to_static(configured).unwrap_or(DEFAULT_LOCALE)
}

fn to_static(code: &str) -> Option<&'static str> {
	let base = code.split(['-', '_']).next().unwrap_or(code);
	LOCALES
		.iter()
		.find(|l| l.code.eq_ignore_ascii_case(base))
		.map(|l| l.code)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_requested_takes_priority() {
		assert_eq!(resolve_locale(Some("en"), "pt"), "en");
		assert_eq!(resolve_locale(Some("pt"), "en"), "pt");
	}

	#[test]
	fn test_configured_when_nothing_requested() {
		assert_eq!(resolve_locale(None, "en"), "en");
	}

	#[test]
	fn test_regional_variants() {
		assert_eq!(resolve_locale(Some("en_US"), "pt"), "en");
		assert_eq!(resolve_locale(Some("PT-br"), "en"), "pt");
	}

	#[test]
	fn test_fallback() {
		assert_eq!(resolve_locale(Some("xx"), "yy"), DEFAULT_LOCALE);
		assert_eq!(resolve_locale(None, ""), DEFAULT_LOCALE);
	}

	proptest! {
		#[test]
		fn always_returns_supported(requested in proptest::option::of("[a-zA-Z_-]{0,8}"), configured in "[a-zA-Z_-]{0,8}") {
			let locale = resolve_locale(requested.as_deref(), &configured);
			prop_assert!(crate::is_supported(locale));
		}
	}
}
