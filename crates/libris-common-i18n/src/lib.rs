// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Localized messages for libris.
//!
//! Every notification and validation message is addressed by a dot-notation
//! key and resolved against an in-process catalog.
//!
//! - `policy.` access denials
//! - `validation.` form field errors
//! - `book.`, `user.`, `loan.`, `auth.` action results
//!
//! # Example
//!
//! ```
//! use libris_common_i18n::{resolve_locale, t, t_fmt};
//!
//! let locale = resolve_locale(Some("en"), "pt");
//! assert_eq!(t(locale, "loan.already_returned"), "This book has already been returned.");
//!
//! let msg = t_fmt("pt", "book.created", &[("title", "Dune")]);
//! assert_eq!(msg, "Livro 'Dune' adicionado com sucesso!");
//! ```

mod catalog;
mod locale;
mod resolve;

pub use catalog::{t, t_fmt};
pub use locale::{available_locales, is_supported, locale_info, LocaleInfo};
pub use locale::{DEFAULT_LOCALE, LOCALES};
pub use resolve::resolve_locale;
