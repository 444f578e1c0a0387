// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Case-insensitive substring search.
//!
//! An empty query matches everything, so listing pages can share one code
//! path for "show all" and "filter".

/// A normalized search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
	needle: String,
}

impl SearchQuery {
	pub fn new(raw: &str) -> Self {
		Self {
			needle: raw.to_lowercase(),
		}
	}

	/// Build from an optional request parameter.
	pub fn from_param(raw: Option<&str>) -> Self {
		raw.map(Self::new).unwrap_or_default()
	}

	pub fn is_empty(&self) -> bool {
		self.needle.is_empty()
	}

	/// The term as typed, lowercased. Echoed back to the search box.
	pub fn as_str(&self) -> &str {
		&self.needle
	}

	pub fn matches(&self, haystack: &str) -> bool {
		self.is_empty() || haystack.to_lowercase().contains(&self.needle)
	}

	/// True when any present field contains the term.
	pub fn matches_any<'a>(&self, fields: impl IntoIterator<Item = Option<&'a str>>) -> bool {
		if self.is_empty() {
			return true;
		}
		fields.into_iter().flatten().any(|f| self.matches(f))
	}

	/// Keep the items that match, preserving order.
	pub fn filter<T: Searchable>(&self, items: Vec<T>) -> Vec<T> {
		if self.is_empty() {
			return items;
		}
		items.into_iter().filter(|item| item.matches(self)).collect()
	}
}

/// Entities that can be filtered by a [`SearchQuery`].
pub trait Searchable {
	fn matches(&self, query: &SearchQuery) -> bool;
}
