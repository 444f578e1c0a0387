// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::search::{SearchQuery, Searchable};
use crate::types::BookId;
use crate::validation::{Field, ValidationErrors};

/// A catalog title. One unit of inventory per title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
	pub id: BookId,
	pub title: String,
	pub author: String,
	pub publication_year: Option<i32>,
	pub genre: String,
	pub available: bool,
	pub registered_at: DateTime<Utc>,
}

impl Book {
	/// New titles enter the catalog available.
	pub fn from_draft(draft: BookDraft) -> Self {
		Self {
			id: BookId::generate(),
			title: draft.title,
			author: draft.author,
			publication_year: draft.publication_year,
			genre: draft.genre,
			available: true,
			registered_at: Utc::now(),
		}
	}

	/// Overwrite the descriptive fields. Availability is left alone.
	pub fn apply_draft(&mut self, draft: BookDraft) {
		self.title = draft.title;
		self.author = draft.author;
		self.publication_year = draft.publication_year;
		self.genre = draft.genre;
	}
}

impl Searchable for Book {
	fn matches(&self, query: &SearchQuery) -> bool {
		query.matches_any([Some(self.title.as_str()), Some(self.author.as_str())])
	}
}

/// Raw book form input, as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookForm {
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub author: String,
	#[serde(default)]
	pub publication_year: String,
	#[serde(default)]
	pub genre: String,
	/// Only honoured on edit.
	#[serde(default)]
	pub available: Option<bool>,
}

impl From<&Book> for BookForm {
	fn from(book: &Book) -> Self {
		Self {
			title: book.title.clone(),
			author: book.author.clone(),
			publication_year: book.publication_year.map(|y| y.to_string()).unwrap_or_default(),
			genre: book.genre.clone(),
			available: Some(book.available),
		}
	}
}

/// Validated descriptive fields of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
	pub title: String,
	pub author: String,
	pub publication_year: Option<i32>,
	pub genre: String,
}

impl BookForm {
	/// Title and author are required; the year, if given, must be an integer.
	pub fn validate(&self) -> Result<BookDraft, ValidationErrors> {
		let mut errors = ValidationErrors::new();

		let title = self.title.trim();
		let author = self.author.trim();
		if title.is_empty() {
			errors.add(Field::Title, "validation.required");
		}
		if author.is_empty() {
			errors.add(Field::Author, "validation.required");
		}

		let year = self.publication_year.trim();
		let publication_year = if year.is_empty() {
			None
		} else {
			match year.parse::<i32>() {
				Ok(y) => Some(y),
				Err(_) => {
					errors.add(Field::PublicationYear, "validation.year.invalid");
					None
				}
			}
		};

		errors.into_result(BookDraft {
			title: title.to_string(),
			author: author.to_string(),
			publication_year,
			genre: self.genre.trim().to_string(),
		})
	}
}
