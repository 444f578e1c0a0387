// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, TimeZone, Utc};
use libris_core::{Book, BookDraft, Role, User};
use sqlx::sqlite::SqlitePool;

use crate::{create_pool, run_migrations};

pub async fn create_test_pool() -> SqlitePool {
	let pool = create_pool("sqlite::memory:").await.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
	Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn member(name: &str, login: &str) -> User {
	let mut user = User::new(name, login, "$argon2id$test".to_string(), Role::Member);
	user.joined_at = at(2024, 1, 1, 9, 0);
	user
}

pub fn book(title: &str, author: &str) -> Book {
	let mut book = Book::from_draft(BookDraft {
		title: title.to_string(),
		author: author.to_string(),
		publication_year: None,
		genre: String::new(),
	});
	book.registered_at = at(2024, 1, 1, 9, 0);
	book
}
