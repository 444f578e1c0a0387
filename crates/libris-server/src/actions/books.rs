// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Catalog handlers.

use libris_auth::{authorize, Action, Principal};
use libris_core::{Book, BookForm, BookId, SearchQuery, ValidationErrors};
use libris_db::DbError;
use serde_json::{json, Value};

use super::{gate, gate_authenticated, handle, localized_errors, parse_id, routes, storage_failure, views, Halt};
use super::{ActionContext, ActionError, ActionOutcome, ActionResult};

/// The catalog, filtered by title or author. Public.
#[tracing::instrument(skip(ctx, principal), fields(actor = ?principal.map(|p| p.user_id)))]
pub async fn list_books(ctx: &ActionContext, principal: Option<&Principal>, query: Option<&str>) -> ActionResult {
	handle(async {
		let principal = gate(ctx, principal, Action::ListBooks)?;
		let context = catalog_context(ctx, principal, query, None, None)
			.await
			.map_err(|e| storage_failure(ctx, &e, routes::HOME, "error.storage"))?;
		Ok(ActionOutcome::render(views::BOOKS, context))
	})
	.await
}

#[tracing::instrument(skip(ctx, principal, form), fields(title = %form.title))]
pub async fn create_book(ctx: &ActionContext, principal: Option<&Principal>, form: &BookForm) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::CreateBook)?;

		let draft = match form.validate() {
			Ok(draft) => draft,
			Err(errors) => {
				let context = catalog_context(ctx, Some(principal), None, Some(form), Some(&errors))
					.await
					.map_err(|e| storage_failure(ctx, &e, routes::BOOKS, "error.storage"))?;
				return Ok(ActionOutcome::render(views::BOOKS, context).error(ctx.t("validation.form_invalid")));
			}
		};

		let book = Book::from_draft(draft);
		ctx.books
			.create_book(&book)
			.await
			.map_err(|e| storage_failure(ctx, &e, routes::BOOKS, "book.save_failed"))?;

		tracing::info!(actor = %principal.user_id, book_id = %book.id, "book created");
		Ok(ActionOutcome::redirect(routes::BOOKS).success(ctx.t_fmt("book.created", &[("title", &book.title)])))
	})
	.await
}

#[tracing::instrument(skip(ctx, principal))]
pub async fn edit_book_page(ctx: &ActionContext, principal: Option<&Principal>, book_id: &str) -> ActionResult {
	handle(async {
		gate_authenticated(ctx, principal, Action::EditBook)?;
		let book = find_book(ctx, book_id).await?;
		Ok(ActionOutcome::render(
			views::BOOK_EDIT,
			json!({ "book": book, "form": BookForm::from(&book), "errors": {} }),
		))
	})
	.await
}

/// Overwrite a book's fields. Availability is taken from the form when
/// present, even if the book is still on loan.
#[tracing::instrument(skip(ctx, principal, form))]
pub async fn edit_book(
	ctx: &ActionContext,
	principal: Option<&Principal>,
	book_id: &str,
	form: &BookForm,
) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::EditBook)?;
		let mut book = find_book(ctx, book_id).await?;

		let draft = match form.validate() {
			Ok(draft) => draft,
			Err(errors) => {
				return Ok(ActionOutcome::render(
					views::BOOK_EDIT,
					json!({ "book": book, "form": form, "errors": localized_errors(ctx, &errors) }),
				)
				.error(ctx.t("validation.form_invalid")));
			}
		};

		if form.available == Some(true) {
			let active = ctx
				.books
				.count_active_loans(&book.id)
				.await
				.map_err(|e| storage_failure(ctx, &e, routes::BOOKS, "error.storage"))?;
			if active > 0 {
				tracing::warn!(
					actor = %principal.user_id,
					book_id = %book.id,
					active_loans = active,
					"book marked available while still on loan"
				);
			}
		}

		book.apply_draft(draft);
		if let Some(available) = form.available {
			book.available = available;
		}

		ctx.books
			.update_book(&book)
			.await
			.map_err(|e| storage_failure(ctx, &e, routes::BOOKS, "book.save_failed"))?;

		tracing::info!(actor = %principal.user_id, book_id = %book.id, available = book.available, "book updated");
		Ok(ActionOutcome::redirect(routes::BOOKS).success(ctx.t_fmt("book.updated", &[("title", &book.title)])))
	})
	.await
}

/// Delete a book and its loans. Admin only.
#[tracing::instrument(skip(ctx, principal))]
pub async fn delete_book(ctx: &ActionContext, principal: Option<&Principal>, book_id: &str) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::DeleteBook)?;
		let book = find_book(ctx, book_id).await?;

		let deleted = ctx
			.books
			.delete_book(&book.id)
			.await
			.map_err(|e| storage_failure(ctx, &e, routes::BOOKS, "book.delete_failed"))?;
		if !deleted {
			return Err(ActionError::NotFound(format!("book {}", book.id)).into());
		}

		tracing::info!(actor = %principal.user_id, book_id = %book.id, "book deleted");
		Ok(ActionOutcome::redirect(routes::BOOKS).success(ctx.t_fmt("book.deleted", &[("title", &book.title)])))
	})
	.await
}

async fn find_book(ctx: &ActionContext, raw_id: &str) -> Result<Book, Halt> {
	let id: BookId = parse_id(raw_id, "book")?;
	ctx.books
		.get_book_by_id(&id)
		.await
		.map_err(|e| storage_failure(ctx, &e, routes::BOOKS, "error.storage"))?
		.ok_or_else(|| ActionError::NotFound(format!("book {id}")).into())
}

async fn catalog_context(
	ctx: &ActionContext,
	principal: Option<&Principal>,
	query: Option<&str>,
	form: Option<&BookForm>,
	errors: Option<&ValidationErrors>,
) -> Result<Value, DbError> {
	let books = SearchQuery::from_param(query).filter(ctx.books.list_books().await?);

	Ok(json!({
		"books": books,
		"query": query.unwrap_or_default(),
		"can_manage": authorize(principal, Action::CreateBook).is_allowed(),
		"can_delete": authorize(principal, Action::DeleteBook).is_allowed(),
		"form": form.cloned().unwrap_or_default(),
		"errors": errors.map(|e| localized_errors(ctx, e)).unwrap_or_else(|| json!({})),
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::actions::test_support::{admin, context, member, staff};
	use crate::actions::{Response, Severity};

	fn form(title: &str, author: &str, year: &str) -> BookForm {
		BookForm {
			title: title.into(),
			author: author.into(),
			publication_year: year.into(),
			..Default::default()
		}
	}

	#[tokio::test]
	async fn staff_can_add_a_book() {
		let ctx = context().await;
		let staff = staff(&ctx).await;

		let outcome = create_book(&ctx, Some(&staff), &form("Dune", "Herbert", "1965")).await.unwrap();
		assert_eq!(outcome.redirect_target(), Some(routes::BOOKS));
		assert!(outcome.has_notification(Severity::Success));

		let books = ctx.books.list_books().await.unwrap();
		assert_eq!(books.len(), 1);
		assert_eq!(books[0].publication_year, Some(1965));
		assert!(books[0].available);
	}

	#[tokio::test]
	async fn invalid_book_rerenders_with_errors() {
		let ctx = context().await;
		let staff = staff(&ctx).await;

		let outcome = create_book(&ctx, Some(&staff), &form("", "Herbert", "nineteen")).await.unwrap();
		assert_eq!(outcome.view(), Some(views::BOOKS));
		let context = outcome.context().unwrap();
		assert!(context["errors"]["title"].is_array());
		assert!(context["errors"]["publication_year"].is_array());
		assert_eq!(context["form"]["author"], "Herbert");
		assert!(ctx.books.list_books().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn members_and_anonymous_cannot_add_books() {
		let ctx = context().await;
		let member = member(&ctx, "rui").await;

		let outcome = create_book(&ctx, Some(&member), &form("Dune", "Herbert", "")).await.unwrap();
		assert_eq!(outcome.redirect_target(), Some(routes::HOME));
		assert!(outcome.has_notification(Severity::Error));

		let outcome = create_book(&ctx, None, &form("Dune", "Herbert", "")).await.unwrap();
		assert_eq!(outcome.redirect_target(), Some(routes::LOGIN));
		assert!(ctx.books.list_books().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn catalog_is_public_and_searchable() {
		let ctx = context().await;
		let staff = staff(&ctx).await;
		create_book(&ctx, Some(&staff), &form("Dune", "Herbert", "1965")).await.unwrap();
		create_book(&ctx, Some(&staff), &form("Emma", "Austen", "")).await.unwrap();

		let outcome = list_books(&ctx, None, Some("dun")).await.unwrap();
		let Response::Render { context, .. } = &outcome.response else {
			panic!("expected render");
		};
		assert_eq!(context["books"].as_array().unwrap().len(), 1);
		assert_eq!(context["books"][0]["title"], "Dune");
		assert_eq!(context["can_manage"], false);

		let outcome = list_books(&ctx, Some(&staff), Some("")).await.unwrap();
		let context = outcome.context().unwrap();
		assert_eq!(context["books"].as_array().unwrap().len(), 2);
		assert_eq!(context["can_manage"], true);
		assert_eq!(context["can_delete"], false);
	}

	#[tokio::test]
	async fn edit_can_set_availability() {
		let ctx = context().await;
		let staff = staff(&ctx).await;
		create_book(&ctx, Some(&staff), &form("Dune", "Herbert", "")).await.unwrap();
		let book = ctx.books.list_books().await.unwrap().remove(0);

		let mut edit = form("Dune Messiah", "Frank Herbert", "1969");
		edit.available = Some(false);
		let outcome = edit_book(&ctx, Some(&staff), &book.id.to_string(), &edit).await.unwrap();
		assert!(outcome.has_notification(Severity::Success));

		let stored = ctx.books.get_book_by_id(&book.id).await.unwrap().unwrap();
		assert_eq!(stored.title, "Dune Messiah");
		assert!(!stored.available);
	}

	#[tokio::test]
	async fn edit_marks_a_lent_book_available_without_touching_the_loan() {
		let ctx = context().await;
		let staff = staff(&ctx).await;
		let ana = member(&ctx, "ana").await;
		create_book(&ctx, Some(&staff), &form("Dune", "Herbert", "")).await.unwrap();
		let book = ctx.books.list_books().await.unwrap().remove(0);
		ctx.lending.checkout(&staff, &book.id, &ana.user_id).await.unwrap();

		let mut edit = form("Dune", "Herbert", "");
		edit.available = Some(true);
		let outcome = edit_book(&ctx, Some(&staff), &book.id.to_string(), &edit).await.unwrap();
		assert!(outcome.has_notification(Severity::Success));

		assert!(ctx.books.get_book_by_id(&book.id).await.unwrap().unwrap().available);
		assert_eq!(ctx.books.count_active_loans(&book.id).await.unwrap(), 1);
	}

	#[tokio::test]
	async fn only_admin_deletes_books() {
		let ctx = context().await;
		let staff = staff(&ctx).await;
		let admin = admin(&ctx).await;
		create_book(&ctx, Some(&staff), &form("Dune", "Herbert", "")).await.unwrap();
		let id = ctx.books.list_books().await.unwrap()[0].id.to_string();

		let outcome = delete_book(&ctx, Some(&staff), &id).await.unwrap();
		assert!(outcome.has_notification(Severity::Error));
		assert_eq!(ctx.books.list_books().await.unwrap().len(), 1);

		let outcome = delete_book(&ctx, Some(&admin), &id).await.unwrap();
		assert!(outcome.has_notification(Severity::Success));
		assert!(ctx.books.list_books().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn unknown_book_is_not_found() {
		let ctx = context().await;
		let admin = admin(&ctx).await;
		let result = edit_book_page(&ctx, Some(&admin), &BookId::generate().to_string()).await;
		assert!(matches!(result, Err(ActionError::NotFound(_))));
		let result = delete_book(&ctx, Some(&admin), "not-a-uuid").await;
		assert!(matches!(result, Err(ActionError::NotFound(_))));
	}
}
