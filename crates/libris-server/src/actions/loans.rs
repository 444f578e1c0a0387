// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Circulation handlers: checkout, returns and loan corrections.

use libris_auth::{Action, Principal};
use libris_core::{BookId, LoanId, SearchQuery, UserId};
use libris_lending::{LendingError, LoanEdit};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{denied, gate_authenticated, handle, parse_id, routes, storage_failure, views, Halt};
use super::{ActionContext, ActionError, ActionOutcome, ActionResult};

const DUE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Checkout form: the selected book and borrower.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
	pub book_id: String,
	pub user_id: String,
}

/// Administrative loan correction form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoanForm {
	pub book_id: String,
	pub user_id: String,
	pub returned: bool,
}

/// The checkout screen: available books, borrowers and active loans, oldest
/// first.
#[tracing::instrument(skip(ctx, principal))]
pub async fn checkout_page(ctx: &ActionContext, principal: Option<&Principal>) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::Checkout)?;
		let context = checkout_context(ctx, principal, None).await?;
		Ok(ActionOutcome::render(views::CHECKOUT, context))
	})
	.await
}

/// Active loans matching `query`, newest first, on the checkout screen.
#[tracing::instrument(skip(ctx, principal))]
pub async fn search_active_loans(
	ctx: &ActionContext,
	principal: Option<&Principal>,
	query: Option<&str>,
) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::SearchActiveLoans)?;
		let context = checkout_context(ctx, principal, Some(query.unwrap_or_default())).await?;
		Ok(ActionOutcome::render(views::CHECKOUT, context))
	})
	.await
}

/// Lend the selected book to the selected user.
#[tracing::instrument(skip(ctx, principal, form), fields(book_id = %form.book_id, user_id = %form.user_id))]
pub async fn checkout(ctx: &ActionContext, principal: Option<&Principal>, form: &CheckoutForm) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::Checkout)?;

		if form.book_id.trim().is_empty() || form.user_id.trim().is_empty() {
			let context = checkout_context(ctx, principal, None).await?;
			return Ok(ActionOutcome::render(views::CHECKOUT, context).error(ctx.t("loan.missing_selection")));
		}

		let selection = parse_id::<BookId>(&form.book_id, "book")
			.and_then(|book_id| Ok((book_id, parse_id::<UserId>(&form.user_id, "user")?)));
		let result = match selection {
			Ok((book_id, user_id)) => ctx.lending.checkout(principal, &book_id, &user_id).await,
			Err(ActionError::NotFound(what)) => Err(LendingError::NotFound(what)),
		};

		let details = match result {
			Ok(details) => details,
			Err(LendingError::NotFound(what)) => {
				tracing::debug!(%what, "checkout selection does not exist");
				let context = checkout_context(ctx, principal, None).await?;
				return Ok(ActionOutcome::render(views::CHECKOUT, context).error(ctx.t("validation.not_found")));
			}
			Err(LendingError::Unavailable { title }) => {
				let context = checkout_context(ctx, principal, None).await?;
				return Ok(ActionOutcome::render(views::CHECKOUT, context)
					.error(ctx.t_fmt("loan.unavailable", &[("title", &title)])));
			}
			Err(e) => return Err(lending_failure(ctx, principal, Action::Checkout, e, "loan.save_failed")),
		};

		let due = details
			.loan
			.due_at
			.map(|due| due.format(DUE_FORMAT).to_string())
			.unwrap_or_default();
		tracing::info!(
			actor = %principal.user_id,
			loan_id = %details.loan.id,
			book_id = %details.loan.book_id,
			user_id = %details.loan.user_id,
			"book lent"
		);
		Ok(ActionOutcome::redirect(routes::CHECKOUT).success(ctx.t_fmt(
			"loan.created",
			&[("title", &details.book_title), ("name", &details.user_name), ("due", &due)],
		)))
	})
	.await
}

/// Close a loan. Returning it a second time is reported, not an error.
#[tracing::instrument(skip(ctx, principal))]
pub async fn return_loan(ctx: &ActionContext, principal: Option<&Principal>, loan_id: &str) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::ReturnLoan)?;
		let id: LoanId = parse_id(loan_id, "loan")?;

		let receipt = ctx
			.lending
			.return_loan(principal, &id)
			.await
			.map_err(|e| lending_failure(ctx, principal, Action::ReturnLoan, e, "loan.save_failed"))?;

		if receipt.already_returned() {
			return Ok(ActionOutcome::redirect(routes::RETURNS).info(ctx.t("loan.already_returned")));
		}

		tracing::info!(actor = %principal.user_id, loan_id = %id, "book returned");
		Ok(ActionOutcome::redirect(routes::RETURNS)
			.success(ctx.t_fmt("loan.returned", &[("title", &receipt.book_title)])))
	})
	.await
}

#[tracing::instrument(skip(ctx, principal))]
pub async fn list_returned_loans(
	ctx: &ActionContext,
	principal: Option<&Principal>,
	query: Option<&str>,
) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::ListReturnedLoans)?;
		let loans = ctx
			.lending
			.returned_loans(principal, &SearchQuery::from_param(query))
			.await
			.map_err(|e| lending_failure(ctx, principal, Action::ListReturnedLoans, e, "error.storage"))?;

		Ok(ActionOutcome::render(
			views::RETURNS,
			json!({ "loans": loans, "query": query.unwrap_or_default() }),
		))
	})
	.await
}

#[tracing::instrument(skip(ctx, principal))]
pub async fn edit_loan_page(ctx: &ActionContext, principal: Option<&Principal>, loan_id: &str) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::EditLoan)?;
		let id: LoanId = parse_id(loan_id, "loan")?;
		let page = ctx
			.lending
			.edit_loan_page(principal, &id)
			.await
			.map_err(|e| lending_failure(ctx, principal, Action::EditLoan, e, "error.storage"))?;

		Ok(ActionOutcome::render(
			views::LOAN_EDIT,
			json!({ "loan": page.loan, "books": page.books, "users": page.users }),
		))
	})
	.await
}

/// Overwrite a loan's book, borrower and returned state. Book availability
/// is left as it is.
#[tracing::instrument(skip(ctx, principal, form), fields(returned = form.returned))]
pub async fn edit_loan(
	ctx: &ActionContext,
	principal: Option<&Principal>,
	loan_id: &str,
	form: &LoanForm,
) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::EditLoan)?;
		let id: LoanId = parse_id(loan_id, "loan")?;
		let edit = LoanEdit {
			book_id: parse_id(&form.book_id, "book")?,
			user_id: parse_id(&form.user_id, "user")?,
			returned: form.returned,
		};

		ctx.lending
			.edit_loan(principal, &id, edit)
			.await
			.map_err(|e| lending_failure(ctx, principal, Action::EditLoan, e, "loan.save_failed"))?;

		tracing::info!(actor = %principal.user_id, loan_id = %id, "loan updated");
		Ok(ActionOutcome::redirect(routes::CHECKOUT).success(ctx.t("loan.updated")))
	})
	.await
}

/// Map a lending failure onto the action boundary.
fn lending_failure(
	ctx: &ActionContext,
	principal: &Principal,
	action: Action,
	error: LendingError,
	key: &str,
) -> Halt {
	match error {
		LendingError::Forbidden(reason) => Halt::Outcome(denied(ctx, Some(principal), action, reason)),
		LendingError::NotFound(what) => ActionError::NotFound(what).into(),
		LendingError::Unavailable { title } => Halt::Outcome(
			ActionOutcome::redirect(routes::CHECKOUT).error(ctx.t_fmt("loan.unavailable", &[("title", &title)])),
		),
		LendingError::Db(e) => storage_failure(ctx, &e, routes::CHECKOUT, key),
	}
}

/// `query` is `None` for the plain screen, which lists active loans oldest
/// first; a search lists matches newest first.
async fn checkout_context(ctx: &ActionContext, principal: &Principal, query: Option<&str>) -> Result<Value, Halt> {
	let mut page = ctx
		.lending
		.checkout_page(principal)
		.await
		.map_err(|e| lending_failure(ctx, principal, Action::Checkout, e, "error.storage"))?;

	if let Some(query) = query {
		page.active_loans = ctx
			.lending
			.active_loans(principal, &SearchQuery::new(query))
			.await
			.map_err(|e| lending_failure(ctx, principal, Action::SearchActiveLoans, e, "error.storage"))?;
	}

	Ok(json!({
		"books": page.books,
		"users": page.users,
		"active_loans": page.active_loans,
		"query": query.unwrap_or_default(),
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::actions::books::create_book;
	use crate::actions::test_support::{add_user, context, member, staff};
	use crate::actions::Severity;
	use libris_core::{Book, BookForm, Role, User};

	async fn add_book(ctx: &ActionContext, actor: &Principal, title: &str) -> Book {
		let form = BookForm {
			title: title.into(),
			author: "Frank Herbert".into(),
			..Default::default()
		};
		create_book(ctx, Some(actor), &form).await.unwrap();
		ctx.books
			.list_books()
			.await
			.unwrap()
			.into_iter()
			.find(|b| b.title == title)
			.unwrap()
	}

	fn lend(book: &Book, user: &User) -> CheckoutForm {
		CheckoutForm {
			book_id: book.id.to_string(),
			user_id: user.id.to_string(),
		}
	}

	#[tokio::test]
	async fn dune_is_lent_and_returned() {
		let ctx = context().await;
		let staff = staff(&ctx).await;
		let ana = add_user(&ctx, "Ana", "ana", Role::Member).await;
		let dune = add_book(&ctx, &staff, "Dune").await;

		let outcome = checkout(&ctx, Some(&staff), &lend(&dune, &ana)).await.unwrap();
		assert_eq!(outcome.redirect_target(), Some(routes::CHECKOUT));
		assert!(outcome.notifications[0].message.contains("Dune"));
		assert!(outcome.notifications[0].message.contains("Ana"));
		assert!(!ctx.books.get_book_by_id(&dune.id).await.unwrap().unwrap().available);

		let outcome = checkout(&ctx, Some(&staff), &lend(&dune, &ana)).await.unwrap();
		assert_eq!(outcome.view(), Some(views::CHECKOUT));
		assert!(outcome.has_notification(Severity::Error));

		let page = checkout_page(&ctx, Some(&staff)).await.unwrap();
		let active = page.context().unwrap()["active_loans"].as_array().unwrap().clone();
		assert_eq!(active.len(), 1);
		assert_eq!(active[0]["book_title"], "Dune");
		assert_eq!(active[0]["fine"], 0);
		let loan_id = active[0]["id"].as_str().unwrap().to_string();

		let outcome = return_loan(&ctx, Some(&staff), &loan_id).await.unwrap();
		assert_eq!(outcome.redirect_target(), Some(routes::RETURNS));
		assert!(outcome.has_notification(Severity::Success));
		assert!(ctx.books.get_book_by_id(&dune.id).await.unwrap().unwrap().available);

		let outcome = return_loan(&ctx, Some(&staff), &loan_id).await.unwrap();
		assert!(outcome.has_notification(Severity::Info));
		assert!(!outcome.has_notification(Severity::Success));

		let outcome = list_returned_loans(&ctx, Some(&staff), Some("dun")).await.unwrap();
		let returned = outcome.context().unwrap()["loans"].as_array().unwrap().clone();
		assert_eq!(returned.len(), 1);
		assert_eq!(returned[0]["returned"], true);
		assert_eq!(returned[0]["fine"], 0);
	}

	#[tokio::test]
	async fn blank_selection_rerenders_checkout() {
		let ctx = context().await;
		let staff = staff(&ctx).await;

		let outcome = checkout(&ctx, Some(&staff), &CheckoutForm::default()).await.unwrap();
		assert_eq!(outcome.view(), Some(views::CHECKOUT));
		assert_eq!(outcome.notifications[0].message, ctx.t("loan.missing_selection"));
	}

	#[tokio::test]
	async fn unknown_selection_is_a_form_error() {
		let ctx = context().await;
		let staff = staff(&ctx).await;
		let ana = add_user(&ctx, "Ana", "ana", Role::Member).await;

		let form = CheckoutForm {
			book_id: BookId::generate().to_string(),
			user_id: ana.id.to_string(),
		};
		let outcome = checkout(&ctx, Some(&staff), &form).await.unwrap();
		assert_eq!(outcome.view(), Some(views::CHECKOUT));
		assert_eq!(outcome.notifications[0].message, ctx.t("validation.not_found"));

		let form = CheckoutForm {
			book_id: "garbage".into(),
			user_id: ana.id.to_string(),
		};
		let outcome = checkout(&ctx, Some(&staff), &form).await.unwrap();
		assert_eq!(outcome.view(), Some(views::CHECKOUT));
	}

	#[tokio::test]
	async fn members_cannot_lend_or_list() {
		let ctx = context().await;
		let staff = staff(&ctx).await;
		let rui = member(&ctx, "rui").await;
		let dune = add_book(&ctx, &staff, "Dune").await;
		let rui_user = ctx.users.get_user_by_id(&rui.user_id).await.unwrap().unwrap();

		let outcome = checkout(&ctx, Some(&rui), &lend(&dune, &rui_user)).await.unwrap();
		assert_eq!(outcome.redirect_target(), Some(routes::HOME));
		assert!(ctx.books.get_book_by_id(&dune.id).await.unwrap().unwrap().available);

		let outcome = list_returned_loans(&ctx, None, None).await.unwrap();
		assert_eq!(outcome.redirect_target(), Some(routes::LOGIN));
	}

	#[tokio::test]
	async fn search_lists_matching_active_loans() {
		let ctx = context().await;
		let staff = staff(&ctx).await;
		let ana = add_user(&ctx, "Ana", "ana", Role::Member).await;
		let dune = add_book(&ctx, &staff, "Dune").await;
		let emma = add_book(&ctx, &staff, "Emma").await;
		checkout(&ctx, Some(&staff), &lend(&dune, &ana)).await.unwrap();
		checkout(&ctx, Some(&staff), &lend(&emma, &ana)).await.unwrap();

		let outcome = search_active_loans(&ctx, Some(&staff), Some("DUN")).await.unwrap();
		let context = outcome.context().unwrap();
		assert_eq!(context["active_loans"].as_array().unwrap().len(), 1);
		assert_eq!(context["query"], "DUN");

		let outcome = search_active_loans(&ctx, Some(&staff), Some("")).await.unwrap();
		assert_eq!(outcome.context().unwrap()["active_loans"].as_array().unwrap().len(), 2);
	}

	#[tokio::test]
	async fn edit_marks_returned_without_touching_availability() {
		let ctx = context().await;
		let staff = staff(&ctx).await;
		let ana = add_user(&ctx, "Ana", "ana", Role::Member).await;
		let dune = add_book(&ctx, &staff, "Dune").await;
		checkout(&ctx, Some(&staff), &lend(&dune, &ana)).await.unwrap();
		let page = checkout_page(&ctx, Some(&staff)).await.unwrap();
		let loan_id = page.context().unwrap()["active_loans"][0]["id"].as_str().unwrap().to_string();

		let edit_page = edit_loan_page(&ctx, Some(&staff), &loan_id).await.unwrap();
		let offered = edit_page.context().unwrap()["books"].as_array().unwrap().clone();
		assert!(offered.iter().any(|b| b["title"] == "Dune"));

		let form = LoanForm {
			book_id: dune.id.to_string(),
			user_id: ana.id.to_string(),
			returned: true,
		};
		let outcome = edit_loan(&ctx, Some(&staff), &loan_id, &form).await.unwrap();
		assert!(outcome.has_notification(Severity::Success));

		let id: LoanId = loan_id.parse().unwrap();
		let loan = ctx.lending.edit_loan_page(&staff, &id).await.unwrap().loan.loan;
		assert!(loan.returned);
		assert!(loan.returned_at.is_some());
		assert!(!ctx.books.get_book_by_id(&dune.id).await.unwrap().unwrap().available);
	}

	#[tokio::test]
	async fn unknown_loan_is_not_found() {
		let ctx = context().await;
		let staff = staff(&ctx).await;
		let result = return_loan(&ctx, Some(&staff), &LoanId::generate().to_string()).await;
		assert!(matches!(result, Err(ActionError::NotFound(_))));
		let result = edit_loan_page(&ctx, Some(&staff), "nope").await;
		assert!(matches!(result, Err(ActionError::NotFound(_))));
	}
}
