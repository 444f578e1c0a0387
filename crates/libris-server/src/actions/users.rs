// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User administration and profile handlers.
//!
//! The staff row restriction is applied at two independent points: the
//! target check in [`authorize_user_target`] before an edit is accepted, and
//! the role coercion inside the validators when the record is saved.

use libris_auth::{
	allowed_user_fields, authorize_user_target, can_view_user, validate_user_create, validate_user_edit, Action,
	AuthError, Principal, UserFieldSet, UserForm, UserTarget,
};
use libris_core::{SearchQuery, User, UserId};
use serde_json::{json, Value};

use super::{denied, gate_authenticated, handle, localized_errors, parse_id, routes, storage_failure, views, Halt};
use super::{ActionContext, ActionError, ActionOutcome, ActionResult, SessionChange};

/// Users within the principal's reach, filtered by name, contact, login or
/// email. Staff only see members.
#[tracing::instrument(skip(ctx, principal), fields(actor = ?principal.map(|p| p.user_id)))]
pub async fn list_users(ctx: &ActionContext, principal: Option<&Principal>, query: Option<&str>) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::ListUsers)?;
		let context = directory_context(ctx, principal, query, None, None).await?;
		Ok(ActionOutcome::render(views::USERS, context))
	})
	.await
}

#[tracing::instrument(skip(ctx, principal, form), fields(login = %form.login))]
pub async fn create_user(ctx: &ActionContext, principal: Option<&Principal>, form: &UserForm) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::CreateUser)?;

		let user = match validate_user_create(form, principal, ctx.directory.as_ref()).await {
			Ok(user) => user,
			Err(AuthError::Validation(errors)) => {
				let context = directory_context(ctx, principal, None, Some(form), Some(localized_errors(ctx, &errors)))
					.await?;
				return Ok(ActionOutcome::render(views::USERS, context).error(ctx.t("validation.form_invalid")));
			}
			Err(e) => return Err(storage_failure(ctx, &e, routes::USERS, "user.save_failed")),
		};

		ctx.users
			.create_user(&user)
			.await
			.map_err(|e| storage_failure(ctx, &e, routes::USERS, "user.save_failed"))?;

		tracing::info!(actor = %principal.user_id, user_id = %user.id, role = %user.role, "user created");
		Ok(ActionOutcome::redirect(routes::USERS).success(ctx.t_fmt("user.created", &[("name", &user.name)])))
	})
	.await
}

#[tracing::instrument(skip(ctx, principal))]
pub async fn edit_user_page(ctx: &ActionContext, principal: Option<&Principal>, user_id: &str) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::EditUser)?;
		let user = find_user(ctx, user_id).await?;
		check_target(ctx, principal, Action::EditUser, &user)?;

		Ok(ActionOutcome::render(
			views::USER_EDIT,
			edit_context(&user, user_form_fields(&UserForm::from(&user)), json!({}), principal),
		))
	})
	.await
}

/// Save an administrative edit. Plain staff are turned away from anyone who
/// is not a member before the form is even read.
#[tracing::instrument(skip(ctx, principal, form))]
pub async fn edit_user(
	ctx: &ActionContext,
	principal: Option<&Principal>,
	user_id: &str,
	form: &UserForm,
) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::EditUser)?;
		let existing = find_user(ctx, user_id).await?;
		check_target(ctx, principal, Action::EditUser, &existing)?;

		let updated = match validate_user_edit(&existing, form, principal, ctx.directory.as_ref()).await {
			Ok(user) => user,
			Err(AuthError::Validation(errors)) => {
				let context = edit_context(&existing, user_form_fields(form), localized_errors(ctx, &errors), principal);
				return Ok(ActionOutcome::render(views::USER_EDIT, context).error(ctx.t("validation.form_invalid")));
			}
			Err(e) => return Err(storage_failure(ctx, &e, routes::USERS, "user.save_failed")),
		};

		ctx.users
			.update_user(&updated)
			.await
			.map_err(|e| storage_failure(ctx, &e, routes::USERS, "user.save_failed"))?;

		tracing::info!(
			actor = %principal.user_id,
			user_id = %updated.id,
			role = %updated.role,
			"user updated"
		);
		Ok(ActionOutcome::redirect(routes::USERS).success(ctx.t_fmt("user.updated", &[("name", &updated.name)])))
	})
	.await
}

/// Delete a user and their loans. Admin only, never oneself.
#[tracing::instrument(skip(ctx, principal))]
pub async fn delete_user(ctx: &ActionContext, principal: Option<&Principal>, user_id: &str) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::DeleteUser)?;
		let user = find_user(ctx, user_id).await?;
		check_target(ctx, principal, Action::DeleteUser, &user)?;

		let deleted = ctx
			.users
			.delete_user(&user.id)
			.await
			.map_err(|e| storage_failure(ctx, &e, routes::USERS, "user.delete_failed"))?;
		if !deleted {
			return Err(ActionError::NotFound(format!("user {}", user.id)).into());
		}

		tracing::info!(actor = %principal.user_id, user_id = %user.id, "user deleted");
		Ok(ActionOutcome::redirect(routes::USERS).success(ctx.t_fmt("user.deleted", &[("name", &user.name)])))
	})
	.await
}

#[tracing::instrument(skip(ctx, principal))]
pub async fn edit_own_profile_page(ctx: &ActionContext, principal: Option<&Principal>) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::EditOwnProfile)?;
		let user = own_record(ctx, principal).await?;
		Ok(ActionOutcome::render(
			views::PROFILE,
			edit_context(&user, user_form_fields(&UserForm::from(&user)), json!({}), principal),
		))
	})
	.await
}

/// Self-service edit. The role field is never offered, so the stored role
/// is kept whatever the form carries.
#[tracing::instrument(skip(ctx, principal, form))]
pub async fn edit_own_profile(ctx: &ActionContext, principal: Option<&Principal>, form: &UserForm) -> ActionResult {
	handle(async {
		let principal = gate_authenticated(ctx, principal, Action::EditOwnProfile)?;
		let existing = own_record(ctx, principal).await?;
		check_target(ctx, principal, Action::EditOwnProfile, &existing)?;

		let updated = match validate_user_edit(&existing, form, principal, ctx.directory.as_ref()).await {
			Ok(user) => user,
			Err(AuthError::Validation(errors)) => {
				let context = edit_context(&existing, user_form_fields(form), localized_errors(ctx, &errors), principal);
				return Ok(ActionOutcome::render(views::PROFILE, context).error(ctx.t("validation.form_invalid")));
			}
			Err(e) => return Err(storage_failure(ctx, &e, routes::HOME, "user.save_failed")),
		};

		ctx.users
			.update_user(&updated)
			.await
			.map_err(|e| storage_failure(ctx, &e, routes::HOME, "user.save_failed"))?;

		tracing::info!(user_id = %updated.id, "profile updated");
		Ok(ActionOutcome::redirect(routes::HOME)
			.success(ctx.t_fmt("user.updated", &[("name", &updated.name)]))
			.with_session(SessionChange::Refresh(Principal::from(&updated))))
	})
	.await
}

fn check_target(ctx: &ActionContext, principal: &Principal, action: Action, user: &User) -> Result<(), Halt> {
	authorize_user_target(principal, action, &UserTarget::from(user))
		.into_result()
		.map_err(|reason| Halt::Outcome(denied(ctx, Some(principal), action, reason)))
}

async fn find_user(ctx: &ActionContext, raw_id: &str) -> Result<User, Halt> {
	let id: UserId = parse_id(raw_id, "user")?;
	ctx.users
		.get_user_by_id(&id)
		.await
		.map_err(|e| storage_failure(ctx, &e, routes::USERS, "error.storage"))?
		.ok_or_else(|| ActionError::NotFound(format!("user {id}")).into())
}

/// The principal's own row. A session can outlive its account.
async fn own_record(ctx: &ActionContext, principal: &Principal) -> Result<User, Halt> {
	ctx.users
		.get_user_by_id(&principal.user_id)
		.await
		.map_err(|e| storage_failure(ctx, &e, routes::HOME, "error.storage"))?
		.ok_or_else(|| ActionError::NotFound(format!("user {}", principal.user_id)).into())
}

async fn directory_context(
	ctx: &ActionContext,
	principal: &Principal,
	query: Option<&str>,
	form: Option<&UserForm>,
	errors: Option<Value>,
) -> Result<Value, Halt> {
	let users = ctx
		.users
		.list_users()
		.await
		.map_err(|e| storage_failure(ctx, &e, routes::HOME, "error.storage"))?;
	let visible: Vec<User> = users
		.into_iter()
		.filter(|u| can_view_user(principal, u.role))
		.collect();
	let users = SearchQuery::from_param(query).filter(visible);

	Ok(json!({
		"users": users,
		"query": query.unwrap_or_default(),
		"fields": allowed_user_fields(principal, None),
		"can_delete": principal.is_admin(),
		"form": form.map(user_form_fields).unwrap_or_else(|| json!({})),
		"errors": errors.unwrap_or_else(|| json!({})),
	}))
}

fn edit_context(user: &User, form: Value, errors: Value, principal: &Principal) -> Value {
	let fields: UserFieldSet = allowed_user_fields(principal, Some(&UserTarget::from(user)));
	json!({
		"user": user,
		"form": form,
		"fields": fields,
		"errors": errors,
	})
}

/// Form values echoed back to the template. Passwords are never echoed.
fn user_form_fields(form: &UserForm) -> Value {
	json!({
		"reference_id": form.reference_id,
		"name": form.name,
		"contact": form.contact,
		"address": form.address,
		"email": form.email,
		"login": form.login,
		"role": form.role,
	})
}
