// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Home, registration and session handlers.

use libris_auth::{authenticate, authorize, validate_registration, Action, AuthError, Principal, RegistrationForm, Session};
use libris_common_secret::SecretString;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{gate, handle, localized_errors, routes, storage_failure, views};
use super::{ActionContext, ActionOutcome, ActionResult, SessionChange};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
	pub login: String,
	pub password: SecretString,
}

/// Landing page. Shows which sections the caller may open.
#[tracing::instrument(skip(ctx, principal))]
pub async fn home(ctx: &ActionContext, principal: Option<&Principal>) -> ActionResult {
	handle(async {
		let principal = gate(ctx, principal, Action::ViewHome)?;
		Ok(ActionOutcome::render(
			views::HOME,
			json!({
				"principal": principal,
				"can_lend": authorize(principal, Action::Checkout).is_allowed(),
				"can_manage_users": authorize(principal, Action::ListUsers).is_allowed(),
				"can_delete": authorize(principal, Action::DeleteUser).is_allowed(),
			}),
		))
	})
	.await
}

pub async fn register_page(ctx: &ActionContext, principal: Option<&Principal>) -> ActionResult {
	handle(async {
		gate(ctx, principal, Action::Register)?;
		if !ctx.allow_self_registration {
			return Ok(registration_closed(ctx));
		}
		Ok(ActionOutcome::render(views::REGISTER, registration_context(None, json!({}))))
	})
	.await
}

/// Self-service sign-up. Elevated roles go through the configured
/// [`RoleElevation`](libris_auth::RoleElevation) check.
#[tracing::instrument(skip(ctx, principal, form), fields(login = %form.login, role = %form.role))]
pub async fn register(ctx: &ActionContext, principal: Option<&Principal>, form: &RegistrationForm) -> ActionResult {
	handle(async {
		gate(ctx, principal, Action::Register)?;
		if !ctx.allow_self_registration {
			return Ok(registration_closed(ctx));
		}

		let user = match validate_registration(form, ctx.directory.as_ref(), ctx.elevation.as_ref()).await {
			Ok(user) => user,
			Err(AuthError::Validation(errors)) => {
				let context = registration_context(Some(form), localized_errors(ctx, &errors));
				return Ok(ActionOutcome::render(views::REGISTER, context).error(ctx.t("validation.form_invalid")));
			}
			Err(e) => return Err(storage_failure(ctx, &e, routes::HOME, "user.save_failed")),
		};

		ctx.users
			.create_user(&user)
			.await
			.map_err(|e| storage_failure(ctx, &e, routes::HOME, "user.save_failed"))?;

		tracing::info!(user_id = %user.id, role = %user.role, "user registered");
		Ok(ActionOutcome::redirect(routes::LOGIN).success(ctx.t("auth.registered")))
	})
	.await
}

pub async fn login_page(ctx: &ActionContext, principal: Option<&Principal>) -> ActionResult {
	handle(async {
		gate(ctx, principal, Action::Login)?;
		Ok(ActionOutcome::render(views::LOGIN, json!({ "login": "", "errors": {} })))
	})
	.await
}

/// Check credentials and open a session. Unknown logins and wrong passwords
/// get the same message.
#[tracing::instrument(skip(ctx, form), fields(login = %form.login))]
pub async fn login(ctx: &ActionContext, form: &LoginForm) -> ActionResult {
	handle(async {
		gate(ctx, None, Action::Login)?;

		let login = form.login.trim();
		if login.is_empty() || form.password.is_blank() {
			let mut errors = serde_json::Map::new();
			if login.is_empty() {
				errors.insert("login".into(), json!([ctx.t("validation.required")]));
			}
			if form.password.is_blank() {
				errors.insert("password".into(), json!([ctx.t("validation.password.missing")]));
			}
			return Ok(ActionOutcome::render(views::LOGIN, json!({ "login": login, "errors": errors }))
				.error(ctx.t("validation.form_invalid")));
		}

		let user = ctx
			.users
			.get_user_by_login(login)
			.await
			.map_err(|e| storage_failure(ctx, &e, routes::LOGIN, "error.storage"))?;

		match authenticate(user.as_ref(), form.password.expose()) {
			Ok(principal) => {
				tracing::info!(user_id = %principal.user_id, role = %principal.role, "login succeeded");
				let greeting = ctx.t_fmt("auth.logged_in", &[("name", &principal.name)]);
				Ok(ActionOutcome::redirect(routes::HOME)
					.success(greeting)
					.with_session(SessionChange::Establish(Session::establish(principal))))
			}
			Err(e) => {
				tracing::warn!(error = %e, "login failed");
				Ok(ActionOutcome::render(views::LOGIN, json!({ "login": login, "errors": {} }))
					.error(ctx.t("auth.login_failed")))
			}
		}
	})
	.await
}

pub async fn logout(ctx: &ActionContext, principal: Option<&Principal>) -> ActionResult {
	if let Some(p) = principal {
		tracing::info!(user_id = %p.user_id, "logged out");
	}
	Ok(ActionOutcome::redirect(routes::LOGIN)
		.info(ctx.t("auth.logged_out"))
		.with_session(SessionChange::Clear))
}

fn registration_closed(ctx: &ActionContext) -> ActionOutcome {
	ActionOutcome::redirect(routes::HOME).error(ctx.t("auth.registration_closed"))
}

/// Echo everything but the password fields and the secret key.
fn registration_context(form: Option<&RegistrationForm>, errors: Value) -> Value {
	let form = form.map_or_else(
		|| json!({}),
		|f| {
			json!({
				"name": f.name,
				"email": f.email,
				"login": f.login,
				"contact": f.contact,
				"address": f.address,
				"role": f.role,
			})
		},
	);
	json!({ "form": form, "errors": errors })
}
