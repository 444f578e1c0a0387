// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use libris_auth::{hash_password, Principal};
use libris_common_secret::SecretString;
use libris_config::LibrisConfig;
use libris_core::{Role, User};
use libris_db::{create_pool, run_migrations};

use super::ActionContext;

pub const PASSWORD: &str = "correct horse";

pub async fn context() -> ActionContext {
	context_with(LibrisConfig::default()).await
}

pub async fn context_with(config: LibrisConfig) -> ActionContext {
	let pool = create_pool("sqlite::memory:").await.unwrap();
	run_migrations(&pool).await.unwrap();
	ActionContext::new(pool, &config)
}

pub async fn add_user(ctx: &ActionContext, name: &str, login: &str, role: Role) -> User {
	let hash = hash_password(&SecretString::from(PASSWORD)).unwrap();
	let user = User::new(name, login, hash, role);
	ctx.users.create_user(&user).await.unwrap();
	user
}

pub async fn admin(ctx: &ActionContext) -> Principal {
	Principal::from(&add_user(ctx, "Alice Admin", "alice", Role::Admin).await)
}

pub async fn staff(ctx: &ActionContext) -> Principal {
	Principal::from(&add_user(ctx, "Sam Staff", "sam", Role::Staff).await)
}

pub async fn member(ctx: &ActionContext, login: &str) -> Principal {
	Principal::from(&add_user(ctx, &format!("Member {login}"), login, Role::Member).await)
}
