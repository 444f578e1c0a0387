// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Libris operator binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use libris_config::{load_secret_env, LibrisConfig, LogFormat};
use libris_db::{create_pool, run_migrations, UserRepository};
use libris_server::{create_admin, version, ActionContext, AdminRequest};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the password for `create-admin`.
const ADMIN_PASSWORD_ENV: &str = "LIBRIS_ADMIN_PASSWORD";

/// Libris - library loan record keeper.
#[derive(Parser, Debug)]
#[command(name = "libris-server", about = "Library loan record keeper", version)]
struct Args {
	/// Extra TOML config file, applied over the system config.
	#[arg(long, env = "LIBRIS_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Apply database migrations and exit
	Migrate,
	/// Create an administrator account. The password is read from
	/// LIBRIS_ADMIN_PASSWORD (or LIBRIS_ADMIN_PASSWORD_FILE).
	CreateAdmin {
		#[arg(long)]
		login: String,
		#[arg(long)]
		name: String,
		#[arg(long)]
		email: Option<String>,
	},
	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let command = match args.command {
		Some(Command::Version) => {
			println!("{}", version::format_version_info());
			return Ok(());
		}
		other => other,
	};

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => libris_config::load_config_with_file(path.clone()),
		None => libris_config::load_config(),
	}
	.context("loading configuration")?;

	init_tracing(&config);

	tracing::info!(
		database = %config.database.url,
		locale = config.logging.locale,
		"starting libris-server"
	);

	let pool = create_pool(&config.database.url)
		.await
		.context("opening database")?;
	run_migrations(&pool).await.context("running migrations")?;

	match command {
		Some(Command::Migrate) => {
			tracing::info!("migrations applied");
		}
		Some(Command::CreateAdmin { login, name, email }) => {
			let password = load_secret_env(ADMIN_PASSWORD_ENV)?
				.with_context(|| format!("{ADMIN_PASSWORD_ENV} must be set"))?;
			let users = UserRepository::new(pool);
			let user = create_admin(
				&users,
				AdminRequest {
					login,
					name,
					email,
					password,
				},
			)
			.await?;
			println!("created administrator '{}' ({})", user.login, user.id);
		}
		Some(Command::Version) | None => {
			let context = ActionContext::new(pool, &config);
			tracing::info!(
				self_registration = context.allow_self_registration,
				"database ready; actions available to the presentation layer"
			);
		}
	}

	Ok(())
}

fn init_tracing(config: &LibrisConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match config.logging.format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}
