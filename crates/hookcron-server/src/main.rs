// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! hookcron server binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hookcron_server::{create_app_state, create_router, version};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// hookcron server - schedules HTTP calls from cron expressions.
#[derive(Parser, Debug)]
#[command(
	name = "hookcron-server",
	about = "Cron-scheduled HTTP job server",
	version
)]
struct Args {
	/// Configuration file, replacing /etc/hookcron/server.toml.
	#[arg(long, env = "HOOKCRON_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print version information and exit
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match args.config {
		Some(path) => hookcron_server_config::load_config_with_file(path)?,
		None => hookcron_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting hookcron-server"
	);

	let pool = hookcron_server_db::create_pool(&config.database.url).await?;
	hookcron_server_db::run_migrations(&pool).await?;

	let state = create_app_state(pool, &config.scheduler)?;
	let scheduler = state.scheduler.clone();

	if config.scheduler.enabled {
		scheduler.start().await;
	} else {
		tracing::warn!("scheduler disabled; serving the API only");
	}

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Stopping scheduler; in-flight dispatches are left to finish");
	scheduler.stop().await;

	tracing::info!("Server shutdown complete");
	Ok(())
}
