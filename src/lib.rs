// hostel management backend

pub mod accounts;
pub mod allocation;
pub mod complaints;
pub mod config;
pub mod directory;
pub mod error;
pub mod fees;
pub mod inventory;
pub mod leave;
pub mod notices;
pub mod reply;
pub mod routes;
pub mod sql;
pub mod types;

use anyhow::Context;
use tokio::{net::TcpListener, signal::ctrl_c};
use tracing::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

pub use config::Config;
pub use error::{HostelError, Result};
pub use sql::Store;

/// Installs the fmt subscriber filtered by `RUST_LOG`. Safe to call twice.
pub fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.try_init()
		.ok();
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
	let store = Store::connect(&config).await.context("opening store")?;
	store.apply_schema().await.context("applying schema")?;

	let app = routes::router(store.clone());
	let listener = TcpListener::bind(&config.addr)
		.await
		.with_context(|| format!("binding {}", config.addr))?;
	info!("Listening on {}", config.addr);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.context("serving")?;

	store.close().await;
	info!("Server shut down");
	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		match ctrl_c().await {
			Ok(()) => info!("Received Ctrl+C, shutting down"),
			Err(e) => {
				warn!("Failed to install Ctrl+C handler: {e}");
				std::future::pending::<()>().await
			}
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal(SignalKind::terminate()) {
			Ok(mut term) => {
				term.recv().await;
				info!("Received terminate signal, shutting down");
			}
			Err(e) => {
				warn!("Failed to install signal handler: {e}");
				std::future::pending::<()>().await
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn init_tracing_twice_is_harmless() {
		init_tracing();
		init_tracing();
		assert!(tracing::dispatcher::has_been_set());
	}
}
