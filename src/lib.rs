#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::adapters::database::{self, MessageRepository, MessageStore, schema};
use crate::api::AppState;
use crate::config::DatabaseConfig;
use crate::services::message_service::MessageService;
use std::sync::Arc;
use tokio::sync::watch;

/// Connects to the cluster, provisions or selects the keyspace and prepares the message statements.
///
/// Any failure here must stop the process before it serves traffic.
///
/// # Errors
/// Returns an error if the session cannot be created, schema bootstrap fails, the keyspace
/// does not exist, or the statements cannot be prepared.
pub async fn init_message_store(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn MessageStore>> {
    let session = database::connect(config).await?;

    if config.init {
        schema::bootstrap(&session, &config.keyspace).await?;
    } else {
        schema::use_keyspace(&session, &config.keyspace).await?;
    }

    let repo = MessageRepository::new(Arc::new(session)).await?;
    Ok(Arc::new(repo))
}

/// Wires the services on top of a store and returns the router state.
#[must_use]
pub fn build_state(store: Arc<dyn MessageStore>) -> AppState {
    AppState { message_service: MessageService::new(store) }
}

/// Routes panics through tracing so they end up in structured logs.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();

        tracing::error!(panic.location = %location, panic.payload = %payload, "Panic occurred");
    }));
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
