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

use ism_server::config::Config;
use ism_server::telemetry;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    ism_server::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server", env = %config.server.env_mode);
    let (listener, app_router) = async {
        tracing::info!(
            host = %config.server.host,
            port = config.server.port,
            db_contact_point = %config.database.contact_point(),
            db_keyspace = %config.database.keyspace,
            db_init = config.database.init,
            "Loaded configuration"
        );

        // Schema bootstrap completes before the listener is bound.
        let store = ism_server::init_message_store(&config.database).await?;
        let app_router = ism_server::api::app_router(ism_server::build_state(store));

        let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!(address = %addr, "listening");

        Ok::<(TcpListener, axum::Router), anyhow::Error>((listener, app_router))
    }
    .instrument(boot_span)
    .await?;

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    ism_server::spawn_signal_handler(shutdown_tx);

    let server = axum::serve(listener, app_router).with_graceful_shutdown(async move {
        let _ = shutdown_rx.wait_for(|&s| s).await;
    });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "Server error");
    }

    let timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    if tokio::time::timeout(timeout, tokio::task::spawn_blocking(move || telemetry_guard.shutdown())).await.is_err() {
        tracing::warn!("Timeout waiting for telemetry to flush.");
    }

    Ok(())
}
