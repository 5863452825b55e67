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

use contact_server::api::MgmtState;
use contact_server::config::{AdminArgs, Cli, Command, Config};
use contact_server::services::auth_service::AdminAuthenticator;
use contact_server::{AppBuilder, adapters, cli, telemetry};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { config, command } = Cli::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    contact_server::setup_panic_hook();

    let result = match command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Admin(admin) => run_admin(config, admin).await,
    };

    telemetry_guard.shutdown();
    result
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let boot_span = tracing::info_span!("boot_server");
    let (api_listener, mgmt_listener, app_router, mgmt_app, shutdown_tx, shutdown_rx) = async {
        // Phase 1: Infrastructure Setup (Resources)
        let pool = adapters::database::init_pool(&config.database).await?;
        contact_server::run_migrations(&pool).await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        contact_server::spawn_signal_handler(shutdown_tx.clone());

        // Phase 2: Component Wiring
        let app = AppBuilder::new(config.clone()).with_database(pool).build()?;

        // Phase 3: Runtime Setup (Listeners and Routers)
        let app_router = contact_server::api::app_router(&config, app.services);
        let mgmt_app = contact_server::api::mgmt_router(MgmtState { health_service: app.health_service });

        let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let mgmt_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.mgmt_port).parse()?;

        let api_listener = tokio::net::TcpListener::bind(api_addr).await?;
        let mgmt_listener = tokio::net::TcpListener::bind(mgmt_addr).await?;

        tracing::info!(address = %api_addr, "listening");
        tracing::info!(address = %mgmt_addr, "management server listening");

        Ok::<_, anyhow::Error>((api_listener, mgmt_listener, app_router, mgmt_app, shutdown_tx, shutdown_rx))
    }
    .instrument(boot_span)
    .await?;

    // Phase 4: Start Runtime
    let mut api_rx = shutdown_rx.clone();
    let api_server = axum::serve(api_listener, app_router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = api_rx.wait_for(|&s| s).await;
        });

    let mut mgmt_rx = shutdown_rx.clone();
    let mgmt_server = axum::serve(mgmt_listener, mgmt_app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = mgmt_rx.wait_for(|&s| s).await;
        });

    // Phase 5: Graceful Shutdown Orchestration
    let servers = async { tokio::try_join!(api_server, mgmt_server) };
    let mut drain_rx = shutdown_rx;
    tokio::select! {
        result = servers => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Server error");
            }
        }
        () = async {
            let _ = drain_rx.wait_for(|&s| s).await;
            tokio::time::sleep(Duration::from_secs(config.server.shutdown_timeout_secs)).await;
        } => {
            tracing::warn!("Timeout waiting for in-flight requests to finish.");
        }
    }

    let _ = shutdown_tx.send(true);
    Ok(())
}

async fn run_admin(config: Config, args: AdminArgs) -> anyhow::Result<()> {
    let auth = AdminAuthenticator::new(config.admin.password.as_ref());
    cli::authorize(&auth, args.password.as_ref(), &mut std::io::stdin().lock(), &mut std::io::stderr())?;

    let pool = adapters::database::init_pool(&config.database).await?;
    contact_server::run_migrations(&pool).await?;

    let app = AppBuilder::new(config).with_database(pool).build()?;
    let mut stdout = std::io::stdout().lock();
    cli::run_admin(&app.services.contact_service, args.command, &mut stdout).await
}
