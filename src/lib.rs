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
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::adapters::database::DbPool;
use crate::adapters::database::message_repo::MessageRepository;
use crate::api::ServiceContainer;
use crate::config::Config;
use crate::domain::key::{KeyGenerator, OsKeyGenerator};
use crate::domain::message::TextLimits;
use crate::services::auth_service::AdminAuthenticator;
use crate::services::contact_service::ContactService;
use crate::services::health_service::HealthService;
use crate::services::rate_limit_service::RateLimitService;
use std::sync::Arc;
use tokio::sync::watch;

pub use crate::adapters::database::run_migrations;

/// Wired application components, ready to be mounted on routers.
#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    pool: Option<DbPool>,
    key_generator: Option<Arc<dyn KeyGenerator>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, pool: None, key_generator: None }
    }

    #[must_use]
    pub fn with_database(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_key_generator(mut self, key_generator: Arc<dyn KeyGenerator>) -> Self {
        self.key_generator = Some(key_generator);
        self
    }

    /// Wires services over the configured resources.
    ///
    /// # Errors
    /// Returns an error if no database pool was provided.
    pub fn build(self) -> anyhow::Result<App> {
        let pool = self.pool.ok_or_else(|| anyhow::anyhow!("Database pool is required"))?;
        let key_generator = self.key_generator.unwrap_or_else(|| Arc::new(OsKeyGenerator));

        let admin_auth = AdminAuthenticator::new(self.config.admin.password.as_ref());
        if admin_auth.is_enabled() {
            tracing::info!("Admin authentication enabled");
        } else {
            tracing::warn!("Admin password not set, admin endpoints are disabled");
        }

        let contact_service = ContactService::new(
            pool.clone(),
            MessageRepository::new(),
            key_generator,
            TextLimits::from(&self.config.messaging),
            self.config.messaging.max_page_size,
        );
        let health_service = HealthService::new(pool, self.config.health.clone());
        let rate_limit_service = RateLimitService::new(self.config.server.trusted_proxies.clone());

        Ok(App { services: ServiceContainer { contact_service, admin_auth, rate_limit_service }, health_service })
    }
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
            () = terminate => tracing::info!("Received SIGTERM, shutting down"),
        }

        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach structured logs.
pub fn setup_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        tracing::error!(panic = %info, location = %location, "Process panicked");
        default_hook(info);
    }));
}
