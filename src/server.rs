//! Server runtime.
//!
//! [`ServerHandle`] owns the full lifecycle: metrics recorder, database
//! and migrations, dispenser service, REST API, graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::DispenserService;
use crate::config::AppConfig;
use crate::domain::{BillingCalculator, DispenserRepository};
use crate::infrastructure::{
    init_database, run_migrations, InMemoryDispenserRepository, SeaOrmDispenserRepository,
};
use crate::interfaces::http::modules::metrics::install_recorder;
use crate::interfaces::http::{create_api_router, RouterDeps};
use crate::shared::errors::InfraError;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::shared::types::SystemClock;

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Keep dispensers in process memory instead of the database.
    pub in_memory: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            in_memory: false,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running dispenser service.
pub struct ServerHandle {
    pub service: Arc<DispenserService>,
    pub config: AppConfig,
    /// Address the REST API is bound to.
    pub local_addr: SocketAddr,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

/// The global recorder can only be installed once per process.
fn prometheus_handle() -> Result<PrometheusHandle, InfraError> {
    static PROM_HANDLE: OnceLock<Result<PrometheusHandle, String>> = OnceLock::new();
    PROM_HANDLE
        .get_or_init(|| {
            let installed = install_recorder().map_err(|e| e.to_string());
            if installed.is_ok() {
                info!("Prometheus metrics recorder installed");
            }
            installed
        })
        .clone()
        .map_err(InfraError::Metrics)
}

impl ServerHandle {
    /// Start the service: storage, router, listener.
    pub async fn start(opts: ServerOptions) -> Result<Self, InfraError> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting beer tap dispenser service...");
        let prometheus = prometheus_handle()?;

        // ── Storage ────────────────────────────────────────────
        let (repo, db): (Arc<dyn DispenserRepository>, Option<DatabaseConnection>) =
            if opts.in_memory {
                warn!("Using in-memory dispenser registry; nothing survives a restart");
                (Arc::new(InMemoryDispenserRepository::new()), None)
            } else {
                let db = init_database(&app_cfg.database).await?;
                if opts.auto_migrate {
                    run_migrations(&db).await?;
                }
                (Arc::new(SeaOrmDispenserRepository::new(db.clone())), Some(db))
            };

        // ── Services ───────────────────────────────────────────
        let billing = BillingCalculator::new(app_cfg.billing.price_per_liter, Arc::new(SystemClock));
        info!("Billing at {} per liter", billing.price_per_liter());
        let service = Arc::new(DispenserService::new(repo, billing));

        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(RouterDeps {
            service: service.clone(),
            db: db.clone(),
            prometheus: Some(prometheus),
        });

        let api_addr = app_cfg.server.address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_server = axum::serve(
            listener,
            api_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_signal.wait().await;
            info!("REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            service,
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }

    /// Wait for shutdown to be signalled, drain in-flight requests within
    /// the configured timeout, then close the database.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            ..
        } = self;

        let drained = shutdown
            .shutdown_with_cleanup(|| async move {
                if let Err(e) = api_task.await {
                    error!("REST API server task panicked: {}", e);
                }
            })
            .await;
        if !drained {
            warn!("Abandoning in-flight requests");
        }

        if let Some(db) = db {
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("Database connection closed");
            }
        }

        info!("Beer tap dispenser service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down...");
        self.trigger_shutdown();
        self.wait().await;
    }
}

/// Initialize tracing (logging) from the application config.
///
/// `RUST_LOG` takes precedence over `logging.level`. Call once at startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
