use crate::api::{self, AppState};
use crate::config::{SmartParkConfig, StorageBackend};
use crate::domain::ParkingLedger;
use crate::storage::{InMemoryParkingStore, ParkingStore, PgParkingStore};

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// HTTP server hosting a single lot's ledger
pub struct ParkingServer {
    config: SmartParkConfig,
    ledger: Arc<ParkingLedger>,
    pg_store: Option<Arc<PgParkingStore>>,
}

impl ParkingServer {
    pub async fn new_with_config(config: SmartParkConfig) -> anyhow::Result<Self> {
        let (store, pg_store): (Arc<dyn ParkingStore>, Option<Arc<PgParkingStore>>) =
            match config.storage.backend {
                StorageBackend::Memory => {
                    info!("Using in-memory parking store; state is lost on restart");
                    (Arc::new(InMemoryParkingStore::new()), None)
                }
                StorageBackend::Postgres => {
                    let pg = Arc::new(
                        PgParkingStore::connect(&config.storage.database)
                            .await
                            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?,
                    );
                    (pg.clone(), Some(pg))
                }
            };

        let ledger = ParkingLedger::new(&config.lot, store)
            .with_operation_timeout(config.storage.operation_timeout());

        Ok(Self {
            config,
            ledger: Arc::new(ledger),
            pg_store,
        })
    }

    pub fn ledger(&self) -> Arc<ParkingLedger> {
        self.ledger.clone()
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        let Some(pg) = &self.pg_store else {
            return Ok(());
        };
        if !self.config.storage.database.run_migrations {
            info!("Skipping database migrations (disabled in configuration)");
            return Ok(());
        }

        match pg.run_migrations().await {
            Ok(()) => {
                info!("Database migrations completed successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to run database migrations: {}", e);
                Err(anyhow::anyhow!("Migration failed: {}", e))
            }
        }
    }

    pub async fn run_with_listener(
        self,
        listener: tokio::net::TcpListener,
        shutdown_signal: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        info!(
            "Starting parking HTTP server on {} ({} slots)",
            addr,
            self.ledger.capacity()
        );

        let state = AppState::new(self.ledger.clone());
        let router = api::router(state, self.config.server.request_timeout());

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_signal.await;
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        self.shutdown().await
    }

    pub async fn serve(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let addr: SocketAddr = format!(
            "{}:{}",
            self.config.server.listen_address, self.config.server.port
        )
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            shutdown_signal.await;
            let _ = tx.send(());
        });

        self.run_with_listener(listener, rx).await
    }

    async fn shutdown(self) -> anyhow::Result<()> {
        info!("Shutting down parking server");

        if let Some(pg) = self.pg_store {
            info!("Closing database connections");
            pg.pool().close().await;
        }

        info!("Parking server shutdown complete");
        Ok(())
    }
}
