use actix_web::dev::ServerHandle;
use sqlx::{Pool, Postgres};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Handles graceful shutdown of the application
///
/// Waits for SIGTERM or CTRL+C, stops the HTTP server so in-flight requests
/// finish, then closes the database pool.
pub struct ShutdownCoordinator {
    server_handle: ServerHandle,
    server_task: JoinHandle<Result<(), std::io::Error>>,
    pool: Pool<Postgres>,
}

impl ShutdownCoordinator {
    pub fn new(
        server_handle: ServerHandle,
        server_task: JoinHandle<Result<(), std::io::Error>>,
        pool: Pool<Postgres>,
    ) -> Self {
        Self {
            server_handle,
            server_task,
            pool,
        }
    }

    /// Block until a shutdown signal arrives, then shut down gracefully
    pub async fn wait_for_shutdown(self) -> Result<(), std::io::Error> {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for CTRL+C: {:?}", e);
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
                    error!("Failed to install SIGTERM handler: {:?}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received CTRL+C signal, initiating graceful shutdown...");
            }
            _ = terminate => {
                info!("Received SIGTERM signal, initiating graceful shutdown...");
            }
        }

        self.shutdown().await
    }

    async fn shutdown(self) -> Result<(), std::io::Error> {
        // 1. Stop accepting connections, let in-flight requests finish
        info!("Stopping HTTP server (no longer accepting new requests)...");
        self.server_handle.stop(true).await;

        // 2. Wait for the server task itself
        match self.server_task.await {
            Ok(Ok(_)) => info!("HTTP server shut down successfully"),
            Ok(Err(e)) => error!("HTTP server encountered error during shutdown: {:?}", e),
            Err(e) => error!("HTTP server task panicked: {:?}", e),
        }

        // 3. Close database connections
        info!("Closing database connection pool...");
        self.pool.close().await;

        info!("Graceful shutdown completed successfully");
        Ok(())
    }
}
