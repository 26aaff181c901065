use std::sync::Arc;

use actix_web::dev::ServerHandle;
use sqlx::{Pool, Postgres};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Orchestrates graceful shutdown:
/// 1. stop accepting HTTP requests
/// 2. signal workers to stop claiming jobs
/// 3. join the worker tasks
/// 4. drain in-flight evaluations (reacquire every job permit)
/// 5. wait for the HTTP server task, then close the database pool
pub struct ShutdownCoordinator {
    server_handle: ServerHandle,
    server_task: JoinHandle<Result<(), std::io::Error>>,
    worker_handles: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    job_semaphore: Arc<Semaphore>,
    max_concurrent_jobs: u32,
    pool: Pool<Postgres>,
}

impl ShutdownCoordinator {
    pub fn new(
        server_handle: ServerHandle,
        server_task: JoinHandle<Result<(), std::io::Error>>,
        worker_handles: Vec<JoinHandle<()>>,
        shutdown_tx: watch::Sender<bool>,
        job_semaphore: Arc<Semaphore>,
        max_concurrent_jobs: u32,
        pool: Pool<Postgres>,
    ) -> Self {
        Self {
            server_handle,
            server_task,
            worker_handles,
            shutdown_tx,
            job_semaphore,
            max_concurrent_jobs,
            pool,
        }
    }

    /// Block until SIGINT (CTRL+C) or SIGTERM arrives, then run the shutdown
    /// sequence.
    pub async fn wait_for_shutdown(self) -> Result<(), std::io::Error> {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install CTRL+C signal handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received CTRL+C, initiating graceful shutdown..."),
            _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
        }

        self.shutdown().await
    }

    async fn shutdown(self) -> Result<(), std::io::Error> {
        info!("Stopping HTTP server (no longer accepting new requests)...");
        self.server_handle.stop(true).await;

        info!("Signaling workers to stop claiming evaluations...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal to workers: {:?}", e);
        }

        info!("Waiting for {} workers to stop...", self.worker_handles.len());
        for (i, handle) in self.worker_handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!("Worker {} failed to stop cleanly: {:?}", i + 1, e);
            }
        }

        // In-flight evaluations hold permits; owning all of them again means
        // every spawned pipeline task has finished.
        info!("Draining in-flight evaluations...");
        match self.job_semaphore.acquire_many(self.max_concurrent_jobs).await {
            Ok(_permits) => info!("All in-flight evaluations drained"),
            Err(e) => error!("Failed to drain in-flight evaluations: {:?}", e),
        }

        info!("Waiting for HTTP server task to finish...");
        match self.server_task.await {
            Ok(Ok(())) => info!("HTTP server shut down"),
            Ok(Err(e)) => error!("HTTP server error during shutdown: {:?}", e),
            Err(e) => error!("HTTP server task panicked: {:?}", e),
        }

        info!("Closing database connection pool...");
        self.pool.close().await;

        info!("Graceful shutdown completed");
        Ok(())
    }
}
