use std::sync::Arc;

use actix_multipart::form::MultipartFormConfig;
use actix_web::{web, App, HttpServer};
use clap::{Parser, Subcommand};
use tokio::sync::Semaphore;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

mod ai;
mod api;
mod chroma;
mod config;
mod db;
mod shutdown;
mod util;
mod worker;

use crate::ai::{EvaluationPipeline, GeminiClient, TextGenerator};
use crate::api::{
    evaluation::{handlers::evaluation_config, EvaluationService},
    health::health_config,
};
use crate::chroma::{seed, ChromaClient, ContextRetriever};
use crate::config::Config;
use crate::db::{EvaluationStore, PostgresEvaluationStore};
use crate::shutdown::ShutdownCoordinator;
use crate::util::FileReader;
use crate::worker::EvaluationWorker;

#[derive(Parser)]
#[command(name = "cv-evaluator", about = "Asynchronous CV and project evaluation service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server and evaluation worker pool (default)
    Serve,
    /// Load the evaluation guidelines into the vector store
    Seed,
}

/// File-based logging with daily rotation and level separation, plus a
/// console layer. Files land in the configured log directory as e.g.
/// info.log.2024-12-22.
fn init_tracing(log_dir: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let mut file_layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    for (file_name, level) in [
        ("debug.log", LevelFilter::DEBUG),
        ("info.log", LevelFilter::INFO),
        ("warn.log", LevelFilter::WARN),
        ("error.log", LevelFilter::ERROR),
    ] {
        let appender = tracing_appender::rolling::daily(log_dir, file_name);
        file_layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_filter(level)
                .boxed(),
        );
    }

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(file_layers)
        .with(env_filter)
        .with(console_layer)
        .init();
}

async fn seed_guidelines(config: &Config) -> std::io::Result<()> {
    let mut chroma = ChromaClient::new(&config.chromadb_url)
        .expect("Failed to create ChromaDB client");

    chroma
        .initialize_collection()
        .await
        .expect("Failed to initialize ChromaDB collection");

    seed::run(&chroma).await.expect("Failed to seed guidelines");
    Ok(())
}

async fn serve(config: Config) -> std::io::Result<()> {
    // Database pool and schema
    let pool = db::connection::get_connection(&config.database_url, config.max_db_connections)
        .await
        .expect("Failed to connect to database");

    db::migrations::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    info!("Starting cv-evaluator");
    info!("  - Max payload size: {} bytes", config.max_payload_size);
    info!("  - Max database connections: {}", config.max_db_connections);
    info!("  - Max concurrent jobs: {}", config.max_concurrent_jobs);
    info!("  - Number of workers: {}", config.num_workers);
    info!("  - Gemini model: {}", config.gemini_model);

    std::fs::create_dir_all(&config.upload_dir).expect("Failed to create upload directory");

    // AI components, wired here so nothing holds ambient global state
    let generator: Arc<dyn TextGenerator> = Arc::new(
        GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())
            .expect("Failed to create Gemini client"),
    );

    let mut chroma =
        ChromaClient::new(&config.chromadb_url).expect("Failed to create ChromaDB client");
    if let Err(e) = chroma.initialize_collection().await {
        // Retrieval degrades to the built-in default context
        warn!("ChromaDB unavailable, continuing without context store: {}", e);
    }
    let retriever: Arc<dyn ContextRetriever> = Arc::new(chroma);

    let pipeline = Arc::new(EvaluationPipeline::new(
        FileReader::new(),
        generator,
        retriever,
    ));

    let store: Arc<dyn EvaluationStore> = Arc::new(PostgresEvaluationStore::new(pool.clone()));

    // Shutdown signal shared by every worker
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Bounded concurrency across all workers
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
    let mut worker_handles = Vec::new();

    for worker_id in 1..=config.num_workers {
        let worker = EvaluationWorker::new(
            Arc::clone(&store),
            Arc::clone(&pipeline),
            Duration::from_secs(config.worker_poll_secs),
        );
        let worker_semaphore = semaphore.clone();
        let worker_shutdown_rx = shutdown_rx.clone();

        let handle = tokio::spawn(async move {
            worker.run(worker_id, worker_semaphore, worker_shutdown_rx).await;
        });

        worker_handles.push(handle);
        info!("Spawned worker {}", worker_id);
    }

    let app_port = config.app_port;
    let max_payload_size = config.max_payload_size;
    let server_pool = pool.clone();
    let server_store = Arc::clone(&store);
    let server_config = config.clone();

    let server = HttpServer::new(move || {
        let service = web::Data::new(EvaluationService::new(Arc::clone(&server_store)));

        let payload_config = web::PayloadConfig::default().limit(max_payload_size);
        let multipart_config = MultipartFormConfig::default().total_limit(max_payload_size);

        App::new()
            .app_data(web::Data::new(server_pool.clone()))
            .app_data(web::Data::new(server_config.clone()))
            .app_data(service)
            .app_data(payload_config)
            .app_data(multipart_config)
            .configure(health_config)
            .configure(evaluation_config)
    });

    info!("Server starting on http://0.0.0.0:{}", app_port);

    let server = server.bind(("0.0.0.0", app_port))?.run();
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let coordinator = ShutdownCoordinator::new(
        server_handle,
        server_task,
        worker_handles,
        shutdown_tx,
        semaphore,
        config.max_concurrent_jobs as u32,
        pool,
    );

    coordinator.wait_for_shutdown().await
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().expect("Failed to load configuration");

    std::fs::create_dir_all(&config.log_dir).expect("Failed to create logs directory");
    init_tracing(&config.log_dir);

    match cli.command {
        Some(Command::Seed) => seed_guidelines(&config).await,
        Some(Command::Serve) | None => serve(config).await,
    }
}
