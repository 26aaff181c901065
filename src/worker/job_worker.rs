use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Semaphore};
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::ai::EvaluationPipeline;
use crate::api::evaluation::models::{Evaluation, EvaluationStatus};
use crate::db::EvaluationStore;

/// Background worker that drains queued evaluations.
///
/// Each worker claims jobs from the store (the claim flips the row to
/// `processing`, so a job is owned by exactly one task) and spawns the
/// pipeline run under a shared semaphore permit. The permit count bounds
/// in-flight evaluations across all workers; a watch channel tells workers
/// to stop claiming on shutdown.
pub struct EvaluationWorker {
    store: Arc<dyn EvaluationStore>,
    pipeline: Arc<EvaluationPipeline>,
    poll_interval: Duration,
}

impl EvaluationWorker {
    pub fn new(
        store: Arc<dyn EvaluationStore>,
        pipeline: Arc<EvaluationPipeline>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            pipeline,
            poll_interval,
        }
    }

    /// Claim-and-process loop; returns once the shutdown signal is observed
    pub async fn run(
        &self,
        worker_id: u32,
        semaphore: Arc<Semaphore>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("Worker {} started", worker_id);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            match self.store.claim_next().await {
                Ok(Some(eval)) => {
                    info!("Worker {} claimed evaluation {}", worker_id, eval.id);

                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        // Semaphore closed means the process is going down
                        Err(_) => break,
                    };

                    let store = Arc::clone(&self.store);
                    let pipeline = Arc::clone(&self.pipeline);

                    tokio::spawn(async move {
                        process(store, pipeline, eval).await;
                        drop(permit);
                    });
                }
                Ok(None) => {
                    tokio::select! {
                        _ = sleep(self.poll_interval) => {}
                        _ = shutdown_rx.changed() => {}
                    }
                }
                Err(e) => {
                    error!("Worker {} failed to claim next evaluation: {}", worker_id, e);
                    tokio::select! {
                        _ = sleep(Duration::from_secs(1)) => {}
                        _ = shutdown_rx.changed() => {}
                    }
                }
            }
        }

        info!("Worker {} stopped", worker_id);
    }
}

/// Run the pipeline for one claimed evaluation and persist the terminal
/// state. A failed terminal write is logged and leaves the row in its last
/// persisted state.
pub(crate) async fn process(
    store: Arc<dyn EvaluationStore>,
    pipeline: Arc<EvaluationPipeline>,
    mut eval: Evaluation,
) {
    info!("Processing evaluation {}", eval.id);

    match pipeline.run(&eval.cv_path, &eval.report_path).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(payload) => {
                eval.status = EvaluationStatus::Completed;
                eval.result = Some(payload);
                eval.error = None;
            }
            Err(e) => {
                eval.status = EvaluationStatus::Failed;
                eval.result = None;
                eval.error = Some(format!("result_unparsable: {}", e));
            }
        },
        Err(e) => {
            error!("Pipeline failed for evaluation {}: {}", eval.id, e);
            eval.status = EvaluationStatus::Failed;
            eval.result = None;
            eval.error = Some(format!("{}: {}", e.kind(), e));
        }
    }

    eval.updated_at = Utc::now();

    match store.update(&eval).await {
        Ok(()) => info!("Evaluation {} finished: {}", eval.id, eval.status.as_str()),
        Err(e) => error!(
            "Failed to persist terminal state for evaluation {}: {}",
            eval.id, e
        ),
    }
}
