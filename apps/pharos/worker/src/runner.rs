//! Shared wiring for the worker jobs.
//!
//! The runner owns the store handles and provider clients and hands out the
//! two units of work: the tag vector refresh and the compensation drain.
//! The `run` entry point keeps both alive behind a single shutdown signal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use database::postgres::DatabaseConnection;
use database::redis::ConnectionManager;
use domain_compensation::{
    CompensationAction, CompensationProcessor, CompensationQueue, PgCompensationQueue,
    WorkerConfig, worker,
};
use domain_events::PgEventRepository;
use domain_interactions::PgInteractionRepository;
use domain_recommendations::TagVectorUpdater;
use eyre::Result;
use observability::TagUpdateMetrics;
use providers::embedding::DEFAULT_EMBEDDING_DIMENSIONS;
use providers::{
    AlertNotifier, AnalyticsSink, HttpVectorIndex, RecommendationCache, RedisCache, TinybirdSink,
    VectorIndex, WebhookNotifier,
};
use serde::Serialize;
use tokio::sync::watch;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

/// Queue state reported by the `status` command.
#[derive(Debug, Serialize)]
pub struct WorkerStatus {
    pub pending_actions: u64,
    pub failed_actions: Vec<CompensationAction>,
    pub timestamp: DateTime<Utc>,
}

pub struct JobRunner {
    db: DatabaseConnection,
    queue: Arc<PgCompensationQueue>,
    vector_index: Arc<dyn VectorIndex>,
    analytics: Arc<dyn AnalyticsSink>,
    cache: Arc<dyn RecommendationCache>,
    alerts: Arc<dyn AlertNotifier>,
    dimensions: usize,
}

impl JobRunner {
    pub fn new(db: DatabaseConnection, redis: ConnectionManager) -> Result<Self> {
        let vector_index: Arc<dyn VectorIndex> = Arc::new(
            HttpVectorIndex::from_env()
                .map_err(|e| eyre::eyre!("Vector index configuration failed: {}", e))?,
        );
        let analytics: Arc<dyn AnalyticsSink> = Arc::new(
            TinybirdSink::from_env()
                .map_err(|e| eyre::eyre!("Analytics sink configuration failed: {}", e))?,
        );
        let cache: Arc<dyn RecommendationCache> = Arc::new(RedisCache::new(redis));
        let alerts: Arc<dyn AlertNotifier> = Arc::new(WebhookNotifier::from_env());

        // Tag centroids carry the embedding model's dimensionality
        let dimensions =
            core_config::env_parse_or("EMBEDDING_DIMENSIONS", DEFAULT_EMBEDDING_DIMENSIONS)?;

        Ok(Self {
            queue: Arc::new(PgCompensationQueue::new(db.clone())),
            db,
            vector_index,
            analytics,
            cache,
            alerts,
            dimensions,
        })
    }

    fn tag_updater(&self) -> TagVectorUpdater<PgInteractionRepository> {
        TagVectorUpdater::new(
            Arc::new(PgInteractionRepository::new(self.db.clone())),
            self.vector_index.clone(),
            self.cache.clone(),
            self.dimensions,
        )
    }

    fn processor(&self) -> CompensationProcessor<PgCompensationQueue> {
        CompensationProcessor::new(
            self.queue.clone(),
            self.vector_index.clone(),
            self.analytics.clone(),
            Arc::new(PgEventRepository::new(self.db.clone())),
            self.alerts.clone(),
        )
    }

    /// One tag vector refresh pass. Returns the number of tags written.
    pub async fn refresh_tags(&self) -> Result<usize> {
        let updated = self.tag_updater().run_once().await?;
        Ok(updated)
    }

    /// One bounded drain of the compensation queue. Returns the number of
    /// actions processed.
    pub async fn drain_compensation(&self) -> Result<usize> {
        let config = WorkerConfig::default();
        Ok(worker::drain(&self.processor(), config.max_actions_per_drain).await)
    }

    /// Queue depth plus the actions waiting for manual attention.
    pub async fn status(&self) -> Result<WorkerStatus> {
        let pending_actions = self.queue.pending_depth().await?;
        let failed_actions = self.queue.get_failed_actions().await?;

        Ok(WorkerStatus {
            pending_actions,
            failed_actions,
            timestamp: Utc::now(),
        })
    }

    /// Run the scheduler and the compensation loop until a shutdown signal.
    pub async fn run(&self, cron_expr: &str) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Spawn shutdown signal handler
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        });

        let mut sched = JobScheduler::new().await?;

        let updater = Arc::new(self.tag_updater());
        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let updater = updater.clone();

            Box::pin(async move {
                info!("Running scheduled tag vector refresh");
                if let Err(e) = updater.run_once().await {
                    TagUpdateMetrics::record_failure(&e.to_string());
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;
        info!(cron = cron_expr, "Scheduler started, running compensation loop");

        worker::run(self.processor(), WorkerConfig::default(), shutdown_rx).await;

        sched.shutdown().await?;
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating shutdown..."),
    }
}
