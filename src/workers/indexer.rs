use crate::config::settings::AppConfig;
use crate::infrastructure::queue::broker::{Broker, BrokerError};
use crate::infrastructure::queue::subscription::{
    RetryPolicy, Subscription, SubscriptionError, SubscriptionHandler,
};
use crate::infrastructure::storage::archive;
use crate::modules::job::events::LogEvent;
use crate::modules::job::model::JobRecord;
use crate::modules::movie::{MovieService, page};
use crate::state::AppState;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub async fn start_indexer_worker(state: AppState, shutdown: CancellationToken) -> anyhow::Result<()> {
    info!("🎬 Starting indexer worker...");

    let movies = MovieService::new(state.config.metadata_base()?)?;
    let broker: Arc<dyn Broker> = Arc::new(state.redis.clone());
    let processor = Arc::new(JobEventProcessor::new(
        worker_name(),
        broker.clone(),
        movies,
        state.config.clone(),
    ));

    let subscription = Subscription::new(broker, state.config.jobs_channel.clone(), processor, shutdown);

    info!("🎬 Waiting for incoming events on '{}'", state.config.jobs_channel);
    subscription.run().await?;

    info!("Indexer worker stopped");
    Ok(())
}

fn worker_name() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "na".to_string());
    format!("{}-{}", env!("CARGO_PKG_NAME"), host)
}

/// Turns `finished` job announcements into a movie page plus the unpacked
/// archive under the result directory, reporting progress on the log channel.
pub struct JobEventProcessor {
    name: String,
    broker: Arc<dyn Broker>,
    movies: MovieService,
    config: Arc<AppConfig>,
    retry: RetryPolicy,
}

impl JobEventProcessor {
    pub fn new(
        name: String,
        broker: Arc<dyn Broker>,
        movies: MovieService,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            name,
            broker,
            movies,
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub async fn publish(&self, job_id: &str, message: &str) -> Result<(), BrokerError> {
        info!("{}: {}", job_id, message);
        let payload = serde_json::to_string(&LogEvent::new(&self.name, job_id, message))?;
        self.broker.publish(&self.config.log_channel, payload).await
    }

    // Progress reporting must never fail a job
    async fn report(&self, job_id: &str, message: impl AsRef<str>) {
        if let Err(e) = self.publish(job_id, message.as_ref()).await {
            warn!("{}: failed to publish log event: {}", job_id, e);
        }
    }

    pub async fn process(&self, raw: &[u8]) -> anyhow::Result<()> {
        // 1. Decode
        let job: JobRecord = serde_json::from_slice(raw)
            .with_context(|| format!("Unmarshal error ({})", String::from_utf8_lossy(raw)))?;

        // 2. Only finished jobs concern us
        if !job.is_finished() {
            debug!("{}: skipping job in state '{}'", job.id, job.state);
            return Ok(());
        }

        if let Some(name) = &job.name {
            debug!("{}: announced as '{}'", job.id, name);
        }
        self.report(&job.id, "Got a job").await;

        // 3. The archive has to be delivered before anything is written
        let dir = job.directory();
        let archive_path = self.config.result_dir.join(format!("{dir}.tar"));
        let missing = match tokio::fs::try_exists(&archive_path).await {
            Ok(true) => None,
            Ok(false) => Some(anyhow!("archive {} does not exist", archive_path.display())),
            Err(e) => Some(
                anyhow::Error::new(e).context(format!("can't access archive {}", archive_path.display())),
            ),
        };
        if let Some(err) = missing {
            self.report(&job.id, format!("Error: {err:#}")).await;
            return Err(err);
        }

        // 4. Page first, so extracted files never show up without one
        self.report(&job.id, "Parsing and creating HTML page...").await;
        if let Err(e) = self.build_page(&job, &dir).await {
            self.report(&job.id, format!("Error: {e:#}")).await;
            return Err(e);
        }
        self.report(&job.id, "HTML page created").await;

        // 5. Extract
        self.report(&job.id, "Extracting files from an archive...").await;
        let src = archive_path.clone();
        let dest = self.config.result_dir.join(&dir);
        let extracted = tokio::task::spawn_blocking(move || archive::extract(&src, &dest))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r.map_err(anyhow::Error::from));
        match extracted {
            Ok(count) => {
                debug!("{}: {} files extracted", job.id, count);
                self.report(&job.id, "Files extracted").await;
            }
            Err(e) => {
                self.report(&job.id, format!("Error extracting: {e:#}")).await;
                return Err(e);
            }
        }

        // 6. Cleanup
        match tokio::fs::remove_file(&archive_path).await {
            Ok(()) => self.report(&job.id, "Archive deleted").await,
            Err(e) => self.report(&job.id, format!("Can't delete archive: {e}")).await,
        }

        self.report(&job.id, "Done").await;
        Ok(())
    }

    async fn build_page(&self, job: &JobRecord, dir: &str) -> anyhow::Result<()> {
        let template = self.config.template_file();
        let present = tokio::fs::try_exists(&template)
            .await
            .with_context(|| format!("can't access template {}", template.display()))?;
        if !present {
            return Err(anyhow!("template {} does not exist", template.display()));
        }

        let movie = self.movies.fetch(&job.info_url, dir).await?;
        let html = page::render(&movie, &template).await?;

        let index = page::save(&html, &self.config.result_dir.join(dir))
            .await
            .context("could not write page")?;
        info!("{}: Saved: {}", job.id, index.display());
        Ok(())
    }
}

#[async_trait]
impl SubscriptionHandler for JobEventProcessor {
    async fn on_message(&self, payload: &[u8]) -> anyhow::Result<()> {
        self.process(payload).await
    }

    async fn on_retry(&self, attempts: u32, elapsed: Duration) -> Result<(), SubscriptionError> {
        self.retry.wait(attempts, elapsed).await
    }

    async fn on_established(&self, downtime: Duration) -> Result<(), SubscriptionError> {
        info!("✅ Redis connection established. Downtime: {:?}", downtime);
        Ok(())
    }
}
