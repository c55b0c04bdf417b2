//! Job orchestration: stage the image, submit the job, poll until terminal.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ClientConfig, DEFAULT_STORAGE_ENDPOINT};
use crate::credentials::CredentialSource;
use crate::error::DocBrainError;
use crate::platform::{HttpPlatformClient, JobState, PlatformClient};
use crate::storage::{GcsUploader, StorageUploader};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Model output for a completed job.
///
/// Produced only when the platform reports the job done; a failed call never
/// yields a partial or default result.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    /// Text label or category produced by the model.
    pub result: String,
    /// Confidence with platform-defined semantics; no range is enforced.
    pub score: f32,
}

/// Client driving one inference job per [`process`](DocBrainClient::process)
/// call: upload, submission, then a bounded polling loop.
pub struct DocBrainClient<U = GcsUploader, P = HttpPlatformClient> {
    uploader: U,
    platform: P,
    bucket_path: String,
    job_timeout_secs: u64,
    poll_interval: Duration,
}

impl DocBrainClient {
    /// Build a client with the real storage and platform collaborators.
    ///
    /// The underlying HTTP client is created once and shared; storage
    /// credentials resolve lazily on the first upload.
    pub fn new(config: ClientConfig) -> Result<Self, DocBrainError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("docbrain/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| DocBrainError::BuildClient { source })?;

        let source =
            CredentialSource::resolve(config.access_token.clone(), config.credentials_file.clone());
        let endpoint = config
            .storage_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_STORAGE_ENDPOINT);
        let uploader = GcsUploader::new(http.clone(), endpoint, config.upload_bucket.clone(), source)?;
        let platform =
            HttpPlatformClient::new(http, config.platform_url.clone(), config.authorization.clone())?;

        Ok(Self::from_parts(uploader, platform, &config))
    }
}

impl<U, P> DocBrainClient<U, P>
where
    U: StorageUploader,
    P: PlatformClient + Clone + Send + Sync + 'static,
{
    /// Assemble a client from explicit collaborators. Unit tests inject
    /// doubles here; `new` wires the HTTP-backed pair.
    pub fn from_parts(uploader: U, platform: P, config: &ClientConfig) -> Self {
        Self {
            uploader,
            platform,
            bucket_path: config.bucket_path.clone(),
            job_timeout_secs: config.job_timeout_secs,
            poll_interval: config.poll_interval,
        }
    }

    /// Polling ticks granted before a job is declared timed out.
    pub fn job_timeout_secs(&self) -> u64 {
        self.job_timeout_secs
    }

    /// Adjust the timeout between calls; in-flight calls keep the value they
    /// started with.
    pub fn set_job_timeout_secs(&mut self, secs: u64) {
        self.job_timeout_secs = secs;
    }

    /// Run one image through upload, submission, and the polling loop,
    /// blocking until a terminal outcome.
    ///
    /// The timeout is counted in polling ticks rather than wall-clock time,
    /// so the effective wall-clock bound is roughly
    /// `ticks * poll_interval + grace + per-request latency`. The tick check
    /// happens before each status fetch; a response that arrives on the last
    /// tick is never discarded.
    pub async fn process(&self, image: Bytes) -> Result<InferenceResult, DocBrainError> {
        let key = format!("{}/{}.png", self.bucket_path, Uuid::new_v4());
        let location = self.uploader.upload(image, &key).await?;
        debug!(%location, "image staged for inference");

        let job_id = self.platform.submit(&location).await?;
        info!(%job_id, "inference job submitted");

        // The polling loop runs on its own task so the fixed waits stay off
        // the caller's task; the call itself remains synchronous to await.
        let platform = self.platform.clone();
        let timeout_ticks = self.job_timeout_secs;
        let interval = self.poll_interval;
        let poller = tokio::spawn(poll_until_terminal(platform, job_id, timeout_ticks, interval));
        poller
            .await
            .map_err(|source| DocBrainError::TaskJoin { source })?
    }
}

/// Bounded status loop: one fetch per tick, timeout checked before each
/// fetch, grace wait before the first one.
async fn poll_until_terminal<P: PlatformClient>(
    platform: P,
    job_id: String,
    timeout_ticks: u64,
    interval: Duration,
) -> Result<InferenceResult, DocBrainError> {
    // Grace wait so the platform can register the job before the first check.
    sleep(interval).await;

    let mut waited_secs = 0u64;
    loop {
        if waited_secs >= timeout_ticks {
            warn!(%job_id, waited_secs, "timed out waiting for job");
            return Err(DocBrainError::JobTimeout {
                job_id,
                waited_secs,
            });
        }

        let status = platform.fetch_status(&job_id).await?;
        match status.state() {
            JobState::Done => {
                let result = status.result.ok_or_else(|| DocBrainError::MissingResult {
                    job_id: job_id.clone(),
                })?;
                info!(%job_id, score = result.score, "inference job completed");
                return Ok(InferenceResult {
                    result: result.result,
                    score: result.score,
                });
            }
            JobState::Error => {
                warn!(%job_id, "platform reported job error");
                return Err(DocBrainError::JobFailed { job_id });
            }
            JobState::Aborted => {
                warn!(%job_id, "platform reported job aborted");
                return Err(DocBrainError::JobAborted { job_id });
            }
            JobState::InProgress => {
                debug!(%job_id, waited_secs, status = %status.status, "job still in progress");
                sleep(interval).await;
                waited_secs += 1;
            }
        }
    }
}
