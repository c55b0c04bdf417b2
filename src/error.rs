//! Crate-wide error taxonomy.
//!
//! Every failure surfaced by [`crate::DocBrainClient::process`] is one of
//! these variants; nothing is retried internally and no partial result is
//! ever produced alongside an error.

use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum DocBrainError {
    #[error("invalid base URL `{0}`")]
    InvalidBaseUrl(String),
    #[error("failed to join `{path}` onto base URL: {source}")]
    UrlJoin {
        path: String,
        #[source]
        source: ParseError,
    },
    #[error("failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("credential resolution failed: {reason}")]
    Credentials { reason: String },
    #[error("storage upload failed: {source}")]
    Upload {
        #[source]
        source: reqwest::Error,
    },
    #[error("storage upload rejected with HTTP status {status}")]
    UploadStatus { status: u16 },
    #[error("failed to post job to platform: {source}")]
    SubmissionRequest {
        #[source]
        source: reqwest::Error,
    },
    #[error("platform rejected job submission with HTTP status {status}")]
    Submission { status: u16 },
    #[error("malformed job submission response: {source}")]
    SubmissionResponse {
        #[source]
        source: serde_json::Error,
    },
    #[error("platform returned no job records for submission")]
    EmptySubmissionResponse,
    #[error("failed to fetch status for job `{job_id}`: {source}")]
    PollingTransport {
        job_id: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("status fetch for job `{job_id}` returned HTTP status {status}")]
    PollingStatus { job_id: String, status: u16 },
    #[error("malformed status payload for job `{job_id}`: {source}")]
    StatusDecode {
        job_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("timeout exceeded waiting for job `{job_id}` after {waited_secs} polling ticks")]
    JobTimeout { job_id: String, waited_secs: u64 },
    #[error("job `{job_id}` reported an error")]
    JobFailed { job_id: String },
    #[error("job `{job_id}` was aborted")]
    JobAborted { job_id: String },
    #[error("job `{job_id}` completed without a result payload")]
    MissingResult { job_id: String },
    #[error("polling task failed to complete: {source}")]
    TaskJoin {
        #[source]
        source: tokio::task::JoinError,
    },
}
