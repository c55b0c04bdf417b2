//! Async client for the docBrain document inference platform.
//!
//! One [`DocBrainClient::process`] call stages the image bytes in object
//! storage, submits a job referencing the uploaded object, then polls the
//! platform once per interval until the job reaches a terminal state,
//! returning an [`InferenceResult`] or a typed [`DocBrainError`].
//!
//! ```no_run
//! use docbrain::{ClientConfig, DocBrainClient};
//!
//! # async fn run(image: bytes::Bytes) -> Result<(), docbrain::DocBrainError> {
//! let config = ClientConfig::builder()
//!     .platform_url("https://platform.example.com/api/v1/inference")
//!     .authorization("api-key-123")
//!     .build();
//! let client = DocBrainClient::new(config)?;
//! let outcome = client.process(image).await?;
//! println!("label={} score={}", outcome.result, outcome.score);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod platform;
pub mod storage;

pub use client::{DocBrainClient, InferenceResult};
pub use config::{
    ClientConfig, DEFAULT_BUCKET_PATH, DEFAULT_JOB_TIMEOUT_SECS, DEFAULT_STORAGE_ENDPOINT,
    DEFAULT_UPLOAD_BUCKET,
};
pub use credentials::CredentialSource;
pub use error::DocBrainError;
pub use platform::{HttpPlatformClient, JobResult, JobState, JobStatus, PlatformClient};
pub use storage::{GcsUploader, StorageUploader};
