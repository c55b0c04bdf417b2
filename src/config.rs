//! Construction-time client configuration.

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

/// Bucket images are staged in unless overridden.
pub const DEFAULT_UPLOAD_BUCKET: &str = "moonoia-poc-data";

/// Path prefix prepended to every generated upload key.
pub const DEFAULT_BUCKET_PATH: &str = "data";

/// Polling ticks granted to a job before it is declared timed out.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 60;

/// Object storage endpoint used when none is configured.
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";

/// Options supplied once when building a [`crate::DocBrainClient`].
///
/// Storage credentials follow an ordered fallback: an explicit
/// `access_token` wins over `credentials_file`, and when neither is set the
/// ambient application default is used.
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// Base URL jobs are posted to; status requests go to `{url}/jobs/{id}`.
    #[builder(into)]
    pub platform_url: String,
    /// Attached verbatim as the `Authorization` header on every platform
    /// request when present.
    #[builder(into)]
    pub authorization: Option<String>,
    #[builder(into)]
    pub access_token: Option<String>,
    #[builder(into)]
    pub credentials_file: Option<PathBuf>,
    #[builder(into, default = String::from(DEFAULT_UPLOAD_BUCKET))]
    pub upload_bucket: String,
    #[builder(into, default = String::from(DEFAULT_BUCKET_PATH))]
    pub bucket_path: String,
    /// Counted in polling ticks, not wall-clock seconds; see
    /// [`crate::DocBrainClient::process`].
    #[builder(default = DEFAULT_JOB_TIMEOUT_SECS)]
    pub job_timeout_secs: u64,
    /// Delay before the first status check and between checks.
    #[builder(default = Duration::from_secs(1))]
    pub poll_interval: Duration,
    #[builder(into)]
    pub storage_endpoint: Option<String>,
}
