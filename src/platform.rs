//! HTTP operations against the inference platform.

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DocBrainError;

/// One entry of the job submission payload.
#[derive(Debug, Serialize)]
struct SubmissionEntry<'a> {
    data: &'a str,
    #[serde(rename = "dataType")]
    data_type: &'a str,
}

/// Job record returned by the platform on submission.
#[derive(Debug, Deserialize)]
struct SubmittedJobRecord {
    id: String,
}

/// Decoded body of a status fetch.
///
/// `result` is only populated by the platform once the job is done; a status
/// payload without it is legal for every non-terminal state.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    pub status: String,
    #[serde(default)]
    pub result: Option<JobResult>,
}

/// Model output attached to a completed job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobResult {
    pub result: String,
    pub score: f32,
}

/// Interpretation of a raw status string.
///
/// Only the three terminal values are recognized; anything else counts as
/// still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Done,
    Error,
    Aborted,
    InProgress,
}

impl JobStatus {
    pub fn state(&self) -> JobState {
        match self.status.as_str() {
            "Done" => JobState::Done,
            "Error" => JobState::Error,
            "Aborted" => JobState::Aborted,
            _ => JobState::InProgress,
        }
    }
}

/// The two platform operations the orchestrator drives.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Submit a job referencing an uploaded object; returns the platform's
    /// opaque job identifier.
    async fn submit(&self, location: &str) -> Result<String, DocBrainError>;

    /// Fetch the current status of a previously submitted job.
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, DocBrainError>;
}

/// reqwest-backed [`PlatformClient`].
#[derive(Debug, Clone)]
pub struct HttpPlatformClient {
    http: Client,
    platform_url: String,
    base_url: Url,
    authorization: Option<String>,
}

impl HttpPlatformClient {
    pub fn new(
        http: Client,
        platform_url: impl Into<String>,
        authorization: Option<String>,
    ) -> Result<Self, DocBrainError> {
        let platform_url = platform_url.into();
        let base_url = Url::parse(&platform_url)
            .map_err(|_| DocBrainError::InvalidBaseUrl(platform_url.clone()))?;
        Ok(Self {
            http,
            platform_url,
            base_url,
            authorization,
        })
    }

    fn status_url(&self, job_id: &str) -> Result<Url, DocBrainError> {
        let path = format!("{}/jobs/{}", self.platform_url, job_id);
        Url::parse(&path).map_err(|source| DocBrainError::UrlJoin { path, source })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.authorization {
            Some(value) => request.header(header::AUTHORIZATION, value.as_str()),
            None => request,
        }
    }
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn submit(&self, location: &str) -> Result<String, DocBrainError> {
        let payload = [SubmissionEntry {
            data: location,
            data_type: "url",
        }];

        let response = self
            .authorize(self.http.post(self.base_url.clone()))
            .json(&payload)
            .send()
            .await
            .map_err(|source| DocBrainError::SubmissionRequest { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocBrainError::Submission {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| DocBrainError::SubmissionRequest { source })?;
        let records: Vec<SubmittedJobRecord> = serde_json::from_str(&body)
            .map_err(|source| DocBrainError::SubmissionResponse { source })?;
        let record = records
            .into_iter()
            .next()
            .ok_or(DocBrainError::EmptySubmissionResponse)?;

        debug!(job_id = %record.id, "platform accepted job");
        Ok(record.id)
    }

    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, DocBrainError> {
        let url = self.status_url(job_id)?;

        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(|source| DocBrainError::PollingTransport {
                job_id: job_id.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocBrainError::PollingStatus {
                job_id: job_id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| DocBrainError::PollingTransport {
                job_id: job_id.to_string(),
                source,
            })?;
        serde_json::from_str(&body).map_err(|source| DocBrainError::StatusDecode {
            job_id: job_id.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, authorization: Option<&str>) -> HttpPlatformClient {
        HttpPlatformClient::new(
            Client::new(),
            server.uri(),
            authorization.map(str::to_string),
        )
        .expect("build platform client")
    }

    #[test]
    fn submission_payload_serializes_to_documented_shape() {
        let payload = [SubmissionEntry {
            data: "gs://bucket/data/key.png",
            data_type: "url",
        }];
        let json = serde_json::to_string(&payload).expect("serialize payload");
        assert_eq!(
            json,
            r#"[{"data":"gs://bucket/data/key.png","dataType":"url"}]"#
        );
    }

    #[test]
    fn only_terminal_statuses_are_recognized() {
        let state = |status: &str| JobStatus {
            status: status.to_string(),
            result: None,
        };
        assert_eq!(state("Done").state(), JobState::Done);
        assert_eq!(state("Error").state(), JobState::Error);
        assert_eq!(state("Aborted").state(), JobState::Aborted);
        assert_eq!(state("Pending").state(), JobState::InProgress);
        assert_eq!(state("Running").state(), JobState::InProgress);
        // Terminal matches are exact; case variants stay in progress.
        assert_eq!(state("done").state(), JobState::InProgress);
        assert_eq!(state("").state(), JobState::InProgress);
    }

    #[test]
    fn status_payload_tolerates_missing_result() {
        let status: JobStatus =
            serde_json::from_str(r#"{"status": "Pending"}"#).expect("decode status");
        assert_eq!(status.state(), JobState::InProgress);
        assert!(status.result.is_none());

        let done: JobStatus = serde_json::from_str(
            r#"{"status": "Done", "result": {"result": "invoice", "score": 0.87}}"#,
        )
        .expect("decode terminal status");
        assert_eq!(done.state(), JobState::Done);
        let result = done.result.expect("result payload");
        assert_eq!(result.result, "invoice");
        assert!((result.score - 0.87).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn submit_posts_payload_and_extracts_first_job_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("authorization", "platform-key"))
            .and(body_string_contains(r#""dataType":"url""#))
            .and(body_string_contains("gs://bucket/data/key.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "42", "state": "queued"},
                {"id": "43", "state": "queued"},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("platform-key"));
        let job_id = client
            .submit("gs://bucket/data/key.png")
            .await
            .expect("submit job");
        assert_eq!(job_id, "42");
    }

    #[tokio::test]
    async fn submit_surfaces_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let result = client.submit("gs://bucket/data/key.png").await;
        assert!(matches!(
            result,
            Err(DocBrainError::Submission { status: 500 })
        ));
    }

    #[tokio::test]
    async fn submit_rejects_malformed_and_empty_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("malformed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let malformed = client.submit("gs://bucket/malformed.png").await;
        assert!(matches!(
            malformed,
            Err(DocBrainError::SubmissionResponse { .. })
        ));

        let empty = client.submit("gs://bucket/empty.png").await;
        assert!(matches!(
            empty,
            Err(DocBrainError::EmptySubmissionResponse)
        ));
    }

    #[tokio::test]
    async fn fetch_status_decodes_terminal_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "Done",
                "result": {"result": "invoice", "score": 0.87},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let status = client.fetch_status("42").await.expect("fetch status");
        assert_eq!(status.state(), JobState::Done);
        assert_eq!(status.result.expect("result").result, "invoice");
    }

    #[tokio::test]
    async fn fetch_status_surfaces_http_and_decode_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);

        let missing = client.fetch_status("missing").await;
        assert!(matches!(
            missing,
            Err(DocBrainError::PollingStatus { status: 404, .. })
        ));

        let garbled = client.fetch_status("garbled").await;
        assert!(matches!(garbled, Err(DocBrainError::StatusDecode { .. })));
    }
}
