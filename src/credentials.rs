//! Storage credential resolution.
//!
//! Resolution is an ordered fallback kept out of the orchestrator's control
//! flow: an explicit access token wins, then an explicit credential file,
//! then the ambient application default (`GOOGLE_APPLICATION_CREDENTIALS`
//! or the GCE metadata server).

use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::DocBrainError;

const ADC_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Where the bearer token for object storage comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    AccessToken(String),
    CredentialsFile(PathBuf),
    ApplicationDefault,
}

impl CredentialSource {
    /// Pick a source from the two optional configuration inputs.
    pub fn resolve(access_token: Option<String>, credentials_file: Option<PathBuf>) -> Self {
        if let Some(token) = access_token {
            return Self::AccessToken(token);
        }
        if let Some(path) = credentials_file {
            return Self::CredentialsFile(path);
        }
        Self::ApplicationDefault
    }
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
}

/// Produce a bearer token for the given source.
///
/// Tokens are acquired once per client and reused; callers cache the result.
pub async fn fetch_access_token(
    source: &CredentialSource,
    http: &Client,
) -> Result<String, DocBrainError> {
    match source {
        CredentialSource::AccessToken(token) => Ok(token.clone()),
        CredentialSource::CredentialsFile(path) => read_token_file(path).await,
        CredentialSource::ApplicationDefault => {
            if let Ok(path) = std::env::var(ADC_ENV_VAR) {
                return read_token_file(Path::new(&path)).await;
            }
            fetch_metadata_token(http, METADATA_TOKEN_URL).await
        }
    }
}

/// Credential files hold either a JSON object with an `access_token` field
/// or the raw token itself.
async fn read_token_file(path: &Path) -> Result<String, DocBrainError> {
    let contents =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|err| DocBrainError::Credentials {
                reason: format!("failed to read credential file {}: {err}", path.display()),
            })?;

    let token = match serde_json::from_str::<TokenPayload>(&contents) {
        Ok(payload) => payload.access_token,
        Err(_) => contents.trim().to_string(),
    };

    if token.is_empty() {
        return Err(DocBrainError::Credentials {
            reason: format!("credential file {} holds no token", path.display()),
        });
    }
    Ok(token)
}

async fn fetch_metadata_token(http: &Client, url: &str) -> Result<String, DocBrainError> {
    debug!("requesting access token from metadata server");
    let response = http
        .get(url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|err| DocBrainError::Credentials {
            reason: format!("metadata server request failed: {err}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DocBrainError::Credentials {
            reason: format!("metadata server returned HTTP status {}", status.as_u16()),
        });
    }

    let payload: TokenPayload =
        response
            .json()
            .await
            .map_err(|err| DocBrainError::Credentials {
                reason: format!("malformed metadata token response: {err}"),
            })?;
    Ok(payload.access_token)
}
