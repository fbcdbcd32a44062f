use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::config::GitHubConfig;
use crate::repository::{FileSha, RemoteFile, RemoteFileStore, StorageError};

const USER_AGENT: &str = concat!("studyos/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// Failure to reach the configured repository at startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectError {
    #[error("could not build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("repository {repo} is not reachable: {source}")]
    Unreachable {
        repo: String,
        #[source]
        source: StorageError,
    },
}

/// `RemoteFileStore` over the GitHub contents API.
#[derive(Clone)]
pub struct GitHubFileStore {
    client: Client,
    config: GitHubConfig,
}

impl GitHubFileStore {
    /// Build the store without touching the network.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError::Client` if the http client cannot be built.
    pub fn new(config: GitHubConfig) -> Result<Self, ConnectError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, config })
    }

    /// Build the store and check that the repository is reachable with the
    /// configured credentials.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError::Unreachable` on authorization or transport failure.
    pub async fn connect(config: GitHubConfig) -> Result<Self, ConnectError> {
        let store = Self::new(config)?;
        let url = store.config.repo_url();
        let response = store
            .authorized(store.client.get(url))
            .send()
            .await
            .map_err(transport)
            .and_then(check_status)
            .map_err(|source| ConnectError::Unreachable {
                repo: store.config.repo.to_string(),
                source,
            })?;
        debug!(repo = %store.config.repo, status = %response.status(), "connected to repository");
        Ok(store)
    }

    #[must_use]
    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&FileSha>,
    ) -> Result<(), StorageError> {
        let body = PutContents {
            message,
            content: BASE64.encode(content.as_bytes()),
            sha: sha.map(FileSha::as_str),
            branch: self.config.branch.as_deref(),
        };
        let mut url = self.config.contents_url(path);
        url.set_query(None);

        let response = self
            .authorized(self.client.put(url))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        check_status(response)?;
        Ok(())
    }
}

#[async_trait]
impl RemoteFileStore for GitHubFileStore {
    async fn get_file(&self, path: &str) -> Result<RemoteFile, StorageError> {
        let response = self
            .authorized(self.client.get(self.config.contents_url(path)))
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response)?;
        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        body.into_remote_file(path)
    }

    async fn create_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<(), StorageError> {
        self.put(path, content, message, None).await
    }

    async fn update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: &FileSha,
    ) -> Result<(), StorageError> {
        self.put(path, content, message, Some(sha)).await
    }
}

fn transport(err: reqwest::Error) -> StorageError {
    StorageError::Connection(err.to_string())
}

fn check_status(response: Response) -> Result<Response, StorageError> {
    match status_error(response.status()) {
        Some(err) => Err(err),
        None => Ok(response),
    }
}

fn status_error(status: StatusCode) -> Option<StorageError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::NOT_FOUND => StorageError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StorageError::Unauthorized(status.to_string())
        }
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => StorageError::Conflict,
        other => StorageError::HttpStatus(other.as_u16()),
    })
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

impl ContentsResponse {
    fn into_remote_file(self, path: &str) -> Result<RemoteFile, StorageError> {
        if let Some(kind) = self.kind.as_deref() {
            if kind != "file" {
                return Err(StorageError::Serialization(format!(
                    "{path} is a {kind}, not a file"
                )));
            }
        }
        if let Some(encoding) = self.encoding.as_deref() {
            if encoding != "base64" {
                return Err(StorageError::Serialization(format!(
                    "unsupported content encoding {encoding}"
                )));
            }
        }

        // The API wraps base64 at 60 columns.
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = BASE64
            .decode(compact.as_bytes())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let content =
            String::from_utf8(bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(RemoteFile {
            path: path.to_owned(),
            content,
            sha: FileSha::new(self.sha),
        })
    }
}
