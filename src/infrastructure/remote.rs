//! Async code-hosting-service client: reference resolution, descriptor
//! fetching, archive digesting. All requests are gated by a [`Limiter`].

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::descriptor::{ActionDescriptor, parse_action_yml};
use crate::domain::reference::is_sha;
use crate::domain::resolver::RemoteSource;
use crate::infrastructure::limiter::Limiter;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "actionlock";

/// Errors from the remote-source client. The client performs no retries; a
/// failing call propagates to the caller.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to build HTTP client")]
    ClientInit(#[source] reqwest::Error),

    #[error("request to {0} failed")]
    Request(String, #[source] reqwest::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} returned status {1}")]
    Status(String, reqwest::StatusCode),

    #[error("failed to parse response from {0}")]
    ParseResponse(String, #[source] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct TagObject {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    download_url: Option<String>,
}

/// The GitHub-hosted implementation of [`RemoteSource`].
pub struct GithubSource {
    client: reqwest::Client,
    token: Option<String>,
    limiter: Limiter,
}

impl GithubSource {
    /// Builds a client with the given credential, request timeout, and
    /// concurrency cap.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::ClientInit`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(
        token: Option<String>,
        request_timeout: Duration,
        max_concurrent: usize,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(RemoteError::ClientInit)?;
        Ok(Self {
            client,
            token,
            limiter: Limiter::new(max_concurrent),
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.get(url).header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn fetch_ref_sha(&self, url: &str) -> Result<String, RemoteError> {
        let _permit = self.limiter.acquire().await;
        log::debug!("GET {url}");
        let response = self
            .request(url)
            .send()
            .await
            .map_err(|e| RemoteError::Request(url.to_owned(), e))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(url.to_owned()));
        }
        if !response.status().is_success() {
            return Err(RemoteError::Status(url.to_owned(), response.status()));
        }
        let git_ref: GitRef = response
            .json()
            .await
            .map_err(|e| RemoteError::ParseResponse(url.to_owned(), e))?;
        if git_ref.object.kind == "tag" {
            let tag_url = format!("{API_BASE}/repos/tags/{}", git_ref.object.sha);
            return self.follow_annotated_tag(&tag_url).await;
        }
        Ok(git_ref.object.sha)
    }

    async fn follow_annotated_tag(&self, url: &str) -> Result<String, RemoteError> {
        let _permit = self.limiter.acquire().await;
        let response = self
            .request(url)
            .send()
            .await
            .map_err(|e| RemoteError::Request(url.to_owned(), e))?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(url.to_owned(), response.status()));
        }
        let tag: TagObject = response
            .json()
            .await
            .map_err(|e| RemoteError::ParseResponse(url.to_owned(), e))?;
        Ok(tag.object.sha)
    }
}

#[async_trait::async_trait]
impl RemoteSource for GithubSource {
    async fn resolve_ref(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> Result<String, RemoteError> {
        if is_sha(reference) {
            return Ok(reference.to_owned());
        }

        let tag_url = format!("{API_BASE}/repos/{owner}/{repo}/git/ref/tags/{reference}");
        match self.fetch_ref_sha(&tag_url).await {
            Ok(sha) => return Ok(sha),
            Err(RemoteError::NotFound(_)) => {
                log::debug!("{owner}/{repo}@{reference} is not a tag, trying branch");
            }
            Err(error) => return Err(error),
        }

        let branch_url = format!("{API_BASE}/repos/{owner}/{repo}/git/ref/heads/{reference}");
        self.fetch_ref_sha(&branch_url).await
    }

    async fn get_action_descriptor(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        path: Option<&str>,
    ) -> Result<Option<ActionDescriptor>, RemoteError> {
        let base = path.unwrap_or("");
        let candidates = descriptor_candidates(base);

        for candidate in candidates {
            let url = format!("{API_BASE}/repos/{owner}/{repo}/contents/{candidate}?ref={sha}");
            let _permit = self.limiter.acquire().await;
            log::debug!("GET {url}");
            let response = self
                .request(&url)
                .send()
                .await
                .map_err(|e| RemoteError::Request(url.clone(), e))?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                continue;
            }
            if !response.status().is_success() {
                return Err(RemoteError::Status(url, response.status()));
            }
            let contents: ContentsResponse = response
                .json()
                .await
                .map_err(|e| RemoteError::ParseResponse(url.clone(), e))?;
            let Some(download_url) = contents.download_url else {
                continue;
            };
            let body = self
                .client
                .get(&download_url)
                .send()
                .await
                .map_err(|e| RemoteError::Request(download_url.clone(), e))?
                .text()
                .await
                .map_err(|e| RemoteError::ParseResponse(download_url.clone(), e))?;
            if let Some(descriptor) = parse_action_yml(&body) {
                return Ok(Some(descriptor));
            }
            return Ok(Some(ActionDescriptor::Other));
        }
        Ok(None)
    }

    async fn archive_sha256(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<String, RemoteError> {
        let url = format!("{API_BASE}/repos/{owner}/{repo}/tarball/{sha}");
        let _permit = self.limiter.acquire().await;
        log::debug!("GET {url}");
        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|e| RemoteError::Request(url.clone(), e))?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(url, response.status()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::ParseResponse(url, e))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hasher.finalize();
        Ok(format!("sha256-{}", BASE64.encode(digest)))
    }
}

/// The descriptor file locations to try, in order: `action.yml`,
/// `action.yaml`, and (when `base` itself names a YAML file) `base` as-is.
fn descriptor_candidates(base: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let prefix = if base.is_empty() {
        String::new()
    } else {
        format!("{base}/")
    };
    candidates.push(format!("{prefix}action.yml"));
    candidates.push(format!("{prefix}action.yaml"));
    if base.ends_with(".yml") || base.ends_with(".yaml") {
        candidates.push(base.to_owned());
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_candidates_for_bare_action() {
        let candidates = descriptor_candidates("");
        assert_eq!(candidates, vec!["action.yml".to_owned(), "action.yaml".to_owned()]);
    }

    #[test]
    fn descriptor_candidates_for_subpath_action() {
        let candidates = descriptor_candidates("upload-sarif");
        assert_eq!(
            candidates,
            vec![
                "upload-sarif/action.yml".to_owned(),
                "upload-sarif/action.yaml".to_owned(),
            ]
        );
    }

    #[test]
    fn descriptor_candidates_for_reusable_workflow_file() {
        let candidates = descriptor_candidates(".github/workflows/build.yml");
        assert_eq!(
            candidates,
            vec![
                ".github/workflows/build.yml/action.yml".to_owned(),
                ".github/workflows/build.yml/action.yaml".to_owned(),
                ".github/workflows/build.yml".to_owned(),
            ]
        );
    }
}
