use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};

use super::{decode_listing, Repository, RepositoryClient};
use crate::error::{status_parts, RepositoryError};

/// Reads a GitHub-style `GET /users/{user}/repos` listing.
pub struct GitHubRepos {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl GitHubRepos {
    pub fn new(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            client,
        }
    }

    /// Send `Authorization: token <token>` with every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RepositoryClient for GitHubRepos {
    async fn fetch(&self) -> Result<Vec<Repository>, RepositoryError> {
        tracing::debug!(url = %self.endpoint, authenticated = self.token.is_some(), "fetching repositories");

        let mut request = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let (status, reason) = status_parts(status);
            return Err(RepositoryError::Status { status, reason });
        }

        let body = response.bytes().await?;
        let repos = decode_listing(&body)?;

        tracing::debug!(count = repos.len(), "decoded repository listing");
        Ok(repos)
    }
}
