//! Minimal GitHub REST client for credential and repository checks

use crate::core::error::ReleaseError;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

const USER_AGENT: &str = concat!("cdn-release/", env!("CARGO_PKG_VERSION"));

/// GitHub API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_base_url: String,
}

impl GitHubClient {
    pub fn new(api_base_url: &str) -> Result<Self, ReleaseError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ReleaseError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    /// Login of the token owner, or `None` if the token is rejected
    pub async fn authenticated_login(
        &self,
        token: &SecretString,
    ) -> Result<Option<String>, ReleaseError> {
        let (status, body) = self.get_json("user", token).await?;
        if !status.is_success() {
            return Ok(None);
        }
        Ok(body.get("login").and_then(Value::as_str).map(str::to_string))
    }

    /// Full name of `owner/name`, or `None` if it does not exist or is hidden
    pub async fn repository_full_name(
        &self,
        token: &SecretString,
        slug: &str,
    ) -> Result<Option<String>, ReleaseError> {
        let (status, body) = self.get_json(&format!("repos/{}", slug), token).await?;
        if !status.is_success() || body.get("id").is_none() {
            return Ok(None);
        }
        let full_name = body
            .get("full_name")
            .and_then(Value::as_str)
            .unwrap_or(slug)
            .to_string();
        Ok(Some(full_name))
    }

    async fn get_json(
        &self,
        path: &str,
        token: &SecretString,
    ) -> Result<(StatusCode, Value), ReleaseError> {
        let url = self.endpoint(path);
        debug!(%url, "GitHub API request");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("token {}", token.expose_secret()))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ReleaseError::NetworkError {
                message: format!("GET {} failed: {}", url, e.without_url()),
            })?;

        let status = response.status();
        // Error bodies are not always JSON; treat them as empty
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        debug!(%url, %status, "GitHub API response");

        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let client = GitHubClient::new("https://api.github.com/").unwrap();
        assert_eq!(client.endpoint("user"), "https://api.github.com/user");
        assert_eq!(
            client.endpoint("/repos/acme/lib"),
            "https://api.github.com/repos/acme/lib"
        );
    }

    #[tokio::test]
    async fn test_unreachable_api_is_network_error() {
        let client = GitHubClient::new("http://127.0.0.1:9").unwrap();
        let token = SecretString::new("ghp-unused-token".into());

        let result = client.authenticated_login(&token).await;

        assert!(matches!(result, Err(ReleaseError::NetworkError { .. })));
    }
}
