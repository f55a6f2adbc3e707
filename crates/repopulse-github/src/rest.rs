use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const USER_AGENT: &str = "repopulse";

/// Thin GitHub REST client for the paged activity endpoints.
///
/// Every call carries a timeout; failures are mapped to typed errors and never
/// retried here.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RestClient {
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, token, timeout)
    }

    pub fn with_base_url(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// GET one page of a list endpoint as raw JSON values
    pub async fn get_list(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<serde_json::Value>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {} {:?}", url, query);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let remaining = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, remaining.as_deref(), path, &error_text));
        }

        Ok(response.json().await?)
    }
}

fn status_error(status: StatusCode, remaining: Option<&str>, path: &str, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::AuthError(format!("Bad credentials ({})", status)),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(body.to_string()),
        StatusCode::FORBIDDEN if remaining == Some("0") => Error::RateLimited(body.to_string()),
        StatusCode::FORBIDDEN => Error::AuthError(format!("Forbidden: {}", body)),
        StatusCode::NOT_FOUND => Error::RepoNotFound(path.to_string()),
        _ => Error::ApiError(format!("{} ({}): {}", path, status, body)),
    }
}
