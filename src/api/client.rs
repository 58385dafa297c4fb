use crate::error::{FetchError, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub const GITHUB_API_URL: &str = "https://api.github.com";
const ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("toolbox-gen/", env!("CARGO_PKG_VERSION"));

/// GitHub REST API client; every call is a single attempt
pub struct GitHubClient {
    token: String,
    base_url: String,
    client: Client,
}

impl GitHubClient {
    /// Create a client against an API root (api.github.com, GHE or a mock server)
    pub fn with_base_url(base_url: &str, token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET an endpoint and decode its JSON body
    pub async fn get_json(&self, endpoint: &str) -> std::result::Result<Value, FetchError> {
        let response = self.send(endpoint).await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::FORBIDDEN => {
                return Err(FetchError::Forbidden {
                    rate_limited: rate_limit_exhausted(&response),
                })
            }
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound),
            status => return Err(FetchError::Status(status.as_u16())),
        }

        let body = response.text().await.map_err(classify_transport)?;
        serde_json::from_str(&body).map_err(|e| FetchError::MalformedBody(e.to_string()))
    }

    /// Smoke-test the token against `/user`
    pub async fn check_token(&self) -> std::result::Result<TokenCheck, FetchError> {
        let response = self.send("/user").await?;
        let remaining = header_value(&response, "x-ratelimit-remaining");
        let limit = header_value(&response, "x-ratelimit-limit");

        let check = match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(classify_transport)?;
                let user: Value = serde_json::from_str(&body)
                    .map_err(|e| FetchError::MalformedBody(e.to_string()))?;
                TokenCheck::Valid {
                    login: user
                        .get("login")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    remaining,
                    limit,
                }
            }
            StatusCode::UNAUTHORIZED => TokenCheck::Unauthorized,
            StatusCode::FORBIDDEN if remaining.as_deref() == Some("0") => TokenCheck::RateLimited,
            StatusCode::FORBIDDEN => TokenCheck::Forbidden,
            status => TokenCheck::Unexpected(status.as_u16()),
        };

        Ok(check)
    }

    async fn send(&self, endpoint: &str) -> std::result::Result<Response, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", ACCEPT)
            .send()
            .await
            .map_err(classify_transport)
    }
}

/// Result of a token smoke test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCheck {
    Valid {
        login: String,
        remaining: Option<String>,
        limit: Option<String>,
    },
    Unauthorized,
    RateLimited,
    Forbidden,
    Unexpected(u16),
}

fn classify_transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}

fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn rate_limit_exhausted(response: &Response) -> bool {
    header_value(response, "x-ratelimit-remaining").as_deref() == Some("0")
}
