//! OAuth2 resource-owner password grant for Reddit "script" apps.

use collector_core::{Credentials, RedditApiError};
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    ResourceOwnerPassword, ResourceOwnerUsername, TokenResponse, TokenUrl,
};
use reqwest::Client;
use std::time::{Duration, SystemTime};
use tracing::{debug, error};

pub const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Where the client sends its requests.
#[derive(Debug, Clone)]
pub struct RedditEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub api_base: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            auth_url: REDDIT_AUTH_URL.to_string(),
            token_url: REDDIT_TOKEN_URL.to_string(),
            api_base: crate::api::REDDIT_API_BASE.to_string(),
        }
    }
}

impl RedditEndpoints {
    /// Serves every endpoint from one host, keeping Reddit's paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{}/api/v1/authorize", base),
            token_url: format!("{}/api/v1/access_token", base),
            api_base: base.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

pub async fn request_password_token(
    http_client: &Client,
    endpoints: &RedditEndpoints,
    credentials: &Credentials,
) -> Result<RedditToken, RedditApiError> {
    let auth_url = AuthUrl::new(endpoints.auth_url.clone()).map_err(|e| {
        RedditApiError::AuthenticationFailed {
            reason: format!("Invalid authorization URL: {}", e),
        }
    })?;
    let token_url = TokenUrl::new(endpoints.token_url.clone()).map_err(|e| {
        RedditApiError::AuthenticationFailed {
            reason: format!("Invalid token URL: {}", e),
        }
    })?;

    let oauth_client = BasicClient::new(
        ClientId::new(credentials.client_id.clone()),
        Some(ClientSecret::new(credentials.client_secret.clone())),
        auth_url,
        Some(token_url),
    );

    let username = ResourceOwnerUsername::new(credentials.username.clone());
    let password = ResourceOwnerPassword::new(credentials.password.clone());

    debug!("Requesting password-grant token for u/{}", credentials.username);
    let token_response = oauth_client
        .exchange_password(&username, &password)
        .request_async(|request| send_oauth_request(http_client, request))
        .await
        .map_err(token_error)?;

    let expires_in = token_response
        .expires_in()
        .unwrap_or(Duration::from_secs(3600));

    Ok(RedditToken {
        access_token: token_response.access_token().secret().clone(),
        expires_at: SystemTime::now() + expires_in,
    })
}

/// Runs an oauth2 request through our client so it carries the configured
/// user agent.
async fn send_oauth_request(
    http_client: &Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

fn token_error(err: RequestTokenError<reqwest::Error, BasicErrorResponse>) -> RedditApiError {
    match err {
        RequestTokenError::ServerResponse(response) => RedditApiError::AuthenticationFailed {
            reason: response.error().to_string(),
        },
        RequestTokenError::Request(e) if e.is_timeout() => RedditApiError::RequestTimeout,
        RequestTokenError::Request(e) => RedditApiError::Network(e),
        // Reddit reports a bad password as HTTP 200 with only an `error`
        // field, which does not parse as a token response.
        RequestTokenError::Parse(e, body) => match error_reason(&body) {
            Some(reason) => RedditApiError::AuthenticationFailed { reason },
            None => {
                error!("Unreadable token response: {}", e);
                RedditApiError::InvalidResponse {
                    details: format!("Unreadable token response: {}", e),
                }
            }
        },
        RequestTokenError::Other(reason) => RedditApiError::AuthenticationFailed { reason },
    }
}

fn error_reason(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let error = value.get("error")?;
    let message = value.get("message").and_then(|m| m.as_str());

    Some(match (error.as_str(), message) {
        (Some(code), _) => code.to_string(),
        (None, Some(message)) => format!("{} ({})", message, error),
        (None, None) => error.to_string(),
    })
}
