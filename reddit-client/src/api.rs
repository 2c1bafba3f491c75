use crate::rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
use collector_core::{
    ConfigError, CoreError, PostRecord, RedditApiError, ALL_SUBREDDITS, DELETED_AUTHOR,
    USER_AGENT_VAR,
};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Response, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Largest page Reddit serves from a listing endpoint.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// A submission as it appears in a search listing. Every field is optional
/// because Reddit omits or nulls fields on removed and deleted posts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditPostData {
    pub id: Option<String>,
    pub title: Option<String>,
    pub selftext: Option<String>,
    pub author: Option<String>,
    pub subreddit: Option<String>,
    pub url: Option<String>,
    pub created_utc: Option<f64>,
    pub score: Option<i64>,
    pub num_comments: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditUserData {
    pub id: String,
    pub name: String,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    api_base: Url,
}

impl RedditApiClient {
    pub fn new(user_agent: &str, api_base: &str) -> Result<Self, CoreError> {
        let base_url = Url::parse(api_base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "api_base".to_string(),
                value: api_base.to_string(),
            })?;

        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::reddit_oauth()));

        // Reddit answers a search in an unknown subreddit with a redirect to
        // its subreddit search page, which must not be followed.
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .redirect(Policy::none())
            .build()
            .map_err(|e| {
                error!("Failed to create HTTP client: {}", e);
                ConfigError::InvalidValue {
                    field: USER_AGENT_VAR.to_string(),
                    value: user_agent.to_string(),
                }
            })?;

        Ok(Self {
            http_client,
            rate_limiter,
            api_base: base_url,
        })
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Appends `segments` to the API base, percent-encoding each one.
    fn endpoint_url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn make_request(
        &self,
        method: Method,
        segments: &[&str],
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, RedditApiError> {
        let url = self.endpoint_url(segments);
        let endpoint = url.path().to_string();
        let start_time = Instant::now();

        let permit = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for {} {} after {:?}",
            method, endpoint, permit.queue_wait_time
        );

        let mut request_builder = self
            .http_client
            .request(method.clone(), url)
            .bearer_auth(access_token);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = request_builder.send().await.map_err(|e| {
            error!("Network error for {} {}: {}", method, endpoint, e);
            if e.is_timeout() {
                RedditApiError::RequestTimeout
            } else {
                RedditApiError::Network(e)
            }
        })?;

        self.rate_limiter.observe_headers(response.headers()).await;

        let status = response.status();
        debug!(
            "Response {} for {} in {:?}",
            status,
            endpoint,
            start_time.elapsed()
        );

        if status.is_success() {
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        Err(match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            401 => RedditApiError::InvalidToken,
            403 => RedditApiError::Forbidden { resource: endpoint },
            404 | 300..=399 => match subreddit_of(segments) {
                Some(subreddit) => RedditApiError::SubredditNotFound {
                    subreddit: subreddit.to_string(),
                },
                None => RedditApiError::InvalidResponse {
                    details: format!("Resource not found: {}", endpoint),
                },
            },
            code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
            code => RedditApiError::InvalidResponse {
                details: format!("Unexpected status {} for {}", code, endpoint),
            },
        })
    }

    /// The "who am I" call, used to prove a freshly issued token works.
    pub async fn get_user_info(&self, access_token: &str) -> Result<RedditUserData, RedditApiError> {
        let response = self
            .make_request(Method::GET, &["api", "v1", "me"], access_token, None)
            .await?;

        let user_data: RedditUserData = response.json().await.map_err(|e| {
            error!("Failed to parse user data: {}", e);
            RedditApiError::InvalidResponse {
                details: "Failed to parse user data".to_string(),
            }
        })?;

        debug!("Retrieved user info for: {}", user_data.name);
        Ok(user_data)
    }

    /// Fetches one page of newest-first search results in `subreddit`.
    /// The `all` scope searches every subreddit.
    pub async fn search_subreddit(
        &self,
        access_token: &str,
        subreddit: &str,
        query: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, RedditApiError> {
        let limit_str = limit.to_string();

        let mut params = vec![
            ("q", query),
            ("sort", "new"),
            ("type", "link"),
            ("include_over_18", "on"),
            ("raw_json", "1"),
            ("limit", limit_str.as_str()),
        ];
        if !subreddit.eq_ignore_ascii_case(ALL_SUBREDDITS) {
            params.push(("restrict_sr", "on"));
        }
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let response = self
            .make_request(
                Method::GET,
                &["r", subreddit, "search"],
                access_token,
                Some(params.as_slice()),
            )
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse search results: {}", e);
            RedditApiError::InvalidResponse {
                details: format!("Failed to parse search results for r/{}", subreddit),
            }
        })?;

        debug!(
            "Retrieved {} posts from r/{} (after: {:?})",
            listing.data.children.len(),
            subreddit,
            listing.data.after
        );
        Ok(listing)
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        self.rate_limiter.get_rate_limit_status().await
    }
}

fn subreddit_of<'a>(segments: &[&'a str]) -> Option<&'a str> {
    match segments {
        ["r", name, ..] if !name.is_empty() => Some(*name),
        _ => None,
    }
}

impl From<RedditPostData> for PostRecord {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id.unwrap_or_default(),
            title: post_data.title.unwrap_or_default(),
            selftext: post_data.selftext.unwrap_or_default(),
            author: post_data
                .author
                .filter(|author| !author.is_empty())
                .unwrap_or_else(|| DELETED_AUTHOR.to_string()),
            created_utc: post_data.created_utc.unwrap_or_default(),
            score: post_data.score.unwrap_or_default(),
            url: post_data.url.unwrap_or_default(),
            num_comments: post_data.num_comments.unwrap_or_default(),
            subreddit: post_data.subreddit.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_client_creation() {
        let client = RedditApiClient::new("test-user-agent/1.0", "http://localhost/").unwrap();
        assert_eq!(client.api_base.as_str(), "http://localhost/");

        let status = client.get_rate_limit_status().await;
        assert!(status.available_tokens > 0);
    }

    #[test]
    fn test_invalid_user_agent_is_config_error() {
        let err = RedditApiClient::new("bad\nagent", REDDIT_API_BASE).unwrap_err();
        match err {
            CoreError::Config(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "USER_AGENT");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_api_base_is_config_error() {
        let err = RedditApiClient::new("test-user-agent/1.0", "not a url").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "api_base"
        ));
    }

    #[test]
    fn test_endpoint_url_encodes_segments() {
        let client = RedditApiClient::new("test-user-agent/1.0", REDDIT_API_BASE).unwrap();
        assert_eq!(
            client.endpoint_url(&["api", "v1", "me"]).as_str(),
            "https://oauth.reddit.com/api/v1/me"
        );
        assert_eq!(
            client.endpoint_url(&["r", "rust?sort=top#x", "search"]).path(),
            "/r/rust%3Fsort=top%23x/search"
        );

        let nested = RedditApiClient::new("test-user-agent/1.0", "http://localhost/proxy/").unwrap();
        assert_eq!(nested.endpoint_url(&["api", "v1", "me"]).path(), "/proxy/api/v1/me");
    }

    #[test]
    fn test_subreddit_of() {
        assert_eq!(subreddit_of(&["r", "rust", "search"]), Some("rust"));
        assert_eq!(subreddit_of(&["api", "v1", "me"]), None);
        assert_eq!(subreddit_of(&["r", "", "search"]), None);
    }

    #[test]
    fn test_reddit_post_conversion() {
        let post_data: RedditPostData = serde_json::from_value(serde_json::json!({
            "id": "test123",
            "title": "Test Post",
            "selftext": "This is test content",
            "author": "test_user",
            "subreddit": "test",
            "url": "https://reddit.com/r/test/comments/test123",
            "created_utc": 1640995200.0,
            "score": -4,
            "num_comments": 5,
            "over_18": false
        }))
        .unwrap();

        let record: PostRecord = post_data.into();
        assert_eq!(record.id, "test123");
        assert_eq!(record.title, "Test Post");
        assert_eq!(record.selftext, "This is test content");
        assert_eq!(record.author, "test_user");
        assert_eq!(record.created_utc, 1640995200.0);
        assert_eq!(record.score, -4);
        assert_eq!(record.num_comments, 5);
        assert_eq!(record.subreddit, "test");
    }

    #[test]
    fn test_deleted_author_uses_sentinel() {
        let post_data: RedditPostData =
            serde_json::from_value(serde_json::json!({ "id": "x", "author": null })).unwrap();

        let record: PostRecord = post_data.into();
        assert_eq!(record.author, DELETED_AUTHOR);
        assert_eq!(record.selftext, "");
        assert_eq!(record.score, 0);
        assert_eq!(record.num_comments, 0);
        assert_eq!(record.created_utc, 0.0);
    }
}
