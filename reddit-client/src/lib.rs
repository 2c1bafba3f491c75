pub mod api;
pub mod auth;
pub mod rate_limiter;
pub mod search;


pub use api::{RedditApiClient, RedditPostData, RedditUserData};
pub use auth::{RedditEndpoints, RedditToken};
pub use rate_limiter::RateLimitStatus;
pub use search::SearchRequest;

use collector_core::{CoreError, Credentials, PostRecord, RedditApiError};
use futures::Stream;
use tracing::{error, info, warn};

/// An authenticated handle on the Reddit API for one account.
#[derive(Debug)]
pub struct RedditSession {
    api: RedditApiClient,
    token: RedditToken,
    user: RedditUserData,
}

impl RedditSession {
    /// Obtains a token with the password grant and confirms it with one
    /// identity call. A single attempt is made.
    pub async fn login_with(
        credentials: &Credentials,
        endpoints: RedditEndpoints,
    ) -> Result<Self, CoreError> {
        info!("Authenticating with Reddit API...");
        let api = RedditApiClient::new(&credentials.user_agent, &endpoints.api_base)?;

        let token = auth::request_password_token(api.http_client(), &endpoints, credentials)
            .await
            .map_err(authentication_error)?;

        let user = api
            .get_user_info(&token.access_token)
            .await
            .map_err(authentication_error)?;

        info!("Authentication successful. Logged in as u/{}", user.name);
        Ok(Self { api, token, user })
    }

    pub fn username(&self) -> &str {
        &self.user.name
    }

    pub fn token(&self) -> &RedditToken {
        &self.token
    }

    /// Lazily searches `subreddit` for `query`, newest first, yielding at
    /// most `limit` records.
    pub fn search(
        &self,
        query: &str,
        subreddit: &str,
        limit: u32,
    ) -> impl Stream<Item = Result<PostRecord, CoreError>> + '_ {
        if self.token.is_expired() {
            warn!("Access token has expired; Reddit will reject the search");
        }

        search::search_posts(
            &self.api,
            &self.token.access_token,
            SearchRequest {
                query: query.to_string(),
                subreddit: subreddit.to_string(),
                limit,
            },
        )
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        self.api.get_rate_limit_status().await
    }
}

fn authentication_error(e: RedditApiError) -> CoreError {
    error!("Failed to authenticate with Reddit: {}", e);
    CoreError::Authentication(e)
}
