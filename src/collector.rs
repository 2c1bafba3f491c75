use crate::cli::Args;
use crate::writer::{output_filename, save_to_json};
use chrono::Local;
use collector_core::{report_critical, ConfigError, CoreError, Credentials, ErrorExt, PostRecord};
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reddit_client::{RedditEndpoints, RedditSession};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One collection run's inputs.
#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub query: String,
    pub subreddit: String,
    pub limit: u32,
    pub output_dir: PathBuf,
}

impl From<Args> for CollectRequest {
    fn from(args: Args) -> Self {
        Self {
            query: args.query,
            subreddit: args.subreddit,
            limit: args.limit,
            output_dir: args.output_dir,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Saved { path: PathBuf, count: usize },
    NoResults,
}

/// Runs `load` and logs a configuration failure before handing it back.
pub fn load_credentials(
    load: impl FnOnce() -> Result<Credentials, ConfigError>,
) -> Result<Credentials, CoreError> {
    load().map_err(|e| {
        e.log_error();
        CoreError::from(e)
    })
}

/// Authenticates, fetches every matching post and writes them out.
///
/// Nothing is written when the search is empty or any step fails.
pub async fn collect(
    request: &CollectRequest,
    credentials: &Credentials,
    endpoints: RedditEndpoints,
) -> Result<Outcome, CoreError> {
    let session = RedditSession::login_with(credentials, endpoints).await?;

    let posts = fetch_posts(&session, request).await?;
    if posts.is_empty() {
        warn!("No posts found for the given query. Exiting.");
        return Ok(Outcome::NoResults);
    }

    let filename = output_filename(
        &request.query,
        &request.subreddit,
        &Local::now().naive_local(),
    );
    let path = request.output_dir.join(filename);
    save_to_json(&posts, &path)?;

    Ok(Outcome::Saved {
        path,
        count: posts.len(),
    })
}

async fn fetch_posts(
    session: &RedditSession,
    request: &CollectRequest,
) -> Result<Vec<PostRecord>, CoreError> {
    info!(
        "Searching for '{}' in r/{} (limit: {})...",
        request.query, request.subreddit, request.limit
    );

    let progress = ProgressBar::new(u64::from(request.limit));
    progress.set_style(
        ProgressStyle::with_template("Fetching posts {wide_bar} {pos}/{len} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let result: Result<Vec<PostRecord>, CoreError> = session
        .search(&request.query, &request.subreddit, request.limit)
        .inspect_ok(|_| progress.inc(1))
        .try_collect()
        .await;

    match result {
        Ok(posts) => {
            progress.finish_and_clear();
            info!("Fetched {} posts", posts.len());
            debug!("Rate limit status: {:?}", session.get_rate_limit_status().await);
            Ok(posts)
        }
        Err(e) => {
            progress.abandon();
            Err(e)
        }
    }
}

/// Logs the run's outcome and turns it into a process exit status.
pub fn exit_status(result: &Result<Outcome, CoreError>) -> u8 {
    match result {
        Ok(Outcome::Saved { path, count }) => {
            info!("Collected {} posts into {}", count, path.display());
            0
        }
        Ok(Outcome::NoResults) => 0,
        Err(e) => {
            report_critical(e);
            e.exit_code()
        }
    }
}
