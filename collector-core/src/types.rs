use serde::{Deserialize, Serialize};

/// Author name Reddit reports for posts whose account was deleted.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Scope that searches every subreddit.
pub const ALL_SUBREDDITS: &str = "all";

/// One normalized search result, serialized verbatim into the result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub author: String,
    pub created_utc: f64,
    pub score: i64,
    pub url: String,
    pub num_comments: u64,
    pub subreddit: String,
}
