use crate::api::{RedditApiClient, RedditPostData, MAX_PAGE_SIZE};
use collector_core::{CoreError, PostRecord};
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub subreddit: String,
    pub limit: u32,
}

/// Cursor over the search listing. Pages are fetched only when the buffered
/// page has been drained.
struct SearchCursor<'a> {
    api: &'a RedditApiClient,
    access_token: &'a str,
    request: SearchRequest,
    buffer: VecDeque<RedditPostData>,
    after: Option<String>,
    remaining: u32,
    exhausted: bool,
}

impl<'a> SearchCursor<'a> {
    async fn next_record(&mut self) -> Option<Result<PostRecord, CoreError>> {
        loop {
            if self.remaining == 0 {
                return None;
            }
            if let Some(post) = self.buffer.pop_front() {
                self.remaining -= 1;
                return Some(Ok(post.into()));
            }
            if self.exhausted {
                return None;
            }

            let page_size = self.remaining.min(MAX_PAGE_SIZE);
            let page = self
                .api
                .search_subreddit(
                    self.access_token,
                    &self.request.subreddit,
                    &self.request.query,
                    page_size,
                    self.after.as_deref(),
                )
                .await;

            match page {
                Ok(listing) => {
                    let data = listing.data;
                    self.exhausted = data.after.is_none() || data.children.is_empty();
                    self.after = data.after;
                    self.buffer
                        .extend(data.children.into_iter().map(|child| child.data));
                    debug!(
                        "Buffered {} posts, {} still wanted",
                        self.buffer.len(),
                        self.remaining
                    );
                }
                Err(e) => {
                    error!("An error occurred while fetching posts: {}", e);
                    self.exhausted = true;
                    self.buffer.clear();
                    return Some(Err(CoreError::Fetch(e)));
                }
            }
        }
    }
}

/// Streams up to `request.limit` newest-first posts matching the query.
///
/// The stream is forward-only and ends after the first error.
pub fn search_posts<'a>(
    api: &'a RedditApiClient,
    access_token: &'a str,
    request: SearchRequest,
) -> impl Stream<Item = Result<PostRecord, CoreError>> + 'a {
    let cursor = SearchCursor {
        api,
        access_token,
        remaining: request.limit,
        request,
        buffer: VecDeque::new(),
        after: None,
        exhausted: false,
    };

    stream::unfold(cursor, |mut cursor| async move {
        let record = cursor.next_record().await?;
        Some((record, cursor))
    })
}
