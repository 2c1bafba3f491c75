use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";
const USED_HEADER: &str = "x-ratelimit-used";

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100, // Reddit allows 100 requests per minute for OAuth2
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }
}

#[derive(Debug)]
pub struct TokenBucket {
    tokens: Arc<Mutex<f64>>,
    capacity: f64,
    refill_rate: f64, // tokens per second
    last_refill: Arc<Mutex<Instant>>,
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_allowance as f64;
        let refill_rate = config.max_requests as f64 / config.time_window.as_secs_f64();

        Self {
            tokens: Arc::new(Mutex::new(capacity)),
            capacity,
            refill_rate,
            last_refill: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub async fn acquire(&self, tokens_needed: f64) -> Result<(), Duration> {
        let mut tokens = self.refill().await;
        if *tokens >= tokens_needed {
            *tokens -= tokens_needed;
            Ok(())
        } else {
            let missing = tokens_needed - *tokens;
            Err(Duration::from_secs_f64(missing / self.refill_rate))
        }
    }

    pub async fn get_available_tokens(&self) -> f64 {
        *self.refill().await
    }

    async fn refill(&self) -> tokio::sync::MutexGuard<'_, f64> {
        let now = Instant::now();
        let mut tokens = self.tokens.lock().await;
        let mut last_refill = self.last_refill.lock().await;

        let elapsed = now.duration_since(*last_refill);
        *tokens = (*tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        *last_refill = now;

        tokens
    }
}

/// Budget Reddit reports in its `x-ratelimit-*` response headers.
#[derive(Debug, Clone, Default)]
pub struct ServerBudget {
    pub remaining: Option<f64>,
    pub used: Option<u32>,
    pub reset_at: Option<Instant>,
}

impl ServerBudget {
    fn wait_time(&self, now: Instant) -> Option<Duration> {
        match (self.remaining, self.reset_at) {
            (Some(remaining), Some(reset_at)) if remaining < 1.0 && reset_at > now => {
                Some(reset_at - now)
            }
            _ => None,
        }
    }
}

/// Paces requests with a local token bucket and the server-reported budget.
#[derive(Debug)]
pub struct RateLimiter {
    token_bucket: TokenBucket,
    config: RateLimitConfig,
    server_budget: Mutex<ServerBudget>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            token_bucket: TokenBucket::new(&config),
            config,
            server_budget: Mutex::new(ServerBudget::default()),
        }
    }

    pub async fn acquire_permit(&self) -> RateLimitPermit {
        let start_time = Instant::now();

        let server_wait = self.server_budget.lock().await.wait_time(start_time);
        if let Some(wait_time) = server_wait {
            tracing::warn!("Reddit rate limit budget exhausted, waiting {:?}", wait_time);
            sleep(wait_time).await;
        }

        loop {
            match self.token_bucket.acquire(1.0).await {
                Ok(()) => break,
                Err(wait_time) => {
                    tracing::debug!("Rate limit reached, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
            }
        }

        RateLimitPermit {
            queue_wait_time: start_time.elapsed(),
        }
    }

    /// Records the budget from a response. Headers that are absent or
    /// unparsable leave the previous value in place.
    pub async fn observe_headers(&self, headers: &HeaderMap) {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        let mut budget = self.server_budget.lock().await;
        if let Some(remaining) = header(REMAINING_HEADER).and_then(|v| v.trim().parse::<f64>().ok()) {
            budget.remaining = Some(remaining);
        }
        if let Some(used) = header(USED_HEADER).and_then(|v| v.trim().parse::<u32>().ok()) {
            budget.used = Some(used);
        }
        if let Some(reset) = header(RESET_HEADER).and_then(|v| v.trim().parse::<u64>().ok()) {
            budget.reset_at = Some(Instant::now() + Duration::from_secs(reset));
        }
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        let available_tokens = self.token_bucket.get_available_tokens().await;
        let budget = self.server_budget.lock().await.clone();
        let now = Instant::now();

        RateLimitStatus {
            available_tokens: available_tokens as u32,
            max_tokens: self.config.burst_allowance,
            requests_per_minute: self.config.max_requests,
            server_remaining: budget.remaining,
            server_used: budget.used,
            server_reset_in: budget
                .reset_at
                .map(|reset_at| reset_at.saturating_duration_since(now)),
            is_near_limit: available_tokens < (self.config.burst_allowance as f64 * 0.2)
                || budget.remaining.is_some_and(|remaining| remaining < 1.0),
        }
    }
}

#[derive(Debug)]
pub struct RateLimitPermit {
    pub queue_wait_time: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub available_tokens: u32,
    pub max_tokens: u32,
    pub requests_per_minute: u32,
    pub server_remaining: Option<f64>,
    pub server_used: Option<u32>,
    pub server_reset_in: Option<Duration>,
    pub is_near_limit: bool,
}
