use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::api::{DiscussionApi, DiscussionResponse};
use crate::error::ApiResult;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a fetched transcript counts as fresh.
    pub stale_time: Duration,
    /// Extra attempts after the first failure.
    pub retry: u32,
    /// Base of the exponential backoff between attempts.
    pub retry_delay: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(30),
            retry: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl QueryOptions {
    /// Backoff before retry number `attempt` (0-based), capped at 30s.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

struct CacheEntry {
    data: DiscussionResponse,
    fetched_at: Instant,
}

/// Transcript cache keyed by discussion id, shared by every sync instance
/// so switching back to a room within the freshness window skips the network.
#[derive(Clone, Default)]
pub struct QueryCache {
    options: QueryOptions,
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl QueryCache {
    pub fn new(options: QueryOptions) -> Self {
        Self {
            options,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// Returns the cached transcript if it is still fresh.
    pub fn cached(&self, key: &str) -> Option<DiscussionResponse> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.options.stale_time)
            .map(|entry| entry.data.clone())
    }

    pub fn store(&self, key: &str, data: DiscussionResponse) {
        self.entries.lock().insert(
            key.to_string(),
            CacheEntry {
                data,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    /// Fetches from the service, retrying any failure up to
    /// `options.retry` times, and caches the result on success.
    pub async fn fetch(&self, api: &dyn DiscussionApi, key: &str) -> ApiResult<DiscussionResponse> {
        let mut attempt = 0;
        loop {
            match api.fetch_discussion(key).await {
                Ok(data) => {
                    self.store(key, data.clone());
                    return Ok(data);
                }
                Err(err) if attempt < self.options.retry => {
                    let delay = self.options.backoff(attempt);
                    tracing::warn!(
                        discussion = key,
                        attempt = attempt + 1,
                        ?delay,
                        "discussion fetch failed, retrying: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
