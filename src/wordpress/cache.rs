//! Short-lived reuse of successful WordPress responses.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use crate::constants::{DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECS};

/// Whether a request may be answered from the freshness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Reuse a response younger than the cache TTL.
    Revalidate,
    /// Always go to the network and never store the result.
    NoStore,
}

/// A successful response as received: raw body plus pagination headers.
///
/// The body is kept undecoded so a cached answer parses to exactly what the
/// original fetch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub body: Vec<u8>,
    pub total: u32,
    pub total_pages: u32,
}

/// URL-keyed response cache with a fixed TTL and a bounded number of entries.
///
/// Request URLs are partly caller-controlled (page, filters), so the entry
/// count is capped and the least useful entries are evicted past it.
pub struct ResponseCache {
    entries: Option<Cache<String, Arc<RawResponse>>>,
    ttl: Duration,
    max_entries: u64,
}

impl ResponseCache {
    /// Create a cache whose entries live for `ttl`, holding at most
    /// `max_entries`. A zero TTL or zero capacity disables caching.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let entries = (!ttl.is_zero() && max_entries > 0).then(|| {
            Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build()
        });

        Self {
            entries,
            ttl,
            max_entries,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// A still-fresh response for `url`.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<Arc<RawResponse>> {
        self.entries.as_ref()?.get(url)
    }

    pub fn insert(&self, url: String, response: Arc<RawResponse>) {
        if let Some(entries) = &self.entries {
            entries.insert(url, response);
        }
    }

    /// Number of live entries, after applying pending evictions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| {
            entries.run_pending_tasks();
            usize::try_from(entries.entry_count()).unwrap_or(usize::MAX)
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.invalidate_all();
            entries.run_pending_tasks();
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            DEFAULT_CACHE_MAX_ENTRIES,
        )
    }
}
