// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - DNS Caching Module
 * Short-lived cache of TXT answers and address lookups shared by worker scans
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use moka::future::Cache;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default TTL for cached answers (5 minutes)
const DEFAULT_DNS_TTL: u64 = 300;

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Answer cache. Only definite answers are stored; timeouts never are,
/// so a slow resolver is asked again on the next scan.
pub struct DnsCache {
    txt: Cache<String, Arc<Vec<String>>>,
    addrs: Cache<String, IpAddr>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DnsCache {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_MAX_CAPACITY, DEFAULT_DNS_TTL)
    }

    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let ttl = Duration::from_secs(ttl_secs);

        debug!(max_capacity, ttl_secs, "DNS cache initialized");

        Self {
            txt: Cache::builder().max_capacity(max_capacity).time_to_live(ttl).build(),
            addrs: Cache::builder().max_capacity(max_capacity).time_to_live(ttl).build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached TXT strings for `name`; an empty list means "no records"
    pub async fn txt(&self, name: &str) -> Option<Arc<Vec<String>>> {
        let key = name.to_ascii_lowercase();
        let found = self.txt.get(&key).await;
        self.record(found.is_some());
        found
    }

    pub async fn store_txt(&self, name: &str, records: Vec<String>) {
        self.txt.insert(name.to_ascii_lowercase(), Arc::new(records)).await;
    }

    pub async fn addr(&self, host: &str) -> Option<IpAddr> {
        let found = self.addrs.get(&host.to_ascii_lowercase()).await;
        self.record(found.is_some());
        found
    }

    pub async fn store_addr(&self, host: &str, ip: IpAddr) {
        self.addrs.insert(host.to_ascii_lowercase(), ip).await;
    }

    fn record(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        self.txt.invalidate_all();
        self.addrs.invalidate_all();
        self.txt.run_pending_tasks().await;
        self.addrs.run_pending_tasks().await;
    }

    pub async fn size(&self) -> u64 {
        self.txt.run_pending_tasks().await;
        self.addrs.run_pending_tasks().await;
        self.txt.entry_count() + self.addrs.entry_count()
    }

    pub fn stats(&self) -> DnsCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        DnsCacheStats {
            hits,
            misses,
            hit_rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DnsCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_txt_round_trip_is_case_insensitive() {
        let cache = DnsCache::new();
        assert!(cache.txt("Example.com").await.is_none());

        cache
            .store_txt("Example.com", vec!["v=spf1 -all".to_string()])
            .await;
        let cached = cache.txt("example.com").await.unwrap();
        assert_eq!(cached.as_slice(), ["v=spf1 -all".to_string()]);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_empty_answer_is_cached() {
        let cache = DnsCache::new();
        cache.store_txt("_dmarc.example.com", Vec::new()).await;
        let cached = cache.txt("_dmarc.example.com").await.unwrap();
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = DnsCache::new();
        cache.store_addr("localhost", IpAddr::from([127, 0, 0, 1])).await;
        assert_eq!(cache.size().await, 1);

        cache.clear().await;
        assert_eq!(cache.size().await, 0);
    }
}
