// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::TokioResolver;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use super::{DnsProbe, TxtLookup};
use crate::dns_cache::DnsCache;
use crate::errors::{NetworkError, ScannerError, ScannerResult};

pub struct HickoryDnsProbe {
    resolver: TokioResolver,
    timeout: Duration,
    cache: Option<Arc<DnsCache>>,
}

impl HickoryDnsProbe {
    /// System resolver, or a single upstream when `dns_server` is given
    pub fn new(dns_server: Option<SocketAddr>, lookup_timeout: Duration) -> ScannerResult<Self> {
        let resolver = if let Some(server) = dns_server {
            let mut resolver_config = ResolverConfig::new();
            resolver_config.add_name_server(NameServerConfig::new(server, Protocol::Udp));
            resolver_config.add_name_server(NameServerConfig::new(server, Protocol::Tcp));

            TokioResolver::builder_with_config(resolver_config, TokioConnectionProvider::default())
                .build()
        } else {
            TokioResolver::builder(TokioConnectionProvider::default())
                .map_err(|e| {
                    ScannerError::Configuration(format!("Failed to create resolver: {}", e))
                })?
                .build()
        };

        Ok(Self {
            resolver,
            timeout: lookup_timeout,
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: Arc<DnsCache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

#[async_trait]
impl DnsProbe for HickoryDnsProbe {
    async fn txt_records(&self, name: &str) -> TxtLookup {
        if let Some(cache) = &self.cache {
            if let Some(records) = cache.txt(name).await {
                return if records.is_empty() {
                    TxtLookup::Absent
                } else {
                    TxtLookup::Found(records.as_ref().clone())
                };
            }
        }

        let records = match timeout(self.timeout, self.resolver.txt_lookup(name)).await {
            Ok(Ok(response)) => response
                .iter()
                .map(|txt| {
                    txt.iter()
                        .map(|segment| String::from_utf8_lossy(segment).into_owned())
                        .collect::<String>()
                })
                .collect::<Vec<_>>(),
            Ok(Err(e)) => {
                debug!(name, outcome = "absent", error = %e, "TXT lookup returned no records");
                Vec::new()
            }
            Err(_) => {
                debug!(
                    name,
                    outcome = "timeout",
                    timeout_ms = self.timeout.as_millis() as u64,
                    "TXT lookup timed out"
                );
                return TxtLookup::TimedOut;
            }
        };

        if let Some(cache) = &self.cache {
            cache.store_txt(name, records.clone()).await;
        }

        if records.is_empty() {
            TxtLookup::Absent
        } else {
            debug!(name, count = records.len(), "TXT records found");
            TxtLookup::Found(records)
        }
    }

    async fn resolve_ip(&self, host: &str) -> ScannerResult<IpAddr> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }

        if let Some(cache) = &self.cache {
            if let Some(ip) = cache.addr(host).await {
                return Ok(ip);
            }
        }

        let lookup = match timeout(self.timeout, self.resolver.lookup_ip(host)).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => {
                return Err(NetworkError::DnsResolutionFailed {
                    host: host.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
            Err(_) => {
                debug!(host, outcome = "timeout", "Address lookup timed out");
                return Err(NetworkError::ConnectionTimeout {
                    url: host.to_string(),
                    timeout: self.timeout,
                }
                .into());
            }
        };

        let ip = lookup
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| lookup.iter().next())
            .ok_or_else(|| NetworkError::DnsResolutionFailed {
                host: host.to_string(),
                reason: "no A or AAAA records".to_string(),
            })?;

        if let Some(cache) = &self.cache {
            cache.store_addr(host, ip).await;
        }

        debug!(host, %ip, "Resolved target address");
        Ok(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ip_literal_skips_resolver() {
        let probe = HickoryDnsProbe::new(
            Some("127.0.0.1:53".parse().unwrap()),
            Duration::from_millis(50),
        )
        .unwrap();

        let ip = probe.resolve_ip("192.0.2.7").await.unwrap();
        assert_eq!(ip, "192.0.2.7".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_cached_txt_answer_is_served() {
        let cache = Arc::new(DnsCache::new());
        cache
            .store_txt("example.test", vec!["v=spf1 -all".to_string()])
            .await;
        cache.store_txt("_dmarc.example.test", Vec::new()).await;

        let probe = HickoryDnsProbe::new(
            Some("127.0.0.1:53".parse().unwrap()),
            Duration::from_millis(50),
        )
        .unwrap()
        .with_cache(cache);

        assert_eq!(
            probe.txt_records("example.test").await,
            TxtLookup::Found(vec!["v=spf1 -all".to_string()])
        );
        assert_eq!(probe.txt_records("_dmarc.example.test").await, TxtLookup::Absent);
    }
}
