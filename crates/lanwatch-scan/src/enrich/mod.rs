//! Identity enrichers: hostname, vendor, NetBIOS, and OS resolution.
//!
//! Four independent resolvers, each individually toggled by config and
//! each with its own process-lifetime cache. Caches memoize external,
//! rarely-changing facts and store misses too: a resolver that failed for
//! an address is never retried within the process lifetime.

pub mod hostname;
pub mod netbios;
pub mod os;
pub mod vendor;

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::EnrichConfig;

type Cache<K> = Mutex<HashMap<K, Option<String>>>;

/// The enriched identity fields for one address.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub hostname: Option<String>,
    pub vendor: Option<String>,
    pub netbios: Option<String>,
    pub os_guess: Option<String>,
}

/// Resolver set with per-resolver caches.
pub struct Enrichers {
    config: EnrichConfig,
    rdns_cache: Cache<Ipv4Addr>,
    link_local_cache: Cache<Ipv4Addr>,
    vendor_cache: Cache<String>,
    netbios_cache: Cache<Ipv4Addr>,
    os_cache: Cache<Ipv4Addr>,
}

impl Enrichers {
    pub fn new(config: EnrichConfig) -> Self {
        Self {
            config,
            rdns_cache: Cache::default(),
            link_local_cache: Cache::default(),
            vendor_cache: Cache::default(),
            netbios_cache: Cache::default(),
            os_cache: Cache::default(),
        }
    }

    /// Resolve all enabled identity fields for one address. The four
    /// resolvers run concurrently; each failure degrades to `None` for
    /// its field only.
    pub async fn enrich(&self, ip: Ipv4Addr, mac: Option<&str>) -> Enrichment {
        let (hostname, vendor, netbios, os_guess) = tokio::join!(
            self.hostname_for(ip),
            self.vendor_for(mac),
            self.netbios_for(ip),
            self.os_guess_for(ip),
        );
        Enrichment {
            hostname,
            vendor,
            netbios,
            os_guess,
        }
    }

    /// Reverse DNS first, link-local resolution on miss. Both cached
    /// separately.
    async fn hostname_for(&self, ip: Ipv4Addr) -> Option<String> {
        if self.config.reverse_dns {
            let resolved = memoized(&self.rdns_cache, ip, hostname::reverse_dns(ip)).await;
            if resolved.is_some() {
                return resolved;
            }
        }
        if self.config.link_local {
            let timeout = Duration::from_millis(self.config.link_local_timeout_ms);
            return memoized(
                &self.link_local_cache,
                ip,
                hostname::link_local(&self.config.avahi_path, ip, timeout),
            )
            .await;
        }
        None
    }

    /// Pure local OUI lookup, cached by lower-cased link address.
    async fn vendor_for(&self, mac: Option<&str>) -> Option<String> {
        let mac = mac?.to_ascii_lowercase();
        if let Some(cached) = self.vendor_cache.lock().await.get(&mac) {
            return cached.clone();
        }
        let found = vendor::lookup(&mac);
        self.vendor_cache.lock().await.insert(mac, found.clone());
        found
    }

    async fn netbios_for(&self, ip: Ipv4Addr) -> Option<String> {
        if !self.config.netbios {
            return None;
        }
        let timeout = Duration::from_millis(self.config.tool_timeout_ms);
        memoized(
            &self.netbios_cache,
            ip,
            netbios::lookup(&self.config.nmblookup_path, ip, timeout),
        )
        .await
    }

    async fn os_guess_for(&self, ip: Ipv4Addr) -> Option<String> {
        if !self.config.os_fingerprint {
            return None;
        }
        let timeout = Duration::from_millis(self.config.tool_timeout_ms);
        memoized(
            &self.os_cache,
            ip,
            os::fingerprint(&self.config.nmap_path, ip, timeout),
        )
        .await
    }
}

/// Cache-through resolution: a hit (positive or negative) answers without
/// awaiting the resolver; a miss resolves once and records the outcome
/// permanently. The lock is never held across the resolver await.
async fn memoized<K, Fut>(cache: &Cache<K>, key: K, resolve: Fut) -> Option<String>
where
    K: Eq + Hash + Clone,
    Fut: Future<Output = Option<String>>,
{
    if let Some(cached) = cache.lock().await.get(&key) {
        return cached.clone();
    }
    let value = resolve.await;
    cache.lock().await.insert(key, value.clone());
    value
}
