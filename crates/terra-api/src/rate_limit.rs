//! Per-client-IP token bucket.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Tracked clients before pruning kicks in.
const MAX_TRACKED_CLIENTS: usize = 10_000;
/// Minimum spacing between two prune passes.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

const X_FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Burst size: requests a fresh client may make at once.
    pub capacity: f64,
    /// Time to refill an empty bucket.
    pub window: Duration,
    /// Key clients by the address the first proxy in front of us appended to
    /// `X-Forwarded-For` instead of the TCP peer.
    pub trust_proxy: bool,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            capacity: f64::from(max_requests.max(1)),
            window,
            trust_proxy: false,
        }
    }

    pub fn trust_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }

    fn refill_per_sec(&self) -> f64 {
        let secs = self.window.as_secs_f64();
        if secs <= 0.0 {
            f64::INFINITY
        } else {
            self.capacity / secs
        }
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

struct Buckets {
    clients: HashMap<IpAddr, Bucket>,
    last_prune: Instant,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    max_clients: usize,
    buckets: Mutex<Buckets>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            max_clients: MAX_TRACKED_CLIENTS,
            buckets: Mutex::new(Buckets {
                clients: HashMap::new(),
                last_prune: Instant::now(),
            }),
        }
    }

    pub fn allow(&self, ip: IpAddr) -> bool {
        self.allow_at(ip, Instant::now())
    }

    fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        let cfg = &self.config;
        let Ok(mut buckets) = self.buckets.lock() else {
            warn!("rate limiter lock poisoned; allowing request");
            return true;
        };

        if buckets.clients.len() > self.max_clients
            && now.duration_since(buckets.last_prune) >= PRUNE_INTERVAL
        {
            buckets.last_prune = now;
            self.prune(&mut buckets.clients, now);
        }

        let bucket = buckets.clients.entry(ip).or_insert_with(|| Bucket {
            tokens: cfg.capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * cfg.refill_per_sec()).min(cfg.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop buckets that have refilled completely, then, if still over the
    /// cap, the least recently seen clients down to half the cap.
    fn prune(&self, clients: &mut HashMap<IpAddr, Bucket>, now: Instant) {
        let cfg = &self.config;
        let refill = cfg.refill_per_sec();
        clients.retain(|_, b| {
            b.tokens + now.duration_since(b.last_refill).as_secs_f64() * refill < cfg.capacity
        });

        if clients.len() > self.max_clients {
            let mut by_age: Vec<(Instant, IpAddr)> =
                clients.iter().map(|(ip, b)| (b.last_refill, *ip)).collect();
            by_age.sort_unstable();
            let excess = clients.len() - self.max_clients / 2;
            for (_, ip) in by_age.into_iter().take(excess) {
                clients.remove(&ip);
            }
        }
        debug!("Rate limiter pruned to {} clients", clients.len());
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.buckets.lock().map(|b| b.clients.len()).unwrap_or(0)
    }
}

/// The address a request is limited under. With `trust_proxy`, the last
/// `X-Forwarded-For` hop (the one our proxy appended) wins over the peer.
fn client_ip(req: &Request, trust_proxy: bool) -> Option<IpAddr> {
    if trust_proxy {
        let forwarded = req
            .headers()
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .last()
            .and_then(|hop| hop.trim().parse().ok());
        if forwarded.is_some() {
            return forwarded;
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Middleware rejecting over-limit clients with 429. Requests with no
/// resolvable client address pass through.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(ip) = client_ip(&req, limiter.config.trust_proxy) {
        if !limiter.allow(ip) {
            debug!("Rate limit exceeded for {}", ip);
            return Err(ApiError::TooManyRequests);
        }
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;
    use std::net::Ipv4Addr;

    fn limiter(max: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig::new(max, Duration::from_secs(window_secs)))
    }

    fn ip(n: u32) -> IpAddr {
        IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + n))
    }

    fn request(peer: &str, forwarded: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/api/health");
        if let Some(forwarded) = forwarded {
            builder = builder.header(X_FORWARDED_FOR, forwarded);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        req
    }

    #[test]
    fn burst_then_reject() {
        let limiter = limiter(3, 60);
        let now = Instant::now();

        assert!(limiter.allow_at(ip(1), now));
        assert!(limiter.allow_at(ip(1), now));
        assert!(limiter.allow_at(ip(1), now));
        assert!(!limiter.allow_at(ip(1), now));
    }

    #[test]
    fn clients_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(limiter.allow_at(ip(1), now));
        assert!(!limiter.allow_at(ip(1), now));
        assert!(limiter.allow_at(ip(2), now));
    }

    #[test]
    fn tokens_refill_over_the_window() {
        let limiter = limiter(2, 10);
        let client = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let start = Instant::now();

        assert!(limiter.allow_at(client, start));
        assert!(limiter.allow_at(client, start));
        assert!(!limiter.allow_at(client, start));

        // 2 tokens per 10s: one token back after 5s.
        let later = start + Duration::from_secs(5);
        assert!(limiter.allow_at(client, later));
        assert!(!limiter.allow_at(client, later));
    }

    #[test]
    fn busy_clients_are_evicted_past_the_cap() {
        let mut limiter = limiter(10, 3600);
        limiter.max_clients = 4;
        let start = Instant::now();

        // None of these buckets refills within the test, so only the cap evicts.
        for n in 0..6 {
            assert!(limiter.allow_at(ip(n), start + Duration::from_millis(u64::from(n))));
        }
        assert_eq!(limiter.tracked(), 6);

        // Within the interval nothing is scanned.
        limiter.allow_at(ip(100), start + Duration::from_secs(1));
        assert_eq!(limiter.tracked(), 7);

        // Oldest five go, leaving half the cap plus the new arrival.
        let later = start + PRUNE_INTERVAL + Duration::from_secs(1);
        assert!(limiter.allow_at(ip(200), later));
        assert_eq!(limiter.tracked(), 3);

        // A survivor keeps its spent token; an evicted client starts fresh.
        let mut spent = RateLimiter::new(RateLimitConfig::new(1, Duration::from_secs(3600)));
        spent.max_clients = 1;
        assert!(spent.allow_at(ip(1), start));
        assert!(spent.allow_at(ip(2), start + Duration::from_secs(1)));
        assert!(spent.allow_at(ip(3), later));
        assert!(!spent.allow_at(ip(3), later));
        assert!(spent.allow_at(ip(1), later));
    }

    #[test]
    fn idle_full_buckets_are_pruned_first() {
        let mut limiter = limiter(5, 10);
        limiter.max_clients = 2;
        let start = Instant::now();

        for n in 0..3 {
            limiter.allow_at(ip(n), start);
        }
        // After a full window every bucket is back to capacity.
        let later = start + PRUNE_INTERVAL;
        limiter.allow_at(ip(9), later);
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn peer_address_is_used_by_default() {
        let req = request("192.0.2.10:4000", Some("203.0.113.5"));
        assert_eq!(client_ip(&req, false), "192.0.2.10".parse().ok());
    }

    #[test]
    fn trusted_proxy_uses_last_forwarded_hop() {
        let req = request("10.0.0.1:4000", Some("198.51.100.7, 203.0.113.5"));
        assert_eq!(client_ip(&req, true), "203.0.113.5".parse().ok());

        // Unparseable header falls back to the peer.
        let req = request("10.0.0.1:4000", Some("unknown"));
        assert_eq!(client_ip(&req, true), "10.0.0.1".parse().ok());

        let req = request("10.0.0.1:4000", None);
        assert_eq!(client_ip(&req, true), "10.0.0.1".parse().ok());
    }

    #[test]
    fn clients_behind_one_proxy_get_separate_buckets() {
        let limiter = limiter(1, 60);
        let trust = |forwarded| client_ip(&request("10.0.0.1:4000", Some(forwarded)), true);

        assert!(limiter.allow(trust("203.0.113.5").unwrap()));
        assert!(limiter.allow(trust("203.0.113.6").unwrap()));
        assert!(!limiter.allow(trust("203.0.113.5").unwrap()));

        let peer = |forwarded| client_ip(&request("10.0.0.1:4000", Some(forwarded)), false);
        assert!(limiter.allow(peer("203.0.113.7").unwrap()));
        assert!(!limiter.allow(peer("203.0.113.8").unwrap()));
    }
}
