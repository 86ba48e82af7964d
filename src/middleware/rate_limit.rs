use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::{broadcast, Mutex};

use crate::response::AppError;
use crate::state::AppState;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    hits: u64,
}

/// Fixed-window request counter keyed by client IP.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u64,
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    pub reset_after_secs: u64,
}

impl RateLimiter {
    pub fn new(window_secs: u64, max_requests: u64) -> Self {
        Self {
            window: Duration::from_secs(window_secs.max(1)),
            max_requests,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }

    pub async fn check(&self, ip: IpAddr) -> RateLimitDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let window = windows.entry(ip).or_insert(Window {
            started_at: now,
            hits: 0,
        });

        if now.duration_since(window.started_at) >= self.window {
            *window = Window {
                started_at: now,
                hits: 0,
            };
        }

        let allowed = window.hits < self.max_requests;
        if allowed {
            window.hits += 1;
        }

        let elapsed = now.duration_since(window.started_at);
        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(window.hits),
            reset_after_secs: self.window.saturating_sub(elapsed).as_secs(),
        }
    }

    /// Drops windows that expired at least one full window ago.
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        let retention = self.window.saturating_mul(2);
        windows.retain(|_, w| now.duration_since(w.started_at) <= retention);
        before - windows.len()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.len()
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let ip = extract_client_ip(req.headers(), peer, state.config().trust_proxy);
    let decision = state.rate_limiter().check(ip).await;

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        tracing::warn!(client_ip = %ip, limit = decision.limit, "Rate limit exceeded");
        let mut rejected = AppError::too_many_requests("Too many requests").into_response();
        insert_header(&mut rejected, "retry-after", decision.reset_after_secs.max(1));
        rejected
    };

    insert_header(&mut response, "ratelimit-limit", decision.limit);
    insert_header(&mut response, "ratelimit-remaining", decision.remaining);
    insert_header(&mut response, "ratelimit-reset", reset_at_epoch(decision.reset_after_secs));
    response
}

fn insert_header(response: &mut Response, name: &'static str, value: u64) {
    if let Ok(v) = HeaderValue::from_str(&value.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(name), v);
    }
}

fn reset_at_epoch(reset_after_secs: u64) -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .saturating_add(reset_after_secs)
}

/// Client address for rate limiting. Proxy headers (`x-forwarded-for`, then
/// `x-real-ip`) are only read behind a trusted proxy; otherwise the socket
/// peer address is used.
pub fn extract_client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy: bool) -> IpAddr {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    trust_proxy
        .then(|| header_ip("x-forwarded-for").or_else(|| header_ip("x-real-ip")))
        .flatten()
        .or(peer)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub async fn rate_limit_cleanup_loop(
    limiter: RateLimiter,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let removed = limiter.cleanup().await;
                if removed > 0 {
                    tracing::debug!(removed, "Expired rate limit windows pruned");
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }
}
