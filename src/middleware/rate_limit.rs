use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    cache::{KvStore, RateLimitCacheOperations},
    config::Config,
    error::AppError,
};

/// 按客户端 IP 的固定窗口限流
#[derive(Clone)]
pub struct RateLimiter {
    kv: Arc<dyn KvStore>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(kv: Arc<dyn KvStore>, config: &Config) -> Self {
        Self {
            kv,
            window: config.rate_limit_window(),
            max_requests: config.rate_limit_requests,
        }
    }

    pub async fn check_rate_limit(&self, req: Request<Body>, next: Next) -> Result<Response, AppError> {
        let ip = client_ip(&req);
        let count = RateLimitCacheOperations::hit(&self.kv, &ip, self.window).await?;

        if count > i64::from(self.max_requests) {
            tracing::warn!(%ip, count, "rate limit exceeded");
            return Err(AppError::RateLimited(format!(
                "请求过于频繁，请在{}秒后重试",
                self.window.as_secs()
            )));
        }

        Ok(next.run(req).await)
    }
}

/// 优先取代理头，最后退回到连接地址
fn client_ip(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    limiter.check_rate_limit(req, next).await
}
