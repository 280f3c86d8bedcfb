use crate::config::RateLimitConfig;
use crate::models::ErrorBody;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, HttpResponse};
use std::collections::HashMap;
use std::future::{Ready, ready};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::warn;

pub const REJECTION_MESSAGE: &str = "Too many requests from this IP, please try again later.";

const HEADER_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const HEADER_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Calls between sweeps of expired windows.
const PRUNE_EVERY: u32 = 1024;

#[derive(Debug, Default)]
struct Windows {
    by_client: HashMap<String, Window>,
    calls_since_prune: u32,
}

/// Fixed-window request counter keyed by client address.
///
/// Clones share the same counters, so one limiter created before the server
/// starts covers every worker.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    config: Arc<RateLimitConfig>,
    windows: Arc<Mutex<Windows>>,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config: Arc::new(config),
            windows: Arc::new(Mutex::new(Windows::default())),
        }
    }

    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Decision {
        let limit = self.config.max_requests;
        let window = self.config.window;
        // A poisoned map only means another request panicked mid-update; the
        // counters are still usable.
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        windows.calls_since_prune += 1;
        if windows.calls_since_prune >= PRUNE_EVERY {
            windows
                .by_client
                .retain(|_, w| now.duration_since(w.started) < window);
            windows.calls_since_prune = 0;
        }

        let entry = windows
            .by_client
            .entry(client.to_string())
            .or_insert(Window {
                started: now,
                count: 0,
            });
        if now.duration_since(entry.started) >= window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= limit {
            return Decision {
                allowed: false,
                limit,
                remaining: 0,
            };
        }

        entry.count += 1;
        Decision {
            allowed: true,
            limit,
            remaining: limit - entry.count,
        }
    }

    /// Client key for a request: the socket peer IP, or the forwarded client
    /// address when the limiter is configured to trust a proxy.
    fn client_key(&self, req: &ServiceRequest) -> String {
        if self.config.trust_proxy {
            if let Some(addr) = req.connection_info().realip_remote_addr() {
                return addr.to_string();
            }
        }
        req.peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .by_client
            .len()
    }
}

/// # Rate Limit Middleware
///
/// Wraps a scope and rejects clients exceeding the configured number of
/// requests per window with `429 Too Many Requests` and the standard failure
/// envelope. Passing responses carry `X-RateLimit-Limit` and
/// `X-RateLimit-Remaining`.
///
/// Clients are identified by the socket peer IP, falling back to `"unknown"`
/// when it is not available. Forwarding headers are only honoured when
/// [`RateLimitConfig::trust_proxy`] is set.
pub struct RateLimit {
    limiter: FixedWindowLimiter,
}

impl RateLimit {
    pub fn new(limiter: FixedWindowLimiter) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service,
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: S,
    limiter: FixedWindowLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = self.limiter.client_key(&req);
        let decision = self.limiter.check(&client);

        if !decision.allowed {
            warn!(client = %client, path = %req.path(), "rate limit exceeded");
            let response = HttpResponse::TooManyRequests()
                .insert_header((HEADER_LIMIT, decision.limit))
                .insert_header((HEADER_REMAINING, 0u32))
                .json(ErrorBody::new(REJECTION_MESSAGE))
                .map_into_right_body();
            return Box::pin(async move { Ok::<_, Error>(req.into_response(response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?.map_into_left_body();
            let headers = res.headers_mut();
            headers.insert(HEADER_LIMIT, HeaderValue::from(decision.limit));
            headers.insert(HEADER_REMAINING, HeaderValue::from(decision.remaining));
            Ok::<_, Error>(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, web};
    use std::net::SocketAddr;
    use std::time::Duration;

    fn limiter(max_requests: u32, window: Duration) -> FixedWindowLimiter {
        FixedWindowLimiter::new(RateLimitConfig {
            max_requests,
            window,
            ..RateLimitConfig::default()
        })
    }

    #[test]
    fn test_rejects_after_limit_within_window() {
        let limiter = limiter(3, Duration::from_secs(60));
        let now = Instant::now();

        let remaining: Vec<u32> = (0..3)
            .map(|_| limiter.check_at("1.2.3.4", now).remaining)
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let rejected = limiter.check_at("1.2.3.4", now);
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
    }

    #[test]
    fn test_clients_counted_separately() {
        let limiter = limiter(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check_at("1.1.1.1", now).allowed);
        assert!(limiter.check_at("2.2.2.2", now).allowed);
        assert!(!limiter.check_at("1.1.1.1", now).allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = limiter(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("1.1.1.1", start).allowed);
        assert!(!limiter.check_at("1.1.1.1", start + Duration::from_secs(59)).allowed);
        assert!(limiter.check_at("1.1.1.1", start + Duration::from_secs(60)).allowed);
    }

    #[test]
    fn test_expired_windows_swept_periodically() {
        let limiter = limiter(5, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..10 {
            limiter.check_at(&format!("10.0.0.{}", i), start);
        }
        assert_eq!(limiter.tracked_clients(), 10);

        let later = start + Duration::from_secs(120);
        for _ in 0..PRUNE_EVERY {
            limiter.check_at("10.9.9.9", later);
        }
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[actix_web::test]
    async fn test_middleware_returns_429_with_envelope() {
        let app = actix_web::test::init_service(
            App::new().service(
                web::scope("/api")
                    .wrap(RateLimit::new(limiter(2, Duration::from_secs(900))))
                    .route("/ping", web::get().to(HttpResponse::Ok)),
            ),
        )
        .await;
        let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();

        for expected_remaining in ["1", "0"] {
            let req = actix_web::test::TestRequest::get()
                .uri("/api/ping")
                .peer_addr(peer)
                .to_request();
            let resp = actix_web::test::call_service(&app, req).await;
            assert!(resp.status().is_success());
            assert_eq!(
                resp.headers().get("x-ratelimit-remaining").unwrap(),
                expected_remaining
            );
        }

        let req = actix_web::test::TestRequest::get()
            .uri("/api/ping")
            .peer_addr(peer)
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 429);

        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], REJECTION_MESSAGE);
    }

    #[actix_web::test]
    async fn test_rotating_forwarded_for_does_not_reset_limit() {
        let app = actix_web::test::init_service(
            App::new()
                .wrap(RateLimit::new(limiter(2, Duration::from_secs(900))))
                .route("/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;
        let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();

        let mut statuses = Vec::new();
        for i in 0..5 {
            let req = actix_web::test::TestRequest::get()
                .uri("/ping")
                .peer_addr(peer)
                .insert_header(("x-forwarded-for", format!("1.2.3.{}", i)))
                .to_request();
            statuses.push(actix_web::test::call_service(&app, req).await.status().as_u16());
        }

        assert_eq!(statuses, vec![200, 200, 429, 429, 429]);
    }

    #[actix_web::test]
    async fn test_trusted_proxy_keys_on_forwarded_client() {
        let limiter = FixedWindowLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_secs(900),
            trust_proxy: true,
        });
        let app = actix_web::test::init_service(
            App::new()
                .wrap(RateLimit::new(limiter))
                .route("/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;
        let proxy: SocketAddr = "10.0.0.254:443".parse().unwrap();

        let mut statuses = Vec::new();
        for client in ["1.2.3.4", "5.6.7.8", "1.2.3.4"] {
            let req = actix_web::test::TestRequest::get()
                .uri("/ping")
                .peer_addr(proxy)
                .insert_header(("x-forwarded-for", client))
                .to_request();
            statuses.push(actix_web::test::call_service(&app, req).await.status().as_u16());
        }

        assert_eq!(statuses, vec![200, 200, 429]);
    }
}
