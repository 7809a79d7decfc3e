use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use moka::{Expiry, future::Cache};

use crate::auth::{SESSION_COOKIE, bearer_token};

/// Largest response body that will be buffered into the cache.
const MAX_CACHED_BODY: usize = 4 * 1024 * 1024;

/// Entries held before least-recently-used eviction kicks in.
pub const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct CachedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    ttl: Duration,
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Expires each entry after the TTL of the route that produced it.
struct RouteTtl;

impl Expiry<String, CachedResponse> for RouteTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedResponse,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// ResponseCache
///
/// A passive response cache keyed by path and query string. Entries are
/// never invalidated; they simply expire.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<String, CachedResponse>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ResponseCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .expire_after(RouteTtl)
                .build(),
        }
    }
}

/// CachePolicy
///
/// Middleware state: the shared cache plus the TTL of one route.
#[derive(Clone)]
pub struct CachePolicy {
    cache: ResponseCache,
    ttl: Duration,
}

/// cached
///
/// Wraps the handlers registered on `route` so far with the response cache.
/// Methods chained after this call are not cached, which is how a route
/// mixes a cached `GET` with uncached admin writes.
pub fn cached<S>(route: MethodRouter<S>, cache: &ResponseCache, ttl_secs: u64) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let policy = CachePolicy {
        cache: cache.clone(),
        ttl: Duration::from_secs(ttl_secs),
    };
    route.layer(middleware::from_fn_with_state(policy, cache_response))
}

/// Requests that carry credentials may render per-user content.
fn is_personalized(headers: &HeaderMap) -> bool {
    bearer_token(headers).is_some()
        || headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.contains(SESSION_COOKIE))
}

fn cache_key(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

/// cache_response
///
/// Serves anonymous `GET` requests from the cache and stores successful
/// responses for the route's TTL. Stored responses carry
/// `Cache-Control: public, max-age=<ttl>`.
pub async fn cache_response(
    State(policy): State<CachePolicy>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET || is_personalized(request.headers()) {
        return next.run(request).await;
    }

    let key = cache_key(&request);
    if let Some(hit) = policy.cache.entries.get(&key).await {
        tracing::debug!(%key, "response cache hit");
        return hit.into_response();
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let body = match to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(%key, error = %e, "failed to buffer response for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if let Ok(value) = HeaderValue::try_from(format!("public, max-age={}", policy.ttl.as_secs())) {
        parts.headers.insert(header::CACHE_CONTROL, value);
    }

    policy
        .cache
        .entries
        .insert(
            key.clone(),
            CachedResponse {
                status: parts.status,
                headers: parts.headers.clone(),
                body: body.clone(),
                ttl: policy.ttl,
            },
        )
        .await;
    tracing::debug!(%key, ttl_secs = policy.ttl.as_secs(), "response cached");

    Response::from_parts(parts, Body::from(body))
}
