//! Page-level response cache.
//!
//! Wraps an endpoint so that successful GET responses are stored by request
//! URI for a fixed time window and replayed byte for byte until they expire
//! or the cache is invalidated.

use bytes::Bytes;
use moka::future::Cache;
use poem::http::{HeaderMap, Method, StatusCode};
use poem::{Endpoint, IntoResponse, Middleware, Request, Response};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct CachedPage {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl CachedPage {
    fn to_response(&self) -> Response {
        let mut resp = Response::builder().status(self.status).body(self.body.clone());
        *resp.headers_mut() = self.headers.clone();
        resp
    }
}

/// Rendered pages keyed by request URI. Cloning shares the underlying store.
#[derive(Clone)]
pub struct PageCache {
    pages: Cache<String, CachedPage>,
}

impl PageCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let pages = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { pages }
    }

    pub async fn get(&self, key: &str) -> Option<CachedPage> {
        self.pages.get(key).await
    }

    pub async fn insert(&self, key: String, page: CachedPage) {
        self.pages.insert(key, page).await;
    }

    /// Entries stored before this call are never returned again.
    pub fn invalidate_all(&self) {
        self.pages.invalidate_all();
        tracing::debug!("page cache invalidated");
    }

    /// Middleware caching the wrapped endpoint in this store.
    pub fn middleware(&self) -> CachePage {
        CachePage { cache: self.clone() }
    }
}

pub struct CachePage {
    cache: PageCache,
}

impl<E: Endpoint> Middleware<E> for CachePage {
    type Output = CachePageEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        CachePageEndpoint {
            inner: ep,
            cache: self.cache.clone(),
        }
    }
}

pub struct CachePageEndpoint<E> {
    inner: E,
    cache: PageCache,
}

impl<E: Endpoint> Endpoint for CachePageEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        if req.method() != Method::GET {
            return self.inner.call(req).await.map(IntoResponse::into_response);
        }

        let key = req.uri().to_string();
        if let Some(page) = self.cache.get(&key).await {
            tracing::debug!(%key, "page cache hit");
            return Ok(page.to_response());
        }

        let resp = self.inner.call(req).await?.into_response();
        if resp.status() != StatusCode::OK {
            return Ok(resp);
        }

        let (parts, body) = resp.into_parts();
        let body = body.into_bytes().await?;
        let page = CachedPage {
            status: parts.status,
            headers: parts.headers.clone(),
            body: body.clone(),
        };
        self.cache.insert(key, page).await;

        Ok(Response::from_parts(parts, body.into()))
    }
}
