//! Upgrade Request and Response
//!
//! The HTTP side of a connection: the request that asked for an upgrade, the
//! per-connection context attached to it, and the response an `upgrade` hook
//! can answer with instead of establishing the socket.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use bytes::Bytes;
use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Mutable per-connection record shared by every hook of one connection.
///
/// Cloning yields another handle to the same record.
#[derive(Debug, Clone, Default)]
pub struct PeerContext(Arc<RwLock<Map<String, Value>>>);

impl PeerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.write().insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.write().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Map<String, Value> {
        self.0.read().clone()
    }

    /// Whether both handles point at the same record
    pub fn same_as(&self, other: &PeerContext) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug)]
struct RequestInner {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
    secure: bool,
    context: OnceLock<PeerContext>,
}

/// Inbound upgrade request metadata.
///
/// Cheap to clone; clones share the same lazily attached [`PeerContext`].
#[derive(Debug, Clone)]
pub struct UpgradeRequest {
    inner: Arc<RequestInner>,
}

impl UpgradeRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self::builder(method, uri, headers).build()
    }

    pub fn builder(method: Method, uri: Uri, headers: HeaderMap) -> UpgradeRequestBuilder {
        UpgradeRequestBuilder {
            method,
            uri,
            headers,
            remote_addr: None,
            secure: false,
        }
    }

    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn path(&self) -> &str {
        self.inner.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.inner.uri.query()
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.inner.remote_addr
    }

    /// Absolute URL as seen by the client
    pub fn url(&self) -> String {
        let uri = &self.inner.uri;
        let host = uri
            .host()
            .map(str::to_string)
            .or_else(|| self.header(header::HOST.as_str()).map(str::to_string))
            .unwrap_or_else(|| "localhost".to_string());
        let forwarded_https = self
            .header("x-forwarded-proto")
            .is_some_and(|p| p.eq_ignore_ascii_case("https"));
        let scheme = if self.inner.secure || forwarded_https {
            "https"
        } else {
            "http"
        };
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("{}://{}{}", scheme, host, path_and_query)
    }

    /// The connection context, created on first access
    pub fn context(&self) -> &PeerContext {
        self.inner.context.get_or_init(PeerContext::new)
    }

    /// Whether a context has been attached yet
    pub fn has_context(&self) -> bool {
        self.inner.context.get().is_some()
    }
}

/// Builder for [`UpgradeRequest`]
#[derive(Debug)]
pub struct UpgradeRequestBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
    secure: bool,
}

impl UpgradeRequestBuilder {
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn build(self) -> UpgradeRequest {
        UpgradeRequest {
            inner: Arc::new(RequestInner {
                method: self.method,
                uri: self.uri,
                headers: self.headers,
                remote_addr: self.remote_addr,
                secure: self.secure,
                context: OnceLock::new(),
            }),
        }
    }
}

/// Plain HTTP response returned in place of a handshake
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl UpgradeResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Add a header; invalid names or values are skipped
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// `false` for any non-2xx status
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }
}

impl From<StatusCode> for UpgradeResponse {
    fn from(status: StatusCode) -> Self {
        Self::new(status)
    }
}

/// Value an `upgrade` hook may produce
#[derive(Debug, Clone, PartialEq)]
pub enum UpgradeOutcome {
    /// Proceed and add these headers to the handshake response.
    Headers(HeaderMap),
    /// A full response; non-2xx statuses end the upgrade.
    Response(UpgradeResponse),
}

impl UpgradeOutcome {
    /// Build a header outcome from string pairs, skipping invalid entries
    pub fn headers<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name),
                HeaderValue::try_from(value),
            ) {
                headers.append(name, value);
            }
        }
        UpgradeOutcome::Headers(headers)
    }

    pub fn reject(response: impl Into<UpgradeResponse>) -> Self {
        UpgradeOutcome::Response(response.into())
    }
}
