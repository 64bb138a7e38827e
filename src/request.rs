//! Incoming request context.
//!
//! One [`Request`] exists per in-flight request. The server fills in the wire
//! data and the start instant; middleware may add the caller identity, the
//! validated JSON body and the uploaded file. Nothing here is shared between
//! requests.

use std::collections::HashMap;
use std::time::Instant;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use serde::de::DeserializeOwned;

use crate::auth::Identity;
use crate::error::Error;
use crate::method::Method;
use crate::upload::StoredFile;

/// An incoming HTTP request plus everything middleware attached to it.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    started_at: Instant,
    identity: Option<Identity>,
    json: Option<serde_json::Value>,
    file: Option<StoredFile>,
}

impl Request {
    /// A request with no headers and an empty body, started now.
    ///
    /// The server builds requests from the wire; this constructor is for
    /// driving a [`Router`](crate::Router) directly.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            started_at: Instant::now(),
            identity: None,
            json: None,
            file: None,
        }
    }

    /// Invalid header names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub(crate) async fn from_hyper(
        req: hyper::Request<hyper::body::Incoming>,
        started_at: Instant,
        max_body: usize,
    ) -> Result<Self, Error> {
        let (parts, body) = req.into_parts();
        let method = Method::try_from(&parts.method).map_err(|()| Error::MethodNotAllowed)?;
        let body = read_body(body, max_body).await?;

        let mut req = Self::new(method, parts.uri.path());
        req.headers = parts.headers;
        req.body = body;
        req.started_at = started_at;
        Ok(req)
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }
    pub fn started_at(&self) -> Instant { self.started_at }

    /// Milliseconds since the request entered the server. Monotonic clock,
    /// so never negative.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Header lookup; `None` when missing or not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/employees/{id}`, `req.param("id")` on `/employees/42`
    /// returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub fn file(&self) -> Option<&StoredFile> {
        self.file.as_ref()
    }

    pub fn set_file(&mut self, file: StoredFile) {
        self.file = Some(file);
    }

    /// Replaces the body seen by [`Request::json`] with an already-checked value.
    pub fn set_json(&mut self, value: serde_json::Value) {
        self.json = Some(value);
    }

    /// Deserializes the body: the validated value if validation ran, the raw
    /// bytes otherwise.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let parsed = match &self.json {
            Some(value) => T::deserialize(value),
            None => serde_json::from_slice(&self.body),
        };
        parsed.map_err(|e| Error::invalid("body", e.to_string()))
    }
}

/// Collects at most `limit` bytes of `body`.
pub(crate) async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, Error>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(Error::PayloadTooLarge(limit)),
        Err(e) => Err(Error::Internal(format!("failed to read request body: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Login {
        username: String,
    }

    #[test]
    fn json_prefers_validated_value() {
        let mut req = Request::new(Method::Post, "/x").with_body(r#"{"username":"raw"}"#);
        assert_eq!(req.json::<Login>().unwrap().username, "raw");

        req.set_json(serde_json::json!({ "username": "checked" }));
        assert_eq!(req.json::<Login>().unwrap().username, "checked");
    }

    #[test]
    fn malformed_body_is_a_validation_failure() {
        let req = Request::new(Method::Post, "/x").with_body("{nope");
        assert!(matches!(req.json::<Login>(), Err(Error::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn body_over_limit_is_too_large() {
        let body = http_body_util::Full::new(Bytes::from(vec![b'x'; 10]));
        assert!(matches!(read_body(body, 4).await, Err(Error::PayloadTooLarge(4))));

        let body = http_body_util::Full::new(Bytes::from_static(b"ok"));
        assert_eq!(read_body(body, 4).await.unwrap(), Bytes::from_static(b"ok"));
    }

    #[test]
    fn headers_are_case_insensitive() {
        let req = Request::new(Method::Get, "/").with_header("Authorization", "Bearer t");
        assert_eq!(req.header("authorization"), Some("Bearer t"));
    }
}
