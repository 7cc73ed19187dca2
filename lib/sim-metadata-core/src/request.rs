//! Outgoing requests.
//!
//! ```
//! use sim_metadata_core::{Method, Request};
//!
//! let url = "http://metadata.soracom.io/v1/subscriber/set_group".parse().expect("url");
//! let request = Request::new(Method::Post, url)
//!     .json(&serde_json::json!({"groupId": "group-1"}))
//!     .expect("json body");
//! assert_eq!(request.header("content-type"), Some("application/json"));
//! ```

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName};
use http::{HeaderMap, HeaderValue};
use serde::Serialize;
use url::Url;

use crate::{APPLICATION_JSON, Error, Method, Result, to_json};

/// One call to the metadata service.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// A request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Add a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body and its content type.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = Some(to_json(value)?);
        Ok(self.with_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON)))
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Target URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// All headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and printable.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Convert into an [`http::Request`]; a missing body becomes an empty one.
    pub fn into_http(self) -> Result<http::Request<Bytes>> {
        let uri = self
            .url
            .as_str()
            .parse::<http::Uri>()
            .map_err(|err| Error::Uri(format!("{}: {err}", self.url)))?;

        let mut request = http::Request::new(self.body.unwrap_or_default());
        *request.method_mut() = self.method.into();
        *request.uri_mut() = uri;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use http::header::ACCEPT;

    use super::*;

    fn url(path: &str) -> Url {
        let_assert!(Ok(base) = Url::parse("http://metadata.soracom.io/v1/"));
        let_assert!(Ok(url) = base.join(path));
        url
    }

    #[test]
    fn bodyless_request() {
        let request = Request::new(Method::Post, url("subscriber/enable_termination"))
            .with_header(ACCEPT, HeaderValue::from_static("application/json"));

        check!(request.method() == Method::Post);
        check!(request.url().path() == "/v1/subscriber/enable_termination");
        check!(request.header("Accept") == Some("application/json"));
        check!(request.body().is_none());
    }

    #[test]
    fn json_body_sets_content_type() {
        let_assert!(
            Ok(request) = Request::new(Method::Post, url("subscriber/set_expiry_time"))
                .json(&serde_json::json!({"expiryTime": 1_700_000_000_000_i64}))
        );

        check!(request.header("content-type") == Some("application/json"));
        check!(request.body().map(Bytes::as_ref) == Some(br#"{"expiryTime":1700000000000}"#.as_slice()));
    }

    #[test]
    fn converts_to_http() {
        let request = Request::new(Method::Delete, url("subscriber/tags/a%2Fb"))
            .with_header(ACCEPT, HeaderValue::from_static("application/json"));

        let_assert!(Ok(request) = request.into_http());
        check!(request.method() == http::Method::DELETE);
        check!(request.uri() == "http://metadata.soracom.io/v1/subscriber/tags/a%2Fb");
        check!(request.headers().len() == 1);
        check!(request.body().is_empty());
    }
}
