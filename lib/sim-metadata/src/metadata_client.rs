//! Client for the subscriber resource of the metadata service.
//!
//! Every operation sends exactly one request and returns a fresh [`Subscriber`]
//! snapshot (or the userdata text). Failures are reported as:
//! - [`Error::Api`] when the service answers with a non-2xx status
//! - [`Error::TagNotFound`] when deleting a tag that does not exist
//! - transport errors ([`Error::Connection`], [`Error::Tls`], [`Error::Timeout`])
//! - decode errors when a success body does not match the expected shape
//!
//! Nothing is retried.

use std::time::Duration;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::header::ACCEPT;
use crate::{
    APPLICATION_JSON, ApiError, ClientConfig, Error, HeaderValue, HttpTransport, Method, Request,
    Response, Result, StatusCode, Subscriber, Tag, Transport, classify, truncate_to_millis,
};

/// Characters escaped in a tag name path segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSpeedClass<'a> {
    speed_class: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetExpiryTime {
    expiry_time: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetGroup<'a> {
    group_id: &'a str,
}

/// Metadata service client, generic over its transport.
///
/// The client holds no per-call state: it is cheap to clone and safe to use
/// from concurrent tasks. Ordering between concurrent updates is decided by
/// the service.
///
/// # Example
///
/// ```ignore
/// use sim_metadata::MetadataClient;
///
/// let client = MetadataClient::builder().build()?;
/// let subscriber = client.update_speed_class("s1.fast").await?;
/// assert_eq!(subscriber.speed_class, "s1.fast");
/// ```
#[derive(Debug, Clone)]
pub struct MetadataClient<T = HttpTransport> {
    transport: T,
    endpoint: Url,
}

impl MetadataClient {
    /// Create a builder using the default endpoint and an [`HttpTransport`].
    #[must_use]
    pub fn builder() -> MetadataClientBuilder {
        MetadataClientBuilder::default()
    }
}

impl<T: Transport> MetadataClient<T> {
    /// Create a client sending requests through `transport` to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be parsed.
    pub fn new(transport: T, endpoint: impl AsRef<str>) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint.as_ref())?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Ok(Self {
            transport,
            endpoint,
        })
    }

    /// Base URL the operations are resolved against (always ends with `/`).
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Read the current subscriber.
    pub async fn get_subscriber(&self) -> Result<Subscriber> {
        let request = self.request(Method::Get, "subscriber")?;
        self.send_for_subscriber(request).await
    }

    /// Change the speed class. The value is not validated client side.
    pub async fn update_speed_class(&self, speed_class: &str) -> Result<Subscriber> {
        let request = self
            .request(Method::Post, "subscriber/update_speed_class")?
            .json(&UpdateSpeedClass { speed_class })?;
        self.send_for_subscriber(request).await
    }

    /// Allow the subscriber to be terminated.
    pub async fn enable_termination(&self) -> Result<Subscriber> {
        let request = self.request(Method::Post, "subscriber/enable_termination")?;
        self.send_for_subscriber(request).await
    }

    /// Protect the subscriber from termination.
    pub async fn disable_termination(&self) -> Result<Subscriber> {
        let request = self.request(Method::Post, "subscriber/disable_termination")?;
        self.send_for_subscriber(request).await
    }

    /// Set the expiry time, truncated to milliseconds.
    pub async fn set_expired_at(&self, expired_at: DateTime<Utc>) -> Result<Subscriber> {
        let expiry_time = truncate_to_millis(expired_at).timestamp_millis();
        let request = self
            .request(Method::Post, "subscriber/set_expiry_time")?
            .json(&SetExpiryTime { expiry_time })?;
        self.send_for_subscriber(request).await
    }

    /// Remove the expiry time.
    pub async fn unset_expired_at(&self) -> Result<Subscriber> {
        let request = self.request(Method::Post, "subscriber/unset_expiry_time")?;
        self.send_for_subscriber(request).await
    }

    /// Move the subscriber into `group_id`.
    pub async fn set_group(&self, group_id: &str) -> Result<Subscriber> {
        let request = self
            .request(Method::Post, "subscriber/set_group")?
            .json(&SetGroup { group_id })?;
        self.send_for_subscriber(request).await
    }

    /// Remove the subscriber from its group.
    ///
    /// Some deployments refuse metadata calls from a subscriber without a
    /// group, so later calls may fail once this succeeded.
    pub async fn unset_group(&self) -> Result<Subscriber> {
        let request = self.request(Method::Post, "subscriber/unset_group")?;
        self.send_for_subscriber(request).await
    }

    /// Create or overwrite the given tags; other tags are left untouched.
    pub async fn put_tags(&self, tags: &[Tag]) -> Result<Subscriber> {
        let request = self.request(Method::Put, "subscriber/tags")?.json(&tags)?;
        self.send_for_subscriber(request).await
    }

    /// Delete the tag `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TagNotFound`] if the service answers 404, whatever
    /// the body. Returns [`Error::Uri`] without sending anything when `name`
    /// is empty, `.` or `..`: those do not address a single tag.
    pub async fn delete_tag(&self, name: &str) -> Result<()> {
        if matches!(name, "" | "." | "..") {
            return Err(Error::Uri(format!("'{name}' is not a usable tag name")));
        }
        let path = format!(
            "subscriber/tags/{}",
            utf8_percent_encode(name, PATH_SEGMENT_ENCODE_SET)
        );
        let request = self.request(Method::Delete, &path)?;
        let (method, path) = (request.method(), request.url().path().to_string());

        let response = self.exchange(request).await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(Error::tag_not_found(
                name,
                rejection(method, &path, &response),
            )),
            _ => Err(Error::Api(rejection(method, &path, &response))),
        }
    }

    /// Read the userdata attached to the subscriber's group.
    pub async fn get_userdata(&self) -> Result<String> {
        let request = Request::new(Method::Get, self.url("userdata")?);
        self.send(request).await?.text()
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.endpoint.join(path).map_err(Error::Endpoint)
    }

    fn request(&self, method: Method, path: &str) -> Result<Request> {
        Ok(Request::new(method, self.url(path)?)
            .with_header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON)))
    }

    async fn exchange(&self, request: Request) -> Result<Response> {
        debug!(method = %request.method(), path = request.url().path(), "calling metadata service");
        self.transport.send(request).await
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let (method, path) = (request.method(), request.url().path().to_string());

        let response = self.exchange(request).await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Error::Api(rejection(method, &path, &response)))
    }

    async fn send_for_subscriber(&self, request: Request) -> Result<Subscriber> {
        self.send(request).await?.json()
    }
}

fn rejection(method: Method, path: &str, response: &Response) -> ApiError {
    let error = classify(response);
    warn!(
        %method,
        %path,
        status = response.status().as_u16(),
        code = error.error_code(),
        message = error.message(),
        "metadata service rejected request"
    );
    error
}

/// Builder for [`MetadataClient`].
///
/// ```ignore
/// let client = MetadataClient::builder()
///     .endpoint("http://localhost:8080/v1")
///     .request_timeout(Duration::from_secs(5))
///     .verbose(true)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetadataClientBuilder {
    config: ClientConfig,
}

impl MetadataClientBuilder {
    /// Set the service endpoint (default: [`DEFAULT_ENDPOINT`](crate::DEFAULT_ENDPOINT)).
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Bound each exchange, body included.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Bound connection establishment.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Log requests and responses, bodies included, at debug level.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a client on top of an [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be parsed.
    pub fn build(self) -> Result<MetadataClient> {
        let transport = HttpTransport::new(&self.config);
        self.build_with(transport)
    }

    /// Build a client on top of the given transport. Only the endpoint is
    /// taken from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be parsed.
    pub fn build_with<T: Transport>(self, transport: T) -> Result<MetadataClient<T>> {
        MetadataClient::new(transport, &self.config.endpoint)
    }
}
