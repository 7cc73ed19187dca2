//! hyper based [`Transport`].
//!
//! Requests go through a tower stack: [`Logging`](crate::middleware::Logging)
//! on top of a pooled hyper client. The whole exchange, body included, is
//! bounded by [`ClientConfig::request_timeout`].

use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tower::util::BoxCloneService;
use tower::{ServiceBuilder, ServiceExt};
use tower_service::Service;

use crate::middleware::{LogLevel, LoggingLayer};
use crate::{ClientConfig, Error, Request, Response, Result, Transport};

type Stack = BoxCloneService<Request, Response, Error>;

/// Transport used by [`MetadataClient`](crate::MetadataClient) by default.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    // BoxCloneService is Send but not Sync; the lock is only held to clone it.
    stack: Arc<Mutex<Stack>>,
    log_level: LogLevel,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Build the transport described by `config`.
    ///
    /// Exchanges are logged at info level, or at debug level with headers
    /// and bodies when [`ClientConfig::verbose`] is set.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let log_level = if config.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };

        let stack = ServiceBuilder::new()
            .layer(LoggingLayer::with_level(log_level))
            .service(Exchange::new(config));

        Self {
            stack: Arc::new(Mutex::new(BoxCloneService::new(stack))),
            log_level,
            request_timeout: config.request_timeout,
        }
    }

    /// Level exchanges are logged at.
    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Upper bound for one exchange.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("log_level", &self.log_level)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let stack = self
            .stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        stack.oneshot(request).await
    }
}

/// Innermost service: one exchange over the pooled hyper client.
#[derive(Clone)]
struct Exchange {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
}

impl Exchange {
    fn new(config: &ClientConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.idle_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .build(connector(config.connect_timeout));

        Self {
            client,
            timeout: config.request_timeout,
        }
    }

    async fn run(self, request: Request) -> Result<Response> {
        let request = request.into_http()?.map(Full::new);
        let response = self.client.request(request).await.map_err(transport_error)?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|err| Error::connection(format!("reading response body: {err}")))?
            .to_bytes();

        Ok(http::Response::from_parts(parts, body).into())
    }
}

impl Service<Request> for Exchange {
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Response>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let exchange = self.clone();
        Box::pin(async move {
            let timeout = exchange.timeout;
            tokio::time::timeout(timeout, exchange.run(request))
                .await
                .map_err(|_| Error::Timeout)?
        })
    }
}

/// Accepts `http` endpoints (the usual on-device case) and `https` ones,
/// verified against the Mozilla root certificates.
fn connector(connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    let roots: rustls::RootCertStore = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    let tls = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut tcp = HttpConnector::new();
    tcp.enforce_http(false);
    tcp.set_connect_timeout(Some(connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .wrap_connector(tcp)
}

/// TLS failures surface as [`rustls::Error`] somewhere in the source chain,
/// possibly wrapped in an [`std::io::Error`].
#[allow(clippy::needless_pass_by_value)]
fn transport_error(err: hyper_util::client::legacy::Error) -> Error {
    let mut cause = err.source();
    while let Some(current) = cause {
        let is_tls = current.is::<rustls::Error>()
            || current
                .downcast_ref::<std::io::Error>()
                .and_then(std::io::Error::get_ref)
                .is_some_and(|inner| inner.is::<rustls::Error>());
        if is_tls {
            return Error::tls(err.to_string());
        }
        cause = current.source();
    }

    Error::connection(err.to_string())
}
