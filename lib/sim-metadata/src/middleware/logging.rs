//! Exchange logging.
//!
//! Every exchange runs in a `metadata_request` span carrying the method and
//! path. [`LogLevel::Info`] logs one line per outcome; [`LogLevel::Debug`]
//! also logs headers and bodies in both directions, which is what verbose
//! clients use.

use std::borrow::Cow;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{Error, Request, Response, Result};

/// How much of an exchange gets logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Headers and bodies, at debug level.
    Debug,
    /// Status and latency, at info level.
    #[default]
    Info,
}

/// Wraps a service in [`Logging`].
///
/// ```ignore
/// use sim_metadata::middleware::{LoggingLayer, ServiceBuilder};
///
/// let service = ServiceBuilder::new()
///     .layer(LoggingLayer::debug())
///     .service(exchange);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

impl LoggingLayer {
    /// Info level logging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Debug level logging, bodies included.
    #[must_use]
    pub const fn debug() -> Self {
        Self::with_level(LogLevel::Debug)
    }

    /// Logging at `level`.
    #[must_use]
    pub const fn with_level(level: LogLevel) -> Self {
        Self { level }
    }

    /// Configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service logging each exchange it forwards.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Service<Request> for Logging<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Response>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let span = info_span!(
            "metadata_request",
            method = %request.method(),
            path = request.url().path(),
        );
        if self.level == LogLevel::Debug {
            span.in_scope(|| {
                debug!(
                    url = %request.url(),
                    headers = ?request.headers(),
                    body = %lossy(request.body()),
                    "request"
                );
            });
        }

        // The ready service is the one in `self`; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let level = self.level;
        let started = Instant::now();

        Box::pin(
            async move {
                let result = inner.call(request).await;
                report(level, &result, started.elapsed());
                result
            }
            .instrument(span),
        )
    }
}

fn report(level: LogLevel, result: &Result<Response>, elapsed: Duration) {
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(response) if level == LogLevel::Debug => debug!(
            status = response.status().as_u16(),
            elapsed_ms,
            headers = ?response.headers(),
            body = %lossy(Some(response.body())),
            "response"
        ),
        Ok(response) => info!(status = response.status().as_u16(), elapsed_ms, "response"),
        Err(err) => warn!(error = %err, elapsed_ms, "no response"),
    }
}

fn lossy(body: Option<&Bytes>) -> Cow<'_, str> {
    body.map_or(Cow::Borrowed(""), |bytes| String::from_utf8_lossy(bytes))
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use tower::{ServiceExt, service_fn};

    use super::*;
    use crate::{Method, StatusCode};

    #[test]
    fn layer_levels() {
        check!(LoggingLayer::new().level() == LogLevel::Info);
        check!(LoggingLayer::debug().level() == LogLevel::Debug);
        check!(LoggingLayer::with_level(LogLevel::Info).level() == LogLevel::Info);
    }

    #[test]
    fn bodies_are_logged_lossily() {
        check!(lossy(None) == "");
        check!(lossy(Some(&Bytes::from_static(b"{\"a\":1}"))) == "{\"a\":1}");
        check!(lossy(Some(&Bytes::from_static(b"\xff"))) == "\u{fffd}");
    }

    #[tokio::test]
    async fn forwards_outcome_unchanged() {
        let teapot = service_fn(|_request: Request| async {
            Ok::<_, Error>(Response::new(StatusCode::IM_A_TEAPOT, "short and stout"))
        });
        let service = LoggingLayer::debug().layer(teapot);

        let_assert!(Ok(url) = url::Url::parse("http://metadata.test/v1/subscriber"));
        let_assert!(Ok(response) = service.oneshot(Request::new(Method::Get, url)).await);
        check!(response.status() == StatusCode::IM_A_TEAPOT);
        check!(response.body().as_ref() == b"short and stout");
    }
}
