//! The seam between metadata operations and the network.
//!
//! The `sim-metadata` crate ships a hyper based implementation; tests plug in
//! in-memory ones.

use std::future::Future;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Sends one request and buffers the whole response.
///
/// Any status, 4xx and 5xx included, is a completed exchange at this level;
/// errors mean that no response arrived (connection, TLS, timeout).
/// Implementations must not retry.
pub trait Transport: Send + Sync {
    /// Perform the exchange.
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        T::send(self, request)
    }
}
