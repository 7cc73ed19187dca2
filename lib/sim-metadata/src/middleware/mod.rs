//! Tower middleware for the metadata transport.
//!
//! [`HttpTransport`](crate::HttpTransport) stacks [`LoggingLayer`] on top of
//! its hyper client. The layer works on any service speaking
//! [`Request`](crate::Request) and [`Response`](crate::Response).

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::{Layer, ServiceBuilder};
