//! Client for the SIM metadata service.
//!
//! The metadata service lets a device read and update its own subscriber:
//! speed class, termination protection, expiry time, group, tags, and the
//! userdata of its group.
//!
//! # Example
//!
//! ```ignore
//! use sim_metadata::prelude::*;
//!
//! let client = MetadataClient::builder().build()?;
//!
//! let subscriber = client.put_tags(&[Tag::new("location", "warehouse-3")]).await?;
//! assert_eq!(subscriber.tag("location"), Some("warehouse-3"));
//!
//! match client.delete_tag("no-such-tag").await {
//!     Err(err) if err.is_tag_not_found() => {}
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

mod config;
mod metadata_client;
pub mod middleware;
pub mod prelude;
mod subscriber;
mod transport;

pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use metadata_client::{MetadataClient, MetadataClientBuilder};
pub use subscriber::{Subscriber, Tag, truncate_to_millis};
pub use transport::HttpTransport;

pub use sim_metadata_core::{
    APPLICATION_JSON, ApiError, Error, HeaderMap, HeaderValue, MessageTemplate, Method, Request,
    Response, Result, StatusCode, Transport, classify, from_json, header, to_json,
};

// Re-export crates appearing in the public API
pub use chrono;
pub use url;
