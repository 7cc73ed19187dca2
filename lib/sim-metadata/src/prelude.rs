//! Everything needed to call the service.
//!
//! ```ignore
//! use sim_metadata::prelude::*;
//! ```

pub use crate::{
    ApiError, ClientConfig, Error, MetadataClient, Result, Subscriber, Tag, Transport,
};
pub use chrono::{DateTime, Utc};
