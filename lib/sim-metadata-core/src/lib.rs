//! Core types for the SIM metadata service client.
//!
//! Transport-agnostic pieces shared by the client and its tests:
//! - [`Request`] and [`Response`] - one exchange with the service
//! - [`Transport`] - the seam between operations and the network
//! - [`ApiError`] and [`classify`] - what a failed response means
//! - [`Error`] and [`Result`] - everything an operation can fail with
//! - [`from_json`] and [`to_json`] - body encoding with path-aware errors

mod api_error;
mod error;
mod json;
mod method;
mod request;
mod response;
mod transport;

pub use api_error::{ApiError, MessageTemplate, classify};
pub use error::{Error, Result};
pub use json::{APPLICATION_JSON, from_json, to_json};
pub use method::Method;
pub use request::Request;
pub use response::Response;
pub use transport::Transport;

pub use http::{HeaderMap, HeaderValue, StatusCode, header};
