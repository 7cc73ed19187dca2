//! Everything a metadata operation can fail with.
//!
//! - no response: [`Error::Connection`], [`Error::Tls`], [`Error::Timeout`]
//! - the service said no: [`Error::Api`], [`Error::TagNotFound`]
//! - a success body did not match: [`Error::Decode`], [`Error::Utf8`]
//! - the call could not be built: [`Error::Encode`], [`Error::Endpoint`],
//!   [`Error::Uri`]

use std::string::FromUtf8Error;

use derive_more::{Display, Error, From};

use crate::ApiError;

/// Failure of a metadata operation.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Non-2xx answer, classified.
    #[display("{_0}")]
    Api(ApiError),

    /// Deleting a tag the subscriber does not have.
    #[display("tag '{name}' not found: {error}")]
    #[from(skip)]
    TagNotFound {
        /// Requested tag name.
        name: String,
        /// What the service reported.
        error: ApiError,
    },

    /// The service could not be reached, or the exchange broke off.
    #[display("cannot reach metadata service: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS handshake or certificate failure.
    #[display("TLS failure: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// No complete response within the request timeout.
    #[display("metadata service did not answer in time")]
    #[from(skip)]
    Timeout,

    /// A success body is not the expected JSON.
    #[display("unexpected response body at '{path}': {message}")]
    #[from(skip)]
    Decode {
        /// Path of the offending field, e.g. `tags.color`.
        path: String,
        /// What went wrong there.
        message: String,
    },

    /// A text body is not UTF-8.
    #[display("response body is not UTF-8: {_0}")]
    Utf8(FromUtf8Error),

    /// A request body could not be encoded.
    #[display("cannot encode request body: {_0}")]
    Encode(serde_json::Error),

    /// The endpoint or an operation path is not a valid URL.
    #[display("invalid endpoint: {_0}")]
    Endpoint(url::ParseError),

    /// The URL was rejected by the HTTP layer.
    #[display("unusable request URI: {_0}")]
    #[from(skip)]
    Uri(#[error(not(source))] String),
}

/// Result of a metadata operation.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// A [`Error::Connection`].
    #[must_use]
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection(reason.into())
    }

    /// A [`Error::Tls`].
    #[must_use]
    pub fn tls(reason: impl Into<String>) -> Self {
        Self::Tls(reason.into())
    }

    /// A [`Error::Decode`] at `path`.
    #[must_use]
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// A [`Error::TagNotFound`] for `name`.
    #[must_use]
    pub fn tag_not_found(name: impl Into<String>, error: ApiError) -> Self {
        Self::TagNotFound {
            name: name.into(),
            error,
        }
    }

    /// No response arrived within the request timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// The service could not be reached.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// No response arrived at all.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Tls(_) | Self::Timeout)
    }

    /// The service answered with a non-2xx status.
    #[must_use]
    pub const fn is_api(&self) -> bool {
        matches!(self, Self::Api(_))
    }

    /// A success body could not be decoded.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Utf8(_))
    }

    /// A tag deletion targeted a missing tag.
    #[must_use]
    pub const fn is_tag_not_found(&self) -> bool {
        matches!(self, Self::TagNotFound { .. })
    }

    /// The classified service error, for both [`Error::Api`] and
    /// [`Error::TagNotFound`].
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) | Self::TagNotFound { error, .. } => Some(error),
            _ => None,
        }
    }
}
