//! HTTP methods used by the metadata service.

use derive_more::Display;

/// Methods the metadata service answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// Read the subscriber or its userdata.
    #[display("GET")]
    Get,
    /// Subscriber actions such as `set_group`.
    #[display("POST")]
    Post,
    /// Tag merge.
    #[display("PUT")]
    Put,
    /// Tag removal.
    #[display("DELETE")]
    Delete,
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}
