//! Client configuration.

use std::time::Duration;

/// Endpoint of the metadata service as seen from the device.
pub const DEFAULT_ENDPOINT: &str = "http://metadata.soracom.io/v1";

/// Settings for a [`MetadataClient`](crate::MetadataClient) and its transport.
///
/// Usually filled in through [`MetadataClientBuilder`](crate::MetadataClientBuilder);
/// the struct can also be built directly:
///
/// ```ignore
/// let config = ClientConfig {
///     endpoint: "http://localhost:8080/v1".to_string(),
///     ..ClientConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the service, including the API version.
    pub endpoint: String,
    /// Upper bound for one exchange, from connecting to reading the body.
    pub request_timeout: Duration,
    /// Upper bound for establishing a connection.
    pub connect_timeout: Duration,
    /// How long an unused connection stays in the pool.
    pub idle_timeout: Duration,
    /// Pooled connections kept per host. The service is a single host, so
    /// this is effectively the pool size.
    pub max_idle_connections: usize,
    /// Log requests and responses, bodies included, at debug level.
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(90),
            max_idle_connections: 2,
            verbose: false,
        }
    }
}
