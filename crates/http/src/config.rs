//! Connection limits and timeouts.
//!
//! A [`Config`] is built once before the listener starts and then shared
//! read-only (usually behind an `Arc`) by every connection task. It carries no
//! behavior of its own; the request decoder, the response writer and the
//! connection lifecycle read their thresholds from it.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use wire_http::config::Config;
//!
//! let config = Config::default()
//!     .with_body_limit(64 * 1024)
//!     .with_read_timeout(Duration::from_secs(5));
//!
//! assert_eq!(config.body_limit(), 64 * 1024);
//! assert_eq!(config.header_limit(), wire_http::config::DEFAULT_HEADER_LIMIT);
//! ```

use std::time::Duration;

/// Size of each read from the transport
pub const DEFAULT_BUFFER_SIZE: usize = 4 * 1024;

/// Maximum size in bytes of the request line plus all header lines
pub const DEFAULT_HEADER_LIMIT: usize = 8 * 1024;

/// Maximum size in bytes of a request body
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Deadline for reading one complete request
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for every single write to the transport
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable numeric and time thresholds shared by all connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    buffer_size: usize,
    header_limit: usize,
    body_limit: usize,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            header_limit: DEFAULT_HEADER_LIMIT,
            body_limit: DEFAULT_BODY_LIMIT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    #[must_use]
    pub fn with_header_limit(mut self, header_limit: usize) -> Self {
        self.header_limit = header_limit;
        self
    }

    #[must_use]
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    #[must_use]
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Capacity of the read buffer, and the size of each read from the transport
    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Maximum size of the request head, terminator included
    #[inline]
    pub fn header_limit(&self) -> usize {
        self.header_limit
    }

    #[inline]
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    #[inline]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    #[inline]
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let config = Config::new();
        assert_eq!(config.buffer_size(), 4 * 1024);
        assert_eq!(config.header_limit(), 8 * 1024);
        assert_eq!(config.body_limit(), 2 * 1024 * 1024);
        assert_eq!(config.read_timeout(), Duration::from_secs(10));
        assert_eq!(config.write_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn overrides_keep_other_defaults() {
        let config = Config::default().with_buffer_size(16).with_write_timeout(Duration::from_millis(250));
        assert_eq!(config.buffer_size(), 16);
        assert_eq!(config.write_timeout(), Duration::from_millis(250));
        assert_eq!(config.body_limit(), DEFAULT_BODY_LIMIT);
        assert_eq!(config.read_timeout(), DEFAULT_READ_TIMEOUT);
    }
}
