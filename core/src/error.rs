//! Error types for the resource layer and its transports.
//!
//! # Design
//! Building, comparing, and rendering resources never fails, so the core
//! only needs errors at its edges: parsing a method name, and the reasons a
//! transport could not produce a response. `Tls` gets its own variant
//! because the transport reports it differently (once per session).

use std::fmt;

/// A method name that is not a standard HTTP verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown HTTP method: {}", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

/// Reasons a `Transport` produced no response.
#[derive(Debug)]
pub enum TransportError {
    /// Certificate validation or another TLS handshake failure.
    Tls(String),

    /// The exchange did not finish within the configured timeout.
    Timeout,

    /// The resource URL or proxy URL could not be used.
    InvalidUrl(String),

    /// Connection refused, DNS failure, or a protocol error.
    Connection(String),

    /// The response body could not be read.
    Body(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Tls(msg) => write!(f, "TLS error: {msg}"),
            TransportError::Timeout => write!(f, "request timed out"),
            TransportError::InvalidUrl(msg) => write!(f, "invalid URL: {msg}"),
            TransportError::Connection(msg) => write!(f, "connection failed: {msg}"),
            TransportError::Body(msg) => write!(f, "failed to read body: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}
