//! Error types for the REST gateway.
//!
//! # Design
//! There is one failure that matters to callers: the HTTP call did not
//! succeed. `Http` carries the status and raw body of a non-2xx response;
//! `Transport` covers failures where no response arrived at all. The
//! interceptor only looks at `status()`, so every other variant passes
//! through it untouched.

use thiserror::Error;

/// Errors returned by the gateway and its building blocks.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (DNS, connect, TLS, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A download had neither a suggested name nor a usable
    /// `Content-Disposition` header.
    #[error("response carries no file name")]
    MissingFileName,

    /// The environment holder was read before `init`.
    #[error("environment read before init")]
    Uninitialized,

    /// The environment holder was initialized twice.
    #[error("environment already initialized")]
    AlreadyInitialized,

    /// The environment could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// HTTP status of the failed call, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<figment::Error> for GatewayError {
    fn from(err: figment::Error) -> Self {
        GatewayError::Config(err.to_string())
    }
}
