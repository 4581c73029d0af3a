//! Authenticated REST gateway core.
//!
//! # Overview
//! Builds requests for a REST API (base URL, query string, JSON or bearer
//! headers), executes them through a pluggable `Transport`, and runs every
//! failure through an interceptor that sends the client to the login page
//! on 401/403.
//!
//! # Design
//! - `RequestBuilder` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse` (host-does-IO).
//! - `HttpGateway` is the async surface; it owns a `Transport`, a
//!   `CredentialStore` and a `Navigator`, all injected at construction.
//! - `Environment` is passed in by value, so no call can run before the
//!   config exists.

pub mod builder;
pub mod credentials;
pub mod env;
pub mod error;
pub mod gateway;
pub mod http;
pub mod interceptor;
pub mod query;
pub mod transport;
pub mod types;

pub use builder::{file_name_from_disposition, HeaderKind, Payload, RequestBuilder};
pub use credentials::{read_cookie, CredentialStore, Credentials, MemoryStore, TOKEN_KEY};
pub use env::{EnvHolder, Environment};
pub use error::GatewayError;
pub use gateway::HttpGateway;
pub use http::{Body, FormData, FormPart, HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use interceptor::{ErrorInterceptor, MemoryNavigator, Navigator};
pub use transport::{Transport, UreqTransport};
pub use types::{AnyApiResponse, ApiResponse, BlobWithFileName, Pagination};
