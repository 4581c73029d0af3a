//! Deployment environment: API endpoints and mode.
//!
//! # Design
//! `Environment` is a plain value handed to `HttpGateway::new`, so a gateway
//! can never observe an uninitialized config. `EnvHolder` keeps the
//! set-once/read-many contract for hosts that want a process-wide copy; it
//! turns the "read before init" case into an explicit error.

use std::path::Path;
use std::sync::OnceLock;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Prefix for environment-variable overrides, e.g. `APP_API_BASE_URL`.
pub const ENV_PREFIX: &str = "APP_";

/// API endpoints and deployment mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub production: bool,
    /// Prefix for every API path built by the gateway.
    pub api_base_url: String,
    pub origin: String,
    /// Root of the front-end; the login page lives under it.
    pub base_url: String,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            production: false,
            api_base_url: String::new(),
            origin: "local".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl Environment {
    /// Load defaults, then `path` (TOML, optional), then `APP_*` variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let env = Figment::new()
            .merge(Serialized::defaults(Environment::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract::<Environment>()?;
        tracing::debug!(api_base_url = %env.api_base_url, production = env.production, "environment loaded");
        Ok(env)
    }

    /// Where the interceptor sends the client on 401/403.
    pub fn login_url(&self) -> String {
        format!("{}/auth/login", self.base_url)
    }
}

/// Process-wide, set-once holder for an `Environment`.
#[derive(Debug, Default)]
pub struct EnvHolder {
    env: OnceLock<Environment>,
}

impl EnvHolder {
    pub const fn new() -> Self {
        Self {
            env: OnceLock::new(),
        }
    }

    /// Store `env`. Fails if the holder was already initialized.
    pub fn init(&self, env: Environment) -> Result<(), GatewayError> {
        self.env
            .set(env)
            .map_err(|_| GatewayError::AlreadyInitialized)
    }

    pub fn env(&self) -> Result<&Environment, GatewayError> {
        self.env.get().ok_or(GatewayError::Uninitialized)
    }
}
