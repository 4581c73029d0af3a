//! Uniform failure handling for gateway calls.
//!
//! # Design
//! The interceptor never swallows an error. Its only job is the side effect
//! of sending the client to the login page when a call is rejected with
//! 401/403 while the client is outside the auth flow.

use std::sync::{Arc, Mutex};

use crate::error::GatewayError;

/// Path segment that marks the auth flow.
const AUTH_SEGMENT: &str = "auth";

/// Read and replace the client's current location.
pub trait Navigator: Send + Sync {
    fn current_url(&self) -> String;
    fn redirect(&self, url: &str);
}

impl<T: Navigator + ?Sized> Navigator for Arc<T> {
    fn current_url(&self) -> String {
        (**self).current_url()
    }

    fn redirect(&self, url: &str) {
        (**self).redirect(url)
    }
}

/// In-memory navigator: redirects replace the current URL and are recorded.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    current: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(current_url: &str) -> Self {
        Self {
            current: Mutex::new(current_url.to_string()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Navigator for MemoryNavigator {
    fn current_url(&self) -> String {
        self.current
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn redirect(&self, url: &str) {
        if let Ok(mut current) = self.current.lock() {
            *current = url.to_string();
        }
        if let Ok(mut redirects) = self.redirects.lock() {
            redirects.push(url.to_string());
        }
    }
}

/// Redirects to the login page on 401/403, then hands the error back.
#[derive(Debug, Clone)]
pub struct ErrorInterceptor<N> {
    navigator: N,
    login_url: String,
}

impl<N: Navigator> ErrorInterceptor<N> {
    pub fn new(navigator: N, login_url: String) -> Self {
        Self {
            navigator,
            login_url,
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn handle(&self, error: GatewayError) -> GatewayError {
        let current = self.navigator.current_url();
        if !in_auth_flow(&current) && matches!(error.status(), Some(401 | 403)) {
            tracing::warn!(
                status = ?error.status(),
                from = %current,
                to = %self.login_url,
                "unauthorized, redirecting to login"
            );
            self.navigator.redirect(&self.login_url);
        }
        error
    }
}

fn in_auth_flow(url: &str) -> bool {
    url.split('/').any(|segment| segment == AUTH_SEGMENT)
}
