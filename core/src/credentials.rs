//! Bearer-token lookup over a client-side key/value store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "next_partner";

/// Read access to durable client-side storage and the cookie jar.
///
/// Reads are synchronous; implementations backed by a browser would wrap
/// `localStorage` and `document.cookie`.
pub trait CredentialStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    /// Raw cookie string, `name=value` pairs separated by `;`.
    fn cookie_string(&self) -> String;
}

impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn cookie_string(&self) -> String {
        (**self).cookie_string()
    }
}

/// In-memory store for native hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
    cookies: RwLock<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.set_item(TOKEN_KEY, token);
        store
    }

    pub fn set_item(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.items.write() {
            items.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove_item(&self, key: &str) {
        if let Ok(mut items) = self.items.write() {
            items.remove(key);
        }
    }

    pub fn set_cookies(&self, raw: &str) {
        if let Ok(mut cookies) = self.cookies.write() {
            *cookies = raw.to_string();
        }
    }
}

impl CredentialStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().ok()?.get(key).cloned()
    }

    fn cookie_string(&self) -> String {
        self.cookies
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

/// Token and cookie lookups on top of a `CredentialStore`.
#[derive(Debug, Clone)]
pub struct Credentials<S> {
    store: S,
}

impl<S: CredentialStore> Credentials<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Value stored under `key`, or an empty string.
    pub fn get_token(&self, key: &str) -> String {
        self.store.get_item(key).unwrap_or_default()
    }

    pub fn has_token(&self) -> bool {
        !self.get_token(TOKEN_KEY).is_empty()
    }

    /// `Bearer <token>` when a token is stored, otherwise empty.
    pub fn build_auth_header(&self) -> String {
        let token = self.get_token(TOKEN_KEY);
        if token.is_empty() {
            return String::new();
        }
        format!("Bearer {token}")
    }

    pub fn read_cookie(&self, name: &str) -> Option<String> {
        read_cookie(&self.store.cookie_string(), name)
    }
}

/// Value of cookie `name` in a `a=1; b=2` style string.
///
/// Names match exactly; a single optional space may precede each name.
pub fn read_cookie(raw: &str, name: &str) -> Option<String> {
    raw.split(';').find_map(|pair| {
        let pair = pair.strip_prefix(' ').unwrap_or(pair);
        let value = pair.strip_prefix(name)?.strip_prefix('=')?;
        Some(value.to_string())
    })
}
