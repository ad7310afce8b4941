use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ApiError;
use crate::models::Credentials;

/// Persists the bearer token between runs. Without a path the token is kept
/// in memory only.
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: Option<PathBuf>,
}

impl TokenStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn load(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        match fs::read_to_string(path) {
            Ok(token) => Some(token.trim().to_string()).filter(|token| !token.is_empty()),
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    log::warn!("Failed to read token from {}: {}", path.display(), err);
                }
                None
            }
        }
    }

    pub fn save(&self, token: &str) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, token)
    }

    pub fn clear(&self) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match fs::remove_file(path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

/// The logged-in state shared between the UI and the HTTP client.
#[derive(Clone, Debug)]
pub struct Session {
    token: Arc<Mutex<Option<String>>>,
    store: TokenStore,
}

impl Session {
    /// Picks up a token left by a previous run.
    pub fn open(store: TokenStore) -> Self {
        let token = store.load();
        if token.is_some() {
            log::info!("Restored saved login");
        }
        Self {
            token: Arc::new(Mutex::new(token)),
            store,
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn store_token(&self, token: String) {
        if let Err(err) = self.store.save(&token) {
            log::warn!("Failed to persist login token: {}", err);
        }
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        if let Err(err) = self.store.clear() {
            log::warn!("Failed to remove saved login token: {}", err);
        }
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

pub fn validate_credentials(username: &str, password: &str) -> Result<Credentials, ApiError> {
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Enter both username and password"));
    }
    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Text shown under the login form when logging in or registering fails.
pub fn auth_failure_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::Network(_) => "Error connecting to server".to_string(),
        ApiError::Validation(message) => message.clone(),
        other => other
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string()),
    }
}
