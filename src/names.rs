//! Name-list client: fetches available LoRA names from the host endpoint,
//! with a shared last-writer-wins cache and sentinel fallbacks on failure.

use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use log::error;
use thiserror::Error;

use crate::traits::NameSource;
use crate::types::{LORA_ENDPOINT, NONE_LORA};

#[derive(Debug, Error)]
pub enum NameSourceError {
    #[error("endpoint returned status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Shared cache of fetched names.
///
/// Advisory data only: overlapping fetch completions overwrite each other
/// in completion order and the cache is re-read on next use.
#[derive(Clone)]
pub struct NameCache {
    inner: Arc<Mutex<Vec<String>>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(vec![NONE_LORA.to_string()])),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn store(&self, names: Vec<String>) {
        *self.lock() = names;
    }
}

impl Default for NameCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a fetch failure to the visible sentinel list, so the user sees an
/// "ERROR: ..." choice instead of a silent empty menu.
pub fn fallback_names(err: &NameSourceError) -> Vec<String> {
    let reason = match err {
        NameSourceError::Status(code) => format!("ERROR: {code}"),
        NameSourceError::Network(_) => "ERROR: Network Error".to_string(),
        NameSourceError::Decode(_) => "ERROR: Fetch Failed".to_string(),
    };
    vec![NONE_LORA.to_string(), reason]
}

/// Kick off a non-blocking fetch. The completion updates `cache`
/// (last-writer-wins) and delivers the list on the returned channel, which
/// gates presentation of the selection menu. Dropping the receiver is fine;
/// the cache still gets the update.
pub fn spawn_fetch(source: Arc<dyn NameSource>, cache: NameCache) -> mpsc::Receiver<Vec<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let names = match source.fetch_names() {
            Ok(names) => names,
            Err(err) => {
                error!("failed to fetch LoRA list: {err}");
                fallback_names(&err)
            }
        };
        cache.store(names.clone());
        let _ = tx.send(names);
    });
    rx
}

/// HTTP client for the `/oshtz-nodes/get-loras` endpoint.
pub struct HttpNameSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpNameSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl NameSource for HttpNameSource {
    fn fetch_names(&self) -> Result<Vec<String>, NameSourceError> {
        let url = format!("{}{}", self.base_url, LORA_ENDPOINT);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| NameSourceError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(NameSourceError::Status(status.as_u16()));
        }
        let names: Vec<String> = response
            .json()
            .map_err(|e| NameSourceError::Decode(e.to_string()))?;
        if names.is_empty() {
            return Err(NameSourceError::Decode("empty name list".to_string()));
        }
        Ok(names)
    }
}
