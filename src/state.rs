use crate::config::Config;
use crate::models::EntriesMap;
use crate::summary::GeminiClient;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub entries: Arc<Mutex<EntriesMap>>,
    pub uploads: UploadTracker,
    pub summarizer: Option<Arc<GeminiClient>>,
}

impl AppState {
    pub fn new(config: Config, entries: EntriesMap) -> Self {
        let summarizer = config
            .gemini
            .clone()
            .map(|gemini| Arc::new(GeminiClient::new(reqwest::Client::new(), gemini)));
        Self {
            config: Arc::new(config),
            entries: Arc::new(Mutex::new(entries)),
            uploads: UploadTracker::default(),
            summarizer,
        }
    }
}

/// Days with an image batch still being processed, counted per batch.
#[derive(Clone, Default)]
pub struct UploadTracker {
    pending: Arc<StdMutex<HashMap<String, usize>>>,
}

impl UploadTracker {
    pub fn begin(&self, date_key: &str) -> UploadGuard {
        self.with(|pending| *pending.entry(date_key.to_string()).or_insert(0) += 1);
        UploadGuard {
            tracker: self.clone(),
            date_key: date_key.to_string(),
        }
    }

    pub fn is_pending(&self, date_key: &str) -> bool {
        self.with(|pending| pending.contains_key(date_key))
    }

    fn with<T>(&self, f: impl FnOnce(&mut HashMap<String, usize>) -> T) -> T {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut pending)
    }
}

pub struct UploadGuard {
    tracker: UploadTracker,
    date_key: String,
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        self.tracker.with(|pending| {
            if let Some(count) = pending.get_mut(&self.date_key) {
                *count -= 1;
                if *count == 0 {
                    pending.remove(&self.date_key);
                }
            }
        });
    }
}
