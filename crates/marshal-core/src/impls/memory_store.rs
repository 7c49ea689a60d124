//! InMemoryAppStore - 開発・テスト用のアプリケーションストア

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::Application;
use crate::ports::{AppStore, StoreError};

/// Application store backed by a `HashMap`.
///
/// Also counts lookups and can be switched into an "unavailable" mode so
/// tests can observe what the dispatcher asks for.
#[derive(Default)]
pub struct InMemoryAppStore {
    apps: RwLock<HashMap<String, Application>>,
    lookups: AtomicUsize,
    outage: Mutex<Option<String>>,
}

impl InMemoryAppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apps(apps: impl IntoIterator<Item = Application>) -> Self {
        let store = Self::new();
        for app in apps {
            store.insert(app);
        }
        store
    }

    /// Insert or replace by name.
    pub fn insert(&self, app: Application) {
        self.apps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(app.name.clone(), app);
    }

    pub fn remove(&self, name: &str) -> Option<Application> {
        self.apps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// `Some(reason)` makes every lookup fail with `Unavailable(reason)`.
    pub fn set_unavailable(&self, reason: Option<String>) {
        *self.outage.lock().unwrap_or_else(PoisonError::into_inner) = reason;
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AppStore for InMemoryAppStore {
    async fn find_application(&self, name: &str) -> Result<Application, StoreError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if let Some(reason) = self
            .outage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(StoreError::Unavailable(reason));
        }
        self.apps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}
