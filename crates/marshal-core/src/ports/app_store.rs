//! AppStore port - the durable application store, read-only from here.

use async_trait::async_trait;

use crate::domain::Application;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("app {0:?} not found")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Looks applications up by name.
///
/// Every call returns an owned snapshot; the dispatcher never writes back.
#[async_trait]
pub trait AppStore: Send + Sync {
    async fn find_application(&self, name: &str) -> Result<Application, StoreError>;
}
