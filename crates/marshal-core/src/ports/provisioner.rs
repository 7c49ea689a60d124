//! Provisioner port - runs a rendered command on one unit.

use async_trait::async_trait;

use crate::domain::{Application, Unit};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisionError {
    #[error("unit {0:?} is unreachable")]
    Unreachable(String),

    #[error("command exited with status {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("{0}")]
    Other(String),
}

/// Execution backend.
///
/// Stateless per call from the dispatcher's point of view; the returned
/// string is whatever the command printed.
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn execute(
        &self,
        app: &Application,
        unit: &Unit,
        command: &str,
    ) -> Result<String, ProvisionError>;
}
