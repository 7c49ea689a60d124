//! Provisioner implementations that never leave the process.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::{Application, Unit};
use crate::ports::{ProvisionError, Provisioner};

/// One call the provisioner received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedCommand {
    pub app: String,
    pub unit: String,
    pub command: String,
}

#[derive(Default)]
struct Recorded {
    commands: Vec<ExecutedCommand>,
    failures: HashMap<String, ProvisionError>,
    output: String,
}

/// Records every command and answers with a canned output.
///
/// Units registered with `fail_unit` get the configured error instead
/// (the command is still recorded: it was attempted).
#[derive(Default)]
pub struct RecordingProvisioner {
    inner: Mutex<Recorded>,
}

impl RecordingProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare_output(&self, output: impl Into<String>) {
        self.lock().output = output.into();
    }

    pub fn fail_unit(&self, unit: impl Into<String>, err: ProvisionError) {
        self.lock().failures.insert(unit.into(), err);
    }

    pub fn commands(&self) -> Vec<ExecutedCommand> {
        self.lock().commands.clone()
    }

    /// Commands whose text equals `command` exactly.
    pub fn commands_matching(&self, command: &str) -> Vec<ExecutedCommand> {
        self.lock()
            .commands
            .iter()
            .filter(|c| c.command == command)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Provisioner for RecordingProvisioner {
    async fn execute(
        &self,
        app: &Application,
        unit: &Unit,
        command: &str,
    ) -> Result<String, ProvisionError> {
        let mut inner = self.lock();
        inner.commands.push(ExecutedCommand {
            app: app.name.clone(),
            unit: unit.name.clone(),
            command: command.to_string(),
        });
        match inner.failures.get(&unit.name) {
            Some(err) => Err(err.clone()),
            None => Ok(inner.output.clone()),
        }
    }
}

/// Dry-run backend: logs what would run and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProvisioner;

#[async_trait]
impl Provisioner for LoggingProvisioner {
    async fn execute(
        &self,
        app: &Application,
        unit: &Unit,
        command: &str,
    ) -> Result<String, ProvisionError> {
        tracing::info!(app = %app.name, unit = %unit.name, %command, "dry-run execute");
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;

    #[tokio::test]
    async fn records_commands_and_returns_prepared_output() {
        let provisioner = RecordingProvisioner::new();
        provisioner.prepare_output("exported");
        let app = Application::new("nemesis", Status::Started);
        let unit = Unit::new("nemesis/0", Status::Started);

        let out = provisioner.execute(&app, &unit, "echo hi").await.unwrap();

        assert_eq!(out, "exported");
        assert_eq!(
            provisioner.commands(),
            vec![ExecutedCommand {
                app: "nemesis".into(),
                unit: "nemesis/0".into(),
                command: "echo hi".into(),
            }]
        );
    }

    #[tokio::test]
    async fn failing_unit_still_records_the_attempt() {
        let provisioner = RecordingProvisioner::new();
        provisioner.fail_unit("nemesis/0", ProvisionError::Other("boom".into()));
        let app = Application::new("nemesis", Status::Started);
        let unit = Unit::new("nemesis/0", Status::Started);

        let err = provisioner.execute(&app, &unit, "true").await.unwrap_err();

        assert_eq!(err, ProvisionError::Other("boom".into()));
        assert_eq!(provisioner.commands().len(), 1);
    }

    #[tokio::test]
    async fn logging_provisioner_always_succeeds() {
        let app = Application::new("nemesis", Status::Started);
        let unit = Unit::new("nemesis/0", Status::Started);
        assert_eq!(LoggingProvisioner.execute(&app, &unit, "true").await, Ok(String::new()));
    }
}
