//! Dispatcher - one action message in, validated commands out.
//!
//! Flow per message:
//! 1. registry lookup (InvalidAction)
//! 2. arity check (MissingArguments)
//! 3. store lookup (AppNotFound / StoreUnavailable)
//! 4. precondition policy (AppInErrorState / AppDown / AppNotReady)
//! 5. resolve targets → render → execute, one unit at a time
//!
//! A failure in 1-4 ends the message and is logged exactly once. Failures in
//! 5 are per unit and never stop the remaining units.

use std::sync::Arc;

use tracing::Instrument;

use super::registry::ActionRegistry;
use super::targets::resolve_targets;
use crate::domain::{ActionMessage, ActionName, Application, DispatchError, RenderedCommand, Unit};
use crate::observability::dispatch_span;
use crate::ports::{AppStore, LogSink, Provisioner, StoreError};

/// Result of running one rendered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitExecution {
    pub unit: Unit,
    pub command: String,

    /// Command output, or `ExecutionFailed`.
    pub result: Result<String, DispatchError>,
}

/// What happened to one message.
///
/// Message-level failures and per-unit failures travel separately: a
/// message can succeed while some of its units failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub action: ActionName,

    /// Set once the application was found in the store.
    pub app: Option<String>,

    pub result: Result<Vec<UnitExecution>, DispatchError>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn failure(&self) -> Option<&DispatchError> {
        self.result.as_ref().err()
    }

    pub fn executions(&self) -> &[UnitExecution] {
        match &self.result {
            Ok(executions) => executions,
            Err(_) => &[],
        }
    }

    /// Number of commands handed to the provisioner.
    pub fn executed_count(&self) -> usize {
        self.executions().len()
    }

    pub fn failed_units(&self) -> Vec<&str> {
        self.executions()
            .iter()
            .filter(|e| e.result.is_err())
            .map(|e| e.unit.name.as_str())
            .collect()
    }
}

/// `Error handling "<action>"[ for the app "<app>"]: <message>`
pub fn failure_line(action: &ActionName, app: Option<&str>, err: &DispatchError) -> String {
    match app {
        Some(app) => format!(
            "Error handling {:?} for the app {:?}: {err}",
            action.as_str(),
            app
        ),
        None => format!("Error handling {:?}: {err}", action.as_str()),
    }
}

/// Shared across workers; holds no per-message state.
pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
    store: Arc<dyn AppStore>,
    provisioner: Arc<dyn Provisioner>,
    log: Arc<dyn LogSink>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ActionRegistry>,
        store: Arc<dyn AppStore>,
        provisioner: Arc<dyn Provisioner>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            registry,
            store,
            provisioner,
            log,
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Sink the failure lines go to; workers reuse it for delivery warnings.
    pub fn log_sink(&self) -> &dyn LogSink {
        self.log.as_ref()
    }

    /// Handle one message end to end. Classified failures are reported,
    /// never propagated.
    pub async fn handle(&self, message: &ActionMessage) -> DispatchReport {
        let span = dispatch_span(message);
        self.handle_inner(message).instrument(span).await
    }

    async fn handle_inner(&self, message: &ActionMessage) -> DispatchReport {
        let action = message.action();

        let Some(descriptor) = self.registry.get(action) else {
            return self.fail(action, None, DispatchError::InvalidAction);
        };

        // Every action targets an application, so at least args[0].
        let required = descriptor.min_args.max(1);
        let Some(app_name) = message.app_name().filter(|_| message.args().len() >= required)
        else {
            return self.fail(action, None, DispatchError::MissingArguments { required });
        };

        let app = match self.store.find_application(app_name).await {
            Ok(app) => app,
            Err(StoreError::NotFound(_)) => {
                let err = DispatchError::AppNotFound {
                    app: app_name.to_string(),
                };
                return self.fail(action, None, err);
            }
            Err(StoreError::Unavailable(reason)) => {
                let err = DispatchError::StoreUnavailable {
                    app: app_name.to_string(),
                    reason,
                };
                return self.fail(action, None, err);
            }
        };

        if let Err(err) = descriptor.precondition.check(&app) {
            return self.fail(action, Some(&app.name), err);
        }

        let targets = resolve_targets(&app, message.unit_filter());
        let commands = descriptor.renderer.render_all(&app, &targets);
        let executions = self.execute_all(action, &app, commands).await;

        let failed = executions.iter().filter(|e| e.result.is_err()).count();
        tracing::info!(
            targets = executions.len(),
            failed,
            "action dispatched"
        );

        DispatchReport {
            action: action.clone(),
            app: Some(app.name.clone()),
            result: Ok(executions),
        }
    }

    /// Sequential, in target order. One unit failing does not stop the rest.
    async fn execute_all(
        &self,
        action: &ActionName,
        app: &Application,
        commands: Vec<RenderedCommand>,
    ) -> Vec<UnitExecution> {
        let mut executions = Vec::with_capacity(commands.len());
        for RenderedCommand { unit, command } in commands {
            let result = match self.provisioner.execute(app, &unit, &command).await {
                Ok(output) => Ok(output),
                Err(e) => {
                    let err = DispatchError::ExecutionFailed {
                        unit: unit.name.clone(),
                        reason: e.to_string(),
                    };
                    self.log.error(&failure_line(action, Some(&app.name), &err));
                    Err(err)
                }
            };
            executions.push(UnitExecution {
                unit,
                command,
                result,
            });
        }
        executions
    }

    fn fail(&self, action: &ActionName, app: Option<&str>, err: DispatchError) -> DispatchReport {
        self.log.error(&failure_line(action, app, &err));
        DispatchReport {
            action: action.clone(),
            app: app.map(str::to_string),
            result: Err(err),
        }
    }
}
