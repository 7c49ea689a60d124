//! DispatcherBuilder - Dispatcher の構築とワイヤリング
//!
//! - 組み込み action (start-app / regenerate-apprc) に追加の descriptor を足す
//! - expect_actions() で期待集合を宣言し、build() 時に不足を検出する (Fail-fast)

use std::sync::Arc;

use super::dispatcher::Dispatcher;
use super::registry::{ActionDescriptor, ActionRegistry, REGENERATE_APPRC, RegistryError, START_APP};
use crate::config::DispatcherConfig;
use crate::domain::ActionName;
use crate::impls::TracingLogSink;
use crate::ports::{AppStore, Clock, LogSink, Provisioner, SystemClock};

/// # 使用例
/// ```ignore
/// let dispatcher = DispatcherBuilder::new(store, provisioner)
///     .config(config.dispatcher.clone())
///     .register(stop_app_descriptor)?
///     .expect_actions(&["start-app", "stop-app"])
///     .build()?;
/// ```
pub struct DispatcherBuilder {
    store: Arc<dyn AppStore>,
    provisioner: Arc<dyn Provisioner>,
    config: DispatcherConfig,
    log: Arc<dyn LogSink>,
    clock: Arc<dyn Clock>,
    extra: Vec<ActionDescriptor>,
    expected_actions: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing actions: {0:?}. These actions were expected but not registered.")]
    MissingActions(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl DispatcherBuilder {
    pub fn new(store: Arc<dyn AppStore>, provisioner: Arc<dyn Provisioner>) -> Self {
        Self {
            store,
            provisioner,
            config: DispatcherConfig::default(),
            log: Arc::new(TracingLogSink),
            clock: Arc::new(SystemClock),
            extra: Vec::new(),
            expected_actions: None,
        }
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add an action next to the built-in ones. Names must be unique.
    pub fn register(mut self, descriptor: ActionDescriptor) -> Result<Self, RegistryError> {
        let taken = [START_APP, REGENERATE_APPRC].contains(&descriptor.name.as_str())
            || self.extra.iter().any(|d| d.name == descriptor.name);
        if taken {
            return Err(RegistryError::AlreadyRegistered(descriptor.name));
        }
        self.extra.push(descriptor);
        Ok(self)
    }

    pub fn expect_actions(mut self, actions: &[&str]) -> Self {
        self.expected_actions = Some(actions.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<Dispatcher, BuildError> {
        let mut registry = ActionRegistry::builtin(&self.config, self.clock);
        for descriptor in self.extra {
            registry.register(descriptor)?;
        }

        if let Some(expected) = &self.expected_actions {
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| registry.get(&ActionName::new(name.as_str())).is_none())
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingActions(missing));
            }
        }

        tracing::debug!(actions = ?registry.registered_actions(), "dispatcher built");
        Ok(Dispatcher::new(
            Arc::new(registry),
            self.store,
            self.provisioner,
            self.log,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::registry::Precondition;
    use crate::app::render::RestartRenderer;
    use crate::domain::{ActionMessage, Application, Status, Unit};
    use crate::impls::{InMemoryAppStore, MemoryLogSink, RecordingProvisioner};

    fn builder() -> (DispatcherBuilder, Arc<RecordingProvisioner>) {
        let store = Arc::new(InMemoryAppStore::with_apps([Application::new(
            "nemesis",
            Status::Stopped,
        )
        .with_unit(Unit::new("nemesis/0", Status::Stopped))]));
        let provisioner = Arc::new(RecordingProvisioner::new());
        (DispatcherBuilder::new(store, provisioner.clone()), provisioner)
    }

    fn stop_app() -> ActionDescriptor {
        ActionDescriptor::new(
            "stop-app",
            1,
            Precondition::Always,
            Arc::new(RestartRenderer::new("/var/lib/marshal/hooks/stop")),
        )
    }

    #[test]
    fn build_with_builtin_actions() {
        let (builder, _) = builder();
        let dispatcher = builder
            .expect_actions(&[START_APP, REGENERATE_APPRC])
            .build()
            .unwrap();
        assert_eq!(dispatcher.registry().len(), 2);
    }

    #[test]
    fn build_reports_missing_actions() {
        let (builder, _) = builder();
        let result = builder.expect_actions(&[START_APP, "stop-app"]).build();
        assert!(matches!(
            result,
            Err(BuildError::MissingActions(missing)) if missing == vec!["stop-app".to_string()]
        ));
    }

    #[test]
    fn register_rejects_builtin_names() {
        let (builder, _) = builder();
        let dup = ActionDescriptor::new(
            START_APP,
            1,
            Precondition::Always,
            Arc::new(RestartRenderer::new("/bin/true")),
        );
        assert!(matches!(
            builder.register(dup),
            Err(RegistryError::AlreadyRegistered(name)) if name.as_str() == START_APP
        ));
    }

    #[test]
    fn register_rejects_repeated_custom_action() {
        let (builder, _) = builder();
        let builder = builder.register(stop_app()).unwrap();
        assert!(builder.register(stop_app()).is_err());
    }

    #[tokio::test]
    async fn custom_action_is_dispatched() {
        let (builder, provisioner) = builder();
        let log = Arc::new(MemoryLogSink::new());
        let dispatcher = builder
            .log_sink(log.clone())
            .register(stop_app())
            .unwrap()
            .expect_actions(&["stop-app"])
            .build()
            .unwrap();

        let report = dispatcher
            .handle(&ActionMessage::new("stop-app", ["nemesis"]))
            .await;

        assert!(report.is_success());
        assert_eq!(
            provisioner.commands_matching("/var/lib/marshal/hooks/stop").len(),
            1
        );
        assert!(log.lines().is_empty());
    }

    #[tokio::test]
    async fn configured_hook_path_is_used() {
        let store = Arc::new(InMemoryAppStore::with_apps([Application::new(
            "totem",
            Status::Started,
        )
        .with_unit(Unit::new("totem/0", Status::Started))]));
        let provisioner = Arc::new(RecordingProvisioner::new());
        let config = DispatcherConfig {
            restart_hook_path: "/opt/hooks/restart".into(),
            ..DispatcherConfig::default()
        };
        let dispatcher = DispatcherBuilder::new(store, provisioner.clone())
            .config(config)
            .build()
            .unwrap();

        dispatcher
            .handle(&ActionMessage::new(START_APP, ["totem"]))
            .await;
        assert_eq!(provisioner.commands_matching("/opt/hooks/restart").len(), 1);
    }
}
