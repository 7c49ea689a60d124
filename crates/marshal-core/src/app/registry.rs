//! ActionRegistry - action name → descriptor.
//!
//! Built during initialization (mutable), shared read-only afterwards.
//! Adding an action means registering one more descriptor; the dispatcher
//! itself never branches on action names.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::render::{ApprcRenderer, Renderer, RestartRenderer};
use crate::config::DispatcherConfig;
use crate::domain::{ActionName, Application, DispatchError, Status};
use crate::ports::Clock;

pub const START_APP: &str = "start-app";
pub const REGENERATE_APPRC: &str = "regenerate-apprc";

/// State an application must be in before an action renders anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// App and all units `started`; `error` and `down` get their own
    /// classification.
    AppReady,
    /// Any state is accepted.
    Always,
}

impl Precondition {
    /// Ordered policy: the special states are checked before generic
    /// readiness, and the not-ready message always cites the app status.
    pub fn check(self, app: &Application) -> Result<(), DispatchError> {
        match self {
            Precondition::Always => Ok(()),
            Precondition::AppReady => match app.status {
                Status::Error => Err(DispatchError::AppInErrorState),
                Status::Down => Err(DispatchError::AppDown),
                status if !app.is_ready() => Err(DispatchError::AppNotReady { status }),
                _ => Ok(()),
            },
        }
    }
}

#[derive(Clone)]
pub struct ActionDescriptor {
    pub name: ActionName,
    pub min_args: usize,
    pub precondition: Precondition,
    pub renderer: Arc<dyn Renderer>,
}

impl ActionDescriptor {
    pub fn new(
        name: impl Into<ActionName>,
        min_args: usize,
        precondition: Precondition,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            name: name.into(),
            min_args,
            precondition,
            renderer,
        }
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("precondition", &self.precondition)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("action '{0}' is already registered")]
    AlreadyRegistered(ActionName),
}

#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: HashMap<ActionName, ActionDescriptor>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// `start-app` and `regenerate-apprc`.
    pub fn builtin(config: &DispatcherConfig, clock: Arc<dyn Clock>) -> Self {
        let mut registry = Self::new();
        registry.actions.insert(
            ActionName::new(START_APP),
            ActionDescriptor::new(
                START_APP,
                1,
                Precondition::AppReady,
                Arc::new(RestartRenderer::new(config.restart_hook_path.clone())),
            ),
        );
        registry.actions.insert(
            ActionName::new(REGENERATE_APPRC),
            ActionDescriptor::new(
                REGENERATE_APPRC,
                1,
                Precondition::AppReady,
                Arc::new(ApprcRenderer::new(
                    config.apprc_path.clone(),
                    config.banner_tag.clone(),
                    clock,
                )),
            ),
        );
        registry
    }

    pub fn register(&mut self, descriptor: ActionDescriptor) -> Result<(), RegistryError> {
        if self.actions.contains_key(&descriptor.name) {
            return Err(RegistryError::AlreadyRegistered(descriptor.name));
        }
        self.actions.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, name: &ActionName) -> Option<&ActionDescriptor> {
        self.actions.get(name)
    }

    /// Sorted, so callers can compare against fixed lists.
    pub fn registered_actions(&self) -> Vec<ActionName> {
        let mut names: Vec<ActionName> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
