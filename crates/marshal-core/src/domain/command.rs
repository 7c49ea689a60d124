use serde::{Deserialize, Serialize};

use super::application::Unit;

/// A command rendered for exactly one target unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedCommand {
    pub unit: Unit,
    pub command: String,
}

impl RenderedCommand {
    pub fn new(unit: Unit, command: impl Into<String>) -> Self {
        Self {
            unit,
            command: command.into(),
        }
    }
}
