//! Application / Unit snapshot model.
//!
//! The dispatcher only ever reads these: the store hands out an owned
//! snapshot per message and nothing in the core writes it back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::status::{Status, all_started};

/// One running instance of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub status: Status,
}

impl Unit {
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// An environment variable attached to an application.
///
/// `public` decides whether the variable is written into the units' apprc.
/// Private variables must never leave the platform side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub public: bool,
}

impl EnvVar {
    pub fn public(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            public: true,
        }
    }

    pub fn private(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            public: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub status: Status,

    /// Stored order is significant: targeting preserves it.
    #[serde(default)]
    pub units: Vec<Unit>,

    /// Keyed by variable name.
    #[serde(default)]
    pub env: BTreeMap<String, EnvVar>,
}

impl Application {
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            status,
            units: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.units.push(unit);
        self
    }

    pub fn with_env(mut self, var: EnvVar) -> Self {
        self.env.insert(var.name.clone(), var);
        self
    }

    pub fn units_started(&self) -> bool {
        all_started(self.units.iter().map(|unit| &unit.status))
    }

    /// The app and every unit report `started`.
    pub fn is_ready(&self) -> bool {
        self.status.is_started() && self.units_started()
    }

    /// Variables that may be exposed to units, in name order.
    ///
    /// Yields the map key as the name: the key is what makes a variable
    /// unique, whatever the stored `EnvVar::name` says.
    pub fn public_env(&self) -> impl Iterator<Item = (&str, &EnvVar)> {
        self.env
            .iter()
            .filter(|(_, var)| var.public)
            .map(|(name, var)| (name.as_str(), var))
    }
}
