use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::MessageId;

/// Action identifier carried by a queued message (e.g. `regenerate-apprc`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionName(String);

impl ActionName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ActionName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A lifecycle action as it travels through the queue.
///
/// `args[0]` names the application, `args[1..]` optionally restrict the
/// units. Nothing is validated here: arity belongs to the action registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMessage {
    action: ActionName,
    #[serde(default)]
    args: Vec<String>,
}

impl ActionMessage {
    pub fn new<I, S>(action: impl Into<ActionName>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action: action.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn action(&self) -> &ActionName {
        &self.action
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn app_name(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Unit-name filter; empty means "every unit".
    pub fn unit_filter(&self) -> &[String] {
        self.args.get(1..).unwrap_or(&[])
    }
}

/// A leased message plus its delivery bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: MessageId,
    pub message: ActionMessage,

    /// How many times this message has been handed to a worker,
    /// including the current one.
    pub visits: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_app_name_and_unit_filter() {
        let msg = ActionMessage::new("start-app", ["totem", "totem/0", "totem/1"]);
        assert_eq!(msg.action().as_str(), "start-app");
        assert_eq!(msg.app_name(), Some("totem"));
        assert_eq!(msg.unit_filter(), ["totem/0", "totem/1"]);
    }

    #[test]
    fn empty_args_have_no_app_and_no_filter() {
        let msg = ActionMessage::new("regenerate-apprc", Vec::<String>::new());
        assert_eq!(msg.app_name(), None);
        assert!(msg.unit_filter().is_empty());
    }

    #[test]
    fn decodes_without_args_field() {
        let msg: ActionMessage = serde_json::from_str(r#"{"action":"regenerate-apprc"}"#).unwrap();
        assert_eq!(msg.action().as_str(), "regenerate-apprc");
        assert!(msg.args().is_empty());
    }
}
