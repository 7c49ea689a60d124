//! Status - application / unit lifecycle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state shared by applications and units.
///
/// Only two questions matter to the dispatcher:
/// - is it `Started`?
/// - is it one of the specially reported states (`Error`, `Down`)?
///
/// The other members exist so the store can round-trip whatever the
/// provisioning side writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Created,
    Pending,
    Building,
    Installing,
    Started,
    Stopped,
    Error,
    Down,
}

impl Status {
    pub const ALL: [Status; 8] = [
        Status::Created,
        Status::Pending,
        Status::Building,
        Status::Installing,
        Status::Started,
        Status::Stopped,
        Status::Error,
        Status::Down,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Created => "created",
            Status::Pending => "pending",
            Status::Building => "building",
            Status::Installing => "installing",
            Status::Started => "started",
            Status::Stopped => "stopped",
            Status::Error => "error",
            Status::Down => "down",
        }
    }

    pub fn is_started(self) -> bool {
        self == Status::Started
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status {0:?}")]
pub struct StatusParseError(pub String);

impl FromStr for Status {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusParseError(s.to_string()))
    }
}

/// Vacuously true for an empty collection: an application without units
/// must not be blocked by them.
pub fn all_started<'a, I>(statuses: I) -> bool
where
    I: IntoIterator<Item = &'a Status>,
{
    statuses.into_iter().all(|status| status.is_started())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("created", Status::Created)]
    #[case("pending", Status::Pending)]
    #[case("started", Status::Started)]
    #[case("error", Status::Error)]
    #[case("down", Status::Down)]
    fn parses_lowercase_tokens(#[case] token: &str, #[case] expected: Status) {
        assert_eq!(token.parse::<Status>().unwrap(), expected);
        assert_eq!(expected.to_string(), token);
    }

    #[test]
    fn rejects_unknown_token() {
        let err = "blabla".parse::<Status>().unwrap_err();
        assert_eq!(err, StatusParseError("blabla".to_string()));
    }

    #[test]
    fn serializes_as_lowercase() {
        let s = serde_json::to_string(&Status::Installing).unwrap();
        assert_eq!(s, "\"installing\"");
        let back: Status = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(back, Status::Down);
    }

    #[rstest]
    #[case(vec![Status::Started, Status::Started, Status::Started], true)]
    #[case(vec![], true)]
    #[case(vec![Status::Started, Status::Pending], false)]
    #[case(vec![Status::Error], false)]
    fn all_started_table(#[case] statuses: Vec<Status>, #[case] expected: bool) {
        assert_eq!(all_started(&statuses), expected);
    }

    #[test]
    fn all_started_is_false_iff_some_status_differs() {
        for status in Status::ALL {
            let statuses = [Status::Started, status, Status::Started];
            assert_eq!(all_started(&statuses), status == Status::Started);
        }
    }
}
