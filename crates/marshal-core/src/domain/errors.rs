//! Errors - dispatch failure taxonomy.
//!
//! `Display` of each variant is the exact text that ends up after the
//! `Error handling "<action>"...: ` prefix in the log.

use super::status::Status;

/// Operational classification of a failure.
///
/// - Transient: may succeed on redelivery without anyone intervening
/// - Permanent: redelivering the same message cannot help
/// - Infrastructure: a collaborator (store, provisioner) failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid action.")]
    InvalidAction,

    #[error("this action requires at least {required} argument{}.", plural(.required))]
    MissingArguments { required: usize },

    #[error("app {app:?} does not exist.")]
    AppNotFound { app: String },

    #[error("failed to load app {app:?}: {reason}.")]
    StoreUnavailable { app: String, reason: String },

    #[error("the app is in \"error\" state.")]
    AppInErrorState,

    #[error("the app is down.")]
    AppDown,

    #[error("The status of the app and all units should be \"started\" (the app is \"{status}\").")]
    AppNotReady { status: Status },

    #[error("failed to execute on unit {unit:?}: {reason}")]
    ExecutionFailed { unit: String, reason: String },
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 { "" } else { "s" }
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::AppNotReady { .. } => ErrorKind::Transient,
            DispatchError::StoreUnavailable { .. } | DispatchError::ExecutionFailed { .. } => {
                ErrorKind::Infrastructure
            }
            DispatchError::InvalidAction
            | DispatchError::MissingArguments { .. }
            | DispatchError::AppNotFound { .. }
            | DispatchError::AppInErrorState
            | DispatchError::AppDown => ErrorKind::Permanent,
        }
    }

    /// Worth handing the message back to the queue for another visit.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DispatchError::AppNotReady { .. } | DispatchError::StoreUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DispatchError::InvalidAction, "invalid action.")]
    #[case(
        DispatchError::MissingArguments { required: 1 },
        "this action requires at least 1 argument."
    )]
    #[case(
        DispatchError::MissingArguments { required: 2 },
        "this action requires at least 2 arguments."
    )]
    #[case(
        DispatchError::AppNotFound { app: "unknown-app".into() },
        "app \"unknown-app\" does not exist."
    )]
    #[case(DispatchError::AppInErrorState, "the app is in \"error\" state.")]
    #[case(DispatchError::AppDown, "the app is down.")]
    #[case(
        DispatchError::AppNotReady { status: Status::Pending },
        "The status of the app and all units should be \"started\" (the app is \"pending\")."
    )]
    fn messages_match_log_format(#[case] err: DispatchError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn only_not_ready_and_store_failures_are_retryable() {
        assert!(DispatchError::AppNotReady { status: Status::Pending }.is_retryable());
        assert!(
            DispatchError::StoreUnavailable {
                app: "a".into(),
                reason: "timeout".into()
            }
            .is_retryable()
        );
        assert!(!DispatchError::AppDown.is_retryable());
        assert!(!DispatchError::InvalidAction.is_retryable());
        assert_eq!(DispatchError::AppInErrorState.kind(), ErrorKind::Permanent);
    }
}
