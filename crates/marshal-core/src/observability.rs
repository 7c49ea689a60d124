//! Logging setup and tracing spans.

use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::ActionMessage;

static INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    #[default]
    Pretty,
}

/// Installs the global subscriber. `RUST_LOG` wins over the `info` default.
///
/// Safe to call more than once; only the first call does anything, and an
/// already-installed global subscriber is left alone.
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // a subscriber installed by the host process takes precedence
        let installed = match format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .try_init(),
        };
        if let Err(e) = installed {
            tracing::debug!(error = %e, "global subscriber already set");
        }
    });
}

/// Span wrapping the handling of one message.
#[must_use]
pub fn dispatch_span(message: &ActionMessage) -> Span {
    tracing::info_span!(
        "dispatch",
        action = %message.action(),
        app = message.app_name().unwrap_or(""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Json);
    }

    #[test]
    fn dispatch_span_can_be_entered() {
        let msg = ActionMessage::new("start-app", ["nemesis"]);
        let span = dispatch_span(&msg);
        let _guard = span.enter();
        tracing::info!("inside dispatch span");
    }
}
