//! Target resolution: which units an action runs against.

use crate::domain::{Application, Unit};

/// Units of `app` selected by `filter`, in the app's stored order.
///
/// An empty filter selects every unit. Names that match no unit are
/// ignored; the caller gets fewer targets, never an error.
pub fn resolve_targets<'a>(app: &'a Application, filter: &[String]) -> Vec<&'a Unit> {
    if filter.is_empty() {
        return app.units.iter().collect();
    }

    let targets: Vec<&Unit> = app
        .units
        .iter()
        .filter(|unit| filter.iter().any(|name| *name == unit.name))
        .collect();

    if targets.len() < filter.len() {
        let unmatched: Vec<&str> = filter
            .iter()
            .filter(|name| !app.units.iter().any(|unit| unit.name == **name))
            .map(String::as_str)
            .collect();
        if !unmatched.is_empty() {
            tracing::debug!(app = %app.name, ?unmatched, "unit filter names matched no unit");
        }
    }

    targets
}
