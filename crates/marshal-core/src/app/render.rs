//! Payload renderers: Application snapshot + target unit → command string.

use std::sync::Arc;

use crate::domain::{Application, RenderedCommand, Unit};
use crate::ports::Clock;

/// Turns a snapshot into the command to run on one unit.
///
/// Must be pure with respect to the snapshot: renderers only read `app`
/// and `unit`.
pub trait Renderer: Send + Sync {
    fn render(&self, app: &Application, unit: &Unit) -> String;

    fn render_all(&self, app: &Application, targets: &[&Unit]) -> Vec<RenderedCommand> {
        targets
            .iter()
            .map(|unit| RenderedCommand::new((*unit).clone(), self.render(app, unit)))
            .collect()
    }
}

/// Runs the restart hook; ignores the application's configuration.
#[derive(Debug, Clone)]
pub struct RestartRenderer {
    hook_path: String,
}

impl RestartRenderer {
    pub fn new(hook_path: impl Into<String>) -> Self {
        Self {
            hook_path: hook_path.into(),
        }
    }
}

impl Renderer for RestartRenderer {
    fn render(&self, _app: &Application, _unit: &Unit) -> String {
        self.hook_path.clone()
    }
}

/// Writes the public environment of the app into the apprc file.
///
/// ```text
/// cat > /home/application/apprc <<'END'
/// # generated by marshal at 2024-01-01T12:00:00+00:00
/// export http_proxy="http://myproxy.com:3128/"
/// END
/// ```
pub struct ApprcRenderer {
    path: String,
    banner_tag: String,
    clock: Arc<dyn Clock>,
}

impl ApprcRenderer {
    pub fn new(path: impl Into<String>, banner_tag: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            banner_tag: banner_tag.into(),
            clock,
        }
    }

    fn body(&self, app: &Application) -> Vec<String> {
        let mut lines = Vec::with_capacity(app.env.len() + 1);
        lines.push(format!(
            "# generated by {} at {}",
            self.banner_tag,
            self.clock.now().to_rfc3339()
        ));
        for (name, var) in app.public_env() {
            if !is_shell_name(name) {
                tracing::warn!(app = %app.name, name, "skipping env var with invalid shell name");
                continue;
            }
            lines.push(format!("export {name}=\"{}\"", escape_double_quoted(&var.value)));
        }
        lines
    }
}

impl Renderer for ApprcRenderer {
    fn render(&self, app: &Application, _unit: &Unit) -> String {
        let body = self.body(app);
        let delimiter = heredoc_delimiter(&body);
        let mut script = format!("cat > {} <<'{}'\n", self.path, delimiter);
        for line in &body {
            script.push_str(line);
            script.push('\n');
        }
        script.push_str(&delimiter);
        script.push('\n');
        script
    }
}

/// Escapes a value for use between double quotes in a sourced shell file.
pub fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `[A-Za-z_][A-Za-z0-9_]*`, the only names `export` may see unquoted.
pub fn is_shell_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `END`, unless a body line would terminate the heredoc early.
fn heredoc_delimiter(body: &[String]) -> String {
    let taken = |candidate: &str| body.iter().any(|line| line.lines().any(|l| l == candidate));
    let mut delimiter = String::from("END");
    let mut n = 0;
    while taken(delimiter.as_str()) {
        n += 1;
        delimiter = format!("END_{n}");
    }
    delimiter
}
