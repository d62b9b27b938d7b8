//! JSON on stdout.

use serde::Serialize;
use std::io::Write;

/// Render a value as pretty or single-line JSON.
pub fn render<T: Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

/// Print a value to stdout followed by a newline.
pub fn print_json<T: Serialize>(value: &T, compact: bool) -> anyhow::Result<()> {
    let text = render(value, compact)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    stdout.flush()?;
    Ok(())
}
