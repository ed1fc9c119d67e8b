//! The tool listing printed when no tool is given.

use std::fmt::Write;

use super::registry::ToolRegistry;

/// Spaces between the longest tool name and its description.
pub const DESCRIPTION_MARGIN: usize = 4;

/// Render the usage text: a header followed by one aligned line per tool.
pub fn render(program: &str, registry: &ToolRegistry) -> String {
    let column = registry.names().map(str::len).max().unwrap_or(0) + DESCRIPTION_MARGIN;

    let mut text = String::new();
    let _ = writeln!(text, "Usage: {program} TOOL");
    let _ = writeln!(text, "where TOOL is one of:");
    for tool in registry.iter() {
        let _ = writeln!(
            text,
            "  {:<column$}{}",
            tool.name(),
            tool.description()
        );
    }
    text
}
