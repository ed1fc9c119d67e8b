//! Tool protocols and the descriptor the registry stores.

use std::fmt;
use std::io::Write;

use crate::cli::TerminateTool;

/// Common surface of every command line tool.
pub trait CmdLineTool: Send + Sync {
    /// Canonical name used as the first command line argument.
    fn name(&self) -> &'static str;

    /// One line shown in the tool listing.
    fn short_description(&self) -> &'static str;

    /// Whether the tool needs arguments; tools that do print their help when
    /// started without any.
    fn has_params(&self) -> bool {
        true
    }
}

/// A tool that does not read sample data and ignores formats.
pub trait BasicCmdLineTool: CmdLineTool {
    /// Help text of the tool.
    fn help(&self) -> String;

    /// Run the tool.
    fn run(&self, args: &[String], out: &mut dyn Write) -> Result<(), TerminateTool>;
}

/// A tool that reads samples in a format chosen with the `Tool.format`
/// suffix.
pub trait TypedCmdLineTool: CmdLineTool {
    /// Help text for the given format.
    fn help(&self, format: &str) -> String;

    /// Run the tool on samples in `format`.
    fn run(&self, format: &str, args: &[String], out: &mut dyn Write)
    -> Result<(), TerminateTool>;
}

/// How the router talks to a tool.
pub enum ToolHandler {
    /// Format-agnostic tool.
    Basic(Box<dyn BasicCmdLineTool>),
    /// Format-aware tool.
    Typed(Box<dyn TypedCmdLineTool>),
    /// Registered but not runnable.
    Unsupported,
}

impl ToolHandler {
    /// Short protocol name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolHandler::Basic(_) => "basic",
            ToolHandler::Typed(_) => "typed",
            ToolHandler::Unsupported => "unsupported",
        }
    }
}

impl fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// One entry of the tool registry.
#[derive(Debug)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    has_params: bool,
    handler: ToolHandler,
}

impl ToolDescriptor {
    /// Describe a format-agnostic tool.
    pub fn basic<T: BasicCmdLineTool + 'static>(tool: T) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.short_description().to_string(),
            has_params: tool.has_params(),
            handler: ToolHandler::Basic(Box::new(tool)),
        }
    }

    /// Describe a format-aware tool.
    pub fn typed<T: TypedCmdLineTool + 'static>(tool: T) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.short_description().to_string(),
            has_params: tool.has_params(),
            handler: ToolHandler::Typed(Box::new(tool)),
        }
    }

    /// Describe a tool that can be listed but not run.
    pub fn unsupported<N: Into<String>, D: Into<String>>(name: N, description: D) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            has_params: true,
            handler: ToolHandler::Unsupported,
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the tool needs arguments.
    pub fn has_params(&self) -> bool {
        self.has_params
    }

    /// The protocol handler.
    pub fn handler(&self) -> &ToolHandler {
        &self.handler
    }

    /// Help text, format-specific for format-aware tools. Unsupported tools
    /// have none.
    pub fn help(&self, format: &str) -> Option<String> {
        match &self.handler {
            ToolHandler::Basic(tool) => Some(tool.help()),
            ToolHandler::Typed(tool) => Some(tool.help(format)),
            ToolHandler::Unsupported => None,
        }
    }
}
