//! Turns a command line into a call on one registered tool.

use std::error::Error;
use std::io::Write;

use super::registry::ToolRegistry;
use super::terminate::TerminateTool;
use super::tool::ToolHandler;
use super::usage;

/// One parsed command line: `toolName[.formatName] [args...]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationRequest {
    /// The first argument as given.
    pub token: String,
    /// Tool name, the part before the first `.`.
    pub tool: String,
    /// Format name after the first `.`, if one was given.
    pub format: Option<String>,
    /// Everything after the first argument.
    pub args: Vec<String>,
}

impl InvocationRequest {
    /// Parse a command line without the program name. Returns `None` for an
    /// empty command line.
    pub fn parse(argv: &[String]) -> Option<Self> {
        let (token, args) = argv.split_first()?;
        let (tool, format) = match token.split_once('.') {
            Some((tool, format)) => (tool.to_string(), Some(format.to_string())),
            None => (token.clone(), None),
        };
        Some(Self {
            token: token.clone(),
            tool,
            format,
            args: args.to_vec(),
        })
    }

    /// The requested format, or `default` when no suffix was given.
    pub fn format_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.format.as_deref().unwrap_or(default)
    }

    /// Help is requested when the tool needs arguments and none were given,
    /// or when the first argument is `help`.
    pub fn wants_help(&self, has_params: bool) -> bool {
        (self.args.is_empty() && has_params) || self.args.first().is_some_and(|arg| arg == "help")
    }
}

/// Dispatches command lines to the tools of a registry.
pub struct CommandRouter<'a> {
    registry: &'a ToolRegistry,
    program: String,
    default_format: String,
}

impl<'a> CommandRouter<'a> {
    /// Create a router over `registry`. `program` is shown in the usage text.
    pub fn new<P: Into<String>, F: Into<String>>(
        registry: &'a ToolRegistry,
        program: P,
        default_format: F,
    ) -> Self {
        Self {
            registry,
            program: program.into(),
            default_format: default_format.into(),
        }
    }

    /// Route one command line and return the exit code. Regular output goes
    /// to `out`, diagnostics to `err`.
    pub fn route(&self, argv: &[String], out: &mut dyn Write, err: &mut dyn Write) -> i32 {
        let Some(request) = InvocationRequest::parse(argv) else {
            let _ = write!(out, "{}", usage::render(&self.program, self.registry));
            return 0;
        };

        match self.dispatch(&request, out) {
            Ok(()) => 0,
            Err(terminate) => {
                log::debug!("{} terminated with code {}", request.tool, terminate.code());
                report(&terminate, err);
                terminate.code()
            }
        }
    }

    fn dispatch(&self, request: &InvocationRequest, out: &mut dyn Write) -> Result<(), TerminateTool> {
        let tool = self
            .registry
            .lookup(&request.tool)
            .ok_or_else(|| TerminateTool::new(1, format!("Tool {} is not found.", request.tool)))?;

        let format = request.format_or(&self.default_format);

        if request.wants_help(tool.has_params()) {
            if let Some(help) = tool.help(format) {
                writeln!(out, "{help}")?;
            }
            return Ok(());
        }

        log::debug!("running {} ({:?}) with {} args", tool.name(), tool.handler(), request.args.len());

        match tool.handler() {
            ToolHandler::Typed(handler) => handler.run(format, &request.args, out),
            ToolHandler::Basic(handler) => {
                if request.format.is_some() {
                    return Err(TerminateTool::new(
                        1,
                        format!("Tool {} does not support formats.", request.tool),
                    ));
                }
                handler.run(&request.args, out)
            }
            ToolHandler::Unsupported => Err(TerminateTool::new(
                1,
                format!("Tool {} is not supported.", request.tool),
            )),
        }
    }
}

/// Print a termination: message, then the cause and its sources.
fn report(terminate: &TerminateTool, err: &mut dyn Write) {
    if let Some(message) = terminate.message() {
        let _ = writeln!(err, "{message}");
    }
    if let Some(cause) = terminate.cause() {
        let _ = writeln!(err, "{cause}");
        let mut source = cause.source();
        while let Some(inner) = source {
            let _ = writeln!(err, "Caused by: {inner}");
            source = inner.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_request() {
        assert_eq!(InvocationRequest::parse(&[]), None);

        let request = InvocationRequest::parse(&args(&["Tool.json.gz", "-x", "1"])).unwrap();
        assert_eq!(request.tool, "Tool");
        assert_eq!(request.format.as_deref(), Some("json.gz"));
        assert_eq!(request.args, args(&["-x", "1"]));
        assert_eq!(request.format_or("authorage"), "json.gz");

        let request = InvocationRequest::parse(&args(&["Tool"])).unwrap();
        assert_eq!(request.format, None);
        assert_eq!(request.format_or("authorage"), "authorage");
    }

    #[test]
    fn test_help_intent() {
        let bare = InvocationRequest::parse(&args(&["Tool"])).unwrap();
        assert!(bare.wants_help(true));
        assert!(!bare.wants_help(false));

        let help = InvocationRequest::parse(&args(&["Tool", "help", "x"])).unwrap();
        assert!(help.wants_help(false));

        let run = InvocationRequest::parse(&args(&["Tool", "--help"])).unwrap();
        assert!(!run.wants_help(true));
    }
}
