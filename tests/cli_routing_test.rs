//! Integration tests for command routing with recording tools.

use std::io::Write;
use std::sync::{Arc, Mutex};

use authorage::cli::{
    BasicCmdLineTool, CmdLineTool, CommandRouter, TerminateTool, ToolDescriptor, ToolRegistry,
    TypedCmdLineTool,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Basic(Vec<String>),
    Typed(String, Vec<String>),
}

type Calls = Arc<Mutex<Vec<Call>>>;

struct RecordingBasic {
    calls: Calls,
    has_params: bool,
}

impl CmdLineTool for RecordingBasic {
    fn name(&self) -> &'static str {
        "agnostic"
    }

    fn short_description(&self) -> &'static str {
        "format-agnostic test tool"
    }

    fn has_params(&self) -> bool {
        self.has_params
    }
}

impl BasicCmdLineTool for RecordingBasic {
    fn help(&self) -> String {
        "agnostic help".to_string()
    }

    fn run(&self, args: &[String], out: &mut dyn Write) -> Result<(), TerminateTool> {
        self.calls.lock().unwrap().push(Call::Basic(args.to_vec()));
        writeln!(out, "agnostic ran")?;
        Ok(())
    }
}

struct RecordingTyped {
    calls: Calls,
}

impl CmdLineTool for RecordingTyped {
    fn name(&self) -> &'static str {
        "aware"
    }

    fn short_description(&self) -> &'static str {
        "format-aware test tool"
    }

    fn has_params(&self) -> bool {
        false
    }
}

impl TypedCmdLineTool for RecordingTyped {
    fn help(&self, format: &str) -> String {
        format!("aware help for {format}")
    }

    fn run(&self, format: &str, args: &[String], _out: &mut dyn Write) -> Result<(), TerminateTool> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Typed(format.to_string(), args.to_vec()));
        Ok(())
    }
}

struct FailingTool;

impl CmdLineTool for FailingTool {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn short_description(&self) -> &'static str {
        "always terminates"
    }
}

impl BasicCmdLineTool for FailingTool {
    fn help(&self) -> String {
        "failing help".to_string()
    }

    fn run(&self, args: &[String], _out: &mut dyn Write) -> Result<(), TerminateTool> {
        match args.first().map(String::as_str) {
            Some("cause") => Err(TerminateTool::failed(
                "could not read",
                std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt"),
            )),
            _ => Err(TerminateTool::new(7, "boom")),
        }
    }
}

struct Fixture {
    registry: ToolRegistry,
    calls: Calls,
}

impl Fixture {
    fn new(basic_has_params: bool) -> Self {
        let calls = Calls::default();
        let registry = ToolRegistry::builder()
            .register(ToolDescriptor::basic(RecordingBasic {
                calls: calls.clone(),
                has_params: basic_has_params,
            }))
            .unwrap()
            .register(ToolDescriptor::typed(RecordingTyped {
                calls: calls.clone(),
            }))
            .unwrap()
            .register(ToolDescriptor::basic(FailingTool))
            .unwrap()
            .register(ToolDescriptor::unsupported("legacy", "not runnable"))
            .unwrap()
            .build();
        Self { registry, calls }
    }

    fn route(&self, argv: &[&str]) -> (i32, String, String) {
        let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        let router = CommandRouter::new(&self.registry, "bin/test", "default");
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = router.route(&argv, &mut out, &mut err);
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[test]
fn test_no_arguments_prints_usage() {
    let fixture = Fixture::new(true);
    let (code, out, err) = fixture.route(&[]);

    assert_eq!(code, 0);
    assert!(out.starts_with("Usage: bin/test TOOL\nwhere TOOL is one of:\n"));
    assert!(out.contains("  agnostic    format-agnostic test tool\n"));
    assert!(out.contains("  legacy      not runnable\n"));
    assert!(err.is_empty());
    assert!(fixture.calls().is_empty());
}

#[test]
fn test_unknown_tool() {
    let fixture = Fixture::new(true);
    let (code, out, err) = fixture.route(&["unknownTool", "x"]);

    assert_eq!(code, 1);
    assert!(out.is_empty());
    assert_eq!(err, "Tool unknownTool is not found.\n");
    assert!(fixture.calls().is_empty());
}

#[test]
fn test_format_suffix_on_agnostic_tool() {
    let fixture = Fixture::new(true);
    let (code, _, err) = fixture.route(&["agnostic.someFormat", "x"]);

    assert_eq!(code, 1);
    assert_eq!(err, "Tool agnostic does not support formats.\n");
    assert!(fixture.calls().is_empty());
}

#[test]
fn test_agnostic_tool_gets_all_arguments() {
    let fixture = Fixture::new(true);
    let (code, out, _) = fixture.route(&["agnostic", "-a", "1", "help"]);

    assert_eq!(code, 0);
    assert_eq!(out, "agnostic ran\n");
    assert_eq!(
        fixture.calls(),
        vec![Call::Basic(vec!["-a".into(), "1".into(), "help".into()])]
    );
}

#[test]
fn test_aware_tool_without_params_runs_with_default_format() {
    let fixture = Fixture::new(true);
    let (code, out, _) = fixture.route(&["aware"]);

    assert_eq!(code, 0);
    assert!(out.is_empty());
    assert_eq!(fixture.calls(), vec![Call::Typed("default".into(), vec![])]);
}

#[test]
fn test_aware_tool_with_explicit_format() {
    let fixture = Fixture::new(true);
    let (code, _, _) = fixture.route(&["aware.json", "--x"]);

    assert_eq!(code, 0);
    assert_eq!(
        fixture.calls(),
        vec![Call::Typed("json".into(), vec!["--x".into()])]
    );
}

#[test]
fn test_help_is_printed_without_running() {
    let fixture = Fixture::new(true);

    let (code, out, _) = fixture.route(&["agnostic", "help"]);
    assert_eq!(code, 0);
    assert_eq!(out, "agnostic help\n");

    let (code, out, _) = fixture.route(&["aware.json", "help"]);
    assert_eq!(code, 0);
    assert_eq!(out, "aware help for json\n");

    let (code, out, _) = fixture.route(&["failing", "help"]);
    assert_eq!(code, 0);
    assert_eq!(out, "failing help\n");

    assert!(fixture.calls().is_empty());
}

#[test]
fn test_tool_with_params_and_no_arguments_prints_help() {
    let fixture = Fixture::new(true);
    let (code, out, _) = fixture.route(&["agnostic"]);

    assert_eq!(code, 0);
    assert_eq!(out, "agnostic help\n");
    assert!(fixture.calls().is_empty());
}

#[test]
fn test_tool_without_params_runs_with_no_arguments() {
    let fixture = Fixture::new(false);
    let (code, _, _) = fixture.route(&["agnostic"]);

    assert_eq!(code, 0);
    assert_eq!(fixture.calls(), vec![Call::Basic(vec![])]);
}

#[test]
fn test_termination_code_and_message() {
    let fixture = Fixture::new(true);
    let (code, out, err) = fixture.route(&["failing", "go"]);

    assert_eq!(code, 7);
    assert!(out.is_empty());
    assert_eq!(err, "boom\n");
}

#[test]
fn test_termination_with_cause() {
    let fixture = Fixture::new(true);
    let (code, _, err) = fixture.route(&["failing", "cause"]);

    assert_eq!(code, -1);
    assert_eq!(err, "could not read\nmissing.txt\n");
}

#[test]
fn test_unsupported_tool() {
    let fixture = Fixture::new(true);

    let (code, _, err) = fixture.route(&["legacy", "x"]);
    assert_eq!(code, 1);
    assert_eq!(err, "Tool legacy is not supported.\n");

    let (code, out, _) = fixture.route(&["legacy", "help"]);
    assert_eq!(code, 0);
    assert!(out.is_empty());
}
