//! Command line interface: tool registry, router and the authorage tools.
//!
//! The `authorage` binary is invoked as `bin/authorage TOOL[.FORMAT] [args]`.
//! [`default_registry`] builds the table of tools once at start-up and
//! [`CommandRouter`] dispatches one command line to one of them.

pub mod args;
pub mod commands;
pub mod output;
pub mod registry;
pub mod router;
pub mod terminate;
pub mod tool;
pub mod usage;

use std::sync::Arc;

use crate::error::Result;
use crate::formats::StreamFactoryRegistry;

pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use router::{CommandRouter, InvocationRequest};
pub use terminate::TerminateTool;
pub use tool::{BasicCmdLineTool, CmdLineTool, ToolDescriptor, ToolHandler, TypedCmdLineTool};

use commands::*;

/// Program name shown in usage lines.
pub const CMD: &str = "bin/authorage";

/// Build the registry of every authorage tool, in listing order.
pub fn default_registry(formats: Arc<StreamFactoryRegistry>) -> Result<ToolRegistry> {
    Ok(ToolRegistry::builder()
        .register(ToolDescriptor::typed(AgeClassifyTrainerTool::new(formats.clone())))?
        .register(ToolDescriptor::basic(AgeClassifyTool))?
        .register(ToolDescriptor::typed(AgeClassifyEvaluatorTool::new(formats)))?
        .register(ToolDescriptor::basic(AgeClassifyParallelTrainerTool))?
        .register(ToolDescriptor::basic(AgeClassifyParallelEvaluatorTool))?
        .register(ToolDescriptor::basic(AgePredictTrainerTool))?
        .register(ToolDescriptor::basic(AgePredictTool))?
        .register(ToolDescriptor::basic(AgePredictEvaluatorTool))?
        .build())
}
