//! The termination signal returned by tools.

use std::error::Error;
use std::io;

use thiserror::Error;

use crate::error::AuthorAgeError;

/// Boxed underlying cause of a termination.
pub type Cause = Box<dyn Error + Send + Sync + 'static>;

/// A tool asks the process to stop with an exit code.
///
/// Tools return this instead of exiting; the router prints the message, the
/// cause and its source chain, and turns the code into the process status.
#[derive(Debug, Error)]
#[error("{}", .message.as_deref().unwrap_or("tool terminated"))]
pub struct TerminateTool {
    code: i32,
    message: Option<String>,
    #[source]
    cause: Option<Cause>,
}

impl TerminateTool {
    /// Terminate with `code` and a message.
    pub fn new<S: Into<String>>(code: i32, message: S) -> Self {
        Self {
            code,
            message: Some(message.into()),
            cause: None,
        }
    }

    /// Terminate with `code` and nothing to print.
    pub fn code_only(code: i32) -> Self {
        Self {
            code,
            message: None,
            cause: None,
        }
    }

    /// Terminate with `code`, a message and the error that caused it.
    pub fn with_cause<S, E>(code: i32, message: S, cause: E) -> Self
    where
        S: Into<String>,
        E: Into<Cause>,
    {
        Self {
            code,
            message: Some(message.into()),
            cause: Some(cause.into()),
        }
    }

    /// A failure of the work a tool performs (exit status `-1`).
    pub fn failed<S, E>(message: S, cause: E) -> Self
    where
        S: Into<String>,
        E: Into<Cause>,
    {
        Self::with_cause(-1, message, cause)
    }

    /// The exit code.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// The message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The underlying cause, if any.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl From<AuthorAgeError> for TerminateTool {
    fn from(error: AuthorAgeError) -> Self {
        Self {
            code: -1,
            message: None,
            cause: Some(Box::new(error)),
        }
    }
}

impl From<io::Error> for TerminateTool {
    fn from(error: io::Error) -> Self {
        Self::failed("I/O failure", error)
    }
}
