//! Sample formats and the registry of sample stream factories.
//!
//! A format is selected on the command line with the `Tool.format` suffix.
//! Each factory contributes its own arguments to the tool's command line and
//! turns the parsed values into a stream of [`AuthorAgeSample`]s.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;
use clap::{ArgMatches, Command};

use crate::error::{AuthorAgeError, Result};

pub mod authorage;
pub mod json;
pub mod sample;

pub use authorage::AuthorAgeSampleStreamFactory;
pub use json::JsonSampleStreamFactory;
pub use sample::{AgeBrackets, AuthorAgeSample};

/// Name of the default sample format.
pub const DEFAULT_FORMAT: &str = authorage::FORMAT_NAME;

/// A lazily read stream of samples.
pub type SampleStream = Box<dyn Iterator<Item = Result<AuthorAgeSample>>>;

/// Creates sample streams for one format.
pub trait SampleStreamFactory: Send + Sync {
    /// The format name used after the `.` in a tool token.
    fn format_name(&self) -> &'static str;

    /// Add this format's arguments to a tool command.
    fn augment_args(&self, cmd: Command) -> Command;

    /// Open a sample stream from matches of an augmented command.
    fn create(&self, matches: &ArgMatches, brackets: &AgeBrackets) -> Result<SampleStream>;
}

/// Registry of sample formats, keyed by format name.
#[derive(Default)]
pub struct StreamFactoryRegistry {
    factories: AHashMap<&'static str, Box<dyn SampleStreamFactory>>,
}

impl StreamFactoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in format.
    pub fn with_default_formats() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(AuthorAgeSampleStreamFactory));
        registry.register(Box::new(JsonSampleStreamFactory));
        registry
    }

    /// Register a factory under its format name, replacing any previous one.
    pub fn register(&mut self, factory: Box<dyn SampleStreamFactory>) {
        self.factories.insert(factory.format_name(), factory);
    }

    /// Look up the factory of `format`.
    pub fn get(&self, format: &str) -> Option<&dyn SampleStreamFactory> {
        self.factories.get(format).map(|factory| factory.as_ref())
    }

    /// Registered format names, sorted.
    pub fn format_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Read all samples of a stream into memory.
pub fn collect_samples(stream: SampleStream) -> Result<Vec<AuthorAgeSample>> {
    stream.collect()
}

/// Iterate over the non-blank lines of `path` with their 1-based numbers.
pub(crate) fn numbered_lines(
    path: &Path,
) -> Result<Box<dyn Iterator<Item = Result<(usize, String)>>>> {
    let file = File::open(path).map_err(|e| {
        AuthorAgeError::format(format!("cannot open sample data {}: {e}", path.display()))
    })?;

    Ok(Box::new(BufReader::new(file).lines().enumerate().filter_map(
        |(index, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(Ok((index + 1, line))),
            Err(e) => Some(Err(AuthorAgeError::from(e))),
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formats_registered() {
        let registry = StreamFactoryRegistry::with_default_formats();
        assert_eq!(registry.format_names(), vec!["authorage", "json"]);
        assert!(registry.get(DEFAULT_FORMAT).is_some());
        assert!(registry.get("conllx").is_none());
    }
}
