//! The `authorage` sample format: `label<TAB>text`, one sample per line.
//!
//! A numeric label is the author's age and the category is derived from the
//! configured [`AgeBrackets`]; any other label is taken as the category.

use std::path::PathBuf;

use clap::{ArgMatches, Args, Command, FromArgMatches};

use super::{AgeBrackets, AuthorAgeSample, SampleStream, SampleStreamFactory, numbered_lines};
use crate::error::{AuthorAgeError, Result};

/// Format name of the tab separated sample format.
pub const FORMAT_NAME: &str = "authorage";

/// Arguments contributed by the `authorage` format.
#[derive(Args, Debug, Clone)]
pub struct AuthorAgeFormatParams {
    /// Data to be used, one `label<TAB>text` sample per line
    #[arg(long, value_name = "sampleData")]
    pub data: PathBuf,
}

/// Parse one line of the `authorage` format.
pub fn parse_line(line: &str, brackets: &AgeBrackets) -> Result<AuthorAgeSample> {
    let (label, text) = line
        .split_once('\t')
        .ok_or_else(|| AuthorAgeError::format("expected <label><TAB><text>"))?;
    let label = label.trim();
    let text = text.trim();

    if label.is_empty() {
        return Err(AuthorAgeError::format("empty label"));
    }
    if text.is_empty() {
        return Err(AuthorAgeError::format("empty text"));
    }

    Ok(match label.parse::<u32>() {
        Ok(age) => AuthorAgeSample::with_age(age, text, brackets),
        Err(_) => AuthorAgeSample::with_category(label, text),
    })
}

/// Factory for the `authorage` format.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorAgeSampleStreamFactory;

impl SampleStreamFactory for AuthorAgeSampleStreamFactory {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn augment_args(&self, cmd: Command) -> Command {
        AuthorAgeFormatParams::augment_args(cmd)
    }

    fn create(&self, matches: &ArgMatches, brackets: &AgeBrackets) -> Result<SampleStream> {
        let params = AuthorAgeFormatParams::from_arg_matches(matches)
            .map_err(|e| AuthorAgeError::invalid_argument(e.to_string()))?;
        open(&params.data, brackets)
    }
}

/// Open an `authorage` file as a sample stream.
pub fn open(path: &std::path::Path, brackets: &AgeBrackets) -> Result<SampleStream> {
    let brackets = brackets.clone();
    let lines = numbered_lines(path)?;

    Ok(Box::new(lines.map(move |line| {
        let (number, line) = line?;
        parse_line(&line, &brackets)
            .map_err(|e| AuthorAgeError::format(format!("line {number}: {e}")))
    })))
}
