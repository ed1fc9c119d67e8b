//! The `json` sample format: one JSON object per line.
//!
//! ```text
//! {"text": "back in my day", "age": 71}
//! {"text": "exams next week", "category": "18-24"}
//! ```

use std::path::PathBuf;

use clap::{ArgMatches, Args, Command, FromArgMatches};
use serde::Deserialize;

use super::{AgeBrackets, AuthorAgeSample, SampleStream, SampleStreamFactory, numbered_lines};
use crate::error::{AuthorAgeError, Result};

/// Format name of the JSON lines sample format.
pub const FORMAT_NAME: &str = "json";

/// Arguments contributed by the `json` format.
#[derive(Args, Debug, Clone)]
pub struct JsonFormatParams {
    /// Data to be used, one JSON object per line
    #[arg(long, value_name = "sampleData")]
    pub data: PathBuf,
}

#[derive(Debug, Deserialize)]
struct JsonSample {
    text: String,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    category: Option<String>,
}

/// Parse one JSON line into a sample.
pub fn parse_line(line: &str, brackets: &AgeBrackets) -> Result<AuthorAgeSample> {
    let record: JsonSample = serde_json::from_str(line)?;
    let category = match (record.category, record.age) {
        (Some(category), _) => category,
        (None, Some(age)) => brackets.category(age),
        (None, None) => {
            return Err(AuthorAgeError::format(
                "sample needs an \"age\" or a \"category\"",
            ));
        }
    };

    Ok(AuthorAgeSample {
        category,
        age: record.age,
        text: record.text,
    })
}

/// Factory for the `json` format.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSampleStreamFactory;

impl SampleStreamFactory for JsonSampleStreamFactory {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn augment_args(&self, cmd: Command) -> Command {
        JsonFormatParams::augment_args(cmd)
    }

    fn create(&self, matches: &ArgMatches, brackets: &AgeBrackets) -> Result<SampleStream> {
        let params = JsonFormatParams::from_arg_matches(matches)
            .map_err(|e| AuthorAgeError::invalid_argument(e.to_string()))?;
        let brackets = brackets.clone();
        let lines = numbered_lines(&params.data)?;

        Ok(Box::new(lines.map(move |line| {
            let (number, line) = line?;
            parse_line(&line, &brackets)
                .map_err(|e| AuthorAgeError::format(format!("line {number}: {e}")))
        })))
    }
}
