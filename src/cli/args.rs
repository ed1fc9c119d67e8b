//! Command line parameters of the authorage tools, parsed with clap.

use std::io::Write;
use std::iter;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgMatches, Args, Command, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::TokenizerKind;
use crate::cli::{CMD, TerminateTool};
use crate::error::Result;
use crate::featuregen::FeatureGeneratorKind;
use crate::formats::AgeBrackets;
use crate::ml::classify::AgeClassifyContext;
use crate::ml::lasso::LassoParams;
use crate::ml::maxent::MaxentParams;
use crate::ml::predict::AgePredictContext;
use crate::ml::vectorizer::VectorizerParams;

/// Output format of tool results.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
}

/// How results are printed.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputParams {
    /// Output format
    #[arg(long = "output-format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Age bracket boundaries used to derive categories from numeric ages.
#[derive(Args, Debug, Clone)]
pub struct BracketParams {
    /// Lower bounds of the age brackets
    #[arg(
        long = "age-brackets",
        value_name = "AGES",
        value_delimiter = ',',
        default_value = "18,25,35,50,65"
    )]
    pub age_brackets: Vec<u32>,
}

impl BracketParams {
    /// Validated bracket table.
    pub fn brackets(&self) -> Result<AgeBrackets> {
        AgeBrackets::new(self.age_brackets.clone())
    }
}

/// Text analysis settings stored in trained models.
#[derive(Args, Debug, Clone)]
pub struct AnalysisParams {
    /// Tokenizer: whitespace, simple or unicode-word
    #[arg(long, default_value = "whitespace")]
    pub tokenizer: TokenizerKind,

    /// Comma separated feature generators, e.g. `bow,ngram:2:2`
    #[arg(long = "feature-generators", value_name = "GENERATORS", default_value = "bow,ngram:2:2")]
    pub feature_generators: String,
}

impl AnalysisParams {
    /// Context of an age classifier.
    pub fn classify_context(&self) -> Result<AgeClassifyContext> {
        Ok(AgeClassifyContext {
            tokenizer: self.tokenizer,
            feature_generators: FeatureGeneratorKind::parse_list(&self.feature_generators)?,
        })
    }

    /// Context of an age predictor.
    pub fn predict_context(&self, category_weight_divisor: usize) -> Result<AgePredictContext> {
        Ok(AgePredictContext {
            tokenizer: self.tokenizer,
            feature_generators: FeatureGeneratorKind::parse_list(&self.feature_generators)?,
            category_weight_divisor,
        })
    }
}

/// Maximum-entropy training parameters.
#[derive(Args, Debug, Clone)]
pub struct MaxentArgs {
    /// Language of the training data
    #[arg(long = "lang", value_name = "language", default_value = "en")]
    pub language: String,

    /// Number of training iterations
    #[arg(long, default_value_t = 100)]
    pub iterations: usize,

    /// Minimum number of times a feature must be seen
    #[arg(long, default_value_t = 5)]
    pub cutoff: usize,

    /// Gradient step size
    #[arg(long = "learning-rate", default_value_t = 1.0)]
    pub learning_rate: f64,

    /// L2 penalty on the weights
    #[arg(long, default_value_t = 1e-4)]
    pub l2: f64,
}

impl MaxentArgs {
    /// The trainer parameters.
    pub fn params(&self) -> MaxentParams {
        MaxentParams {
            iterations: self.iterations,
            cutoff: self.cutoff,
            learning_rate: self.learning_rate,
            l2: self.l2,
        }
    }
}

/// Worker pool used by the data-parallel tools.
#[derive(Args, Debug, Clone)]
pub struct ParallelParams {
    /// Number of worker threads (defaults to the number of CPUs)
    #[arg(long, value_name = "N", default_value_t = num_cpus::get())]
    pub threads: usize,
}

/// `AgeClassifyTrainer` parameters; sample data comes from the format.
#[derive(Parser, Debug, Clone)]
#[command(name = "AgeClassifyTrainer")]
pub struct ClassifyTrainerParams {
    /// Output file for the trained model
    #[arg(long, value_name = "modelFile")]
    pub model: PathBuf,

    #[command(flatten)]
    pub maxent: MaxentArgs,

    #[command(flatten)]
    pub analysis: AnalysisParams,

    #[command(flatten)]
    pub brackets: BracketParams,
}

/// `AgeClassify` parameters.
#[derive(Parser, Debug, Clone)]
#[command(name = "AgeClassify")]
pub struct ClassifyParams {
    /// Trained classification model
    #[arg(long, value_name = "modelFile")]
    pub model: PathBuf,

    /// Documents to classify, one per line (defaults to standard input)
    #[arg(long, value_name = "inputFile")]
    pub input: Option<PathBuf>,

    /// Also print the probability of every category
    #[arg(long)]
    pub probabilities: bool,

    #[command(flatten)]
    pub output: OutputParams,
}

/// `AgeClassifyEvaluator` parameters; sample data comes from the format.
#[derive(Parser, Debug, Clone)]
#[command(name = "AgeClassifyEvaluator")]
pub struct ClassifyEvaluatorParams {
    /// Trained classification model
    #[arg(long, value_name = "modelFile")]
    pub model: PathBuf,

    /// Print every misclassified sample
    #[arg(long)]
    pub misclassified: bool,

    #[command(flatten)]
    pub brackets: BracketParams,

    #[command(flatten)]
    pub output: OutputParams,
}

/// `AgeClassifySparkTrainer` parameters.
#[derive(Parser, Debug, Clone)]
#[command(name = "AgeClassifySparkTrainer")]
pub struct ClassifyParallelTrainerParams {
    /// Training data, one `label<TAB>text` sample per line
    #[arg(long, value_name = "sampleData")]
    pub data: PathBuf,

    /// Output file for the trained model
    #[arg(long, value_name = "modelFile")]
    pub model: PathBuf,

    #[command(flatten)]
    pub maxent: MaxentArgs,

    #[command(flatten)]
    pub analysis: AnalysisParams,

    #[command(flatten)]
    pub brackets: BracketParams,

    #[command(flatten)]
    pub parallel: ParallelParams,
}

/// `AgeClassifySparkEvaluator` parameters.
#[derive(Parser, Debug, Clone)]
#[command(name = "AgeClassifySparkEvaluator")]
pub struct ClassifyParallelEvaluatorParams {
    /// Evaluation data, one `label<TAB>text` sample per line
    #[arg(long, value_name = "sampleData")]
    pub data: PathBuf,

    /// Trained classification model
    #[arg(long, value_name = "modelFile")]
    pub model: PathBuf,

    /// Print every misclassified sample
    #[arg(long)]
    pub misclassified: bool,

    #[command(flatten)]
    pub brackets: BracketParams,

    #[command(flatten)]
    pub parallel: ParallelParams,

    #[command(flatten)]
    pub output: OutputParams,
}

/// `AgePredictTrainer` parameters.
#[derive(Parser, Debug, Clone)]
#[command(name = "AgePredictTrainer")]
pub struct PredictTrainerParams {
    /// Training data, one `age<TAB>text` sample per line
    #[arg(long, value_name = "sampleData")]
    pub data: PathBuf,

    /// Output file for the trained model
    #[arg(long, value_name = "modelFile")]
    pub model: PathBuf,

    /// Classification model whose categories become features
    #[arg(long = "classify-model", value_name = "modelFile")]
    pub classify_model: Option<PathBuf>,

    /// Language of the training data
    #[arg(long = "lang", value_name = "language", default_value = "en")]
    pub language: String,

    /// Maximum vocabulary size
    #[arg(long = "vocab-size", default_value_t = 1 << 18)]
    pub vocab_size: usize,

    /// Minimum number of documents a feature must occur in
    #[arg(long = "min-df", default_value_t = 1.0)]
    pub min_df: f64,

    /// Number of SGD iterations
    #[arg(long, default_value_t = 100)]
    pub iterations: usize,

    /// Initial SGD step size
    #[arg(long = "step-size", default_value_t = 1.0)]
    pub step_size: f64,

    /// L1 regularization strength
    #[arg(long = "reg-param", default_value_t = 0.01)]
    pub reg_param: f64,

    /// Fraction of the data sampled per iteration
    #[arg(long = "mini-batch-fraction", default_value_t = 1.0)]
    pub mini_batch_fraction: f64,

    /// Learn an intercept
    #[arg(long)]
    pub intercept: bool,

    /// Seed for mini-batch sampling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Tokens per copy of the category feature
    #[arg(long = "category-weight", default_value_t = 18)]
    pub category_weight_divisor: usize,

    #[command(flatten)]
    pub analysis: AnalysisParams,

    #[command(flatten)]
    pub brackets: BracketParams,
}

impl PredictTrainerParams {
    /// Vocabulary settings.
    pub fn vectorizer(&self) -> VectorizerParams {
        VectorizerParams {
            vocab_size: self.vocab_size,
            min_df: self.min_df,
            ..VectorizerParams::default()
        }
    }

    /// Regression settings.
    pub fn lasso(&self) -> LassoParams {
        LassoParams {
            iterations: self.iterations,
            step_size: self.step_size,
            reg_param: self.reg_param,
            mini_batch_fraction: self.mini_batch_fraction,
            fit_intercept: self.intercept,
            seed: self.seed,
        }
    }
}

/// `AgePredict` parameters.
#[derive(Parser, Debug, Clone)]
#[command(name = "AgePredict")]
pub struct PredictParams {
    /// Trained regression model
    #[arg(long, value_name = "modelFile")]
    pub model: PathBuf,

    /// Classification model used for the category feature
    #[arg(long = "classify-model", value_name = "modelFile")]
    pub classify_model: Option<PathBuf>,

    /// Documents to score, one per line (defaults to standard input)
    #[arg(long, value_name = "inputFile")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputParams,
}

/// `AgePredictEvaluator` parameters.
#[derive(Parser, Debug, Clone)]
#[command(name = "AgePredictEvaluator")]
pub struct PredictEvaluatorParams {
    /// Evaluation data, one `age<TAB>text` sample per line
    #[arg(long, value_name = "sampleData")]
    pub data: PathBuf,

    /// Trained regression model
    #[arg(long, value_name = "modelFile")]
    pub model: PathBuf,

    /// Classification model used for the category feature
    #[arg(long = "classify-model", value_name = "modelFile")]
    pub classify_model: Option<PathBuf>,

    #[command(flatten)]
    pub brackets: BracketParams,

    #[command(flatten)]
    pub output: OutputParams,
}

/// The command of `P` named as the tool is invoked.
pub fn tool_command<P: CommandFactory>(token: &str) -> Command {
    P::command().bin_name(format!("{CMD} {token}"))
}

/// Rendered help of a command.
pub fn render_help(mut cmd: Command) -> String {
    cmd.render_help().to_string()
}

/// Parse tool arguments against `cmd`.
///
/// `--help` prints the help to `out` and yields `None`; any other parse
/// failure terminates with code 1 and clap's message.
pub fn parse_matches(
    cmd: Command,
    args: &[String],
    out: &mut dyn Write,
) -> std::result::Result<Option<ArgMatches>, TerminateTool> {
    let name = cmd.get_name().to_string();
    match cmd.try_get_matches_from(iter::once(name).chain(args.iter().cloned())) {
        Ok(matches) => Ok(Some(matches)),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            write!(out, "{}", e.render())?;
            Ok(None)
        }
        Err(e) => Err(TerminateTool::new(1, e.render().to_string().trim_end())),
    }
}

/// Parse tool arguments into `P`.
pub fn parse_params<P: CommandFactory + FromArgMatches>(
    token: &str,
    args: &[String],
    out: &mut dyn Write,
) -> std::result::Result<Option<P>, TerminateTool> {
    let Some(matches) = parse_matches(tool_command::<P>(token), args, out)? else {
        return Ok(None);
    };
    P::from_arg_matches(&matches)
        .map(Some)
        .map_err(|e| TerminateTool::new(1, e.render().to_string().trim_end()))
}
