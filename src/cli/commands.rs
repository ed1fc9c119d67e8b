//! The authorage tools.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::cli::{BasicCmdLineTool, CmdLineTool, TerminateTool, TypedCmdLineTool};
use crate::formats::{
    self, AgeBrackets, AuthorAgeSample, DEFAULT_FORMAT, SampleStreamFactory,
    StreamFactoryRegistry,
};
use crate::ml::classify::{self, AgeClassifyME};
use crate::ml::evaluation;
use crate::ml::predict::{self, AgePredictParams, AgePredictTrainer, AgePredicter};

type ToolResult = Result<(), TerminateTool>;

/// The token a tool was invoked with, for help and usage lines.
fn invocation(name: &str, format: &str) -> String {
    if format == DEFAULT_FORMAT {
        name.to_string()
    } else {
        format!("{name}.{format}")
    }
}

fn factory<'a>(
    formats: &'a StreamFactoryRegistry,
    format: &str,
) -> Result<&'a dyn SampleStreamFactory, TerminateTool> {
    formats.get(format).ok_or_else(|| {
        TerminateTool::new(
            1,
            format!(
                "Format {format} is not found. Available formats: {}",
                formats.format_names().join(", ")
            ),
        )
    })
}

/// Help of a format-aware tool: its own options plus the format's.
fn typed_help<P: CommandFactory>(formats: &StreamFactoryRegistry, name: &str, format: &str) -> String {
    match factory(formats, format) {
        Ok(factory) => render_help(factory.augment_args(tool_command::<P>(&invocation(name, format)))),
        Err(terminate) => terminate.to_string(),
    }
}

/// Parse the arguments of a format-aware tool.
fn typed_params<'a, P: CommandFactory + FromArgMatches>(
    formats: &'a StreamFactoryRegistry,
    name: &str,
    format: &str,
    args: &[String],
    out: &mut dyn Write,
) -> Result<Option<(P, ArgMatches, &'a dyn SampleStreamFactory)>, TerminateTool> {
    let factory = factory(formats, format)?;
    let cmd = factory.augment_args(tool_command::<P>(&invocation(name, format)));
    let Some(matches) = parse_matches(cmd, args, out)? else {
        return Ok(None);
    };
    let params = P::from_arg_matches(&matches)
        .map_err(|e| TerminateTool::new(1, e.render().to_string().trim_end()))?;
    Ok(Some((params, matches, factory)))
}

fn read_samples(
    factory: &dyn SampleStreamFactory,
    matches: &ArgMatches,
    brackets: &AgeBrackets,
) -> Result<Vec<AuthorAgeSample>, TerminateTool> {
    let stream = factory.create(matches, brackets)?;
    formats::collect_samples(stream)
        .map_err(|e| TerminateTool::failed("Failed to read sample data", e))
}

fn read_sample_file(path: &Path, brackets: &AgeBrackets) -> Result<Vec<AuthorAgeSample>, TerminateTool> {
    formats::authorage::open(path, brackets)
        .and_then(formats::collect_samples)
        .map_err(|e| TerminateTool::failed("Failed to read sample data", e))
}

fn load_classifier(path: &Path) -> Result<AgeClassifyME, TerminateTool> {
    AgeClassifyME::load(path)
        .map_err(|e| TerminateTool::failed(format!("Failed to load model {}", path.display()), e))
}

fn load_predicter(classify_model: Option<&Path>, model: &Path) -> Result<AgePredicter, TerminateTool> {
    AgePredicter::load(classify_model, model)
        .map_err(|e| TerminateTool::failed(format!("Failed to load model {}", model.display()), e))
}

/// Documents to process: the lines of `input`, or standard input.
fn open_documents(input: Option<&Path>) -> Result<Box<dyn BufRead>, TerminateTool> {
    match input {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                TerminateTool::failed(format!("Failed to open {}", path.display()), e)
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn thread_pool(params: &ParallelParams) -> Result<rayon::ThreadPool, TerminateTool> {
    if params.threads == 0 {
        return Err(TerminateTool::new(1, "--threads must be at least 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(params.threads)
        .build()
        .map_err(|e| TerminateTool::failed("Failed to start worker threads", e))
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn save_classify_model(
    model: &classify::AgeClassifyModel,
    path: &Path,
    start: Instant,
    out: &mut dyn Write,
) -> ToolResult {
    model
        .save(path)
        .map_err(|e| TerminateTool::failed("Failed to save model", e))?;
    let summary = TrainingSummary {
        model_path: path.display().to_string(),
        model_kind: classify::MODEL_KIND.to_string(),
        training_examples: model.metadata().training_examples,
        dimensions: model.categories().len(),
        duration_ms: elapsed_ms(start),
    };
    writeln!(out, "{summary}")?;
    Ok(())
}

fn write_classification_report(
    out: &mut dyn Write,
    output: &OutputParams,
    metrics: &evaluation::ClassificationMetrics,
    misclassified: bool,
) -> ToolResult {
    write_result(out, output, metrics)?;
    if misclassified && output.output_format == OutputFormat::Human {
        write!(out, "{}", MisclassifiedReport(&metrics.misclassified))?;
    }
    Ok(())
}

/// Trains an age classifier from samples in any registered format.
pub struct AgeClassifyTrainerTool {
    formats: Arc<StreamFactoryRegistry>,
}

impl AgeClassifyTrainerTool {
    pub fn new(formats: Arc<StreamFactoryRegistry>) -> Self {
        Self { formats }
    }
}

impl CmdLineTool for AgeClassifyTrainerTool {
    fn name(&self) -> &'static str {
        "AgeClassifyTrainer"
    }

    fn short_description(&self) -> &'static str {
        "trainer for the learnable age classifier"
    }
}

impl TypedCmdLineTool for AgeClassifyTrainerTool {
    fn help(&self, format: &str) -> String {
        typed_help::<ClassifyTrainerParams>(&self.formats, self.name(), format)
    }

    fn run(&self, format: &str, args: &[String], out: &mut dyn Write) -> ToolResult {
        let Some((params, matches, factory)) =
            typed_params::<ClassifyTrainerParams>(&self.formats, self.name(), format, args, out)?
        else {
            return Ok(());
        };
        let start = Instant::now();
        let brackets = params.brackets.brackets()?;
        let samples = read_samples(factory, &matches, &brackets)?;
        log::info!("read {} samples in format {format}", samples.len());

        let model = AgeClassifyME::train(
            &params.maxent.language,
            &samples,
            params.analysis.classify_context()?,
            &params.maxent.params(),
            false,
        )
        .map_err(|e| TerminateTool::failed("Training failed", e))?;

        save_classify_model(&model, &params.model, start, out)
    }
}

/// Classifies documents read line by line.
pub struct AgeClassifyTool;

impl CmdLineTool for AgeClassifyTool {
    fn name(&self) -> &'static str {
        "AgeClassify"
    }

    fn short_description(&self) -> &'static str {
        "learnable age classifier"
    }
}

impl BasicCmdLineTool for AgeClassifyTool {
    fn help(&self) -> String {
        render_help(tool_command::<ClassifyParams>(self.name()))
    }

    fn run(&self, args: &[String], out: &mut dyn Write) -> ToolResult {
        let Some(params) = parse_params::<ClassifyParams>(self.name(), args, out)? else {
            return Ok(());
        };
        let classifier = load_classifier(&params.model)?;

        for line in open_documents(params.input.as_deref())?.lines() {
            let text = line?;
            if text.trim().is_empty() {
                continue;
            }
            let categorization = classifier.categorize(&text)?;
            let probabilities = params.probabilities.then(|| {
                classifier
                    .scored_categories(&categorization.probabilities)
                    .into_iter()
                    .map(|(category, probability)| (category.to_string(), probability))
                    .collect()
            });
            let result = ClassificationResult {
                category: categorization.category,
                probabilities,
                text,
            };
            write_result(out, &params.output, &result)?;
        }
        Ok(())
    }
}

/// Measures classifier accuracy on samples in any registered format.
pub struct AgeClassifyEvaluatorTool {
    formats: Arc<StreamFactoryRegistry>,
}

impl AgeClassifyEvaluatorTool {
    pub fn new(formats: Arc<StreamFactoryRegistry>) -> Self {
        Self { formats }
    }
}

impl CmdLineTool for AgeClassifyEvaluatorTool {
    fn name(&self) -> &'static str {
        "AgeClassifyEvaluator"
    }

    fn short_description(&self) -> &'static str {
        "measures the performance of the age classifier"
    }
}

impl TypedCmdLineTool for AgeClassifyEvaluatorTool {
    fn help(&self, format: &str) -> String {
        typed_help::<ClassifyEvaluatorParams>(&self.formats, self.name(), format)
    }

    fn run(&self, format: &str, args: &[String], out: &mut dyn Write) -> ToolResult {
        let Some((params, matches, factory)) =
            typed_params::<ClassifyEvaluatorParams>(&self.formats, self.name(), format, args, out)?
        else {
            return Ok(());
        };
        let classifier = load_classifier(&params.model)?;
        let brackets = params.brackets.brackets()?;
        let samples = read_samples(factory, &matches, &brackets)?;

        let metrics = evaluation::evaluate_classifier(&classifier, &samples)?;
        write_classification_report(out, &params.output, &metrics, params.misclassified)
    }
}

/// Trains an age classifier with a pool of worker threads.
pub struct AgeClassifyParallelTrainerTool;

impl CmdLineTool for AgeClassifyParallelTrainerTool {
    fn name(&self) -> &'static str {
        "AgeClassifySparkTrainer"
    }

    fn short_description(&self) -> &'static str {
        "data-parallel trainer for the age classifier"
    }
}

impl BasicCmdLineTool for AgeClassifyParallelTrainerTool {
    fn help(&self) -> String {
        render_help(tool_command::<ClassifyParallelTrainerParams>(self.name()))
    }

    fn run(&self, args: &[String], out: &mut dyn Write) -> ToolResult {
        let Some(params) = parse_params::<ClassifyParallelTrainerParams>(self.name(), args, out)?
        else {
            return Ok(());
        };
        let start = Instant::now();
        let brackets = params.brackets.brackets()?;
        let samples = read_sample_file(&params.data, &brackets)?;
        let context = params.analysis.classify_context()?;
        let pool = thread_pool(&params.parallel)?;
        log::info!(
            "training on {} samples with {} threads",
            samples.len(),
            pool.current_num_threads()
        );

        let model = pool
            .install(|| {
                AgeClassifyME::train(
                    &params.maxent.language,
                    &samples,
                    context,
                    &params.maxent.params(),
                    true,
                )
            })
            .map_err(|e| TerminateTool::failed("Training failed", e))?;

        save_classify_model(&model, &params.model, start, out)
    }
}

/// Evaluates an age classifier with a pool of worker threads.
pub struct AgeClassifyParallelEvaluatorTool;

impl CmdLineTool for AgeClassifyParallelEvaluatorTool {
    fn name(&self) -> &'static str {
        "AgeClassifySparkEvaluator"
    }

    fn short_description(&self) -> &'static str {
        "data-parallel evaluator for the age classifier"
    }
}

impl BasicCmdLineTool for AgeClassifyParallelEvaluatorTool {
    fn help(&self) -> String {
        render_help(tool_command::<ClassifyParallelEvaluatorParams>(self.name()))
    }

    fn run(&self, args: &[String], out: &mut dyn Write) -> ToolResult {
        let Some(params) =
            parse_params::<ClassifyParallelEvaluatorParams>(self.name(), args, out)?
        else {
            return Ok(());
        };
        let classifier = load_classifier(&params.model)?;
        let brackets = params.brackets.brackets()?;
        let samples = read_sample_file(&params.data, &brackets)?;
        let pool = thread_pool(&params.parallel)?;

        let metrics =
            pool.install(|| evaluation::par_evaluate_classifier(&classifier, &samples))?;
        write_classification_report(out, &params.output, &metrics, params.misclassified)
    }
}

/// Trains the age regression model.
pub struct AgePredictTrainerTool;

impl CmdLineTool for AgePredictTrainerTool {
    fn name(&self) -> &'static str {
        "AgePredictTrainer"
    }

    fn short_description(&self) -> &'static str {
        "trainer for the age regression model"
    }
}

impl BasicCmdLineTool for AgePredictTrainerTool {
    fn help(&self) -> String {
        render_help(tool_command::<PredictTrainerParams>(self.name()))
    }

    fn run(&self, args: &[String], out: &mut dyn Write) -> ToolResult {
        let Some(params) = parse_params::<PredictTrainerParams>(self.name(), args, out)? else {
            return Ok(());
        };
        let start = Instant::now();
        let classifier = params
            .classify_model
            .as_deref()
            .map(load_classifier)
            .transpose()?;
        let brackets = params.brackets.brackets()?;
        let samples = read_sample_file(&params.data, &brackets)?;

        let trainer_params = AgePredictParams {
            context: params
                .analysis
                .predict_context(params.category_weight_divisor)?,
            vectorizer: params.vectorizer(),
            lasso: params.lasso(),
        };
        let model = AgePredictTrainer::new(classifier.as_ref(), trainer_params)
            .train(&params.language, &samples)
            .map_err(|e| TerminateTool::failed("Training failed", e))?;
        model
            .save(&params.model)
            .map_err(|e| TerminateTool::failed("Failed to save model", e))?;

        let summary = TrainingSummary {
            model_path: params.model.display().to_string(),
            model_kind: predict::MODEL_KIND.to_string(),
            training_examples: model.metadata().training_examples,
            dimensions: model.vocabulary().size(),
            duration_ms: elapsed_ms(start),
        };
        writeln!(out, "{summary}")?;
        Ok(())
    }
}

/// Predicts the author age of documents read line by line.
pub struct AgePredictTool;

impl CmdLineTool for AgePredictTool {
    fn name(&self) -> &'static str {
        "AgePredict"
    }

    fn short_description(&self) -> &'static str {
        "predicts a numeric author age"
    }
}

impl BasicCmdLineTool for AgePredictTool {
    fn help(&self) -> String {
        render_help(tool_command::<PredictParams>(self.name()))
    }

    fn run(&self, args: &[String], out: &mut dyn Write) -> ToolResult {
        let Some(params) = parse_params::<PredictParams>(self.name(), args, out)? else {
            return Ok(());
        };
        let predicter = load_predicter(params.classify_model.as_deref(), &params.model)?;

        for line in open_documents(params.input.as_deref())?.lines() {
            let text = line?;
            if text.trim().is_empty() {
                continue;
            }
            let prediction = predicter.predict(&text)?;
            let result = PredictionResult {
                age: prediction.age,
                category: prediction.category,
                text,
            };
            write_result(out, &params.output, &result)?;
        }
        Ok(())
    }
}

/// Measures regression error on samples with known ages.
pub struct AgePredictEvaluatorTool;

impl CmdLineTool for AgePredictEvaluatorTool {
    fn name(&self) -> &'static str {
        "AgePredictEvaluator"
    }

    fn short_description(&self) -> &'static str {
        "measures the performance of the age predictor"
    }
}

impl BasicCmdLineTool for AgePredictEvaluatorTool {
    fn help(&self) -> String {
        render_help(tool_command::<PredictEvaluatorParams>(self.name()))
    }

    fn run(&self, args: &[String], out: &mut dyn Write) -> ToolResult {
        let Some(params) = parse_params::<PredictEvaluatorParams>(self.name(), args, out)? else {
            return Ok(());
        };
        let predicter = load_predicter(params.classify_model.as_deref(), &params.model)?;
        let brackets = params.brackets.brackets()?;
        let samples = read_sample_file(&params.data, &brackets)?;

        let metrics = evaluation::evaluate_predicter(&predicter, &samples)?;
        if metrics.count == 0 {
            return Err(TerminateTool::new(
                -1,
                "No sample with a numeric age and features to evaluate",
            ));
        }
        write_result(out, &params.output, &metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_token() {
        assert_eq!(invocation("AgeClassifyTrainer", "authorage"), "AgeClassifyTrainer");
        assert_eq!(invocation("AgeClassifyTrainer", "json"), "AgeClassifyTrainer.json");
    }

    #[test]
    fn test_typed_help_lists_format_options() {
        let formats = StreamFactoryRegistry::with_default_formats();
        let help = typed_help::<ClassifyTrainerParams>(&formats, "AgeClassifyTrainer", "json");
        assert!(help.contains("--data"));
        assert!(help.contains("--model"));
        assert!(help.contains("AgeClassifyTrainer.json"));

        let help = typed_help::<ClassifyTrainerParams>(&formats, "AgeClassifyTrainer", "xml");
        assert!(help.contains("Format xml is not found"));
    }

    #[test]
    fn test_unknown_format_terminates() {
        let tool = AgeClassifyTrainerTool::new(Arc::new(StreamFactoryRegistry::with_default_formats()));
        let mut out = Vec::new();
        let err = tool
            .run("xml", &["--model".to_string(), "m.bin".to_string()], &mut out)
            .unwrap_err();
        assert_eq!(err.code(), 1);
        assert!(err.message().unwrap().contains("authorage, json"));
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");
        let mut out = Vec::new();
        let err = AgeClassifyTool
            .run(&["--model".to_string(), missing.display().to_string()], &mut out)
            .unwrap_err();
        assert_eq!(err.code(), -1);
        assert!(err.message().unwrap().starts_with("Failed to load model"));
        assert!(err.cause().is_some());
    }
}
