//! Predict the author age of one document with locally stored models.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use authorage::config::PredictorConfig;
use authorage::ml::classify::AgeClassifyME;
use authorage::ml::predict::{AgePredictModel, AgePredicter};

/// Predict an author's age from one document
#[derive(Parser, Debug)]
#[command(name = "age-predicter-local")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// JSON config file
    #[arg(short, long, env = "AUTHORAGE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Age classification model
    #[arg(long = "classify-model", value_name = "FILE")]
    classify_model: Option<PathBuf>,

    /// Age regression model
    #[arg(long = "regression-model", value_name = "FILE")]
    regression_model: Option<PathBuf>,

    /// Document to score
    #[arg(short, long)]
    document: Option<String>,

    /// Tokens per copy of the category feature (defaults to the model's)
    #[arg(long = "category-weight", value_name = "N")]
    category_weight_divisor: Option<usize>,

    /// Verbosity level (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }

    fn config(&self) -> Result<PredictorConfig> {
        let mut config = match &self.config {
            Some(path) => PredictorConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PredictorConfig::default(),
        };
        if let Some(path) = &self.classify_model {
            config.classify_model = path.clone();
        }
        if let Some(path) = &self.regression_model {
            config.regression_model = path.clone();
        }
        if let Some(document) = &self.document {
            config.document = document.clone();
        }
        if self.category_weight_divisor.is_some() {
            config.category_weight_divisor = self.category_weight_divisor;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    Builder::new()
        .filter_level(args.log_level())
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let config = args.config()?;

    let classifier = AgeClassifyME::load(&config.classify_model).with_context(|| {
        format!(
            "Failed to load classification model {}",
            config.classify_model.display()
        )
    })?;
    let model = AgePredictModel::load(&config.regression_model).with_context(|| {
        format!(
            "Failed to load regression model {}",
            config.regression_model.display()
        )
    })?;

    let predicter = config.apply(AgePredicter::new(Some(classifier), model)?)?;

    let prediction = predicter
        .predict(&config.document)
        .context("Prediction failed")?;
    log::info!(
        "{} tokens, category {}",
        prediction.token_count,
        prediction.category.as_deref().unwrap_or("-")
    );

    println!("{}", prediction.age);
    Ok(())
}
