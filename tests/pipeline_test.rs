//! End-to-end tests: train, apply and evaluate models through the tool router.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use authorage::cli::{self, CommandRouter};
use authorage::formats::{DEFAULT_FORMAT, StreamFactoryRegistry};
use authorage::ml::predict::AgePredicter;
use tempfile::TempDir;

const TRAINING_DATA: &str = "\
19\tlol exams tomorrow and the party tonight
21\tomg the party was lit lol
20\tstudying for exams all night lol
22\tparty with friends after exams

70\tmy grandchildren visited the garden today
72\tpension plans and the garden need attention
68\tthe grandchildren love my garden
75\tretired life with pension and grandchildren
";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("train.txt"), TRAINING_DATA).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).display().to_string()
    }

    fn route(&self, argv: &[&str]) -> (i32, String, String) {
        let formats = Arc::new(StreamFactoryRegistry::with_default_formats());
        let registry = cli::default_registry(formats).unwrap();
        let router = CommandRouter::new(&registry, cli::CMD, DEFAULT_FORMAT);
        let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = router.route(&argv, &mut out, &mut err);
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    fn train_classifier(&self) -> String {
        let model = self.path("classify.bin");
        let (code, out, err) = self.route(&[
            "AgeClassifyTrainer",
            "--data",
            &self.path("train.txt"),
            "--model",
            &model,
            "--cutoff",
            "1",
        ]);
        assert_eq!(code, 0, "{err}");
        assert!(out.contains("Model trained successfully"));
        model
    }
}

#[test]
fn test_usage_lists_all_tools() {
    let workspace = Workspace::new();
    let (code, out, _) = workspace.route(&[]);
    assert_eq!(code, 0);
    assert!(out.starts_with("Usage: bin/authorage TOOL\n"));
    assert_eq!(out.lines().count(), 2 + 8);
}

#[test]
fn test_trainer_without_arguments_prints_format_help() {
    let workspace = Workspace::new();
    let (code, out, _) = workspace.route(&["AgeClassifyTrainer.json"]);
    assert_eq!(code, 0);
    assert!(out.contains("--data"));
    assert!(out.contains("--cutoff"));
    assert!(!Path::new(&workspace.path("classify.bin")).exists());
}

#[test]
fn test_classify_train_apply_evaluate() {
    let workspace = Workspace::new();
    let model = workspace.train_classifier();

    let input = workspace.path("input.txt");
    fs::write(&input, "lol the party\n\nmy garden and grandchildren\n").unwrap();
    let (code, out, err) = workspace.route(&["AgeClassify", "--model", &model, "--input", &input]);
    assert_eq!(code, 0, "{err}");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines, vec!["18-24\tlol the party", "65-xx\tmy garden and grandchildren"]);

    let (code, out, err) = workspace.route(&[
        "AgeClassifyEvaluator",
        "--data",
        &workspace.path("train.txt"),
        "--model",
        &model,
    ]);
    assert_eq!(code, 0, "{err}");
    assert!(out.starts_with("Accuracy: 1.0000 (8/8)"), "{out}");
}

#[test]
fn test_json_format_and_output() {
    let workspace = Workspace::new();
    let model = workspace.train_classifier();

    let data = workspace.path("eval.jsonl");
    fs::write(
        &data,
        "{\"text\": \"lol party\", \"age\": 20}\n{\"text\": \"pension garden\", \"category\": \"65-xx\"}\n",
    )
    .unwrap();
    let (code, out, err) = workspace.route(&[
        "AgeClassifyEvaluator.json",
        "--data",
        &data,
        "--model",
        &model,
        "--output-format",
        "json",
    ]);
    assert_eq!(code, 0, "{err}");
    let metrics: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(metrics["total"], 2);
    assert_eq!(metrics["correct"], 2);
}

#[test]
fn test_format_suffix_rejected_by_basic_tool() {
    let workspace = Workspace::new();
    let (code, _, err) = workspace.route(&["AgeClassify.json", "--model", "m.bin"]);
    assert_eq!(code, 1);
    assert_eq!(err, "Tool AgeClassify does not support formats.\n");
}

#[test]
fn test_parallel_train_and_evaluate() {
    let workspace = Workspace::new();
    let model = workspace.path("parallel.bin");
    let (code, _, err) = workspace.route(&[
        "AgeClassifySparkTrainer",
        "--data",
        &workspace.path("train.txt"),
        "--model",
        &model,
        "--cutoff",
        "1",
        "--threads",
        "2",
    ]);
    assert_eq!(code, 0, "{err}");

    let (code, out, err) = workspace.route(&[
        "AgeClassifySparkEvaluator",
        "--data",
        &workspace.path("train.txt"),
        "--model",
        &model,
        "--threads",
        "2",
        "--misclassified",
    ]);
    assert_eq!(code, 0, "{err}");
    assert!(out.starts_with("Accuracy: 1.0000 (8/8)"), "{out}");
    assert!(out.contains("Misclassified samples: 0"));
}

#[test]
fn test_predict_train_apply_evaluate() {
    let workspace = Workspace::new();
    let classify_model = workspace.train_classifier();
    let model = workspace.path("regression.bin");

    let (code, out, err) = workspace.route(&[
        "AgePredictTrainer",
        "--data",
        &workspace.path("train.txt"),
        "--model",
        &model,
        "--classify-model",
        &classify_model,
        "--iterations",
        "500",
        "--reg-param",
        "0",
    ]);
    assert_eq!(code, 0, "{err}");
    assert!(out.contains("age-predict"));

    let input = workspace.path("input.txt");
    fs::write(&input, "lol the party\nmy garden and grandchildren\n").unwrap();
    let (code, out, err) = workspace.route(&[
        "AgePredict",
        "--model",
        &model,
        "--classify-model",
        &classify_model,
        "--input",
        &input,
        "--output-format",
        "json",
    ]);
    assert_eq!(code, 0, "{err}");
    let ages: Vec<f64> = out
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["age"].as_f64().unwrap())
        .collect();
    assert_eq!(ages.len(), 2);
    assert!(ages[0] < ages[1], "{ages:?}");

    let (code, out, err) = workspace.route(&[
        "AgePredictEvaluator",
        "--data",
        &workspace.path("train.txt"),
        "--model",
        &model,
        "--classify-model",
        &classify_model,
    ]);
    assert_eq!(code, 0, "{err}");
    assert!(out.starts_with("Samples: 8"), "{out}");

    let predicter =
        AgePredicter::load(Some(Path::new(&classify_model)), Path::new(&model)).unwrap();
    let prediction = predicter.predict("I am very very old person").unwrap();
    assert!(prediction.age.is_finite());
    assert!(prediction.category.is_some());
}

#[test]
fn test_missing_data_file_terminates() {
    let workspace = Workspace::new();
    let (code, _, err) = workspace.route(&[
        "AgePredictTrainer",
        "--data",
        &workspace.path("missing.txt"),
        "--model",
        &workspace.path("out.bin"),
    ]);
    assert_eq!(code, -1);
    assert!(err.starts_with("Failed to read sample data\n"), "{err}");
    assert!(err.contains("missing.txt"));
}

#[test]
fn test_bad_arguments_are_usage_errors() {
    let workspace = Workspace::new();
    let (code, _, err) = workspace.route(&["AgePredict", "--model"]);
    assert_eq!(code, 1);
    assert!(err.contains("--model"));
}

#[test]
fn test_training_data_given_as_model_terminates() {
    let workspace = Workspace::new();
    let (code, out, err) = workspace.route(&[
        "AgeClassify",
        "--model",
        &workspace.path("train.txt"),
        "--input",
        &workspace.path("train.txt"),
    ]);
    assert_eq!(code, -1);
    assert!(out.is_empty());
    assert!(err.starts_with("Failed to load model "), "{err}");
    assert!(err.contains("not an authorage model file"), "{err}");
}
