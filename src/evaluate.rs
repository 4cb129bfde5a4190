//! Vision benchmark: labelled datasets, predictions over them and their
//! scoring.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use vision_cache::CachedVisionJudge;

pub const DATASET_VERSION: &str = "1.0";

/// A labelled benchmark dataset. The envelope fields are written by
/// [`generate_mock_dataset`]; hand-written datasets may omit them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_examples: Option<usize>,
    pub examples: Vec<BenchmarkExample>,
}

impl Dataset {
    pub fn new(examples: Vec<BenchmarkExample>) -> Self {
        Self {
            examples,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkExample {
    pub id: String,
    pub screenshot_path: PathBuf,
    pub assertion: String,
    pub ground_truth: GroundTruth,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub verdict: bool,
    #[serde(default)]
    pub expected_issues: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    pub predictions: Vec<Prediction>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub example_id: String,
    pub predicted_verdict: bool,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub cache_hit: bool,
    #[serde(default)]
    pub cost: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub total_examples: usize,
}

/// Score `predictions` against the dataset's ground truth.
///
/// A passing verdict is the positive class. Examples without a prediction are
/// skipped; when an example id is predicted twice the first prediction wins.
pub fn evaluate(dataset: &Dataset, predictions: &PredictionSet) -> EvaluationReport {
    let mut by_id: HashMap<&str, bool> = HashMap::new();
    for prediction in &predictions.predictions {
        by_id
            .entry(prediction.example_id.as_str())
            .or_insert(prediction.predicted_verdict);
    }

    let mut report = EvaluationReport::default();
    for example in &dataset.examples {
        let Some(&predicted) = by_id.get(example.id.as_str()) else {
            continue;
        };
        match (example.ground_truth.verdict, predicted) {
            (true, true) => report.true_positives += 1,
            (false, true) => report.false_positives += 1,
            (false, false) => report.true_negatives += 1,
            (true, false) => report.false_negatives += 1,
        }
        report.total_examples += 1;
    }

    let tp = report.true_positives as f64;
    let fp = report.false_positives as f64;
    let fn_ = report.false_negatives as f64;
    report.accuracy = ratio((report.true_positives + report.true_negatives) as f64, report.total_examples as f64);
    report.precision = ratio(tp, tp + fp);
    report.recall = ratio(tp, tp + fn_);
    report.f1_score = ratio(2.0 * report.precision * report.recall, report.precision + report.recall);
    report
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// UX issue families covered by generated datasets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BenchmarkCategory {
    Accessibility,
    Layout,
    Responsiveness,
    DarkPatterns,
    Security,
}

impl BenchmarkCategory {
    pub const ALL: [BenchmarkCategory; 5] = [
        BenchmarkCategory::Accessibility,
        BenchmarkCategory::Layout,
        BenchmarkCategory::Responsiveness,
        BenchmarkCategory::DarkPatterns,
        BenchmarkCategory::Security,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BenchmarkCategory::Accessibility => "accessibility",
            BenchmarkCategory::Layout => "layout",
            BenchmarkCategory::Responsiveness => "responsiveness",
            BenchmarkCategory::DarkPatterns => "ux-dark-patterns",
            BenchmarkCategory::Security => "security",
        }
    }

    /// Canned scenario: assertion, the issue that breaks it, difficulty.
    fn scenario(self) -> (&'static str, &'static str, &'static str) {
        match self {
            BenchmarkCategory::Accessibility => (
                "The checkout button has sufficient color contrast (WCAG AA)",
                "Button contrast ratio is 2.1:1, below WCAG AA requirement of 4.5:1",
                "medium",
            ),
            BenchmarkCategory::Layout => (
                "The navigation menu is visible without scrolling",
                "Navigation menu is pushed below fold due to large hero image",
                "easy",
            ),
            BenchmarkCategory::Responsiveness => (
                "The form fields are fully visible on mobile (375px width)",
                "Input labels are cut off by parent container overflow",
                "medium",
            ),
            BenchmarkCategory::DarkPatterns => (
                "The unsubscribe button is as prominent as the subscribe button",
                "Unsubscribe button is hidden in footer with 8px font size",
                "hard",
            ),
            BenchmarkCategory::Security => (
                "The password input field obscures entered characters",
                "Password field shows plain text characters",
                "easy",
            ),
        }
    }
}

impl fmt::Display for BenchmarkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build `count` canned examples cycling through [`BenchmarkCategory::ALL`].
///
/// Every example is labelled as a failing assertion; screenshots are expected
/// at `benchmarks/screenshots/{category}_{n}.png` and must be captured
/// separately.
pub fn generate_mock_dataset(count: usize, created_at: DateTime<Utc>) -> Dataset {
    let examples: Vec<BenchmarkExample> = (1..=count)
        .map(|n| {
            let category = BenchmarkCategory::ALL[(n - 1) % BenchmarkCategory::ALL.len()];
            let (assertion, issue, difficulty) = category.scenario();
            BenchmarkExample {
                id: format!("example_{n:03}"),
                screenshot_path: PathBuf::from(format!("benchmarks/screenshots/{category}_{n}.png")),
                assertion: assertion.to_string(),
                ground_truth: GroundTruth {
                    verdict: false,
                    expected_issues: vec![issue.to_string()],
                },
                metadata: json!({
                    "category": category.as_str(),
                    "difficulty": difficulty,
                    "created_at": created_at.to_rfc3339(),
                }),
            }
        })
        .collect();

    info!(count = examples.len(), "Generated mock benchmark dataset");
    Dataset {
        version: Some(DATASET_VERSION.to_string()),
        created_at: Some(created_at),
        total_examples: Some(examples.len()),
        examples,
    }
}

#[derive(Clone, Debug, Default)]
pub struct PredictOutcome {
    pub predictions: PredictionSet,
    /// Example ids that could not be judged, with the reason.
    pub skipped: Vec<(String, String)>,
}

/// Judge every example's screenshot against its assertion.
///
/// Relative screenshot paths resolve against `base_dir`. Examples whose
/// screenshot cannot be read or judged are skipped, so the evaluation later
/// ignores them.
pub async fn predict(dataset: &Dataset, base_dir: &Path, judge: &CachedVisionJudge) -> PredictOutcome {
    let mut outcome = PredictOutcome::default();
    for example in &dataset.examples {
        let path = if example.screenshot_path.is_absolute() {
            example.screenshot_path.clone()
        } else {
            base_dir.join(&example.screenshot_path)
        };

        let png = match tokio::fs::read(&path).await {
            Ok(png) => png,
            Err(err) => {
                warn!(example = %example.id, path = %path.display(), error = %err, "screenshot unreadable; skipping");
                outcome.skipped.push((example.id.clone(), err.to_string()));
                continue;
            }
        };

        match judge.judge(&png, &example.assertion).await {
            Ok(cached) => outcome.predictions.predictions.push(Prediction {
                example_id: example.id.clone(),
                predicted_verdict: cached.judgment.verdict,
                confidence: Some(cached.judgment.confidence),
                reasoning: Some(cached.judgment.reasoning),
                cache_hit: cached.cache_hit,
                cost: if cached.cache_hit { 0.0 } else { cached.judgment.cost },
            }),
            Err(err) => {
                warn!(example = %example.id, error = %err, "vision judgment failed; skipping");
                outcome.skipped.push((example.id.clone(), err.to_string()));
            }
        }
    }
    info!(
        predicted = outcome.predictions.predictions.len(),
        skipped = outcome.skipped.len(),
        "Benchmark predictions complete"
    );
    outcome
}
