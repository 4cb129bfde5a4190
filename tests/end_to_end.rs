use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cdp_adapter::fake::{Script, ScriptedLauncher, TINY_PNG};
use flowguard::evaluate::{BenchmarkExample, GroundTruth};
use flowguard::{evaluate, load_flows, predict, AppContext, Config, Dataset};
use flowguard_core_types::Verdict;
use flowguard_flow_store::Database;
use query_guard::{Identifier, Limit, RecentResultsQuery};
use vision_cache::{TokenUsage, VisionError, VisionJudge, VisionJudgment};

/// Passes any assertion that mentions "visible".
struct KeywordJudge {
    calls: AtomicUsize,
}

#[async_trait]
impl VisionJudge for KeywordJudge {
    fn model(&self) -> &str {
        "keyword-model"
    }

    fn prompt_version(&self) -> &str {
        "v1"
    }

    async fn judge(&self, _png: &[u8], assertion: &str) -> Result<VisionJudgment, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let verdict = assertion.contains("visible");
        Ok(VisionJudgment {
            verdict,
            confidence: 80.0,
            reasoning: format!("keyword match: {verdict}"),
            tokens: TokenUsage {
                input: 1200,
                output: 40,
            },
            cost: 0.0042,
        })
    }
}

fn context(output: &Path) -> AppContext {
    let config = Config {
        output_dir: output.to_path_buf(),
        ..Config::default()
    };
    AppContext::with_database(config, Database::open_memory().unwrap())
}

const FLOWS_YAML: &str = r##"
- name: home
  intent: landing page renders
  url: https://shop.example
  steps:
    - action: screenshot
      assert: hero banner is visible
- name: checkout
  url: https://shop.example/cart
  steps:
    - action: click
      target: "#checkout"
    - action: screenshot
      assert: order confirmation shown
- name: search
  url: https://shop.example
  steps:
    - action: type
      target: "#q"
      value: shoes
    - action: click
      target: "#missing"
"##;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_to_recorded_results() {
    let dir = tempfile::tempdir().unwrap();
    let flow_file = dir.path().join("flows.yaml");
    std::fs::write(&flow_file, FLOWS_YAML).unwrap();
    let flows = load_flows(&flow_file).await.unwrap();
    assert_eq!(flows.len(), 3);

    let app = context(&dir.path().join("results"));
    let judge = Arc::new(KeywordJudge {
        calls: AtomicUsize::new(0),
    });
    let launcher = ScriptedLauncher::new(Script::default().with_missing_selector("#missing"));
    let stats = launcher.stats();
    let runner = app.runner(Arc::new(launcher), Some(app.cached_judge(judge.clone())));
    let scheduler = app.scheduler(runner, 2).unwrap();

    let report = scheduler.run_all(flows).await;

    assert_eq!(report.len(), 3);
    assert_eq!(report.get("home").unwrap().verdict, Verdict::Pass);
    assert_eq!(report.get("checkout").unwrap().verdict, Verdict::Fail);
    assert_eq!(report.get("search").unwrap().verdict, Verdict::Error);
    assert!(stats.peak_live() <= 2);
    assert_eq!(stats.live(), 0);
    assert_eq!(judge.calls.load(Ordering::SeqCst), 2);

    let query = RecentResultsQuery::new(Identifier::parse("flowName", "checkout").unwrap(), Limit::default());
    let recorded = app.repository().recent_results(&query).unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].verdict, Verdict::Fail);
}

#[tokio::test]
async fn benchmark_predict_then_evaluate() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("shots")).unwrap();
    std::fs::write(dir.path().join("shots/a.png"), TINY_PNG).unwrap();
    std::fs::write(dir.path().join("shots/b.png"), TINY_PNG).unwrap();

    let example = |id: &str, shot: &str, assertion: &str, verdict: bool| BenchmarkExample {
        id: id.to_string(),
        screenshot_path: shot.into(),
        assertion: assertion.to_string(),
        ground_truth: GroundTruth {
            verdict,
            expected_issues: Vec::new(),
        },
        metadata: serde_json::Value::Null,
    };
    let dataset = Dataset::new(vec![
        example("ex1", "shots/a.png", "menu is visible", true),
        example("ex2", "shots/b.png", "contrast meets WCAG AA", true),
        example("ex3", "shots/missing.png", "menu is visible", false),
        example("ex4", "shots/a.png", "menu is visible", true),
    ]);

    let app = context(dir.path());
    let judge = Arc::new(KeywordJudge {
        calls: AtomicUsize::new(0),
    });
    let cached = app.cached_judge(judge.clone());

    let outcome = predict(&dataset, dir.path(), &cached).await;
    assert_eq!(outcome.predictions.predictions.len(), 3);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].0, "ex3");
    // ex4 repeats ex1's screenshot and assertion
    assert_eq!(judge.calls.load(Ordering::SeqCst), 2);
    let ex4 = &outcome.predictions.predictions[2];
    assert!(ex4.cache_hit);
    assert_eq!(ex4.cost, 0.0);

    let report = evaluate(&dataset, &outcome.predictions);
    assert_eq!(report.total_examples, 3);
    assert_eq!(report.true_positives, 2);
    assert_eq!(report.false_negatives, 1);
    assert_eq!(report.precision, 1.0);
}
