use chrono::{Duration, Utc};
use flowguard_core_types::{
    FailureKind, FlowDefinition, FlowRunResult, Step, StepAction, StepResult,
};
use flowguard_flow_store::{Database, FlowRepository, SaveOutcome, StoreError};
use query_guard::{
    DayRange, Identifier, Limit, RecentResultsQuery, RunSummaryQuery, SearchQuery,
};
use serde_json::json;

fn repo() -> FlowRepository {
    FlowRepository::new(Database::open_memory().unwrap())
}

fn flow(name: &str, intent: &str) -> FlowDefinition {
    FlowDefinition::new(
        name,
        "https://shop.example",
        vec![Step::click("#buy"), Step::screenshot()],
    )
    .with_intent(intent)
}

fn run(name: &str, passed: bool, minutes_ago: i64) -> FlowRunResult {
    let started = Utc::now() - Duration::minutes(minutes_ago);
    let step = StepResult::new(0, StepAction::Click);
    let step = if passed {
        step.with_success()
    } else {
        step.with_failure(FailureKind::Execution, "selector not found: #buy")
    };
    FlowRunResult::from_steps(name, vec![step], started, started + Duration::seconds(2), 2_000)
}

fn id(raw: &str) -> Identifier {
    Identifier::parse("flowName", raw).unwrap()
}

#[test]
fn save_then_get_round_trips_and_upserts() {
    let repo = repo();
    assert_eq!(
        repo.save_flow(&flow("checkout", "buy a thing")).unwrap(),
        SaveOutcome::Created
    );
    assert_eq!(
        repo.save_flow(&flow("checkout", "buy two things")).unwrap(),
        SaveOutcome::Updated
    );

    let stored = repo.get_flow(&id("checkout")).unwrap().unwrap();
    assert_eq!(stored.intent, "buy two things");
    assert_eq!(stored.steps.len(), 2);
    assert!(repo.get_flow(&id("missing")).unwrap().is_none());
}

#[test]
fn invalid_definitions_are_not_saved() {
    let repo = repo();
    let empty = FlowDefinition::new("empty", "https://x.example", vec![]);
    assert!(matches!(
        repo.save_flow(&empty),
        Err(StoreError::InvalidFlow(_))
    ));
    assert!(repo.list_flows().unwrap().is_empty());
}

#[test]
fn list_and_search_flows() {
    let repo = repo();
    repo.save_flow(&flow("signup", "Create an account")).unwrap();
    repo.save_flow(&flow("checkout", "Buy with C++ (beta) card")).unwrap();
    repo.save_flow(&flow("login", "Sign in with an account")).unwrap();

    let names: Vec<_> = repo.list_flows().unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["checkout", "login", "signup"]);

    let hits = repo.search_flows(&SearchQuery::parse("ACCOUNT").unwrap()).unwrap();
    assert_eq!(hits.len(), 2);

    let literal = repo.search_flows(&SearchQuery::parse("c++ (beta)").unwrap()).unwrap();
    assert_eq!(literal.len(), 1);
    assert_eq!(literal[0].name, "checkout");

    assert!(repo.delete_flow(&id("login")).unwrap());
    assert!(!repo.delete_flow(&id("login")).unwrap());
}

#[test]
fn recent_results_are_newest_first_and_limited() {
    let repo = repo();
    for minutes_ago in [30, 10, 20, 40] {
        repo.record_run(&run("checkout", true, minutes_ago)).unwrap();
    }
    repo.record_run(&run("signup", true, 1)).unwrap();

    let query = RecentResultsQuery::new(id("checkout"), Limit::new(3).unwrap());
    let recent = repo.recent_results(&query).unwrap();
    assert_eq!(recent.len(), 3);
    assert!(recent.windows(2).all(|pair| pair[0].started_at >= pair[1].started_at));
    assert!(recent.iter().all(|run| run.flow_name == "checkout"));
}

#[test]
fn guarded_params_stop_bad_input_before_the_store() {
    assert!(RecentResultsQuery::from_params(&json!("checkout"), &json!(0)).is_err());
    assert!(RecentResultsQuery::from_params(&json!("checkout"), &json!(101)).is_err());
    assert!(RecentResultsQuery::from_params(&json!("checkout"), &json!("lots")).is_err());
    assert!(RecentResultsQuery::from_params(&json!({ "$gt": "" }), &json!(5)).is_err());
}

#[test]
fn run_summary_counts_verdicts_within_window() {
    let repo = repo();
    repo.record_run(&run("checkout", true, 5)).unwrap();
    repo.record_run(&run("checkout", true, 50)).unwrap();
    repo.record_run(&run("checkout", false, 60)).unwrap();
    // outside a one-day window
    repo.record_run(&run("checkout", false, 60 * 48)).unwrap();

    let query = RunSummaryQuery::new(id("checkout"), DayRange::new(1).unwrap());
    let summary = repo.run_summary(&query, Utc::now()).unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.avg_duration_ms, Some(2_000.0));
    assert!((summary.pass_rate() - 2.0 / 3.0).abs() < 1e-9);

    let empty = repo
        .run_summary(&RunSummaryQuery::new(id("nothing"), DayRange::default()), Utc::now())
        .unwrap();
    assert_eq!(empty.total, 0);
    assert_eq!(empty.pass_rate(), 0.0);
}
