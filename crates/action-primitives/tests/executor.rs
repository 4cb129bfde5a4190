use action_primitives::execute;
use cdp_adapter::fake::{Script, ScriptedLauncher};
use cdp_adapter::{BrowserLauncher, BrowserSession};
use flowguard_core_types::{FailureKind, Step, StepAction, Viewport};
use std::time::Duration;

async fn session(script: Script) -> (ScriptedLauncher, Box<dyn BrowserSession>) {
    let launcher = ScriptedLauncher::new(script);
    let session = launcher
        .launch(Viewport::default())
        .await
        .expect("scripted launch");
    (launcher, session)
}

#[tokio::test]
async fn navigate_without_target_is_a_configuration_error() {
    let (launcher, session) = session(Script::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let result = execute(session.as_ref(), &Step::new(StepAction::Navigate), 0, dir.path()).await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(FailureKind::Configuration));
    assert!(result.error.as_deref().unwrap().contains("requires a target"));
    assert_eq!(result.step_index, 0);
    // the browser is never touched
    assert!(launcher.stats().calls().is_empty());
}

#[tokio::test]
async fn blank_target_counts_as_missing() {
    let (_launcher, session) = session(Script::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let result = execute(session.as_ref(), &Step::click("   "), 2, dir.path()).await;

    assert_eq!(result.failure, Some(FailureKind::Configuration));
    assert_eq!(result.step_index, 2);
}

#[tokio::test]
async fn unknown_action_is_reported_not_raised() {
    let (_launcher, session) = session(Script::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let result = execute(session.as_ref(), &Step::new("hover"), 1, dir.path()).await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(FailureKind::UnknownAction));
    assert_eq!(result.error.as_deref(), Some("unknown action: hover"));
    assert_eq!(result.action, StepAction::Other("hover".into()));
}

#[tokio::test]
async fn missing_selector_fails_as_execution_error() {
    let (_launcher, session) = session(Script::default().with_missing_selector("#buy")).await;
    let dir = tempfile::tempdir().unwrap();

    let result = execute(session.as_ref(), &Step::click("#buy"), 3, dir.path()).await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(FailureKind::Execution));
    assert!(result.error.as_deref().unwrap().contains("#buy"));
}

#[tokio::test]
async fn slow_navigation_is_bounded_by_step_timeout() {
    let script = Script::default().with_navigation_delay(Duration::from_secs(5));
    let (_launcher, session) = session(script).await;
    let dir = tempfile::tempdir().unwrap();

    let step = Step::navigate("https://example.com").with_timeout(50);
    let result = execute(session.as_ref(), &step, 0, dir.path()).await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(FailureKind::Execution));
    assert!(result.duration_ms < 5_000);
}

#[tokio::test]
async fn type_defaults_to_empty_value() {
    let (launcher, session) = session(Script::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let mut step = Step::new(StepAction::Type);
    step.target = Some("#email".into());
    let result = execute(session.as_ref(), &step, 1, dir.path()).await;

    assert!(result.success);
    assert_eq!(launcher.stats().calls(), vec!["fill:#email="]);
}

#[tokio::test]
async fn screenshot_creates_artifact_directory_and_file() {
    let (_launcher, session) = session(Script::default()).await;
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("checkout-1700000000000");

    let result = execute(session.as_ref(), &Step::screenshot(), 4, &dir).await;

    assert!(result.success, "{:?}", result.error);
    let path = result.screenshot_path.expect("artifact path");
    assert!(path.starts_with(&dir));
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("step-4-") && name.ends_with(".png"));
    assert_eq!(
        std::fs::read(&path).unwrap(),
        cdp_adapter::fake::TINY_PNG.to_vec()
    );
    assert!(result.screenshot_base64.unwrap().starts_with("iVBORw0KGgo"));

    // existing directory is fine
    let again = execute(session.as_ref(), &Step::screenshot(), 5, &dir).await;
    assert!(again.success);
}

#[tokio::test]
async fn scroll_with_garbage_value_uses_default_delta() {
    let (launcher, session) = session(Script::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let step = Step::new(StepAction::Scroll).with_value("a lot");
    let result = execute(session.as_ref(), &step, 0, dir.path()).await;
    assert!(result.success);

    let result = execute(session.as_ref(), &Step::scroll(-120), 1, dir.path()).await;
    assert!(result.success);

    assert_eq!(launcher.stats().calls(), vec!["scroll:500", "scroll:-120"]);
}

#[tokio::test]
async fn wait_sleeps_for_its_timeout() {
    let (_launcher, session) = session(Script::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let result = execute(session.as_ref(), &Step::wait(30), 0, dir.path()).await;

    assert!(result.success);
    assert!(result.duration_ms >= 30);
    assert!(result.screenshot_path.is_none());
}
