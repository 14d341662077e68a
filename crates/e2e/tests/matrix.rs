//! Runs the full case matrix against the in-process reference calculator

mod support;

use std::sync::Arc;
use std::time::Duration;

use calcmatrix_common::{AssertionPolicy, BuildVariant, CaseMatrix, Category, Check, NumberFormat};
use calcmatrix_e2e::{BuildToggle, CaseStatus, HarnessConfig, TestRunner, TestSuiteResult};

use support::{Fault, ReferenceFactory};

fn prototype() -> Vec<BuildVariant> {
    vec![BuildVariant::new("Prototype")]
}

fn runner(factory: Arc<ReferenceFactory>, builds: Vec<BuildVariant>) -> TestRunner {
    TestRunner::new(factory, CaseMatrix::builtin(), builds)
}

fn statuses(results: &TestSuiteResult, build: &str) -> Vec<(String, CaseStatus)> {
    results
        .results
        .iter()
        .filter(|r| r.build.id() == build)
        .map(|r| (r.name.clone(), r.status))
        .collect()
}

#[tokio::test]
async fn test_prototype_passes_every_case() {
    let factory = Arc::new(ReferenceFactory::new());
    let results = runner(factory.clone(), prototype()).run_all().await;

    assert_eq!(results.total, 20);
    assert_eq!(results.passed, 20, "{:#?}", results.results);
    assert!(results.success());
    assert_eq!(results.exit_code(), 0);

    // One fresh session per case
    assert_eq!(factory.opened(), 20);
}

#[tokio::test]
async fn test_case_names_follow_declaration_order() {
    let factory = Arc::new(ReferenceFactory::new());
    let results = runner(factory, prototype()).run_all().await;

    let names: Vec<&str> = results.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names[0], "Prototype build's Addition test 2 + 2");
    assert_eq!(names[1], "Prototype build's Addition test 2 + -3");
    assert!(names.contains(&"Prototype Concatenation test 5.85"));
    assert_eq!(names.last(), Some(&"Prototype Clear button test"));
}

#[tokio::test]
async fn test_faulty_build_fails_without_affecting_others() {
    let factory = Arc::new(ReferenceFactory::new().with_fault("1", Fault::WrongSum));
    let builds = vec![BuildVariant::new("Prototype"), BuildVariant::new("1")];
    let results = runner(factory, builds).run_all().await;

    assert_eq!(results.total, 40);
    assert!(!results.success());
    assert_eq!(results.exit_code(), 1);

    let prototype = results.build(&BuildVariant::new("Prototype")).unwrap();
    assert_eq!(prototype.passed, 20);

    let broken = results.build(&BuildVariant::new("1")).unwrap();
    assert_eq!(broken.errored, 0);
    // Four addition cases plus the clear case, which adds before clearing
    assert_eq!(broken.failed, 5);

    let failed: Vec<_> = results
        .results
        .iter()
        .filter(|r| r.status == CaseStatus::Failed)
        .collect();
    assert!(failed.iter().all(|r| r.build.id() == "1"));
    assert!(failed
        .iter()
        .all(|r| matches!(r.category, Category::Addition | Category::ClearState)));

    let first = failed[0].mismatch.as_ref().unwrap();
    assert_eq!(first.check, Check::Value);
    assert_eq!(first.expected, "4");
    assert_eq!(first.actual, "0");
}

#[tokio::test]
async fn test_passing_run_toggles_and_clears() {
    let factory = Arc::new(ReferenceFactory::new());
    let results = runner(factory.clone(), prototype()).run_all().await;

    assert!(results.success());
    assert_eq!(factory.toggles(), 4);
    assert_eq!(factory.clears(), 1);
}

#[tokio::test]
async fn test_mismatch_ends_case_before_later_steps() {
    let factory = Arc::new(ReferenceFactory::new().with_fault("1", Fault::WrongSum));
    let results = runner(factory.clone(), vec![BuildVariant::new("1")]).run_all().await;

    let addition: Vec<_> = results
        .results
        .iter()
        .filter(|r| r.category == Category::Addition)
        .collect();
    assert_eq!(addition.len(), 4);
    assert!(addition.iter().all(|r| r.status == CaseStatus::Failed));

    let clear_case = results
        .results
        .iter()
        .find(|r| r.category == Category::ClearState)
        .unwrap();
    assert_eq!(clear_case.status, CaseStatus::Failed);
    assert_eq!(clear_case.mismatch.as_ref().unwrap().check, Check::Value);

    // Neither the integer-only box nor Clear is touched after a wrong answer
    assert_eq!(factory.toggles(), 0);
    assert_eq!(factory.clears(), 0);
}

#[tokio::test]
async fn test_missing_divide_by_zero_error_is_a_failure() {
    let factory = Arc::new(ReferenceFactory::new().with_fault("2", Fault::NoDivideByZeroCheck));
    let results = runner(factory, vec![BuildVariant::new("2")]).run_all().await;

    let failed: Vec<_> = statuses(&results, "2")
        .into_iter()
        .filter(|(_, status)| *status == CaseStatus::Failed)
        .collect();
    assert_eq!(
        failed,
        vec![("2 build's Division test 5 / 0".to_string(), CaseStatus::Failed)]
    );

    let result = results.results.iter().find(|r| r.status == CaseStatus::Failed).unwrap();
    let mismatch = result.mismatch.as_ref().unwrap();
    assert_eq!(mismatch.check, Check::ErrorMessage);
    assert_eq!(mismatch.expected, "Divide by zero error!");
    assert_eq!(mismatch.actual, "");
}

#[tokio::test]
async fn test_driver_fault_is_errored_not_failed() {
    let factory = Arc::new(ReferenceFactory::new().with_fault("3", Fault::UnreadableAnswer));
    let results = runner(factory, vec![BuildVariant::new("3")]).run_all().await;

    assert_eq!(results.failed, 0);
    // Only the error-message cases avoid reading the answer field
    assert_eq!(results.passed, 3);
    assert_eq!(results.errored, 17);
    assert_eq!(results.exit_code(), 1);

    let errored = results
        .results
        .iter()
        .find(|r| r.status == CaseStatus::Errored)
        .unwrap();
    assert!(errored.mismatch.is_none());
    assert!(errored.error.as_deref().unwrap().contains("answer field detached"));
}

#[tokio::test]
async fn test_hung_session_times_out() {
    let factory = Arc::new(ReferenceFactory::new().with_fault("4", Fault::Hang));
    let builds = vec![BuildVariant::new("4"), BuildVariant::new("Prototype")];
    let results = runner(factory, builds)
        .with_case_timeout(Duration::from_millis(50))
        .with_concurrency(20)
        .run_all()
        .await;

    let hung = results.build(&BuildVariant::new("4")).unwrap();
    assert_eq!(hung.errored, 20);
    assert_eq!(results.build(&BuildVariant::new("Prototype")).unwrap().passed, 20);

    let first = &results.results[0];
    assert!(first.error.as_deref().unwrap().contains("Timeout"));
}

#[tokio::test]
async fn test_concurrency_keeps_declaration_order() {
    let sequential = runner(Arc::new(ReferenceFactory::new()), prototype())
        .run_all()
        .await;
    let concurrent = runner(Arc::new(ReferenceFactory::new()), prototype())
        .with_concurrency(8)
        .run_all()
        .await;

    assert_eq!(
        statuses(&sequential, "Prototype"),
        statuses(&concurrent, "Prototype")
    );
}

#[tokio::test]
async fn test_shortest_policy_exposes_float_artifact() {
    let factory = Arc::new(ReferenceFactory::new());
    let results = runner(factory, prototype())
        .with_policy(AssertionPolicy::new(NumberFormat::Shortest))
        .run_all()
        .await;

    let failed: Vec<_> = results
        .results
        .iter()
        .filter(|r| r.status == CaseStatus::Failed)
        .map(|r| r.name.as_str())
        .collect();
    assert!(failed.contains(&"Prototype build's Multiplication test 5.5 * 1.1"));

    let result = results
        .results
        .iter()
        .find(|r| r.name == "Prototype build's Multiplication test 5.5 * 1.1")
        .unwrap();
    let mismatch = result.mismatch.as_ref().unwrap();
    assert_eq!(mismatch.expected, "6.050000000000001");
    assert_eq!(mismatch.actual, "6.05");
}

#[tokio::test]
async fn test_shortest_page_and_policy_agree() {
    let factory = Arc::new(ReferenceFactory::new().with_format(NumberFormat::Shortest));
    let results = runner(factory, prototype())
        .with_policy(AssertionPolicy::new(NumberFormat::Shortest))
        .run_all()
        .await;
    assert!(results.success(), "{:#?}", results.results);
}

#[tokio::test]
async fn test_runner_from_config_skips_disabled_builds() {
    let dir = tempfile::tempdir().unwrap();
    let config = HarnessConfig {
        builds: vec![
            BuildToggle::new("Prototype", true),
            BuildToggle::new("1", false),
            BuildToggle::new("2", true),
        ],
        output_dir: dir.path().join("out"),
        ..Default::default()
    };

    let factory = Arc::new(ReferenceFactory::new());
    let runner = TestRunner::with_config(&config, factory.clone()).unwrap();
    let results = runner.run_all().await;

    assert_eq!(results.total, 40);
    assert_eq!(results.skipped_builds, vec![BuildVariant::new("1")]);
    assert!(results.build(&BuildVariant::new("1")).is_none());
    assert_eq!(factory.opened(), 40);

    let path = runner.write_results(&results).unwrap();
    assert_eq!(path, dir.path().join("out").join("test-results.json"));

    let written: TestSuiteResult =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written.total, 40);
    assert_eq!(written.passed, 40);
    assert_eq!(written.builds.len(), 2);
}

#[tokio::test]
async fn test_table_overrides_replace_builtin_category() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("division.yaml"),
        r#"
category: division
description: signed zero divisors
pairs:
  - [1, 0]
  - [1, "-0"]
  - [9, 3]
"#,
    )
    .unwrap();

    let config = HarnessConfig {
        tables_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let runner = TestRunner::with_config(&config, Arc::new(ReferenceFactory::new())).unwrap();
    assert_eq!(runner.matrix().cases_per_build(), 19);

    let results = runner.run_all().await;
    assert!(results.success(), "{:#?}", results.results);
}

#[test]
fn test_invalid_config_is_rejected_before_running() {
    let config = HarnessConfig {
        concurrency: 0,
        ..Default::default()
    };
    assert!(TestRunner::with_config(&config, Arc::new(ReferenceFactory::new())).is_err());
}
