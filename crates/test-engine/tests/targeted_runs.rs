mod common;

use common::{
    engine, file_graph, go_config, integration, owned, smoke, unit, MockAnalyzer, MockRunner,
};
use context_graph::StaticGraphProvider;
use context_test_engine::{
    AffectedGraph, CancellationToken, TestEngineError, TestResult, TestScope, WarningKind,
};
use pretty_assertions::assert_eq;
use std::path::Path;

fn scenario_graph() -> AffectedGraph {
    let mut graph = AffectedGraph::changed_only(&owned(&["a.go"]));
    graph.affected_files.push("b.go".into());
    graph.dependencies.insert("a.go".into(), owned(&["b.go"]));
    graph.test_mapping.insert("b.go".into(), owned(&["b_test.go"]));
    graph
}

fn paths(results: &[TestResult]) -> Vec<&str> {
    results.iter().map(|r| r.test_path.as_str()).collect()
}

fn no_graph() -> StaticGraphProvider {
    StaticGraphProvider::unavailable("not needed")
}

#[tokio::test]
async fn runs_only_the_mapped_test() {
    let runner = MockRunner::with_tests(vec![unit("a_test.go"), unit("b_test.go")]);
    let analyzer = MockAnalyzer::new().map("b.go", &["b_test.go"]);
    let engine = engine(Some(runner.clone()), Some(analyzer), no_graph());

    let run = engine
        .run_targeted_tests(
            &go_config(TestScope::Affected),
            &scenario_graph(),
            &CancellationToken::new(),
        )
        .await
        .expect("targeted run");

    assert_eq!(run.value, vec![TestResult::passed("b_test.go", "go")]);
    assert!(run.warnings.is_empty());
    assert_eq!(runner.single_runs(), owned(&["b_test.go"]));
    assert!(runner.suite_runs().is_empty());
}

#[tokio::test]
async fn runner_error_becomes_a_failed_result() {
    let runner = MockRunner::with_tests(vec![unit("b_test.go")]).broken("b_test.go");
    let analyzer = MockAnalyzer::new().map("b.go", &["b_test.go"]);
    let engine = engine(Some(runner), Some(analyzer), no_graph());

    let run = engine
        .run_targeted_tests(
            &go_config(TestScope::Affected),
            &scenario_graph(),
            &CancellationToken::new(),
        )
        .await
        .expect("per-test errors do not fail the call");

    assert_eq!(run.value.len(), 1);
    let result = &run.value[0];
    assert!(!result.success);
    assert_eq!(result.test_path, "b_test.go");
    assert_eq!(result.error.as_deref(), Some("runner crashed on b_test.go"));
    assert!(run.has_warning(WarningKind::TestExecutionFailed));
}

#[tokio::test]
async fn one_broken_test_does_not_stop_the_batch() {
    let runner = MockRunner::with_tests(vec![])
        .broken("a_test.go")
        .failing("c_test.go");
    let analyzer = MockAnalyzer::new().map("a.go", &["a_test.go", "b_test.go", "c_test.go"]);
    let engine = engine(Some(runner.clone()), Some(analyzer), no_graph());

    let run = engine
        .run_targeted_tests(
            &go_config(TestScope::Affected),
            &AffectedGraph::changed_only(&owned(&["a.go"])),
            &CancellationToken::new(),
        )
        .await
        .expect("targeted run");

    let outcomes: Vec<(&str, bool)> = run
        .value
        .iter()
        .map(|r| (r.test_path.as_str(), r.success))
        .collect();
    assert_eq!(
        outcomes,
        vec![("a_test.go", false), ("b_test.go", true), ("c_test.go", false)]
    );
    assert_eq!(runner.single_runs().len(), 3);
}

#[tokio::test]
async fn empty_selection_falls_back_to_full_suite() {
    let tests = vec![unit("a_test.go"), integration("flow_test.go")];
    let analyzer = MockAnalyzer::new();
    let config = go_config(TestScope::Affected);

    let targeted_runner = MockRunner::with_tests(tests.clone());
    let targeted = engine(Some(targeted_runner.clone()), Some(analyzer), no_graph())
        .run_targeted_tests(&config, &scenario_graph(), &CancellationToken::new())
        .await
        .expect("fallback run");

    let full = engine(Some(MockRunner::with_tests(tests)), None, no_graph())
        .run_tests(&config, &CancellationToken::new())
        .await
        .expect("full run");

    assert_eq!(targeted.value, full.value);
    assert!(targeted.has_warning(WarningKind::NoTargetedTests));
    assert!(targeted_runner.single_runs().is_empty());
    assert_eq!(
        targeted_runner.suite_runs(),
        vec![owned(&["a_test.go", "flow_test.go"])]
    );
}

#[tokio::test]
async fn missing_analyzer_falls_back_to_full_suite() {
    let tests = vec![unit("a_test.go"), unit("b_test.go")];
    let config = go_config(TestScope::Affected);

    let targeted = engine(Some(MockRunner::with_tests(tests.clone())), None, no_graph())
        .run_targeted_tests(&config, &scenario_graph(), &CancellationToken::new())
        .await
        .expect("fallback run");
    let full = engine(Some(MockRunner::with_tests(tests)), None, no_graph())
        .run_tests(&config, &CancellationToken::new())
        .await
        .expect("full run");

    assert_eq!(targeted.value, full.value);
    assert_eq!(targeted.warnings.len(), 1);
    assert_eq!(targeted.warnings[0].kind, WarningKind::AnalyzerMissing);
}

#[tokio::test]
async fn smoke_tests_run_before_affected_tests() {
    let runner = MockRunner::with_tests(vec![
        unit("a_test.go"),
        smoke("health_test.go"),
        unit("b_test.go"),
        smoke("login_smoke_test.go"),
    ]);
    let analyzer = MockAnalyzer::new()
        .map("a.go", &["a_test.go", "login_smoke_test.go"])
        .map("b.go", &["b_test.go"])
        .smoke("health_test.go")
        .smoke("login_smoke_test.go");
    let engine = engine(Some(runner), Some(analyzer), no_graph());

    let mut graph = AffectedGraph::changed_only(&owned(&["a.go"]));
    graph.affected_files.push("b.go".into());

    let run = engine
        .run_targeted_tests(&go_config(TestScope::AffectedSmoke), &graph, &CancellationToken::new())
        .await
        .expect("targeted run");

    assert_eq!(
        paths(&run.value),
        vec!["health_test.go", "login_smoke_test.go", "a_test.go", "b_test.go"]
    );
}

#[tokio::test]
async fn smoke_classification_errors_are_skipped() {
    let runner = MockRunner::with_tests(vec![smoke("health_test.go"), smoke("flaky_test.go")]);
    let analyzer = MockAnalyzer::new()
        .smoke("health_test.go")
        .smoke_error("flaky_test.go");
    let engine = engine(Some(runner), Some(analyzer), no_graph());

    let found = engine
        .find_smoke_tests(Path::new("/work/shop"), "go", &CancellationToken::new())
        .await
        .expect("smoke discovery");

    assert_eq!(found.value, owned(&["health_test.go"]));
    assert!(found.has_warning(WarningKind::SmokeCheckFailed));
}

#[tokio::test]
async fn smoke_discovery_requires_analyzer() {
    let engine = engine(Some(MockRunner::default()), None, no_graph());
    let err = engine
        .find_smoke_tests(Path::new("/work/shop"), "go", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, TestEngineError::NoAnalyzer(_)));
}

#[tokio::test]
async fn lookup_failures_skip_the_file() {
    let runner = MockRunner::with_tests(vec![]);
    let analyzer = MockAnalyzer::new()
        .lookup_error("a.go")
        .map("b.go", &["b_test.go"]);
    let engine = engine(Some(runner), Some(analyzer), no_graph());

    let run = engine
        .run_targeted_tests(
            &go_config(TestScope::Affected),
            &scenario_graph(),
            &CancellationToken::new(),
        )
        .await
        .expect("targeted run");

    assert_eq!(paths(&run.value), vec!["b_test.go"]);
    assert!(run.has_warning(WarningKind::TestLookupFailed));
}

#[tokio::test]
async fn missing_runner_is_fatal_everywhere() {
    let engine = engine(None, Some(MockAnalyzer::new()), no_graph());
    let cancel = CancellationToken::new();
    let config = go_config(TestScope::Affected);

    assert!(matches!(
        engine.run_tests(&config, &cancel).await,
        Err(TestEngineError::NoRunner(_))
    ));
    assert!(matches!(
        engine.run_targeted_tests(&config, &scenario_graph(), &cancel).await,
        Err(TestEngineError::NoRunner(_))
    ));
    assert!(matches!(
        engine.discover_tests(Path::new("/work/shop"), "go", &cancel).await,
        Err(TestEngineError::NoRunner(_))
    ));
}

#[tokio::test]
async fn scope_and_patterns_narrow_the_full_suite() {
    let runner = MockRunner::with_tests(vec![
        unit("cart/cart_test.go"),
        integration("cart/flow_test.go"),
        unit("vendor/lib_test.go"),
        smoke("health_test.go"),
    ]);
    let engine = engine(Some(runner.clone()), None, no_graph());

    let config = go_config(TestScope::Unit).with_patterns(vec![], vec!["vendor/**".into()]);
    let run = engine
        .run_tests(&config, &CancellationToken::new())
        .await
        .expect("full run");

    assert_eq!(paths(&run.value), vec!["cart/cart_test.go"]);
    assert_eq!(runner.suite_runs(), vec![owned(&["cart/cart_test.go"])]);
}

#[tokio::test]
async fn discovered_suite_is_named_after_the_project() {
    let runner = MockRunner::with_tests(vec![unit("a_test.go")]);
    let engine = engine(Some(runner), None, no_graph());

    let suite = engine
        .discover_tests(Path::new("/work/shop"), "go", &CancellationToken::new())
        .await
        .expect("discover");

    assert_eq!(suite.name, "shop");
    assert_eq!(suite.language, "go");
    assert_eq!(suite.tests.len(), 1);
    assert_eq!(engine.supported_languages(), owned(&["go"]));
}

#[tokio::test]
async fn cancelled_targeted_run_stops() {
    let analyzer = MockAnalyzer::new().map("b.go", &["b_test.go"]);
    let engine = engine(Some(MockRunner::default()), Some(analyzer), no_graph());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = engine
        .run_targeted_tests(&go_config(TestScope::Affected), &scenario_graph(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, TestEngineError::Cancelled));
}

#[tokio::test]
async fn graph_built_from_snapshot_drives_targeted_run() {
    let runner = MockRunner::with_tests(vec![unit("b_test.go"), unit("z_test.go")]);
    let analyzer = MockAnalyzer::new().map("b.go", &["b_test.go"]);
    let engine = engine(
        Some(runner.clone()),
        Some(analyzer),
        StaticGraphProvider::new(file_graph(&[("a.go", "b.go")])),
    );
    let cancel = CancellationToken::new();

    let affected = engine
        .build_affected_graph(&owned(&["a.go"]), Path::new("/work/shop"), &cancel)
        .await
        .expect("build");
    let run = engine
        .run_targeted_tests(&go_config(TestScope::Affected), &affected.value, &cancel)
        .await
        .expect("run");

    assert_eq!(paths(&run.value), vec!["b_test.go"]);
    assert_eq!(runner.single_runs(), owned(&["b_test.go"]));
}

#[tokio::test]
async fn smoke_scope_puts_smoke_tests_first() {
    let runner = MockRunner::with_tests(vec![unit("a_test.go"), smoke("health_test.go")]);
    let analyzer = MockAnalyzer::new()
        .map("a.go", &["a_test.go"])
        .smoke("health_test.go");
    let engine = engine(Some(runner.clone()), Some(analyzer), no_graph());

    let run = engine
        .run_targeted_tests(
            &go_config(TestScope::Smoke),
            &AffectedGraph::changed_only(&owned(&["a.go"])),
            &CancellationToken::new(),
        )
        .await
        .expect("targeted run");

    assert_eq!(paths(&run.value), vec!["health_test.go", "a_test.go"]);
    assert_eq!(runner.single_runs(), owned(&["health_test.go", "a_test.go"]));
    assert!(run.warnings.is_empty());
}

#[tokio::test]
async fn failed_smoke_discovery_still_runs_affected_tests() {
    let runner = MockRunner::with_tests(vec![]).undiscoverable("go list failed");
    let analyzer = MockAnalyzer::new()
        .map("b.go", &["b_test.go"])
        .smoke("health_test.go");
    let engine = engine(Some(runner.clone()), Some(analyzer), no_graph());

    let run = engine
        .run_targeted_tests(
            &go_config(TestScope::AffectedSmoke),
            &scenario_graph(),
            &CancellationToken::new(),
        )
        .await
        .expect("smoke discovery failure is not fatal");

    assert_eq!(paths(&run.value), vec!["b_test.go"]);
    assert_eq!(run.warnings.len(), 1);
    assert_eq!(run.warnings[0].kind, WarningKind::SmokeDiscoveryFailed);
    assert!(run.warnings[0].message.contains("go list failed"));
    assert_eq!(runner.single_runs(), owned(&["b_test.go"]));
}

#[tokio::test]
async fn full_run_propagates_runner_errors() {
    let config = go_config(TestScope::All);
    let cancel = CancellationToken::new();

    let undiscoverable = MockRunner::with_tests(vec![]).undiscoverable("go list failed");
    let err = engine(Some(undiscoverable.clone()), None, no_graph())
        .run_tests(&config, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, TestEngineError::Discovery(_)));
    assert_eq!(err.to_string(), "failed to discover tests: go list failed");
    assert!(undiscoverable.suite_runs().is_empty());

    let crashing = MockRunner::with_tests(vec![unit("a_test.go")]).suite_crashes("go test died");
    let err = engine(Some(crashing), None, no_graph())
        .run_tests(&config, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, TestEngineError::Execution(_)));
    assert_eq!(err.to_string(), "failed to run test suite: go test died");
}
