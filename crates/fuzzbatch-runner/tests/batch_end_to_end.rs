//! Whole batches against an in-process stand-in for the fuzzing tool.

use fuzzbatch_common::RunnerConfig;
use fuzzbatch_runner::{
    BatchReport, InvocationOutcome, RunLayout, RunnerError, Selector, ToolInvocation, ToolRunner,
    run_batch,
};
use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempDir;

const ANALYSIS_HEADER: &str = "TestName,NumberActualBugTotal,NoLeaksTotal,NoLeaksWithRewriteTotal,NoLeaksResolvedViaReplayTotal,NoPanicsTotal,NoPanicsVerifiedViaReplayTotal";

/// Writes a plausible `advocateResult` tree for every call and remembers it.
#[derive(Default)]
struct FakeTool {
    calls: Vec<(String, String)>,
    exit_code: i32,
    /// Replace this (test, mode) results directory with a plain file while running.
    block_results_of: Option<(String, String)>,
}

impl ToolRunner for FakeTool {
    fn run(&mut self, inv: &ToolInvocation) -> io::Result<Option<i32>> {
        self.calls.push((inv.test.clone(), inv.mode.clone()));
        let out = inv.test_dir.join("advocateResult");
        let run_dir = out.join(format!("file(1)-test(1)-{}", inv.test));
        fs::create_dir_all(&run_dir)?;
        fs::write(run_dir.join("output.log"), format!("{} under {}\n", inv.test, inv.mode))?;

        let bugs = inv.mode.len();
        fs::write(
            out.join(format!("statsAnalysis_{}.csv", inv.test)),
            format!("{ANALYSIS_HEADER}\n{},{bugs},0,0,0,0,0\n", inv.test),
        )?;
        fs::write(
            out.join(format!("statsFuzzing_{}.csv", inv.test)),
            format!("TestName,NoRuns\n{},{}\n", inv.test, inv.max_runs),
        )?;
        if self.block_results_of.as_ref() == Some(&(inv.test.clone(), inv.mode.clone())) {
            let dest = inv.test_dir.join("results").join(&inv.test).join(&inv.mode);
            fs::remove_dir_all(&dest)?;
            fs::write(&dest, "not a directory")?;
        }
        Ok(Some(self.exit_code))
    }
}

struct MissingTool;

impl ToolRunner for MissingTool {
    fn run(&mut self, _: &ToolInvocation) -> io::Result<Option<i32>> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

fn fixture() -> (TempDir, RunnerConfig) {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("race_test.go"),
        "package race\n\nfunc TestAlpha(t *testing.T) {}\n\nfunc TestBeta(t *testing.T) {}\n",
    )
    .unwrap();
    let config = RunnerConfig::from_yaml_str(
        "modes: [GFuzz, Flow]\nmax_runs: 7\nlog_files: [output.log]\nstat_prefixes: [statsAnalysis, statsFuzzing]\n",
        dir.path(),
    )
    .unwrap();
    (dir, config)
}

fn run(dir: &Path, config: &RunnerConfig, selector: Selector, tool: &mut dyn ToolRunner) -> BatchReport {
    let layout = RunLayout::new(dir, &config.results_dir).unwrap();
    run_batch(config, &layout, &selector, tool).unwrap()
}

#[test]
fn all_on_all_runs_every_pair_and_compares_each_test() {
    let (dir, config) = fixture();
    let mut tool = FakeTool::default();
    let report = run(dir.path(), &config, Selector::AllOnAll, &mut tool);

    let pair = |t: &str, m: &str| (t.to_string(), m.to_string());
    assert_eq!(
        tool.calls,
        vec![
            pair("TestAlpha", "GFuzz"),
            pair("TestAlpha", "Flow"),
            pair("TestBeta", "GFuzz"),
            pair("TestBeta", "Flow"),
        ]
    );
    assert_eq!(report.invocations.len(), 4);
    assert_eq!(report.failed_invocations(), 0);
    assert_eq!(report.comparisons_written(), 2);

    let results = dir.path().join("results");
    let comparisons: Vec<_> = ["TestAlpha", "TestBeta"]
        .iter()
        .map(|t| results.join(t).join("comparison.csv"))
        .filter(|p| p.is_file())
        .collect();
    assert_eq!(comparisons.len(), 2);
    assert!(!dir.path().join("advocateResult").exists());

    for test in ["TestAlpha", "TestBeta"] {
        let combined = results.join(test).join("combined");
        let log = fs::read_to_string(combined.join("logs/output.log")).unwrap();
        let gfuzz = log.find("### Mode: GFuzz").unwrap();
        let flow = log.find("### Mode: Flow").unwrap();
        assert!(gfuzz < flow, "logs follow the configured mode order");
        assert!(log.contains(&format!("{test} under Flow")));

        let stats = fs::read_to_string(combined.join(format!("stats/statsFuzzing_{test}.csv"))).unwrap();
        assert_eq!(stats, format!("Mode,TestName,NoRuns\nFlow,{test},7\nGFuzz,{test},7\n"));
        assert!(combined.join(format!("stats/statsAnalysis_{test}.csv")).is_file());
    }

    let alpha = fs::read_to_string(results.join("TestAlpha/comparison.csv")).unwrap();
    let lines: Vec<&str> = alpha.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Mode,"));
    assert!(lines[1].starts_with("Flow,"));
    assert!(lines[2].starts_with("GFuzz,"));
}

#[test]
fn rerunning_a_batch_leaves_the_same_comparison() {
    let (dir, config) = fixture();
    run(dir.path(), &config, Selector::AllOnAll, &mut FakeTool::default());
    let path = dir.path().join("results/TestBeta/comparison.csv");
    let first = fs::read(&path).unwrap();
    run(dir.path(), &config, Selector::AllOnAll, &mut FakeTool::default());
    assert_eq!(first, fs::read(&path).unwrap());
}

#[test]
fn one_mode_selector_still_aggregates() {
    let (dir, config) = fixture();
    let mut tool = FakeTool::default();
    let report = run(dir.path(), &config, Selector::OneOnAll { mode: "Flow".into() }, &mut tool);
    assert_eq!(tool.calls.len(), 2);
    assert_eq!(report.comparisons_written(), 2);
    assert!(dir.path().join("results/TestAlpha/combined/logs/output.log").is_file());
}

#[test]
fn one_on_one_runs_exactly_once() {
    let (dir, config) = fixture();
    let mut tool = FakeTool::default();
    let selector = Selector::OneOnOne { mode: "GFuzz".into(), test: "TestBeta".into() };
    let report = run(dir.path(), &config, selector, &mut tool);
    assert_eq!(tool.calls, vec![("TestBeta".to_string(), "GFuzz".to_string())]);
    assert_eq!(report.tests.len(), 1);
    assert!(!dir.path().join("results/TestAlpha").exists());
}

#[test]
fn nonzero_exit_is_recorded_and_batch_continues() {
    let (dir, config) = fixture();
    let mut tool = FakeTool { exit_code: 2, ..FakeTool::default() };
    let report = run(dir.path(), &config, Selector::AllOnOne { test: "TestAlpha".into() }, &mut tool);
    assert_eq!(report.invocations.len(), 2);
    assert_eq!(report.failed_invocations(), 2);
    assert_eq!(report.invocations[0].outcome, InvocationOutcome::Exited { code: Some(2) });
    assert_eq!(report.comparisons_written(), 1);
}

#[test]
fn spawn_failure_is_recorded_and_batch_continues() {
    let (dir, config) = fixture();
    let report = run(dir.path(), &config, Selector::AllOnAll, &mut MissingTool);
    assert_eq!(report.invocations.len(), 4);
    assert!(
        report
            .invocations
            .iter()
            .all(|i| matches!(i.outcome, InvocationOutcome::SpawnFailed { .. }))
    );
    // empty mode directories still yield a comparison table
    let text = fs::read_to_string(dir.path().join("results/TestAlpha/comparison.csv")).unwrap();
    assert_eq!(text, "Mode\nFlow\nGFuzz\n");
}

#[test]
fn collect_failure_is_recorded_and_batch_continues() {
    let (dir, config) = fixture();
    let mut tool = FakeTool {
        block_results_of: Some(("TestAlpha".into(), "GFuzz".into())),
        ..FakeTool::default()
    };
    let report = run(dir.path(), &config, Selector::AllOnAll, &mut tool);

    assert_eq!(tool.calls.len(), 4);
    assert_eq!(report.invocations.len(), 4);
    let blocked = &report.invocations[0];
    assert_eq!((blocked.test.as_str(), blocked.mode.as_str()), ("TestAlpha", "GFuzz"));
    assert_eq!(blocked.outcome, InvocationOutcome::Exited { code: Some(0) });
    assert!(blocked.collect_error.is_some());
    assert!(report.invocations[1..].iter().all(|i| i.collect_error.is_none()));
    assert_eq!(report.failed_invocations(), 1);
    assert_eq!(report.tests.len(), 2);
    assert!(dir.path().join("results/TestBeta/comparison.csv").is_file());

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["invocations"][0]["collect_error"].is_string());
    assert!(json["invocations"][1].get("collect_error").is_none());
}

#[test]
fn no_tests_is_an_error() {
    let (dir, config) = fixture();
    fs::remove_file(dir.path().join("race_test.go")).unwrap();
    let layout = RunLayout::new(dir.path(), &config.results_dir).unwrap();
    let err = run_batch(&config, &layout, &Selector::AllOnAll, &mut FakeTool::default()).unwrap_err();
    assert!(matches!(err, RunnerError::NoTests { .. }));
}

#[test]
fn report_serializes_to_json() {
    let (dir, config) = fixture();
    let report = run(dir.path(), &config, Selector::AllOnOne { test: "TestAlpha".into() }, &mut FakeTool::default());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["selector"], "all-on-one");
    assert_eq!(json["invocations"].as_array().unwrap().len(), 2);
    assert_eq!(json["invocations"][0]["outcome"]["status"], "exited");
    assert_eq!(json["tests"][0]["test"], "TestAlpha");
}
