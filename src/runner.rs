//! Runs test cases in isolation and collects their results.
//!
//! Each case gets a fresh fixture directory and a fresh scratch area, both
//! removed when the case finishes. A failing case is recorded and the run
//! moves on to the next one.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tempfile::TempDir;

use crate::cases::{CaseContext, TestCase};
use crate::common::Scratch;
use crate::config::Toolchain;
use crate::oracle::ComparisonMismatch;
use crate::timing::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SetUp,
    Run,
}

/// Lifecycle of one case. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Created,
    SetUpComplete,
    RunComplete,
    Failed(Phase),
}

impl CaseState {
    /// The state after the current phase finished with `ok`.
    pub fn advance(self, ok: bool) -> Self {
        match (self, ok) {
            (CaseState::Created, true) => CaseState::SetUpComplete,
            (CaseState::Created, false) => CaseState::Failed(Phase::SetUp),
            (CaseState::SetUpComplete, true) => CaseState::RunComplete,
            (CaseState::SetUpComplete, false) => CaseState::Failed(Phase::Run),
            (terminal, _) => terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CaseState::RunComplete | CaseState::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_secs: f64,
}

/// Results of a run, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub cases: Vec<CaseOutcome>,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(|c| c.passed)
    }

    pub fn fail_count(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed).count()
    }

    pub fn get(&self, name: &str) -> Option<&CaseOutcome> {
        self.cases.iter().find(|c| c.name == name)
    }

    /// Print the per-case table.
    pub fn print(&self) {
        println!("Results:");
        for case in &self.cases {
            println!("{:<32}: {:<4}", case.name, if case.passed { "PASS" } else { "FAIL" });
        }
        println!();
        println!(
            "Summary: {}/{} passed",
            self.cases.len() - self.fail_count(),
            self.cases.len()
        );
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run report")
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only run cases with these names; empty runs everything.
    pub filter: Vec<String>,
    /// Stop after the first failing case.
    pub fail_fast: bool,
}

pub struct Runner {
    tools: Toolchain,
    options: RunOptions,
}

impl Runner {
    pub fn new(tools: Toolchain, options: RunOptions) -> Self {
        Self { tools, options }
    }

    /// Run the selected cases sequentially.
    ///
    /// Errors only when the filter names a case that does not exist.
    pub fn run<T: TestCase>(&self, cases: &[T]) -> Result<RunReport> {
        for name in &self.options.filter {
            if !cases.iter().any(|c| c.name() == name) {
                bail!("Unknown test case '{}'", name);
            }
        }

        let selected: Vec<&T> = cases
            .iter()
            .filter(|c| self.options.filter.is_empty() || self.options.filter.iter().any(|f| f == c.name()))
            .collect();

        let mut report = RunReport::default();
        for (i, case) in selected.iter().enumerate() {
            let outcome = self.run_case(*case);
            let failed = !outcome.passed;
            report.cases.push(outcome);

            if failed && self.options.fail_fast {
                let remaining = selected.len() - i - 1;
                if remaining > 0 {
                    eprintln!("  [WARN] --fail-fast: skipping {} remaining case(s)", remaining);
                }
                break;
            }
        }
        Ok(report)
    }

    fn run_case(&self, case: &dyn TestCase) -> CaseOutcome {
        let name = case.name();
        println!("Running test case: {}", name);
        let timer = Timer::start(name);

        let (state, error) = self.execute(case);
        match &error {
            None => println!("  [PASS]"),
            Some(err) => {
                if let Some(mismatch) = err.downcast_ref::<ComparisonMismatch>() {
                    print!("{}", mismatch.comparison.report());
                }
                println!("  [FAIL] {:#}", err);
            }
        }
        let elapsed = timer.finish();

        CaseOutcome {
            name: name.to_string(),
            passed: state == CaseState::RunComplete,
            failed_phase: match state {
                CaseState::Failed(phase) => Some(phase),
                _ => None,
            },
            error: error.map(|e| format!("{:#}", e)),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    fn execute(&self, case: &dyn TestCase) -> (CaseState, Option<anyhow::Error>) {
        let mut state = CaseState::Created;

        let fixture = TempDir::new()
            .context("Failed to create fixture directory")
            .and_then(|dir| case.set_up(dir.path()).map(|()| dir));
        state = state.advance(fixture.is_ok());
        let fixture = match fixture {
            Ok(dir) => dir,
            Err(e) => return (state, Some(e)),
        };

        let run = Scratch::new().and_then(|scratch| {
            let ctx = CaseContext {
                tools: &self.tools,
                scratch: &scratch,
            };
            case.run(fixture.path(), &ctx)
        });
        state = state.advance(run.is_ok());
        (state, run.err())
    }
}
