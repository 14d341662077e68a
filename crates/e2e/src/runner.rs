//! Main test runner: repeats the case matrix for every enabled build

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info};

use calcmatrix_common::{
    AssertionMismatch, AssertionPolicy, BuildVariant, CaseKind, CaseMatrix, Category, Expectation,
    TestCase,
};

use crate::config::HarnessConfig;
use crate::driver::DriverFactory;
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    /// The page showed something other than expected
    Failed,
    /// The page could not be driven or read
    Errored,
}

/// Result of running a single case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    pub build: BuildVariant,
    pub category: Category,
    pub status: CaseStatus,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mismatch: Option<AssertionMismatch>,
    pub error: Option<String>,
}

impl CaseResult {
    pub fn success(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Counts for one build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub build: BuildVariant,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,
}

impl BuildSummary {
    fn from_results(build: &BuildVariant, results: &[CaseResult], duration_ms: u64) -> Self {
        let count = |status: CaseStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            build: build.clone(),
            total: results.len(),
            passed: count(CaseStatus::Passed),
            failed: count(CaseStatus::Failed),
            errored: count(CaseStatus::Errored),
            duration_ms,
        }
    }
}

/// Result of running all builds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped_builds: Vec<BuildVariant>,
    pub duration_ms: u64,
    pub builds: Vec<BuildSummary>,
    pub results: Vec<CaseResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    pub fn build(&self, build: &BuildVariant) -> Option<&BuildSummary> {
        self.builds.iter().find(|b| &b.build == build)
    }
}

/// Why a case did not pass
#[derive(Debug, Error)]
enum CaseFailure {
    #[error(transparent)]
    Mismatch(#[from] AssertionMismatch),

    #[error(transparent)]
    Infrastructure(#[from] E2eError),
}

/// Runs the case matrix against each build through a driver factory
pub struct TestRunner {
    factory: Arc<dyn DriverFactory>,
    matrix: CaseMatrix,
    policy: AssertionPolicy,
    builds: Vec<BuildVariant>,
    skipped_builds: Vec<BuildVariant>,
    concurrency: usize,
    case_timeout: Duration,
    output_dir: PathBuf,
}

impl TestRunner {
    /// Create a runner with default policy, sequential cases and no skipped builds
    pub fn new(factory: Arc<dyn DriverFactory>, matrix: CaseMatrix, builds: Vec<BuildVariant>) -> Self {
        let defaults = HarnessConfig::default();
        Self {
            factory,
            matrix,
            policy: AssertionPolicy::default(),
            builds,
            skipped_builds: Vec::new(),
            concurrency: defaults.concurrency,
            case_timeout: defaults.case_timeout(),
            output_dir: defaults.output_dir,
        }
    }

    /// Create a runner from a validated harness configuration
    pub fn with_config(config: &HarnessConfig, factory: Arc<dyn DriverFactory>) -> E2eResult<Self> {
        config.validate()?;
        let matrix = config.case_matrix()?;

        Ok(Self {
            factory,
            matrix,
            policy: AssertionPolicy::new(config.number_format),
            builds: config.enabled_builds(),
            skipped_builds: config.disabled_builds(),
            concurrency: config.concurrency,
            case_timeout: config.case_timeout(),
            output_dir: config.output_dir.clone(),
        })
    }

    pub fn with_policy(mut self, policy: AssertionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_case_timeout(mut self, timeout: Duration) -> Self {
        self.case_timeout = timeout;
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn matrix(&self) -> &CaseMatrix {
        &self.matrix
    }

    /// Run every declared case on every enabled build
    pub async fn run_all(&self) -> TestSuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            "Running {} case(s) on each of {} build(s)...",
            self.matrix.cases_per_build(),
            self.builds.len()
        );
        for build in &self.skipped_builds {
            info!("Build {} is disabled, skipping", build);
        }

        let mut builds = Vec::with_capacity(self.builds.len());
        let mut results = Vec::new();
        for build in &self.builds {
            let (summary, mut build_results) = self.run_build(build).await;
            builds.push(summary);
            results.append(&mut build_results);
        }

        let count = |status: CaseStatus| results.iter().filter(|r| r.status == status).count();
        let passed = count(CaseStatus::Passed);
        let failed = count(CaseStatus::Failed);
        let errored = count(CaseStatus::Errored);
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} errored, {} build(s) skipped ({} ms)",
            passed,
            failed,
            errored,
            self.skipped_builds.len(),
            duration_ms
        );

        TestSuiteResult {
            started_at,
            total: results.len(),
            passed,
            failed,
            errored,
            skipped_builds: self.skipped_builds.clone(),
            duration_ms,
            builds,
            results,
        }
    }

    /// Run the whole matrix against one build
    pub async fn run_build(&self, build: &BuildVariant) -> (BuildSummary, Vec<CaseResult>) {
        let start = Instant::now();
        let cases = self.matrix.expand(build);
        info!("Build {}: {} case(s)", build, cases.len());

        // Every case opens its own session, so cases may overlap
        let results: Vec<CaseResult> = stream::iter(cases.iter())
            .map(|case| self.run_case(case))
            .buffered(self.concurrency)
            .collect()
            .await;

        let summary = BuildSummary::from_results(build, &results, start.elapsed().as_millis() as u64);
        info!(
            "Build {}: {} passed, {} failed, {} errored",
            build, summary.passed, summary.failed, summary.errored
        );
        (summary, results)
    }

    /// Run a single case in a fresh driver session
    pub async fn run_case(&self, case: &TestCase) -> CaseResult {
        let start = Instant::now();
        debug!("Running case: {}", case.name);

        let outcome = match tokio::time::timeout(self.case_timeout, self.execute(case)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(CaseFailure::Infrastructure(E2eError::Timeout(format!(
                "case '{}' after {} ms",
                case.name,
                self.case_timeout.as_millis()
            )))),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let (status, mismatch, error) = match outcome {
            Ok(()) => {
                info!("✓ {} ({} ms)", case.name, duration_ms);
                (CaseStatus::Passed, None, None)
            }
            Err(CaseFailure::Mismatch(m)) => {
                error!("✗ {} - {}", case.name, m);
                let message = m.to_string();
                (CaseStatus::Failed, Some(m), Some(message))
            }
            Err(CaseFailure::Infrastructure(e)) => {
                error!("✗ {} - driver error: {}", case.name, e);
                (CaseStatus::Errored, None, Some(e.to_string()))
            }
        };

        CaseResult {
            name: case.name.clone(),
            build: case.build.clone(),
            category: case.category,
            status,
            duration_ms,
            mismatch,
            error,
        }
    }

    async fn execute(&self, case: &TestCase) -> Result<(), CaseFailure> {
        let mut driver = self.factory.open().await?;

        // Setup completes before anything is asserted
        driver.navigate().await?;
        driver.select_build(&case.build).await?;

        let op = case.kind.operation();
        driver
            .enter_operation(&op.operand_a, &op.operand_b, op.operator)
            .await?;

        match &op.expectation {
            Expectation::Value(expected) => {
                let answer = driver.read_result().await?;
                self.policy.check_value(expected, &answer)?;

                if expected.integer_only {
                    driver.toggle_integer_only().await?;
                    let answer = driver.read_result().await?;
                    self.policy.check_integer_only(expected, &answer)?;
                }
            }
            Expectation::Error(expected) => {
                let message = driver.read_error_message().await?;
                self.policy.check_error(expected, &message)?;
            }
        }

        if let CaseKind::ClearAfter(_) = case.kind {
            driver.clear().await?;
            let answer = driver.read_result().await?;
            self.policy.check_cleared(&answer)?;
        }

        Ok(())
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
