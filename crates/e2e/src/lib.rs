//! calcmatrix E2E runner
//!
//! This crate drives the case matrix from `calcmatrix-common` against a live
//! calculator page:
//! - Repeats the full matrix once per enabled build variant
//! - Opens a fresh driver session for every case
//! - Controls Playwright through generated Node scripts
//! - Writes a JSON report and derives the process exit code
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  calcmatrix runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── run_all() -> TestSuiteResult                         │
//! │    │     └── run_build(build) for each enabled build        │
//! │    │           └── run_case(case) in a fresh session        │
//! │    │                 ├── navigate, select_build (setup)     │
//! │    │                 ├── enter_operation                    │
//! │    │                 └── AssertionPolicy checks             │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CalculatorDriver (trait)                                   │
//! │    └── PlaywrightSession: records actions, replays on read  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod playwright;
pub mod preflight;
pub mod runner;

pub use config::{BuildToggle, HarnessConfig};
pub use driver::{CalculatorDriver, DriverFactory};
pub use error::{E2eError, E2eResult};
pub use runner::{CaseResult, CaseStatus, TestRunner, TestSuiteResult};
