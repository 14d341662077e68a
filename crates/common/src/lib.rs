//! calcmatrix common library
//!
//! The data-driven core of the calculator test matrix: operand tables,
//! expected outcomes, error classification and the assertion policy.
//! Nothing in this crate talks to a browser.

pub mod assertion;
pub mod cases;
pub mod classify;
pub mod error;
pub mod numfmt;
pub mod types;

// Re-export commonly used types
pub use assertion::{AssertionMismatch, AssertionPolicy, Check};
pub use cases::{generate, CaseMatrix, CaseTable, OperandPair};
pub use classify::{classify, expect};
pub use error::{Error, Result};
pub use numfmt::NumberFormat;
pub use types::*;

/// calcmatrix version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
