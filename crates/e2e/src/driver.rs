//! Driver interface between the test matrix and the page under test
//!
//! The runner only talks to the calculator through [`CalculatorDriver`].
//! Every method is a suspension point; an `Err` is an infrastructure fault
//! (the page could not be driven or read), never a wrong answer.

use async_trait::async_trait;

use calcmatrix_common::{BuildVariant, Operand, Operator};

use crate::error::E2eResult;

/// One interaction session with the calculator page
#[async_trait]
pub trait CalculatorDriver: Send {
    /// Prepare a fresh page
    async fn navigate(&mut self) -> E2eResult<()>;

    /// Switch the active calculator build
    async fn select_build(&mut self, build: &BuildVariant) -> E2eResult<()>;

    /// Fill both number fields, pick the operator and press Calculate
    async fn enter_operation(&mut self, a: &Operand, b: &Operand, operator: Operator) -> E2eResult<()>;

    /// Text currently shown in the answer field
    async fn read_result(&mut self) -> E2eResult<String>;

    /// Text currently shown in the error banner
    async fn read_error_message(&mut self) -> E2eResult<String>;

    /// Tick the integer-only box for the current answer
    async fn toggle_integer_only(&mut self) -> E2eResult<()>;

    /// Press Clear
    async fn clear(&mut self) -> E2eResult<()>;
}

/// Opens independent driver sessions, one per test case
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn open(&self) -> E2eResult<Box<dyn CalculatorDriver>>;
}
