//! In-process stand-in for the calculator page
//!
//! `ReferenceCalculator` answers the way a correct build of the page does.
//! Builds can be marked with a [`Fault`] to reproduce broken variants.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use calcmatrix_common::numfmt::{format_number, parse_number, to_fixed};
use calcmatrix_common::{BuildVariant, NumberFormat, Operand, Operator};
use calcmatrix_e2e::{CalculatorDriver, DriverFactory, E2eError, E2eResult};

/// Defect injected into one build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Add subtracts instead
    WrongSum,
    /// Dividing by zero shows "Infinity" and no error
    NoDivideByZeroCheck,
    /// The answer field cannot be read
    UnreadableAnswer,
    /// Pages of this build never finish loading
    Hang,
}

/// Driver calls made across every session of a factory
#[derive(Debug, Default)]
pub struct CallCounts {
    pub toggles: AtomicUsize,
    pub clears: AtomicUsize,
}

#[derive(Default)]
pub struct ReferenceFactory {
    faults: HashMap<String, Fault>,
    format: NumberFormat,
    opened: Arc<AtomicUsize>,
    calls: Arc<CallCounts>,
}

impl ReferenceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(mut self, build: &str, fault: Fault) -> Self {
        self.faults.insert(build.to_string(), fault);
        self
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }

    /// Sessions opened so far
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// `toggle_integer_only` calls so far
    pub fn toggles(&self) -> usize {
        self.calls.toggles.load(Ordering::SeqCst)
    }

    /// `clear` calls so far
    pub fn clears(&self) -> usize {
        self.calls.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverFactory for ReferenceFactory {
    async fn open(&self) -> E2eResult<Box<dyn CalculatorDriver>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ReferenceCalculator {
            faults: self.faults.clone(),
            format: self.format,
            calls: self.calls.clone(),
            ..Default::default()
        }))
    }
}

#[derive(Default)]
pub struct ReferenceCalculator {
    faults: HashMap<String, Fault>,
    format: NumberFormat,
    calls: Arc<CallCounts>,
    loaded: bool,
    fault: Option<Fault>,
    value: Option<f64>,
    answer: String,
    error: String,
}

impl ReferenceCalculator {
    fn ensure_loaded(&self, action: &str) -> E2eResult<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(E2eError::Driver {
                action: action.to_string(),
                reason: "page not loaded".to_string(),
            })
        }
    }

    fn calculate(&mut self, a: &Operand, b: &Operand, operator: Operator) {
        self.value = None;
        self.answer.clear();
        self.error.clear();

        let a_text = a.to_input();
        let b_text = b.to_input();

        if operator == Operator::Concatenate {
            self.answer = format!("{}{}", a_text, b_text);
            return;
        }

        let Some(x) = parse_number(&a_text) else {
            self.error = "Number 1 is not a number".to_string();
            return;
        };
        let Some(y) = parse_number(&b_text) else {
            self.error = "Number 2 is not a number".to_string();
            return;
        };

        let value = match operator {
            Operator::Add if self.fault == Some(Fault::WrongSum) => x - y,
            Operator::Add => x + y,
            Operator::Subtract => x - y,
            Operator::Multiply => x * y,
            Operator::Divide if y == 0.0 && self.fault != Some(Fault::NoDivideByZeroCheck) => {
                self.error = "Divide by zero error!".to_string();
                return;
            }
            Operator::Divide => x / y,
            Operator::Concatenate => unreachable!(),
        };

        self.value = Some(value);
        self.answer = format_number(value, self.format);
    }
}

#[async_trait]
impl CalculatorDriver for ReferenceCalculator {
    async fn navigate(&mut self) -> E2eResult<()> {
        self.loaded = true;
        self.fault = None;
        self.value = None;
        self.answer.clear();
        self.error.clear();
        Ok(())
    }

    async fn select_build(&mut self, build: &BuildVariant) -> E2eResult<()> {
        self.ensure_loaded("select_build")?;
        self.fault = self.faults.get(build.id()).copied();
        if self.fault == Some(Fault::Hang) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(())
    }

    async fn enter_operation(&mut self, a: &Operand, b: &Operand, operator: Operator) -> E2eResult<()> {
        self.ensure_loaded("enter_operation")?;
        self.calculate(a, b, operator);
        Ok(())
    }

    async fn read_result(&mut self) -> E2eResult<String> {
        self.ensure_loaded("read_result")?;
        if self.fault == Some(Fault::UnreadableAnswer) {
            return Err(E2eError::Driver {
                action: "read_result".to_string(),
                reason: "answer field detached".to_string(),
            });
        }
        Ok(self.answer.clone())
    }

    async fn read_error_message(&mut self) -> E2eResult<String> {
        self.ensure_loaded("read_error_message")?;
        Ok(self.error.clone())
    }

    async fn toggle_integer_only(&mut self) -> E2eResult<()> {
        self.ensure_loaded("toggle_integer_only")?;
        self.calls.toggles.fetch_add(1, Ordering::SeqCst);
        if let Some(value) = self.value {
            self.answer = to_fixed(value, 0);
        }
        Ok(())
    }

    async fn clear(&mut self) -> E2eResult<()> {
        self.ensure_loaded("clear")?;
        self.calls.clears.fetch_add(1, Ordering::SeqCst);
        self.value = None;
        self.answer.clear();
        Ok(())
    }
}
