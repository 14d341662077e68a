//! Assertion policy: compares what the page shows with what a case expects

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::numfmt::{self, NumberFormat};
use crate::types::{ExpectedError, ExpectedValue};

/// Which check a mismatch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Value,
    IntegerOnly,
    ErrorMessage,
    Cleared,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Check::Value => "answer",
            Check::IntegerOnly => "integer-only answer",
            Check::ErrorMessage => "error message",
            Check::Cleared => "cleared answer",
        };
        f.write_str(s)
    }
}

/// The displayed outcome did not match the expectation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{check} mismatch: expected {expected:?}, got {actual:?}")]
pub struct AssertionMismatch {
    pub check: Check,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssertionPolicy {
    pub number_format: NumberFormat,
}

impl AssertionPolicy {
    pub fn new(number_format: NumberFormat) -> Self {
        Self { number_format }
    }

    /// Text the answer field must show for a value expectation
    pub fn expected_text(&self, expected: &ExpectedValue) -> String {
        match expected.fixed_places {
            Some(places) => numfmt::to_fixed(expected.value, places),
            None => numfmt::format_number(expected.value, self.number_format),
        }
    }

    /// Text the answer field must show once integer-only mode is on
    pub fn expected_integer_only(&self, expected: &ExpectedValue) -> String {
        numfmt::to_fixed(expected.value, 0)
    }

    pub fn check_value(&self, expected: &ExpectedValue, actual: &str) -> Result<(), AssertionMismatch> {
        equal(Check::Value, self.expected_text(expected), actual)
    }

    pub fn check_integer_only(
        &self,
        expected: &ExpectedValue,
        actual: &str,
    ) -> Result<(), AssertionMismatch> {
        equal(Check::IntegerOnly, self.expected_integer_only(expected), actual)
    }

    /// The error banner only has to contain the expected text
    pub fn check_error(&self, expected: &ExpectedError, actual: &str) -> Result<(), AssertionMismatch> {
        if actual.contains(&expected.message_substring) {
            Ok(())
        } else {
            Err(AssertionMismatch {
                check: Check::ErrorMessage,
                expected: expected.message_substring.clone(),
                actual: actual.to_string(),
            })
        }
    }

    pub fn check_cleared(&self, actual: &str) -> Result<(), AssertionMismatch> {
        equal(Check::Cleared, String::new(), actual)
    }
}

fn equal(check: Check, expected: String, actual: &str) -> Result<(), AssertionMismatch> {
    if expected == actual {
        Ok(())
    } else {
        Err(AssertionMismatch {
            check,
            expected,
            actual: actual.to_string(),
        })
    }
}
