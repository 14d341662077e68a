//! Expected-outcome classification
//!
//! Error conditions are decided from the declared operands before any
//! arithmetic is considered. Priority is fixed: an invalid first operand wins
//! over an invalid second operand, and both win over divide-by-zero.

use crate::types::{
    ErrorKind, Expectation, ExpectedError, ExpectedValue, Operand, OperandField, Operator,
};

/// Decimal places shown by the Concatenate operation
pub const CONCATENATE_PLACES: usize = 3;

/// Error the page must report for this input, if any
pub fn classify(a: &Operand, b: &Operand, operator: Operator) -> Option<ExpectedError> {
    checked_operands(a, b, operator).err()
}

/// Full expected outcome for an operand pair
pub fn expect(a: &Operand, b: &Operand, operator: Operator) -> Expectation {
    let (x, y) = match checked_operands(a, b, operator) {
        Ok(values) => values,
        Err(error) => return Expectation::Error(error),
    };

    let value = match operator {
        Operator::Add => ExpectedValue::arithmetic(x + y),
        Operator::Subtract => ExpectedValue::arithmetic(x - y),
        Operator::Multiply => ExpectedValue::arithmetic(x * y),
        Operator::Divide => ExpectedValue::arithmetic(x / y),
        Operator::Concatenate => ExpectedValue::fixed(x, CONCATENATE_PLACES),
    };
    Expectation::Value(value)
}

fn checked_operands(a: &Operand, b: &Operand, operator: Operator) -> Result<(f64, f64), ExpectedError> {
    let x = a
        .value()
        .ok_or_else(|| ExpectedError::new(ErrorKind::InvalidOperand(OperandField::A)))?;
    let y = b
        .value()
        .ok_or_else(|| ExpectedError::new(ErrorKind::InvalidOperand(OperandField::B)))?;

    // -0.0 == 0.0, so signed zero divisors are covered
    if operator == Operator::Divide && y == 0.0 {
        return Err(ExpectedError::new(ErrorKind::DivideByZero));
    }
    Ok((x, y))
}
