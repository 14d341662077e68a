//! Core types for calcmatrix

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify;
use crate::numfmt;

/// Identifier of one interchangeable calculator build (the label shown in
/// the build dropdown, e.g. `Prototype` or `3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildVariant(String);

impl BuildVariant {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw operand as typed into a number field.
///
/// Numbers are typed using their shortest round-trip rendering; text is typed
/// verbatim and may or may not parse as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Number(f64),
    Text(String),
}

impl Operand {
    /// Numeric value of the operand, or `None` if the UI would reject it.
    pub fn value(&self) -> Option<f64> {
        match self {
            Operand::Number(n) if n.is_nan() => None,
            Operand::Number(n) => Some(*n),
            Operand::Text(t) => numfmt::parse_number(t),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.value().is_some()
    }

    /// Text entered into the input field for this operand
    pub fn to_input(&self) -> String {
        match self {
            Operand::Number(n) => numfmt::format_number(*n, numfmt::NumberFormat::Shortest),
            Operand::Text(t) => t.clone(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_input())
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Operand::Number(n)
    }
}

impl From<i32> for Operand {
    fn from(n: i32) -> Self {
        Operand::Number(f64::from(n))
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Text(s.to_string())
    }
}

/// Calculator operation, as offered by the operation dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concatenate,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
        Operator::Concatenate,
    ];

    /// Option label in the operation dropdown
    pub fn label(&self) -> &'static str {
        match self {
            Operator::Add => "Add",
            Operator::Subtract => "Subtract",
            Operator::Multiply => "Multiply",
            Operator::Divide => "Divide",
            Operator::Concatenate => "Concatenate",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Concatenate => "&",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which number field an operand was entered into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandField {
    A,
    B,
}

impl OperandField {
    /// 1-based field number as shown on the page
    pub fn number(&self) -> u8 {
        match self {
            OperandField::A => 1,
            OperandField::B => 2,
        }
    }
}

/// Classification of an invalid input or invalid operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum ErrorKind {
    DivideByZero,
    InvalidOperand(OperandField),
}

impl ErrorKind {
    /// Text the error banner must contain for this kind
    pub fn message(&self) -> String {
        match self {
            ErrorKind::DivideByZero => "Divide by zero error!".to_string(),
            ErrorKind::InvalidOperand(field) => {
                format!("Number {} is not a number", field.number())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedError {
    pub kind: ErrorKind,
    pub message_substring: String,
}

impl ExpectedError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message_substring: kind.message(),
        }
    }
}

/// Expected numeric outcome of a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedValue {
    /// Full-precision result of the direct arithmetic
    pub value: f64,

    /// Fixed decimal places for formatting-only operations
    #[serde(default)]
    pub fixed_places: Option<usize>,

    /// Whether the integer-only display is checked as well
    #[serde(default)]
    pub integer_only: bool,
}

impl ExpectedValue {
    pub fn arithmetic(value: f64) -> Self {
        Self {
            value,
            fixed_places: None,
            integer_only: false,
        }
    }

    pub fn fixed(value: f64, places: usize) -> Self {
        Self {
            value,
            fixed_places: Some(places),
            integer_only: false,
        }
    }

    pub fn with_integer_only(mut self) -> Self {
        self.integer_only = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Value(ExpectedValue),
    Error(ExpectedError),
}

impl Expectation {
    pub fn as_value(&self) -> Option<&ExpectedValue> {
        match self {
            Expectation::Value(v) => Some(v),
            Expectation::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&ExpectedError> {
        match self {
            Expectation::Error(e) => Some(e),
            Expectation::Value(_) => None,
        }
    }
}

/// One operand pair driven through one operator, with its expected outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationCase {
    pub operand_a: Operand,
    pub operand_b: Operand,
    pub operator: Operator,
    pub expectation: Expectation,
}

impl OperationCase {
    /// Build a case, deriving its expectation from the declared operands
    pub fn new(operand_a: impl Into<Operand>, operand_b: impl Into<Operand>, operator: Operator) -> Self {
        let operand_a = operand_a.into();
        let operand_b = operand_b.into();
        let expectation = classify::expect(&operand_a, &operand_b, operator);
        Self {
            operand_a,
            operand_b,
            operator,
            expectation,
        }
    }

    /// Also check the integer-only display when a value is expected
    pub fn with_integer_only(mut self) -> Self {
        if let Expectation::Value(v) = self.expectation {
            self.expectation = Expectation::Value(v.with_integer_only());
        }
        self
    }
}

/// Group of cases sharing one operand table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Concatenation,
    NonNumeric,
    ClearState,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Addition,
        Category::Subtraction,
        Category::Multiplication,
        Category::Division,
        Category::Concatenation,
        Category::NonNumeric,
        Category::ClearState,
    ];

    /// Operator every case of this category is driven through
    pub fn operator(&self) -> Operator {
        match self {
            Category::Addition | Category::NonNumeric | Category::ClearState => Operator::Add,
            Category::Subtraction => Operator::Subtract,
            Category::Multiplication => Operator::Multiply,
            Category::Division => Operator::Divide,
            Category::Concatenation => Operator::Concatenate,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Addition => "Addition",
            Category::Subtraction => "Subtraction",
            Category::Multiplication => "Multiplication",
            Category::Division => "Division",
            Category::Concatenation => "Concatenation",
            Category::NonNumeric => "Non numeric characters",
            Category::ClearState => "Clear button",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the runner does with a case after setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "case", rename_all = "snake_case")]
pub enum CaseKind {
    /// Enter the operation and check its outcome
    Compute(OperationCase),
    /// Enter the operation, check it, press Clear and expect an empty result
    ClearAfter(OperationCase),
}

impl CaseKind {
    pub fn operation(&self) -> &OperationCase {
        match self {
            CaseKind::Compute(case) | CaseKind::ClearAfter(case) => case,
        }
    }
}

/// A single executable test: one case bound to one build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub build: BuildVariant,
    pub category: Category,
    pub kind: CaseKind,
}

impl TestCase {
    pub fn new(build: BuildVariant, category: Category, kind: CaseKind) -> Self {
        let name = test_name(&build, category, kind.operation());
        Self {
            name,
            build,
            category,
            kind,
        }
    }
}

fn test_name(build: &BuildVariant, category: Category, case: &OperationCase) -> String {
    let a = &case.operand_a;
    let b = &case.operand_b;
    match category {
        Category::Concatenation => format!("{build} Concatenation test {a}"),
        Category::NonNumeric => format!("{build} Non numeric characters test {a} and {b}"),
        Category::ClearState => format!("{build} Clear button test"),
        _ => format!(
            "{build} build's {} test {a} {} {b}",
            category.label(),
            case.operator.symbol()
        ),
    }
}
