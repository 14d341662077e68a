//! Declarative operand tables and their expansion into test cases

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{BuildVariant, CaseKind, Category, Operand, OperationCase, TestCase};

/// Operand probe that is not a number in either field
pub const NON_NUMERIC_PROBE: &str = "abc-+=/!@#";

/// Two raw operands, written `[a, b]` in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperandPair(pub Operand, pub Operand);

impl OperandPair {
    pub fn new(a: impl Into<Operand>, b: impl Into<Operand>) -> Self {
        Self(a.into(), b.into())
    }
}

/// Operand table for one category, parsed from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseTable {
    pub category: Category,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Operand pairs, in execution order
    pub pairs: Vec<OperandPair>,

    /// Also check the integer-only display (defaults to on for Addition)
    #[serde(default)]
    pub integer_only: Option<bool>,
}

impl CaseTable {
    /// Built-in table for a category
    pub fn builtin(category: Category) -> Self {
        let (description, pairs) = match category {
            Category::Addition => (
                "positive, negative, zero and non-integer sums",
                vec![
                    OperandPair::new(2, 2),
                    OperandPair::new(2, -3),
                    OperandPair::new(2, -2),
                    OperandPair::new(2.5, 3.8),
                ],
            ),
            Category::Subtraction => (
                "positive, negative, zero and non-integer differences",
                vec![
                    OperandPair::new(10, 5),
                    OperandPair::new(5, 10),
                    OperandPair::new(5, 5),
                    OperandPair::new(5.5, 1.1),
                ],
            ),
            Category::Multiplication => (
                "positive, negative, zero and non-integer products",
                vec![
                    OperandPair::new(10, 5),
                    OperandPair::new(5, -10),
                    OperandPair::new(5, 0),
                    OperandPair::new(5.5, 1.1),
                ],
            ),
            Category::Division => (
                "positive, negative, divide-by-zero and non-integer quotients",
                vec![
                    OperandPair::new(10, 5),
                    OperandPair::new(50, -5),
                    OperandPair::new(5, 0),
                    OperandPair::new(5.5, 1.6),
                ],
            ),
            Category::Concatenation => (
                "first operand shown with three decimal places",
                vec![OperandPair::new(5.85, 0)],
            ),
            Category::NonNumeric => (
                "non-numeric text in either number field",
                vec![
                    OperandPair::new(NON_NUMERIC_PROBE, 123),
                    OperandPair::new(123, NON_NUMERIC_PROBE),
                ],
            ),
            Category::ClearState => (
                "clear button empties the answer field",
                vec![OperandPair::new(2, 2)],
            ),
        };

        Self {
            category,
            description: description.to_string(),
            pairs,
            integer_only: None,
        }
    }

    /// Parse a table from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let table: Self = serde_yaml::from_str(yaml)?;
        table.validate()?;
        Ok(table)
    }

    /// Parse a table from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            Error::InvalidTable { reason, .. } => Error::InvalidTable {
                table: path.display().to_string(),
                reason,
            },
            Error::Yaml(source) => Error::TableYaml {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Load every `*.yaml` / `*.yml` table under a directory, sorted by path
    pub fn load_all(dir: &Path) -> Result<Vec<Self>> {
        if !dir.is_dir() {
            return Err(Error::TableNotFound(dir.display().to_string()));
        }

        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        let mut tables = Vec::with_capacity(paths.len());
        for path in paths {
            let table = Self::from_file(&path)?;
            debug!("Loaded {} table from {}", table.category, path.display());
            tables.push(table);
        }
        Ok(tables)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidTable {
            table: self.category.label().to_string(),
            reason: reason.to_string(),
        };

        if self.pairs.is_empty() {
            return Err(invalid("table has no operand pairs"));
        }
        if self.category == Category::ClearState {
            if self.pairs.len() != 1 {
                return Err(invalid("clear-state table takes exactly one pair"));
            }
            if self.cases()[0].expectation.as_value().is_none() {
                return Err(invalid("clear-state pair must produce a value before clearing"));
            }
        }
        Ok(())
    }

    fn checks_integer_only(&self) -> bool {
        self.integer_only
            .unwrap_or(self.category == Category::Addition)
    }

    /// Expand the table into cases with derived expectations
    pub fn cases(&self) -> Vec<OperationCase> {
        let operator = self.category.operator();
        let integer_only = self.checks_integer_only();

        self.pairs
            .iter()
            .map(|OperandPair(a, b)| {
                let case = OperationCase::new(a.clone(), b.clone(), operator);
                if integer_only {
                    case.with_integer_only()
                } else {
                    case
                }
            })
            .collect()
    }
}

/// Fixed, ordered cases for a category from the built-in tables
pub fn generate(category: Category) -> Vec<OperationCase> {
    CaseTable::builtin(category).cases()
}

/// Every table that runs against each build
#[derive(Debug, Clone, PartialEq)]
pub struct CaseMatrix {
    tables: Vec<CaseTable>,
}

impl Default for CaseMatrix {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CaseMatrix {
    /// All built-in tables, in category order
    pub fn builtin() -> Self {
        Self {
            tables: Category::ALL.iter().map(|c| CaseTable::builtin(*c)).collect(),
        }
    }

    pub fn from_tables(tables: Vec<CaseTable>) -> Result<Self> {
        for table in &tables {
            table.validate()?;
        }
        Ok(Self { tables })
    }

    /// Replace built-in tables with loaded ones of the same category.
    ///
    /// Several loaded tables for one category all run, in load order.
    pub fn with_overrides(self, overrides: Vec<CaseTable>) -> Result<Self> {
        for table in &overrides {
            table.validate()?;
        }

        let mut tables = Vec::with_capacity(self.tables.len() + overrides.len());
        for category in Category::ALL {
            let replacements: Vec<_> = overrides
                .iter()
                .filter(|t| t.category == category)
                .cloned()
                .collect();
            if replacements.is_empty() {
                tables.extend(self.tables.iter().filter(|t| t.category == category).cloned());
            } else {
                tables.extend(replacements);
            }
        }
        Ok(Self { tables })
    }

    /// Load table overrides from a directory on top of the built-ins
    pub fn load_overrides(dir: &Path) -> Result<Self> {
        Self::builtin().with_overrides(CaseTable::load_all(dir)?)
    }

    pub fn tables(&self) -> &[CaseTable] {
        &self.tables
    }

    /// Number of test cases each build runs
    pub fn cases_per_build(&self) -> usize {
        self.tables.iter().map(|t| t.pairs.len()).sum()
    }

    /// Bind every declared case to a build
    pub fn expand(&self, build: &BuildVariant) -> Vec<TestCase> {
        self.tables
            .iter()
            .flat_map(|table| {
                table.cases().into_iter().map(move |case| {
                    let kind = match table.category {
                        Category::ClearState => CaseKind::ClearAfter(case),
                        _ => CaseKind::Compute(case),
                    };
                    TestCase::new(build.clone(), table.category, kind)
                })
            })
            .collect()
    }
}
