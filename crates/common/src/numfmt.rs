//! Number parsing and rendering rules
//!
//! The calculator under test is a browser page, so operand validity and the
//! displayed text follow ECMAScript semantics:
//!
//! - [`parse_number`] mirrors `Number(string)`: whitespace is trimmed, the
//!   empty string is `0`, `Infinity` and `0x`/`0o`/`0b` literals are accepted.
//! - [`format_number`] mirrors `Number.prototype.toString` layout (plain
//!   digits for decimal exponents in `-7..21`, exponent form otherwise). The
//!   digits themselves are chosen by a [`NumberFormat`], which pins down what
//!   happens to binary floating-point artifacts such as `5.5 * 1.1`.
//! - [`to_fixed`] mirrors `Number.prototype.toFixed`: the exact binary value is
//!   rounded half away from zero.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

static DECIMAL_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$").expect("decimal literal regex")
});

static RADIX_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0([xXoObB])([0-9a-zA-Z]+)$").expect("radix literal regex"));

/// Significant digits kept by [`NumberFormat::Significant15`]
pub const SIGNIFICANT_DIGITS: usize = 15;

// Every finite double has an exact decimal expansion within this many
// fractional digits.
const EXACT_FRACTION_DIGITS: usize = 1100;

/// Rule selecting the digits of a rendered number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// Shortest digits that read back as the same double (`String(x)` in a browser)
    Shortest,

    /// Correctly rounded to 15 significant digits, trailing zeros dropped
    #[default]
    Significant15,
}

impl fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberFormat::Shortest => f.write_str("shortest"),
            NumberFormat::Significant15 => f.write_str("significant15"),
        }
    }
}

impl FromStr for NumberFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shortest" => Ok(NumberFormat::Shortest),
            "significant15" => Ok(NumberFormat::Significant15),
            other => Err(Error::InvalidConfig(format!(
                "unknown number format '{}' (expected 'shortest' or 'significant15')",
                other
            ))),
        }
    }
}

/// Parse operand text the way the page converts field values to numbers.
///
/// Returns `None` when the page would treat the text as not a number.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');

    if trimmed.is_empty() {
        return Some(0.0);
    }

    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    if let Some(caps) = RADIX_LITERAL.captures(trimmed) {
        let radix = match &caps[1] {
            "x" | "X" => 16,
            "o" | "O" => 8,
            _ => 2,
        };
        return caps[2].chars().try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
        });
    }

    if DECIMAL_LITERAL.is_match(trimmed) {
        trimmed.parse::<f64>().ok()
    } else {
        None
    }
}

/// Render a number as the page displays it
pub fn format_number(x: f64, format: NumberFormat) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if x < 0.0 {
        return format!("-{}", format_number(-x, format));
    }

    let (digits, exponent) = match format {
        NumberFormat::Shortest => {
            let (digits, exponent) = split_scientific(&format!("{:e}", x));
            even_shortest_tie(x, digits, exponent)
        }
        NumberFormat::Significant15 => {
            split_scientific(&format!("{:.*e}", SIGNIFICANT_DIGITS - 1, x))
        }
    };
    layout(&digits, exponent)
}

/// When `x` lies exactly halfway between two shortest candidates, pick the
/// one with an even last digit, as Number::toString does.
fn even_shortest_tie(x: f64, digits: String, exponent: i32) -> (String, i32) {
    let n = digits.len();
    let (exact, exact_exponent) = split_scientific(&format!("{:.*e}", EXACT_FRACTION_DIGITS, x));
    if exact_exponent != exponent || exact.len() != n + 1 || !exact.ends_with('5') {
        return (digits, exponent);
    }

    let lower: Vec<char> = exact.chars().take(n).collect();
    let mut upper = lower.clone();
    increment(&mut upper);
    if upper.len() != n {
        return (digits, exponent);
    }

    let mut current: Vec<char> = digits.chars().collect();
    current.resize(n, '0');
    let alternative = if current == lower {
        upper
    } else if current == upper {
        lower
    } else {
        return (digits, exponent);
    };

    let is_even = |d: &[char]| d.last().and_then(|c| c.to_digit(10)).is_some_and(|v| v % 2 == 0);
    if is_even(&current[..]) || !is_even(&alternative[..]) {
        return (digits, exponent);
    }

    let candidate: String = alternative.into_iter().collect();
    let round_trips = format!("0.{}e{}", candidate, exponent + 1).parse::<f64>() == Ok(x);
    if !round_trips {
        return (digits, exponent);
    }

    let trimmed = candidate.trim_end_matches('0');
    let trimmed = if trimmed.is_empty() { "0" } else { trimmed };
    (trimmed.to_string(), exponent)
}

/// Render `x` with exactly `places` fractional digits
pub fn to_fixed(x: f64, places: usize) -> String {
    if !x.is_finite() || x.abs() >= 1e21 {
        return format_number(x, NumberFormat::Shortest);
    }

    let negative = x < 0.0;
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS.max(places + 1), x.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut digits: Vec<char> = int_part
        .chars()
        .chain(frac_part.chars().take(places))
        .collect();
    let round_up = frac_part.chars().nth(places).is_some_and(|d| d >= '5');
    if round_up {
        increment(&mut digits);
    }

    let split = digits.len() - places;
    let mut out = String::with_capacity(digits.len() + 2);
    if negative {
        out.push('-');
    }
    out.extend(&digits[..split]);
    if places > 0 {
        out.push('.');
        out.extend(&digits[split..]);
    }
    out
}

/// Split Rust's `{:e}` output into significant digits (no trailing zeros)
/// and the decimal exponent of the first digit.
fn split_scientific(s: &str) -> (String, i32) {
    let (mantissa, exponent) = s.split_once('e').unwrap_or((s, "0"));
    let mut digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    while digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
    }
    (digits, exponent.parse().unwrap_or(0))
}

/// Lay out `0.d1d2... × 10^(exponent + 1)` following Number::toString
fn layout(digits: &str, exponent: i32) -> String {
    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let exp = (n - 1).abs();
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{exp}")
        } else {
            format!("{first}.{rest}e{sign}{exp}")
        }
    }
}

fn increment(digits: &mut Vec<char>) {
    for d in digits.iter_mut().rev() {
        match d.to_digit(10) {
            Some(9) => *d = '0',
            Some(v) => {
                *d = char::from_digit(v + 1, 10).unwrap_or('0');
                return;
            }
            None => return,
        }
    }
    digits.insert(0, '1');
}
