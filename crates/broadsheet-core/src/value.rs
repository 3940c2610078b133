//! Report value types
//!
//! [`Value`] is the single tagged union flowing through formula evaluation
//! and out to the document sink. Semantic failures are ordinary values
//! ([`Value::Error`]) so that one bad field never aborts a whole record.

use crate::date::DateValue;
use crate::locale::Locale;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

/// A value produced by formula evaluation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Absent value; distinct from `Text("")` and `Number(0)`
    Empty,

    /// Boolean value (TRUE/FALSE)
    Logical(bool),

    /// Numeric value, arbitrary-precision decimal
    Number(Decimal),

    /// Text value
    Text(String),

    /// Calendar value with a date/time/date-time flavor
    Date(DateValue),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(ErrorKind),

    /// 2-D grid of values, row-major; produced by range references
    Array(Vec<Vec<Value>>),
}

impl Value {
    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Check if the value is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Get the error code if this is an error value
    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Coerce to a number for arithmetic
    ///
    /// `Empty` counts as zero and text is parsed with the locale. Logical,
    /// date and array operands do not participate in arithmetic and yield
    /// [`ErrorKind::Value`]; an error operand propagates itself.
    pub fn coerce_number(&self, locale: &Locale) -> Result<Decimal, ErrorKind> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Empty => Ok(Decimal::ZERO),
            Value::Text(s) => locale.parse_number(s).ok_or(ErrorKind::Value),
            Value::Error(e) => Err(*e),
            Value::Logical(_) | Value::Date(_) | Value::Array(_) => Err(ErrorKind::Value),
        }
    }

    /// Coerce to a logical for condition tests
    ///
    /// Numbers test against zero; the texts `"TRUE"`/`"FALSE"` convert
    /// case-insensitively. Everything else yields [`ErrorKind::Value`].
    pub fn coerce_logical(&self) -> Result<bool, ErrorKind> {
        match self {
            Value::Logical(b) => Ok(*b),
            Value::Number(n) => Ok(!n.is_zero()),
            Value::Text(s) => match s.to_uppercase().as_str() {
                "TRUE" => Ok(true),
                "FALSE" => Ok(false),
                _ => Err(ErrorKind::Value),
            },
            Value::Error(e) => Err(*e),
            _ => Err(ErrorKind::Value),
        }
    }

    /// Render the value in its display text form
    ///
    /// This is the conversion the `&` operator applies: `Empty` renders as
    /// `""`, numbers and dates render through the locale, errors render as
    /// their code.
    pub fn display_text(&self, locale: &Locale) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Logical(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Number(n) => locale.format_number(n),
            Value::Text(s) => s.clone(),
            Value::Date(d) => locale.format_date(d),
            Value::Error(e) => e.as_str().to_string(),
            Value::Array(_) => ErrorKind::Value.as_str().to_string(),
        }
    }

    /// Total ordering used by the comparison operators
    ///
    /// Values of the same kind compare within the kind (numbers
    /// numerically, text case-insensitively, FALSE before TRUE, dates
    /// chronologically). Mismatched kinds fall back to the fixed order
    /// Empty < Logical < Number < Text < Date.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (Value::Logical(a), Value::Logical(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.datetime.cmp(&b.datetime),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Empty => 0,
            Value::Logical(_) => 1,
            Value::Number(_) => 2,
            Value::Text(_) => 3,
            Value::Date(_) => 4,
            Value::Array(_) => 5,
            Value::Error(_) => 6,
        }
    }

    /// Get the kind name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Logical(_) => "logical",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::Error(_) => "error",
            Value::Array(_) => "array",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Empty
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logical(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateValue> for Value {
    fn from(d: DateValue) -> Self {
        Value::Date(d)
    }
}

impl From<ErrorKind> for Value {
    fn from(e: ErrorKind) -> Self {
        Value::Error(e)
    }
}

/// Semantic error codes
///
/// These flow through evaluation as [`Value::Error`] and are absorbing: an
/// operator or function that receives one returns it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong kind of operand or argument
    Value,
    /// #REF! - Reference outside the record's bounds
    Ref,
    /// #NAME? - Unrecognized function or reference name
    Name,
    /// #NUM! - Numeric domain or overflow fault
    Num,
    /// #N/A - Value not available
    Na,
    /// #ARG! - Wrong number of arguments for a function
    ArgCount,
}

impl ErrorKind {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Div0 => "#DIV/0!",
            ErrorKind::Value => "#VALUE!",
            ErrorKind::Ref => "#REF!",
            ErrorKind::Name => "#NAME?",
            ErrorKind::Num => "#NUM!",
            ErrorKind::Na => "#N/A",
            ErrorKind::ArgCount => "#ARG!",
        }
    }

    /// Parse an error code string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#DIV/0!" => Some(ErrorKind::Div0),
            "#VALUE!" => Some(ErrorKind::Value),
            "#REF!" => Some(ErrorKind::Ref),
            "#NAME?" => Some(ErrorKind::Name),
            "#NUM!" => Some(ErrorKind::Num),
            "#N/A" => Some(ErrorKind::Na),
            "#ARG!" => Some(ErrorKind::ArgCount),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
