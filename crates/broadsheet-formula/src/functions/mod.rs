//! Built-in report functions
//!
//! The registry is populated once, at construction, and never mutated
//! afterwards; lookups are case-insensitive and O(1). New functions are
//! added by registration, not by subclassing anything. Bound formulas
//! reference descriptors by slot index, so binding and evaluation must use
//! the same registry - [`crate::binder::BoundFormula`] enforces that by
//! holding the registry it was bound against.

pub mod date;
pub mod info;
pub mod logical;
pub mod math;
pub mod statistical;
pub mod text;

use crate::context::EvaluationContext;
use ahash::AHashMap;
use broadsheet_core::{Decimal, ErrorKind, Locale, Value};
use once_cell::sync::Lazy;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::MathematicalOps;

/// Function implementation signature
///
/// Arguments arrive already evaluated, in source order. The evaluator has
/// absorbed error arguments before the call unless the descriptor is
/// [`error_transparent`](FunctionDef::error_transparent); errors embedded
/// in array arguments are always the implementation's concern.
pub type FunctionImpl = fn(&[Value], &EvaluationContext) -> Value;

/// Expected kind for one parameter position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Any value, including arrays
    Any,
    /// Coercible to a number
    Number,
    /// Coercible to display text
    Text,
    /// Coercible to a logical
    Logical,
    /// A date value
    Date,
}

/// Function descriptor
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Per-position parameter contract; the last entry repeats for
    /// variadic tails
    pub params: &'static [ParamKind],
    /// Receives raw error arguments instead of having them absorbed
    /// (the IS-family of error-testing functions)
    pub error_transparent: bool,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
///
/// Immutable after construction; safe for unsynchronized concurrent reads
/// from any number of evaluations in flight.
pub struct FunctionRegistry {
    index: AHashMap<String, usize>,
    defs: Vec<FunctionDef>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            index: AHashMap::new(),
            defs: Vec::new(),
        }
    }

    /// Create a registry with all built-in functions
    pub fn standard() -> Self {
        let mut registry = Self::new();

        registry.register_math_functions();
        registry.register_statistical_functions();
        registry.register_text_functions();
        registry.register_logical_functions();
        registry.register_info_functions();
        registry.register_date_functions();

        registry
    }

    /// Register a function, replacing any previous definition of the name
    pub fn register(&mut self, def: FunctionDef) {
        let key = def.name.to_uppercase();
        match self.index.get(&key) {
            Some(&slot) => self.defs[slot] = def,
            None => {
                self.index.insert(key, self.defs.len());
                self.defs.push(def);
            }
        }
    }

    /// Look up a function by name, case-insensitive
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.index_of(name).map(|i| &self.defs[i])
    }

    /// Slot index of a function, case-insensitive
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_uppercase()).copied()
    }

    /// Descriptor at a slot previously returned by [`index_of`](Self::index_of)
    pub fn def(&self, index: usize) -> &FunctionDef {
        &self.defs[index]
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef {
            name: "SUM",
            min_args: 1,
            max_args: None,
            params: &[ParamKind::Any],
            error_transparent: false,
            implementation: math::fn_sum,
        });

        self.register(FunctionDef {
            name: "ABS",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_abs,
        });

        self.register(FunctionDef {
            name: "INT",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_int,
        });

        self.register(FunctionDef {
            name: "ROUND",
            min_args: 1,
            max_args: Some(2),
            params: &[ParamKind::Number, ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_round,
        });

        self.register(FunctionDef {
            name: "TRUNC",
            min_args: 1,
            max_args: Some(2),
            params: &[ParamKind::Number, ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_trunc,
        });

        self.register(FunctionDef {
            name: "MOD",
            min_args: 2,
            max_args: Some(2),
            params: &[ParamKind::Number, ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_mod,
        });

        self.register(FunctionDef {
            name: "SIGN",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_sign,
        });

        self.register(FunctionDef {
            name: "SQRT",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_sqrt,
        });

        self.register(FunctionDef {
            name: "POWER",
            min_args: 2,
            max_args: Some(2),
            params: &[ParamKind::Number, ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_power,
        });

        self.register(FunctionDef {
            name: "EXP",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_exp,
        });

        self.register(FunctionDef {
            name: "LN",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_ln,
        });

        self.register(FunctionDef {
            name: "LOG10",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_log10,
        });

        self.register(FunctionDef {
            name: "PI",
            min_args: 0,
            max_args: Some(0),
            params: &[],
            error_transparent: false,
            implementation: math::fn_pi,
        });
    }

    fn register_statistical_functions(&mut self) {
        self.register(FunctionDef {
            name: "AVERAGE",
            min_args: 1,
            max_args: None,
            params: &[ParamKind::Any],
            error_transparent: false,
            implementation: statistical::fn_average,
        });

        self.register(FunctionDef {
            name: "MIN",
            min_args: 1,
            max_args: None,
            params: &[ParamKind::Any],
            error_transparent: false,
            implementation: statistical::fn_min,
        });

        self.register(FunctionDef {
            name: "MAX",
            min_args: 1,
            max_args: None,
            params: &[ParamKind::Any],
            error_transparent: false,
            implementation: statistical::fn_max,
        });

        self.register(FunctionDef {
            name: "COUNT",
            min_args: 1,
            max_args: None,
            params: &[ParamKind::Any],
            error_transparent: false,
            implementation: statistical::fn_count,
        });

        self.register(FunctionDef {
            name: "COUNTA",
            min_args: 1,
            max_args: None,
            params: &[ParamKind::Any],
            error_transparent: false,
            implementation: statistical::fn_counta,
        });

        self.register(FunctionDef {
            name: "COUNTBLANK",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Any],
            error_transparent: false,
            implementation: statistical::fn_countblank,
        });
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef {
            name: "CONCATENATE",
            min_args: 1,
            max_args: None,
            params: &[ParamKind::Text],
            error_transparent: false,
            implementation: text::fn_concatenate,
        });

        self.register(FunctionDef {
            name: "LEFT",
            min_args: 1,
            max_args: Some(2),
            params: &[ParamKind::Text, ParamKind::Number],
            error_transparent: false,
            implementation: text::fn_left,
        });

        self.register(FunctionDef {
            name: "RIGHT",
            min_args: 1,
            max_args: Some(2),
            params: &[ParamKind::Text, ParamKind::Number],
            error_transparent: false,
            implementation: text::fn_right,
        });

        self.register(FunctionDef {
            name: "MID",
            min_args: 3,
            max_args: Some(3),
            params: &[ParamKind::Text, ParamKind::Number, ParamKind::Number],
            error_transparent: false,
            implementation: text::fn_mid,
        });

        self.register(FunctionDef {
            name: "LEN",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Text],
            error_transparent: false,
            implementation: text::fn_len,
        });

        self.register(FunctionDef {
            name: "UPPER",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Text],
            error_transparent: false,
            implementation: text::fn_upper,
        });

        self.register(FunctionDef {
            name: "LOWER",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Text],
            error_transparent: false,
            implementation: text::fn_lower,
        });

        self.register(FunctionDef {
            name: "TRIM",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Text],
            error_transparent: false,
            implementation: text::fn_trim,
        });

        self.register(FunctionDef {
            name: "EXACT",
            min_args: 2,
            max_args: Some(2),
            params: &[ParamKind::Text, ParamKind::Text],
            error_transparent: false,
            implementation: text::fn_exact,
        });

        self.register(FunctionDef {
            name: "REPT",
            min_args: 2,
            max_args: Some(2),
            params: &[ParamKind::Text, ParamKind::Number],
            error_transparent: false,
            implementation: text::fn_rept,
        });

        self.register(FunctionDef {
            name: "SUBSTITUTE",
            min_args: 3,
            max_args: Some(4),
            params: &[
                ParamKind::Text,
                ParamKind::Text,
                ParamKind::Text,
                ParamKind::Number,
            ],
            error_transparent: false,
            implementation: text::fn_substitute,
        });

        self.register(FunctionDef {
            name: "T",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Any],
            error_transparent: false,
            implementation: text::fn_t,
        });
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef {
            name: "IF",
            min_args: 2,
            max_args: Some(3),
            params: &[ParamKind::Logical, ParamKind::Any, ParamKind::Any],
            error_transparent: false,
            implementation: logical::fn_if,
        });

        self.register(FunctionDef {
            name: "AND",
            min_args: 1,
            max_args: None,
            params: &[ParamKind::Logical],
            error_transparent: false,
            implementation: logical::fn_and,
        });

        self.register(FunctionDef {
            name: "OR",
            min_args: 1,
            max_args: None,
            params: &[ParamKind::Logical],
            error_transparent: false,
            implementation: logical::fn_or,
        });

        self.register(FunctionDef {
            name: "NOT",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Logical],
            error_transparent: false,
            implementation: logical::fn_not,
        });

        self.register(FunctionDef {
            name: "XOR",
            min_args: 1,
            max_args: None,
            params: &[ParamKind::Logical],
            error_transparent: false,
            implementation: logical::fn_xor,
        });

        self.register(FunctionDef {
            name: "TRUE",
            min_args: 0,
            max_args: Some(0),
            params: &[],
            error_transparent: false,
            implementation: logical::fn_true,
        });

        self.register(FunctionDef {
            name: "FALSE",
            min_args: 0,
            max_args: Some(0),
            params: &[],
            error_transparent: false,
            implementation: logical::fn_false,
        });
    }

    fn register_info_functions(&mut self) {
        self.register(FunctionDef {
            name: "ISBLANK",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Any],
            error_transparent: true,
            implementation: info::fn_isblank,
        });

        self.register(FunctionDef {
            name: "ISERROR",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Any],
            error_transparent: true,
            implementation: info::fn_iserror,
        });

        self.register(FunctionDef {
            name: "ISERR",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Any],
            error_transparent: true,
            implementation: info::fn_iserr,
        });

        self.register(FunctionDef {
            name: "ISNA",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Any],
            error_transparent: true,
            implementation: info::fn_isna,
        });

        self.register(FunctionDef {
            name: "ISNUMBER",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Any],
            error_transparent: true,
            implementation: info::fn_isnumber,
        });

        self.register(FunctionDef {
            name: "ISTEXT",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Any],
            error_transparent: true,
            implementation: info::fn_istext,
        });

        self.register(FunctionDef {
            name: "ISLOGICAL",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Any],
            error_transparent: true,
            implementation: info::fn_islogical,
        });

        self.register(FunctionDef {
            name: "NA",
            min_args: 0,
            max_args: Some(0),
            params: &[],
            error_transparent: false,
            implementation: info::fn_na,
        });
    }

    fn register_date_functions(&mut self) {
        self.register(FunctionDef {
            name: "DATE",
            min_args: 3,
            max_args: Some(3),
            params: &[ParamKind::Number, ParamKind::Number, ParamKind::Number],
            error_transparent: false,
            implementation: date::fn_date,
        });

        self.register(FunctionDef {
            name: "TIME",
            min_args: 3,
            max_args: Some(3),
            params: &[ParamKind::Number, ParamKind::Number, ParamKind::Number],
            error_transparent: false,
            implementation: date::fn_time,
        });

        self.register(FunctionDef {
            name: "YEAR",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Date],
            error_transparent: false,
            implementation: date::fn_year,
        });

        self.register(FunctionDef {
            name: "MONTH",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Date],
            error_transparent: false,
            implementation: date::fn_month,
        });

        self.register(FunctionDef {
            name: "DAY",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Date],
            error_transparent: false,
            implementation: date::fn_day,
        });

        self.register(FunctionDef {
            name: "WEEKDAY",
            min_args: 1,
            max_args: Some(1),
            params: &[ParamKind::Date],
            error_transparent: false,
            implementation: date::fn_weekday,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide handle to the standard registry
///
/// Built on first use and immutable afterwards; safe to share across
/// threads. Callers that want a custom function set build their own
/// [`FunctionRegistry`] and pass it to [`crate::bind`] instead.
pub fn standard_registry() -> &'static FunctionRegistry {
    static STANDARD: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::standard);
    &STANDARD
}

// === Shared argument helpers ===

/// Coerce a scalar argument to display text
pub(crate) fn text_arg(value: &Value, locale: &Locale) -> Result<String, ErrorKind> {
    match value {
        Value::Error(e) => Err(*e),
        Value::Array(_) => Err(ErrorKind::Value),
        other => Ok(other.display_text(locale)),
    }
}

/// Coerce an argument to an integer, truncating toward zero
pub(crate) fn int_arg(value: &Value, locale: &Locale) -> Result<i64, ErrorKind> {
    let n = value.coerce_number(locale)?;
    n.trunc().to_i64().ok_or(ErrorKind::Value)
}

/// Walk every numeric cell across scalar and array arguments
///
/// Empty cells are skipped; an error cell propagates; a non-empty cell
/// that cannot coerce to a number fails with `#VALUE!`.
pub(crate) fn for_each_number(
    args: &[Value],
    locale: &Locale,
    f: &mut dyn FnMut(Decimal),
) -> Result<(), ErrorKind> {
    for arg in args {
        match arg {
            Value::Array(rows) => {
                for row in rows {
                    for cell in row {
                        match cell {
                            Value::Empty => {}
                            Value::Error(e) => return Err(*e),
                            other => f(other.coerce_number(locale)?),
                        }
                    }
                }
            }
            Value::Empty => {}
            Value::Error(e) => return Err(*e),
            other => f(other.coerce_number(locale)?),
        }
    }
    Ok(())
}

/// Exponentiation shared by the `^` operator and POWER
///
/// Integer exponents stay exact; fractional exponents of negative bases
/// and any overflow fail with `#NUM!`.
pub(crate) fn decimal_pow(base: Decimal, exp: Decimal) -> Result<Decimal, ErrorKind> {
    if exp.fract().is_zero() {
        let e = exp.to_i64().ok_or(ErrorKind::Num)?;
        base.checked_powi(e).ok_or(ErrorKind::Num)
    } else if base.is_sign_negative() {
        Err(ErrorKind::Num)
    } else {
        base.checked_powd(exp).ok_or(ErrorKind::Num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_case_insensitive() {
        let registry = FunctionRegistry::standard();
        assert!(registry.get("SUM").is_some());
        assert!(registry.get("sum").is_some());
        assert!(registry.get("Sum").is_some());
        assert!(registry.get("NOPE").is_none());
    }

    #[test]
    fn test_registry_index_round_trip() {
        let registry = FunctionRegistry::standard();
        let index = registry.index_of("round").unwrap();
        assert_eq!(registry.def(index).name, "ROUND");
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = FunctionRegistry::standard();
        let before = registry.len();
        let index = registry.index_of("SUM").unwrap();
        registry.register(FunctionDef {
            name: "SUM",
            min_args: 2,
            max_args: Some(2),
            params: &[ParamKind::Number],
            error_transparent: false,
            implementation: math::fn_sum,
        });
        assert_eq!(registry.len(), before);
        assert_eq!(registry.index_of("SUM"), Some(index));
        assert_eq!(registry.def(index).min_args, 2);
    }

    #[test]
    fn test_standard_registry_is_shared() {
        let a = standard_registry() as *const FunctionRegistry;
        let b = standard_registry() as *const FunctionRegistry;
        assert_eq!(a, b);
    }

    #[test]
    fn test_decimal_pow() {
        assert_eq!(
            decimal_pow(Decimal::from(2), Decimal::from(10)),
            Ok(Decimal::from(1024))
        );
        assert_eq!(
            decimal_pow(Decimal::from(-2), Decimal::from(3)),
            Ok(Decimal::from(-8))
        );
        // Fractional exponent of a negative base has no real result
        assert_eq!(
            decimal_pow(Decimal::from(-4), "0.5".parse().unwrap()),
            Err(ErrorKind::Num)
        );
    }
}
