//! Logical functions
//!
//! Arguments arrive eagerly evaluated, like every other function's; IF
//! selects between already-computed branches.

use crate::context::EvaluationContext;
use broadsheet_core::{ErrorKind, Value};

/// IF(condition, if_true, [if_false]) - Missing if_false yields FALSE
pub fn fn_if(args: &[Value], _ctx: &EvaluationContext) -> Value {
    let condition = match args.first() {
        Some(v) => v,
        None => return Value::Error(ErrorKind::ArgCount),
    };

    let taken = match condition.coerce_logical() {
        Ok(b) => b,
        Err(e) => return Value::Error(e),
    };

    if taken {
        args.get(1).cloned().unwrap_or(Value::Logical(true))
    } else {
        args.get(2).cloned().unwrap_or(Value::Logical(false))
    }
}

/// Fold scalar and array arguments through a logical accumulator
fn fold_logicals(
    args: &[Value],
    init: bool,
    f: impl Fn(bool, bool) -> bool,
) -> Value {
    let mut acc = init;
    let mut saw_value = false;

    for arg in args {
        match arg {
            Value::Array(rows) => {
                for row in rows {
                    for cell in row {
                        match cell {
                            // Text and empty cells in a range are skipped
                            Value::Empty | Value::Text(_) | Value::Date(_) => {}
                            Value::Error(e) => return Value::Error(*e),
                            other => match other.coerce_logical() {
                                Ok(b) => {
                                    acc = f(acc, b);
                                    saw_value = true;
                                }
                                Err(e) => return Value::Error(e),
                            },
                        }
                    }
                }
            }
            Value::Empty => {}
            other => match other.coerce_logical() {
                Ok(b) => {
                    acc = f(acc, b);
                    saw_value = true;
                }
                Err(e) => return Value::Error(e),
            },
        }
    }

    if !saw_value {
        return Value::Error(ErrorKind::Value);
    }
    Value::Logical(acc)
}

/// AND(value, ...)
pub fn fn_and(args: &[Value], _ctx: &EvaluationContext) -> Value {
    fold_logicals(args, true, |acc, b| acc && b)
}

/// OR(value, ...)
pub fn fn_or(args: &[Value], _ctx: &EvaluationContext) -> Value {
    fold_logicals(args, false, |acc, b| acc || b)
}

/// XOR(value, ...) - TRUE for an odd number of TRUE values
pub fn fn_xor(args: &[Value], _ctx: &EvaluationContext) -> Value {
    fold_logicals(args, false, |acc, b| acc ^ b)
}

/// NOT(value)
pub fn fn_not(args: &[Value], _ctx: &EvaluationContext) -> Value {
    match args.first() {
        Some(v) => match v.coerce_logical() {
            Ok(b) => Value::Logical(!b),
            Err(e) => Value::Error(e),
        },
        None => Value::Error(ErrorKind::ArgCount),
    }
}

/// TRUE()
pub fn fn_true(_args: &[Value], _ctx: &EvaluationContext) -> Value {
    Value::Logical(true)
}

/// FALSE()
pub fn fn_false(_args: &[Value], _ctx: &EvaluationContext) -> Value {
    Value::Logical(false)
}
