//! Statistical functions

use super::for_each_number;
use crate::context::EvaluationContext;
use broadsheet_core::{Decimal, ErrorKind, Value};

/// AVERAGE(value, ...)
pub fn fn_average(args: &[Value], ctx: &EvaluationContext) -> Value {
    let mut sum = Decimal::ZERO;
    let mut count: i64 = 0;
    let mut overflow = false;

    let walked = for_each_number(args, ctx.locale(), &mut |n| match sum.checked_add(n) {
        Some(s) => {
            sum = s;
            count += 1;
        }
        None => overflow = true,
    });

    match walked {
        Err(e) => Value::Error(e),
        Ok(()) if overflow => Value::Error(ErrorKind::Num),
        Ok(()) if count == 0 => Value::Error(ErrorKind::Div0),
        Ok(()) => match sum.checked_div(Decimal::from(count)) {
            Some(avg) => Value::Number(avg),
            None => Value::Error(ErrorKind::Num),
        },
    }
}

/// MIN(value, ...) - 0 when no numeric value is present
pub fn fn_min(args: &[Value], ctx: &EvaluationContext) -> Value {
    let mut min: Option<Decimal> = None;

    let walked = for_each_number(args, ctx.locale(), &mut |n| {
        min = Some(min.map_or(n, |m| m.min(n)));
    });

    match walked {
        Err(e) => Value::Error(e),
        Ok(()) => Value::Number(min.unwrap_or(Decimal::ZERO)),
    }
}

/// MAX(value, ...) - 0 when no numeric value is present
pub fn fn_max(args: &[Value], ctx: &EvaluationContext) -> Value {
    let mut max: Option<Decimal> = None;

    let walked = for_each_number(args, ctx.locale(), &mut |n| {
        max = Some(max.map_or(n, |m| m.max(n)));
    });

    match walked {
        Err(e) => Value::Error(e),
        Ok(()) => Value::Number(max.unwrap_or(Decimal::ZERO)),
    }
}

/// COUNT(value, ...) - Counts numeric values only
pub fn fn_count(args: &[Value], _ctx: &EvaluationContext) -> Value {
    let mut count: i64 = 0;

    for arg in args {
        match arg {
            Value::Number(_) => count += 1,
            Value::Error(e) => return Value::Error(*e),
            Value::Array(rows) => {
                for row in rows {
                    for cell in row {
                        match cell {
                            Value::Number(_) => count += 1,
                            Value::Error(e) => return Value::Error(*e),
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Value::Number(Decimal::from(count))
}

/// COUNTA(value, ...) - Counts non-empty values
pub fn fn_counta(args: &[Value], _ctx: &EvaluationContext) -> Value {
    let mut count: i64 = 0;

    for arg in args {
        match arg {
            Value::Empty => {}
            Value::Error(e) => return Value::Error(*e),
            Value::Array(rows) => {
                for row in rows {
                    for cell in row {
                        match cell {
                            Value::Empty => {}
                            Value::Error(e) => return Value::Error(*e),
                            _ => count += 1,
                        }
                    }
                }
            }
            _ => count += 1,
        }
    }

    Value::Number(Decimal::from(count))
}

/// COUNTBLANK(range) - Counts empty cells
pub fn fn_countblank(args: &[Value], _ctx: &EvaluationContext) -> Value {
    let mut count: i64 = 0;

    match args.first() {
        Some(Value::Array(rows)) => {
            for row in rows {
                for cell in row {
                    match cell {
                        Value::Empty => count += 1,
                        Value::Error(e) => return Value::Error(*e),
                        _ => {}
                    }
                }
            }
        }
        Some(Value::Empty) => count = 1,
        Some(Value::Error(e)) => return Value::Error(*e),
        Some(_) => {}
        None => return Value::Error(ErrorKind::ArgCount),
    }

    Value::Number(Decimal::from(count))
}
