//! Information functions
//!
//! The IS-family descriptors are registered error-transparent: the
//! evaluator hands them raw error arguments instead of absorbing them,
//! which is what makes error testing possible at all.

use crate::context::EvaluationContext;
use broadsheet_core::{ErrorKind, Value};

fn unary(args: &[Value], test: impl Fn(&Value) -> bool) -> Value {
    match args.first() {
        Some(Value::Array(_)) => Value::Error(ErrorKind::Value),
        Some(v) => Value::Logical(test(v)),
        None => Value::Error(ErrorKind::ArgCount),
    }
}

/// ISBLANK(value)
pub fn fn_isblank(args: &[Value], _ctx: &EvaluationContext) -> Value {
    unary(args, |v| matches!(v, Value::Empty))
}

/// ISERROR(value) - TRUE for every error code
pub fn fn_iserror(args: &[Value], _ctx: &EvaluationContext) -> Value {
    unary(args, |v| matches!(v, Value::Error(_)))
}

/// ISERR(value) - TRUE for every error code except #N/A
pub fn fn_iserr(args: &[Value], _ctx: &EvaluationContext) -> Value {
    unary(args, |v| {
        matches!(v, Value::Error(e) if *e != ErrorKind::Na)
    })
}

/// ISNA(value)
pub fn fn_isna(args: &[Value], _ctx: &EvaluationContext) -> Value {
    unary(args, |v| matches!(v, Value::Error(ErrorKind::Na)))
}

/// ISNUMBER(value)
pub fn fn_isnumber(args: &[Value], _ctx: &EvaluationContext) -> Value {
    unary(args, |v| matches!(v, Value::Number(_)))
}

/// ISTEXT(value)
pub fn fn_istext(args: &[Value], _ctx: &EvaluationContext) -> Value {
    unary(args, |v| matches!(v, Value::Text(_)))
}

/// ISLOGICAL(value)
pub fn fn_islogical(args: &[Value], _ctx: &EvaluationContext) -> Value {
    unary(args, |v| matches!(v, Value::Logical(_)))
}

/// NA()
pub fn fn_na(_args: &[Value], _ctx: &EvaluationContext) -> Value {
    Value::Error(ErrorKind::Na)
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadsheet_core::Decimal;

    fn ctx() -> EvaluationContext<'static> {
        EvaluationContext::detached()
    }

    #[test]
    fn test_isblank() {
        assert_eq!(fn_isblank(&[Value::Empty], &ctx()), Value::Logical(true));
        assert_eq!(
            fn_isblank(&[Value::text("")], &ctx()),
            Value::Logical(false)
        );
    }

    #[test]
    fn test_error_family() {
        let div0 = Value::Error(ErrorKind::Div0);
        let na = Value::Error(ErrorKind::Na);

        assert_eq!(fn_iserror(&[div0.clone()], &ctx()), Value::Logical(true));
        assert_eq!(fn_iserror(&[na.clone()], &ctx()), Value::Logical(true));
        assert_eq!(
            fn_iserror(&[Value::Number(Decimal::ONE)], &ctx()),
            Value::Logical(false)
        );

        assert_eq!(fn_iserr(&[div0.clone()], &ctx()), Value::Logical(true));
        assert_eq!(fn_iserr(&[na.clone()], &ctx()), Value::Logical(false));

        assert_eq!(fn_isna(&[na], &ctx()), Value::Logical(true));
        assert_eq!(fn_isna(&[div0], &ctx()), Value::Logical(false));
    }

    #[test]
    fn test_kind_tests() {
        assert_eq!(
            fn_isnumber(&[Value::Number(Decimal::ONE)], &ctx()),
            Value::Logical(true)
        );
        assert_eq!(
            fn_isnumber(&[Value::text("1")], &ctx()),
            Value::Logical(false)
        );
        assert_eq!(fn_istext(&[Value::text("x")], &ctx()), Value::Logical(true));
        assert_eq!(
            fn_islogical(&[Value::Logical(false)], &ctx()),
            Value::Logical(true)
        );
    }

    #[test]
    fn test_na() {
        assert_eq!(fn_na(&[], &ctx()), Value::Error(ErrorKind::Na));
    }
}
