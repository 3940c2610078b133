//! Text functions
//!
//! All positions and lengths are in characters, not bytes, so multi-byte
//! text behaves the way report authors expect.

use super::{int_arg, text_arg};
use crate::context::EvaluationContext;
use broadsheet_core::{Decimal, ErrorKind, Value};

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

fn take_mid(s: &str, start_1based: usize, n: usize) -> String {
    s.chars().skip(start_1based - 1).take(n).collect()
}

fn text_at(args: &[Value], idx: usize, ctx: &EvaluationContext) -> Result<String, ErrorKind> {
    match args.get(idx) {
        Some(v) => text_arg(v, ctx.locale()),
        None => Err(ErrorKind::ArgCount),
    }
}

/// CONCATENATE(text, ...)
pub fn fn_concatenate(args: &[Value], ctx: &EvaluationContext) -> Value {
    let mut out = String::new();
    for arg in args {
        match text_arg(arg, ctx.locale()) {
            Ok(s) => out.push_str(&s),
            Err(e) => return Value::Error(e),
        }
    }
    Value::Text(out)
}

/// LEFT(text, [count])
pub fn fn_left(args: &[Value], ctx: &EvaluationContext) -> Value {
    let s = match text_at(args, 0, ctx) {
        Ok(s) => s,
        Err(e) => return Value::Error(e),
    };

    let count = match args.get(1) {
        None => 1,
        Some(v) => match int_arg(v, ctx.locale()) {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        },
    };

    if count < 0 {
        return Value::Error(ErrorKind::Value);
    }

    Value::Text(take_left(&s, count as usize))
}

/// RIGHT(text, [count])
pub fn fn_right(args: &[Value], ctx: &EvaluationContext) -> Value {
    let s = match text_at(args, 0, ctx) {
        Ok(s) => s,
        Err(e) => return Value::Error(e),
    };

    let count = match args.get(1) {
        None => 1,
        Some(v) => match int_arg(v, ctx.locale()) {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        },
    };

    if count < 0 {
        return Value::Error(ErrorKind::Value);
    }

    Value::Text(take_right(&s, count as usize))
}

/// MID(text, start, count) - start is 1-based
pub fn fn_mid(args: &[Value], ctx: &EvaluationContext) -> Value {
    let s = match text_at(args, 0, ctx) {
        Ok(s) => s,
        Err(e) => return Value::Error(e),
    };

    let start = match args.get(1).map(|v| int_arg(v, ctx.locale())) {
        Some(Ok(n)) => n,
        Some(Err(e)) => return Value::Error(e),
        None => return Value::Error(ErrorKind::ArgCount),
    };

    let count = match args.get(2).map(|v| int_arg(v, ctx.locale())) {
        Some(Ok(n)) => n,
        Some(Err(e)) => return Value::Error(e),
        None => return Value::Error(ErrorKind::ArgCount),
    };

    if start < 1 || count < 0 {
        return Value::Error(ErrorKind::Value);
    }

    Value::Text(take_mid(&s, start as usize, count as usize))
}

/// LEN(text)
pub fn fn_len(args: &[Value], ctx: &EvaluationContext) -> Value {
    match text_at(args, 0, ctx) {
        Ok(s) => Value::Number(Decimal::from(s.chars().count() as i64)),
        Err(e) => Value::Error(e),
    }
}

/// UPPER(text)
pub fn fn_upper(args: &[Value], ctx: &EvaluationContext) -> Value {
    match text_at(args, 0, ctx) {
        Ok(s) => Value::Text(s.to_uppercase()),
        Err(e) => Value::Error(e),
    }
}

/// LOWER(text)
pub fn fn_lower(args: &[Value], ctx: &EvaluationContext) -> Value {
    match text_at(args, 0, ctx) {
        Ok(s) => Value::Text(s.to_lowercase()),
        Err(e) => Value::Error(e),
    }
}

/// TRIM(text) - Strips leading/trailing spaces and collapses runs inside
pub fn fn_trim(args: &[Value], ctx: &EvaluationContext) -> Value {
    match text_at(args, 0, ctx) {
        Ok(s) => {
            let collapsed: Vec<&str> = s.split_whitespace().collect();
            Value::Text(collapsed.join(" "))
        }
        Err(e) => Value::Error(e),
    }
}

/// EXACT(a, b) - Case-sensitive, unlike the `=` operator
pub fn fn_exact(args: &[Value], ctx: &EvaluationContext) -> Value {
    let a = match text_at(args, 0, ctx) {
        Ok(s) => s,
        Err(e) => return Value::Error(e),
    };
    let b = match text_at(args, 1, ctx) {
        Ok(s) => s,
        Err(e) => return Value::Error(e),
    };
    Value::Logical(a == b)
}

/// REPT(text, count)
pub fn fn_rept(args: &[Value], ctx: &EvaluationContext) -> Value {
    let s = match text_at(args, 0, ctx) {
        Ok(s) => s,
        Err(e) => return Value::Error(e),
    };

    let count = match args.get(1).map(|v| int_arg(v, ctx.locale())) {
        Some(Ok(n)) => n,
        Some(Err(e)) => return Value::Error(e),
        None => return Value::Error(ErrorKind::ArgCount),
    };

    if count < 0 {
        return Value::Error(ErrorKind::Value);
    }

    Value::Text(s.repeat(count as usize))
}

/// SUBSTITUTE(text, old, new, [instance]) - instance is 1-based; without
/// it every occurrence is replaced
pub fn fn_substitute(args: &[Value], ctx: &EvaluationContext) -> Value {
    let s = match text_at(args, 0, ctx) {
        Ok(s) => s,
        Err(e) => return Value::Error(e),
    };
    let old = match text_at(args, 1, ctx) {
        Ok(s) => s,
        Err(e) => return Value::Error(e),
    };
    let new = match text_at(args, 2, ctx) {
        Ok(s) => s,
        Err(e) => return Value::Error(e),
    };

    if old.is_empty() {
        return Value::Text(s);
    }

    match args.get(3) {
        None => Value::Text(s.replace(&old, &new)),
        Some(v) => {
            let instance = match int_arg(v, ctx.locale()) {
                Ok(n) => n,
                Err(e) => return Value::Error(e),
            };
            if instance < 1 {
                return Value::Error(ErrorKind::Value);
            }

            let mut seen = 0;
            let mut search_from = 0;
            while let Some(found) = s[search_from..].find(&old) {
                let at = search_from + found;
                seen += 1;
                if seen == instance {
                    let mut out = String::with_capacity(s.len());
                    out.push_str(&s[..at]);
                    out.push_str(&new);
                    out.push_str(&s[at + old.len()..]);
                    return Value::Text(out);
                }
                search_from = at + old.len();
            }

            // Fewer occurrences than requested: unchanged
            Value::Text(s)
        }
    }
}

/// T(value) - Text passes through, everything else becomes empty text
pub fn fn_t(args: &[Value], _ctx: &EvaluationContext) -> Value {
    match args.first() {
        Some(Value::Text(s)) => Value::Text(s.clone()),
        Some(Value::Error(e)) => Value::Error(*e),
        Some(_) => Value::Text(String::new()),
        None => Value::Error(ErrorKind::ArgCount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> EvaluationContext<'static> {
        EvaluationContext::detached()
    }

    fn num(n: i64) -> Value {
        Value::Number(Decimal::from(n))
    }

    #[test]
    fn test_concatenate_display_forms() {
        assert_eq!(
            fn_concatenate(
                &[Value::text("n="), num(14), Value::Empty, Value::Logical(true)],
                &ctx()
            ),
            Value::text("n=14TRUE")
        );
    }

    #[test]
    fn test_left_right_defaults() {
        assert_eq!(fn_left(&[Value::text("report")], &ctx()), Value::text("r"));
        assert_eq!(
            fn_left(&[Value::text("report"), num(3)], &ctx()),
            Value::text("rep")
        );
        assert_eq!(
            fn_right(&[Value::text("report"), num(3)], &ctx()),
            Value::text("ort")
        );
        assert_eq!(
            fn_right(&[Value::text("ab"), num(9)], &ctx()),
            Value::text("ab")
        );
    }

    #[test]
    fn test_left_negative_count() {
        assert_eq!(
            fn_left(&[Value::text("x"), num(-1)], &ctx()),
            Value::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn test_mid() {
        assert_eq!(
            fn_mid(&[Value::text("formula"), num(4), num(2)], &ctx()),
            Value::text("mu")
        );
        assert_eq!(
            fn_mid(&[Value::text("formula"), num(0), num(2)], &ctx()),
            Value::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn test_len_counts_characters() {
        assert_eq!(fn_len(&[Value::text("über")], &ctx()), num(4));
    }

    #[test]
    fn test_case_and_trim() {
        assert_eq!(
            fn_upper(&[Value::text("page total")], &ctx()),
            Value::text("PAGE TOTAL")
        );
        assert_eq!(
            fn_lower(&[Value::text("PAGE")], &ctx()),
            Value::text("page")
        );
        assert_eq!(
            fn_trim(&[Value::text("  a   b  ")], &ctx()),
            Value::text("a b")
        );
    }

    #[test]
    fn test_exact_is_case_sensitive() {
        assert_eq!(
            fn_exact(&[Value::text("Total"), Value::text("total")], &ctx()),
            Value::Logical(false)
        );
        assert_eq!(
            fn_exact(&[Value::text("Total"), Value::text("Total")], &ctx()),
            Value::Logical(true)
        );
    }

    #[test]
    fn test_rept() {
        assert_eq!(
            fn_rept(&[Value::text("-"), num(3)], &ctx()),
            Value::text("---")
        );
        assert_eq!(fn_rept(&[Value::text("-"), num(0)], &ctx()), Value::text(""));
    }

    #[test]
    fn test_substitute_all_and_nth() {
        assert_eq!(
            fn_substitute(
                &[Value::text("a-b-c"), Value::text("-"), Value::text("+")],
                &ctx()
            ),
            Value::text("a+b+c")
        );
        assert_eq!(
            fn_substitute(
                &[
                    Value::text("a-b-c"),
                    Value::text("-"),
                    Value::text("+"),
                    num(2)
                ],
                &ctx()
            ),
            Value::text("a-b+c")
        );
        assert_eq!(
            fn_substitute(
                &[
                    Value::text("a-b"),
                    Value::text("-"),
                    Value::text("+"),
                    num(5)
                ],
                &ctx()
            ),
            Value::text("a-b")
        );
    }

    #[test]
    fn test_t() {
        assert_eq!(fn_t(&[Value::text("x")], &ctx()), Value::text("x"));
        assert_eq!(fn_t(&[num(5)], &ctx()), Value::text(""));
    }
}
