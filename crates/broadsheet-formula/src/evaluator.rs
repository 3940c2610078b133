//! Formula evaluator
//!
//! A post-order walk over the bound tree. The walk is total: every
//! data-dependent failure comes back as a [`Value::Error`], which then
//! flows through the rest of the expression under the absorption rule
//! (leftmost error wins, nothing downstream of it runs). Only the
//! structural passes - lexing and parsing - can fail hard.
//!
//! The evaluator reads through the context and the registry; it never
//! mutates the tree, the context, or the underlying record data, so one
//! bound tree can serve any number of concurrent evaluations with
//! per-record contexts.

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::binder::{bind_expr, BoundExpr, BoundFormula};
use crate::context::{EvaluationContext, NameDefinition};
use crate::functions::{decimal_pow, FunctionRegistry};
use crate::parser::parse_formula;
use broadsheet_core::{ErrorKind, Value};
use std::cmp::Ordering;

/// Evaluate a bound formula against a record context
///
/// Convenience alias for [`BoundFormula::evaluate`].
pub fn evaluate(formula: &BoundFormula, ctx: &EvaluationContext) -> Value {
    formula.evaluate(ctx)
}

pub(crate) fn evaluate_expr(
    expr: &BoundExpr,
    ctx: &EvaluationContext,
    registry: &FunctionRegistry,
) -> Value {
    match expr {
        BoundExpr::Literal(v) => v.clone(),

        BoundExpr::CellRef(r) => ctx.resolve_cell(r.sheet.as_deref(), &r.address),

        BoundExpr::RangeRef(r) => ctx.resolve_range(r),

        BoundExpr::NameRef(name) => evaluate_name(name, ctx, registry),

        BoundExpr::UnaryOp { op, operand } => {
            let value = evaluate_expr(operand, ctx, registry);
            evaluate_unary_op(*op, value, ctx)
        }

        BoundExpr::BinaryOp { op, left, right } => {
            let left_val = evaluate_expr(left, ctx, registry);
            let right_val = evaluate_expr(right, ctx, registry);
            evaluate_binary_op(*op, left_val, right_val, ctx)
        }

        BoundExpr::Call { index, args, .. } => {
            let def = registry.def(*index);

            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(evaluate_expr(arg, ctx, registry));
            }

            // Absorption: the first error argument short-circuits the call,
            // unless the function inspects errors itself (the IS-family)
            if !def.error_transparent {
                for value in &evaluated {
                    if let Some(e) = value.error() {
                        return Value::Error(e);
                    }
                }
            }

            (def.implementation)(&evaluated, ctx)
        }

        // Bad calls never touch their arguments
        BoundExpr::FaultCall { error, .. } => Value::Error(*error),
    }
}

/// Resolve and evaluate a named reference
///
/// Formula-backed names re-enter the interpreter, so the context's depth
/// guard bounds reference chains (including cycles) at `MAX_EVAL_DEPTH`.
fn evaluate_name(name: &str, ctx: &EvaluationContext, registry: &FunctionRegistry) -> Value {
    match ctx.resolve_name(name) {
        None => Value::Error(ErrorKind::Name),
        Some(NameDefinition::Value(v)) => v,
        Some(NameDefinition::Formula(text)) => {
            if !ctx.enter() {
                return Value::Error(ErrorKind::Na);
            }
            let result = match parse_formula(&text) {
                Ok(expr) => {
                    let bound = bind_expr(&expr, registry);
                    evaluate_expr(&bound, ctx, registry)
                }
                Err(_) => Value::Error(ErrorKind::Name),
            };
            ctx.leave();
            result
        }
    }
}

fn evaluate_unary_op(op: UnaryOperator, value: Value, ctx: &EvaluationContext) -> Value {
    if let Some(e) = value.error() {
        return Value::Error(e);
    }

    match op {
        UnaryOperator::Negate => match value.coerce_number(ctx.locale()) {
            Ok(n) => Value::Number(-n),
            Err(e) => Value::Error(e),
        },
    }
}

fn evaluate_binary_op(
    op: BinaryOperator,
    left: Value,
    right: Value,
    ctx: &EvaluationContext,
) -> Value {
    // Absorption: leftmost error first, operator never runs
    if let Some(e) = left.error() {
        return Value::Error(e);
    }
    if let Some(e) = right.error() {
        return Value::Error(e);
    }

    match op {
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Power => evaluate_arithmetic(op, &left, &right, ctx),

        BinaryOperator::Equal => Value::Logical(left.total_cmp(&right) == Ordering::Equal),
        BinaryOperator::NotEqual => Value::Logical(left.total_cmp(&right) != Ordering::Equal),
        BinaryOperator::LessThan => Value::Logical(left.total_cmp(&right) == Ordering::Less),
        BinaryOperator::LessEqual => Value::Logical(left.total_cmp(&right) != Ordering::Greater),
        BinaryOperator::GreaterThan => Value::Logical(left.total_cmp(&right) == Ordering::Greater),
        BinaryOperator::GreaterEqual => Value::Logical(left.total_cmp(&right) != Ordering::Less),

        BinaryOperator::Concat => {
            let mut s = left.display_text(ctx.locale());
            s.push_str(&right.display_text(ctx.locale()));
            Value::Text(s)
        }
    }
}

fn evaluate_arithmetic(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    ctx: &EvaluationContext,
) -> Value {
    let a = match left.coerce_number(ctx.locale()) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    let b = match right.coerce_number(ctx.locale()) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };

    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => {
            if b.is_zero() {
                return Value::Error(ErrorKind::Div0);
            }
            a.checked_div(b)
        }
        BinaryOperator::Power => {
            return match decimal_pow(a, b) {
                Ok(n) => Value::Number(n),
                Err(e) => Value::Error(e),
            }
        }
        _ => unreachable!("non-arithmetic operator"),
    };

    match result {
        Some(n) => Value::Number(n),
        None => Value::Error(ErrorKind::Num),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind;
    use crate::context::testing::GridSource;
    use crate::context::{RecordSource, MAX_EVAL_DEPTH};
    use crate::functions::standard_registry;
    use broadsheet_core::Decimal;
    use pretty_assertions::assert_eq;

    fn eval(source: &str) -> Value {
        let expr = parse_formula(source).unwrap();
        let bound = bind(&expr, standard_registry());
        bound.evaluate(&EvaluationContext::detached())
    }

    fn eval_with(source: &str, record: &dyn RecordSource) -> Value {
        let expr = parse_formula(source).unwrap();
        let bound = bind(&expr, standard_registry());
        bound.evaluate(&EvaluationContext::new(record))
    }

    fn num(n: i64) -> Value {
        Value::Number(Decimal::from(n))
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("=42"), num(42));
        assert_eq!(eval("=\"Hello\""), Value::text("Hello"));
        assert_eq!(eval("=TRUE"), Value::Logical(true));
        assert_eq!(eval("=#N/A"), Value::Error(ErrorKind::Na));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("=1+2"), num(3));
        assert_eq!(eval("=10-3"), num(7));
        assert_eq!(eval("=4*5"), num(20));
        assert_eq!(eval("=20/4"), num(5));
        assert_eq!(eval("=2^10"), num(1024));
    }

    #[test]
    fn test_decimal_exactness() {
        // The classic binary-float trap: 0.1 + 0.2 must equal 0.3 exactly
        assert_eq!(eval("=0.1+0.2"), Value::Number("0.3".parse().unwrap()));
        assert_eq!(eval("=1.10*3"), Value::Number("3.3".parse().unwrap()));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("=2+3*4"), num(14));
        assert_eq!(eval("=(2+3)*4"), num(20));
        assert_eq!(eval("=2^3^2"), num(512));
        assert_eq!(eval("=-2^2"), num(-4));
        assert_eq!(eval("=2^-1"), Value::Number("0.5".parse().unwrap()));
    }

    #[test]
    fn test_division_semantics() {
        assert_eq!(eval("=5/0"), Value::Error(ErrorKind::Div0));
        assert_eq!(eval("=5/\"a\""), Value::Error(ErrorKind::Value));
    }

    #[test]
    fn test_text_coerces_in_arithmetic() {
        assert_eq!(eval("=\"2.5\"*2"), Value::Number("5.0".parse().unwrap()));
    }

    #[test]
    fn test_logical_rejected_in_arithmetic() {
        assert_eq!(eval("=TRUE+1"), Value::Error(ErrorKind::Value));
    }

    #[test]
    fn test_empty_counts_as_zero() {
        let source = GridSource::single(vec![vec![Value::Empty]]);
        assert_eq!(eval_with("=A1+5", &source), num(5));
    }

    #[test]
    fn test_error_absorption_leftmost_first() {
        // Left operand's error wins over the right's
        assert_eq!(eval("=#REF!+#DIV/0!"), Value::Error(ErrorKind::Ref));
        assert_eq!(eval("=1+#DIV/0!"), Value::Error(ErrorKind::Div0));
        // Errors pass through comparison and concatenation too
        assert_eq!(eval("=#N/A=1"), Value::Error(ErrorKind::Na));
        assert_eq!(eval("=\"x\"&#REF!"), Value::Error(ErrorKind::Ref));
        // And through function calls
        assert_eq!(eval("=ABS(#DIV/0!)"), Value::Error(ErrorKind::Div0));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("=1<2"), Value::Logical(true));
        assert_eq!(eval("=5=5"), Value::Logical(true));
        assert_eq!(eval("=5<>5"), Value::Logical(false));
        // Text comparison is case-insensitive
        assert_eq!(eval("=\"Apple\"=\"APPLE\""), Value::Logical(true));
        assert_eq!(eval("=\"apple\"<\"banana\""), Value::Logical(true));
    }

    #[test]
    fn test_comparison_mixed_kinds_fixed_order() {
        // Empty < Logical < Number < Text < Date
        assert_eq!(eval("=TRUE<0"), Value::Logical(true));
        assert_eq!(eval("=99<\"0\""), Value::Logical(true));
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(eval("=\"Total: \"&14"), Value::text("Total: 14"));
        assert_eq!(eval("=0.90&\"x\""), Value::text("0.9x"));
        assert_eq!(eval("=TRUE&\"\""), Value::text("TRUE"));
    }

    #[test]
    fn test_concatenation_empty_is_blank() {
        let source = GridSource::single(vec![vec![Value::Empty]]);
        assert_eq!(eval_with("=\"x\"&A1", &source), Value::text("x"));
    }

    #[test]
    fn test_unknown_function_evaluates_to_name_error() {
        assert_eq!(eval("=FOOBAR(1,2)"), Value::Error(ErrorKind::Name));
    }

    #[test]
    fn test_fault_call_never_evaluates_arguments() {
        // The argument would be a #DIV/0! if evaluated; the bind fault wins
        assert_eq!(eval("=FOOBAR(1/0)"), Value::Error(ErrorKind::Name));
        assert_eq!(eval("=ABS(1/0,2)"), Value::Error(ErrorKind::ArgCount));
    }

    #[test]
    fn test_cell_and_range_references() {
        let source = GridSource::single(vec![
            vec![num(1), num(2)],
            vec![num(3), num(4)],
        ]);
        assert_eq!(eval_with("=B2", &source), num(4));
        assert_eq!(eval_with("=SUM(A1:B2)", &source), num(10));
        assert_eq!(eval_with("=Records.A1", &source), num(1));
    }

    #[test]
    fn test_range_aggregation_over_mixed_cells() {
        // Empty cells are skipped; an embedded error poisons the aggregate
        let clean = GridSource::single(vec![
            vec![num(1), Value::Empty],
            vec![num(3), num(6)],
        ]);
        assert_eq!(eval_with("=SUM(A1:B2)", &clean), num(10));

        let poisoned = GridSource::single(vec![
            vec![num(1), Value::Empty],
            vec![num(3), Value::Error(ErrorKind::Value)],
        ]);
        assert_eq!(
            eval_with("=SUM(A1:B2)", &poisoned),
            Value::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn test_reference_out_of_bounds_is_ref() {
        let source = GridSource::single(vec![vec![num(1)]]);
        assert_eq!(eval_with("=C9", &source), Value::Error(ErrorKind::Ref));
        assert_eq!(
            eval_with("=Missing.A1", &source),
            Value::Error(ErrorKind::Ref)
        );
    }

    #[test]
    fn test_reference_without_record_is_na() {
        assert_eq!(eval("=A1"), Value::Error(ErrorKind::Na));
    }

    #[test]
    fn test_cross_partition_range() {
        let source = GridSource {
            sheets: vec![
                ("Q1".to_string(), vec![vec![num(1), num(2)]]),
                ("Q2".to_string(), vec![vec![num(3), num(4)]]),
            ],
            names: Vec::new(),
        };
        assert_eq!(eval_with("=SUM(Q1.A1:Q2.B1)", &source), num(10));
    }

    #[test]
    fn test_named_reference_value() {
        let source = GridSource {
            sheets: vec![("Records".to_string(), vec![vec![num(200)]])],
            names: vec![(
                "tax_rate".to_string(),
                NameDefinition::Value(Value::Number("0.19".parse().unwrap())),
            )],
        };
        assert_eq!(
            eval_with("=A1*tax_rate", &source),
            Value::Number(Decimal::from(38))
        );
    }

    #[test]
    fn test_named_reference_formula() {
        let source = GridSource {
            sheets: vec![("Records".to_string(), vec![vec![num(3), num(4)]])],
            names: vec![(
                "row_total".to_string(),
                NameDefinition::Formula("=A1+B1".to_string()),
            )],
        };
        assert_eq!(eval_with("=row_total*2", &source), num(14));
    }

    #[test]
    fn test_unknown_name_is_name_error() {
        let source = GridSource::single(vec![vec![num(1)]]);
        assert_eq!(eval_with("=no_such", &source), Value::Error(ErrorKind::Name));
    }

    #[test]
    fn test_cyclic_name_hits_depth_guard() {
        let source = GridSource {
            sheets: vec![("Records".to_string(), vec![vec![num(1)]])],
            names: vec![(
                "loop".to_string(),
                NameDefinition::Formula("=loop+1".to_string()),
            )],
        };
        assert_eq!(eval_with("=loop", &source), Value::Error(ErrorKind::Na));
        // The guard bound is what trips, not stack exhaustion
        assert!(MAX_EVAL_DEPTH < 1000);
    }

    #[test]
    fn test_determinism() {
        let source = GridSource::single(vec![vec![num(6), num(7)]]);
        let expr = parse_formula("=A1*B1").unwrap();
        let bound = bind(&expr, standard_registry());
        let ctx = EvaluationContext::new(&source);
        let first = bound.evaluate(&ctx);
        for _ in 0..5 {
            assert_eq!(bound.evaluate(&ctx), first);
        }
        assert_eq!(first, num(42));
    }

    #[test]
    fn test_report_field_shape() {
        // The canonical report field from the docs
        let source = GridSource::single(vec![
            vec![num(10), num(20)],
            vec![num(30), num(40)],
            vec![num(0), num(0)],
            vec![num(0), num(0)],
        ]);
        assert_eq!(eval_with("=SUM(A1:B4)*0.9", &source), num(90));
    }
}
