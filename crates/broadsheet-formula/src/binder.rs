//! Bind pass
//!
//! Runs once per parsed tree, before the per-record evaluation loop:
//! resolves every function name against the registry (case-insensitive)
//! and checks the argument count against the descriptor. Neither failure
//! aborts the bind - a bad call becomes a node that evaluates to its error
//! unconditionally, without ever touching its arguments. All
//! value-dependent checking stays in the evaluator.
//!
//! Binding is idempotent and touches no shared mutable state, so distinct
//! trees can be bound concurrently against the same registry.

use crate::ast::{BinaryOperator, Expr, RangeReference, Reference, UnaryOperator};
use crate::context::EvaluationContext;
use crate::evaluator;
use crate::functions::FunctionRegistry;
use broadsheet_core::{ErrorKind, Value};

/// A bound expression tree
///
/// Same shape as [`Expr`], except function calls are resolved: either a
/// registry slot with a verified argument count, or a fault that evaluates
/// to a fixed error.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
    Literal(Value),
    CellRef(Reference),
    RangeRef(RangeReference),
    NameRef(String),
    UnaryOp {
        op: UnaryOperator,
        operand: Box<BoundExpr>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
    },
    /// Resolved call; `index` is the registry slot
    Call {
        index: usize,
        name: String,
        args: Vec<BoundExpr>,
    },
    /// Unknown name or arity violation; evaluates to `error` without
    /// evaluating any argument
    FaultCall { name: String, error: ErrorKind },
}

/// A bound formula, ready for repeated evaluation
///
/// Holds the registry it was bound against, so call slots stay valid for
/// the life of the formula.
pub struct BoundFormula<'r> {
    registry: &'r FunctionRegistry,
    root: BoundExpr,
}

impl<'r> BoundFormula<'r> {
    /// The bound tree
    pub fn root(&self) -> &BoundExpr {
        &self.root
    }

    /// The registry this formula was bound against
    pub fn registry(&self) -> &'r FunctionRegistry {
        self.registry
    }

    /// Evaluate against a record context
    ///
    /// Total: data-dependent failures come back as [`Value::Error`], never
    /// as a panic or a `Result`.
    pub fn evaluate(&self, ctx: &EvaluationContext) -> Value {
        evaluator::evaluate_expr(&self.root, ctx, self.registry)
    }
}

/// Bind a parsed tree against a function registry
///
/// Always succeeds structurally; see the module docs for how bad calls are
/// represented.
pub fn bind<'r>(expr: &Expr, registry: &'r FunctionRegistry) -> BoundFormula<'r> {
    BoundFormula {
        registry,
        root: bind_expr(expr, registry),
    }
}

pub(crate) fn bind_expr(expr: &Expr, registry: &FunctionRegistry) -> BoundExpr {
    match expr {
        Expr::Literal(v) => BoundExpr::Literal(v.clone()),
        Expr::CellRef(r) => BoundExpr::CellRef(r.clone()),
        Expr::RangeRef(r) => BoundExpr::RangeRef(r.clone()),
        Expr::NameRef(name) => BoundExpr::NameRef(name.clone()),

        Expr::UnaryOp { op, operand } => BoundExpr::UnaryOp {
            op: *op,
            operand: Box::new(bind_expr(operand, registry)),
        },

        Expr::BinaryOp { op, left, right } => BoundExpr::BinaryOp {
            op: *op,
            left: Box::new(bind_expr(left, registry)),
            right: Box::new(bind_expr(right, registry)),
        },

        Expr::FunctionCall { name, args } => {
            let index = match registry.index_of(name) {
                Some(index) => index,
                None => {
                    return BoundExpr::FaultCall {
                        name: name.clone(),
                        error: ErrorKind::Name,
                    }
                }
            };

            let def = registry.def(index);
            let count_ok = args.len() >= def.min_args
                && def.max_args.map_or(true, |max| args.len() <= max);
            if !count_ok {
                return BoundExpr::FaultCall {
                    name: name.clone(),
                    error: ErrorKind::ArgCount,
                };
            }

            BoundExpr::Call {
                index,
                name: name.clone(),
                args: args.iter().map(|a| bind_expr(a, registry)).collect(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::standard_registry;
    use crate::parser::parse_formula;

    fn bind_text(source: &str) -> BoundExpr {
        let expr = parse_formula(source).unwrap();
        bind_expr(&expr, standard_registry())
    }

    #[test]
    fn test_bind_known_function() {
        match bind_text("=SUM(1,2)") {
            BoundExpr::Call { name, args, .. } => {
                assert_eq!(name, "SUM");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Call, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_is_case_insensitive() {
        assert!(matches!(bind_text("=sum(1)"), BoundExpr::Call { .. }));
    }

    #[test]
    fn test_bind_unknown_function() {
        match bind_text("=FOOBAR(1,2)") {
            BoundExpr::FaultCall { name, error } => {
                assert_eq!(name, "FOOBAR");
                assert_eq!(error, ErrorKind::Name);
            }
            other => panic!("expected FaultCall, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_arity_violation() {
        // ABS takes exactly one argument
        match bind_text("=ABS(1,2)") {
            BoundExpr::FaultCall { error, .. } => assert_eq!(error, ErrorKind::ArgCount),
            other => panic!("expected FaultCall, got {:?}", other),
        }
        match bind_text("=ABS()") {
            BoundExpr::FaultCall { error, .. } => assert_eq!(error, ErrorKind::ArgCount),
            other => panic!("expected FaultCall, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_checks_nested_calls() {
        // The fault is local: the outer call binds, the inner one faults
        match bind_text("=SUM(1,FOOBAR(2))") {
            BoundExpr::Call { args, .. } => {
                assert!(matches!(&args[1], BoundExpr::FaultCall { .. }));
            }
            other => panic!("expected Call, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_is_idempotent_input() {
        // Binding does not consume or mutate the parsed tree
        let expr = parse_formula("=SUM(A1:B4)*0.9").unwrap();
        let first = bind_expr(&expr, standard_registry());
        let second = bind_expr(&expr, standard_registry());
        assert_eq!(first, second);
    }
}
