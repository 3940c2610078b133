//! # broadsheet-formula
//!
//! Formula parser and evaluator for broadsheet report generation.
//!
//! Report fields hold spreadsheet-style expressions ("=SUM(A1:B4)*0.9").
//! This crate turns such text into a tree once, binds it against a
//! function registry once, and evaluates it once per record:
//!
//! - Parsing (text → [`Expr`]), with hard [`ParseError`]s for malformed
//!   formulas
//! - Binding ([`Expr`] → [`BoundFormula`]), resolving function names and
//!   arities; never fails, bad calls become error-producing nodes
//! - Evaluation ([`BoundFormula`] + [`EvaluationContext`] → `Value`),
//!   total; every data failure is an error *value* that flows on through
//!   the expression
//!
//! ## Example
//!
//! ```rust
//! use broadsheet_formula::{bind, parse_formula, standard_registry, EvaluationContext};
//! use broadsheet_core::Value;
//!
//! let expr = parse_formula("=2+3*4").unwrap();
//! let formula = bind(&expr, standard_registry());
//! let value = formula.evaluate(&EvaluationContext::detached());
//! assert_eq!(value, Value::from(14));
//! ```
//!
//! Callers supply record data by implementing [`RecordSource`]; the
//! registry and bound trees are immutable after construction and safe to
//! share across concurrent evaluations, while each evaluation gets its own
//! context.

pub mod ast;
pub mod binder;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOperator, Expr, RangeReference, Reference, UnaryOperator};
pub use binder::{bind, BoundExpr, BoundFormula};
pub use context::{
    EvaluationContext, NameDefinition, RecordSource, MAX_EVAL_DEPTH,
};
pub use error::{ParseError, ParseResult};
pub use evaluator::evaluate;
pub use functions::{standard_registry, FunctionDef, FunctionRegistry, ParamKind};
pub use parser::parse_formula;
