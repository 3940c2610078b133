//! Formula parser
//!
//! A recursive descent parser over the lexer's token stream, with the
//! operator precedence report formulas expect: comparison, then text
//! concatenation, then additive, multiplicative, unary minus, and
//! exponentiation, with ranges binding tighter than any operator. Unary
//! minus binds looser than `^` (so `-2^2` is `-(2^2)`), while the right
//! side of `^` re-admits a sign (so `2^-3` still parses).
//!
//! Function names are not resolved here. `FOO(1)` parses fine whether or
//! not `FOO` exists; the binder decides that later. Syntax and semantics
//! fail in separate passes.

use crate::ast::{BinaryOperator, Expr, RangeReference, Reference, UnaryOperator};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize_at, Token, TokenKind};
use broadsheet_core::{CellRange, Value};

/// Parse a formula string into an expression tree
///
/// A leading `=` is accepted and skipped, since report field definitions
/// carry one ("=SUM(A1:B4)*0.9").
///
/// # Example
/// ```rust
/// use broadsheet_formula::parse_formula;
///
/// let expr = parse_formula("=1+2").unwrap();
/// let expr = parse_formula("SUM(A1:B4)*0.9").unwrap();
/// let expr = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn parse_formula(source: &str) -> ParseResult<Expr> {
    let trimmed = source.trim_start();
    let mut base = source.len() - trimmed.len();

    let body = match trimmed.strip_prefix('=') {
        Some(rest) => {
            base += 1;
            rest
        }
        None => trimmed,
    };

    let tokens = tokenize_at(body, base)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current().kind, TokenKind::Eof) {
        return Err(parser.unexpected("end of formula"));
    }

    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        // The token stream always ends with Eof, so pos stays in range
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn consume(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect_right_paren(&mut self) -> ParseResult<()> {
        if matches!(self.current().kind, TokenKind::RightParen) {
            self.consume();
            Ok(())
        } else {
            Err(self.unexpected("')'"))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::Syntax {
            offset: self.current().offset,
            message: format!("expected {}, got {:?}", expected, self.current().kind),
        }
    }

    // === Expression parsing with precedence ===
    // Lowest to highest:
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Unary minus
    // 6. Exponentiation: ^ (right associative)
    // 7. Range: :
    // 8. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Equal => BinaryOperator::Equal,
                TokenKind::NotEqual => BinaryOperator::NotEqual,
                TokenKind::LessThan => BinaryOperator::LessThan,
                TokenKind::LessEqual => BinaryOperator::LessEqual,
                TokenKind::GreaterThan => BinaryOperator::GreaterThan,
                TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            let right = self.parse_concatenation()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;

        while matches!(self.current().kind, TokenKind::Ampersand) {
            self.consume();
            let right = self.parse_additive()?;
            left = Expr::BinaryOp {
                op: BinaryOperator::Concat,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        // Prefix unary minus; binds looser than '^', so -2^2 is -(2^2)
        if matches!(self.current().kind, TokenKind::Minus) {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        // Prefix plus (no-op)
        if matches!(self.current().kind, TokenKind::Plus) {
            self.consume();
            return self.parse_unary();
        }

        self.parse_exponent()
    }

    fn parse_exponent(&mut self) -> ParseResult<Expr> {
        let left = self.parse_range()?;

        if matches!(self.current().kind, TokenKind::Caret) {
            self.consume();
            // Right associative, and the exponent may carry its own sign
            let right = self.parse_unary()?;
            return Ok(Expr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_range(&mut self) -> ParseResult<Expr> {
        let left = self.parse_primary()?;

        if matches!(self.current().kind, TokenKind::Colon) {
            self.consume();
            let right = self.parse_primary()?;

            // Both endpoints must be cell references; the sheets may differ
            // (cross-partition range)
            return match (left, right) {
                (Expr::CellRef(start), Expr::CellRef(end)) => {
                    Ok(Expr::RangeRef(RangeReference {
                        range: CellRange::new(start.address, end.address),
                        start_sheet: start.sheet,
                        end_sheet: end.sheet,
                    }))
                }
                _ => Err(self.unexpected("cell reference on both sides of ':'")),
            };
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.current().kind.clone() {
            TokenKind::Number(n) => {
                self.consume();
                Ok(Expr::Literal(Value::Number(n)))
            }

            TokenKind::Text(s) => {
                self.consume();
                Ok(Expr::Literal(Value::Text(s)))
            }

            TokenKind::Logical(b) => {
                self.consume();
                Ok(Expr::Literal(Value::Logical(b)))
            }

            TokenKind::ErrorLit(e) => {
                self.consume();
                Ok(Expr::Literal(Value::Error(e)))
            }

            TokenKind::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect_right_paren()?;
                Ok(expr)
            }

            TokenKind::Ref { sheet, address } => {
                self.consume();
                Ok(Expr::CellRef(Reference { sheet, address }))
            }

            TokenKind::Identifier(name) => {
                self.consume();
                if matches!(self.current().kind, TokenKind::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    // Named reference, resolved by the context at evaluation
                    Ok(Expr::NameRef(name))
                }
            }

            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_function_call(&mut self, name: String) -> ParseResult<Expr> {
        self.consume(); // '('

        let mut args = Vec::new();

        if !matches!(self.current().kind, TokenKind::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current().kind, TokenKind::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect_right_paren()?;

        Ok(Expr::FunctionCall {
            name: name.to_uppercase(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadsheet_core::Decimal;

    fn num(n: i64) -> Expr {
        Expr::Literal(Value::Number(Decimal::from(n)))
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("=42").unwrap(), num(42));
        assert_eq!(
            parse_formula("=3.14").unwrap(),
            Expr::Literal(Value::Number("3.14".parse().unwrap()))
        );
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(
            parse_formula("=\"Hello\"").unwrap(),
            Expr::Literal(Value::text("Hello"))
        );
        assert_eq!(
            parse_formula("=\"Hello \"\"World\"\"\"").unwrap(),
            Expr::Literal(Value::text("Hello \"World\""))
        );
    }

    #[test]
    fn test_parse_without_equals_prefix() {
        assert_eq!(parse_formula("1+2").unwrap(), parse_formula("=1+2").unwrap());
    }

    #[test]
    fn test_parse_precedence() {
        // 1+2*3 parses as 1+(2*3)
        let expr = parse_formula("=1+2*3").unwrap();
        match expr {
            Expr::BinaryOp { op, left, right } => {
                assert_eq!(op, BinaryOperator::Add);
                assert_eq!(*left, num(1));
                assert!(matches!(
                    *right,
                    Expr::BinaryOp {
                        op: BinaryOperator::Multiply,
                        ..
                    }
                ));
            }
            other => panic!("expected BinaryOp, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unary_minus_looser_than_power() {
        // -2^2 parses as -(2^2)
        let expr = parse_formula("=-2^2").unwrap();
        match expr {
            Expr::UnaryOp { op, operand } => {
                assert_eq!(op, UnaryOperator::Negate);
                assert!(matches!(
                    *operand,
                    Expr::BinaryOp {
                        op: BinaryOperator::Power,
                        ..
                    }
                ));
            }
            other => panic!("expected UnaryOp, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_power_right_associative() {
        // 2^3^2 parses as 2^(3^2)
        let expr = parse_formula("=2^3^2").unwrap();
        match expr {
            Expr::BinaryOp { op, left, right } => {
                assert_eq!(op, BinaryOperator::Power);
                assert_eq!(*left, num(2));
                assert!(matches!(
                    *right,
                    Expr::BinaryOp {
                        op: BinaryOperator::Power,
                        ..
                    }
                ));
            }
            other => panic!("expected BinaryOp, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_signed_exponent() {
        // 2^-3 parses, with the sign inside the exponent
        let expr = parse_formula("=2^-3").unwrap();
        match expr {
            Expr::BinaryOp { op, right, .. } => {
                assert_eq!(op, BinaryOperator::Power);
                assert!(matches!(*right, Expr::UnaryOp { .. }));
            }
            other => panic!("expected BinaryOp, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_comparison() {
        let expr = parse_formula("=A1>5").unwrap();
        assert!(matches!(
            expr,
            Expr::BinaryOp {
                op: BinaryOperator::GreaterThan,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_concatenation() {
        let expr = parse_formula("=\"Total: \"&B2").unwrap();
        assert!(matches!(
            expr,
            Expr::BinaryOp {
                op: BinaryOperator::Concat,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_cell_reference() {
        match parse_formula("=A1").unwrap() {
            Expr::CellRef(r) => {
                assert!(r.sheet.is_none());
                assert_eq!(r.address.row, 0);
                assert_eq!(r.address.col, 0);
            }
            other => panic!("expected CellRef, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_range_reference() {
        match parse_formula("=A1:B4").unwrap() {
            Expr::RangeRef(r) => {
                assert!(r.start_sheet.is_none());
                assert!(r.end_sheet.is_none());
                assert_eq!(r.range.start.row, 0);
                assert_eq!(r.range.end.row, 3);
                assert_eq!(r.range.end.col, 1);
            }
            other => panic!("expected RangeRef, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_cross_partition_range() {
        match parse_formula("=Sheet1.B4:Sheet2.C5").unwrap() {
            Expr::RangeRef(r) => {
                assert_eq!(r.start_sheet.as_deref(), Some("Sheet1"));
                assert_eq!(r.end_sheet.as_deref(), Some("Sheet2"));
                assert_eq!(r.range.start.row, 3);
                assert_eq!(r.range.end.row, 4);
            }
            other => panic!("expected RangeRef, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_call() {
        match parse_formula("=SUM(1,2,3)").unwrap() {
            Expr::FunctionCall { name, args } => {
                assert_eq!(name, "SUM");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected FunctionCall, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_case_normalized() {
        match parse_formula("=sum(A1:B4)").unwrap() {
            Expr::FunctionCall { name, args } => {
                assert_eq!(name, "SUM");
                assert_eq!(args.len(), 1);
                assert!(matches!(&args[0], Expr::RangeRef(_)));
            }
            other => panic!("expected FunctionCall, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_function_is_not_a_parse_error() {
        // Unknown names are a binder concern, not a parser concern
        assert!(parse_formula("=FOOBAR(1,2)").is_ok());
    }

    #[test]
    fn test_parse_named_reference() {
        assert_eq!(
            parse_formula("=tax_rate").unwrap(),
            Expr::NameRef("tax_rate".into())
        );
    }

    #[test]
    fn test_parse_nested_calls() {
        match parse_formula("=IF(A1>0,SUM(B1:B4),0)").unwrap() {
            Expr::FunctionCall { name, args } => {
                assert_eq!(name, "IF");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected FunctionCall, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_parentheses() {
        let expr = parse_formula("=(1+2)*3").unwrap();
        match expr {
            Expr::BinaryOp { op, left, right } => {
                assert_eq!(op, BinaryOperator::Multiply);
                assert!(matches!(
                    *left,
                    Expr::BinaryOp {
                        op: BinaryOperator::Add,
                        ..
                    }
                ));
                assert_eq!(*right, num(3));
            }
            other => panic!("expected BinaryOp, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_literal() {
        use broadsheet_core::ErrorKind;
        assert_eq!(
            parse_formula("=#VALUE!").unwrap(),
            Expr::Literal(Value::Error(ErrorKind::Value))
        );
    }

    #[test]
    fn test_parse_syntax_errors() {
        assert!(parse_formula("=1+").is_err());
        assert!(parse_formula("=(1+2").is_err());
        assert!(parse_formula("=SUM(1,").is_err());
        assert!(parse_formula("=1 2").is_err());
        assert!(parse_formula("=A1:5").is_err());
    }

    #[test]
    fn test_parse_error_carries_offset() {
        match parse_formula("=1+") {
            Err(ParseError::Syntax { offset, .. }) => assert_eq!(offset, 3),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }
}
