//! Math functions

use super::{decimal_pow, for_each_number, int_arg};
use crate::context::EvaluationContext;
use broadsheet_core::{Decimal, ErrorKind, Value};
use rust_decimal::{MathematicalOps, RoundingStrategy};

fn number_at(args: &[Value], idx: usize, ctx: &EvaluationContext) -> Result<Decimal, ErrorKind> {
    match args.get(idx) {
        Some(v) => v.coerce_number(ctx.locale()),
        None => Err(ErrorKind::ArgCount),
    }
}

/// SUM(value, ...) - Adds scalars and every numeric cell of range arguments
pub fn fn_sum(args: &[Value], ctx: &EvaluationContext) -> Value {
    let mut sum = Decimal::ZERO;
    let mut overflow = false;

    let walked = for_each_number(args, ctx.locale(), &mut |n| match sum.checked_add(n) {
        Some(s) => sum = s,
        None => overflow = true,
    });

    match walked {
        Err(e) => Value::Error(e),
        Ok(()) if overflow => Value::Error(ErrorKind::Num),
        Ok(()) => Value::Number(sum),
    }
}

/// ABS(number)
pub fn fn_abs(args: &[Value], ctx: &EvaluationContext) -> Value {
    match number_at(args, 0, ctx) {
        Ok(n) => Value::Number(n.abs()),
        Err(e) => Value::Error(e),
    }
}

/// INT(number) - Floors toward negative infinity: INT(-1.2) = -2
pub fn fn_int(args: &[Value], ctx: &EvaluationContext) -> Value {
    match number_at(args, 0, ctx) {
        Ok(n) => Value::Number(n.floor()),
        Err(e) => Value::Error(e),
    }
}

/// ROUND(number, [digits]) - Rounds half away from zero
///
/// Negative digit counts round to the left of the decimal point.
pub fn fn_round(args: &[Value], ctx: &EvaluationContext) -> Value {
    let number = match number_at(args, 0, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };

    let digits = match args.get(1) {
        None => 0,
        Some(Value::Empty) => 0,
        Some(v) => match int_arg(v, ctx.locale()) {
            Ok(d) => d,
            Err(e) => return Value::Error(e),
        },
    };

    match scaled_adjust(number, digits, RoundingStrategy::MidpointAwayFromZero) {
        Ok(n) => Value::Number(n),
        Err(e) => Value::Error(e),
    }
}

/// TRUNC(number, [digits]) - Cuts toward zero: TRUNC(-1.2) = -1
pub fn fn_trunc(args: &[Value], ctx: &EvaluationContext) -> Value {
    let number = match number_at(args, 0, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };

    let digits = match args.get(1) {
        None => 0,
        Some(Value::Empty) => 0,
        Some(v) => match int_arg(v, ctx.locale()) {
            Ok(d) => d,
            Err(e) => return Value::Error(e),
        },
    };

    match scaled_adjust(number, digits, RoundingStrategy::ToZero) {
        Ok(n) => Value::Number(n),
        Err(e) => Value::Error(e),
    }
}

/// Round or truncate at a digit position, including negative positions
fn scaled_adjust(
    number: Decimal,
    digits: i64,
    strategy: RoundingStrategy,
) -> Result<Decimal, ErrorKind> {
    if digits >= 0 {
        // Decimal carries at most 28 fraction digits; beyond that the
        // value is already exact
        if digits > 28 {
            return Ok(number);
        }
        return Ok(number.round_dp_with_strategy(digits as u32, strategy));
    }

    let places = -digits as u32;
    if places > 28 {
        return Ok(Decimal::ZERO);
    }

    let factor = Decimal::from_i128_with_scale(10i128.pow(places), 0);
    let shifted = number.checked_div(factor).ok_or(ErrorKind::Num)?;
    shifted
        .round_dp_with_strategy(0, strategy)
        .checked_mul(factor)
        .ok_or(ErrorKind::Num)
}

/// MOD(number, divisor) - Result takes the sign of the divisor
pub fn fn_mod(args: &[Value], ctx: &EvaluationContext) -> Value {
    let a = match number_at(args, 0, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    let b = match number_at(args, 1, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };

    if b.is_zero() {
        return Value::Error(ErrorKind::Div0);
    }

    let r = match a.checked_rem(b) {
        Some(r) => r,
        None => return Value::Error(ErrorKind::Num),
    };

    if !r.is_zero() && r.is_sign_negative() != b.is_sign_negative() {
        match r.checked_add(b) {
            Some(adjusted) => Value::Number(adjusted),
            None => Value::Error(ErrorKind::Num),
        }
    } else {
        Value::Number(r)
    }
}

/// SIGN(number)
pub fn fn_sign(args: &[Value], ctx: &EvaluationContext) -> Value {
    match number_at(args, 0, ctx) {
        Ok(n) => {
            let sign = if n.is_zero() {
                Decimal::ZERO
            } else if n.is_sign_negative() {
                Decimal::NEGATIVE_ONE
            } else {
                Decimal::ONE
            };
            Value::Number(sign)
        }
        Err(e) => Value::Error(e),
    }
}

/// SQRT(number)
pub fn fn_sqrt(args: &[Value], ctx: &EvaluationContext) -> Value {
    match number_at(args, 0, ctx) {
        Ok(n) if n.is_sign_negative() => Value::Error(ErrorKind::Num),
        Ok(n) => match n.sqrt() {
            Some(root) => Value::Number(root),
            None => Value::Error(ErrorKind::Num),
        },
        Err(e) => Value::Error(e),
    }
}

/// POWER(base, exponent)
pub fn fn_power(args: &[Value], ctx: &EvaluationContext) -> Value {
    let base = match number_at(args, 0, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    let exp = match number_at(args, 1, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };

    match decimal_pow(base, exp) {
        Ok(n) => Value::Number(n),
        Err(e) => Value::Error(e),
    }
}

/// EXP(number) - e raised to the given power
pub fn fn_exp(args: &[Value], ctx: &EvaluationContext) -> Value {
    match number_at(args, 0, ctx) {
        Ok(n) => match decimal_pow(Decimal::E, n) {
            Ok(result) => Value::Number(result),
            Err(e) => Value::Error(e),
        },
        Err(e) => Value::Error(e),
    }
}

/// LN(number)
pub fn fn_ln(args: &[Value], ctx: &EvaluationContext) -> Value {
    match number_at(args, 0, ctx) {
        Ok(n) if n <= Decimal::ZERO => Value::Error(ErrorKind::Num),
        Ok(n) => Value::Number(n.ln()),
        Err(e) => Value::Error(e),
    }
}

/// LOG10(number)
pub fn fn_log10(args: &[Value], ctx: &EvaluationContext) -> Value {
    match number_at(args, 0, ctx) {
        Ok(n) if n <= Decimal::ZERO => Value::Error(ErrorKind::Num),
        Ok(n) => Value::Number(n.log10()),
        Err(e) => Value::Error(e),
    }
}

/// PI()
pub fn fn_pi(_args: &[Value], _ctx: &EvaluationContext) -> Value {
    Value::Number(Decimal::PI)
}
