//! Date and time functions
//!
//! Results are proper [`Value::Date`] values with the right flavor, not
//! serial numbers; the locale decides how they render.

use super::int_arg;
use crate::context::EvaluationContext;
use broadsheet_core::{DateValue, Decimal, ErrorKind, Value};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

fn int_at(args: &[Value], idx: usize, ctx: &EvaluationContext) -> Result<i64, ErrorKind> {
    match args.get(idx) {
        Some(v) => int_arg(v, ctx.locale()),
        None => Err(ErrorKind::ArgCount),
    }
}

fn date_at(args: &[Value], idx: usize) -> Result<DateValue, ErrorKind> {
    match args.get(idx) {
        Some(Value::Date(d)) => Ok(*d),
        Some(Value::Error(e)) => Err(*e),
        Some(_) => Err(ErrorKind::Value),
        None => Err(ErrorKind::ArgCount),
    }
}

/// DATE(year, month, day)
///
/// Out-of-range months and days roll over the way spreadsheets expect:
/// DATE(2020, 13, 1) is January 2021, DATE(2020, 1, 32) is February 1st.
pub fn fn_date(args: &[Value], ctx: &EvaluationContext) -> Value {
    let year = match int_at(args, 0, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    let month = match int_at(args, 1, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    let day = match int_at(args, 2, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };

    // Normalize the month first, then roll day overflow through the calendar
    let months_total = year.checked_mul(12).and_then(|m| m.checked_add(month - 1));
    let months_total = match months_total {
        Some(m) => m,
        None => return Value::Error(ErrorKind::Num),
    };
    let norm_year = months_total.div_euclid(12);
    let norm_month = months_total.rem_euclid(12) as u32 + 1;

    if norm_year < i32::MIN as i64 || norm_year > i32::MAX as i64 {
        return Value::Error(ErrorKind::Num);
    }

    let first = match NaiveDate::from_ymd_opt(norm_year as i32, norm_month, 1) {
        Some(d) => d,
        None => return Value::Error(ErrorKind::Num),
    };

    match first.checked_add_signed(Duration::days(day - 1)) {
        Some(date) => Value::Date(DateValue::from_date(date)),
        None => Value::Error(ErrorKind::Num),
    }
}

/// TIME(hour, minute, second) - Wraps past midnight
pub fn fn_time(args: &[Value], ctx: &EvaluationContext) -> Value {
    let hour = match int_at(args, 0, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    let minute = match int_at(args, 1, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    let second = match int_at(args, 2, ctx) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };

    let total = hour * 3600 + minute * 60 + second;
    if total < 0 {
        return Value::Error(ErrorKind::Num);
    }
    let of_day = (total % 86_400) as u32;

    match NaiveTime::from_num_seconds_from_midnight_opt(of_day, 0) {
        Some(time) => Value::Date(DateValue::from_time(time)),
        None => Value::Error(ErrorKind::Num),
    }
}

/// YEAR(date)
pub fn fn_year(args: &[Value], _ctx: &EvaluationContext) -> Value {
    match date_at(args, 0) {
        Ok(d) => Value::Number(Decimal::from(d.date().year())),
        Err(e) => Value::Error(e),
    }
}

/// MONTH(date)
pub fn fn_month(args: &[Value], _ctx: &EvaluationContext) -> Value {
    match date_at(args, 0) {
        Ok(d) => Value::Number(Decimal::from(d.date().month())),
        Err(e) => Value::Error(e),
    }
}

/// DAY(date)
pub fn fn_day(args: &[Value], _ctx: &EvaluationContext) -> Value {
    match date_at(args, 0) {
        Ok(d) => Value::Number(Decimal::from(d.date().day())),
        Err(e) => Value::Error(e),
    }
}

/// WEEKDAY(date) - 1 = Sunday through 7 = Saturday
pub fn fn_weekday(args: &[Value], _ctx: &EvaluationContext) -> Value {
    match date_at(args, 0) {
        Ok(d) => {
            let n = d.date().weekday().num_days_from_sunday() + 1;
            Value::Number(Decimal::from(n))
        }
        Err(e) => Value::Error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadsheet_core::DateFlavor;

    fn ctx() -> EvaluationContext<'static> {
        EvaluationContext::detached()
    }

    fn num(n: i64) -> Value {
        Value::Number(Decimal::from(n))
    }

    fn ymd(y: i32, m: u32, d: u32) -> Value {
        Value::Date(DateValue::from_date(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        ))
    }

    #[test]
    fn test_date() {
        assert_eq!(fn_date(&[num(2024), num(3), num(15)], &ctx()), ymd(2024, 3, 15));
    }

    #[test]
    fn test_date_rolls_over() {
        assert_eq!(fn_date(&[num(2020), num(13), num(1)], &ctx()), ymd(2021, 1, 1));
        assert_eq!(fn_date(&[num(2020), num(1), num(32)], &ctx()), ymd(2020, 2, 1));
        assert_eq!(fn_date(&[num(2020), num(0), num(1)], &ctx()), ymd(2019, 12, 1));
    }

    #[test]
    fn test_time_wraps() {
        let v = fn_time(&[num(25), num(30), num(0)], &ctx());
        match v {
            Value::Date(d) => {
                assert_eq!(d.flavor, DateFlavor::Time);
                assert_eq!(d.time(), NaiveTime::from_hms_opt(1, 30, 0).unwrap());
            }
            other => panic!("expected time value, got {:?}", other),
        }
    }

    #[test]
    fn test_component_extraction() {
        let date = ymd(2024, 3, 15);
        assert_eq!(fn_year(&[date.clone()], &ctx()), num(2024));
        assert_eq!(fn_month(&[date.clone()], &ctx()), num(3));
        assert_eq!(fn_day(&[date.clone()], &ctx()), num(15));
        // 2024-03-15 is a Friday
        assert_eq!(fn_weekday(&[date], &ctx()), num(6));
    }

    #[test]
    fn test_component_of_non_date() {
        assert_eq!(
            fn_year(&[Value::text("2024")], &ctx()),
            Value::Error(ErrorKind::Value)
        );
    }
}
