//! Locale-sensitive number and date rendering
//!
//! Report text output depends on the locale of the surrounding document:
//! the decimal separator, the digit-group separator, and the date patterns.
//! The evaluator converts between [`Decimal`] and display text exclusively
//! through a [`Locale`], so a number formatted in one locale re-parses to an
//! equal number in the same locale.

use crate::date::{DateFlavor, DateValue};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Number and date rendering rules for one locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// Separator between integer and fraction digits
    pub decimal_separator: char,
    /// Separator between digit groups (ignored on parse)
    pub group_separator: char,
    date_pattern: &'static str,
    time_pattern: &'static str,
    datetime_pattern: &'static str,
}

impl Locale {
    /// United States English (`1234.5`, `3/15/2024`)
    pub fn en_us() -> Self {
        Self {
            decimal_separator: '.',
            group_separator: ',',
            date_pattern: "%m/%d/%Y",
            time_pattern: "%H:%M:%S",
            datetime_pattern: "%m/%d/%Y %H:%M:%S",
        }
    }

    /// German (`1234,5`, `15.03.2024`)
    pub fn de_de() -> Self {
        Self {
            decimal_separator: ',',
            group_separator: '.',
            date_pattern: "%d.%m.%Y",
            time_pattern: "%H:%M:%S",
            datetime_pattern: "%d.%m.%Y %H:%M:%S",
        }
    }

    /// French (`1234,5`, `15/03/2024`)
    pub fn fr_fr() -> Self {
        Self {
            decimal_separator: ',',
            group_separator: ' ',
            date_pattern: "%d/%m/%Y",
            time_pattern: "%H:%M:%S",
            datetime_pattern: "%d/%m/%Y %H:%M:%S",
        }
    }

    /// Render a number in its general display form
    ///
    /// Trailing fraction zeros are dropped (`0.900` renders as `0.9`), and
    /// no digit grouping is applied; this is the form text concatenation
    /// sees.
    pub fn format_number(&self, n: &Decimal) -> String {
        let plain = n.normalize().to_string();
        if self.decimal_separator == '.' {
            plain
        } else {
            plain.replace('.', &self.decimal_separator.to_string())
        }
    }

    /// Parse display text back into a number
    ///
    /// Group separators are ignored wherever they appear; scientific
    /// notation is accepted. Returns `None` when the text is not a number
    /// in this locale.
    pub fn parse_number(&self, text: &str) -> Option<Decimal> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut normalized = String::with_capacity(text.len());
        for c in text.chars() {
            if c == self.group_separator {
                continue;
            } else if c == self.decimal_separator {
                normalized.push('.');
            } else {
                normalized.push(c);
            }
        }

        if normalized.contains(['e', 'E']) {
            Decimal::from_scientific(&normalized).ok()
        } else {
            Decimal::from_str(&normalized).ok()
        }
    }

    /// Render a calendar value according to its flavor
    pub fn format_date(&self, d: &DateValue) -> String {
        let pattern = match d.flavor {
            DateFlavor::Date => self.date_pattern,
            DateFlavor::Time => self.time_pattern,
            DateFlavor::DateTime => self.datetime_pattern,
        };
        d.datetime.format(pattern).to_string()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::en_us()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_number_general_form() {
        let l = Locale::en_us();
        assert_eq!(l.format_number(&Decimal::from(14)), "14");
        assert_eq!(l.format_number(&"0.900".parse().unwrap()), "0.9");
        assert_eq!(l.format_number(&"-2.5".parse().unwrap()), "-2.5");
    }

    #[test]
    fn test_format_number_separator() {
        let l = Locale::de_de();
        assert_eq!(l.format_number(&"3.14".parse().unwrap()), "3,14");
    }

    #[test]
    fn test_parse_number_locale_separators() {
        let us = Locale::en_us();
        assert_eq!(us.parse_number("1,234.5"), Some("1234.5".parse().unwrap()));

        let de = Locale::de_de();
        assert_eq!(de.parse_number("1.234,5"), Some("1234.5".parse().unwrap()));

        assert_eq!(us.parse_number("abc"), None);
        assert_eq!(us.parse_number(""), None);
    }

    #[test]
    fn test_parse_number_scientific() {
        let l = Locale::en_us();
        assert_eq!(l.parse_number("1e3"), Some(Decimal::from(1000)));
    }

    #[test]
    fn test_number_round_trip() {
        for l in [Locale::en_us(), Locale::de_de(), Locale::fr_fr()] {
            for s in ["0", "14", "-2.5", "1234.567", "0.0001"] {
                let n: Decimal = s.parse().unwrap();
                let formatted = l.format_number(&n);
                assert_eq!(l.parse_number(&formatted), Some(n), "locale round trip for {s}");
            }
        }
    }

    #[test]
    fn test_format_date() {
        let d = DateValue::from_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(Locale::en_us().format_date(&d), "03/15/2024");
        assert_eq!(Locale::de_de().format_date(&d), "15.03.2024");
    }
}
