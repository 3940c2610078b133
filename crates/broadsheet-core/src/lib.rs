//! # broadsheet-core
//!
//! Core data types for the broadsheet report formula engine.
//!
//! This crate provides the fundamental types the formula interpreter and its
//! callers share:
//! - [`Value`] - The tagged value union (numbers, text, logicals, dates,
//!   errors, arrays, empty) with spreadsheet-compatible coercion rules
//! - [`ErrorKind`] - Semantic error codes that flow through evaluation as
//!   ordinary values
//! - [`CellAddress`] and [`CellRange`] - Record addressing and ranges
//! - [`Locale`] - Locale-sensitive number and date rendering
//!
//! ## Example
//!
//! ```rust
//! use broadsheet_core::{Locale, Value};
//!
//! let locale = Locale::en_us();
//! let v = Value::text("2.5");
//! assert_eq!(v.coerce_number(&locale), Ok("2.5".parse().unwrap()));
//! ```

pub mod address;
pub mod date;
pub mod error;
pub mod locale;
pub mod value;

// Re-exports for convenience
pub use address::{CellAddress, CellRange};
pub use date::{DateFlavor, DateValue};
pub use error::{Error, Result};
pub use locale::Locale;
pub use value::{ErrorKind, Value};

// The decimal type is part of the public value API
pub use rust_decimal::Decimal;

/// Maximum number of rows in a record grid
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a record grid
pub const MAX_COLS: u16 = 16_384;
