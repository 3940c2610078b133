//! Evaluation context and record access
//!
//! The interpreter owns no data. The surrounding document pipeline
//! implements [`RecordSource`] over whatever feeds the report (a result
//! set, a materialized grid, another document) and hands the evaluator an
//! [`EvaluationContext`] per unit of work - typically one per record. The
//! evaluator only ever reads through the context and never retains it.

use crate::ast::RangeReference;
use broadsheet_core::{CellAddress, ErrorKind, Locale, Value};
use std::cell::Cell;

/// Bound on nested evaluation through formula-backed names
///
/// Exceeding it yields `#N/A` instead of unbounded recursion.
pub const MAX_EVAL_DEPTH: u32 = 64;

/// What a named reference resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum NameDefinition {
    /// A plain value
    Value(Value),
    /// A formula evaluated on demand, in the current context
    Formula(String),
}

/// Caller-supplied access to the current record's data
///
/// Sheet partitions are indexed in a stable order; `sheet_index` maps a
/// partition name from a qualified reference to its slot. `value_at` is
/// only called for cells inside the declared `bounds`.
pub trait RecordSource {
    /// Number of sheet partitions in the record
    fn sheet_count(&self) -> usize;

    /// Look up a partition by name, case-insensitive
    fn sheet_index(&self, name: &str) -> Option<usize>;

    /// (rows, columns) of a partition, or `None` for an invalid index
    fn bounds(&self, sheet: usize) -> Option<(u32, u16)>;

    /// Value of an in-bounds cell; `Value::Empty` where nothing is set
    fn value_at(&self, sheet: usize, row: u32, col: u16) -> Value;

    /// Resolve a named reference, if this source has any
    fn resolve_name(&self, name: &str) -> Option<NameDefinition> {
        let _ = name;
        None
    }
}

/// Context for one unit of evaluation work
///
/// Create one per record (or reset between records); contexts are never
/// shared between concurrent evaluations. The bound tree and the registry
/// are the shareable parts.
pub struct EvaluationContext<'a> {
    source: Option<&'a dyn RecordSource>,
    current_sheet: usize,
    locale: Locale,
    depth: Cell<u32>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context over a record source
    pub fn new(source: &'a dyn RecordSource) -> Self {
        Self {
            source: Some(source),
            current_sheet: 0,
            locale: Locale::default(),
            depth: Cell::new(0),
        }
    }

    /// Create a context with no record bound
    ///
    /// Every reference evaluates to `#N/A`; literals and functions still
    /// work. Useful for constant formulas and tests.
    pub fn detached() -> Self {
        Self {
            source: None,
            current_sheet: 0,
            locale: Locale::default(),
            depth: Cell::new(0),
        }
    }

    /// Set the locale used for text/number conversion and rendering
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Set the partition unqualified references resolve against
    pub fn with_current_sheet(mut self, sheet: usize) -> Self {
        self.current_sheet = sheet;
        self
    }

    /// The context's locale
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// The partition unqualified references resolve against
    pub fn current_sheet(&self) -> usize {
        self.current_sheet
    }

    /// Resolve a single cell reference to its value
    ///
    /// No bound record yields `#N/A`; an unknown partition or an address
    /// outside the record's bounds yields `#REF!`.
    pub fn resolve_cell(&self, sheet: Option<&str>, address: &CellAddress) -> Value {
        let source = match self.source {
            Some(s) => s,
            None => return Value::Error(ErrorKind::Na),
        };

        let sheet_idx = match sheet {
            Some(name) => match source.sheet_index(name) {
                Some(idx) => idx,
                None => return Value::Error(ErrorKind::Ref),
            },
            None => self.current_sheet,
        };

        let (rows, cols) = match source.bounds(sheet_idx) {
            Some(b) => b,
            None => return Value::Error(ErrorKind::Ref),
        };

        if address.row >= rows || address.col >= cols {
            return Value::Error(ErrorKind::Ref);
        }

        source.value_at(sheet_idx, address.row, address.col)
    }

    /// Resolve a range reference to an array value
    ///
    /// A cross-partition range stacks each partition's rectangle top to
    /// bottom, in partition order. Bounds failures follow
    /// [`resolve_cell`](Self::resolve_cell).
    pub fn resolve_range(&self, range_ref: &RangeReference) -> Value {
        let source = match self.source {
            Some(s) => s,
            None => return Value::Error(ErrorKind::Na),
        };

        let start_idx = match range_ref.start_sheet.as_deref() {
            Some(name) => match source.sheet_index(name) {
                Some(idx) => idx,
                None => return Value::Error(ErrorKind::Ref),
            },
            None => self.current_sheet,
        };

        let end_idx = match range_ref.end_sheet.as_deref() {
            Some(name) => match source.sheet_index(name) {
                Some(idx) => idx,
                None => return Value::Error(ErrorKind::Ref),
            },
            None => start_idx,
        };

        let (first, last) = if start_idx <= end_idx {
            (start_idx, end_idx)
        } else {
            (end_idx, start_idx)
        };

        let range = &range_ref.range;
        let mut rows_out = Vec::new();

        for sheet in first..=last {
            let (rows, cols) = match source.bounds(sheet) {
                Some(b) => b,
                None => return Value::Error(ErrorKind::Ref),
            };

            if range.end.row >= rows || range.end.col >= cols {
                return Value::Error(ErrorKind::Ref);
            }

            for row in range.start.row..=range.end.row {
                let mut row_out = Vec::with_capacity(range.col_count() as usize);
                for col in range.start.col..=range.end.col {
                    row_out.push(source.value_at(sheet, row, col));
                }
                rows_out.push(row_out);
            }
        }

        Value::Array(rows_out)
    }

    /// Resolve a named reference through the record source
    pub fn resolve_name(&self, name: &str) -> Option<NameDefinition> {
        self.source.and_then(|s| s.resolve_name(name))
    }

    /// Enter a nested evaluation; `false` when the depth bound is hit
    pub(crate) fn enter(&self) -> bool {
        let depth = self.depth.get();
        if depth >= MAX_EVAL_DEPTH {
            return false;
        }
        self.depth.set(depth + 1);
        true
    }

    /// Leave a nested evaluation
    pub(crate) fn leave(&self) {
        let depth = self.depth.get();
        self.depth.set(depth.saturating_sub(1));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Grid-backed record source for tests
    pub(crate) struct GridSource {
        pub sheets: Vec<(String, Vec<Vec<Value>>)>,
        pub names: Vec<(String, NameDefinition)>,
    }

    impl GridSource {
        /// One unnamed-ish partition called "Records"
        pub fn single(rows: Vec<Vec<Value>>) -> Self {
            Self {
                sheets: vec![("Records".to_string(), rows)],
                names: Vec::new(),
            }
        }
    }

    impl RecordSource for GridSource {
        fn sheet_count(&self) -> usize {
            self.sheets.len()
        }

        fn sheet_index(&self, name: &str) -> Option<usize> {
            self.sheets
                .iter()
                .position(|(n, _)| n.eq_ignore_ascii_case(name))
        }

        fn bounds(&self, sheet: usize) -> Option<(u32, u16)> {
            self.sheets.get(sheet).map(|(_, rows)| {
                let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
                (rows.len() as u32, cols as u16)
            })
        }

        fn value_at(&self, sheet: usize, row: u32, col: u16) -> Value {
            self.sheets
                .get(sheet)
                .and_then(|(_, rows)| rows.get(row as usize))
                .and_then(|r| r.get(col as usize))
                .cloned()
                .unwrap_or(Value::Empty)
        }

        fn resolve_name(&self, name: &str) -> Option<NameDefinition> {
            self.names
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, d)| d.clone())
        }
    }
}
