//! Pivoting flat records into dense row × column grids.

pub mod fill;

use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::Hash,
};
use tracing::{debug, instrument};

use crate::error::{EvalError, Result};

/// Anything usable as a row or column key.
pub trait Key: Clone + Eq + Hash + Ord + fmt::Display {}

impl<T: Clone + Eq + Hash + Ord + fmt::Display> Key for T {}

/// How the keys of one axis are chosen and ordered.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisOrder<K> {
    /// Order of first appearance in the records.
    Natural,
    /// Ascending key order.
    Sorted,
    /// Exactly these keys in this order; others are dropped, unseen ones stay empty.
    Canonical(Vec<K>),
}

/// Resolution for two records landing on the same cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with `EvalError::DuplicateKey` unless the values are identical.
    #[default]
    Reject,
    LastWins,
    Mean,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillPolicy {
    #[default]
    None,
    /// Propagate values down each column; see [`fill::forward_fill`].
    ForwardFill,
}

#[derive(Debug, Clone)]
pub struct PivotOptions<R, C> {
    pub rows: AxisOrder<R>,
    pub columns: AxisOrder<C>,
    pub fill: FillPolicy,
    pub duplicates: DuplicatePolicy,
}

impl<R, C> Default for PivotOptions<R, C> {
    fn default() -> Self {
        Self {
            rows: AxisOrder::Natural,
            columns: AxisOrder::Natural,
            fill: FillPolicy::None,
            duplicates: DuplicatePolicy::Reject,
        }
    }
}

/// A complete grid: every (row, column) pair holds a value or `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<R, C> {
    rows: Vec<R>,
    columns: Vec<C>,
    cells: Vec<Vec<Option<f64>>>,
}

impl<R: Key, C: Key> Table<R, C> {
    /// Builds a table from explicit rows; every row must have one cell per column.
    pub fn from_rows(columns: Vec<C>, rows: Vec<(R, Vec<Option<f64>>)>) -> Result<Self> {
        let mut keys = Vec::with_capacity(rows.len());
        let mut cells = Vec::with_capacity(rows.len());
        for (idx, (key, row)) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(EvalError::Shape {
                    row: idx,
                    len: row.len(),
                    expected: columns.len(),
                });
            }
            keys.push(key);
            cells.push(row);
        }
        Ok(Self {
            rows: keys,
            columns,
            cells,
        })
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn columns(&self) -> &[C] {
        &self.columns
    }

    /// Row-major cells in `rows()` × `columns()` order.
    pub fn cells(&self) -> &[Vec<Option<f64>>] {
        &self.cells
    }

    pub fn get(&self, row: &R, column: &C) -> Option<f64> {
        let r = self.rows.iter().position(|k| k == row)?;
        let c = self.columns.iter().position(|k| k == column)?;
        self.cells[r][c]
    }

    pub fn row(&self, row: &R) -> Result<&[Option<f64>]> {
        let r = self
            .rows
            .iter()
            .position(|k| k == row)
            .ok_or_else(|| EvalError::row(row))?;
        Ok(&self.cells[r])
    }

    /// One column as `(row key, value)` pairs in row order.
    pub fn column(&self, column: &C) -> Result<Vec<(&R, Option<f64>)>> {
        let c = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .zip(&self.cells)
            .map(|(key, row)| (key, row[c]))
            .collect())
    }

    /// A table with only `columns`, in that order.
    pub fn select_columns(&self, columns: &[C]) -> Result<Self> {
        let idx = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rows: self.rows.clone(),
            columns: columns.to_vec(),
            cells: self
                .cells
                .iter()
                .map(|row| idx.iter().map(|&i| row[i]).collect())
                .collect(),
        })
    }

    pub fn forward_fill(&mut self) {
        fill::forward_fill(&mut self.cells);
    }

    fn column_index(&self, column: &C) -> Result<usize> {
        self.columns
            .iter()
            .position(|k| k == column)
            .ok_or_else(|| EvalError::column(column))
    }
}

/// Equality that also treats two NaNs as the same value.
fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

struct Slot {
    last: f64,
    sum: f64,
    count: usize,
}

/// Keys in order of first appearance, with a lookup set.
struct Seen<K> {
    order: Vec<K>,
    set: HashSet<K>,
}

impl<K: Key> Seen<K> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            set: HashSet::new(),
        }
    }

    fn note(&mut self, key: &K) {
        if self.set.insert(key.clone()) {
            self.order.push(key.clone());
        }
    }

    fn resolve(self, order: &AxisOrder<K>, axis: &'static str) -> Vec<K> {
        match order {
            AxisOrder::Natural => self.order,
            AxisOrder::Sorted => {
                let mut keys = self.order;
                keys.sort();
                keys
            }
            AxisOrder::Canonical(list) => {
                let mut unique = HashSet::new();
                let keys: Vec<K> = list.iter().filter(|k| unique.insert(*k)).cloned().collect();
                let dropped = self.order.iter().filter(|k| !unique.contains(k)).count();
                if dropped > 0 {
                    debug!(axis, dropped, "keys outside the canonical order dropped");
                }
                keys
            }
        }
    }
}

/// Group `records` by `(row_key, col_key)` and lay out `value` on a grid.
///
/// A record takes part only if all three functions return `Some`.
#[instrument(level = "debug", skip_all)]
pub fn pivot<'a, T, R, C, I>(
    records: I,
    row_key: impl Fn(&T) -> Option<R>,
    col_key: impl Fn(&T) -> Option<C>,
    value: impl Fn(&T) -> Option<f64>,
    options: &PivotOptions<R, C>,
) -> Result<Table<R, C>>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    R: Key,
    C: Key,
{
    let mut rows = Seen::new();
    let mut columns = Seen::new();
    let mut slots: HashMap<(R, C), Slot> = HashMap::new();
    let mut skipped = 0usize;

    for record in records {
        let (Some(r), Some(c), Some(v)) = (row_key(record), col_key(record), value(record)) else {
            skipped += 1;
            continue;
        };
        rows.note(&r);
        columns.note(&c);
        match slots.get_mut(&(r.clone(), c.clone())) {
            None => {
                slots.insert(
                    (r, c),
                    Slot {
                        last: v,
                        sum: v,
                        count: 1,
                    },
                );
            }
            Some(slot) => {
                if options.duplicates == DuplicatePolicy::Reject && !same_value(slot.last, v) {
                    return Err(EvalError::DuplicateKey {
                        row: r.to_string(),
                        column: c.to_string(),
                        first: slot.last,
                        second: v,
                    });
                }
                slot.last = v;
                slot.sum += v;
                slot.count += 1;
            }
        }
    }

    let rows = rows.resolve(&options.rows, "rows");
    let columns = columns.resolve(&options.columns, "columns");
    let mean = options.duplicates == DuplicatePolicy::Mean;

    let cells = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| {
                    slots.get(&(r.clone(), c.clone())).map(|slot| {
                        if mean {
                            slot.sum / slot.count as f64
                        } else {
                            slot.last
                        }
                    })
                })
                .collect()
        })
        .collect();

    let mut table = Table {
        rows,
        columns,
        cells,
    };
    if options.fill == FillPolicy::ForwardFill {
        table.forward_fill();
    }
    debug!(
        rows = table.rows.len(),
        columns = table.columns.len(),
        skipped,
        "pivot finished"
    );
    Ok(table)
}
