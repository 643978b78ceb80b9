//! Sparse coefficient matrices with row and column indices.
//!
//! [`PairIndex`] is the shared building block: a set of `(row, column)` keys
//! reachable from either side. [`SparseMatrix`] pairs it with a value map for
//! the constraint/variable incidence matrix, and [`SymmetricMatrix`] does the
//! same for quadratic terms whose keys are unordered pairs. Every mutation
//! updates the value map and both sides of the index before returning, and a
//! zero coefficient is never stored.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Set of `(row, column)` pairs indexed from both sides.
#[derive(Debug, Clone)]
pub struct PairIndex<R, C> {
    by_row: HashMap<R, BTreeSet<C>>,
    by_column: HashMap<C, BTreeSet<R>>,
    len: usize,
}

impl<R, C> PairIndex<R, C>
where
    R: Copy + Ord + Hash,
    C: Copy + Ord + Hash,
{
    pub fn new() -> Self {
        Self {
            by_row: HashMap::new(),
            by_column: HashMap::new(),
            len: 0,
        }
    }

    /// Returns true if the pair was not already present.
    pub fn insert(&mut self, row: R, column: C) -> bool {
        let inserted = self.by_row.entry(row).or_default().insert(column);
        if inserted {
            self.by_column.entry(column).or_default().insert(row);
            self.len += 1;
        }
        inserted
    }

    /// Returns true if the pair was present.
    pub fn remove(&mut self, row: R, column: C) -> bool {
        let Some(columns) = self.by_row.get_mut(&row) else {
            return false;
        };
        if !columns.remove(&column) {
            return false;
        }
        if columns.is_empty() {
            self.by_row.remove(&row);
        }
        let rows_emptied = match self.by_column.get_mut(&column) {
            Some(rows) => {
                rows.remove(&row);
                rows.is_empty()
            }
            None => false,
        };
        if rows_emptied {
            self.by_column.remove(&column);
        }
        self.len -= 1;
        true
    }

    pub fn contains(&self, row: R, column: C) -> bool {
        self.by_row
            .get(&row)
            .is_some_and(|columns| columns.contains(&column))
    }

    /// Columns present in `row`, ascending.
    pub fn row(&self, row: R) -> impl Iterator<Item = C> + '_ {
        self.by_row.get(&row).into_iter().flatten().copied()
    }

    /// Rows present in `column`, ascending.
    pub fn column(&self, column: C) -> impl Iterator<Item = R> + '_ {
        self.by_column.get(&column).into_iter().flatten().copied()
    }

    /// Remove every pair in `row`, returning the columns it touched.
    pub fn remove_row(&mut self, row: R) -> Vec<C> {
        let Some(columns) = self.by_row.remove(&row) else {
            return Vec::new();
        };
        for column in &columns {
            let emptied = match self.by_column.get_mut(column) {
                Some(rows) => {
                    rows.remove(&row);
                    rows.is_empty()
                }
                None => false,
            };
            if emptied {
                self.by_column.remove(column);
            }
        }
        self.len -= columns.len();
        columns.into_iter().collect()
    }

    /// Remove every pair in `column`, returning the rows it touched.
    pub fn remove_column(&mut self, column: C) -> Vec<R> {
        let Some(rows) = self.by_column.remove(&column) else {
            return Vec::new();
        };
        for row in &rows {
            let emptied = match self.by_row.get_mut(row) {
                Some(columns) => {
                    columns.remove(&column);
                    columns.is_empty()
                }
                None => false,
            };
            if emptied {
                self.by_row.remove(row);
            }
        }
        self.len -= rows.len();
        rows.into_iter().collect()
    }

    /// All pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (R, C)> + '_ {
        self.by_row
            .iter()
            .flat_map(|(row, columns)| columns.iter().map(move |column| (*row, *column)))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut count = 0;
        for (row, columns) in &self.by_row {
            assert!(!columns.is_empty());
            for column in columns {
                assert!(self.by_column[column].contains(row));
                count += 1;
            }
        }
        for (column, rows) in &self.by_column {
            assert!(!rows.is_empty());
            for row in rows {
                assert!(self.by_row[row].contains(column));
            }
        }
        assert_eq!(count, self.len);
    }
}

impl<R, C> Default for PairIndex<R, C>
where
    R: Copy + Ord + Hash,
    C: Copy + Ord + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Sparse `(row, column) -> coefficient` map. Absent means zero.
#[derive(Debug, Clone)]
pub struct SparseMatrix<R, C> {
    values: HashMap<(R, C), f64>,
    index: PairIndex<R, C>,
}

impl<R, C> SparseMatrix<R, C>
where
    R: Copy + Ord + Hash,
    C: Copy + Ord + Hash,
{
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            index: PairIndex::new(),
        }
    }

    pub fn get(&self, row: R, column: C) -> f64 {
        self.values.get(&(row, column)).copied().unwrap_or(0.0)
    }

    /// Set a coefficient; zero erases the entry. Returns true if the stored
    /// value changed.
    pub fn set(&mut self, row: R, column: C, value: f64) -> bool {
        if value == 0.0 {
            if self.values.remove(&(row, column)).is_some() {
                self.index.remove(row, column);
                return true;
            }
            return false;
        }
        match self.values.insert((row, column), value) {
            Some(previous) => previous != value,
            None => {
                self.index.insert(row, column);
                true
            }
        }
    }

    /// Columns with a nonzero entry in `row`, ascending.
    pub fn row_entries(&self, row: R) -> impl Iterator<Item = C> + '_ {
        self.index.row(row)
    }

    /// Rows with a nonzero entry in `column`, ascending.
    pub fn column_entries(&self, column: C) -> impl Iterator<Item = R> + '_ {
        self.index.column(column)
    }

    pub fn row(&self, row: R) -> Vec<(C, f64)> {
        self.index
            .row(row)
            .map(|column| (column, self.get(row, column)))
            .collect()
    }

    pub fn column(&self, column: C) -> Vec<(R, f64)> {
        self.index
            .column(column)
            .map(|row| (row, self.get(row, column)))
            .collect()
    }

    /// Erase every entry in `row`, returning the columns it touched.
    pub fn delete_row(&mut self, row: R) -> Vec<C> {
        let columns = self.index.remove_row(row);
        for column in &columns {
            self.values.remove(&(row, *column));
        }
        columns
    }

    /// Erase every entry in `column`, returning the rows it touched.
    pub fn delete_column(&mut self, column: C) -> Vec<R> {
        let rows = self.index.remove_column(column);
        for row in &rows {
            self.values.remove(&(*row, column));
        }
        rows
    }

    /// All entries in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = (R, C, f64)> + '_ {
        self.values
            .iter()
            .map(|((row, column), value)| (*row, *column, *value))
    }

    /// All entries in row-major order.
    pub fn sorted_entries(&self) -> Vec<(R, C, f64)> {
        let mut entries: Vec<(R, C, f64)> = self.entries().collect();
        entries.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        entries
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.index.assert_consistent();
        assert_eq!(self.index.len(), self.values.len());
        for ((row, column), value) in &self.values {
            assert!(*value != 0.0);
            assert!(self.index.contains(*row, *column));
        }
    }
}

impl<R, C> Default for SparseMatrix<R, C>
where
    R: Copy + Ord + Hash,
    C: Copy + Ord + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Orders an unordered pair so `(a, b)` and `(b, a)` share one key.
pub fn symmetric_key<V: Ord>(first: V, second: V) -> (V, V) {
    if first <= second {
        (first, second)
    } else {
        (second, first)
    }
}

/// Sparse symmetric matrix keyed by unordered pairs.
#[derive(Debug, Clone)]
pub struct SymmetricMatrix<V> {
    inner: SparseMatrix<V, V>,
}

impl<V> SymmetricMatrix<V>
where
    V: Copy + Ord + Hash,
{
    pub fn new() -> Self {
        Self {
            inner: SparseMatrix::new(),
        }
    }

    pub fn get(&self, first: V, second: V) -> f64 {
        let (lo, hi) = symmetric_key(first, second);
        self.inner.get(lo, hi)
    }

    /// Returns true if the stored value changed.
    pub fn set(&mut self, first: V, second: V, value: f64) -> bool {
        let (lo, hi) = symmetric_key(first, second);
        self.inner.set(lo, hi, value)
    }

    /// Every variable sharing a nonzero entry with `variable`, ascending.
    pub fn related(&self, variable: V) -> Vec<V> {
        let partners: BTreeSet<V> = self
            .inner
            .row_entries(variable)
            .chain(self.inner.column_entries(variable))
            .collect();
        partners.into_iter().collect()
    }

    /// Erase every entry touching `variable`, returning its former partners.
    pub fn delete_variable(&mut self, variable: V) -> Vec<V> {
        let mut partners: BTreeSet<V> = self.inner.delete_row(variable).into_iter().collect();
        partners.extend(self.inner.delete_column(variable));
        partners.into_iter().collect()
    }

    /// Entries as `(lo, hi, value)` with `lo <= hi`, sorted.
    pub fn sorted_entries(&self) -> Vec<(V, V, f64)> {
        self.inner.sorted_entries()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.inner.assert_consistent();
        for (lo, hi, _) in self.inner.entries() {
            assert!(lo <= hi);
        }
    }
}

impl<V> Default for SymmetricMatrix<V>
where
    V: Copy + Ord + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PartialEq for SymmetricMatrix<V>
where
    V: Copy + Ord + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner.values == other.inner.values
    }
}
