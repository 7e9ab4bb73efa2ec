//! Categorical encoder: one indicator column per distinct category
//!
//! Environmental columns come first in their declared order, followed by one
//! indicator column per category in ascending `CategoryId` order. The
//! `CategoryIndex` is the authoritative category <-> column mapping; column
//! names are labels only and are never parsed back.

use std::collections::HashSet;

use crate::models::{CategoryId, ObservationBatch};

/// Bijection between category ids and indicator positions, built once per batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryIndex {
    categories: Vec<CategoryId>,
}

impl CategoryIndex {
    pub fn from_batch(batch: &ObservationBatch) -> Self {
        Self {
            categories: batch.distinct_categories(),
        }
    }

    /// Indicator position for a category
    pub fn position(&self, id: &CategoryId) -> Option<usize> {
        self.categories.binary_search(id).ok()
    }

    /// Category at an indicator position
    pub fn category(&self, position: usize) -> Option<&CategoryId> {
        self.categories.get(position)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryId> {
        self.categories.iter()
    }
}

/// What a column of the encoded table holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Index into the batch's declared variable list
    Environmental { variable: usize },
    /// Position in the `CategoryIndex`
    Indicator { category: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Option<f64>>,
}

/// Rectangular, column-major table produced by [`encode`]
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTable {
    columns: Vec<Column>,
    categories: CategoryIndex,
    rows: usize,
}

impl EncodedTable {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    /// (column index, variable name) for each environmental column, declared order
    pub fn environmental_columns(&self) -> impl Iterator<Item = (usize, &str)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c.kind, ColumnKind::Environmental { .. }))
            .map(|(i, c)| (i, c.name.as_str()))
    }

    /// (column index, category) for each indicator column, ascending category order
    pub fn indicator_columns(&self) -> impl Iterator<Item = (usize, &CategoryId)> {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| match c.kind {
                ColumnKind::Indicator { category } => {
                    self.categories.category(category).map(|id| (i, id))
                }
                ColumnKind::Environmental { .. } => None,
            })
    }

    /// Fewer than two categories: indicator correlations carry no signal
    pub fn is_degenerate(&self) -> bool {
        self.categories.len() <= 1
    }
}

/// Deterministic indicator column name for a category
pub fn indicator_column_name(id: &CategoryId) -> String {
    match id {
        CategoryId::Number(n) => format!("category_{}", n),
        CategoryId::Name(s) => format!("category_name_{}", s),
    }
}

/// One-hot encode the category column of a batch
///
/// Environmental readings pass through untouched (missing stays missing).
pub fn encode(batch: &ObservationBatch) -> EncodedTable {
    let categories = CategoryIndex::from_batch(batch);
    let rows = batch.len();

    let mut seen = HashSet::new();
    let mut variables = Vec::with_capacity(batch.variables.len());
    for (variable, name) in batch.variables.iter().enumerate() {
        if seen.insert(name.as_str()) {
            variables.push((variable, name));
        }
    }

    let mut columns = Vec::with_capacity(variables.len() + categories.len());
    let mut taken: HashSet<String> = HashSet::new();

    for (variable, name) in variables {
        let values = batch.observations.iter().map(|o| o.reading(name)).collect();
        taken.insert(name.clone());
        columns.push(Column {
            name: name.clone(),
            kind: ColumnKind::Environmental { variable },
            values,
        });
    }

    for (position, id) in categories.iter().enumerate() {
        let values = batch
            .observations
            .iter()
            .map(|o| Some(if &o.category == id { 1.0 } else { 0.0 }))
            .collect();

        let mut name = indicator_column_name(id);
        while taken.contains(&name) {
            name.insert(0, '_');
        }
        taken.insert(name.clone());

        columns.push(Column {
            name,
            kind: ColumnKind::Indicator { category: position },
            values,
        });
    }

    EncodedTable {
        columns,
        categories,
        rows,
    }
}
