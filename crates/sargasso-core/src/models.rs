//! Data models for Sargasso

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category key of an observation (species id, label, etc.)
///
/// Integer keys sort before string keys; within a kind the natural order
/// applies. This order drives indicator column layout and tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryId {
    Number(i64),
    Name(String),
}

impl CategoryId {
    /// Parse a raw cell value, preferring an integer key when the text is one
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match raw.parse::<i64>() {
            Ok(n) => CategoryId::Number(n),
            Err(_) => CategoryId::Name(raw.to_string()),
        })
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryId::Number(n) => write!(f, "{}", n),
            CategoryId::Name(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for CategoryId {
    fn from(value: i64) -> Self {
        CategoryId::Number(value)
    }
}

impl From<i32> for CategoryId {
    fn from(value: i32) -> Self {
        CategoryId::Number(value.into())
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        CategoryId::Name(value.to_string())
    }
}

impl From<String> for CategoryId {
    fn from(value: String) -> Self {
        CategoryId::Name(value)
    }
}

/// One row of a category label table (species id -> name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub id: CategoryId,
    pub name: String,
}

/// A single observation: one category plus its environmental readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub category: CategoryId,
    /// Environmental variable name -> reading (None = recorded as missing)
    #[serde(default)]
    pub readings: BTreeMap<String, Option<f64>>,
}

impl Observation {
    pub fn new(category: impl Into<CategoryId>) -> Self {
        Self {
            category: category.into(),
            readings: BTreeMap::new(),
        }
    }

    /// Builder-style helper for adding a reading
    pub fn with_reading(mut self, name: &str, value: impl Into<Option<f64>>) -> Self {
        self.readings.insert(name.to_string(), value.into());
        self
    }

    /// Record a variable as explicitly missing
    pub fn with_missing(mut self, name: &str) -> Self {
        self.readings.insert(name.to_string(), None);
        self
    }

    /// Reading for a variable; absent and null are both `None`
    pub fn reading(&self, name: &str) -> Option<f64> {
        self.readings.get(name).copied().flatten()
    }
}

/// A request-scoped batch of observations with a declared variable order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationBatch {
    /// Environmental variables in their fixed declared order
    pub variables: Vec<String>,
    pub observations: Vec<Observation>,
}

impl ObservationBatch {
    pub fn new(variables: Vec<String>) -> Self {
        Self {
            variables,
            observations: Vec::new(),
        }
    }

    /// Build a batch, declaring variables as the sorted union of all reading names
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let variables: BTreeSet<&String> =
            observations.iter().flat_map(|o| o.readings.keys()).collect();
        let variables = variables.into_iter().cloned().collect();
        Self {
            variables,
            observations,
        }
    }

    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Distinct categories in ascending order
    pub fn distinct_categories(&self) -> Vec<CategoryId> {
        let set: BTreeSet<&CategoryId> = self.observations.iter().map(|o| &o.category).collect();
        set.into_iter().cloned().collect()
    }
}

/// The strongest category/variable association found in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub environmental_variable: String,
    pub category_id: CategoryId,
    /// Signed Pearson coefficient
    pub correlation_coefficient: f64,
    /// Human-readable category label, when the source knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_label: Option<String>,
}

impl Finding {
    /// "positive" or "negative" (zero counts as positive)
    pub fn direction(&self) -> &'static str {
        if self.correlation_coefficient < 0.0 {
            "negative"
        } else {
            "positive"
        }
    }

    /// Label to show humans: the resolved label, or the raw id
    pub fn display_category(&self) -> String {
        self.category_label
            .clone()
            .unwrap_or_else(|| self.category_id.to_string())
    }
}

/// Result handed back to callers of the hypothesis pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisReport {
    pub hypothesis: String,
    pub source_finding: Option<Finding>,
    pub generated_at: DateTime<Utc>,
}
