//! Observation sources
//!
//! A source hands the pipeline a fresh `ObservationBatch` per request and
//! resolves category ids to human-readable labels. Two adapters ship here:
//! an in-memory one for tests and embedding, and a CSV reader.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::config::ObservationsConfig;
use crate::error::{Error, Result};
use crate::models::{CategoryId, CategoryLabel, Observation, ObservationBatch};

/// Cell values treated as a missing reading (compared case-insensitively)
const MISSING_TOKENS: &[&str] = &["", "null", "na", "n/a", "nan"];

/// Where observations and category labels come from
pub trait ObservationSource: Send + Sync {
    /// Load the current batch
    fn load_batch(&self) -> Result<ObservationBatch>;

    /// Human label for a category, if the source knows one
    fn category_label(&self, id: &CategoryId) -> Result<Option<String>>;

    /// Every known label, ascending by id
    fn category_labels(&self) -> Result<Vec<CategoryLabel>>;
}

/// Fixed batch held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    batch: ObservationBatch,
    labels: HashMap<CategoryId, String>,
}

impl InMemorySource {
    pub fn new(batch: ObservationBatch) -> Self {
        Self {
            batch,
            labels: HashMap::new(),
        }
    }

    pub fn with_label(mut self, id: impl Into<CategoryId>, label: impl Into<String>) -> Self {
        self.labels.insert(id.into(), label.into());
        self
    }
}

impl ObservationSource for InMemorySource {
    fn load_batch(&self) -> Result<ObservationBatch> {
        Ok(self.batch.clone())
    }

    fn category_label(&self, id: &CategoryId) -> Result<Option<String>> {
        Ok(self.labels.get(id).cloned())
    }

    fn category_labels(&self) -> Result<Vec<CategoryLabel>> {
        Ok(sorted_labels(self.labels.clone()))
    }
}

/// Observations (and optionally labels) read from CSV files on every call
#[derive(Debug, Clone)]
pub struct CsvSource {
    observations_path: PathBuf,
    labels_path: Option<PathBuf>,
    options: ObservationsConfig,
}

impl CsvSource {
    pub fn new(observations_path: impl Into<PathBuf>) -> Self {
        Self {
            observations_path: observations_path.into(),
            labels_path: None,
            options: ObservationsConfig::default(),
        }
    }

    pub fn with_labels(mut self, labels_path: impl Into<PathBuf>) -> Self {
        self.labels_path = Some(labels_path.into());
        self
    }

    pub fn with_options(mut self, options: ObservationsConfig) -> Self {
        self.options = options;
        self
    }

    pub fn observations_path(&self) -> &Path {
        &self.observations_path
    }

    pub fn labels_path(&self) -> Option<&Path> {
        self.labels_path.as_deref()
    }
}

impl ObservationSource for CsvSource {
    fn load_batch(&self) -> Result<ObservationBatch> {
        let file = File::open(&self.observations_path)?;
        let batch = parse_observations(file, &self.options)?;
        debug!(
            path = %self.observations_path.display(),
            rows = batch.len(),
            variables = batch.variables.len(),
            "Loaded observations"
        );
        Ok(batch)
    }

    fn category_label(&self, id: &CategoryId) -> Result<Option<String>> {
        Ok(self.load_labels()?.get(id).cloned())
    }

    fn category_labels(&self) -> Result<Vec<CategoryLabel>> {
        Ok(sorted_labels(self.load_labels()?))
    }
}

impl CsvSource {
    /// Label table, empty when no labels file is configured
    fn load_labels(&self) -> Result<HashMap<CategoryId, String>> {
        let Some(ref path) = self.labels_path else {
            return Ok(HashMap::new());
        };
        parse_labels(
            File::open(path)?,
            &self.options.label_id_column,
            &self.options.label_name_column,
        )
    }
}

fn sorted_labels(labels: HashMap<CategoryId, String>) -> Vec<CategoryLabel> {
    let mut labels: Vec<CategoryLabel> = labels
        .into_iter()
        .map(|(id, name)| CategoryLabel { id, name })
        .collect();
    labels.sort_by(|a, b| a.id.cmp(&b.id));
    labels
}

/// Parse an observations CSV
///
/// The category column is required; every other column (or the configured
/// subset, in configured order) is an environmental variable.
pub fn parse_observations<R: Read>(
    reader: R,
    options: &ObservationsConfig,
) -> Result<ObservationBatch> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let category_idx = column_index(&headers, &options.category_column).ok_or_else(|| {
        Error::Import(format!(
            "Missing category column '{}'",
            options.category_column
        ))
    })?;

    let variables: Vec<(usize, String)> = match options.variables {
        Some(ref wanted) => wanted
            .iter()
            .map(|name| {
                column_index(&headers, name)
                    .map(|idx| (idx, name.clone()))
                    .ok_or_else(|| Error::Import(format!("Missing variable column '{}'", name)))
            })
            .collect::<Result<_>>()?,
        None => headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != category_idx)
            .map(|(idx, name)| (idx, name.to_string()))
            .collect(),
    };

    let mut batch = ObservationBatch::new(variables.iter().map(|(_, n)| n.clone()).collect());

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = record.position().map(|p| p.line()).unwrap_or(row as u64 + 2);

        let raw_category = record.get(category_idx).unwrap_or("");
        let category = CategoryId::parse(raw_category).ok_or_else(|| {
            Error::Import(format!(
                "Row {}: empty value in category column '{}'",
                line, options.category_column
            ))
        })?;

        let mut observation = Observation::new(category);
        for (idx, name) in &variables {
            let cell = record.get(*idx).unwrap_or("");
            observation = match parse_reading(cell) {
                Ok(Some(value)) => observation.with_reading(name, value),
                Ok(None) => observation.with_missing(name),
                Err(()) => {
                    return Err(Error::Import(format!(
                        "Row {}, column '{}': not a number: {:?}",
                        line, name, cell
                    )))
                }
            };
        }
        batch.push(observation);
    }

    Ok(batch)
}

/// Parse a labels CSV into an id → label map
pub fn parse_labels<R: Read>(
    reader: R,
    id_column: &str,
    name_column: &str,
) -> Result<HashMap<CategoryId, String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let id_idx = column_index(&headers, id_column)
        .ok_or_else(|| Error::Import(format!("Missing label id column '{}'", id_column)))?;
    let name_idx = column_index(&headers, name_column)
        .ok_or_else(|| Error::Import(format!("Missing label name column '{}'", name_column)))?;

    let mut labels = HashMap::new();
    for result in rdr.records() {
        let record = result?;
        let (Some(id), Some(name)) = (
            record.get(id_idx).and_then(CategoryId::parse),
            record.get(name_idx).filter(|n| !n.is_empty()),
        ) else {
            continue;
        };
        labels.insert(id, name.to_string());
    }

    Ok(labels)
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// `Ok(None)` for a missing-value token, `Err(())` for anything non-numeric
fn parse_reading(cell: &str) -> std::result::Result<Option<f64>, ()> {
    let cell = cell.trim();
    if MISSING_TOKENS
        .iter()
        .any(|token| cell.eq_ignore_ascii_case(token))
    {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(()),
    }
}
