//! Pairwise-complete Pearson correlation matrix

use serde::Serialize;

use super::encoder::EncodedTable;

/// Pearson correlation over rows where both values are present and finite
///
/// Returns NaN when fewer than two complete pairs exist or either side is
/// constant over those pairs.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let (x0, y0) = pairs[0];
    if pairs.iter().all(|(a, _)| *a == x0) || pairs.iter().all(|(_, b)| *b == y0) {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return f64::NAN;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}

/// Square, symmetric correlation matrix indexed like the encoded table's columns
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    labels: Vec<String>,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Compute the full matrix; diagonal is always 1.0
    pub fn compute(table: &EncodedTable) -> Self {
        let columns = table.columns();
        let n = columns.len();
        let mut values = vec![f64::NAN; n * n];

        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let r = pearson(&columns[i].values, &columns[j].values);
                values[i * n + j] = r;
                values[j * n + i] = r;
            }
        }

        tracing::debug!(
            columns = n,
            rows = table.row_count(),
            "Correlation matrix computed"
        );

        Self {
            labels: table.column_names(),
            values,
        }
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Coefficient at (row, column); NaN means undefined
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.size();
        if i < n && j < n {
            Some(self.values[i * n + j])
        } else {
            None
        }
    }

    /// Coefficient looked up by column labels
    pub fn get_by_label(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.get(i, j)
    }

    /// JSON-friendly view (NaN becomes null)
    pub fn to_view(&self) -> MatrixView {
        let n = self.size();
        let values = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        let v = self.values[i * n + j];
                        if v.is_nan() {
                            None
                        } else {
                            Some(v)
                        }
                    })
                    .collect()
            })
            .collect();
        MatrixView {
            columns: self.labels.clone(),
            values,
        }
    }
}

/// Serializable form of a correlation matrix
#[derive(Debug, Clone, Serialize)]
pub struct MatrixView {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}
