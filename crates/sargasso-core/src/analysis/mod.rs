//! Correlation mining over observation batches
//!
//! Finds the single strongest linear association between a category's
//! presence and an environmental variable:
//!
//! - **Encoder** - one indicator column per category (`encoder`)
//! - **Correlation Engine** - pairwise-complete Pearson matrix (`correlation`)
//! - **Selector** - maximum |r| over indicator x environmental cells (`selector`)
//!
//! Everything is recomputed per call; nothing is cached.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sargasso_core::analysis::find_strongest_correlation;
//!
//! match find_strongest_correlation(&batch) {
//!     Some(finding) => println!("{} / {}", finding.category_id, finding.environmental_variable),
//!     None => println!("no usable signal"),
//! }
//! ```

pub mod correlation;
pub mod encoder;
pub mod selector;

pub use correlation::{pearson, CorrelationMatrix, MatrixView};
pub use encoder::{encode, CategoryIndex, Column, ColumnKind, EncodedTable};
pub use selector::{select_strongest, TIE_TOLERANCE};

use crate::models::{Finding, ObservationBatch};

/// Full output of one analysis pass
#[derive(Debug, Clone)]
pub struct Analysis {
    pub table: EncodedTable,
    pub matrix: CorrelationMatrix,
    pub finding: Option<Finding>,
}

/// Encode, correlate, and select in one pass
pub fn analyze(batch: &ObservationBatch) -> Analysis {
    let table = encode(batch);
    let matrix = CorrelationMatrix::compute(&table);
    let finding = select_strongest(&table, &matrix);

    match &finding {
        Some(f) => tracing::info!(
            category = %f.category_id,
            variable = %f.environmental_variable,
            correlation = f.correlation_coefficient,
            "Strongest correlation found"
        ),
        None => tracing::info!(
            observations = batch.len(),
            categories = table.categories().len(),
            "No usable correlation in batch"
        ),
    }

    Analysis {
        table,
        matrix,
        finding,
    }
}

/// Shorthand for `analyze(batch).finding`
pub fn find_strongest_correlation(batch: &ObservationBatch) -> Option<Finding> {
    analyze(batch).finding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, Observation};

    #[test]
    fn test_analyze_seed_batch() {
        let batch = ObservationBatch::from_observations(vec![
            Observation::new(1)
                .with_reading("sea_surface_temp_c", 28.5)
                .with_reading("salinity_psu", 35.1)
                .with_reading("chlorophyll_mg_m3", 0.4),
            Observation::new(2)
                .with_reading("sea_surface_temp_c", 29.1)
                .with_reading("salinity_psu", 35.5)
                .with_reading("chlorophyll_mg_m3", 0.6),
            Observation::new(1)
                .with_reading("sea_surface_temp_c", 27.9)
                .with_reading("salinity_psu", 36.0)
                .with_reading("chlorophyll_mg_m3", 0.3),
        ]);

        let analysis = analyze(&batch);
        assert_eq!(analysis.table.row_count(), 3);
        assert_eq!(analysis.matrix.size(), 5);

        let finding = analysis.finding.unwrap();
        assert_eq!(finding.category_id, CategoryId::from(1));
        assert!(finding.correlation_coefficient.abs() <= 1.0);
    }

    #[test]
    fn test_find_strongest_empty() {
        assert!(find_strongest_correlation(&ObservationBatch::default()).is_none());
    }
}
