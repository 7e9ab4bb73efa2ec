//! Strongest-signal selection over indicator x environmental cells

use crate::models::Finding;

use super::correlation::CorrelationMatrix;
use super::encoder::EncodedTable;

/// Absolute-value margin within which two candidates count as tied
pub const TIE_TOLERANCE: f64 = 1e-12;

/// Pick the indicator/environmental cell with the largest |r|
///
/// Scans indicators in ascending category order and, within each, the
/// environmental columns in declared order. NaN cells are skipped. A later
/// cell only wins if it beats the current best by more than
/// [`TIE_TOLERANCE`], so ties resolve to the first cell scanned. Returns
/// `None` for empty or single-category batches, or when every candidate is
/// undefined.
pub fn select_strongest(table: &EncodedTable, matrix: &CorrelationMatrix) -> Option<Finding> {
    if table.row_count() == 0 || table.is_degenerate() {
        return None;
    }

    let environmental: Vec<(usize, &str)> = table.environmental_columns().collect();
    let mut best: Option<(f64, &str, usize)> = None;

    for (indicator_col, _) in table.indicator_columns() {
        for &(env_col, variable) in &environmental {
            let Some(r) = matrix.get(indicator_col, env_col) else {
                continue;
            };
            if r.is_nan() {
                continue;
            }
            let replace = match best {
                None => true,
                Some((current, _, _)) => r.abs() > current.abs() + TIE_TOLERANCE,
            };
            if replace {
                best = Some((r, variable, indicator_col));
            }
        }
    }

    let (coefficient, variable, indicator_col) = best?;
    let category = table
        .indicator_columns()
        .find(|(col, _)| *col == indicator_col)
        .map(|(_, id)| id.clone())?;

    Some(Finding {
        environmental_variable: variable.to_string(),
        category_id: category,
        correlation_coefficient: coefficient,
        category_label: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::encoder::encode;
    use crate::models::{CategoryId, Observation, ObservationBatch};

    fn select(batch: &ObservationBatch) -> Option<Finding> {
        let table = encode(batch);
        let matrix = CorrelationMatrix::compute(&table);
        select_strongest(&table, &matrix)
    }

    #[test]
    fn test_empty_batch_no_finding() {
        let batch = ObservationBatch::new(vec!["temp".into()]);
        assert!(select(&batch).is_none());
    }

    #[test]
    fn test_single_category_no_finding() {
        let batch = ObservationBatch::from_observations(vec![
            Observation::new(1).with_reading("temp", 20.0),
            Observation::new(1).with_reading("temp", 25.0),
            Observation::new(1).with_reading("temp", 30.0),
        ]);
        assert!(select(&batch).is_none());
    }

    #[test]
    fn test_all_nan_no_finding() {
        // Constant temperature: every candidate cell is undefined
        let batch = ObservationBatch::from_observations(vec![
            Observation::new(1).with_reading("temp", 20.0),
            Observation::new(2).with_reading("temp", 20.0),
            Observation::new(1).with_reading("temp", 20.0),
        ]);
        assert!(select(&batch).is_none());
    }

    #[test]
    fn test_three_sighting_example() {
        let batch = ObservationBatch::from_observations(vec![
            Observation::new("A").with_reading("temp", 28.5),
            Observation::new("B").with_reading("temp", 29.1),
            Observation::new("A").with_reading("temp", 27.9),
        ]);
        let finding = select(&batch).unwrap();
        assert_eq!(finding.category_id, CategoryId::from("A"));
        assert_eq!(finding.environmental_variable, "temp");
        assert!(finding.correlation_coefficient < 0.0);
        assert!((finding.correlation_coefficient + 3f64.sqrt() / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_clean_separation_gives_unit_magnitude() {
        let batch = ObservationBatch::from_observations(vec![
            Observation::new("A").with_reading("temp", 27.0),
            Observation::new("B").with_reading("temp", 29.0),
            Observation::new("A").with_reading("temp", 27.0),
            Observation::new("B").with_reading("temp", 29.0),
        ]);
        let finding = select(&batch).unwrap();
        assert_eq!(finding.category_id, CategoryId::from("A"));
        assert!((finding.correlation_coefficient + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_picks_maximum_absolute_value() {
        // salinity tracks species 2 perfectly, temperature only loosely
        let batch = ObservationBatch::from_observations(vec![
            Observation::new(1)
                .with_reading("temp", 20.0)
                .with_reading("salinity", 30.0),
            Observation::new(2)
                .with_reading("temp", 21.0)
                .with_reading("salinity", 36.0),
            Observation::new(1)
                .with_reading("temp", 23.0)
                .with_reading("salinity", 30.0),
            Observation::new(3)
                .with_reading("temp", 22.0)
                .with_reading("salinity", 31.0),
        ]);
        let table = encode(&batch);
        let matrix = CorrelationMatrix::compute(&table);
        let finding = select_strongest(&table, &matrix).unwrap();

        let max_abs = table
            .indicator_columns()
            .flat_map(|(i, _)| {
                table
                    .environmental_columns()
                    .map(move |(j, _)| (i, j))
                    .collect::<Vec<_>>()
            })
            .filter_map(|(i, j)| matrix.get(i, j))
            .filter(|r| !r.is_nan())
            .fold(0.0_f64, |acc, r| acc.max(r.abs()));

        assert!((finding.correlation_coefficient.abs() - max_abs).abs() < 1e-12);
        assert_eq!(finding.category_id, CategoryId::from(2));
        assert_eq!(finding.environmental_variable, "salinity");
        assert!(finding.correlation_coefficient > 0.0);
    }

    #[test]
    fn test_tie_prefers_declared_variable_order() {
        // Two identical variables: the first declared one wins
        let mut batch = ObservationBatch::new(vec!["zeta".into(), "alpha".into()]);
        for (category, value) in [(1, 1.0), (2, 5.0), (1, 2.0), (2, 6.0)] {
            batch.push(
                Observation::new(category)
                    .with_reading("zeta", value)
                    .with_reading("alpha", value),
            );
        }
        let finding = select(&batch).unwrap();
        assert_eq!(finding.environmental_variable, "zeta");
        assert_eq!(finding.category_id, CategoryId::from(1));
    }

    #[test]
    fn test_nan_cells_skipped() {
        // chlorophyll is constant (NaN everywhere); temperature still yields a finding
        let batch = ObservationBatch::from_observations(vec![
            Observation::new(1)
                .with_reading("chlorophyll", 0.4)
                .with_reading("temp", 20.0),
            Observation::new(2)
                .with_reading("chlorophyll", 0.4)
                .with_reading("temp", 24.0),
            Observation::new(1)
                .with_reading("chlorophyll", 0.4)
                .with_reading("temp", 21.0),
        ]);
        let finding = select(&batch).unwrap();
        assert_eq!(finding.environmental_variable, "temp");
    }

    #[test]
    fn test_deterministic() {
        let batch = ObservationBatch::from_observations(vec![
            Observation::new(1)
                .with_reading("temp", 28.5)
                .with_reading("salinity", 35.1),
            Observation::new(2)
                .with_reading("temp", 29.1)
                .with_reading("salinity", 35.5),
            Observation::new(1)
                .with_reading("temp", 27.9)
                .with_reading("salinity", 36.0),
        ]);
        assert_eq!(select(&batch), select(&batch));
    }
}
