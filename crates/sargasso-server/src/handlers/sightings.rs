//! Raw sighting and species handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{AppError, AppState};
use sargasso_core::{CategoryLabel, ObservationBatch};

/// GET /api/species - Species label table, ascending by id
pub async fn get_species(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryLabel>>, AppError> {
    let species = state.source.category_labels()?;
    Ok(Json(species))
}

/// GET /api/sightings - The batch the analysis endpoints read
pub async fn get_sightings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ObservationBatch>, AppError> {
    let batch = state.source.load_batch()?;
    Ok(Json(batch))
}
