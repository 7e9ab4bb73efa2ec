//! Integration tests for sargasso-core
//!
//! These tests exercise the full CSV → analysis → narration workflow against
//! a mock LLM server.

use std::fs;
use std::time::Duration;

use sargasso_core::{
    ai::OpenAICompatibleBackend,
    test_utils::{MockBehavior, MockLlmServer},
    AIClient, CategoryId, CsvSource, HypothesisComposer, HypothesisService, InMemorySource,
    MockBackend, Observation, ObservationBatch, ObservationSource, PromptId, PromptLibrary,
    GENERATION_FAILED_MESSAGE, NO_FINDING_MESSAGE,
};
use tempfile::TempDir;

const SIGHTINGS: &str = "species_id,sea_surface_temp_c,salinity_psu,chlorophyll_mg_m3
1,28.5,35.1,0.4
2,29.1,35.5,0.6
1,27.9,36.0,0.3
";

const SPECIES: &str = "id,name
1,Indian Oil Sardine
2,Indian Mackerel
";

/// Write the seed sightings and species tables into a temp dir
fn seed_source() -> (TempDir, CsvSource) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let sightings = dir.path().join("sightings.csv");
    let species = dir.path().join("species.csv");
    fs::write(&sightings, SIGHTINGS).unwrap();
    fs::write(&species, SPECIES).unwrap();

    let source = CsvSource::new(sightings).with_labels(species);
    (dir, source)
}

fn service_for(client: AIClient, timeout: Duration) -> HypothesisService {
    let prompt = PromptLibrary::embedded_only()
        .get(PromptId::Hypothesis)
        .unwrap();
    HypothesisService::new(HypothesisComposer::new(Some(client), prompt).with_timeout(timeout))
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[tokio::test]
async fn test_csv_to_hypothesis_via_gemini() {
    let server = MockLlmServer::with_behavior(MockBehavior::reply(
        "  Indian Oil Sardine sightings cluster where chlorophyll is lower.  ",
    ))
    .await;
    let client = AIClient::gemini(&server.url(), "gemini-1.5-flash-latest", "test-key");
    let service = service_for(client, Duration::from_secs(5));
    let (_dir, source) = seed_source();

    let report = service.generate(&source).await.unwrap();

    assert_eq!(
        report.hypothesis,
        "Indian Oil Sardine sightings cluster where chlorophyll is lower."
    );
    let finding = report.source_finding.expect("finding expected");
    assert_eq!(finding.category_id, CategoryId::from(1));
    assert_eq!(finding.environmental_variable, "chlorophyll_mg_m3");
    assert!(finding.correlation_coefficient < -0.9);
    assert_eq!(finding.category_label.as_deref(), Some("Indian Oil Sardine"));

    assert_eq!(server.requests(), 1);
    let sent = server.last_request().unwrap();
    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Indian Oil Sardine"));
    assert!(prompt.contains("chlorophyll_mg_m3"));
}

#[tokio::test]
async fn test_csv_to_hypothesis_via_ollama() {
    let server = MockLlmServer::with_behavior(MockBehavior::reply("Ollama hypothesis.")).await;
    let service = service_for(
        AIClient::ollama(&server.url(), "llama3.2"),
        Duration::from_secs(5),
    );
    let (_dir, source) = seed_source();

    let report = service.generate(&source).await.unwrap();
    assert_eq!(report.hypothesis, "Ollama hypothesis.");
}

#[tokio::test]
async fn test_csv_to_hypothesis_via_openai_compatible() {
    let server = MockLlmServer::with_behavior(MockBehavior::reply("Chat hypothesis.")).await;
    let client = AIClient::OpenAICompatible(OpenAICompatibleBackend::new(&server.url(), "mock"));
    let service = service_for(client, Duration::from_secs(5));
    let (_dir, source) = seed_source();

    let report = service.generate(&source).await.unwrap();
    assert_eq!(report.hypothesis, "Chat hypothesis.");
}

// =============================================================================
// Failure Handling Tests
// =============================================================================

#[tokio::test]
async fn test_gateway_timeout_keeps_finding() {
    let server = MockLlmServer::with_behavior(MockBehavior::delayed(Duration::from_secs(5))).await;
    let client = AIClient::gemini(&server.url(), "gemini-1.5-flash-latest", "k");
    let service = service_for(client, Duration::from_millis(200));
    let (_dir, source) = seed_source();

    let report = service.generate(&source).await.unwrap();

    assert_eq!(report.hypothesis, GENERATION_FAILED_MESSAGE);
    assert_eq!(
        report.source_finding.map(|f| f.category_id),
        Some(CategoryId::from(1))
    );
}

#[tokio::test]
async fn test_gateway_error_status() {
    let server = MockLlmServer::with_behavior(MockBehavior::status(
        axum::http::StatusCode::TOO_MANY_REQUESTS,
    ))
    .await;
    let client = AIClient::gemini(&server.url(), "gemini-1.5-flash-latest", "k");
    let service = service_for(client, Duration::from_secs(5));
    let (_dir, source) = seed_source();

    let report = service.generate(&source).await.unwrap();
    assert_eq!(report.hypothesis, GENERATION_FAILED_MESSAGE);
    assert!(report.source_finding.is_some());
}

#[tokio::test]
async fn test_gateway_empty_reply() {
    let server = MockLlmServer::with_behavior(MockBehavior::empty()).await;
    let client = AIClient::gemini(&server.url(), "gemini-1.5-flash-latest", "k");
    let service = service_for(client, Duration::from_secs(5));
    let (_dir, source) = seed_source();

    let report = service.generate(&source).await.unwrap();
    assert_eq!(report.hypothesis, GENERATION_FAILED_MESSAGE);
}

#[tokio::test]
async fn test_unreachable_gateway() {
    // Port 9 (discard) on localhost is not expected to speak HTTP
    let client = AIClient::ollama("http://127.0.0.1:9", "llama3.2");
    let service = service_for(client, Duration::from_secs(2));
    let (_dir, source) = seed_source();

    let report = service.generate(&source).await.unwrap();
    assert_eq!(report.hypothesis, GENERATION_FAILED_MESSAGE);
}

#[tokio::test]
async fn test_single_species_never_calls_gateway() {
    let server = MockLlmServer::start().await;
    let service = service_for(
        AIClient::ollama(&server.url(), "llama3.2"),
        Duration::from_secs(5),
    );
    let batch = ObservationBatch::from_observations(vec![
        Observation::new(7).with_reading("sea_surface_temp_c", 27.0),
        Observation::new(7).with_reading("sea_surface_temp_c", 29.0),
    ]);

    let report = service.generate(&InMemorySource::new(batch)).await.unwrap();

    assert_eq!(report.hypothesis, NO_FINDING_MESSAGE);
    assert!(report.source_finding.is_none());
    assert_eq!(server.requests(), 0);
}

#[tokio::test]
async fn test_missing_observations_file() {
    let service = service_for(AIClient::mock(), Duration::from_secs(1));
    let source = CsvSource::new("/definitely/not/here.csv");
    assert!(service.generate(&source).await.is_err());
}

// =============================================================================
// Analysis Tests
// =============================================================================

#[test]
fn test_analysis_is_deterministic() {
    let (_dir, source) = seed_source();
    let service = service_for(AIClient::mock(), Duration::from_secs(1));

    let batch = source.load_batch().unwrap();
    let first = service.analyze(&batch);
    for _ in 0..10 {
        assert_eq!(service.analyze(&batch), first);
    }
}

#[tokio::test]
async fn test_generate_is_repeatable() {
    let (_dir, source) = seed_source();
    let mock = MockBackend::with_reply("Sardines thin out where chlorophyll rises.");
    let service = service_for(AIClient::Mock(mock.clone()), Duration::from_secs(1));

    let first = service.generate(&source).await.unwrap();
    let first_prompt = mock.last_prompt().unwrap();
    let second = service.generate(&source).await.unwrap();

    assert!(first.source_finding.is_some());
    assert_eq!(second.source_finding, first.source_finding);
    assert_eq!(second.hypothesis, first.hypothesis);
    assert_eq!(first.hypothesis, "Sardines thin out where chlorophyll rises.");
    assert_eq!(mock.last_prompt().unwrap(), first_prompt);
    assert_eq!(mock.calls(), 2);
}

#[test]
fn test_correlation_view_from_csv() {
    let (_dir, source) = seed_source();
    let service = service_for(AIClient::mock(), Duration::from_secs(1));

    let view = service.correlations(&source).unwrap();
    assert_eq!(view.columns.len(), 5);
    for (i, row) in view.values.iter().enumerate() {
        assert_eq!(row[i], Some(1.0));
        for (j, cell) in row.iter().enumerate() {
            assert_eq!(*cell, view.values[j][i]);
        }
    }
}

#[test]
fn test_missing_readings_in_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sightings.csv");
    fs::write(
        &path,
        "species_id,sea_surface_temp_c,salinity_psu\n1,28.0,\n2,30.0,NA\n1,27.0,\n2,31.0,\n",
    )
    .unwrap();

    let service = service_for(AIClient::mock(), Duration::from_secs(1));
    let batch = CsvSource::new(&path).load_batch().unwrap();
    let finding = service.analyze(&batch).expect("temperature separates species");

    assert_eq!(finding.environmental_variable, "sea_surface_temp_c");
    assert_eq!(finding.category_id, CategoryId::from(1));
    assert!(finding.correlation_coefficient < -0.9);
}
