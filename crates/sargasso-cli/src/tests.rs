//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;
use std::path::PathBuf;

use sargasso_core::test_utils::{MockBehavior, MockLlmServer, StatusCode};
use sargasso_core::{CategoryId, Config, Finding, MatrixView, GENERATION_FAILED_MESSAGE};
use tempfile::TempDir;

use crate::commands::{self, truncate};

const SIGHTINGS: &str = "species_id,sea_surface_temp_c,salinity_psu,chlorophyll_mg_m3
1,28.5,35.1,0.4
2,29.1,35.5,0.6
1,27.9,36.0,0.3
";

const SPECIES: &str = "id,name
1,Indian Oil Sardine
2,Indian Mackerel
";

/// Write the seed sightings and species tables, returning their paths
fn seed_files() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let sightings = dir.path().join("sightings.csv");
    let species = dir.path().join("species.csv");
    fs::write(&sightings, SIGHTINGS).unwrap();
    fs::write(&species, SPECIES).unwrap();
    (dir, sightings, species)
}

fn mock_config() -> Config {
    Config::from_toml("[gateway]\nbackend = \"mock\"\n").unwrap()
}

fn ollama_config(host: &str) -> Config {
    Config::from_toml(&format!(
        "[gateway]\nbackend = \"ollama\"\nhost = \"{}\"\nmodel = \"llama3.2\"\ntimeout_secs = 5\n",
        host
    ))
    .unwrap()
}

// ========== Config Tests ==========

#[test]
fn test_load_config_missing_path() {
    let result = commands::load_config(Some(std::path::Path::new("/no/such/sargasso.toml")));
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not found"));
}

#[test]
fn test_load_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sargasso.toml");
    fs::write(
        &path,
        "[observations]\ncategory_column = \"taxon\"\n\n[server]\nallowed_origins = []\n",
    )
    .unwrap();

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.observations.category_column, "taxon");
    assert!(config.server.allowed_origins.is_empty());
}

#[test]
fn test_load_config_invalid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sargasso.toml");
    fs::write(&path, "[gateway\nbackend = ").unwrap();

    assert!(commands::load_config(Some(&path)).is_err());
}

// ========== Analyze Command Tests ==========

#[test]
fn test_find_seed_data() {
    let (_dir, sightings, species) = seed_files();
    let config = Config::embedded().unwrap();
    let source = commands::open_source(&config, &sightings, Some(&species));

    let finding = commands::find(&config, &source).unwrap().unwrap();
    assert_eq!(finding.category_id, CategoryId::from(1));
    assert_eq!(finding.environmental_variable, "chlorophyll_mg_m3");
    assert_eq!(finding.category_label.as_deref(), Some("Indian Oil Sardine"));
    assert!(finding.correlation_coefficient < -0.9);
}

#[test]
fn test_find_without_labels() {
    let (_dir, sightings, _species) = seed_files();
    let config = Config::embedded().unwrap();
    let source = commands::open_source(&config, &sightings, None);

    let finding = commands::find(&config, &source).unwrap().unwrap();
    assert!(finding.category_label.is_none());
}

#[test]
fn test_find_single_species() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sightings.csv");
    fs::write(&path, "species_id,salinity_psu\n4,35.0\n4,36.0\n").unwrap();

    let config = mock_config();
    let source = commands::open_source(&config, &path, None);
    assert!(commands::find(&config, &source).unwrap().is_none());
}

#[tokio::test]
async fn test_build_report_with_mock_gateway() {
    let (_dir, sightings, species) = seed_files();
    let config = mock_config();
    let source = commands::open_source(&config, &sightings, Some(&species));

    let report = commands::build_report(&config, &source).await.unwrap();
    assert!(!report.hypothesis.is_empty());
    assert_ne!(report.hypothesis, GENERATION_FAILED_MESSAGE);
    assert!(report.source_finding.is_some());
}

#[tokio::test]
async fn test_build_report_via_mock_llm_server() {
    let server = MockLlmServer::with_behavior(MockBehavior::reply("Sardines avoid greener water.")).await;
    let (_dir, sightings, species) = seed_files();
    let config = ollama_config(&server.url());
    let source = commands::open_source(&config, &sightings, Some(&species));

    let report = commands::build_report(&config, &source).await.unwrap();
    assert_eq!(report.hypothesis, "Sardines avoid greener water.");
    assert_eq!(server.requests(), 1);

    let sent = server.last_request().unwrap();
    assert!(sent["prompt"].as_str().unwrap().contains("Indian Oil Sardine"));
}

#[tokio::test]
async fn test_build_report_missing_file() {
    let config = mock_config();
    let source = commands::open_source(&config, std::path::Path::new("/no/such/file.csv"), None);

    let err = commands::build_report(&config, &source).await.unwrap_err();
    assert!(err.to_string().contains("Failed to analyze observations"));
}

#[tokio::test]
async fn test_cmd_analyze_modes() {
    let (_dir, sightings, species) = seed_files();
    let config = mock_config();

    assert!(
        commands::cmd_analyze(&config, &sightings, Some(&species), false, false)
            .await
            .is_ok()
    );
    assert!(
        commands::cmd_analyze(&config, &sightings, Some(&species), false, true)
            .await
            .is_ok()
    );
    assert!(commands::cmd_analyze(&config, &sightings, None, true, true)
        .await
        .is_ok());
    assert!(commands::cmd_analyze(&config, &sightings, None, true, false)
        .await
        .is_ok());
}

#[test]
fn test_format_finding() {
    let labelled = Finding {
        environmental_variable: "chlorophyll_mg_m3".into(),
        category_id: CategoryId::from(1),
        correlation_coefficient: -0.945,
        category_label: Some("Indian Oil Sardine".into()),
    };
    let text = commands::format_finding(&labelled);
    assert!(text.contains("Indian Oil Sardine (id 1)"));
    assert!(text.contains("chlorophyll_mg_m3"));
    assert!(text.contains("-0.945 (negative)"));

    let bare = Finding {
        category_label: None,
        correlation_coefficient: 0.5,
        ..labelled
    };
    let text = commands::format_finding(&bare);
    assert!(text.contains("Species:     1\n"));
    assert!(text.contains("+0.500 (positive)"));
}

// ========== Correlations Command Tests ==========

#[test]
fn test_cmd_correlations() {
    let (_dir, sightings, _species) = seed_files();
    let config = mock_config();
    assert!(commands::cmd_correlations(&config, &sightings, false).is_ok());
    assert!(commands::cmd_correlations(&config, &sightings, true).is_ok());
}

#[test]
fn test_cmd_correlations_missing_file() {
    let config = mock_config();
    let result =
        commands::cmd_correlations(&config, std::path::Path::new("/no/such/file.csv"), false);
    assert!(result.is_err());
}

#[test]
fn test_format_matrix() {
    let view = MatrixView {
        columns: vec!["salinity_psu".into(), "species_1".into()],
        values: vec![vec![Some(1.0), None], vec![None, Some(1.0)]],
    };
    let table = commands::format_matrix(&view);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("salinity_psu"));
    assert!(lines[1].starts_with("salinity_psu"));
    assert!(lines[1].contains("1.000"));
    assert!(lines[1].contains("n/a"));
}

#[test]
fn test_format_matrix_truncates_long_names() {
    let view = MatrixView {
        columns: vec!["chlorophyll_mg_m3".into()],
        values: vec![vec![Some(1.0)]],
    };
    let table = commands::format_matrix(&view);
    assert!(table.contains("chlorophy..."));
    assert!(!table.contains("chlorophyll_mg_m3"));
}

// ========== Gateway Command Tests ==========

#[tokio::test]
async fn test_gateway_test_mock() {
    assert!(commands::cmd_gateway_test(&mock_config(), None).await.is_ok());
}

#[tokio::test]
async fn test_gateway_test_custom_prompt() {
    let server = MockLlmServer::with_behavior(MockBehavior::reply("pong")).await;
    let config = ollama_config(&server.url());

    commands::cmd_gateway_test(&config, Some("ping"))
        .await
        .unwrap();

    assert_eq!(server.requests(), 1);
    assert_eq!(server.last_request().unwrap()["prompt"], "ping");
}

#[tokio::test]
async fn test_gateway_test_sample_prompt() {
    let server = MockLlmServer::start().await;
    let config = ollama_config(&server.url());

    commands::cmd_gateway_test(&config, None).await.unwrap();

    let sent = server.last_request().unwrap();
    let prompt = sent["prompt"].as_str().unwrap();
    assert!(prompt.contains("sea_surface_temp_c"));
    assert!(prompt.contains("-0.87"));
}

#[tokio::test]
async fn test_gateway_test_error_status() {
    let server =
        MockLlmServer::with_behavior(MockBehavior::status(StatusCode::SERVICE_UNAVAILABLE)).await;
    let config = ollama_config(&server.url());

    assert!(commands::cmd_gateway_test(&config, Some("ping")).await.is_err());
}

#[tokio::test]
async fn test_gateway_test_unreachable() {
    let config = ollama_config("http://127.0.0.1:9");
    assert!(commands::cmd_gateway_test(&config, None).await.is_err());
}

#[tokio::test]
async fn test_gateway_test_gemini_without_key() {
    let config = Config::from_toml(
        "[gateway]\nbackend = \"gemini\"\napi_key_env = \"SARGASSO_TEST_KEY_NEVER_SET\"\n",
    )
    .unwrap();

    let err = commands::cmd_gateway_test(&config, None).await.unwrap_err();
    assert!(err.to_string().contains("not configured"));
}

#[test]
fn test_sample_finding() {
    let finding = commands::sample_finding();
    assert_eq!(finding.direction(), "negative");
    assert_eq!(finding.display_category(), "Indian Oil Sardine");
}

// ========== Prompts Command Tests ==========

#[test]
fn test_cmd_prompts_list() {
    assert!(commands::cmd_prompts_list().is_ok());
}

#[test]
fn test_cmd_prompts_show() {
    assert!(commands::cmd_prompts_show("hypothesis").is_ok());
}

#[test]
fn test_cmd_prompts_show_unknown() {
    let err = commands::cmd_prompts_show("classify_species").unwrap_err();
    assert!(err.to_string().contains("hypothesis"));
}

#[test]
fn test_cmd_prompts_path() {
    assert!(commands::cmd_prompts_path().is_ok());
}

// ========== Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly_ten", 11), "exactly_ten");
    assert_eq!(truncate("sea_surface_temp_c", 12), "sea_surfa...");
    assert_eq!(truncate("ab", 2), "ab");
}

#[test]
fn test_truncate_multibyte() {
    assert_eq!(truncate("température", 6), "tem...");
}

