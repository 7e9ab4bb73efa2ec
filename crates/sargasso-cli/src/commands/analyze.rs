//! Analysis command implementations

use std::path::Path;

use anyhow::{Context, Result};
use sargasso_core::{
    Config, Finding, HypothesisComposer, HypothesisReport, HypothesisService, MatrixView,
    ObservationSource, PromptId, PromptLibrary,
};

use super::{open_source, truncate};

const COLUMN_WIDTH: usize = 12;

/// Find the strongest signal and (optionally) narrate it
pub async fn cmd_analyze(
    config: &Config,
    observations: &Path,
    labels: Option<&Path>,
    no_narrate: bool,
    json: bool,
) -> Result<()> {
    let source = open_source(config, observations, labels);

    if no_narrate {
        let finding = find(config, &source)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&finding)?);
        } else {
            print_finding(finding.as_ref());
        }
        return Ok(());
    }

    if !json {
        println!("🔍 Analyzing {}...\n", observations.display());
    }
    let report = build_report(config, &source).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_finding(report.source_finding.as_ref());
        println!();
        println!("Hypothesis:");
        println!("  {}", report.hypothesis);
    }

    Ok(())
}

/// Strongest finding only; never touches the gateway
pub fn find(config: &Config, source: &dyn ObservationSource) -> Result<Option<Finding>> {
    offline_service(config)?
        .find(source)
        .context("Failed to analyze observations")
}

/// Full pipeline through the configured gateway
pub async fn build_report(
    config: &Config,
    source: &dyn ObservationSource,
) -> Result<HypothesisReport> {
    let composer = HypothesisComposer::from_config(config, &PromptLibrary::new())
        .context("Failed to prepare hypothesis composer")?;
    HypothesisService::new(composer)
        .generate(source)
        .await
        .context("Failed to analyze observations")
}

/// Print the correlation matrix of a sightings file
pub fn cmd_correlations(config: &Config, observations: &Path, json: bool) -> Result<()> {
    let source = open_source(config, observations, None);
    let view = offline_service(config)?
        .correlations(&source)
        .context("Failed to compute correlations")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", format_matrix(&view));
    }
    Ok(())
}

/// Render a finding as indented key/value lines
pub fn format_finding(finding: &Finding) -> String {
    let species = match finding.category_label {
        Some(ref label) => format!("{} (id {})", label, finding.category_id),
        None => finding.category_id.to_string(),
    };
    format!(
        "  Species:     {}\n  Variable:    {}\n  Coefficient: {:+.3} ({})",
        species,
        finding.environmental_variable,
        finding.correlation_coefficient,
        finding.direction()
    )
}

/// Render the matrix as a fixed-width table; undefined cells show "n/a"
pub fn format_matrix(view: &MatrixView) -> String {
    let mut out = String::new();

    out.push_str(&format!("{:<w$}", "", w = COLUMN_WIDTH));
    for column in &view.columns {
        out.push_str(&format!(" {:>w$}", truncate(column, COLUMN_WIDTH), w = COLUMN_WIDTH));
    }
    out.push('\n');

    for (column, row) in view.columns.iter().zip(&view.values) {
        out.push_str(&format!("{:<w$}", truncate(column, COLUMN_WIDTH), w = COLUMN_WIDTH));
        for cell in row {
            let text = match cell {
                Some(r) => format!("{:.3}", r),
                None => "n/a".to_string(),
            };
            out.push_str(&format!(" {:>w$}", text, w = COLUMN_WIDTH));
        }
        out.push('\n');
    }

    out
}

fn print_finding(finding: Option<&Finding>) {
    match finding {
        Some(finding) => {
            println!("Strongest signal:");
            println!("{}", format_finding(finding));
        }
        None => println!("No significant correlations were found."),
    }
}

/// Service with no gateway, for the numeric-only commands
fn offline_service(config: &Config) -> Result<HypothesisService> {
    let prompt = PromptLibrary::new()
        .get(PromptId::Hypothesis)
        .context("Failed to load hypothesis prompt")?;
    let composer = HypothesisComposer::new(None, prompt).with_timeout(config.gateway.timeout());
    Ok(HypothesisService::new(composer))
}
