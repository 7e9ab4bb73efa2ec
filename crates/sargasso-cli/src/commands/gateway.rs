//! Narration gateway command implementations

use anyhow::{bail, Context, Result};
use sargasso_core::ai::parsing::extract_hypothesis;
use sargasso_core::{
    AIBackend, AIClient, CategoryId, Config, Finding, HypothesisComposer, PromptId, PromptLibrary,
};

/// Probe the configured gateway and run one generation
pub async fn cmd_gateway_test(config: &Config, prompt: Option<&str>) -> Result<()> {
    println!("🔍 Testing narration gateway...\n");

    let client =
        AIClient::from_config(&config.gateway).context("Narration gateway is not configured")?;
    let timeout = config.gateway.timeout();

    println!("  Backend: {}", client.backend_name());
    println!("  Host:    {}", client.host());
    println!("  Model:   {}", client.model());
    println!("  Timeout: {}s\n", timeout.as_secs());

    if client.health_check().await {
        println!("Availability: ✅ Connected");
    } else {
        println!("Availability: ❌ Failed");
        bail!("Narration gateway at {} is not responding", client.host());
    }

    let text = match prompt {
        Some(p) => p.to_string(),
        None => {
            let template = PromptLibrary::new()
                .get(PromptId::Hypothesis)
                .context("Failed to load hypothesis prompt")?;
            HypothesisComposer::new(None, template).render_prompt(&sample_finding())
        }
    };

    println!("\n📝 Sending sample prompt...\n");

    let reply = tokio::time::timeout(timeout, client.generate(&text))
        .await
        .with_context(|| format!("Gateway did not answer within {}s", timeout.as_secs()))?
        .context("Generation failed")?;
    let hypothesis = extract_hypothesis(&reply).context("Gateway returned no usable text")?;

    println!("  {}", hypothesis);
    Ok(())
}

/// Finding shaped like the seed dataset's strongest signal
pub fn sample_finding() -> Finding {
    Finding {
        environmental_variable: "sea_surface_temp_c".to_string(),
        category_id: CategoryId::from(1),
        correlation_coefficient: -0.87,
        category_label: Some("Indian Oil Sardine".to_string()),
    }
}
