//! Hypothesis composition
//!
//! Turns the selected finding into one natural-language sentence via the
//! narration gateway. Every failure path collapses to a fixed sentence so a
//! caller always gets a hypothesis string back; the finding itself is
//! returned untouched alongside it.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::ai::parsing::extract_hypothesis;
use crate::ai::{AIBackend, AIClient, DEFAULT_TIMEOUT};
use crate::analysis::{self, MatrixView};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Finding, HypothesisReport, ObservationBatch};
use crate::prompts::{Prompt, PromptId, PromptLibrary};
use crate::source::ObservationSource;

/// Returned when the batch yields no finding
pub const NO_FINDING_MESSAGE: &str =
    "No significant correlations were found in the current dataset.";

/// Returned when the gateway fails, times out, or replies with nothing usable
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate hypothesis due to an API error.";

/// Renders the prompt for a finding and asks the gateway for a sentence
#[derive(Clone)]
pub struct HypothesisComposer {
    gateway: Option<AIClient>,
    prompt: Prompt,
    timeout: Duration,
}

impl HypothesisComposer {
    /// `gateway` may be absent; every narration then reports failure
    pub fn new(gateway: Option<AIClient>, prompt: Prompt) -> Self {
        Self {
            gateway,
            prompt,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build from configuration and the prompt library
    ///
    /// An unusable gateway configuration is logged, not fatal.
    pub fn from_config(config: &Config, prompts: &PromptLibrary) -> Result<Self> {
        let gateway = match AIClient::from_config(&config.gateway) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "Narration gateway unavailable; hypotheses will report failure");
                None
            }
        };
        let prompt = prompts.get(PromptId::Hypothesis)?;
        Ok(Self::new(gateway, prompt).with_timeout(config.gateway.timeout()))
    }

    /// Bound on a single gateway call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn gateway(&self) -> Option<&AIClient> {
        self.gateway.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Produce the hypothesis sentence for an optional finding
    ///
    /// The gateway is only called when there is a finding.
    pub async fn compose(&self, finding: Option<&Finding>) -> String {
        let Some(finding) = finding else {
            return NO_FINDING_MESSAGE.to_string();
        };

        match self.narrate(finding).await {
            Ok(hypothesis) => hypothesis,
            Err(e) => {
                warn!(
                    error = %e,
                    category = %finding.category_id,
                    variable = %finding.environmental_variable,
                    "Hypothesis generation failed"
                );
                GENERATION_FAILED_MESSAGE.to_string()
            }
        }
    }

    /// Prompt text sent for a finding
    pub fn render_prompt(&self, finding: &Finding) -> String {
        let coefficient = format!("{:.2}", finding.correlation_coefficient);
        let category = finding.display_category();
        let category_id = finding.category_id.to_string();

        let mut vars: HashMap<&str, &str> = HashMap::new();
        vars.insert("coefficient", &coefficient);
        vars.insert("variable", &finding.environmental_variable);
        vars.insert("category", &category);
        vars.insert("direction", finding.direction());
        // Only worth mentioning when the label differs from the id
        if finding.category_label.is_some() {
            vars.insert("category_id", &category_id);
        }

        self.prompt.render_combined(&vars)
    }

    async fn narrate(&self, finding: &Finding) -> Result<String> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| Error::Config("no narration gateway configured".into()))?;

        let prompt = self.render_prompt(finding);
        let reply = tokio::time::timeout(self.timeout, gateway.generate(&prompt))
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;

        let hypothesis = extract_hypothesis(&reply)?;
        debug!(backend = gateway.backend_name(), "Hypothesis generated");
        Ok(hypothesis)
    }
}

/// End-to-end pipeline: load, analyze, label, narrate
#[derive(Clone)]
pub struct HypothesisService {
    composer: HypothesisComposer,
}

impl HypothesisService {
    pub fn new(composer: HypothesisComposer) -> Self {
        Self { composer }
    }

    pub fn composer(&self) -> &HypothesisComposer {
        &self.composer
    }

    /// Numeric part only: strongest finding in a batch, unlabelled
    pub fn analyze(&self, batch: &ObservationBatch) -> Option<Finding> {
        analysis::find_strongest_correlation(batch)
    }

    /// Strongest finding from the source's current batch, labelled when possible
    pub fn find(&self, source: &dyn ObservationSource) -> Result<Option<Finding>> {
        let batch = source.load_batch()?;
        Ok(self.analyze(&batch).map(|f| label_finding(source, f)))
    }

    /// Full correlation matrix of the source's current batch
    pub fn correlations(&self, source: &dyn ObservationSource) -> Result<MatrixView> {
        let batch = source.load_batch()?;
        Ok(analysis::analyze(&batch).matrix.to_view())
    }

    /// Run the whole pipeline and produce a report
    ///
    /// Only source failures surface as errors.
    pub async fn generate(&self, source: &dyn ObservationSource) -> Result<HypothesisReport> {
        let finding = self.find(source)?;
        let hypothesis = self.composer.compose(finding.as_ref()).await;

        Ok(HypothesisReport {
            hypothesis,
            source_finding: finding,
            generated_at: Utc::now(),
        })
    }
}

fn label_finding(source: &dyn ObservationSource, mut finding: Finding) -> Finding {
    match source.category_label(&finding.category_id) {
        Ok(label) => finding.category_label = label,
        Err(e) => warn!(
            error = %e,
            category = %finding.category_id,
            "Category label lookup failed"
        ),
    }
    finding
}
