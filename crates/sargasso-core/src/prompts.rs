//! Prompt library for the narration gateway
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/sargasso/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Prompt files carry YAML frontmatter (`id`, `version`, `task_type`) followed
//! by `# System` and `# User` sections. Templates use `{{var}}` placeholders
//! and `{{#if var}}...{{/if}}` blocks.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const HYPOTHESIS: &str = include_str!("../../../prompts/hypothesis.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// One-sentence ecological hypothesis from a finding
    Hypothesis,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hypothesis => "hypothesis",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[Self::Hypothesis]
    }

    /// Look up a prompt by its string identifier
    pub fn parse(id: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.as_str() == id)
    }

    /// Get the default embedded content for this prompt
    fn default_content(&self) -> &'static str {
        match self {
            Self::Hypothesis => defaults::HYPOTHESIS,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    /// Unique identifier
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    /// Kind of generation this prompt asks for
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// The prompt content (system + user sections)
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    /// Get the system section of the prompt
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    /// Get the user section of the prompt
    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the whole body with template variables replaced
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        substitute(&self.content, vars)
    }

    /// Render system and user sections as one plain-text prompt
    ///
    /// Section headers are dropped; a prompt without sections renders whole.
    pub fn render_combined(&self, vars: &HashMap<&str, &str>) -> String {
        match (self.system_section(), self.user_section()) {
            (Some(system), Some(user)) => {
                substitute(&format!("{}\n\n{}", system, user), vars)
            }
            (None, Some(user)) => substitute(user, vars),
            _ => self.render(vars),
        }
    }
}

/// Prompt library resolving overrides against embedded defaults
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self { override_dir: None }
    }

    /// Load a prompt (checking override first, then default)
    pub fn get(&self, id: PromptId) -> Result<Prompt> {
        if let Some(override_path) = self.override_path(id) {
            if override_path.exists() {
                let content = fs::read_to_string(&override_path).map_err(|e| {
                    Error::InvalidData(format!("Failed to read prompt override: {}", e))
                })?;
                let (metadata, body) = parse_prompt(&content)?;
                tracing::debug!(prompt = id.as_str(), path = %override_path.display(), "Using prompt override");
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                    override_path: Some(override_path),
                });
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    /// List all prompts with their override status
    pub fn list(&self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let has_override = self.has_override(id);
                let prompt = self.get(id).ok();
                PromptInfo {
                    id: id.as_str().to_string(),
                    version: prompt.as_ref().map(|p| p.metadata.version).unwrap_or(0),
                    task_type: prompt
                        .map(|p| p.metadata.task_type)
                        .unwrap_or_default(),
                    has_override,
                    override_path: if has_override {
                        self.override_path(id)
                    } else {
                        None
                    },
                }
            })
            .collect()
    }

    /// Check if a prompt has an override file
    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_path(id).is_some_and(|p| p.exists())
    }

    /// Get the override directory path
    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub task_type: String,
    pub has_override: bool,
    pub override_path: Option<PathBuf>,
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sargasso").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Extract a section from the prompt content
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];

    // Find the next header or end of content
    let end = after_header.find("\n# ").unwrap_or(after_header.len());

    Some(after_header[..end].trim())
}

/// Resolve conditional blocks, then replace `{{var}}` placeholders
///
/// Placeholders are filled in one left-to-right pass over the template, so
/// text inside a value is never expanded again. Unknown names stay verbatim.
fn substitute(template: &str, vars: &HashMap<&str, &str>) -> String {
    let template = remove_unmatched_conditionals(template, vars);
    let mut result = String::with_capacity(template.len());
    let mut rest = template.as_str();

    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        let name = &rest[open + 2..open + 2 + close];
        let end = open + 2 + close + 2;

        result.push_str(&rest[..open]);
        match vars.get(name) {
            Some(value) => result.push_str(value),
            None => result.push_str(&rest[open..end]),
        }
        rest = &rest[end..];
    }
    result.push_str(rest);
    result
}

/// Resolve `{{#if var}}...{{/if}}` blocks against the variable map
fn remove_unmatched_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = content.to_string();

    loop {
        let Some(if_start) = result.find("{{#if ") else {
            break;
        };
        let var_start = if_start + 6;
        let Some(var_end) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = &result[var_start..var_start + var_end];
        let block_start = var_start + var_end + 2;

        let Some(endif_pos) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let block_content = &result[block_start..block_start + endif_pos];
        let full_end = block_start + endif_pos + 7;

        let should_include = vars.get(var_name).is_some_and(|v| !v.is_empty());
        result = if should_include {
            format!(
                "{}{}{}",
                &result[..if_start],
                block_content,
                &result[full_end..]
            )
        } else {
            format!("{}{}", &result[..if_start], &result[full_end..])
        };
    }

    result
}
