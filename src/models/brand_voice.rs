use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{ServiceError, ServiceResult};

/// Tone and vocabulary rules applied to generated content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandVoice {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub description: Option<String>,
    pub tone: String,
    pub style_guide: String,
    pub banned_terms: Vec<String>,
    pub tone_examples: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BrandVoice {
    /// Prompt fragment describing the voice
    pub fn instructions(&self) -> String {
        format!("Tone: {}, Style: {}", self.tone, self.style_guide)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandVoiceCreate {
    pub workspace_id: String,
    pub name: String,
    pub description: Option<String>,
    pub tone: String,
    #[serde(default)]
    pub style_guide: String,
    #[serde(default)]
    pub banned_terms: Vec<String>,
    #[serde(default)]
    pub tone_examples: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl BrandVoiceCreate {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.workspace_id.trim().is_empty() {
            return Err(ServiceError::ValidationError("workspace_id must not be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(ServiceError::ValidationError("name must not be empty".to_string()));
        }
        if self.tone.trim().is_empty() {
            return Err(ServiceError::ValidationError("tone must not be empty".to_string()));
        }
        validate_terms(&self.banned_terms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandVoiceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tone: Option<String>,
    pub style_guide: Option<String>,
    pub banned_terms: Option<Vec<String>>,
    pub tone_examples: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl BrandVoiceUpdate {
    pub fn validate(&self) -> ServiceResult<()> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(ServiceError::ValidationError("name must not be empty".to_string()));
        }
        if matches!(&self.tone, Some(tone) if tone.trim().is_empty()) {
            return Err(ServiceError::ValidationError("tone must not be empty".to_string()));
        }
        match &self.banned_terms {
            Some(terms) => validate_terms(terms),
            None => Ok(()),
        }
    }
}

fn validate_terms(terms: &[String]) -> ServiceResult<()> {
    if terms.iter().any(|term| term.trim().is_empty()) {
        return Err(ServiceError::ValidationError("banned terms must not be empty".to_string()));
    }
    Ok(())
}

/// Banned term found in content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TermViolation {
    pub term: String,
    pub occurrences: usize,
}

/// Result of checking content against a brand voice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceReport {
    pub is_compliant: bool,
    pub violations: Vec<TermViolation>,
    pub suggestions: Vec<String>,
    pub score: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateContentRequest {
    pub content: String,
}
