use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{ServiceError, ServiceResult};

/// Lifecycle of a draft
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Draft,
    Generating,
    Completed,
    Published,
}

/// Transcript passage backing a part of the post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub speaker: Option<String>,
    pub confidence: f64,
    pub section: Option<String>,
}

/// Generation details stored with a draft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftMetadata {
    pub key_takeaways: Vec<String>,
    pub word_count: usize,
    pub generated_at: DateTime<Utc>,
    /// `language_model` or `extractive`
    pub generator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<serde_json::Value>,
}

/// Versioned blog post generated from an episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Draft {
    pub id: String,
    pub episode_id: String,
    pub title: String,
    /// Markdown body
    pub content: String,
    pub version: u32,
    pub status: DraftStatus,
    pub citations: Vec<Citation>,
    pub metadata: DraftMetadata,
    pub brand_voice_id: Option<String>,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short listing entry for the version history
#[derive(Debug, Clone, Serialize)]
pub struct DraftVersion {
    pub id: String,
    pub version: u32,
    pub status: DraftStatus,
    pub title: String,
    pub parent_id: Option<String>,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Draft> for DraftVersion {
    fn from(draft: &Draft) -> Self {
        Self {
            id: draft.id.clone(),
            version: draft.version,
            status: draft.status,
            title: draft.title.clone(),
            parent_id: draft.parent_id.clone(),
            word_count: draft.metadata.word_count,
            created_at: draft.created_at,
        }
    }
}

/// Partial draft update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<DraftStatus>,
    pub citations: Option<Vec<Citation>>,
    pub brand_voice_id: Option<String>,
}

impl DraftUpdate {
    pub fn validate(&self) -> ServiceResult<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ServiceError::ValidationError("title must not be empty".to_string()));
            }
        }
        if let Some(citations) = &self.citations {
            for citation in citations {
                if citation.end_ms < citation.start_ms {
                    return Err(ServiceError::ValidationError(
                        "citation end_ms must not be before start_ms".to_string(),
                    ));
                }
                if !(0.0..=1.0).contains(&citation.confidence) {
                    return Err(ServiceError::ValidationError(
                        "citation confidence must be between 0 and 1".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Requested length of a revision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RevisionLength {
    Short,
    Medium,
    Long,
}

/// Requested layout of a revision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStructure {
    Standard,
    Listicle,
}

/// Request to derive a new draft version from an existing one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevisionRequest {
    #[serde(default)]
    pub constraints: HashMap<String, serde_json::Value>,
    pub tone: Option<String>,
    pub length: Option<RevisionLength>,
    pub structure: Option<RevisionStructure>,
}

impl RevisionRequest {
    /// Banned terms passed through the free-form constraints
    pub fn banned_terms(&self) -> Vec<String> {
        self.constraints
            .get("banned_terms")
            .and_then(|value| value.as_array())
            .map(|terms| {
                terms
                    .iter()
                    .filter_map(|term| term.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Style instructions passed through the free-form constraints
    pub fn style_guide(&self) -> String {
        self.constraints
            .iter()
            .filter(|(key, _)| key.as_str() != "banned_terms")
            .map(|(key, value)| match value.as_str() {
                Some(text) => format!("{}: {}", key, text),
                None => format!("{}: {}", key, value),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
