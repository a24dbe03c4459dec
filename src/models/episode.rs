use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{ServiceError, ServiceResult};
use crate::models::workflow::WorkflowRun;

pub const MAX_TITLE_CHARS: usize = 200;

/// Processing status of an episode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    Pending,
    Uploaded,
    Processing,
    Transcribing,
    Drafting,
    Completed,
    Failed,
}

impl EpisodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::Pending => "pending",
            EpisodeStatus::Uploaded => "uploaded",
            EpisodeStatus::Processing => "processing",
            EpisodeStatus::Transcribing => "transcribing",
            EpisodeStatus::Drafting => "drafting",
            EpisodeStatus::Completed => "completed",
            EpisodeStatus::Failed => "failed",
        }
    }
}

/// Where the episode audio comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Upload,
    Url,
}

/// A podcast episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    /// Public URL of the stored audio
    pub audio_url: Option<String>,
    /// Local path of the stored audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    pub duration_secs: Option<u64>,
    pub status: EpisodeStatus,
    pub workspace_id: String,
    pub user_id: String,
    pub brand_voice_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_workspace() -> String {
    "default".to_string()
}

/// Episode creation request
#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeCreate {
    pub title: String,
    pub description: Option<String>,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    #[serde(default = "default_workspace")]
    pub workspace_id: String,
    pub brand_voice_id: Option<String>,
}

impl EpisodeCreate {
    pub fn validate(&self) -> ServiceResult<()> {
        validate_title(&self.title)?;
        if self.source_type == SourceType::Url {
            match self.source_url.as_deref() {
                Some(url) if is_http_url(url) => {}
                Some(url) => {
                    return Err(ServiceError::ValidationError(format!(
                        "source_url must be an http(s) URL, got '{}'",
                        url
                    )))
                }
                None => {
                    return Err(ServiceError::ValidationError(
                        "source_url is required when source_type is 'url'".to_string(),
                    ))
                }
            }
        }
        if self.workspace_id.trim().is_empty() {
            return Err(ServiceError::ValidationError("workspace_id must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Partial episode update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodeUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<EpisodeStatus>,
}

impl EpisodeUpdate {
    pub fn validate(&self) -> ServiceResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        Ok(())
    }
}

/// Where and how to upload episode audio
#[derive(Debug, Clone, Serialize)]
pub struct UploadTarget {
    pub episode_id: String,
    pub upload_url: String,
    pub method: String,
    pub max_file_size: u64,
    pub allowed_formats: Vec<String>,
}

/// Episode status together with its latest workflow run
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeStatusView {
    pub episode_id: String,
    pub status: EpisodeStatus,
    pub workflow: Option<WorkflowRun>,
}

fn validate_title(title: &str) -> ServiceResult<()> {
    let length = title.trim().chars().count();
    if length == 0 {
        return Err(ServiceError::ValidationError("title must not be empty".to_string()));
    }
    if length > MAX_TITLE_CHARS {
        return Err(ServiceError::ValidationError(format!(
            "title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(())
}

pub fn is_http_url(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}
