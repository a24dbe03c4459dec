use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Export destination
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CmsType {
    Markdown,
    Html,
    Wordpress,
    Ghost,
    Medium,
    Webflow,
}

impl CmsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmsType::Markdown => "markdown",
            CmsType::Html => "html",
            CmsType::Wordpress => "wordpress",
            CmsType::Ghost => "ghost",
            CmsType::Medium => "medium",
            CmsType::Webflow => "webflow",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExportStatus {
    pub fn progress(&self) -> u8 {
        match self {
            ExportStatus::Pending => 0,
            ExportStatus::Processing => 50,
            ExportStatus::Completed | ExportStatus::Failed => 100,
        }
    }
}

/// Publication of a draft to a destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Export {
    pub id: String,
    pub draft_id: String,
    pub cms_type: CmsType,
    pub status: ExportStatus,
    pub url: Option<String>,
    pub log: Vec<String>,
    pub metadata: serde_json::Value,
    pub attempts: u32,
    pub error: Option<String>,
    /// Local file written by file-based exports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub cms_type: CmsType,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportProgress {
    pub id: String,
    pub status: ExportStatus,
    pub progress: u8,
    pub message: String,
}

impl From<&Export> for ExportProgress {
    fn from(export: &Export) -> Self {
        let message = match export.status {
            ExportStatus::Pending => "Export queued".to_string(),
            ExportStatus::Processing => "Export in progress".to_string(),
            ExportStatus::Completed => "Export completed successfully".to_string(),
            ExportStatus::Failed => format!(
                "Export failed: {}",
                export.error.as_deref().unwrap_or("unknown error")
            ),
        };
        Self {
            id: export.id.clone(),
            status: export.status,
            progress: export.status.progress(),
            message,
        }
    }
}
