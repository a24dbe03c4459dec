use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::episode::EpisodeStatus;

/// State of a workflow run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Initialized,
    Validating,
    Transcribing,
    Generating,
    Finalizing,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Initialized => "initialized",
            WorkflowStatus::Validating => "validating",
            WorkflowStatus::Transcribing => "transcribing",
            WorkflowStatus::Generating => "generating",
            WorkflowStatus::Finalizing => "finalizing",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Cancelled => "cancelled",
        }
    }
}

/// Pipeline steps in execution order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Validation,
    Transcription,
    Segmentation,
    Generation,
    Optimization,
    Finalization,
}

impl StepKind {
    pub const ALL: [StepKind; 6] = [
        StepKind::Validation,
        StepKind::Transcription,
        StepKind::Segmentation,
        StepKind::Generation,
        StepKind::Optimization,
        StepKind::Finalization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Validation => "validation",
            StepKind::Transcription => "transcription",
            StepKind::Segmentation => "segmentation",
            StepKind::Generation => "generation",
            StepKind::Optimization => "optimization",
            StepKind::Finalization => "finalization",
        }
    }

    /// Run progress once this step has completed
    pub fn progress(&self) -> f64 {
        match self {
            StepKind::Validation => 10.0,
            StepKind::Transcription => 50.0,
            StepKind::Segmentation => 60.0,
            StepKind::Generation => 85.0,
            StepKind::Optimization => 95.0,
            StepKind::Finalization => 100.0,
        }
    }

    /// Run status while this step executes
    pub fn workflow_status(&self) -> WorkflowStatus {
        match self {
            StepKind::Validation => WorkflowStatus::Validating,
            StepKind::Transcription => WorkflowStatus::Transcribing,
            StepKind::Segmentation | StepKind::Generation => WorkflowStatus::Generating,
            StepKind::Optimization | StepKind::Finalization => WorkflowStatus::Finalizing,
        }
    }

    /// Episode status entered when this step starts, if it changes
    pub fn episode_status(&self) -> Option<EpisodeStatus> {
        match self {
            StepKind::Validation => Some(EpisodeStatus::Processing),
            StepKind::Transcription => Some(EpisodeStatus::Transcribing),
            StepKind::Generation => Some(EpisodeStatus::Drafting),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowStep {
    pub kind: StepKind,
    pub status: StepStatus,
    pub attempts: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<f64>,
    pub error: Option<String>,
}

impl WorkflowStep {
    pub fn pending(kind: StepKind) -> Self {
        Self {
            kind,
            status: StepStatus::Pending,
            attempts: 0,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            error: None,
        }
    }
}

/// One execution of the pipeline for an episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowRun {
    pub id: String,
    pub episode_id: String,
    pub user_id: String,
    pub status: WorkflowStatus,
    pub progress: f64,
    pub current_step: Option<StepKind>,
    pub steps: Vec<WorkflowStep>,
    pub transcript_id: Option<String>,
    pub draft_id: Option<String>,
    pub error: Option<String>,
    pub logs: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    pub fn new(id: String, episode_id: String, user_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            episode_id,
            user_id,
            status: WorkflowStatus::Initialized,
            progress: 0.0,
            current_step: None,
            steps: StepKind::ALL.iter().copied().map(WorkflowStep::pending).collect(),
            transcript_id: None,
            draft_id: None,
            error: None,
            logs: Vec::new(),
            started_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    pub fn step_mut(&mut self, kind: StepKind) -> Option<&mut WorkflowStep> {
        self.steps.iter_mut().find(|step| step.kind == kind)
    }

    pub fn step(&self, kind: StepKind) -> Option<&WorkflowStep> {
        self.steps.iter().find(|step| step.kind == kind)
    }

    /// Append a timestamped log line and return it
    pub fn log(&mut self, message: &str) -> String {
        let now = Utc::now();
        let line = format!("[{}] {}", now.to_rfc3339(), message);
        self.logs.push(line.clone());
        self.updated_at = now;
        line
    }

    /// Total wall time of a finished run, in seconds
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds().max(0) as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_has_all_steps_pending() {
        let run = WorkflowRun::new("r".into(), "e".into(), "u".into());
        assert_eq!(run.status, WorkflowStatus::Initialized);
        assert_eq!(run.steps.len(), 6);
        assert!(run.steps.iter().all(|s| s.status == StepStatus::Pending));
        assert_eq!(run.steps[0].kind, StepKind::Validation);
        assert_eq!(run.steps[5].kind, StepKind::Finalization);
    }

    #[test]
    fn test_step_progress_is_monotonic() {
        let progress: Vec<f64> = StepKind::ALL.iter().map(|s| s.progress()).collect();
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(progress.last(), Some(&100.0));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(StepKind::Segmentation.workflow_status(), WorkflowStatus::Generating);
        assert_eq!(StepKind::Optimization.workflow_status(), WorkflowStatus::Finalizing);
        assert!(WorkflowStatus::Cancelled.is_terminal());
        assert!(!WorkflowStatus::Generating.is_terminal());
    }

    #[test]
    fn test_log_lines_are_timestamped() {
        let mut run = WorkflowRun::new("r".into(), "e".into(), "u".into());
        let line = run.log("Validating input");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Validating input"));
        assert_eq!(run.logs.len(), 1);
    }
}
