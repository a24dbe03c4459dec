use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::debug;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use serde::{Deserialize, Serialize};

use crate::core::error::ServiceResult;
use crate::models::workflow::WorkflowStatus;

/// Running totals over finished workflow runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RunTotals {
    started: u64,
    completed: u64,
    failed: u64,
    cancelled: u64,
    /// Wall time of completed runs, in seconds
    completed_secs: f64,
    last_finished: Option<DateTime<Utc>>,
}

/// Summary of pipeline throughput used by the analytics overview
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub total_runs: u64,
    pub completed_runs: u64,
    pub failed_runs: u64,
    pub cancelled_runs: u64,
    /// Percentage of finished runs that completed
    pub success_rate: f64,
    /// Mean wall time of completed runs, in minutes
    pub avg_processing_minutes: f64,
    pub last_finished: Option<DateTime<Utc>>,
}

/// Prometheus instruments and run statistics for the workflow pipeline
#[derive(Debug)]
pub struct PipelineMetrics {
    registry: Registry,
    workflows_started: IntCounter,
    workflows_finished: IntCounterVec,
    step_duration: HistogramVec,
    step_retries: IntCounterVec,
    active_workflows: IntGauge,
    http_requests: IntCounterVec,
    totals: Mutex<RunTotals>,
}

impl PipelineMetrics {
    /// Create the instruments and register them in a private registry
    pub fn new() -> ServiceResult<Self> {
        let registry = Registry::new_custom(Some("echopress".to_string()), None)?;

        let workflows_started = IntCounter::new("workflows_started_total", "Workflow runs started")?;
        let workflows_finished = IntCounterVec::new(
            Opts::new("workflows_finished_total", "Workflow runs finished by outcome"),
            &["status"],
        )?;
        let step_duration = HistogramVec::new(
            HistogramOpts::new("workflow_step_duration_seconds", "Duration of pipeline steps")
                .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 3600.0]),
            &["step", "outcome"],
        )?;
        let step_retries = IntCounterVec::new(
            Opts::new("workflow_step_retries_total", "Pipeline step retries"),
            &["step"],
        )?;
        let active_workflows = IntGauge::new("workflows_active", "Workflow runs queued or executing")?;
        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests by status class"),
            &["class"],
        )?;

        registry.register(Box::new(workflows_started.clone()))?;
        registry.register(Box::new(workflows_finished.clone()))?;
        registry.register(Box::new(step_duration.clone()))?;
        registry.register(Box::new(step_retries.clone()))?;
        registry.register(Box::new(active_workflows.clone()))?;
        registry.register(Box::new(http_requests.clone()))?;

        Ok(Self {
            registry,
            workflows_started,
            workflows_finished,
            step_duration,
            step_retries,
            active_workflows,
            http_requests,
            totals: Mutex::new(RunTotals::default()),
        })
    }

    fn totals(&self) -> std::sync::MutexGuard<'_, RunTotals> {
        self.totals.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_started(&self) {
        self.workflows_started.inc();
        self.active_workflows.inc();
        self.totals().started += 1;
    }

    /// Record the outcome of a run started with [`PipelineMetrics::record_started`]
    pub fn record_finished(&self, status: WorkflowStatus, elapsed_secs: f64) {
        self.active_workflows.dec();
        self.workflows_finished.with_label_values(&[status.as_str()]).inc();
        let mut totals = self.totals();
        match status {
            WorkflowStatus::Completed => {
                totals.completed += 1;
                totals.completed_secs += elapsed_secs.max(0.0);
            }
            WorkflowStatus::Failed => totals.failed += 1,
            WorkflowStatus::Cancelled => totals.cancelled += 1,
            _ => return,
        }
        totals.last_finished = Some(Utc::now());
        debug!("Workflow finished as {} after {:.2}s", status.as_str(), elapsed_secs);
    }

    pub fn observe_step(&self, step: &str, outcome: &str, elapsed_secs: f64) {
        self.step_duration
            .with_label_values(&[step, outcome])
            .observe(elapsed_secs);
    }

    pub fn record_retry(&self, step: &str) {
        self.step_retries.with_label_values(&[step]).inc();
    }

    pub fn record_http_status(&self, status: u16) {
        let class = match status {
            100..=199 => "1xx",
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            _ => "5xx",
        };
        self.http_requests.with_label_values(&[class]).inc();
    }

    pub fn active(&self) -> i64 {
        self.active_workflows.get()
    }

    pub fn summary(&self) -> RunSummary {
        let totals = self.totals();
        let finished = totals.completed + totals.failed + totals.cancelled;
        RunSummary {
            total_runs: totals.started,
            completed_runs: totals.completed,
            failed_runs: totals.failed,
            cancelled_runs: totals.cancelled,
            success_rate: if finished > 0 {
                totals.completed as f64 / finished as f64 * 100.0
            } else {
                0.0
            },
            avg_processing_minutes: if totals.completed > 0 {
                totals.completed_secs / totals.completed as f64 / 60.0
            } else {
                0.0
            },
            last_finished: totals.last_finished,
        }
    }

    /// Prometheus text exposition of every instrument
    pub fn render(&self) -> ServiceResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Await a fallible future and report how long it took, in milliseconds
pub async fn measure_execution_time<F, T, E>(f: F) -> (Result<T, E>, f64)
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let result = f.await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    (result, duration_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_tracks_outcomes() {
        let metrics = PipelineMetrics::new().unwrap();
        for _ in 0..4 {
            metrics.record_started();
        }
        metrics.record_finished(WorkflowStatus::Completed, 120.0);
        metrics.record_finished(WorkflowStatus::Completed, 240.0);
        metrics.record_finished(WorkflowStatus::Failed, 10.0);
        metrics.record_finished(WorkflowStatus::Cancelled, 5.0);

        let summary = metrics.summary();
        assert_eq!(summary.total_runs, 4);
        assert_eq!(summary.completed_runs, 2);
        assert_eq!(summary.success_rate, 50.0);
        assert!((summary.avg_processing_minutes - 3.0).abs() < 1e-9);
        assert_eq!(metrics.active(), 0);
        assert!(summary.last_finished.is_some());
    }

    #[test]
    fn test_empty_summary() {
        let summary = PipelineMetrics::new().unwrap().summary();
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.avg_processing_minutes, 0.0);
    }

    #[test]
    fn test_render_exposes_instruments() {
        let metrics = PipelineMetrics::new().unwrap();
        metrics.record_started();
        metrics.observe_step("transcription", "completed", 1.5);
        metrics.record_http_status(404);

        let text = metrics.render().unwrap();
        assert!(text.contains("echopress_workflows_started_total 1"));
        assert!(text.contains("echopress_workflow_step_duration_seconds"));
        assert!(text.contains("class=\"4xx\""));
    }

    #[tokio::test]
    async fn test_measure_execution_time() {
        let (result, elapsed) = measure_execution_time(async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            Ok::<_, ()>(7)
        })
        .await;
        assert_eq!(result, Ok(7));
        assert!(elapsed >= 10.0);
    }
}
