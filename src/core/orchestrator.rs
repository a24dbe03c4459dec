use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Semaphore};
use uuid::Uuid;

use crate::config::WorkflowSettings;
use crate::core::error::{ServiceError, ServiceResult};
use crate::core::events::{EventHub, WorkflowEvent};
use crate::core::metrics::{measure_execution_time, PipelineMetrics};
use crate::core::store::Store;
use crate::models::episode::EpisodeStatus;
use crate::models::workflow::{StepKind, StepStatus, WorkflowRun, WorkflowStatus};

/// Values handed from one pipeline step to the next
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub transcript_id: Option<String>,
    pub segment_count: usize,
    pub chunk_count: usize,
    pub draft_id: Option<String>,
}

/// Executes individual pipeline steps for an episode
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(
        &self,
        step: StepKind,
        episode_id: &str,
        state: &mut PipelineState,
    ) -> ServiceResult<()>;
}

/// Execution limits of the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum number of runs executing at once
    pub max_concurrent: usize,
    pub transcription_timeout: Duration,
    pub generation_timeout: Duration,
    /// Timeout of every other step
    pub step_timeout: Duration,
    /// Retries per step after the first attempt
    pub max_retries: u32,
    /// First retry delay; doubled on every further attempt
    pub base_backoff: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            transcription_timeout: Duration::from_secs(3600),
            generation_timeout: Duration::from_secs(1800),
            step_timeout: Duration::from_secs(300),
            max_retries: 2,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl From<&WorkflowSettings> for OrchestratorConfig {
    fn from(settings: &WorkflowSettings) -> Self {
        Self {
            max_concurrent: settings.max_concurrent.max(1),
            transcription_timeout: Duration::from_secs(settings.transcription_timeout_secs),
            generation_timeout: Duration::from_secs(settings.generation_timeout_secs),
            max_retries: settings.max_retries,
            ..Self::default()
        }
    }
}

impl OrchestratorConfig {
    pub fn timeout_for(&self, step: StepKind) -> Duration {
        match step {
            StepKind::Transcription => self.transcription_timeout,
            StepKind::Generation => self.generation_timeout,
            _ => self.step_timeout,
        }
    }
}

/// Delay before retry number `attempt` (0-based), with +/-20% jitter
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponential = base.as_secs_f64() * 2f64.powi(attempt.min(16) as i32);
    let jitter = rand::thread_rng().gen_range(0.8..=1.2);
    Duration::from_secs_f64(exponential * jitter)
}

/// Resolves once the cancel flag is raised
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Runs the episode pipeline: one task per run, bounded by a semaphore
pub struct WorkflowOrchestrator {
    store: Arc<Store>,
    events: Arc<EventHub>,
    metrics: Arc<PipelineMetrics>,
    executor: Arc<dyn StepExecutor>,
    config: OrchestratorConfig,
    permits: Arc<Semaphore>,
    /// Cancel switches of runs that have not finished yet, by episode
    active: DashMap<String, watch::Sender<bool>>,
}

impl WorkflowOrchestrator {
    pub fn new(
        store: Arc<Store>,
        events: Arc<EventHub>,
        metrics: Arc<PipelineMetrics>,
        executor: Arc<dyn StepExecutor>,
        config: OrchestratorConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            store,
            events,
            metrics,
            executor,
            config,
            permits,
            active: DashMap::new(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Start a run for an episode; fails with a conflict if one is already active
    pub fn start(self: &Arc<Self>, episode_id: &str) -> ServiceResult<WorkflowRun> {
        let episode = self
            .store
            .episodes
            .get(episode_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Episode {}", episode_id)))?;

        let cancel_rx = match self.active.entry(episode_id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(ServiceError::Conflict(format!(
                    "A workflow is already running for episode {}",
                    episode_id
                )))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(false);
                slot.insert(tx);
                rx
            }
        };

        let mut run = WorkflowRun::new(
            Uuid::new_v4().to_string(),
            episode.id.clone(),
            episode.user_id.clone(),
        );
        run.log(&format!("Workflow initialized for episode {}", episode.id));
        self.store.workflow_runs.insert(run.clone());
        self.metrics.record_started();
        info!("Workflow {} queued for episode {}", run.id, episode.id);
        self.publish_status(&run);

        let this = Arc::clone(self);
        let queued = run.clone();
        tokio::spawn(async move {
            this.drive(queued, cancel_rx).await;
        });

        Ok(run)
    }

    /// Latest run of an episode, active or finished
    pub fn status(&self, episode_id: &str) -> Option<WorkflowRun> {
        self.store.workflow_runs.get(episode_id)
    }

    pub fn is_active(&self, episode_id: &str) -> bool {
        self.active.contains_key(episode_id)
    }

    pub fn list_active(&self) -> Vec<WorkflowRun> {
        let mut runs: Vec<WorkflowRun> = self
            .active
            .iter()
            .filter_map(|entry| self.store.workflow_runs.get(entry.key()))
            .collect();
        runs.sort_by_key(|run| run.started_at);
        runs
    }

    /// Ask the run of an episode to stop; false when nothing is running
    pub fn cancel(&self, episode_id: &str) -> bool {
        match self.active.get(episode_id) {
            Some(switch) => {
                info!("Cancellation requested for episode {}", episode_id);
                switch.send(true).is_ok()
            }
            None => false,
        }
    }

    async fn drive(self: Arc<Self>, mut run: WorkflowRun, mut cancel_rx: watch::Receiver<bool>) {
        let episode_id = run.episode_id.clone();

        let permit = tokio::select! {
            permit = Arc::clone(&self.permits).acquire_owned() => permit.ok(),
            _ = cancelled(&mut cancel_rx) => None,
        };

        let outcome = match permit {
            Some(_permit) => self.execute_steps(&mut run, &mut cancel_rx).await,
            None => Err(ServiceError::Cancelled("Cancelled before start".to_string())),
        };

        self.finish(&mut run, outcome);
        self.active.remove(&episode_id);
    }

    async fn execute_steps(
        &self,
        run: &mut WorkflowRun,
        cancel_rx: &mut watch::Receiver<bool>,
    ) -> ServiceResult<()> {
        let mut state = PipelineState::default();
        for step in StepKind::ALL {
            if *cancel_rx.borrow() {
                return Err(ServiceError::Cancelled(format!("Cancelled before {}", step.as_str())));
            }
            self.begin_step(run, step);
            self.run_step(run, step, &mut state, cancel_rx).await?;
            self.complete_step(run, step, &state);
        }
        Ok(())
    }

    fn begin_step(&self, run: &mut WorkflowRun, step: StepKind) {
        run.status = step.workflow_status();
        run.current_step = Some(step);
        if let Some(entry) = run.step_mut(step) {
            entry.status = StepStatus::Running;
            entry.started_at = Some(Utc::now());
        }
        let line = run.log(&format!("Starting {}", step.as_str()));
        self.save(run);

        if let Some(status) = step.episode_status() {
            self.set_episode_status(&run.episode_id, status);
        }
        self.publish_status(run);
        self.publish_log(run, line);
    }

    async fn run_step(
        &self,
        run: &mut WorkflowRun,
        step: StepKind,
        state: &mut PipelineState,
        cancel_rx: &mut watch::Receiver<bool>,
    ) -> ServiceResult<()> {
        let timeout = self.config.timeout_for(step);
        let episode_id = run.episode_id.clone();
        let mut attempt: u32 = 0;
        loop {
            if let Some(entry) = run.step_mut(step) {
                entry.attempts = attempt + 1;
            }

            let work = async {
                match tokio::time::timeout(timeout, self.executor.execute(step, &episode_id, state)).await {
                    Ok(result) => result,
                    Err(_) => Err(ServiceError::Timeout(format!(
                        "{} exceeded {}s",
                        step.as_str(),
                        timeout.as_secs()
                    ))),
                }
            };
            let (result, elapsed_ms) = tokio::select! {
                timed = measure_execution_time(work) => timed,
                _ = cancelled(cancel_rx) => {
                    return Err(ServiceError::Cancelled(format!("Cancelled during {}", step.as_str())));
                }
            };

            match result {
                Ok(()) => {
                    self.metrics.observe_step(step.as_str(), "completed", elapsed_ms / 1000.0);
                    if let Some(entry) = run.step_mut(step) {
                        entry.duration_ms = Some(elapsed_ms);
                    }
                    return Ok(());
                }
                Err(e) => {
                    self.metrics.observe_step(step.as_str(), "failed", elapsed_ms / 1000.0);
                    if !e.is_retryable() || attempt >= self.config.max_retries {
                        if let Some(entry) = run.step_mut(step) {
                            entry.duration_ms = Some(elapsed_ms);
                        }
                        return Err(e);
                    }

                    let delay = backoff_delay(self.config.base_backoff, attempt);
                    warn!(
                        "Step {} for episode {} failed (attempt {}): {}; retrying in {:?}",
                        step.as_str(),
                        episode_id,
                        attempt + 1,
                        e,
                        delay
                    );
                    self.metrics.record_retry(step.as_str());
                    let line = run.log(&format!(
                        "{} failed on attempt {}: {}; retrying",
                        step.as_str(),
                        attempt + 1,
                        e
                    ));
                    self.save(run);
                    self.publish_log(run, line);

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancelled(cancel_rx) => {
                            return Err(ServiceError::Cancelled(format!("Cancelled during {}", step.as_str())));
                        }
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn complete_step(&self, run: &mut WorkflowRun, step: StepKind, state: &PipelineState) {
        if let Some(entry) = run.step_mut(step) {
            entry.status = StepStatus::Completed;
            entry.finished_at = Some(Utc::now());
        }
        run.progress = step.progress();
        run.transcript_id = state.transcript_id.clone();
        run.draft_id = state.draft_id.clone();
        let line = run.log(&format!("Completed {}", step.as_str()));
        self.save(run);

        self.events.publish(
            Some(&run.user_id),
            WorkflowEvent::WorkflowProgress {
                episode_id: run.episode_id.clone(),
                step: step.as_str().to_string(),
                progress: run.progress,
                timestamp: Utc::now(),
            },
        );
        self.publish_log(run, line);
    }

    fn finish(&self, run: &mut WorkflowRun, outcome: ServiceResult<()>) {
        let now = Utc::now();
        match outcome {
            Ok(()) => {
                run.status = WorkflowStatus::Completed;
                run.progress = 100.0;
                run.current_step = None;
                run.log("Workflow completed successfully");
                self.set_episode_status(&run.episode_id, EpisodeStatus::Completed);
                info!("Workflow {} completed for episode {}", run.id, run.episode_id);
            }
            Err(e) => {
                let cancelled = matches!(e, ServiceError::Cancelled(_));
                run.status = if cancelled {
                    WorkflowStatus::Cancelled
                } else {
                    WorkflowStatus::Failed
                };
                run.error = Some(e.to_string());
                let step_status = if cancelled { StepStatus::Cancelled } else { StepStatus::Failed };
                if let Some(step) = run.current_step {
                    if let Some(entry) = run.step_mut(step) {
                        entry.status = step_status;
                        entry.error = Some(e.to_string());
                        entry.finished_at = Some(now);
                    }
                }
                let message = format!("Workflow {}: {}", run.status.as_str(), e);
                run.log(&message);
                self.set_episode_status(&run.episode_id, EpisodeStatus::Failed);

                if cancelled {
                    info!("Workflow {} cancelled for episode {}", run.id, run.episode_id);
                } else {
                    error!("Workflow {} failed for episode {}: {}", run.id, run.episode_id, e);
                }
                self.events.publish(
                    Some(&run.user_id),
                    WorkflowEvent::WorkflowError {
                        episode_id: run.episode_id.clone(),
                        step: run.current_step.map(|s| s.as_str().to_string()),
                        error: e.to_string(),
                        timestamp: now,
                    },
                );
            }
        }
        run.finished_at = Some(now);
        run.updated_at = now;
        self.save(run);

        self.metrics
            .record_finished(run.status, run.elapsed_secs().unwrap_or(0.0));

        self.publish_status(run);
        if run.status == WorkflowStatus::Completed {
            self.events.publish(
                Some(&run.user_id),
                WorkflowEvent::WorkflowCompleted {
                    episode_id: run.episode_id.clone(),
                    draft_id: run.draft_id.clone(),
                    timestamp: now,
                },
            );
        }
    }

    fn save(&self, run: &WorkflowRun) {
        self.store.workflow_runs.insert(run.clone());
    }

    fn set_episode_status(&self, episode_id: &str, status: EpisodeStatus) {
        let updated = self.store.episodes.update(episode_id, |episode| {
            episode.status = status;
            episode.updated_at = Utc::now();
        });
        if updated.is_none() {
            debug!("Episode {} vanished during its workflow", episode_id);
        }
    }

    fn publish_status(&self, run: &WorkflowRun) {
        self.events.publish(
            Some(&run.user_id),
            WorkflowEvent::WorkflowStatus {
                episode_id: run.episode_id.clone(),
                status: run.status,
                timestamp: Utc::now(),
            },
        );
    }

    fn publish_log(&self, run: &WorkflowRun, message: String) {
        self.events.publish(
            Some(&run.user_id),
            WorkflowEvent::WorkflowLog {
                episode_id: run.episode_id.clone(),
                message,
                timestamp: Utc::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::ChannelKind;
    use crate::core::store::fixtures;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Executor scripted per step: each call pops the next result
    #[derive(Default)]
    struct ScriptedExecutor {
        script: Mutex<HashMap<StepKind, Vec<ServiceResult<()>>>>,
        calls: Mutex<Vec<StepKind>>,
        hang_on: Option<StepKind>,
    }

    impl ScriptedExecutor {
        fn with(step: StepKind, results: Vec<ServiceResult<()>>) -> Self {
            let executor = Self::default();
            executor.script.lock().unwrap().insert(step, results);
            executor
        }

        fn calls(&self) -> Vec<StepKind> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StepExecutor for ScriptedExecutor {
        async fn execute(
            &self,
            step: StepKind,
            _episode_id: &str,
            state: &mut PipelineState,
        ) -> ServiceResult<()> {
            self.calls.lock().unwrap().push(step);
            if self.hang_on == Some(step) {
                std::future::pending::<()>().await;
            }
            if step == StepKind::Generation {
                state.draft_id = Some("draft-1".to_string());
            }
            let next = {
                let mut script = self.script.lock().unwrap();
                script.get_mut(&step).and_then(|results| {
                    if results.is_empty() {
                        None
                    } else {
                        Some(results.remove(0))
                    }
                })
            };
            next.unwrap_or(Ok(()))
        }
    }

    fn setup(executor: ScriptedExecutor, config: OrchestratorConfig) -> (Arc<WorkflowOrchestrator>, Arc<Store>, Arc<EventHub>, Arc<ScriptedExecutor>) {
        let store = Arc::new(Store::new());
        store.episodes.insert(fixtures::episode("e1", "alice"));
        let events = Arc::new(EventHub::default());
        let metrics = Arc::new(PipelineMetrics::new().unwrap());
        let executor = Arc::new(executor);
        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&events),
            metrics,
            executor.clone(),
            config,
        ));
        (orchestrator, store, events, executor)
    }

    fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig {
            base_backoff: Duration::from_millis(1),
            ..OrchestratorConfig::default()
        }
    }

    async fn wait_finished(orchestrator: &WorkflowOrchestrator, episode_id: &str) -> WorkflowRun {
        for _ in 0..500 {
            if let Some(run) = orchestrator.status(episode_id) {
                if run.status.is_terminal() && !orchestrator.is_active(episode_id) {
                    return run;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("workflow did not finish");
    }

    async fn wait_step_running(orchestrator: &WorkflowOrchestrator, episode_id: &str, step: StepKind) {
        for _ in 0..500 {
            let running = orchestrator
                .status(episode_id)
                .and_then(|run| run.step(step).map(|s| s.status == StepStatus::Running))
                .unwrap_or(false);
            if running {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("step {} never started", step.as_str());
    }

    #[tokio::test]
    async fn test_successful_run_walks_every_step() {
        let (orchestrator, store, events, executor) = setup(ScriptedExecutor::default(), fast_config());
        let mut sub = events.subscribe(ChannelKind::Episode, "e1");

        let run = orchestrator.start("e1").unwrap();
        assert_eq!(run.status, WorkflowStatus::Initialized);

        let run = wait_finished(&orchestrator, "e1").await;
        assert_eq!(run.status, WorkflowStatus::Completed);
        assert_eq!(run.progress, 100.0);
        assert_eq!(run.draft_id.as_deref(), Some("draft-1"));
        assert!(run.steps.iter().all(|s| s.status == StepStatus::Completed));
        assert_eq!(executor.calls(), StepKind::ALL.to_vec());
        assert_eq!(store.episodes.get("e1").unwrap().status, EpisodeStatus::Completed);
        assert!(run.logs.iter().any(|l| l.contains("Workflow completed successfully")));

        let mut saw_completed = false;
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(20), sub.recv()).await
        {
            if matches!(event, WorkflowEvent::WorkflowCompleted { .. }) {
                saw_completed = true;
            }
        }
        assert!(saw_completed);
    }

    #[tokio::test]
    async fn test_second_start_conflicts_while_active() {
        let executor = ScriptedExecutor {
            hang_on: Some(StepKind::Transcription),
            ..Default::default()
        };
        let (orchestrator, _store, _events, _executor) = setup(executor, fast_config());

        orchestrator.start("e1").unwrap();
        assert!(matches!(orchestrator.start("e1"), Err(ServiceError::Conflict(_))));
        assert_eq!(orchestrator.list_active().len(), 1);

        wait_step_running(&orchestrator, "e1", StepKind::Transcription).await;
        assert!(orchestrator.cancel("e1"));
        let run = wait_finished(&orchestrator, "e1").await;
        assert_eq!(run.status, WorkflowStatus::Cancelled);
        assert_eq!(run.step(StepKind::Transcription).unwrap().status, StepStatus::Cancelled);
        assert_eq!(run.step(StepKind::Generation).unwrap().status, StepStatus::Pending);
        assert!(!orchestrator.cancel("e1"));

        // A finished run can be started again
        assert!(orchestrator.start("e1").is_ok());
        orchestrator.cancel("e1");
    }

    #[tokio::test]
    async fn test_cancel_before_first_step_runs_nothing() {
        let (orchestrator, _store, _events, executor) = setup(ScriptedExecutor::default(), fast_config());

        orchestrator.start("e1").unwrap();
        assert!(orchestrator.cancel("e1"));
        let run = wait_finished(&orchestrator, "e1").await;
        assert_eq!(run.status, WorkflowStatus::Cancelled);
        assert_eq!(run.step(StepKind::Transcription).unwrap().status, StepStatus::Pending);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_retryable_errors_are_retried() {
        let executor = ScriptedExecutor::with(
            StepKind::Transcription,
            vec![
                Err(ServiceError::ProviderError("503".into())),
                Err(ServiceError::Timeout("slow".into())),
            ],
        );
        let (orchestrator, _store, _events, executor) = setup(executor, fast_config());

        orchestrator.start("e1").unwrap();
        let run = wait_finished(&orchestrator, "e1").await;
        assert_eq!(run.status, WorkflowStatus::Completed);
        assert_eq!(run.step(StepKind::Transcription).unwrap().attempts, 3);
        let transcription_calls = executor
            .calls()
            .iter()
            .filter(|s| **s == StepKind::Transcription)
            .count();
        assert_eq!(transcription_calls, 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_the_run() {
        let executor = ScriptedExecutor::with(
            StepKind::Generation,
            vec![
                Err(ServiceError::ProviderError("a".into())),
                Err(ServiceError::ProviderError("b".into())),
                Err(ServiceError::ProviderError("c".into())),
            ],
        );
        let (orchestrator, store, _events, _executor) = setup(executor, fast_config());

        orchestrator.start("e1").unwrap();
        let run = wait_finished(&orchestrator, "e1").await;
        assert_eq!(run.status, WorkflowStatus::Failed);
        assert!(run.error.as_deref().unwrap().ends_with(": c"));
        let generation = run.step(StepKind::Generation).unwrap();
        assert_eq!(generation.status, StepStatus::Failed);
        assert_eq!(generation.attempts, 3);
        assert_eq!(run.step(StepKind::Optimization).unwrap().status, StepStatus::Pending);
        assert_eq!(run.progress, StepKind::Segmentation.progress());
        assert_eq!(store.episodes.get("e1").unwrap().status, EpisodeStatus::Failed);
    }

    #[tokio::test]
    async fn test_validation_errors_are_not_retried() {
        let executor = ScriptedExecutor::with(
            StepKind::Validation,
            vec![Err(ServiceError::ValidationError("no audio".into()))],
        );
        let (orchestrator, _store, _events, executor) = setup(executor, fast_config());

        orchestrator.start("e1").unwrap();
        let run = wait_finished(&orchestrator, "e1").await;
        assert_eq!(run.status, WorkflowStatus::Failed);
        assert_eq!(executor.calls(), vec![StepKind::Validation]);
    }

    #[tokio::test]
    async fn test_step_timeout_is_enforced() {
        let executor = ScriptedExecutor {
            hang_on: Some(StepKind::Optimization),
            ..Default::default()
        };
        let config = OrchestratorConfig {
            step_timeout: Duration::from_millis(20),
            max_retries: 0,
            ..fast_config()
        };
        let (orchestrator, _store, _events, _executor) = setup(executor, config);

        orchestrator.start("e1").unwrap();
        let run = wait_finished(&orchestrator, "e1").await;
        assert_eq!(run.status, WorkflowStatus::Failed);
        assert!(run.error.as_deref().unwrap().contains("optimization exceeded"));
    }

    #[tokio::test]
    async fn test_unknown_episode_is_not_found() {
        let (orchestrator, _store, _events, _executor) = setup(ScriptedExecutor::default(), fast_config());
        assert!(matches!(orchestrator.start("missing"), Err(ServiceError::NotFound(_))));
        assert!(orchestrator.status("missing").is_none());
    }

    #[test]
    fn test_backoff_grows_with_jitter() {
        let base = Duration::from_millis(500);
        for attempt in 0..3 {
            let delay = backoff_delay(base, attempt).as_secs_f64();
            let nominal = 0.5 * 2f64.powi(attempt as i32);
            assert!(delay >= nominal * 0.8 - 1e-9 && delay <= nominal * 1.2 + 1e-9);
        }
    }

    #[test]
    fn test_timeouts_per_step() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.timeout_for(StepKind::Transcription), Duration::from_secs(3600));
        assert_eq!(config.timeout_for(StepKind::Generation), Duration::from_secs(1800));
        assert_eq!(config.timeout_for(StepKind::Finalization), Duration::from_secs(300));
    }
}
