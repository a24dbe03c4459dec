use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};

use crate::core::error::{ServiceError, ServiceResult};
use crate::core::events::{EventHub, WorkflowEvent};
use crate::core::orchestrator::{PipelineState, StepExecutor};
use crate::core::store::Store;
use crate::models::seo::OptimizationRequest;
use crate::models::{Draft, Episode, StepKind};
use crate::services::ai::retrieval::SegmentIndex;
use crate::services::ai::TranscriptionService;
use crate::services::drafts::DraftService;
use crate::services::seo::SeoService;

/// Step executor wiring the episode services into the workflow orchestrator
pub struct EpisodePipeline {
    store: Arc<Store>,
    events: Arc<EventHub>,
    transcription: Arc<TranscriptionService>,
    drafts: Arc<DraftService>,
    seo: Arc<SeoService>,
}

impl EpisodePipeline {
    pub fn new(
        store: Arc<Store>,
        events: Arc<EventHub>,
        transcription: Arc<TranscriptionService>,
        drafts: Arc<DraftService>,
        seo: Arc<SeoService>,
    ) -> Self {
        Self {
            store,
            events,
            transcription,
            drafts,
            seo,
        }
    }

    fn episode(&self, episode_id: &str) -> ServiceResult<Episode> {
        self.store
            .episodes
            .get(episode_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Episode {}", episode_id)))
    }

    fn validate(&self, episode_id: &str) -> ServiceResult<()> {
        let episode = self.episode(episode_id)?;
        if episode.audio_file.is_none() && episode.source_url.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "Episode {} has no audio file or source URL",
                episode_id
            )));
        }
        Ok(())
    }

    async fn transcribe(&self, episode_id: &str, state: &mut PipelineState) -> ServiceResult<()> {
        let episode = self.episode(episode_id)?;
        let view = self.transcription.transcribe(&episode).await?;
        state.transcript_id = Some(view.transcript.id.clone());
        state.segment_count = view.segments.len();
        Ok(())
    }

    fn segment(&self, episode_id: &str, state: &mut PipelineState) -> ServiceResult<()> {
        let transcript = self.store.transcript_for_episode(episode_id).ok_or_else(|| {
            ServiceError::ProcessingError(format!("Transcript of episode {} disappeared", episode_id))
        })?;
        let index = SegmentIndex::build(&self.store.segments_for(&transcript.id));
        if index.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "Transcript of episode {} has no usable text",
                episode_id
            )));
        }
        state.chunk_count = index.len();
        debug!("Episode {} indexed into {} chunks", episode_id, state.chunk_count);
        Ok(())
    }

    async fn generate(&self, episode_id: &str, state: &mut PipelineState) -> ServiceResult<()> {
        let episode = self.episode(episode_id)?;
        let events = Arc::clone(&self.events);
        let user_id = episode.user_id.clone();
        let id = episode.id.clone();
        let report = move |progress: f64, section: Option<&str>| {
            events.publish(
                Some(&user_id),
                WorkflowEvent::ContentGenerationProgress {
                    episode_id: id.clone(),
                    progress,
                    section: section.map(str::to_string),
                    timestamp: Utc::now(),
                },
            );
        };

        let draft = self.drafts.generate_for(&episode, None, None, Some(&report)).await?;
        state.draft_id = Some(draft.id);
        Ok(())
    }

    fn optimize(&self, episode_id: &str, state: &PipelineState) -> ServiceResult<()> {
        let draft = self.draft(state)?;
        let owner = self.episode(episode_id)?.user_id;
        let candidates: Vec<Draft> = self
            .store
            .episodes
            .filter(|e| e.user_id == owner)
            .iter()
            .filter_map(|e| self.store.drafts_for(&e.id).pop())
            .collect();
        self.seo
            .optimize_draft(&draft, &candidates, &OptimizationRequest::default());
        Ok(())
    }

    fn finalize(&self, episode_id: &str, state: &PipelineState) -> ServiceResult<()> {
        let draft = self.draft(state)?;
        let episode = self.episode(episode_id)?;
        self.events.publish(
            Some(&episode.user_id),
            WorkflowEvent::DraftReady {
                episode_id: episode.id.clone(),
                draft_id: draft.id.clone(),
                title: draft.title.clone(),
                timestamp: Utc::now(),
            },
        );
        info!("Draft {} of episode {} is ready", draft.id, episode.id);
        Ok(())
    }

    fn draft(&self, state: &PipelineState) -> ServiceResult<Draft> {
        state
            .draft_id
            .as_deref()
            .and_then(|id| self.store.drafts.get(id))
            .ok_or_else(|| ServiceError::ProcessingError("No draft was generated".to_string()))
    }
}

#[async_trait]
impl StepExecutor for EpisodePipeline {
    async fn execute(&self, step: StepKind, episode_id: &str, state: &mut PipelineState) -> ServiceResult<()> {
        match step {
            StepKind::Validation => self.validate(episode_id),
            StepKind::Transcription => self.transcribe(episode_id, state).await,
            StepKind::Segmentation => self.segment(episode_id, state),
            StepKind::Generation => self.generate(episode_id, state).await,
            StepKind::Optimization => self.optimize(episode_id, state),
            StepKind::Finalization => self.finalize(episode_id, state),
        }
    }
}
