use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::config::{Settings, CAPTION_FORMATS};
use crate::core::error::{ServiceError, ServiceResult};
use crate::core::events::{EventHub, WorkflowEvent};
use crate::core::store::Store;
use crate::models::episode::SourceType;
use crate::models::transcript::{
    Diarization, SegmentCreate, TranscriptUpdate, TranscriptView,
};
use crate::models::{Episode, Transcript, TranscriptSegment};
use crate::services::ai::llm::LanguageModel;
use crate::services::common::{file_extension, new_id};
use crate::services::episodes::remove_file_quietly;
use crate::services::text;

const TOPIC_PROMPT: &str = "Extract a short topic (1-3 words) from this text segment.";
const DEFAULT_TOPIC: &str = "general";
const DEFAULT_LANGUAGE: &str = "en";
/// Segments labelled concurrently when a language model is configured
const TOPIC_CONCURRENCY: usize = 4;

/// Timed text returned by a transcriber (times in seconds)
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub confidence: f64,
    pub speaker: Option<String>,
}

/// Provider-neutral transcription result
#[derive(Debug, Clone, PartialEq)]
pub struct RawTranscription {
    pub text: String,
    pub language: String,
    /// Seconds
    pub duration: Option<f64>,
    pub segments: Vec<RawSegment>,
    pub diarization: Option<Diarization>,
}

/// Speech or caption to text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &'static str;

    async fn transcribe(&self, path: &Path, language: &str) -> ServiceResult<RawTranscription>;
}

/// Log-probability to a 0..=1 confidence
pub fn logprob_to_confidence(avg_logprob: f64) -> f64 {
    if avg_logprob.is_nan() {
        return 0.0;
    }
    avg_logprob.exp().clamp(0.0, 1.0)
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    language: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
    #[serde(default)]
    avg_logprob: f64,
}

impl WhisperResponse {
    fn into_raw(self, requested_language: &str) -> RawTranscription {
        // verbose_json reports full language names; keep the requested code then
        let language = match self.language {
            Some(code) if code.len() <= 3 => code,
            _ => requested_language.to_string(),
        };
        RawTranscription {
            text: self.text.trim().to_string(),
            language,
            duration: self.duration,
            segments: self
                .segments
                .into_iter()
                .map(|s| RawSegment {
                    start: s.start,
                    end: s.end,
                    text: s.text.trim().to_string(),
                    confidence: logprob_to_confidence(s.avg_logprob),
                    speaker: None,
                })
                .collect(),
            diarization: None,
        }
    }
}

/// OpenAI audio transcription (`whisper-1`, `verbose_json`)
pub struct WhisperTranscriber {
    client: Client,
    api_key: String,
    base_url: String,
}

impl WhisperTranscriber {
    pub fn new(client: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    fn name(&self) -> &'static str {
        "whisper-1"
    }

    async fn transcribe(&self, path: &Path, language: &str) -> ServiceResult<RawTranscription> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();
        debug!("Uploading {} ({} bytes) for transcription", file_name, bytes.len());

        let form = Form::new()
            .text("model", "whisper-1")
            .text("response_format", "verbose_json")
            .text("language", language.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(3600))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::ProviderError(format!(
                "Transcription failed with status {}: {}",
                status.as_u16(),
                message
            )));
        }

        let body: WhisperResponse = response.json().await?;
        Ok(body.into_raw(language))
    }
}

/// Transcribes episodes and manages stored transcripts
pub struct TranscriptionService {
    store: Arc<Store>,
    events: Arc<EventHub>,
    settings: Arc<Settings>,
    client: Client,
    audio: Option<Arc<dyn Transcriber>>,
    captions: Arc<dyn Transcriber>,
    llm: Option<Arc<dyn LanguageModel>>,
}

impl TranscriptionService {
    pub fn new(
        store: Arc<Store>,
        events: Arc<EventHub>,
        settings: Arc<Settings>,
        client: Client,
        audio: Option<Arc<dyn Transcriber>>,
        captions: Arc<dyn Transcriber>,
        llm: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        Self {
            store,
            events,
            settings,
            client,
            audio,
            captions,
            llm,
        }
    }

    fn progress(&self, episode: &Episode, progress: f64, message: &str) {
        self.events.publish(
            Some(&episode.user_id),
            WorkflowEvent::TranscriptionProgress {
                episode_id: episode.id.clone(),
                progress,
                message: message.to_string(),
                timestamp: Utc::now(),
            },
        );
    }

    /// Transcribe an episode the caller owns
    pub async fn transcribe_for(&self, episode_id: &str, user_id: &str) -> ServiceResult<TranscriptView> {
        let episode = self.store.owned_episode(episode_id, user_id)?;
        self.transcribe(&episode).await
    }

    /// Run the matching transcriber and replace any stored transcript
    pub async fn transcribe(&self, episode: &Episode) -> ServiceResult<TranscriptView> {
        info!("Starting transcription for episode {}", episode.id);
        self.progress(episode, 0.0, "Resolving audio source");
        let path = self.resolve_source(episode).await?;

        let extension = path
            .to_str()
            .and_then(file_extension)
            .unwrap_or_default();
        let transcriber = if CAPTION_FORMATS.contains(&extension.as_str()) {
            Arc::clone(&self.captions)
        } else {
            match &self.audio {
                Some(transcriber) => Arc::clone(transcriber),
                None => {
                    return Err(ServiceError::ProviderError(
                        "No speech-to-text provider configured (OPENAI_API_KEY is not set)".to_string(),
                    ))
                }
            }
        };

        self.progress(episode, 10.0, &format!("Transcribing with {}", transcriber.name()));
        let raw = transcriber.transcribe(&path, DEFAULT_LANGUAGE).await?;
        if raw.segments.is_empty() && raw.text.trim().is_empty() {
            return Err(ServiceError::ProcessingError(format!(
                "Transcriber {} returned no text for episode {}",
                transcriber.name(),
                episode.id
            )));
        }

        self.progress(episode, 70.0, "Labelling segment topics");
        let topics = self.label_topics(&raw.segments).await;
        let view = self.store_transcription(episode, raw, topics, transcriber.name());

        self.progress(episode, 100.0, "Transcription completed");
        info!(
            "Transcribed episode {} into {} segments",
            episode.id,
            view.segments.len()
        );
        Ok(view)
    }

    fn store_transcription(
        &self,
        episode: &Episode,
        raw: RawTranscription,
        topics: Vec<String>,
        source: &str,
    ) -> TranscriptView {
        let now = Utc::now();
        let transcript_id = new_id();

        let segments: Vec<TranscriptSegment> = raw
            .segments
            .iter()
            .zip(topics)
            .enumerate()
            .map(|(index, (segment, topic))| {
                let start_ms = (segment.start.max(0.0) * 1000.0) as u64;
                let end_ms = ((segment.end.max(0.0) * 1000.0) as u64).max(start_ms);
                let speaker = segment.speaker.clone().or_else(|| {
                    raw.diarization
                        .as_ref()
                        .and_then(|d| d.speaker_for(start_ms, end_ms))
                        .map(str::to_string)
                });
                TranscriptSegment {
                    id: new_id(),
                    transcript_id: transcript_id.clone(),
                    index,
                    start_ms,
                    end_ms,
                    text: segment.text.clone(),
                    confidence: segment.confidence.clamp(0.0, 1.0),
                    speaker,
                    topic: Some(topic),
                    created_at: now,
                }
            })
            .collect();

        let confidence = if segments.is_empty() {
            0.0
        } else {
            segments.iter().map(|s| s.confidence).sum::<f64>() / segments.len() as f64
        };
        let text = if raw.text.trim().is_empty() {
            segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ")
        } else {
            raw.text.clone()
        };

        let transcript = Transcript {
            id: transcript_id,
            episode_id: episode.id.clone(),
            text,
            language: raw.language.clone(),
            confidence,
            diarization: raw.diarization.clone(),
            source: source.to_string(),
            created_at: now,
            updated_at: now,
        };

        let replaced = self.store.delete_transcripts_for(&episode.id);
        if replaced > 0 {
            debug!("Replaced {} previous transcript(s) of episode {}", replaced, episode.id);
        }
        self.store.transcripts.insert(transcript.clone());
        for segment in &segments {
            self.store.segments.insert(segment.clone());
        }
        if let Some(duration) = raw.duration {
            self.store.episodes.update(&episode.id, |e| {
                if e.duration_secs.is_none() {
                    e.duration_secs = Some(duration.round() as u64);
                }
            });
        }

        TranscriptView {
            transcript,
            segments,
        }
    }

    /// One topic per segment, in order
    async fn label_topics(&self, segments: &[RawSegment]) -> Vec<String> {
        match &self.llm {
            Some(llm) => {
                let texts: Vec<String> = segments.iter().map(|segment| segment.text.clone()).collect();
                stream::iter(texts.into_iter().map(|text| {
                    let llm = Arc::clone(llm);
                    async move {
                        match llm.complete(TOPIC_PROMPT, &text, 10, 0.1).await {
                            Ok(topic) if !topic.trim().is_empty() => {
                                topic.trim().trim_matches('"').trim_end_matches('.').to_string()
                            }
                            Ok(_) => DEFAULT_TOPIC.to_string(),
                            Err(e) => {
                                warn!("Topic extraction failed: {}", e);
                                DEFAULT_TOPIC.to_string()
                            }
                        }
                    }
                }))
                .buffered(TOPIC_CONCURRENCY)
                .collect()
                .await
            }
            None => segments.iter().map(|s| keyword_topic(&s.text)).collect(),
        }
    }

    /// Local audio file of the episode, downloading URL sources on first use
    async fn resolve_source(&self, episode: &Episode) -> ServiceResult<PathBuf> {
        if let Some(file) = &episode.audio_file {
            let path = PathBuf::from(file);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(path);
            }
            warn!("Stored audio {} for episode {} is missing", file, episode.id);
        }

        match (episode.source_type, episode.source_url.as_deref()) {
            (SourceType::Url, Some(url)) => {
                let path = self.download(episode, url).await?;
                let stored = path.to_string_lossy().into_owned();
                self.store.episodes.update(&episode.id, |e| {
                    e.audio_file = Some(stored);
                    e.updated_at = Utc::now();
                });
                Ok(path)
            }
            _ => Err(ServiceError::ValidationError(format!(
                "Episode {} has no audio uploaded",
                episode.id
            ))),
        }
    }

    async fn download(&self, episode: &Episode, url: &str) -> ServiceResult<PathBuf> {
        let url_path = url.split(['?', '#']).next().unwrap_or(url);
        let extension = url_path
            .rsplit('/')
            .next()
            .and_then(file_extension)
            .filter(|ext| self.settings.is_allowed_format(ext))
            .unwrap_or_else(|| "mp3".to_string());

        let dir = self.settings.upload_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.{}", episode.id, extension));
        let partial = dir.join(format!("{}.{}.part", episode.id, extension));
        info!("Downloading episode {} source from {}", episode.id, url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::ProviderError(format!(
                "Download of {} failed with status {}",
                url,
                response.status().as_u16()
            )));
        }

        let written = match self.write_download(response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                remove_file_quietly(&partial).await;
                return Err(e);
            }
        };
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            remove_file_quietly(&partial).await;
            return Err(e.into());
        }
        debug!("Downloaded {} bytes to {}", written, path.display());
        Ok(path)
    }

    async fn write_download(&self, mut response: reqwest::Response, partial: &Path) -> ServiceResult<u64> {
        let limit = self.settings.storage.max_file_size;
        let mut file = tokio::fs::File::create(partial).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            written += chunk.len() as u64;
            if written > limit {
                return Err(ServiceError::PayloadTooLarge(format!(
                    "Source audio exceeds the {} byte limit",
                    limit
                )));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(written)
    }

    pub fn get_for_episode(&self, episode_id: &str, user_id: &str) -> ServiceResult<TranscriptView> {
        self.store.owned_episode(episode_id, user_id)?;
        let transcript = self
            .store
            .transcript_for_episode(episode_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Transcript for episode {}", episode_id)))?;
        Ok(self.view(transcript))
    }

    pub fn get(&self, transcript_id: &str, user_id: &str) -> ServiceResult<TranscriptView> {
        let transcript = self.store.owned_transcript(transcript_id, user_id)?;
        Ok(self.view(transcript))
    }

    fn view(&self, transcript: Transcript) -> TranscriptView {
        let segments = self.store.segments_for(&transcript.id);
        TranscriptView {
            transcript,
            segments,
        }
    }

    pub fn segments(&self, transcript_id: &str, user_id: &str) -> ServiceResult<Vec<TranscriptSegment>> {
        self.store.owned_transcript(transcript_id, user_id)?;
        Ok(self.store.segments_for(transcript_id))
    }

    /// Update transcript fields; new diarization re-assigns segment speakers
    pub fn update(
        &self,
        transcript_id: &str,
        user_id: &str,
        update: TranscriptUpdate,
    ) -> ServiceResult<Transcript> {
        update.validate()?;
        self.store.owned_transcript(transcript_id, user_id)?;

        if let Some(diarization) = &update.diarization {
            for segment in self.store.segments_for(transcript_id) {
                let speaker = diarization
                    .speaker_for(segment.start_ms, segment.end_ms)
                    .map(str::to_string);
                self.store.segments.update(&segment.id, |s| s.speaker = speaker);
            }
        }

        self.store
            .transcripts
            .update(transcript_id, |t| {
                if let Some(text) = update.text {
                    t.text = text;
                }
                if let Some(language) = update.language {
                    t.language = language;
                }
                if let Some(confidence) = update.confidence {
                    t.confidence = confidence;
                }
                if let Some(diarization) = update.diarization {
                    t.diarization = Some(diarization);
                }
                t.updated_at = Utc::now();
            })
            .ok_or_else(|| ServiceError::NotFound(format!("Transcript {}", transcript_id)))
    }

    /// Add a segment and re-number all segments by start time
    pub fn add_segment(
        &self,
        transcript_id: &str,
        user_id: &str,
        create: SegmentCreate,
    ) -> ServiceResult<TranscriptSegment> {
        create.validate()?;
        let transcript = self.store.owned_transcript(transcript_id, user_id)?;
        let speaker = create.speaker.or_else(|| {
            transcript
                .diarization
                .as_ref()
                .and_then(|d| d.speaker_for(create.start_ms, create.end_ms))
                .map(str::to_string)
        });
        let segment = TranscriptSegment {
            id: new_id(),
            transcript_id: transcript_id.to_string(),
            index: 0,
            start_ms: create.start_ms,
            end_ms: create.end_ms,
            text: create.text.trim().to_string(),
            confidence: create.confidence,
            speaker,
            topic: create.topic.or_else(|| Some(keyword_topic(&create.text))),
            created_at: Utc::now(),
        };
        self.store.segments.insert(segment.clone());

        let mut ordered = self.store.segments_for(transcript_id);
        ordered.sort_by_key(|s| (s.start_ms, s.index));
        let mut inserted = segment;
        for (index, s) in ordered.iter().enumerate() {
            let updated = self.store.segments.update(&s.id, |s| s.index = index);
            if s.id == inserted.id {
                if let Some(updated) = updated {
                    inserted = updated;
                }
            }
        }
        Ok(inserted)
    }

    pub fn delete(&self, transcript_id: &str, user_id: &str) -> ServiceResult<()> {
        self.store.owned_transcript(transcript_id, user_id)?;
        self.store.delete_transcript(transcript_id);
        info!("Deleted transcript {}", transcript_id);
        Ok(())
    }

    /// Drop the transcript and transcribe its episode again
    pub async fn retry(&self, transcript_id: &str, user_id: &str) -> ServiceResult<TranscriptView> {
        let transcript = self.store.owned_transcript(transcript_id, user_id)?;
        let episode = self.store.owned_episode(&transcript.episode_id, user_id)?;
        self.store.delete_transcript(transcript_id);
        self.transcribe(&episode).await
    }
}

/// Topic from the most frequent content words of a segment
pub fn keyword_topic(segment_text: &str) -> String {
    let terms = text::top_terms(segment_text, 2);
    if terms.is_empty() {
        return DEFAULT_TOPIC.to_string();
    }
    terms
        .into_iter()
        .map(|(term, _)| term)
        .collect::<Vec<_>>()
        .join(" ")
}
