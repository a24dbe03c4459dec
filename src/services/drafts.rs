use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use serde_json::json;

use crate::core::cache::TtlCache;
use crate::core::error::{ServiceError, ServiceResult};
use crate::core::store::{Removed, Store};
use crate::models::draft::{DraftUpdate, DraftVersion, RevisionLength, RevisionRequest, RevisionStructure};
use crate::models::{BrandVoice, Draft, Episode};
use crate::services::ai::generation::ProgressFn;
use crate::services::ai::{render, BlogPost, ContentGenerator};
use crate::services::analytics::ANALYTICS_CACHE_PREFIX;
use crate::services::common::{paginate, Page, PageParams};
use crate::services::episodes::remove_file_quietly;
use crate::services::seo::analysis_prefix;
use crate::services::text;

/// Key takeaways kept by a short revision
const SHORT_TAKEAWAYS: usize = 3;

pub struct DraftService {
    store: Arc<Store>,
    cache: Arc<TtlCache>,
    generator: Arc<ContentGenerator>,
}

impl DraftService {
    pub fn new(store: Arc<Store>, cache: Arc<TtlCache>, generator: Arc<ContentGenerator>) -> Self {
        Self {
            store,
            cache,
            generator,
        }
    }

    fn brand_voice(&self, voice_id: Option<&str>) -> ServiceResult<Option<BrandVoice>> {
        match voice_id {
            Some(id) => self
                .store
                .brand_voices
                .get(id)
                .map(Some)
                .ok_or_else(|| ServiceError::ValidationError(format!("Brand voice {} does not exist", id))),
            None => Ok(None),
        }
    }

    /// Generate and store the next draft version of an episode from its transcript
    pub async fn generate_for(
        &self,
        episode: &Episode,
        brand_voice_id: Option<&str>,
        parent_id: Option<String>,
        progress: Option<ProgressFn<'_>>,
    ) -> ServiceResult<Draft> {
        let transcript = self.store.transcript_for_episode(&episode.id).ok_or_else(|| {
            ServiceError::Conflict(format!("Episode {} has no transcript yet", episode.id))
        })?;
        let segments = self.store.segments_for(&transcript.id);
        let voice = self.brand_voice(brand_voice_id.or(episode.brand_voice_id.as_deref()))?;

        let post = self
            .generator
            .generate_blog_post(episode, &transcript, &segments, voice.as_ref(), progress)
            .await?;
        // version is assigned by the store on insert
        let draft = self.generator.draft_from_blog_post(episode, &post, 0, voice.map(|v| v.id), parent_id);
        let draft = self.store.insert_next_draft(draft)?;
        self.cache.clear_prefix(ANALYTICS_CACHE_PREFIX);
        info!(
            "Stored draft {} (v{}) for episode {} with {} citations",
            draft.id,
            draft.version,
            episode.id,
            draft.citations.len()
        );
        Ok(draft)
    }

    pub async fn create_for_episode(
        &self,
        episode_id: &str,
        user_id: &str,
        brand_voice_id: Option<&str>,
    ) -> ServiceResult<Draft> {
        let episode = self.store.owned_episode(episode_id, user_id)?;
        self.generate_for(&episode, brand_voice_id, None, None).await
    }

    /// Caller's drafts, newest first, optionally limited to one episode
    pub fn list(&self, user_id: &str, episode_id: Option<&str>, params: PageParams) -> ServiceResult<Page<Draft>> {
        let episodes: Vec<String> = match episode_id {
            Some(id) => vec![self.store.owned_episode(id, user_id)?.id],
            None => self
                .store
                .episodes
                .filter(|e| e.user_id == user_id)
                .into_iter()
                .map(|e| e.id)
                .collect(),
        };
        let mut drafts = self.store.drafts.filter(|d| episodes.contains(&d.episode_id));
        drafts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.version.cmp(&a.version))
        });
        paginate(drafts, params)
    }

    /// Version history of an episode, oldest first
    pub fn versions(&self, episode_id: &str, user_id: &str) -> ServiceResult<Vec<DraftVersion>> {
        self.store.owned_episode(episode_id, user_id)?;
        Ok(self
            .store
            .drafts_for(episode_id)
            .iter()
            .map(DraftVersion::from)
            .collect())
    }

    pub fn get(&self, draft_id: &str, user_id: &str) -> ServiceResult<Draft> {
        self.store.owned_draft(draft_id, user_id).map(|(draft, _)| draft)
    }

    pub fn update(&self, draft_id: &str, user_id: &str, update: DraftUpdate) -> ServiceResult<Draft> {
        update.validate()?;
        self.store.owned_draft(draft_id, user_id)?;
        self.brand_voice(update.brand_voice_id.as_deref())?;
        let content_changed = update.title.is_some() || update.content.is_some();

        let draft = self
            .store
            .drafts
            .update(draft_id, |draft| {
                if let Some(title) = update.title {
                    draft.title = title.trim().to_string();
                }
                if let Some(content) = update.content {
                    draft.metadata.word_count = text::word_count(&content);
                    draft.content = content;
                }
                if let Some(status) = update.status {
                    draft.status = status;
                }
                if let Some(citations) = update.citations {
                    draft.citations = citations;
                }
                if let Some(voice_id) = update.brand_voice_id {
                    draft.brand_voice_id = Some(voice_id);
                }
                draft.updated_at = Utc::now();
            })
            .ok_or_else(|| ServiceError::NotFound(format!("Draft {}", draft_id)))?;

        if content_changed {
            self.cache.clear_prefix(&analysis_prefix(draft_id));
        }
        self.cache.clear_prefix(ANALYTICS_CACHE_PREFIX);
        Ok(draft)
    }

    /// Generate a fresh version from the transcript, recording the draft it replaces
    pub async fn regenerate(&self, draft_id: &str, user_id: &str) -> ServiceResult<Draft> {
        let (draft, episode) = self.store.owned_draft(draft_id, user_id)?;
        self.generate_for(&episode, draft.brand_voice_id.as_deref(), Some(draft.id), None)
            .await
    }

    /// Derive a new version from an existing draft
    pub async fn revise(&self, draft_id: &str, user_id: &str, request: RevisionRequest) -> ServiceResult<Draft> {
        let (parent, episode) = self.store.owned_draft(draft_id, user_id)?;
        let mut post = render::from_markdown(&parent.content);
        if post.title.is_empty() {
            post.title = parent.title.clone();
        }

        if request.length == Some(RevisionLength::Short) {
            shorten(&mut post);
        }
        if request.structure == Some(RevisionStructure::Listicle) {
            number_sections(&mut post);
        }

        let tone_applied = match request.tone.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(tone) if self.generator.has_language_model() => {
                let voice = revision_voice(tone, &request);
                post.introduction = self.generator.rewrite_in_voice(&post.introduction, &voice).await?;
                for section in &mut post.sections {
                    section.content = self.generator.rewrite_in_voice(&section.content, &voice).await?;
                }
                post.conclusion = self.generator.rewrite_in_voice(&post.conclusion, &voice).await?;
                true
            }
            _ => false,
        };

        let mut banned = request.banned_terms();
        if let Some(voice) = self.brand_voice(parent.brand_voice_id.as_deref()).ok().flatten() {
            banned.extend(voice.banned_terms);
        }
        let redacted = post.redact(&banned);

        let mut draft = self.generator.draft_from_blog_post(
            &episode,
            &post,
            0,
            parent.brand_voice_id.clone(),
            Some(parent.id.clone()),
        );
        draft.citations = parent.citations.clone();
        draft.metadata.revision = Some(json!({
            "tone": request.tone,
            "tone_applied": tone_applied,
            "length": request.length,
            "structure": request.structure,
            "constraints": request.constraints,
            "redacted": redacted,
        }));
        let draft = self.store.insert_next_draft(draft)?;
        self.cache.clear_prefix(ANALYTICS_CACHE_PREFIX);
        debug!(
            "Revised draft {} into {} (v{}, {} redactions)",
            parent.id, draft.id, draft.version, redacted
        );
        Ok(draft)
    }

    pub async fn delete(&self, draft_id: &str, user_id: &str) -> ServiceResult<Removed> {
        self.store.owned_draft(draft_id, user_id)?;
        let removed = self.store.delete_draft(draft_id);
        for path in removed.exports.iter().filter_map(|e| e.file_path.as_deref()) {
            remove_file_quietly(Path::new(path)).await;
        }
        self.cache.clear_prefix(ANALYTICS_CACHE_PREFIX);
        self.cache.clear_prefix(&analysis_prefix(draft_id));
        info!("Deleted draft {} and {} export(s)", draft_id, removed.exports.len());
        Ok(removed)
    }
}

fn shorten(post: &mut BlogPost) {
    let first_paragraph = |body: &str| {
        body.split("\n\n")
            .map(str::trim)
            .find(|p| !p.is_empty())
            .unwrap_or_default()
            .to_string()
    };
    post.introduction = first_paragraph(&post.introduction);
    for section in &mut post.sections {
        section.content = first_paragraph(&section.content);
    }
    post.key_takeaways.truncate(SHORT_TAKEAWAYS);
}

fn number_sections(post: &mut BlogPost) {
    for (i, section) in post.sections.iter_mut().enumerate() {
        let title = strip_number(&section.title);
        section.title = format!("{}. {}", i + 1, title);
    }
}

/// Drop a leading "N. " so revising a listicle again does not double-number it
fn strip_number(title: &str) -> &str {
    match title.split_once(". ") {
        Some((number, rest)) if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => title,
    }
}

fn revision_voice(tone: &str, request: &RevisionRequest) -> BrandVoice {
    let now = Utc::now();
    BrandVoice {
        id: "revision".to_string(),
        workspace_id: String::new(),
        name: "Revision".to_string(),
        description: None,
        tone: tone.to_string(),
        style_guide: request.style_guide(),
        banned_terms: request.banned_terms(),
        tone_examples: Vec::new(),
        is_active: false,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::fixtures;
    use crate::models::DraftStatus;
    use crate::services::ai::llm::MockLanguageModel;
    use std::collections::HashMap;
    use std::time::Duration;

    const CONTENT: &str = "# Building Teams\n\nHow good teams form.\n\n\
        ## Trust\n\nTrust comes first.\n\nThen process follows.\n\n\
        ## Hiring\n\nHire for synergy and curiosity.\n\n\
        ## Conclusion\n\nTeams are built, not found.\n\n\
        ## Key Takeaways\n\n- Trust\n- Process\n- Hiring\n- Curiosity\n";

    fn service(llm: Option<MockLanguageModel>) -> (Arc<Store>, DraftService) {
        let store = Arc::new(Store::new());
        store.episodes.insert(fixtures::episode("e1", "alice"));
        store.transcripts.insert(fixtures::transcript("t1", "e1"));
        let texts = [
            "Welcome to the show about engineering teams and hiring.",
            "Trust is the foundation that every healthy engineering team builds on.",
            "Hiring for curiosity beats hiring for a checklist of frameworks.",
            "Thanks for listening, and remember that teams are built over time.",
        ];
        for (i, t) in texts.iter().enumerate() {
            store.segments.insert(fixtures::segment(&format!("s{}", i), "t1", i, t));
        }
        let llm = llm.map(|m| Arc::new(m) as Arc<dyn crate::services::ai::LanguageModel>);
        let service = DraftService::new(
            Arc::clone(&store),
            Arc::new(TtlCache::new(16, Duration::from_secs(60))),
            Arc::new(ContentGenerator::new(llm)),
        );
        (store, service)
    }

    fn stored_draft(store: &Store) -> Draft {
        let mut draft = fixtures::draft("d1", "e1", 1, CONTENT);
        draft.citations = vec![crate::models::Citation {
            text: "Trust is the foundation".to_string(),
            start_ms: 5_000,
            end_ms: 9_000,
            speaker: Some("Host".to_string()),
            confidence: 0.9,
            section: Some("Trust".to_string()),
        }];
        store.drafts.insert(draft.clone());
        draft
    }

    #[tokio::test]
    async fn test_create_generates_versioned_drafts() {
        let (_, service) = service(None);
        let first = service.create_for_episode("e1", "alice", None).await.unwrap();
        let second = service.create_for_episode("e1", "alice", None).await.unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(first.status, DraftStatus::Completed);
        assert!(first.content.starts_with("# "));

        let versions = service.versions("e1", "alice").unwrap();
        assert_eq!(versions.iter().map(|v| v.version).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_create_requires_transcript() {
        let (store, service) = service(None);
        store.episodes.insert(fixtures::episode("e2", "alice"));
        let result = service.create_for_episode("e2", "alice", None).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_voice_and_foreign_episode() {
        let (_, service) = service(None);
        assert!(matches!(
            service.create_for_episode("e1", "alice", Some("nope")).await,
            Err(ServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service.create_for_episode("e1", "bob", None).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_revise_short_listicle_with_banned_terms() {
        let (_, service) = service(None);
        let parent = stored_draft(&service.store);

        let mut constraints = HashMap::new();
        constraints.insert("banned_terms".to_string(), json!(["synergy"]));
        let request = RevisionRequest {
            constraints,
            tone: Some("playful".to_string()),
            length: Some(RevisionLength::Short),
            structure: Some(RevisionStructure::Listicle),
        };
        let revised = service.revise(&parent.id, "alice", request).await.unwrap();

        assert_eq!(revised.version, 2);
        assert_eq!(revised.parent_id.as_deref(), Some("d1"));
        assert_eq!(revised.citations, parent.citations);
        assert!(revised.content.contains("## 1. Trust\n\nTrust comes first.\n\n## 2. Hiring"));
        assert!(!revised.content.contains("Then process follows."));
        assert!(revised.content.contains("Hire for [redacted] and curiosity."));
        assert!(!revised.content.contains("- Curiosity"));

        let revision = revised.metadata.revision.unwrap();
        assert_eq!(revision["tone_applied"], json!(false));
        assert_eq!(revision["redacted"], json!(1));
    }

    #[tokio::test]
    async fn test_revise_rewrites_tone_with_model() {
        let mut llm = MockLanguageModel::new();
        llm.expect_complete()
            .returning(|_, prompt, _, _| {
                assert!(prompt.contains("Tone: playful"));
                Ok("Rewritten!".to_string())
            });
        let (_, service) = service(Some(llm));
        let parent = stored_draft(&service.store);

        let request = RevisionRequest {
            tone: Some("playful".to_string()),
            ..Default::default()
        };
        let revised = service.revise(&parent.id, "alice", request).await.unwrap();
        assert!(revised.content.contains("## Trust\n\nRewritten!"));
        assert_eq!(revised.metadata.revision.unwrap()["tone_applied"], json!(true));
    }

    #[tokio::test]
    async fn test_listicle_does_not_double_number() {
        let (_, service) = service(None);
        let parent = stored_draft(&service.store);
        let listicle = RevisionRequest {
            structure: Some(RevisionStructure::Listicle),
            ..Default::default()
        };
        let once = service.revise(&parent.id, "alice", listicle.clone()).await.unwrap();
        let twice = service.revise(&once.id, "alice", listicle).await.unwrap();
        assert!(twice.content.contains("## 1. Trust"));
        assert!(!twice.content.contains("1. 1."));
    }

    #[tokio::test]
    async fn test_regenerate_links_parent() {
        let (_, service) = service(None);
        let parent = stored_draft(&service.store);
        let fresh = service.regenerate(&parent.id, "alice").await.unwrap();
        assert_eq!(fresh.parent_id.as_deref(), Some("d1"));
        assert_eq!(fresh.version, 2);
    }

    #[test]
    fn test_update_recounts_words() {
        let (_, service) = service(None);
        let parent = stored_draft(&service.store);
        let updated = service
            .update(
                &parent.id,
                "alice",
                DraftUpdate {
                    content: Some("one two three".to_string()),
                    status: Some(DraftStatus::Published),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.metadata.word_count, 3);
        assert_eq!(updated.status, DraftStatus::Published);
        assert!(service.update(&parent.id, "bob", DraftUpdate::default()).is_err());
    }

    #[test]
    fn test_update_invalidates_cached_analysis() {
        let (_, service) = service(None);
        let parent = stored_draft(&service.store);
        let seo = crate::services::seo::SeoService::new(Arc::clone(&service.store), Arc::clone(&service.cache));
        let keywords = Some(vec!["trust".to_string()]);

        let before = seo.analyze(&parent.id, "alice", keywords.clone()).unwrap();
        service
            .update(
                &parent.id,
                "alice",
                DraftUpdate {
                    content: Some("# Short\n\nOnly a few words here.".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        let after = seo.analyze(&parent.id, "alice", keywords).unwrap();
        assert_ne!(before, after);
        assert!(after.analysis_data.word_count < before.analysis_data.word_count);
    }

    #[tokio::test]
    async fn test_status_change_keeps_analysis_but_clears_analytics() {
        let (_, service) = service(None);
        let parent = stored_draft(&service.store);
        let analysis_key = format!("{}trust", analysis_prefix(&parent.id));
        let summary_key = format!("{}summary:alice:30d", ANALYTICS_CACHE_PREFIX);
        service.cache.set(&analysis_key, &1, None).unwrap();
        service.cache.set(&summary_key, &1, None).unwrap();

        service
            .update(
                &parent.id,
                "alice",
                DraftUpdate {
                    status: Some(DraftStatus::Published),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(service.cache.exists(&analysis_key));
        assert!(!service.cache.exists(&summary_key));

        service.cache.set(&summary_key, &1, None).unwrap();
        service
            .revise(&parent.id, "alice", RevisionRequest::default())
            .await
            .unwrap();
        assert!(!service.cache.exists(&summary_key));
    }

    #[tokio::test]
    async fn test_generation_for_deleted_episode_leaves_no_draft() {
        let (store, service) = service(None);
        let episode = store.episodes.get("e1").unwrap();
        store.delete_episode("e1");
        store.transcripts.insert(fixtures::transcript("t9", "e1"));
        store.segments.insert(fixtures::segment("s9", "t9", 0, "Trust is built slowly over many episodes."));

        let result = service.generate_for(&episode, None, None, None).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert!(store.drafts_for("e1").is_empty());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (_, service) = service(None);
        stored_draft(&service.store);
        service.create_for_episode("e1", "alice", None).await.unwrap();

        let page = service.list("alice", Some("e1"), PageParams::new(1, 1)).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(service.list("bob", None, PageParams::default()).unwrap().total, 0);

        let removed = service.delete("d1", "alice").await.unwrap();
        assert_eq!(removed.drafts.len(), 1);
        assert!(matches!(service.get("d1", "alice"), Err(ServiceError::NotFound(_))));
    }
}
