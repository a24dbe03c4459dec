use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;

use crate::config::{Settings, CAPTION_FORMATS};
use crate::core::cache::TtlCache;
use crate::core::error::{ServiceError, ServiceResult};
use crate::core::store::{Removed, Store};
use crate::models::episode::{EpisodeCreate, EpisodeStatusView, EpisodeUpdate, UploadTarget};
use crate::models::{Episode, EpisodeStatus};
use crate::services::analytics::ANALYTICS_CACHE_PREFIX;
use crate::services::common::{file_extension, new_id, paginate, Page, PageParams};

/// Filters of the episode listing
#[derive(Debug, Clone, Default)]
pub struct EpisodeFilter {
    pub status: Option<EpisodeStatus>,
    pub search: Option<String>,
}

pub struct EpisodeService {
    store: Arc<Store>,
    cache: Arc<TtlCache>,
    settings: Arc<Settings>,
}

impl EpisodeService {
    pub fn new(store: Arc<Store>, cache: Arc<TtlCache>, settings: Arc<Settings>) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    /// Caller's episodes, newest first
    pub fn list(&self, user_id: &str, params: PageParams, filter: &EpisodeFilter) -> ServiceResult<Page<Episode>> {
        let needle = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let mut episodes = self.store.episodes.filter(|episode| {
            if episode.user_id != user_id {
                return false;
            }
            if matches!(filter.status, Some(status) if status != episode.status) {
                return false;
            }
            match &needle {
                Some(needle) => {
                    episode.title.to_lowercase().contains(needle)
                        || episode
                            .description
                            .as_deref()
                            .map(|d| d.to_lowercase().contains(needle))
                            .unwrap_or(false)
                }
                None => true,
            }
        });
        episodes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        paginate(episodes, params)
    }

    pub fn create(&self, user_id: &str, create: EpisodeCreate) -> ServiceResult<Episode> {
        create.validate()?;
        if let Some(voice_id) = &create.brand_voice_id {
            if !self.store.brand_voices.contains(voice_id) {
                return Err(ServiceError::ValidationError(format!(
                    "Brand voice {} does not exist",
                    voice_id
                )));
            }
        }

        let now = Utc::now();
        let episode = Episode {
            id: new_id(),
            title: create.title.trim().to_string(),
            description: create.description,
            source_type: create.source_type,
            source_url: create.source_url.map(|url| url.trim().to_string()),
            audio_url: None,
            audio_file: None,
            duration_secs: None,
            status: EpisodeStatus::Pending,
            workspace_id: create.workspace_id,
            user_id: user_id.to_string(),
            brand_voice_id: create.brand_voice_id,
            created_at: now,
            updated_at: now,
        };
        self.store.episodes.insert(episode.clone());
        self.cache.clear_prefix(ANALYTICS_CACHE_PREFIX);
        info!("Created episode {} for user {}", episode.id, user_id);
        Ok(episode)
    }

    pub fn get(&self, episode_id: &str, user_id: &str) -> ServiceResult<Episode> {
        self.store.owned_episode(episode_id, user_id)
    }

    pub fn update(&self, episode_id: &str, user_id: &str, update: EpisodeUpdate) -> ServiceResult<Episode> {
        update.validate()?;
        self.store.owned_episode(episode_id, user_id)?;
        let status_changed = update.status.is_some();
        let episode = self
            .store
            .episodes
            .update(episode_id, |episode| {
                if let Some(title) = update.title {
                    episode.title = title.trim().to_string();
                }
                if let Some(description) = update.description {
                    episode.description = Some(description);
                }
                if let Some(status) = update.status {
                    episode.status = status;
                }
                episode.updated_at = Utc::now();
            })
            .ok_or_else(|| ServiceError::NotFound(format!("Episode {}", episode_id)))?;
        if status_changed {
            self.cache.clear_prefix(ANALYTICS_CACHE_PREFIX);
        }
        Ok(episode)
    }

    /// Delete the episode with everything derived from it, including stored files
    pub async fn delete(&self, episode_id: &str, user_id: &str) -> ServiceResult<Removed> {
        self.store.owned_episode(episode_id, user_id)?;
        let removed = self.store.delete_episode(episode_id);

        let mut files: Vec<PathBuf> = removed
            .episodes
            .iter()
            .filter_map(|e| e.audio_file.as_ref().map(PathBuf::from))
            .filter(|path| path.starts_with(self.settings.upload_dir()))
            .collect();
        files.extend(
            removed
                .exports
                .iter()
                .filter_map(|e| e.file_path.as_ref().map(PathBuf::from)),
        );
        for path in files {
            remove_file_quietly(&path).await;
        }

        self.cache.clear_prefix(ANALYTICS_CACHE_PREFIX);
        self.cache.clear_prefix("seo:");
        info!(
            "Deleted episode {} ({} drafts, {} exports)",
            episode_id,
            removed.drafts.len(),
            removed.exports.len()
        );
        Ok(removed)
    }

    /// Accepted upload formats: audio, video and caption files
    pub fn allowed_formats(&self) -> Vec<String> {
        let storage = &self.settings.storage;
        storage
            .allowed_audio_formats
            .iter()
            .chain(storage.allowed_video_formats.iter())
            .cloned()
            .chain(CAPTION_FORMATS.iter().map(|f| f.to_string()))
            .collect()
    }

    pub fn upload_target(&self, episode_id: &str, user_id: &str) -> ServiceResult<UploadTarget> {
        let episode = self.store.owned_episode(episode_id, user_id)?;
        Ok(UploadTarget {
            upload_url: format!(
                "{}/api/v1/episodes/{}/audio",
                self.settings.storage.public_base_url, episode.id
            ),
            episode_id: episode.id,
            method: "PUT".to_string(),
            max_file_size: self.settings.storage.max_file_size,
            allowed_formats: self.allowed_formats(),
        })
    }

    /// Stream an uploaded file to the upload directory
    ///
    /// The partial file is removed when the size limit is exceeded or the
    /// stream fails.
    pub async fn store_audio<S, B, E>(
        &self,
        episode_id: &str,
        user_id: &str,
        filename: &str,
        mut body: S,
    ) -> ServiceResult<Episode>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Display,
    {
        let episode = self.store.owned_episode(episode_id, user_id)?;
        let extension = file_extension(filename)
            .filter(|ext| self.settings.is_allowed_format(ext))
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Unsupported file format for '{}', allowed: {}",
                    filename,
                    self.allowed_formats().join(", ")
                ))
            })?;

        let dir = self.settings.upload_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let file_name = format!("{}.{}", episode.id, extension);
        let path = dir.join(&file_name);
        let partial = dir.join(format!("{}.part", file_name));

        let limit = self.settings.storage.max_file_size;
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    remove_file_quietly(&partial).await;
                    return Err(ServiceError::ValidationError(format!("Upload interrupted: {}", e)));
                }
            };
            let bytes = chunk.as_ref();
            written += bytes.len() as u64;
            if written > limit {
                drop(file);
                remove_file_quietly(&partial).await;
                warn!("Upload for episode {} exceeded {} bytes", episode.id, limit);
                return Err(ServiceError::PayloadTooLarge(format!(
                    "File exceeds the maximum size of {} bytes",
                    limit
                )));
            }
            file.write_all(bytes).await?;
        }
        file.flush().await?;
        drop(file);

        if written == 0 {
            remove_file_quietly(&partial).await;
            return Err(ServiceError::ValidationError("Uploaded file is empty".to_string()));
        }
        tokio::fs::rename(&partial, &path).await?;

        // A previous upload with another extension is now stale
        if let Some(previous) = episode.audio_file.as_deref().map(Path::new) {
            if previous != path && previous.starts_with(&dir) {
                remove_file_quietly(previous).await;
            }
        }

        let audio_url = format!("{}/media/{}", self.settings.storage.public_base_url, file_name);
        let stored = path.to_string_lossy().into_owned();
        let updated = self
            .store
            .episodes
            .update(&episode.id, |e| {
                e.audio_file = Some(stored);
                e.audio_url = Some(audio_url);
                e.status = EpisodeStatus::Uploaded;
                e.updated_at = Utc::now();
            })
            .ok_or_else(|| ServiceError::NotFound(format!("Episode {}", episode.id)))?;
        info!("Stored {} bytes of media for episode {}", written, episode.id);
        Ok(updated)
    }

    pub fn status(&self, episode_id: &str, user_id: &str) -> ServiceResult<EpisodeStatusView> {
        let episode = self.store.owned_episode(episode_id, user_id)?;
        Ok(EpisodeStatusView {
            workflow: self.store.workflow_runs.get(&episode.id),
            episode_id: episode.id,
            status: episode.status,
        })
    }
}

pub(crate) async fn remove_file_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageSettings;
    use crate::core::store::fixtures;
    use crate::models::episode::SourceType;
    use futures::stream;
    use std::time::Duration;

    struct Harness {
        dir: tempfile::TempDir,
        store: Arc<Store>,
        cache: Arc<TtlCache>,
        service: EpisodeService,
    }

    fn harness(max_file_size: u64) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let defaults = Settings::default();
        let settings = Settings {
            storage: StorageSettings {
                data_dir: dir.path().to_path_buf(),
                max_file_size,
                ..defaults.storage.clone()
            },
            ..defaults
        };
        let store = Arc::new(Store::new());
        let cache = Arc::new(TtlCache::new(16, Duration::from_secs(60)));
        let service = EpisodeService::new(Arc::clone(&store), Arc::clone(&cache), Arc::new(settings));
        Harness {
            dir,
            store,
            cache,
            service,
        }
    }

    fn create(title: &str) -> EpisodeCreate {
        EpisodeCreate {
            title: title.to_string(),
            description: Some(format!("About {}", title)),
            source_type: SourceType::Upload,
            source_url: None,
            workspace_id: "default".to_string(),
            brand_voice_id: None,
        }
    }

    fn body(chunks: Vec<&'static [u8]>) -> impl Stream<Item = Result<&'static [u8], String>> + Unpin {
        stream::iter(chunks.into_iter().map(Ok))
    }

    #[test]
    fn test_list_scopes_filters_and_searches() {
        let h = harness(1024);
        h.service.create("alice", create("Rust in production")).unwrap();
        let second = h.service.create("alice", create("Hiring engineers")).unwrap();
        h.service.create("bob", create("Rust for bob")).unwrap();
        h.service
            .update(
                &second.id,
                "alice",
                EpisodeUpdate {
                    status: Some(EpisodeStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();

        let all = h.service.list("alice", PageParams::default(), &EpisodeFilter::default()).unwrap();
        assert_eq!(all.total, 2);

        let search = EpisodeFilter {
            search: Some("RUST".to_string()),
            ..Default::default()
        };
        let found = h.service.list("alice", PageParams::default(), &search).unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].title, "Rust in production");

        let completed = EpisodeFilter {
            status: Some(EpisodeStatus::Completed),
            ..Default::default()
        };
        let done = h.service.list("alice", PageParams::default(), &completed).unwrap();
        assert_eq!(done.items[0].id, second.id);
    }

    #[test]
    fn test_create_rejects_unknown_brand_voice() {
        let h = harness(1024);
        let mut request = create("Voice");
        request.brand_voice_id = Some("missing".to_string());
        assert!(matches!(
            h.service.create("alice", request),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn test_create_invalidates_analytics_cache() {
        let h = harness(1024);
        h.cache.set("analytics:summary:alice:30d", &1, None).unwrap();
        h.service.create("alice", create("Fresh")).unwrap();
        assert!(!h.cache.exists("analytics:summary:alice:30d"));
    }

    #[test]
    fn test_other_users_cannot_see_episode() {
        let h = harness(1024);
        let episode = h.service.create("alice", create("Private")).unwrap();
        assert!(matches!(
            h.service.get(&episode.id, "bob"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(h.service.status(&episode.id, "bob").is_err());
    }

    #[tokio::test]
    async fn test_store_audio_writes_file_and_marks_uploaded() {
        let h = harness(1024);
        let episode = h.service.create("alice", create("Upload")).unwrap();

        let updated = h
            .service
            .store_audio(&episode.id, "alice", "show.MP3", body(vec![b"abc", b"def"]))
            .await
            .unwrap();
        assert_eq!(updated.status, EpisodeStatus::Uploaded);
        let path = PathBuf::from(updated.audio_file.unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");
        assert!(updated.audio_url.unwrap().ends_with(&format!("/media/{}.mp3", episode.id)));
    }

    #[tokio::test]
    async fn test_store_audio_enforces_size_limit() {
        let h = harness(4);
        let episode = h.service.create("alice", create("Too big")).unwrap();

        let result = h
            .service
            .store_audio(&episode.id, "alice", "big.wav", body(vec![b"abc", b"def"]))
            .await;
        assert!(matches!(result, Err(ServiceError::PayloadTooLarge(_))));
        let leftovers = std::fs::read_dir(h.dir.path().join("uploads")).unwrap().count();
        assert_eq!(leftovers, 0);
        assert_eq!(h.store.episodes.get(&episode.id).unwrap().status, EpisodeStatus::Pending);
    }

    #[tokio::test]
    async fn test_store_audio_rejects_unknown_format() {
        let h = harness(1024);
        let episode = h.service.create("alice", create("Format")).unwrap();
        let result = h
            .service
            .store_audio(&episode.id, "alice", "notes.exe", body(vec![b"x"]))
            .await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_removes_audio() {
        let h = harness(1024);
        let episode = h.service.create("alice", create("Gone")).unwrap();
        let updated = h
            .service
            .store_audio(&episode.id, "alice", "gone.ogg", body(vec![b"data"]))
            .await
            .unwrap();
        h.store.drafts.insert(fixtures::draft("d1", &episode.id, 1, "body"));

        let removed = h.service.delete(&episode.id, "alice").await.unwrap();
        assert_eq!(removed.drafts.len(), 1);
        assert!(!Path::new(&updated.audio_file.unwrap()).exists());
        assert!(h.store.episodes.is_empty());
        assert!(h.service.delete(&episode.id, "alice").await.is_err());
    }

    #[test]
    fn test_upload_target() {
        let h = harness(1024);
        let episode = h.service.create("alice", create("Target")).unwrap();
        let target = h.service.upload_target(&episode.id, "alice").unwrap();
        assert_eq!(target.method, "PUT");
        assert!(target.upload_url.ends_with(&format!("/api/v1/episodes/{}/audio", episode.id)));
        assert!(target.allowed_formats.contains(&"mp3".to_string()));
        assert!(target.allowed_formats.contains(&"vtt".to_string()));
    }
}
