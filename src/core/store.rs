use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::error::{ServiceError, ServiceResult};
use crate::models::{
    BrandVoice, Draft, Episode, EpisodeStatus, Export, MetricEntry, PerformanceEntry, SeoData,
    TrackedEvent, Transcript, TranscriptSegment, WorkflowRun, WorkflowStatus,
};

/// Snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Records that live in a [`Table`]
pub trait Record: Clone + Send + Sync + 'static {
    fn key(&self) -> &str;
}

macro_rules! record_by_id {
    ($($ty:ty),* $(,)?) => {
        $(impl Record for $ty {
            fn key(&self) -> &str {
                &self.id
            }
        })*
    };
}

record_by_id!(
    Episode,
    Transcript,
    TranscriptSegment,
    Draft,
    BrandVoice,
    SeoData,
    Export,
    MetricEntry,
    PerformanceEntry,
    TrackedEvent,
);

/// Workflow runs are keyed by episode; only the latest run is kept
impl Record for WorkflowRun {
    fn key(&self) -> &str {
        &self.episode_id
    }
}

/// Concurrent keyed table of records
#[derive(Debug)]
pub struct Table<T: Record> {
    rows: DashMap<String, T>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self { rows: DashMap::new() }
    }
}

impl<T: Record> Table<T> {
    /// Insert or replace a record, returning the previous value
    pub fn insert(&self, record: T) -> Option<T> {
        self.rows.insert(record.key().to_string(), record)
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.rows.get(key).map(|row| row.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<T> {
        self.rows.remove(key).map(|(_, record)| record)
    }

    /// Mutate a record in place and return the updated copy
    pub fn update<F>(&self, key: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        self.rows.get_mut(key).map(|mut row| {
            f(row.value_mut());
            row.value().clone()
        })
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows
            .iter()
            .filter(|row| predicate(row.value()))
            .map(|row| row.value().clone())
            .collect()
    }

    /// Remove every record matching the predicate and return them
    pub fn remove_where<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        let keys: Vec<String> = self
            .rows
            .iter()
            .filter(|row| predicate(row.value()))
            .map(|row| row.key().clone())
            .collect();
        keys.iter().filter_map(|key| self.remove(key)).collect()
    }

    pub fn values(&self) -> Vec<T> {
        self.rows.iter().map(|row| row.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&self) {
        self.rows.clear();
    }

    fn replace_all(&self, records: Vec<T>) {
        self.rows.clear();
        for record in records {
            self.insert(record);
        }
    }
}

/// Serializable image of the whole store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub saved_at: Option<DateTime<Utc>>,
    pub episodes: Vec<Episode>,
    pub transcripts: Vec<Transcript>,
    pub segments: Vec<TranscriptSegment>,
    pub drafts: Vec<Draft>,
    pub brand_voices: Vec<BrandVoice>,
    pub seo: Vec<SeoData>,
    pub exports: Vec<Export>,
    pub metric_entries: Vec<MetricEntry>,
    pub performance_entries: Vec<PerformanceEntry>,
    pub events: Vec<TrackedEvent>,
    pub workflow_runs: Vec<WorkflowRun>,
}

/// Record counts reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub episodes: usize,
    pub transcripts: usize,
    pub segments: usize,
    pub drafts: usize,
    pub brand_voices: usize,
    pub seo: usize,
    pub exports: usize,
    pub metric_entries: usize,
    pub performance_entries: usize,
    pub events: usize,
    pub workflow_runs: usize,
}

/// Records removed by a cascading delete
#[derive(Debug, Default)]
pub struct Removed {
    pub episodes: Vec<Episode>,
    pub drafts: Vec<Draft>,
    pub exports: Vec<Export>,
}

/// In-memory entity store
#[derive(Debug, Default)]
pub struct Store {
    pub episodes: Table<Episode>,
    pub transcripts: Table<Transcript>,
    pub segments: Table<TranscriptSegment>,
    pub drafts: Table<Draft>,
    pub brand_voices: Table<BrandVoice>,
    pub seo: Table<SeoData>,
    pub exports: Table<Export>,
    pub metric_entries: Table<MetricEntry>,
    pub performance_entries: Table<PerformanceEntry>,
    pub events: Table<TrackedEvent>,
    pub workflow_runs: Table<WorkflowRun>,
    /// Serialises draft allocation and cascading deletes per episode
    episode_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn episode_lock(&self, episode_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.episode_locks.entry(episode_id.to_string()).or_default().value())
    }

    /// Episode visible to `user_id`; other users' episodes are reported missing
    pub fn owned_episode(&self, episode_id: &str, user_id: &str) -> ServiceResult<Episode> {
        self.episodes
            .get(episode_id)
            .filter(|episode| episode.user_id == user_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Episode {}", episode_id)))
    }

    pub fn owned_draft(&self, draft_id: &str, user_id: &str) -> ServiceResult<(Draft, Episode)> {
        let draft = self
            .drafts
            .get(draft_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Draft {}", draft_id)))?;
        let episode = self
            .owned_episode(&draft.episode_id, user_id)
            .map_err(|_| ServiceError::NotFound(format!("Draft {}", draft_id)))?;
        Ok((draft, episode))
    }

    pub fn owned_transcript(&self, transcript_id: &str, user_id: &str) -> ServiceResult<Transcript> {
        let transcript = self
            .transcripts
            .get(transcript_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Transcript {}", transcript_id)))?;
        self.owned_episode(&transcript.episode_id, user_id)
            .map_err(|_| ServiceError::NotFound(format!("Transcript {}", transcript_id)))?;
        Ok(transcript)
    }

    pub fn owned_export(&self, export_id: &str, user_id: &str) -> ServiceResult<Export> {
        let export = self
            .exports
            .get(export_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Export {}", export_id)))?;
        self.owned_draft(&export.draft_id, user_id)
            .map_err(|_| ServiceError::NotFound(format!("Export {}", export_id)))?;
        Ok(export)
    }

    pub fn transcript_for_episode(&self, episode_id: &str) -> Option<Transcript> {
        self.transcripts
            .filter(|t| t.episode_id == episode_id)
            .into_iter()
            .max_by_key(|t| t.created_at)
    }

    /// Segments of a transcript in playback order
    pub fn segments_for(&self, transcript_id: &str) -> Vec<TranscriptSegment> {
        let mut segments = self.segments.filter(|s| s.transcript_id == transcript_id);
        segments.sort_by_key(|s| s.index);
        segments
    }

    /// Drafts of an episode ordered by version
    pub fn drafts_for(&self, episode_id: &str) -> Vec<Draft> {
        let mut drafts = self.drafts.filter(|d| d.episode_id == episode_id);
        drafts.sort_by_key(|d| d.version);
        drafts
    }

    pub fn next_draft_version(&self, episode_id: &str) -> u32 {
        self.drafts
            .filter(|d| d.episode_id == episode_id)
            .iter()
            .map(|d| d.version)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Store a draft under the next free version of its episode.
    /// Fails with `NotFound` once the episode has been deleted.
    pub fn insert_next_draft(&self, mut draft: Draft) -> ServiceResult<Draft> {
        let lock = self.episode_lock(&draft.episode_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !self.episodes.contains(&draft.episode_id) {
            return Err(ServiceError::NotFound(format!("Episode {}", draft.episode_id)));
        }
        draft.version = self.next_draft_version(&draft.episode_id);
        self.drafts.insert(draft.clone());
        Ok(draft)
    }

    /// Upsert SEO data unless its draft is gone; returns whether it was stored
    pub fn upsert_seo(&self, episode_id: &str, seo: SeoData) -> bool {
        let lock = self.episode_lock(episode_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !self.drafts.contains(&seo.draft_id) {
            return false;
        }
        self.seo.insert(seo);
        true
    }

    pub fn seo_for_draft(&self, draft_id: &str) -> Option<SeoData> {
        self.seo.filter(|s| s.draft_id == draft_id).into_iter().next()
    }

    /// Remove all transcripts of an episode with their segments
    pub fn delete_transcripts_for(&self, episode_id: &str) -> usize {
        let removed = self.transcripts.remove_where(|t| t.episode_id == episode_id);
        for transcript in &removed {
            self.segments.remove_where(|s| s.transcript_id == transcript.id);
        }
        removed.len()
    }

    pub fn delete_transcript(&self, transcript_id: &str) -> Option<Transcript> {
        let removed = self.transcripts.remove(transcript_id)?;
        self.segments.remove_where(|s| s.transcript_id == transcript_id);
        Some(removed)
    }

    /// Remove a draft with its SEO data, exports and performance entries
    pub fn delete_draft(&self, draft_id: &str) -> Removed {
        let Some(episode_id) = self.drafts.get(draft_id).map(|d| d.episode_id) else {
            return Removed::default();
        };
        let lock = self.episode_lock(&episode_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.remove_draft(draft_id)
    }

    fn remove_draft(&self, draft_id: &str) -> Removed {
        let mut removed = Removed::default();
        if let Some(draft) = self.drafts.remove(draft_id) {
            self.seo.remove_where(|s| s.draft_id == draft_id);
            self.performance_entries.remove_where(|p| p.draft_id == draft_id);
            removed.exports = self.exports.remove_where(|e| e.draft_id == draft_id);
            removed.drafts.push(draft);
        }
        removed
    }

    /// Remove an episode and everything derived from it
    pub fn delete_episode(&self, episode_id: &str) -> Removed {
        let lock = self.episode_lock(episode_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut removed = Removed::default();
        let Some(episode) = self.episodes.remove(episode_id) else {
            return removed;
        };
        self.delete_transcripts_for(episode_id);
        for draft in self.drafts.filter(|d| d.episode_id == episode_id) {
            let cascade = self.remove_draft(&draft.id);
            removed.drafts.extend(cascade.drafts);
            removed.exports.extend(cascade.exports);
        }
        self.metric_entries.remove_where(|m| m.episode_id == episode_id);
        self.workflow_runs.remove(episode_id);
        self.episode_locks.remove(episode_id);
        removed.episodes.push(episode);
        removed
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            episodes: self.episodes.len(),
            transcripts: self.transcripts.len(),
            segments: self.segments.len(),
            drafts: self.drafts.len(),
            brand_voices: self.brand_voices.len(),
            seo: self.seo.len(),
            exports: self.exports.len(),
            metric_entries: self.metric_entries.len(),
            performance_entries: self.performance_entries.len(),
            events: self.events.len(),
            workflow_runs: self.workflow_runs.len(),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Some(Utc::now()),
            episodes: self.episodes.values(),
            transcripts: self.transcripts.values(),
            segments: self.segments.values(),
            drafts: self.drafts.values(),
            brand_voices: self.brand_voices.values(),
            seo: self.seo.values(),
            exports: self.exports.values(),
            metric_entries: self.metric_entries.values(),
            performance_entries: self.performance_entries.values(),
            events: self.events.values(),
            workflow_runs: self.workflow_runs.values(),
        }
    }

    /// Replace all contents with a snapshot
    ///
    /// Runs that were still in flight when the snapshot was taken cannot be
    /// resumed; they are marked failed together with their episodes.
    pub fn restore(&self, snapshot: StoreSnapshot) -> ServiceResult<()> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(ServiceError::PersistenceError(format!(
                "Snapshot version {} is newer than supported version {}",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        self.episodes.replace_all(snapshot.episodes);
        self.transcripts.replace_all(snapshot.transcripts);
        self.segments.replace_all(snapshot.segments);
        self.drafts.replace_all(snapshot.drafts);
        self.brand_voices.replace_all(snapshot.brand_voices);
        self.seo.replace_all(snapshot.seo);
        self.exports.replace_all(snapshot.exports);
        self.metric_entries.replace_all(snapshot.metric_entries);
        self.performance_entries.replace_all(snapshot.performance_entries);
        self.events.replace_all(snapshot.events);
        self.workflow_runs.replace_all(snapshot.workflow_runs);

        let interrupted = self.workflow_runs.filter(|run| !run.status.is_terminal());
        for run in interrupted {
            warn!("Workflow for episode {} was interrupted by a restart", run.episode_id);
            self.workflow_runs.update(&run.episode_id, |run| {
                run.status = WorkflowStatus::Failed;
                run.error = Some("Interrupted by service restart".to_string());
                run.log("Workflow interrupted by service restart");
                run.finished_at = Some(Utc::now());
            });
            self.episodes.update(&run.episode_id, |episode| {
                episode.status = EpisodeStatus::Failed;
                episode.updated_at = Utc::now();
            });
        }
        Ok(())
    }

    /// Write a snapshot atomically (temp file then rename)
    pub async fn persist_to(&self, path: &Path) -> ServiceResult<()> {
        let snapshot = self.snapshot();
        let bytes = serde_json::to_vec(&snapshot)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!("Persisted state snapshot to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Restore from a snapshot file; a missing file leaves the store empty
    pub async fn load_from(&self, path: &Path) -> ServiceResult<bool> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No state snapshot at {}, starting empty", path.display());
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };
        let snapshot: StoreSnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::PersistenceError(format!("Corrupt snapshot: {}", e)))?;
        self.restore(snapshot)?;
        info!(
            "Restored state snapshot from {} ({} episodes)",
            path.display(),
            self.episodes.len()
        );
        Ok(true)
    }
}

/// Move an unloadable snapshot next to itself so it is never overwritten
pub async fn quarantine_snapshot(path: &Path) -> ServiceResult<PathBuf> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state.json".to_string());
    let target = path.with_file_name(format!("{}.corrupt-{}", file_name, Utc::now().format("%Y%m%dT%H%M%S%.3f")));
    tokio::fs::rename(path, &target).await?;
    warn!("Moved unreadable state snapshot {} to {}", path.display(), target.display());
    Ok(target)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::export::{CmsType, ExportStatus};

    fn seo(id: &str, draft_id: &str) -> SeoData {
        let now = Utc::now();
        SeoData {
            id: id.to_string(),
            draft_id: draft_id.to_string(),
            title: "Title".to_string(),
            meta_description: String::new(),
            slug: "title".to_string(),
            keywords: Vec::new(),
            faqs: Vec::new(),
            schema_markup: serde_json::Value::Null,
            internal_links: Vec::new(),
            readability_score: 5.0,
            seo_score: 50.0,
            created_at: now,
            updated_at: now,
        }
    }

    fn export(id: &str, draft_id: &str) -> Export {
        Export {
            id: id.to_string(),
            draft_id: draft_id.to_string(),
            cms_type: CmsType::Markdown,
            status: ExportStatus::Completed,
            url: None,
            log: Vec::new(),
            metadata: serde_json::Value::Null,
            attempts: 1,
            error: None,
            file_path: Some(format!("/tmp/{}.md", id)),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_ownership_hides_other_users_records() {
        let store = Store::new();
        store.episodes.insert(episode("e1", "alice"));
        store.drafts.insert(draft("d1", "e1", 1, "body"));

        assert!(store.owned_episode("e1", "alice").is_ok());
        assert!(matches!(
            store.owned_episode("e1", "bob"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            store.owned_draft("d1", "bob"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_next_draft_version_is_contiguous() {
        let store = Store::new();
        assert_eq!(store.next_draft_version("e1"), 1);
        store.drafts.insert(draft("d1", "e1", 1, "a"));
        store.drafts.insert(draft("d2", "e1", 2, "b"));
        store.drafts.insert(draft("x", "other", 7, "c"));
        assert_eq!(store.next_draft_version("e1"), 3);
        assert_eq!(
            store.drafts_for("e1").iter().map(|d| d.version).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_concurrent_draft_inserts_get_distinct_versions() {
        let store = Arc::new(Store::new());
        store.episodes.insert(episode("e1", "alice"));
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..10 {
                        let id = format!("d{}-{}", i, j);
                        store.insert_next_draft(draft(&id, "e1", 0, "body")).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        let versions: Vec<u32> = store.drafts_for("e1").iter().map(|d| d.version).collect();
        assert_eq!(versions, (1..=80).collect::<Vec<u32>>());
    }

    #[test]
    fn test_draft_of_deleted_episode_is_rejected() {
        let store = Store::new();
        store.episodes.insert(episode("e1", "alice"));
        let kept = store.insert_next_draft(draft("d1", "e1", 0, "body")).unwrap();
        assert_eq!(kept.version, 1);

        store.delete_episode("e1");
        assert!(matches!(
            store.insert_next_draft(draft("d2", "e1", 0, "late")),
            Err(ServiceError::NotFound(_))
        ));
        assert!(store.drafts.is_empty());
        assert!(!store.upsert_seo("e1", seo("s1", "d1")));
        assert!(store.seo.is_empty());
    }

    #[test]
    fn test_delete_episode_cascades() {
        let store = Store::new();
        store.episodes.insert(episode("e1", "alice"));
        store.episodes.insert(episode("e2", "alice"));
        store.transcripts.insert(transcript("t1", "e1"));
        store.segments.insert(segment("s1", "t1", 0, "hello"));
        store.drafts.insert(draft("d1", "e1", 1, "body"));
        store.drafts.insert(draft("d2", "e2", 1, "body"));
        store.exports.insert(export("x1", "d1"));

        let removed = store.delete_episode("e1");
        assert_eq!(removed.episodes.len(), 1);
        assert_eq!(removed.drafts.len(), 1);
        assert_eq!(removed.exports.len(), 1);
        assert!(store.transcripts.is_empty());
        assert!(store.segments.is_empty());
        assert!(store.exports.is_empty());
        assert!(store.drafts.contains("d2"));
        assert!(store.episodes.contains("e2"));
    }

    #[test]
    fn test_segments_are_ordered() {
        let store = Store::new();
        store.segments.insert(segment("s2", "t1", 2, "c"));
        store.segments.insert(segment("s0", "t1", 0, "a"));
        store.segments.insert(segment("s1", "t1", 1, "b"));
        let texts: Vec<String> = store.segments_for("t1").into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_persist_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = Store::new();
        store.episodes.insert(episode("e1", "alice"));
        store.drafts.insert(draft("d1", "e1", 1, "body"));
        store.persist_to(&path).await.unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let restored = Store::new();
        assert!(restored.load_from(&path).await.unwrap());
        assert_eq!(restored.episodes.get("e1"), store.episodes.get("e1"));
        assert_eq!(restored.drafts.len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new();
        assert!(!store.load_from(&dir.path().join("absent.json")).await.unwrap());
        assert!(store.episodes.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = Store::new();
        assert!(matches!(
            store.load_from(&path).await,
            Err(ServiceError::PersistenceError(_))
        ));
        let moved = quarantine_snapshot(&path).await.unwrap();
        assert!(!path.exists());
        assert_eq!(std::fs::read(&moved).unwrap(), b"{not json");
        assert!(moved.file_name().unwrap().to_string_lossy().starts_with("state.json.corrupt-"));

        // The next persist cannot clobber what was moved aside
        store.persist_to(&path).await.unwrap();
        assert_eq!(std::fs::read(&moved).unwrap(), b"{not json");
    }

    #[tokio::test]
    async fn test_newer_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut snapshot = Store::new().snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;
        std::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();

        let store = Store::new();
        assert!(store.load_from(&path).await.is_err());
        assert!(path.exists());
    }

    #[test]
    fn test_restore_fails_interrupted_runs() {
        let store = Store::new();
        store.episodes.insert(episode("e1", "alice"));
        let mut run = WorkflowRun::new("r1".into(), "e1".into(), "alice".into());
        run.status = WorkflowStatus::Transcribing;
        store.workflow_runs.insert(run);

        let snapshot = store.snapshot();
        let restored = Store::new();
        restored.restore(snapshot).unwrap();

        let run = restored.workflow_runs.get("e1").unwrap();
        assert_eq!(run.status, WorkflowStatus::Failed);
        assert!(run.finished_at.is_some());
        assert_eq!(restored.episodes.get("e1").unwrap().status, EpisodeStatus::Failed);
    }
}
