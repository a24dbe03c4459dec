use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use log::debug;

use crate::core::cache::TtlCache;
use crate::core::error::{ServiceError, ServiceResult};
use crate::core::metrics::PipelineMetrics;
use crate::core::store::Store;
use crate::models::analytics::{
    AnalyticsSummary, MetricEntryCreate, PerformanceEntryCreate, Period, PeriodBucket, TopContent,
    TrackEventRequest,
};
use crate::models::{DraftStatus, MetricEntry, PerformanceEntry, TrackedEvent};
use crate::services::common::new_id;

/// Every analytics cache key starts with this prefix
pub const ANALYTICS_CACHE_PREFIX: &str = "analytics:";

pub const METRIC_ORGANIC_TRAFFIC: &str = "organic_traffic";
pub const METRIC_SEARCH_POSITION: &str = "search_position";
pub const METRIC_CLICKS: &str = "clicks";
pub const METRIC_IMPRESSIONS: &str = "impressions";
pub const METRIC_VIEWS: &str = "views";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct AnalyticsService {
    store: Arc<Store>,
    cache: Arc<TtlCache>,
    metrics: Arc<PipelineMetrics>,
}

impl AnalyticsService {
    pub fn new(store: Arc<Store>, cache: Arc<TtlCache>, metrics: Arc<PipelineMetrics>) -> Self {
        Self { store, cache, metrics }
    }

    fn invalidate(&self) {
        let cleared = self.cache.clear_prefix(ANALYTICS_CACHE_PREFIX);
        if cleared > 0 {
            debug!("Invalidated {} analytics cache entries", cleared);
        }
    }

    fn user_episode_ids(&self, user_id: &str) -> Vec<String> {
        self.store
            .episodes
            .filter(|e| e.user_id == user_id)
            .into_iter()
            .map(|e| e.id)
            .collect()
    }

    pub fn record_metric(&self, episode_id: &str, user_id: &str, create: MetricEntryCreate) -> ServiceResult<MetricEntry> {
        create.validate()?;
        self.store.owned_episode(episode_id, user_id)?;
        let entry = MetricEntry {
            id: new_id(),
            episode_id: episode_id.to_string(),
            metric: create.metric.trim().to_string(),
            value: create.value,
            metadata: create.metadata,
            captured_at: create.captured_at.unwrap_or_else(Utc::now),
        };
        self.store.metric_entries.insert(entry.clone());
        self.invalidate();
        Ok(entry)
    }

    /// Metric entries of an episode in capture order
    pub fn list_metrics(&self, episode_id: &str, user_id: &str, metric: Option<&str>) -> ServiceResult<Vec<MetricEntry>> {
        self.store.owned_episode(episode_id, user_id)?;
        let mut entries = self
            .store
            .metric_entries
            .filter(|m| m.episode_id == episode_id && metric.map_or(true, |name| m.metric == name));
        entries.sort_by_key(|m| m.captured_at);
        Ok(entries)
    }

    pub fn record_performance(
        &self,
        draft_id: &str,
        user_id: &str,
        create: PerformanceEntryCreate,
    ) -> ServiceResult<PerformanceEntry> {
        create.validate()?;
        self.store.owned_draft(draft_id, user_id)?;
        let entry = PerformanceEntry {
            id: new_id(),
            draft_id: draft_id.to_string(),
            metric_type: create.metric_type.trim().to_string(),
            score: create.score,
            details: create.details,
            captured_at: Utc::now(),
        };
        self.store.performance_entries.insert(entry.clone());
        self.invalidate();
        Ok(entry)
    }

    pub fn list_performance(&self, draft_id: &str, user_id: &str) -> ServiceResult<Vec<PerformanceEntry>> {
        self.store.owned_draft(draft_id, user_id)?;
        let mut entries = self.store.performance_entries.filter(|p| p.draft_id == draft_id);
        entries.sort_by_key(|p| p.captured_at);
        Ok(entries)
    }

    pub fn track_event(&self, user_id: Option<&str>, request: TrackEventRequest) -> ServiceResult<TrackedEvent> {
        if request.event_type.trim().is_empty() {
            return Err(ServiceError::ValidationError("event_type must not be empty".to_string()));
        }
        let event = TrackedEvent {
            id: new_id(),
            event_type: request.event_type.trim().to_string(),
            user_id: user_id.map(str::to_string),
            data: request.data,
            timestamp: Utc::now(),
        };
        self.store.events.insert(event.clone());
        self.invalidate();
        Ok(event)
    }

    /// Headline figures over the date range, cached per user and range
    pub fn summary(&self, user_id: &str, range: Period) -> ServiceResult<AnalyticsSummary> {
        let key = format!("{}summary:{}:{}", ANALYTICS_CACHE_PREFIX, user_id, range.as_str());
        if let Some(cached) = self.cache.get::<AnalyticsSummary>(&key) {
            return Ok(cached);
        }

        let since = Utc::now() - Duration::days(range.days());
        let episodes = self.user_episode_ids(user_id);
        let total_episodes = self
            .store
            .episodes
            .filter(|e| e.user_id == user_id && e.created_at >= since)
            .len();
        let total_blog_posts = self
            .store
            .drafts
            .filter(|d| {
                episodes.contains(&d.episode_id)
                    && d.created_at >= since
                    && matches!(d.status, DraftStatus::Completed | DraftStatus::Published)
            })
            .len();

        let entries = self
            .store
            .metric_entries
            .filter(|m| episodes.contains(&m.episode_id) && m.captured_at >= since);
        let sum = |name: &str| -> f64 {
            entries.iter().filter(|m| m.metric == name).map(|m| m.value).sum()
        };
        let positions: Vec<f64> = entries
            .iter()
            .filter(|m| m.metric == METRIC_SEARCH_POSITION)
            .map(|m| m.value)
            .collect();
        let avg_position = if positions.is_empty() {
            0.0
        } else {
            positions.iter().sum::<f64>() / positions.len() as f64
        };
        let impressions = sum(METRIC_IMPRESSIONS);
        let click_through_rate = if impressions > 0.0 {
            sum(METRIC_CLICKS) / impressions * 100.0
        } else {
            0.0
        };

        let runs = self.metrics.summary();
        let summary = AnalyticsSummary {
            date_range: range,
            total_episodes,
            total_blog_posts,
            avg_processing_time: round2(runs.avg_processing_minutes),
            success_rate: round2(runs.success_rate),
            organic_traffic: sum(METRIC_ORGANIC_TRAFFIC).max(0.0).round() as u64,
            avg_position: round2(avg_position),
            click_through_rate: round2(click_through_rate),
        };
        self.cache.set(&key, &summary, None)?;
        Ok(summary)
    }

    /// Episodes ranked by total views, best first
    pub fn top_content(&self, user_id: &str, limit: usize) -> ServiceResult<Vec<TopContent>> {
        if limit == 0 || limit > 100 {
            return Err(ServiceError::ValidationError("limit must be between 1 and 100".to_string()));
        }
        let episodes = self.user_episode_ids(user_id);
        let mut views: HashMap<String, f64> = HashMap::new();
        for entry in self
            .store
            .metric_entries
            .filter(|m| m.metric == METRIC_VIEWS && episodes.contains(&m.episode_id))
        {
            *views.entry(entry.episode_id).or_insert(0.0) += entry.value;
        }

        let mut ranked: Vec<TopContent> = views
            .into_iter()
            .filter_map(|(episode_id, views)| {
                let episode = self.store.episodes.get(&episode_id)?;
                let latest = self.store.drafts_for(&episode_id).pop();
                Some(TopContent {
                    title: latest.as_ref().map(|d| d.title.clone()).unwrap_or(episode.title),
                    draft_id: latest.map(|d| d.id),
                    episode_id,
                    views,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.views.total_cmp(&a.views).then_with(|| a.title.cmp(&b.title)));
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Daily totals of a metric over the period, oldest first
    pub fn metrics_by_period(&self, user_id: &str, metric: &str, period: Period) -> ServiceResult<Vec<PeriodBucket>> {
        if metric.trim().is_empty() {
            return Err(ServiceError::ValidationError("metric must not be empty".to_string()));
        }
        let today = Utc::now().date_naive();
        self.buckets(user_id, metric, period, today)
    }

    fn buckets(&self, user_id: &str, metric: &str, period: Period, today: NaiveDate) -> ServiceResult<Vec<PeriodBucket>> {
        let first = today - Duration::days(period.days() - 1);
        let episodes = self.user_episode_ids(user_id);
        let mut totals: HashMap<NaiveDate, f64> = HashMap::new();
        for entry in self.store.metric_entries.filter(|m| m.metric == metric && episodes.contains(&m.episode_id)) {
            let day = entry.captured_at.date_naive();
            if day >= first && day <= today {
                *totals.entry(day).or_insert(0.0) += entry.value;
            }
        }

        let mut buckets: Vec<PeriodBucket> = Vec::with_capacity(period.days() as usize);
        let mut previous: Option<f64> = None;
        let mut day = first;
        while day <= today {
            let value = totals.get(&day).copied().unwrap_or(0.0);
            let change_pct = previous
                .filter(|p| *p != 0.0)
                .map(|p| round2((value - p) / p * 100.0));
            buckets.push(PeriodBucket {
                date: day,
                value,
                change_pct,
            });
            previous = Some(value);
            day = day
                .succ_opt()
                .ok_or_else(|| ServiceError::ProcessingError("date out of range".to_string()))?;
        }
        Ok(buckets)
    }
}
