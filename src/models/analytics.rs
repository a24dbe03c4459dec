use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{ServiceError, ServiceResult};

/// Episode level measurement (traffic, clicks, positions ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricEntry {
    pub id: String,
    pub episode_id: String,
    pub metric: String,
    pub value: f64,
    pub metadata: Option<serde_json::Value>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricEntryCreate {
    pub metric: String,
    pub value: f64,
    pub metadata: Option<serde_json::Value>,
    pub captured_at: Option<DateTime<Utc>>,
}

impl MetricEntryCreate {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.metric.trim().is_empty() {
            return Err(ServiceError::ValidationError("metric must not be empty".to_string()));
        }
        if !self.value.is_finite() {
            return Err(ServiceError::ValidationError("value must be a finite number".to_string()));
        }
        Ok(())
    }
}

/// Draft level content performance score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceEntry {
    pub id: String,
    pub draft_id: String,
    pub metric_type: String,
    pub score: f64,
    pub details: Option<serde_json::Value>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceEntryCreate {
    pub metric_type: String,
    pub score: f64,
    pub details: Option<serde_json::Value>,
}

impl PerformanceEntryCreate {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.metric_type.trim().is_empty() {
            return Err(ServiceError::ValidationError("metric_type must not be empty".to_string()));
        }
        if !(0.0..=100.0).contains(&self.score) {
            return Err(ServiceError::ValidationError(
                "score must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedEvent {
    pub id: String,
    pub event_type: String,
    pub user_id: Option<String>,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackEventRequest {
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Reporting window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Period {
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    #[default]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl Period {
    pub fn days(&self) -> i64 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Quarter => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "7d",
            Period::Month => "30d",
            Period::Quarter => "90d",
        }
    }
}

/// Dashboard headline figures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsSummary {
    pub date_range: Period,
    pub total_episodes: usize,
    pub total_blog_posts: usize,
    /// Minutes
    pub avg_processing_time: f64,
    /// Percent
    pub success_rate: f64,
    pub organic_traffic: u64,
    pub avg_position: f64,
    /// Percent
    pub click_through_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopContent {
    pub episode_id: String,
    pub draft_id: Option<String>,
    pub title: String,
    pub views: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodBucket {
    pub date: NaiveDate,
    pub value: f64,
    /// Day-over-day change in percent, absent when the previous day was zero
    pub change_pct: Option<f64>,
}
