use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// Link from one draft to another related draft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InternalLink {
    pub draft_id: String,
    pub title: String,
    pub url: String,
    pub anchor_text: String,
    pub relevance_score: f64,
}

/// Search optimization data of a draft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeoData {
    pub id: String,
    pub draft_id: String,
    pub title: String,
    pub meta_description: String,
    pub slug: String,
    pub keywords: Vec<String>,
    pub faqs: Vec<Faq>,
    pub schema_markup: serde_json::Value,
    pub internal_links: Vec<InternalLink>,
    /// 0..=10
    pub readability_score: f64,
    /// 0..=100
    pub seo_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeoUpdate {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub slug: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub faqs: Option<Vec<Faq>>,
    pub schema_markup: Option<serde_json::Value>,
    pub internal_links: Option<Vec<InternalLink>>,
    pub readability_score: Option<f64>,
    pub seo_score: Option<f64>,
}

impl SeoUpdate {
    pub fn validate(&self) -> ServiceResult<()> {
        if let Some(score) = self.readability_score {
            if !(0.0..=10.0).contains(&score) {
                return Err(ServiceError::ValidationError(
                    "readability_score must be between 0 and 10".to_string(),
                ));
            }
        }
        if let Some(score) = self.seo_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(ServiceError::ValidationError(
                    "seo_score must be between 0 and 100".to_string(),
                ));
            }
        }
        if let Some(meta) = &self.meta_description {
            if meta.chars().count() > 160 {
                return Err(ServiceError::ValidationError(
                    "meta_description must be at most 160 characters".to_string(),
                ));
            }
        }
        if matches!(&self.slug, Some(slug) if slug.trim().is_empty()) {
            return Err(ServiceError::ValidationError("slug must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimizationRequest {
    #[serde(default)]
    pub keywords: Vec<String>,
    pub target_audience: Option<String>,
    pub content_type: Option<String>,
    pub competitors: Option<Vec<String>>,
    pub custom_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeoOptimization {
    pub seo: SeoData,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordDensity {
    pub keyword: String,
    pub occurrences: usize,
    /// Percentage of all words
    pub density: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadingStructure {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub assessment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisData {
    pub word_count: usize,
    pub readability_score: f64,
    pub keyword_density: Vec<KeywordDensity>,
    pub heading_structure: HeadingStructure,
}

/// Content analysis against target keywords
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeoAnalysis {
    pub score: f64,
    pub recommendations: Vec<String>,
    pub issues: Vec<String>,
    pub opportunities: Vec<String>,
    pub analysis_data: AnalysisData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadabilityReport {
    pub flesch_reading_ease: f64,
    pub flesch_kincaid_grade: f64,
    /// Reading ease mapped to 0..=10
    pub score: f64,
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_sentence_length: f64,
    pub avg_syllables_per_word: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetaTags {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub canonical_path: String,
    pub og_title: String,
    pub og_description: String,
    pub og_type: String,
}
