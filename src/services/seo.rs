//! Search optimization of drafts
//!
//! The analysis helpers work on the Markdown body of a draft. Scores are
//! heuristics: readability follows the Flesch formulas, the overall score
//! starts at 100 and loses points for every issue found.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::{json, Value};

use crate::core::cache::TtlCache;
use crate::core::error::{ServiceError, ServiceResult};
use crate::core::store::Store;
use crate::models::seo::{
    AnalysisData, Faq, HeadingStructure, InternalLink, KeywordDensity, MetaTags, OptimizationRequest,
    ReadabilityReport, SeoAnalysis, SeoOptimization, SeoUpdate,
};
use crate::models::{Draft, SeoData};
use crate::services::common::new_id;
use crate::services::text;

pub const META_DESCRIPTION_CHARS: usize = 160;
pub const TITLE_CHARS: usize = 60;
const SLUG_CHARS: usize = 80;
const MAX_KEYWORDS: usize = 10;
const MAX_FAQS: usize = 5;
const MAX_INTERNAL_LINKS: usize = 5;
const MIN_WORDS: usize = 300;
const COMPETITIVE_WORDS: usize = 800;
const ANALYSIS_TTL: Duration = Duration::from_secs(900);

/// Markdown reduced to prose: heading markers, list markers and emphasis removed
pub fn plain_text(markdown: &str) -> String {
    markdown
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.trim_start_matches('#').trim_start();
            let line = line
                .strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .unwrap_or(line);
            let line = match line.split_once(". ") {
                Some((n, rest)) if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => rest,
                _ => line,
            };
            line.replace("**", "").replace('`', "").replace('*', "")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn readability(markdown: &str) -> ReadabilityReport {
    let plain = plain_text(markdown);
    let words = text::words(&plain);
    let sentence_count = text::sentences(&plain).len().max(1);
    if words.is_empty() {
        return ReadabilityReport {
            flesch_reading_ease: 0.0,
            flesch_kincaid_grade: 0.0,
            score: 0.0,
            word_count: 0,
            sentence_count: 0,
            avg_sentence_length: 0.0,
            avg_syllables_per_word: 0.0,
        };
    }
    let syllables: usize = words.iter().map(|w| text::syllables(w)).sum();
    let words_per_sentence = words.len() as f64 / sentence_count as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;
    let ease = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
    let grade = 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59;

    ReadabilityReport {
        flesch_reading_ease: round2(ease),
        flesch_kincaid_grade: round2(grade.max(0.0)),
        score: round2((ease / 10.0).clamp(0.0, 10.0)),
        word_count: words.len(),
        sentence_count,
        avg_sentence_length: round2(words_per_sentence),
        avg_syllables_per_word: round2(syllables_per_word),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
            dash = false;
        } else if !dash && !slug.is_empty() {
            slug.push('-');
            dash = true;
        }
    }
    let mut slug: String = slug.chars().take(SLUG_CHARS).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// First prose paragraph cut to 160 characters at a word boundary
pub fn meta_description(markdown: &str) -> String {
    markdown
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#') && !p.starts_with("**"))
        .map(|p| text::truncate_words(&plain_text(p).replace('\n', " "), META_DESCRIPTION_CHARS))
        .unwrap_or_default()
}

pub fn extract_keywords(markdown: &str, limit: usize) -> Vec<String> {
    text::top_terms(&plain_text(markdown), limit)
        .into_iter()
        .map(|(term, _)| term)
        .collect()
}

/// Sentences of the prose paragraphs, headings excluded
fn prose_sentences(markdown: &str) -> Vec<String> {
    markdown
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.starts_with('#'))
        .flat_map(|p| text::sentences(&plain_text(p)))
        .collect()
}

/// Question sentences paired with the sentence that follows them
pub fn extract_faqs(markdown: &str) -> Vec<Faq> {
    let sentences = prose_sentences(markdown);
    let mut faqs = Vec::new();
    for pair in sentences.windows(2) {
        let (question, answer) = (&pair[0], &pair[1]);
        if question.ends_with('?') && !answer.ends_with('?') && text::word_count(question) >= 3 {
            faqs.push(Faq {
                question: question.clone(),
                answer: answer.clone(),
            });
            if faqs.len() == MAX_FAQS {
                break;
            }
        }
    }
    faqs
}

pub fn schema_markup(
    title: &str,
    description: &str,
    keywords: &[String],
    faqs: &[Faq],
    published: DateTime<Utc>,
) -> Value {
    let mut graph = vec![json!({
        "@type": "Article",
        "headline": title,
        "description": description,
        "keywords": keywords.join(", "),
        "datePublished": published.to_rfc3339(),
    })];
    if !faqs.is_empty() {
        let questions: Vec<Value> = faqs
            .iter()
            .map(|faq| {
                json!({
                    "@type": "Question",
                    "name": faq.question,
                    "acceptedAnswer": {"@type": "Answer", "text": faq.answer},
                })
            })
            .collect();
        graph.push(json!({"@type": "FAQPage", "mainEntity": questions}));
    }
    json!({"@context": "https://schema.org", "@graph": graph})
}

pub fn keyword_density(markdown: &str, keywords: &[String]) -> Vec<KeywordDensity> {
    let plain = plain_text(markdown);
    let total = text::word_count(&plain);
    keywords
        .iter()
        .map(|keyword| {
            let occurrences = text::find_phrase(&plain, keyword).len();
            let density = if total == 0 {
                0.0
            } else {
                round2(occurrences as f64 * 100.0 / total as f64)
            };
            KeywordDensity {
                keyword: keyword.clone(),
                occurrences,
                density,
            }
        })
        .collect()
}

pub fn heading_structure(markdown: &str) -> HeadingStructure {
    let mut counts = [0usize; 3];
    for line in markdown.lines() {
        let level = line.chars().take_while(|c| *c == '#').count();
        if (1..=3).contains(&level) && line[level..].starts_with(' ') {
            counts[level - 1] += 1;
        }
    }
    let [h1, h2, h3] = counts;
    let assessment = match (h1, h2) {
        (0, _) => "Missing H1 heading",
        (1, n) if n >= 2 => "Good",
        (1, _) => "Add more H2 sections",
        _ => "Multiple H1 headings",
    };
    HeadingStructure {
        h1,
        h2,
        h3,
        assessment: assessment.to_string(),
    }
}

fn first_heading(markdown: &str) -> Option<&str> {
    markdown.lines().find_map(|l| l.strip_prefix("# ")).map(str::trim)
}

pub fn analyze(markdown: &str, keywords: &[String]) -> SeoAnalysis {
    let word_count = text::word_count(&plain_text(markdown));
    let reading = readability(markdown);
    let headings = heading_structure(markdown);
    let density = keyword_density(markdown, keywords);
    let title = first_heading(markdown).unwrap_or_default();

    let mut score: f64 = 100.0;
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();
    let mut opportunities = Vec::new();

    if word_count < MIN_WORDS {
        issues.push(format!("Content is short ({} words); aim for at least {}", word_count, MIN_WORDS));
        score -= 20.0;
    } else if word_count < COMPETITIVE_WORDS {
        opportunities.push(format!("Expand to {}+ words for competitive topics", COMPETITIVE_WORDS));
    }

    if reading.score < 5.0 {
        issues.push(format!("Readability is low ({:.1}/10)", reading.score));
        recommendations.push("Use shorter sentences and simpler words".to_string());
        score -= 10.0;
    }

    if headings.assessment != "Good" {
        issues.push(headings.assessment.clone());
        score -= 10.0;
    }

    if keywords.is_empty() {
        recommendations.push("Provide target keywords to measure keyword coverage".to_string());
    }
    for entry in &density {
        if entry.occurrences == 0 {
            issues.push(format!("Keyword '{}' does not appear in the content", entry.keyword));
            score -= 10.0;
            continue;
        }
        if entry.density > 3.0 {
            issues.push(format!(
                "Keyword '{}' is overused ({:.2}% density)",
                entry.keyword, entry.density
            ));
            score -= 5.0;
        } else if entry.density < 0.5 {
            recommendations.push(format!("Use '{}' more often", entry.keyword));
        }
        if text::find_phrase(title, &entry.keyword).is_empty() {
            recommendations.push(format!("Include '{}' in the title", entry.keyword));
            score -= 5.0;
        }
    }

    if extract_faqs(markdown).is_empty() {
        opportunities.push("Add an FAQ section".to_string());
    }
    if headings.h3 == 0 && headings.h2 > 3 {
        opportunities.push("Break long sections up with H3 subheadings".to_string());
    }

    SeoAnalysis {
        score: score.clamp(0.0, 100.0),
        recommendations,
        issues,
        opportunities,
        analysis_data: AnalysisData {
            word_count,
            readability_score: reading.score,
            keyword_density: density,
            heading_structure: headings,
        },
    }
}

fn keyword_set(markdown: &str) -> HashSet<String> {
    extract_keywords(markdown, MAX_KEYWORDS * 2).into_iter().collect()
}

/// Related drafts ranked by Jaccard overlap of their keywords, best first
pub fn suggest_internal_links(draft: &Draft, candidates: &[Draft]) -> Vec<InternalLink> {
    let own = keyword_set(&draft.content);
    let mut links: Vec<InternalLink> = candidates
        .iter()
        .filter(|c| c.id != draft.id && c.episode_id != draft.episode_id)
        .filter_map(|candidate| {
            let other = keyword_set(&candidate.content);
            let union = own.union(&other).count();
            if union == 0 {
                return None;
            }
            let score = own.intersection(&other).count() as f64 / union as f64;
            (score > 0.0).then(|| InternalLink {
                draft_id: candidate.id.clone(),
                title: candidate.title.clone(),
                url: format!("/blog/{}", slugify(&candidate.title)),
                anchor_text: candidate.title.clone(),
                relevance_score: round2(score),
            })
        })
        .collect();
    links.sort_by(|a, b| {
        b.relevance_score
            .total_cmp(&a.relevance_score)
            .then_with(|| a.title.cmp(&b.title))
    });
    links.truncate(MAX_INTERNAL_LINKS);
    links
}

pub struct SeoService {
    store: Arc<Store>,
    cache: Arc<TtlCache>,
}

impl SeoService {
    pub fn new(store: Arc<Store>, cache: Arc<TtlCache>) -> Self {
        Self { store, cache }
    }

    fn draft(&self, draft_id: &str, user_id: &str) -> ServiceResult<Draft> {
        self.store.owned_draft(draft_id, user_id).map(|(draft, _)| draft)
    }

    /// Latest version of every other episode of the user
    fn link_candidates(&self, user_id: &str) -> Vec<Draft> {
        self.store
            .episodes
            .filter(|e| e.user_id == user_id)
            .iter()
            .filter_map(|e| self.store.drafts_for(&e.id).pop())
            .collect()
    }

    pub fn get_for_draft(&self, draft_id: &str, user_id: &str) -> ServiceResult<SeoData> {
        self.draft(draft_id, user_id)?;
        self.store
            .seo_for_draft(draft_id)
            .ok_or_else(|| ServiceError::NotFound(format!("SEO data for draft {}", draft_id)))
    }

    pub fn update(&self, draft_id: &str, user_id: &str, update: SeoUpdate) -> ServiceResult<SeoData> {
        update.validate()?;
        let current = self.get_for_draft(draft_id, user_id)?;
        let updated = self
            .store
            .seo
            .update(&current.id, |seo| {
                if let Some(title) = update.title {
                    seo.title = title;
                }
                if let Some(meta) = update.meta_description {
                    seo.meta_description = meta;
                }
                if let Some(slug) = update.slug {
                    seo.slug = slugify(&slug);
                }
                if let Some(keywords) = update.keywords {
                    seo.keywords = keywords;
                }
                if let Some(faqs) = update.faqs {
                    seo.faqs = faqs;
                }
                if let Some(schema) = update.schema_markup {
                    seo.schema_markup = schema;
                }
                if let Some(links) = update.internal_links {
                    seo.internal_links = links;
                }
                if let Some(score) = update.readability_score {
                    seo.readability_score = score;
                }
                if let Some(score) = update.seo_score {
                    seo.seo_score = score;
                }
                seo.updated_at = Utc::now();
            })
            .ok_or_else(|| ServiceError::NotFound(format!("SEO data for draft {}", draft_id)))?;
        self.cache.clear_prefix(&analysis_prefix(draft_id));
        Ok(updated)
    }

    /// Compute and store the SEO data of a draft, replacing earlier results
    pub fn optimize(&self, draft_id: &str, user_id: &str, request: OptimizationRequest) -> ServiceResult<SeoOptimization> {
        let draft = self.draft(draft_id, user_id)?;
        let candidates = self.link_candidates(user_id);
        Ok(self.optimize_draft(&draft, &candidates, &request))
    }

    pub(crate) fn optimize_draft(
        &self,
        draft: &Draft,
        candidates: &[Draft],
        request: &OptimizationRequest,
    ) -> SeoOptimization {
        let mut keywords: Vec<String> = request
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        for keyword in extract_keywords(&draft.content, MAX_KEYWORDS) {
            if keywords.len() >= MAX_KEYWORDS {
                break;
            }
            if !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }

        let title = text::truncate_words(&draft.title, TITLE_CHARS);
        let description = meta_description(&draft.content);
        let faqs = extract_faqs(&draft.content);
        let now = Utc::now();
        let analysis = analyze(&draft.content, &request.keywords);

        let existing = self.store.seo_for_draft(&draft.id);
        let seo = SeoData {
            id: existing.as_ref().map(|s| s.id.clone()).unwrap_or_else(new_id),
            draft_id: draft.id.clone(),
            slug: slugify(&draft.title),
            schema_markup: schema_markup(&title, &description, &keywords, &faqs, draft.created_at),
            internal_links: suggest_internal_links(draft, candidates),
            readability_score: analysis.analysis_data.readability_score,
            seo_score: analysis.score,
            title,
            meta_description: description,
            keywords,
            faqs,
            created_at: existing.map(|s| s.created_at).unwrap_or(now),
            updated_at: now,
        };
        if !self.store.upsert_seo(&draft.episode_id, seo.clone()) {
            debug!("Draft {} was deleted, SEO data not stored", draft.id);
        }
        self.cache.clear_prefix(&analysis_prefix(&draft.id));
        debug!("Optimized draft {}: score {:.0}", draft.id, seo.seo_score);

        let mut recommendations = analysis.issues;
        recommendations.extend(analysis.recommendations);
        recommendations.extend(analysis.opportunities);
        SeoOptimization { seo, recommendations }
    }

    /// Analysis of the draft body; cached per draft and keyword set
    pub fn analyze(&self, draft_id: &str, user_id: &str, keywords: Option<Vec<String>>) -> ServiceResult<SeoAnalysis> {
        let draft = self.draft(draft_id, user_id)?;
        let keywords = match keywords.filter(|k| !k.is_empty()) {
            Some(keywords) => keywords,
            None => self
                .store
                .seo_for_draft(draft_id)
                .map(|s| s.keywords)
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| extract_keywords(&draft.content, 5)),
        };
        let key = format!("{}{}", analysis_prefix(draft_id), keywords.join(","));
        if let Some(cached) = self.cache.get::<SeoAnalysis>(&key) {
            return Ok(cached);
        }
        let analysis = analyze(&draft.content, &keywords);
        self.cache.set(&key, &analysis, Some(ANALYSIS_TTL))?;
        Ok(analysis)
    }

    pub fn readability(&self, draft_id: &str, user_id: &str) -> ServiceResult<ReadabilityReport> {
        Ok(readability(&self.draft(draft_id, user_id)?.content))
    }

    pub fn suggest_keywords(&self, draft_id: &str, user_id: &str, limit: usize) -> ServiceResult<Vec<String>> {
        Ok(extract_keywords(&self.draft(draft_id, user_id)?.content, limit.clamp(1, 50)))
    }

    /// Meta tags from stored SEO data, or computed from the draft when none exists
    pub fn meta_tags(&self, draft_id: &str, user_id: &str) -> ServiceResult<MetaTags> {
        let draft = self.draft(draft_id, user_id)?;
        let (title, description, keywords, slug) = match self.store.seo_for_draft(draft_id) {
            Some(seo) => (seo.title, seo.meta_description, seo.keywords, seo.slug),
            None => (
                text::truncate_words(&draft.title, TITLE_CHARS),
                meta_description(&draft.content),
                extract_keywords(&draft.content, MAX_KEYWORDS),
                slugify(&draft.title),
            ),
        };
        Ok(MetaTags {
            og_title: title.clone(),
            og_description: description.clone(),
            og_type: "article".to_string(),
            canonical_path: format!("/blog/{}", slug),
            keywords: keywords.join(", "),
            title,
            description,
        })
    }

    pub fn internal_links(&self, draft_id: &str, user_id: &str) -> ServiceResult<Vec<InternalLink>> {
        let draft = self.draft(draft_id, user_id)?;
        Ok(suggest_internal_links(&draft, &self.link_candidates(user_id)))
    }

    pub fn schema(&self, draft_id: &str, user_id: &str) -> ServiceResult<Value> {
        let draft = self.draft(draft_id, user_id)?;
        if let Some(seo) = self.store.seo_for_draft(draft_id) {
            return Ok(seo.schema_markup);
        }
        let description = meta_description(&draft.content);
        let keywords = extract_keywords(&draft.content, MAX_KEYWORDS);
        Ok(schema_markup(
            &draft.title,
            &description,
            &keywords,
            &extract_faqs(&draft.content),
            draft.created_at,
        ))
    }
}

/// Cache prefix of every analysis of a draft
pub fn analysis_prefix(draft_id: &str) -> String {
    format!("seo:analysis:{}:", draft_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::fixtures;

    const POST: &str = "# Database Indexing Explained\n\n\
        Indexes make database queries fast. They trade storage for speed.\n\n\
        ## Why Indexes Matter\n\n\
        What is a covering index? It stores every column a query needs.\n\n\
        ## When To Skip Them\n\n\
        Small tables rarely need an index.\n";

    fn service() -> (Arc<Store>, Arc<TtlCache>, SeoService) {
        let store = Arc::new(Store::new());
        store.episodes.insert(fixtures::episode("e1", "alice"));
        store.episodes.insert(fixtures::episode("e2", "alice"));
        store.episodes.insert(fixtures::episode("e3", "alice"));
        let mut draft = fixtures::draft("d1", "e1", 1, POST);
        draft.title = "Database Indexing Explained".to_string();
        store.drafts.insert(draft);

        let mut related = fixtures::draft("d2", "e2", 1, "# Query Speed\n\nA database index makes every query faster.");
        related.title = "Query Speed: A Guide!".to_string();
        store.drafts.insert(related);
        store.drafts.insert(fixtures::draft("d3", "e3", 1, "# Hiring\n\nCulture and trust build teams."));

        let cache = Arc::new(TtlCache::new(32, Duration::from_secs(60)));
        let service = SeoService::new(Arc::clone(&store), Arc::clone(&cache));
        (store, cache, service)
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Query Speed: A Guide!"), "query-speed-a-guide");
        assert_eq!(slugify("  --Rust & Go--  "), "rust-go");
        assert!(slugify(&"word ".repeat(40)).len() <= 80);
    }

    #[test]
    fn test_meta_description_skips_headings_and_truncates() {
        assert_eq!(
            meta_description(POST),
            "Indexes make database queries fast. They trade storage for speed."
        );
        let long = format!("# T\n\n{}", "lorem ipsum ".repeat(40));
        let description = meta_description(&long);
        assert!(description.chars().count() <= META_DESCRIPTION_CHARS);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn test_readability_bounds() {
        let report = readability(POST);
        assert!(report.word_count > 20);
        assert!((0.0..=10.0).contains(&report.score));
        assert_eq!(readability("").score, 0.0);
    }

    #[test]
    fn test_faqs_and_schema() {
        let faqs = extract_faqs(POST);
        assert_eq!(faqs.len(), 1);
        assert_eq!(faqs[0].question, "What is a covering index?");
        assert_eq!(faqs[0].answer, "It stores every column a query needs.");

        let schema = schema_markup("T", "D", &["index".to_string()], &faqs, Utc::now());
        assert_eq!(schema["@graph"][0]["@type"], "Article");
        assert_eq!(schema["@graph"][1]["@type"], "FAQPage");
        assert_eq!(schema["@graph"][1]["mainEntity"][0]["acceptedAnswer"]["text"], faqs[0].answer);

        let without = schema_markup("T", "D", &[], &[], Utc::now());
        assert_eq!(without["@graph"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_headings_and_density() {
        let headings = heading_structure(POST);
        assert_eq!((headings.h1, headings.h2, headings.h3), (1, 2, 0));
        assert_eq!(headings.assessment, "Good");

        let density = keyword_density(POST, &["index".to_string(), "missing".to_string()]);
        assert_eq!(density[0].occurrences, 2);
        assert!(density[0].density > 0.0);
        assert_eq!(density[1].occurrences, 0);
    }

    #[test]
    fn test_analyze_flags_missing_keywords() {
        let analysis = analyze(POST, &["database".to_string(), "kubernetes".to_string()]);
        assert!(analysis.issues.iter().any(|i| i.contains("kubernetes")));
        assert!(analysis.issues.iter().any(|i| i.contains("short")));
        assert!(analysis.score < 100.0 && analysis.score >= 0.0);
        assert_eq!(analysis.analysis_data.heading_structure.assessment, "Good");
    }

    #[test]
    fn test_internal_links_rank_related_drafts() {
        let (store, _, service) = service();
        let links = service.internal_links("d1", "alice").unwrap();
        assert_eq!(links[0].draft_id, "d2");
        assert_eq!(links[0].url, "/blog/query-speed-a-guide");
        assert!(links.iter().all(|l| l.draft_id != "d1"));
        let d1 = store.drafts.get("d1").unwrap();
        assert!(suggest_internal_links(&d1, &[d1.clone()]).is_empty());
    }

    #[test]
    fn test_optimize_upserts() {
        let (store, _, service) = service();
        assert!(matches!(
            service.get_for_draft("d1", "alice"),
            Err(ServiceError::NotFound(_))
        ));

        let request = OptimizationRequest {
            keywords: vec!["Database".to_string()],
            ..Default::default()
        };
        let first = service.optimize("d1", "alice", request.clone()).unwrap();
        assert_eq!(first.seo.slug, "database-indexing-explained");
        assert_eq!(first.seo.keywords[0], "database");
        assert!(first.seo.keywords.len() <= MAX_KEYWORDS);
        assert!(!first.recommendations.is_empty());

        let second = service.optimize("d1", "alice", request).unwrap();
        assert_eq!(first.seo.id, second.seo.id);
        assert_eq!(store.seo.len(), 1);
        assert!(service.optimize("d1", "bob", OptimizationRequest::default()).is_err());
    }

    #[test]
    fn test_optimize_skips_draft_deleted_meanwhile() {
        let (store, _, service) = service();
        let draft = store.drafts.get("d1").unwrap();
        store.delete_draft("d1");

        let optimized = service.optimize_draft(&draft, &[], &OptimizationRequest::default());
        assert_eq!(optimized.seo.draft_id, "d1");
        assert!(store.seo_for_draft("d1").is_none());
    }

    #[test]
    fn test_update_validates_and_normalizes_slug() {
        let (_, _, service) = service();
        service.optimize("d1", "alice", OptimizationRequest::default()).unwrap();
        let updated = service
            .update(
                "d1",
                "alice",
                SeoUpdate {
                    slug: Some("My Custom Slug".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.slug, "my-custom-slug");

        let invalid = SeoUpdate {
            seo_score: Some(120.0),
            ..Default::default()
        };
        assert!(matches!(
            service.update("d1", "alice", invalid),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn test_analysis_is_cached() {
        let (_, cache, service) = service();
        let keywords = Some(vec!["index".to_string()]);
        let first = service.analyze("d1", "alice", keywords.clone()).unwrap();
        assert!(cache.exists("seo:analysis:d1:index"));
        assert_eq!(service.analyze("d1", "alice", keywords).unwrap(), first);
    }

    #[test]
    fn test_meta_tags_fall_back_to_draft() {
        let (_, _, service) = service();
        let tags = service.meta_tags("d1", "alice").unwrap();
        assert_eq!(tags.canonical_path, "/blog/database-indexing-explained");
        assert_eq!(tags.og_type, "article");
        assert!(!tags.description.is_empty());
    }
}
