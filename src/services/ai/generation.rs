use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::error::{ServiceError, ServiceResult};
use crate::models::draft::DraftMetadata;
use crate::models::{BrandVoice, Citation, Draft, DraftStatus, Episode, Transcript, TranscriptSegment};
use crate::services::ai::llm::{strip_code_fence, LanguageModel};
use crate::services::ai::render;
use crate::services::ai::retrieval::{ScoredChunk, SegmentIndex};
use crate::services::common::new_id;
use crate::services::text;

pub const REDACTED: &str = "[redacted]";
pub const GENERATOR_LANGUAGE_MODEL: &str = "language_model";
pub const GENERATOR_EXTRACTIVE: &str = "extractive";

const SYSTEM_PROMPT: &str =
    "You are an expert content writer who turns podcast episodes into engaging, accurate blog posts.";
const TEMPERATURE: f32 = 0.7;
/// Retrieved passages backing each section
const SECTION_CONTEXT: usize = 5;
const MAX_SECTIONS: usize = 5;
const MIN_SECTIONS: usize = 3;
/// Transcript prefix shown to the model when extracting takeaways
const TAKEAWAY_CONTEXT_CHARS: usize = 2000;

/// Planned section of a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionPlan {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostStructure {
    pub title: String,
    pub sections: Vec<SectionPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogSection {
    pub title: String,
    pub content: String,
    pub citations: Vec<Citation>,
}

/// Generated post before it becomes a draft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogPost {
    pub title: String,
    pub introduction: String,
    pub sections: Vec<BlogSection>,
    pub conclusion: String,
    pub key_takeaways: Vec<String>,
}

impl BlogPost {
    /// Replace banned terms everywhere except inside quoted citations
    pub fn redact(&mut self, banned_terms: &[String]) -> usize {
        let mut replaced = 0;
        let mut scrub = |field: &mut String| {
            for term in banned_terms {
                let hits = text::find_phrase(field, term).len();
                if hits > 0 {
                    *field = text::replace_phrase(field, term, REDACTED);
                    replaced += hits;
                }
            }
        };
        scrub(&mut self.title);
        scrub(&mut self.introduction);
        for section in &mut self.sections {
            scrub(&mut section.title);
            scrub(&mut section.content);
        }
        scrub(&mut self.conclusion);
        for takeaway in &mut self.key_takeaways {
            scrub(takeaway);
        }
        replaced
    }

    pub fn citations(&self) -> Vec<Citation> {
        self.sections
            .iter()
            .flat_map(|section| {
                section.citations.iter().map(move |c| Citation {
                    section: Some(section.title.clone()),
                    ..c.clone()
                })
            })
            .collect()
    }
}

/// Structure used when the model reply cannot be parsed
pub fn fallback_structure(episode_title: &str) -> PostStructure {
    let section = |title: &str, description: &str| SectionPlan {
        title: title.to_string(),
        description: description.to_string(),
    };
    PostStructure {
        title: format!("Key Insights from: {}", episode_title),
        sections: vec![
            section("Introduction", "Overview of the episode"),
            section("Main Discussion", "Key points from the conversation"),
            section("Key Takeaways", "Important insights and lessons"),
        ],
    }
}

pub fn fallback_takeaways() -> Vec<String> {
    vec![
        "Key insights from the episode".to_string(),
        "Important lessons learned".to_string(),
        "Actionable next steps".to_string(),
    ]
}

fn brand_voice_instructions(brand_voice: Option<&BrandVoice>) -> String {
    brand_voice.map(BrandVoice::instructions).unwrap_or_default()
}

fn citation_from(scored: &ScoredChunk) -> Citation {
    Citation {
        text: scored.chunk.text.clone(),
        start_ms: scored.chunk.start_ms,
        end_ms: scored.chunk.end_ms,
        speaker: scored.chunk.speaker.clone(),
        confidence: scored.chunk.confidence,
        section: None,
    }
}

fn parse_structure(reply: &str) -> Option<PostStructure> {
    let mut structure: PostStructure = serde_json::from_str(strip_code_fence(reply)).ok()?;
    structure.sections.retain(|s| !s.title.trim().is_empty());
    if structure.title.trim().is_empty() || structure.sections.is_empty() {
        return None;
    }
    structure.sections.truncate(MAX_SECTIONS);
    Some(structure)
}

fn parse_takeaways(reply: &str) -> Option<Vec<String>> {
    let items: Vec<serde_json::Value> = serde_json::from_str(strip_code_fence(reply)).ok()?;
    Some(
        items
            .into_iter()
            .filter_map(|item| item.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

/// Progress callback: percent done and the section being written
pub type ProgressFn<'a> = &'a (dyn Fn(f64, Option<&str>) + Send + Sync);

/// Retrieval-grounded blog post generation
pub struct ContentGenerator {
    llm: Option<Arc<dyn LanguageModel>>,
}

impl ContentGenerator {
    pub fn new(llm: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { llm }
    }

    pub fn has_language_model(&self) -> bool {
        self.llm.is_some()
    }

    pub fn generator_name(&self) -> &'static str {
        if self.llm.is_some() {
            GENERATOR_LANGUAGE_MODEL
        } else {
            GENERATOR_EXTRACTIVE
        }
    }

    pub async fn generate_blog_post(
        &self,
        episode: &Episode,
        transcript: &Transcript,
        segments: &[TranscriptSegment],
        brand_voice: Option<&BrandVoice>,
        progress: Option<ProgressFn<'_>>,
    ) -> ServiceResult<BlogPost> {
        if segments.is_empty() && transcript.text.trim().is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "Transcript {} is empty, nothing to generate from",
                transcript.id
            )));
        }
        let report = |percent: f64, section: Option<&str>| {
            if let Some(progress) = progress {
                progress(percent, section);
            }
        };

        info!("Generating blog post for episode {} ({})", episode.id, self.generator_name());
        let index = SegmentIndex::build(segments);
        report(5.0, None);

        let mut post = match &self.llm {
            Some(llm) => {
                self.generate_with_model(llm.as_ref(), episode, transcript, &index, brand_voice, &report)
                    .await?
            }
            None => generate_extractive(episode, transcript, segments, &index, &report),
        };

        if let Some(voice) = brand_voice {
            let replaced = post.redact(&voice.banned_terms);
            if replaced > 0 {
                debug!("Redacted {} banned term occurrence(s) for voice {}", replaced, voice.name);
            }
        }
        report(100.0, None);
        Ok(post)
    }

    async fn generate_with_model(
        &self,
        llm: &dyn LanguageModel,
        episode: &Episode,
        transcript: &Transcript,
        index: &SegmentIndex,
        brand_voice: Option<&BrandVoice>,
        report: &(dyn Fn(f64, Option<&str>) + Send + Sync),
    ) -> ServiceResult<BlogPost> {
        let voice = brand_voice_instructions(brand_voice);
        let description = episode.description.clone().unwrap_or_default();
        let transcript_words = text::word_count(&transcript.text);

        let structure_prompt = format!(
            "Create a blog post structure for a podcast episode about \"{}\".\n\n\
             Episode description: {}\n\
             Transcript length: {} words\n\n\
             Brand voice: {}\n\n\
             Generate a structure with:\n\
             1. A compelling title\n\
             2. 3-5 main sections with descriptive titles\n\n\
             Return as JSON:\n\
             {{\"title\": \"Compelling Blog Post Title\", \"sections\": [{{\"title\": \"Section Title\", \"description\": \"What this section covers\"}}]}}",
            episode.title, description, transcript_words, voice
        );
        let reply = llm.complete(SYSTEM_PROMPT, &structure_prompt, 800, TEMPERATURE).await?;
        let structure = parse_structure(&reply).unwrap_or_else(|| {
            warn!("Failed to parse structure JSON, using fallback");
            fallback_structure(&episode.title)
        });
        report(15.0, None);

        let total = structure.sections.len().max(1) as f64;
        let mut sections = Vec::with_capacity(structure.sections.len());
        for (i, plan) in structure.sections.iter().enumerate() {
            report(15.0 + 55.0 * i as f64 / total, Some(&plan.title));
            let retrieved = index.search(&plan.description, SECTION_CONTEXT);
            let passages = retrieved
                .iter()
                .map(|r| {
                    format!(
                        "Speaker {}: {}",
                        r.chunk.speaker.as_deref().unwrap_or("Unknown"),
                        r.chunk.text
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            let prompt = format!(
                "Write a blog post section about \"{}\".\n\n\
                 Section description: {}\n\n\
                 Relevant transcript segments:\n{}\n\n\
                 Brand voice: {}\n\n\
                 Write engaging, informative content that:\n\
                 1. Is grounded in the provided transcript segments\n\
                 2. Maintains the specified brand voice\n\
                 3. Is well-structured and readable\n\
                 4. Includes specific examples and insights\n\n\
                 Return only the content text, no additional formatting.",
                plan.title, plan.description, passages, voice
            );
            let content = llm.complete(SYSTEM_PROMPT, &prompt, 1200, TEMPERATURE).await?;
            sections.push(BlogSection {
                title: plan.title.clone(),
                content: content.trim().to_string(),
                citations: retrieved.iter().map(citation_from).collect(),
            });
        }
        report(70.0, None);

        let intro_prompt = format!(
            "Write an engaging introduction for a blog post about the podcast episode \"{}\".\n\n\
             Episode description: {}\n\
             Transcript length: {} words\n\n\
             Brand voice: {}\n\n\
             The introduction should:\n\
             1. Hook the reader\n\
             2. Provide context about the episode\n\
             3. Set expectations for what the reader will learn\n\
             4. Be 2-3 paragraphs long\n\n\
             Return only the introduction text.",
            episode.title, description, transcript_words, voice
        );
        let introduction = llm.complete(SYSTEM_PROMPT, &intro_prompt, 600, TEMPERATURE).await?;
        report(80.0, None);

        let conclusion_prompt = format!(
            "Write a conclusion for a blog post about the podcast episode \"{}\".\n\n\
             Brand voice: {}\n\n\
             The conclusion should:\n\
             1. Summarize key insights\n\
             2. Provide actionable takeaways\n\
             3. End with a compelling call-to-action\n\
             4. Be 1-2 paragraphs long\n\n\
             Return only the conclusion text.",
            episode.title, voice
        );
        let conclusion = llm.complete(SYSTEM_PROMPT, &conclusion_prompt, 400, TEMPERATURE).await?;
        report(90.0, None);

        let excerpt: String = transcript.text.chars().take(TAKEAWAY_CONTEXT_CHARS).collect();
        let takeaways_prompt = format!(
            "Extract 3-5 key takeaways from this podcast transcript:\n\n{}\n\n\
             Brand voice: {}\n\n\
             Return as a JSON array of strings:\n\
             [\"Takeaway 1\", \"Takeaway 2\", \"Takeaway 3\"]",
            excerpt, voice
        );
        let reply = llm.complete(SYSTEM_PROMPT, &takeaways_prompt, 400, TEMPERATURE).await?;
        let key_takeaways = parse_takeaways(&reply).unwrap_or_else(|| {
            warn!("Failed to parse takeaways JSON");
            fallback_takeaways()
        });

        Ok(BlogPost {
            title: structure.title,
            introduction: introduction.trim().to_string(),
            sections,
            conclusion: conclusion.trim().to_string(),
            key_takeaways,
        })
    }

    /// Rewrite a passage in the given voice; requires a language model
    pub async fn rewrite_in_voice(&self, passage: &str, voice: &BrandVoice) -> ServiceResult<String> {
        let llm = self.llm.as_ref().ok_or_else(|| {
            ServiceError::ProviderError("No language model configured for tone rewriting".to_string())
        })?;
        let prompt = format!(
            "Rewrite the following blog post passage.\n\nBrand voice: {}\n\n\
             Keep every fact and quote, keep Markdown formatting, and return only the rewritten text.\n\n{}",
            voice.instructions(),
            passage
        );
        let rewritten = llm.complete(SYSTEM_PROMPT, &prompt, 1500, TEMPERATURE).await?;
        Ok(rewritten.trim().to_string())
    }

    /// Build a draft version from a generated post
    pub fn draft_from_blog_post(
        &self,
        episode: &Episode,
        post: &BlogPost,
        version: u32,
        brand_voice_id: Option<String>,
        parent_id: Option<String>,
    ) -> Draft {
        let content = render::to_markdown(post);
        let now = Utc::now();
        Draft {
            id: new_id(),
            episode_id: episode.id.clone(),
            title: post.title.clone(),
            metadata: DraftMetadata {
                key_takeaways: post.key_takeaways.clone(),
                word_count: text::word_count(&content),
                generated_at: now,
                generator: self.generator_name().to_string(),
                revision: None,
            },
            content,
            version,
            status: DraftStatus::Completed,
            citations: post.citations(),
            brand_voice_id,
            parent_id,
            created_at: now,
            updated_at: now,
        }
    }
}

fn title_case(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sentences of `source` with the highest term weight, in original order
fn key_sentences(source: &str, weights: &[String], limit: usize) -> Vec<String> {
    let sentences = text::sentences(source);
    let mut scored: Vec<(usize, usize)> = sentences
        .iter()
        .enumerate()
        .map(|(i, sentence)| {
            let terms = text::terms(sentence);
            let score = terms.iter().filter(|t| weights.contains(t)).count();
            (i, score)
        })
        .filter(|(i, _)| text::word_count(&sentences[*i]) >= 4)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let mut picked: Vec<usize> = scored.into_iter().take(limit).map(|(i, _)| i).collect();
    picked.sort_unstable();
    picked.into_iter().map(|i| sentences[i].clone()).collect()
}

/// Build the post from the transcript itself, without a language model
fn generate_extractive(
    episode: &Episode,
    transcript: &Transcript,
    segments: &[TranscriptSegment],
    index: &SegmentIndex,
    report: &(dyn Fn(f64, Option<&str>) + Send + Sync),
) -> BlogPost {
    let salient = index.salient_terms(20);
    let count = (segments.len() + 3) / 4;
    let count = count.clamp(MIN_SECTIONS, MAX_SECTIONS).min(segments.len().max(1));
    let group_size = ((segments.len() + count - 1) / count).max(1);

    let mut sections = Vec::new();
    let mut used_titles: Vec<String> = Vec::new();
    for (i, group) in segments.chunks(group_size).enumerate() {
        let group_text = group.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ");
        let topic = group
            .iter()
            .filter_map(|s| s.topic.as_deref())
            .find(|t| *t != "general" && !used_titles.iter().any(|u| u.eq_ignore_ascii_case(t)))
            .map(title_case);
        let terms: Vec<String> = text::top_terms(&group_text, 3).into_iter().map(|(t, _)| t).collect();
        let title = topic
            .or_else(|| (!terms.is_empty()).then(|| title_case(&terms.join(" "))))
            .unwrap_or_else(|| format!("Part {}", i + 1));
        used_titles.push(title.clone());
        report(15.0 + 55.0 * i as f64 / count as f64, Some(&title));

        let query = format!("{} {}", title, terms.join(" "));
        let citations = index
            .search(&query, SECTION_CONTEXT)
            .iter()
            .filter(|r| r.score > 0.0)
            .map(citation_from)
            .collect();
        let mut content = key_sentences(&group_text, &salient, 4).join(" ");
        if content.is_empty() {
            content = group_text.clone();
        }
        sections.push(BlogSection {
            title,
            content,
            citations,
        });
    }
    report(70.0, None);

    let overview = sections
        .iter()
        .map(|s| s.title.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let introduction = match episode.description.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(description) => format!(
            "{}\n\nIn this post we walk through the conversation from \"{}\": {}.",
            description.trim(),
            episode.title,
            overview
        ),
        None => format!(
            "This post distills the conversation from \"{}\" into its main ideas: {}.",
            episode.title, overview
        ),
    };

    let closing = text::sentences(&transcript.text)
        .into_iter()
        .rev()
        .filter(|s| text::word_count(s) >= 4)
        .take(2)
        .collect::<Vec<_>>();
    let conclusion = if closing.is_empty() {
        format!("That wraps up the key ideas from \"{}\".", episode.title)
    } else {
        closing.into_iter().rev().collect::<Vec<_>>().join(" ")
    };

    let mut key_takeaways = key_sentences(&transcript.text, &salient, 5);
    if key_takeaways.len() < MIN_SECTIONS {
        key_takeaways = fallback_takeaways();
    }

    BlogPost {
        title: fallback_structure(&episode.title).title,
        introduction,
        sections,
        conclusion,
        key_takeaways,
    }
}
