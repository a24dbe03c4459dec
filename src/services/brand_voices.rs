use std::sync::Arc;

use chrono::Utc;
use log::info;

use crate::core::error::{ServiceError, ServiceResult};
use crate::core::store::Store;
use crate::models::brand_voice::{BrandVoiceCreate, BrandVoiceUpdate, ComplianceReport, TermViolation};
use crate::models::BrandVoice;
use crate::services::ai::generation::REDACTED;
use crate::services::common::{new_id, paginate, Page, PageParams};
use crate::services::text;

/// Points deducted per banned term occurrence
const VIOLATION_PENALTY: u32 = 10;

/// Check content against a voice's banned terms
pub fn compliance(content: &str, voice: &BrandVoice) -> ComplianceReport {
    let violations: Vec<TermViolation> = voice
        .banned_terms
        .iter()
        .filter_map(|term| {
            let occurrences = text::find_phrase(content, term).len();
            (occurrences > 0).then(|| TermViolation {
                term: term.clone(),
                occurrences,
            })
        })
        .collect();

    let total: usize = violations.iter().map(|v| v.occurrences).sum();
    let penalty = (total as u32).saturating_mul(VIOLATION_PENALTY);
    let mut suggestions: Vec<String> = violations
        .iter()
        .map(|v| {
            format!(
                "Remove or rephrase '{}' ({} occurrence{})",
                v.term,
                v.occurrences,
                if v.occurrences == 1 { "" } else { "s" }
            )
        })
        .collect();
    if !violations.is_empty() {
        suggestions.push(format!("Keep the tone {}", voice.tone));
    }

    ComplianceReport {
        is_compliant: violations.is_empty(),
        violations,
        suggestions,
        score: 100u32.saturating_sub(penalty),
    }
}

/// Replace every banned term of the voice, returning the new text and the replacement count
pub fn redact(content: &str, voice: &BrandVoice) -> (String, usize) {
    let mut redacted = content.to_string();
    let mut count = 0;
    for term in &voice.banned_terms {
        let hits = text::find_phrase(&redacted, term).len();
        if hits > 0 {
            redacted = text::replace_phrase(&redacted, term, REDACTED);
            count += hits;
        }
    }
    (redacted, count)
}

pub struct BrandVoiceService {
    store: Arc<Store>,
}

impl BrandVoiceService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    fn ensure_unique_name(&self, workspace_id: &str, name: &str, except: Option<&str>) -> ServiceResult<()> {
        let taken = self.store.brand_voices.filter(|v| {
            v.workspace_id == workspace_id
                && v.name.eq_ignore_ascii_case(name.trim())
                && Some(v.id.as_str()) != except
        });
        if taken.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Conflict(format!(
                "Brand voice '{}' already exists in workspace {}",
                name.trim(),
                workspace_id
            )))
        }
    }

    /// Voices ordered by name, optionally limited to one workspace
    pub fn list(&self, workspace_id: Option<&str>, params: PageParams) -> ServiceResult<Page<BrandVoice>> {
        let mut voices = self
            .store
            .brand_voices
            .filter(|v| workspace_id.map_or(true, |ws| v.workspace_id == ws));
        voices.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.id.cmp(&b.id)));
        paginate(voices, params)
    }

    pub fn active(&self, workspace_id: &str) -> Vec<BrandVoice> {
        let mut voices = self
            .store
            .brand_voices
            .filter(|v| v.is_active && v.workspace_id == workspace_id);
        voices.sort_by(|a, b| a.name.cmp(&b.name));
        voices
    }

    pub fn create(&self, create: BrandVoiceCreate) -> ServiceResult<BrandVoice> {
        create.validate()?;
        self.ensure_unique_name(&create.workspace_id, &create.name, None)?;
        let now = Utc::now();
        let voice = BrandVoice {
            id: new_id(),
            workspace_id: create.workspace_id,
            name: create.name.trim().to_string(),
            description: create.description,
            tone: create.tone.trim().to_string(),
            style_guide: create.style_guide,
            banned_terms: create.banned_terms.into_iter().map(|t| t.trim().to_string()).collect(),
            tone_examples: create.tone_examples,
            is_active: create.is_active,
            created_at: now,
            updated_at: now,
        };
        self.store.brand_voices.insert(voice.clone());
        info!("Created brand voice '{}' in workspace {}", voice.name, voice.workspace_id);
        Ok(voice)
    }

    pub fn get(&self, voice_id: &str) -> ServiceResult<BrandVoice> {
        self.store
            .brand_voices
            .get(voice_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Brand voice {}", voice_id)))
    }

    pub fn update(&self, voice_id: &str, update: BrandVoiceUpdate) -> ServiceResult<BrandVoice> {
        update.validate()?;
        let current = self.get(voice_id)?;
        if let Some(name) = &update.name {
            self.ensure_unique_name(&current.workspace_id, name, Some(voice_id))?;
        }
        self.store
            .brand_voices
            .update(voice_id, |voice| {
                if let Some(name) = update.name {
                    voice.name = name.trim().to_string();
                }
                if let Some(description) = update.description {
                    voice.description = Some(description);
                }
                if let Some(tone) = update.tone {
                    voice.tone = tone.trim().to_string();
                }
                if let Some(style_guide) = update.style_guide {
                    voice.style_guide = style_guide;
                }
                if let Some(terms) = update.banned_terms {
                    voice.banned_terms = terms.into_iter().map(|t| t.trim().to_string()).collect();
                }
                if let Some(examples) = update.tone_examples {
                    voice.tone_examples = examples;
                }
                if let Some(active) = update.is_active {
                    voice.is_active = active;
                }
                voice.updated_at = Utc::now();
            })
            .ok_or_else(|| ServiceError::NotFound(format!("Brand voice {}", voice_id)))
    }

    /// Delete a voice and detach it from episodes and drafts that used it
    pub fn delete(&self, voice_id: &str) -> ServiceResult<BrandVoice> {
        let voice = self
            .store
            .brand_voices
            .remove(voice_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Brand voice {}", voice_id)))?;
        for episode in self
            .store
            .episodes
            .filter(|e| e.brand_voice_id.as_deref() == Some(voice_id))
        {
            self.store.episodes.update(&episode.id, |e| e.brand_voice_id = None);
        }
        for draft in self.store.drafts.filter(|d| d.brand_voice_id.as_deref() == Some(voice_id)) {
            self.store.drafts.update(&draft.id, |d| d.brand_voice_id = None);
        }
        info!("Deleted brand voice '{}'", voice.name);
        Ok(voice)
    }

    pub fn validate(&self, content: &str, voice_id: &str) -> ServiceResult<ComplianceReport> {
        let voice = self.get(voice_id)?;
        Ok(compliance(content, &voice))
    }

    pub fn redact(&self, content: &str, voice_id: &str) -> ServiceResult<(String, usize)> {
        let voice = self.get(voice_id)?;
        Ok(redact(content, &voice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::fixtures;

    fn create(workspace: &str, name: &str, banned: &[&str]) -> BrandVoiceCreate {
        BrandVoiceCreate {
            workspace_id: workspace.to_string(),
            name: name.to_string(),
            description: None,
            tone: "friendly".to_string(),
            style_guide: "Short sentences".to_string(),
            banned_terms: banned.iter().map(|s| s.to_string()).collect(),
            tone_examples: Vec::new(),
            is_active: true,
        }
    }

    #[test]
    fn test_compliance_scoring() {
        let service = BrandVoiceService::new(Arc::new(Store::new()));
        let voice = service.create(create("ws", "House", &["synergy", "leverage"])).unwrap();

        let report = service
            .validate("Synergy! We leverage synergy. Leveraged gains.", &voice.id)
            .unwrap();
        assert!(!report.is_compliant);
        assert_eq!(report.score, 70);
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.violations[0].occurrences, 2);
        assert_eq!(report.violations[1].occurrences, 1);
        assert_eq!(report.suggestions.len(), 3);

        let clean = service.validate("Plain words only.", &voice.id).unwrap();
        assert!(clean.is_compliant);
        assert_eq!(clean.score, 100);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let service = BrandVoiceService::new(Arc::new(Store::new()));
        let voice = service.create(create("ws", "Strict", &["very"])).unwrap();
        let report = service.validate(&"very ".repeat(12), &voice.id).unwrap();
        assert_eq!(report.score, 0);
    }

    #[test]
    fn test_redact() {
        let service = BrandVoiceService::new(Arc::new(Store::new()));
        let voice = service.create(create("ws", "House", &["synergy"])).unwrap();
        let (text, count) = service.redact("Synergy drives synergy.", &voice.id).unwrap();
        assert_eq!(count, 2);
        assert_eq!(text, "[redacted] drives [redacted].");
    }

    #[test]
    fn test_names_are_unique_per_workspace() {
        let service = BrandVoiceService::new(Arc::new(Store::new()));
        let first = service.create(create("ws", "House", &[])).unwrap();
        assert!(matches!(
            service.create(create("ws", "house", &[])),
            Err(ServiceError::Conflict(_))
        ));
        assert!(service.create(create("other", "House", &[])).is_ok());

        let renamed = service
            .update(
                &first.id,
                BrandVoiceUpdate {
                    name: Some("House".to_string()),
                    tone: Some("formal".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.tone, "formal");
    }

    #[test]
    fn test_list_and_active() {
        let service = BrandVoiceService::new(Arc::new(Store::new()));
        service.create(create("ws", "Zeta", &[])).unwrap();
        let mut inactive = create("ws", "Alpha", &[]);
        inactive.is_active = false;
        service.create(inactive).unwrap();
        service.create(create("other", "Beta", &[])).unwrap();

        let page = service.list(Some("ws"), PageParams::default()).unwrap();
        assert_eq!(page.items.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(), vec!["Alpha", "Zeta"]);
        assert_eq!(service.list(None, PageParams::default()).unwrap().total, 3);
        assert_eq!(service.active("ws").len(), 1);
    }

    #[test]
    fn test_delete_detaches_voice() {
        let store = Arc::new(Store::new());
        let service = BrandVoiceService::new(Arc::clone(&store));
        let voice = service.create(create("ws", "House", &[])).unwrap();
        let mut episode = fixtures::episode("e1", "alice");
        episode.brand_voice_id = Some(voice.id.clone());
        store.episodes.insert(episode);

        service.delete(&voice.id).unwrap();
        assert_eq!(store.episodes.get("e1").unwrap().brand_voice_id, None);
        assert!(matches!(service.get(&voice.id), Err(ServiceError::NotFound(_))));
    }
}
