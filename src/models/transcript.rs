use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{ServiceError, ServiceResult};

/// One speaker turn from diarization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakerTurn {
    pub start_ms: u64,
    pub end_ms: u64,
    pub speaker: String,
}

/// Speaker diarization attached to a transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Diarization {
    pub speaker_segments: Vec<SpeakerTurn>,
    pub num_speakers: usize,
}

impl Diarization {
    pub fn from_turns(speaker_segments: Vec<SpeakerTurn>) -> Self {
        let mut speakers: Vec<&str> = speaker_segments.iter().map(|t| t.speaker.as_str()).collect();
        speakers.sort_unstable();
        speakers.dedup();
        let num_speakers = speakers.len();
        Self {
            speaker_segments,
            num_speakers,
        }
    }

    /// Speaker whose turn overlaps the span the most
    pub fn speaker_for(&self, start_ms: u64, end_ms: u64) -> Option<&str> {
        self.speaker_segments
            .iter()
            .map(|turn| {
                let overlap = end_ms.min(turn.end_ms).saturating_sub(start_ms.max(turn.start_ms));
                (overlap, turn)
            })
            .filter(|(overlap, _)| *overlap > 0)
            .max_by_key(|(overlap, _)| *overlap)
            .map(|(_, turn)| turn.speaker.as_str())
    }
}

/// Full transcript of an episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    pub id: String,
    pub episode_id: String,
    pub text: String,
    pub language: String,
    pub confidence: f64,
    pub diarization: Option<Diarization>,
    /// Name of the transcriber that produced it
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Timed slice of a transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub id: String,
    pub transcript_id: String,
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub confidence: f64,
    pub speaker: Option<String>,
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Transcript together with its ordered segments
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptView {
    #[serde(flatten)]
    pub transcript: Transcript,
    pub segments: Vec<TranscriptSegment>,
}

/// Partial transcript update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptUpdate {
    pub text: Option<String>,
    pub language: Option<String>,
    pub confidence: Option<f64>,
    pub diarization: Option<Diarization>,
}

impl TranscriptUpdate {
    pub fn validate(&self) -> ServiceResult<()> {
        if let Some(confidence) = self.confidence {
            validate_confidence(confidence)?;
        }
        Ok(())
    }
}

/// Manually added segment
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentCreate {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
    pub speaker: Option<String>,
    pub topic: Option<String>,
}

fn full_confidence() -> f64 {
    1.0
}

impl SegmentCreate {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.end_ms < self.start_ms {
            return Err(ServiceError::ValidationError(
                "end_ms must not be before start_ms".to_string(),
            ));
        }
        if self.text.trim().is_empty() {
            return Err(ServiceError::ValidationError("segment text must not be empty".to_string()));
        }
        validate_confidence(self.confidence)
    }
}

fn validate_confidence(confidence: f64) -> ServiceResult<()> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ServiceError::ValidationError(format!(
            "confidence must be between 0 and 1, got {}",
            confidence
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(start_ms: u64, end_ms: u64, speaker: &str) -> SpeakerTurn {
        SpeakerTurn {
            start_ms,
            end_ms,
            speaker: speaker.to_string(),
        }
    }

    #[test]
    fn test_speaker_by_maximum_overlap() {
        let diarization = Diarization::from_turns(vec![
            turn(0, 4_000, "Host"),
            turn(4_000, 10_000, "Guest"),
            turn(10_000, 12_000, "Host"),
        ]);
        assert_eq!(diarization.num_speakers, 2);
        assert_eq!(diarization.speaker_for(3_000, 9_000), Some("Guest"));
        assert_eq!(diarization.speaker_for(0, 3_500), Some("Host"));
        assert_eq!(diarization.speaker_for(20_000, 21_000), None);
    }

    #[test]
    fn test_segment_validation() {
        let mut segment = SegmentCreate {
            start_ms: 1_000,
            end_ms: 500,
            text: "hello".to_string(),
            confidence: 0.9,
            speaker: None,
            topic: None,
        };
        assert!(segment.validate().is_err());
        segment.end_ms = 2_000;
        assert!(segment.validate().is_ok());
        segment.confidence = 1.5;
        assert!(segment.validate().is_err());
    }
}
