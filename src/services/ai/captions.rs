use std::path::Path;

use async_trait::async_trait;
use log::debug;

use crate::core::error::{ServiceError, ServiceResult};
use crate::models::transcript::{Diarization, SpeakerTurn};
use crate::services::ai::transcription::{RawSegment, RawTranscription, Transcriber};
use crate::services::common::file_extension;

/// Speaking rate used to estimate timings of untimed text
const WORDS_PER_MINUTE: f64 = 150.0;

/// Turns caption files (WebVTT, SRT, plain text) into transcriptions
#[derive(Debug, Default, Clone)]
pub struct CaptionTranscriber;

#[async_trait]
impl Transcriber for CaptionTranscriber {
    fn name(&self) -> &'static str {
        "captions"
    }

    async fn transcribe(&self, path: &Path, language: &str) -> ServiceResult<RawTranscription> {
        let content = tokio::fs::read_to_string(path).await?;
        let extension = path
            .to_str()
            .and_then(file_extension)
            .unwrap_or_default();
        let segments = match extension.as_str() {
            "vtt" | "srt" => parse_cues(&content),
            "txt" => parse_plain_text(&content),
            other => {
                return Err(ServiceError::ValidationError(format!(
                    "Unsupported caption format '{}'",
                    other
                )))
            }
        };
        if segments.is_empty() {
            return Err(ServiceError::ProcessingError(format!(
                "No captions found in {}",
                path.display()
            )));
        }
        debug!("Parsed {} caption segments from {}", segments.len(), path.display());
        Ok(build_transcription(segments, language))
    }
}

fn build_transcription(segments: Vec<RawSegment>, language: &str) -> RawTranscription {
    let text = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let duration = segments.iter().map(|s| s.end).fold(0.0, f64::max);
    let diarization = speaker_turns(&segments);
    RawTranscription {
        text,
        language: language.to_string(),
        duration: Some(duration),
        segments,
        diarization,
    }
}

/// Merge consecutive segments of the same speaker into diarization turns
fn speaker_turns(segments: &[RawSegment]) -> Option<Diarization> {
    let mut turns: Vec<SpeakerTurn> = Vec::new();
    for segment in segments {
        let Some(speaker) = &segment.speaker else {
            continue;
        };
        let start_ms = (segment.start * 1000.0) as u64;
        let end_ms = (segment.end * 1000.0) as u64;
        match turns.last_mut() {
            Some(last) if &last.speaker == speaker => last.end_ms = end_ms.max(last.end_ms),
            _ => turns.push(SpeakerTurn {
                start_ms,
                end_ms,
                speaker: speaker.clone(),
            }),
        }
    }
    if turns.is_empty() {
        None
    } else {
        Some(Diarization::from_turns(turns))
    }
}

/// Parse `HH:MM:SS.mmm`, `MM:SS.mmm` or the SRT `HH:MM:SS,mmm` into seconds
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let raw = raw.trim().replace(',', ".");
    let parts: Vec<&str> = raw.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        [m, s] => (0.0, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        _ => return None,
    };
    if minutes >= 60.0 || seconds >= 60.0 || hours < 0.0 || minutes < 0.0 || seconds < 0.0 {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Parse WebVTT or SRT cue blocks
pub fn parse_cues(content: &str) -> Vec<RawSegment> {
    let normalized = content.replace("\r\n", "\n");
    let mut segments = Vec::new();

    for block in normalized.split("\n\n") {
        let lines: Vec<&str> = block.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let Some(timing_index) = lines.iter().position(|line| line.contains("-->")) else {
            continue;
        };
        let Some((start, end)) = parse_timing_line(lines[timing_index]) else {
            continue;
        };
        let raw_text = lines[timing_index + 1..].join(" ");
        let (speaker, text) = split_speaker(&raw_text);
        if text.is_empty() {
            continue;
        }
        segments.push(RawSegment {
            start,
            end: end.max(start),
            text,
            confidence: 1.0,
            speaker,
        });
    }
    segments
}

fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    // Cue settings may follow the end time
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start)?, parse_timestamp(end)?))
}

/// Untimed transcript: one segment per non-empty line, timed at a fixed speaking rate
pub fn parse_plain_text(content: &str) -> Vec<RawSegment> {
    let mut cursor = 0.0;
    let mut segments = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (speaker, text) = split_speaker(line);
        if text.is_empty() {
            continue;
        }
        let words = text.split_whitespace().count() as f64;
        let duration = words / WORDS_PER_MINUTE * 60.0;
        segments.push(RawSegment {
            start: cursor,
            end: cursor + duration,
            text,
            confidence: 1.0,
            speaker,
        });
        cursor += duration;
    }
    segments
}

/// Extract the speaker from `<v Name>text` or `Name: text`, and strip markup
fn split_speaker(raw: &str) -> (Option<String>, String) {
    let mut speaker = None;
    let mut body = raw.trim();

    if let Some(rest) = body.strip_prefix("<v") {
        if let Some(close) = rest.find('>') {
            let mut name = rest[..close].trim();
            // `<v.class Name>` carries a class before the voice name
            if name.starts_with('.') {
                name = name.split_once(' ').map(|(_, n)| n.trim()).unwrap_or("");
            }
            if !name.is_empty() {
                speaker = Some(name.to_string());
            }
            body = &rest[close + 1..];
        }
    }

    let text = strip_tags(body);
    if speaker.is_none() {
        if let Some((prefix, rest)) = text.split_once(':') {
            if looks_like_speaker(prefix) && !rest.trim().is_empty() {
                return (Some(prefix.trim().to_string()), rest.trim().to_string());
            }
        }
    }
    (speaker, text)
}

fn looks_like_speaker(prefix: &str) -> bool {
    let prefix = prefix.trim();
    let words: Vec<&str> = prefix.split_whitespace().collect();
    !words.is_empty()
        && words.len() <= 3
        && prefix.chars().count() <= 40
        && words
            .iter()
            .all(|w| w.starts_with(|c: char| c.is_uppercase()) && !w.chars().any(|c| c.is_ascii_digit()))
}

fn strip_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const VTT: &str = "WEBVTT\n\nNOTE produced by hand\n\n1\n00:00:00.000 --> 00:00:04.500 align:start\n<v Alice>Welcome to the show.</v>\n\n00:04.500 --> 00:09.000\n<v Bob>Thanks for having me.\n\n00:00:09.000 --> 00:00:12.000\n<v Bob>It is <i>great</i> to be here.\n";

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:01:02.500"), Some(62.5));
        assert_eq!(parse_timestamp("01:02,250"), Some(62.25));
        assert_eq!(parse_timestamp("01:00:00,000"), Some(3600.0));
        assert_eq!(parse_timestamp("00:61:00.000"), None);
        assert_eq!(parse_timestamp("nonsense"), None);
    }

    #[test]
    fn test_parse_vtt_with_voice_tags() {
        let segments = parse_cues(VTT);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].speaker.as_deref(), Some("Alice"));
        assert_eq!(segments[0].text, "Welcome to the show.");
        assert_eq!(segments[0].end, 4.5);
        assert_eq!(segments[1].start, 4.5);
        assert_eq!(segments[2].text, "It is great to be here.");
    }

    #[test]
    fn test_parse_srt_with_name_prefix() {
        let srt = "1\r\n00:00:01,000 --> 00:00:03,000\r\nHost: Hello there\r\n\r\n2\r\n00:00:03,000 --> 00:00:05,000\r\nnote: lower case is not a speaker\r\n";
        let segments = parse_cues(srt);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].speaker.as_deref(), Some("Host"));
        assert_eq!(segments[0].text, "Hello there");
        assert_eq!(segments[1].speaker, None);
        assert_eq!(segments[1].text, "note: lower case is not a speaker");
    }

    #[test]
    fn test_plain_text_timing_estimate() {
        let segments = parse_plain_text("Jane Doe: one two three four five\n\nsix seven eight nine ten\n");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].speaker.as_deref(), Some("Jane Doe"));
        assert!((segments[0].end - 2.0).abs() < 1e-9);
        assert!((segments[1].start - 2.0).abs() < 1e-9);
        assert!((segments[1].end - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_consecutive_speakers_merge_into_turns() {
        let diarization = speaker_turns(&parse_cues(VTT)).unwrap();
        assert_eq!(diarization.num_speakers, 2);
        assert_eq!(diarization.speaker_segments.len(), 2);
        assert_eq!(diarization.speaker_segments[1].start_ms, 4_500);
        assert_eq!(diarization.speaker_segments[1].end_ms, 12_000);
    }

    #[tokio::test]
    async fn test_transcribe_caption_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.vtt");
        tokio::fs::write(&path, VTT).await.unwrap();

        let result = CaptionTranscriber.transcribe(&path, "en").await.unwrap();
        assert_eq!(result.language, "en");
        assert_eq!(result.segments.len(), 3);
        assert_eq!(result.duration, Some(12.0));
        assert!(result.text.starts_with("Welcome to the show."));
        assert!(result.diarization.is_some());
    }

    #[tokio::test]
    async fn test_empty_caption_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.srt");
        tokio::fs::write(&path, "").await.unwrap();
        assert!(CaptionTranscriber.transcribe(&path, "en").await.is_err());
    }
}
