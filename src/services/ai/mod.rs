//! Provider integrations and content generation

pub mod captions;
pub mod generation;
pub mod llm;
pub mod render;
pub mod retrieval;
pub mod transcription;

pub use captions::CaptionTranscriber;
pub use generation::{BlogPost, ContentGenerator};
pub use llm::{LanguageModel, OpenAiChatModel};
pub use transcription::{Transcriber, TranscriptionService, WhisperTranscriber};
