//! Domain records shared by the store, the services and the API

pub mod analytics;
pub mod brand_voice;
pub mod draft;
pub mod episode;
pub mod export;
pub mod seo;
pub mod transcript;
pub mod user;
pub mod workflow;

pub use analytics::{MetricEntry, PerformanceEntry, TrackedEvent};
pub use brand_voice::BrandVoice;
pub use draft::{Citation, Draft, DraftStatus};
pub use episode::{Episode, EpisodeStatus};
pub use export::{CmsType, Export, ExportStatus};
pub use seo::SeoData;
pub use transcript::{Transcript, TranscriptSegment};
pub use user::User;
pub use workflow::{StepKind, StepStatus, WorkflowRun, WorkflowStatus, WorkflowStep};
