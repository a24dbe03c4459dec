pub mod analytics;
pub mod brand_voices;
pub mod drafts;
pub mod episodes;
pub mod exports;
pub mod pipeline;
pub mod seo;
pub mod system;
pub mod transcripts;
pub mod users;
