//! Domain services behind the HTTP API

pub mod ai;
pub mod analytics;
pub mod brand_voices;
pub mod common;
pub mod drafts;
pub mod episodes;
pub mod exports;
pub mod pipeline;
pub mod seo;
pub mod text;
