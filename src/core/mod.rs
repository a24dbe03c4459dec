//! Core engine pieces shared by every service
//!
//! Error taxonomy, the entity store and its snapshots, the TTL cache,
//! pipeline metrics, the workflow event hub and the workflow orchestrator.

pub mod cache;
pub mod error;
pub mod events;
pub mod metrics;
pub mod orchestrator;
pub mod store;
