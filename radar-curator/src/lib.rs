//! Curation pipeline for the show radar: relevance scoring, duplicate-id
//! merging, external-rank application and multi-night collapsing.

pub mod observability;
pub mod pipeline;

// Re-export commonly used types
pub use pipeline::curator::EventCurator;
pub use radar_core::domain;
