//! Core orchestration for curricle: ties the encyclopedia search and
//! metadata clients to the curriculum backend in one enrichment flow, plus
//! the prefix matcher behind context suggestions.

pub mod enrich;
pub mod matcher;

pub use enrich::EnrichmentPipeline;
