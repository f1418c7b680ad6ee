//! Shared types, error model, and configuration for Curricle.
//!
//! This crate is the foundation depended on by all other Curricle crates.
//! It provides:
//! - [`CurricleError`], the unified error type
//! - Domain types ([`Candidate`], [`ResultSet`], [`TopicAssociation`], catalog records)
//! - Configuration ([`AppConfig`], config loading, scope and credential resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AuthConfig, BackendConfig, DefaultsConfig, WikipediaConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, load_credentials, resolve_scope,
};
pub use error::{CurricleError, Result};
pub use types::{
    Candidate, Category, DISAMBIGUATION_CATEGORY, Department, Institution,
    InstitutionDepartments, Page, PageMetadata, ResultSet, Scope, Topic, TopicAssociation,
    TopicId, TopicSummary, Unit, UnitSummary, UnitTopic, article_url,
};
