//! Typed client for the curriculum catalog backend.
//!
//! The backend is a JSON REST service; everything department-scoped lives
//! under `api/{institution}/{department}/`. This crate covers:
//! - [`CatalogClient`]: units, topics, unit-topic links, institutions,
//!   session login, and rendered graph fetches
//! - [`TopicFilter`]: include/exclude queries over teaching aspects and levels
//!
//! Wire shapes stay private; callers get the domain records from
//! `curricle-shared`. Writes require a session cookie, which the client
//! carries automatically after [`CatalogClient::login`].

mod associations;
mod client;
mod filter;
mod listings;
mod wire;

pub use client::{CatalogClient, GraphSelector};
pub use filter::{Aspect, FilterLine, TopicFilter};

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("Curricle/", env!("CARGO_PKG_VERSION"));
