//! # CrossRef Metadata
//!
//! Looks up bibliographic metadata on CrossRef by DOI or by title and author,
//! and normalizes the returned works into [`MetadataRecord`]s.
//!
//! ## Architecture
//!
//! - [`sources`]: the works API clients behind the [`WorksProvider`] trait
//! - [`normalize`]: raw work JSON to [`MetadataRecord`]
//! - [`lookup`]: the caller-facing [`MetadataLookup`]
//! - [`models`]: queries and records
//! - [`config`]: configuration management
//! - [`utils`]: HTTP client

pub mod config;
pub mod lookup;
pub mod models;
pub mod normalize;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use lookup::MetadataLookup;
pub use models::{IdentifyRequest, MetadataRecord, Query};
pub use sources::{CrossRefSource, SourceError, WorksProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
