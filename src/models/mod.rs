//! Core data models for lookups and normalized records.

mod query;
mod record;

pub use query::{IdentifyRequest, Query, DEFAULT_TIMEOUT, DOI_KEY};
pub use record::{MetadataFields, MetadataRecord, MetadataRecordBuilder, Series, UNKNOWN_AUTHOR};
