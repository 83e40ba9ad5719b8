//! # sp-resolver
//!
//! Maps natural-language entity names to stable script IDs.
//!
//! Data-query tasks mention entities the way users talk ("Sales
//! Channel"), not the way the system stores them (`custbody_channel`).
//! The resolver extracts candidate phrases, ranks tenant
//! [`EntityMapping`]s by trigram similarity, optionally asks a cheap LLM
//! to break near-ties, and renders the winners as a compact vernacular
//! block for the data-query specialist's prompt. Best-effort: every
//! failure degrades to an empty string and the query proceeds.

pub mod error;
pub mod mapping;
pub mod resolver;
pub mod trigram;

pub use error::ResolverError;
pub use mapping::{EntityMapping, MappingStore, ScoredMapping};
pub use resolver::{extract_candidates, EntityResolver};
pub use trigram::{similarity, trigrams};
