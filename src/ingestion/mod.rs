//! Source parsing and observer hooks.
//!
//! Most callers should use [`parse_source_from_path`] or [`parse_source_from_bytes`] (from
//! [`unified`]) which:
//!
//! - detect the source format from the file extension
//! - parse the file into a [`crate::types::SourceDocument`] with one sheet per worksheet
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`excel`] (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, TracingObserver,
};
pub use unified::{SourceFormat, parse_source_from_bytes, parse_source_from_path};
