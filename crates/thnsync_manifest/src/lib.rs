//! # thnsync Manifest
//!
//! Manifest types, structural validation and envelope archives.
//!
//! An envelope is the unit of transfer: a manifest plus either raw file
//! payloads (`raw-zip` mode) or content-addressed chunks (`cdc-delta` mode).
//! Untyped manifests arriving from disk or the network are checked once with
//! [`validate`] and decoded into the typed [`Manifest`]; everything downstream
//! works with the typed form.
//!
//! ## Modules
//!
//! - `validate` - structural rules, one error variant per failure reason
//! - `summary` - bounded, never-failing projections for CLI output
//! - `source` - deterministic scan of a source tree
//! - `builder` - raw and CDC envelope construction (with delta against a
//!   previous snapshot)
//! - `envelope` - tar archive read/write with atomic replacement

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod envelope;
mod error;
mod manifest;
mod source;
mod summary;
mod validate;

pub use builder::{build_cdc_envelope, build_raw_envelope, sha256_hex};
pub use envelope::{read_manifest, write_manifest_atomic, Envelope, MANIFEST_ENTRY};
pub use error::{EnvelopeError, EnvelopeResult, ManifestValidationError};
pub use manifest::{
    CdcDeltaManifest, FileEntry, FileOp, Manifest, ManifestMode, RawZipManifest, SnapshotIndex,
    MANIFEST_VERSION,
};
pub use source::{scan_source_tree, SourceFile};
pub use summary::{
    summarize_cdc_files, summarize_manifest, CdcFileSummary, CdcFilesSummary, ManifestSummary,
    DEFAULT_MAX_SUMMARY_ITEMS,
};
pub use validate::{validate, VALID_MODES};
