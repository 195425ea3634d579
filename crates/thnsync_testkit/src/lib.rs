//! # thnsync Testkit
//!
//! Test utilities shared by the thnsync crates.
//!
//! This crate provides:
//! - Temporary scaffolds and source trees that clean up after themselves
//! - TXLOG inspection helpers
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use thnsync_testkit::prelude::*;
//!
//! #[test]
//! fn logs_land_in_scaffold() {
//!     let scaffold = TempScaffold::new();
//!     // ... run an apply against scaffold.path()
//!     assert_eq!(scaffold.txlog_files().len(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
