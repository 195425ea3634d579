//! CLI command implementations.

pub mod apply;
pub mod chunk;
pub mod history;
pub mod inspect;
pub mod make;
pub mod push;
pub mod recover;
pub mod validate;
