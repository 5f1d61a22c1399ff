//! includer - a recursive `%include` preprocessor for text files
//!
//! The centrepiece is [`Includer`], which flattens a tree of included files
//! and URLs into a single stream of lines. Alongside it live a few small
//! utilities: a [`stack`], flat string [`template`]s, directory [`walk`]ing
//! and directory [`tree`] creation.

// Deny all clippy warnings in this crate
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod fetch;
pub mod includer;
pub mod stack;
pub mod template;
pub mod tree;
pub mod walk;

pub use config::IncludeOptions;
pub use includer::{IncludeError, IncludeSource, Includer, Location, Source};
