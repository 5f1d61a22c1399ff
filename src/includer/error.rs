//! Include processing errors

use std::io;

use thiserror::Error;

use super::source::Location;

/// Errors that can occur while building an [`Includer`](super::Includer)
///
/// Every variant aborts the whole expansion; there is no partial result.
#[derive(Debug, Error)]
pub enum IncludeError {
    /// The top-level source or an option cannot be used
    #[error("bad input: {0}")]
    BadInput(String),

    /// The include pattern does not compile or has the wrong number of groups
    #[error("invalid include pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Why it was rejected
        reason: String,
    },

    /// A file or URL could not be opened
    #[error("cannot open {location}: {source}")]
    Open {
        /// What we tried to open
        location: Location,
        /// The underlying failure
        #[source]
        source: io::Error,
    },

    /// An opened source failed while being read
    #[error("error reading {location}: {source}")]
    Read {
        /// The source being read, or `<input>` for anonymous sources
        location: String,
        /// The underlying failure
        #[source]
        source: io::Error,
    },

    /// A glob include target is not a valid pattern
    #[error("bad glob pattern {pattern:?}: {source}")]
    BadGlob {
        /// The pattern as resolved against its parent
        pattern: String,
        /// The parse failure
        #[source]
        source: glob::PatternError,
    },

    /// An include directive was found at or beyond the nesting limit
    #[error("too many nested includes ({depth}), at: {line:?}")]
    TooManyIncludes {
        /// Nesting depth at which the directive was found
        depth: usize,
        /// The directive text, without its line terminator
        line: String,
    },

    /// The resolved target uses a scheme we cannot open
    #[error("don't know how to open scheme {0:?}")]
    UnsupportedScheme(String),

    /// The staged result file could not be created, written or read
    #[error("staged output error: {0}")]
    Stage(#[from] io::Error),
}
