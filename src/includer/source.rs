//! Include sources: where lines come from and how targets are resolved
//!
//! A [`Source`] is what the caller hands to the includer. Once opened it
//! becomes an [`IncludeSource`]: a forward-only line reader plus an optional
//! [`Location`] that serves as the base for relative include targets.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, trace};
use url::Url;

use super::error::IncludeError;
use crate::fetch::Fetch;

/// Resolved address of an opened source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A local filesystem path
    File(PathBuf),
    /// A URL with an explicit scheme
    Url(Url),
}

impl Location {
    /// Parse a source string: a URL if it carries a real scheme, a path otherwise
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            // One-letter schemes are Windows drive letters, not URLs
            Ok(url) if url.scheme().len() > 1 => Self::Url(url),
            _ => Self::File(PathBuf::from(raw)),
        }
    }

    /// The scheme, or `None` for plain paths
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        match self {
            Self::File(_) => None,
            Self::Url(url) => Some(url.scheme()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url.as_str()),
        }
    }
}

/// The top-level input to an includer
pub enum Source {
    /// A file path or URL string
    Path(String),
    /// An already-open stream of lines with no location
    Lines(Box<dyn BufRead>),
    /// A path that could not be represented as a string
    Unrepresentable(PathBuf),
}

impl Source {
    /// Wrap any buffered reader as an anonymous line source
    pub fn lines(reader: impl BufRead + 'static) -> Self {
        Self::Lines(Box::new(reader))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Lines(_) => f.write_str("Lines(..)"),
            Self::Unrepresentable(p) => f.debug_tuple("Unrepresentable").field(p).finish(),
        }
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        Self::Path(s.to_string())
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Self::Path(s)
    }
}

impl From<&Path> for Source {
    fn from(p: &Path) -> Self {
        p.to_str()
            .map_or_else(|| Self::Unrepresentable(p.to_path_buf()), |s| Self::Path(s.to_string()))
    }
}

impl From<PathBuf> for Source {
    fn from(p: PathBuf) -> Self {
        Self::from(p.as_path())
    }
}

impl From<Url> for Source {
    fn from(url: Url) -> Self {
        Self::Path(url.into())
    }
}

/// An opened input and the location it came from
pub struct IncludeSource {
    reader: Box<dyn BufRead>,
    location: Option<Location>,
}

impl IncludeSource {
    /// Pair a reader with its location
    pub fn new(reader: Box<dyn BufRead>, location: Option<Location>) -> Self {
        Self { reader, location }
    }

    /// An anonymous source: relative includes inside it resolve against the cwd
    pub fn anonymous(reader: Box<dyn BufRead>) -> Self {
        Self::new(reader, None)
    }

    /// Where this source was opened from, if anywhere
    #[must_use]
    pub const fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Read the next line, keeping its terminator; `None` at end of input
    pub fn next_line(&mut self) -> Result<Option<String>, IncludeError> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(line)),
            Err(source) => Err(IncludeError::Read {
                location: self
                    .location
                    .as_ref()
                    .map_or_else(|| "<input>".to_string(), ToString::to_string),
                source,
            }),
        }
    }
}

impl fmt::Debug for IncludeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncludeSource")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Resolve an include target against the location of the source containing it
///
/// Targets with their own scheme are absolute. Scheme-less targets are paths:
/// absolute ones are taken as-is (inheriting a parent URL's scheme and host),
/// relative ones are joined onto the parent's directory. With no parent the
/// target is left relative to the current directory.
#[must_use]
pub fn resolve_target(target: &str, parent: Option<&Location>) -> Location {
    let parsed = Location::parse(target);
    if parsed.scheme().is_some() {
        return parsed;
    }

    let is_absolute = is_absolute_path(target);
    match parent {
        None => parsed,
        Some(Location::File(parent_path)) => {
            if is_absolute {
                parsed
            } else {
                let dir = parent_path.parent().unwrap_or_else(|| Path::new(""));
                Location::File(dir.join(target))
            }
        },
        Some(Location::Url(parent_url)) => {
            let mut url = parent_url.clone();
            url.set_query(None);
            url.set_fragment(None);
            if is_absolute {
                url.set_path(target);
            } else {
                let parent_dir = parent_url
                    .path()
                    .rfind('/')
                    .map_or("", |idx| &parent_url.path()[..idx]);
                url.set_path(&format!("{parent_dir}/{target}"));
            }
            Location::Url(url)
        },
    }
}

fn is_absolute_path(target: &str) -> bool {
    Path::new(target).is_absolute() || target.starts_with('/')
}

/// Build the glob pattern for a scheme-less include target
///
/// Only the target itself is pattern syntax. The including file's directory
/// is escaped, so a parent such as `proj [v1]/` matches literally.
#[must_use]
pub fn glob_pattern(target: &str, parent: Option<&Location>) -> PathBuf {
    match parent {
        Some(Location::File(parent_path)) if !is_absolute_path(target) => {
            let dir = parent_path.parent().unwrap_or_else(|| Path::new(""));
            match dir.to_str() {
                Some("") => PathBuf::from(target),
                Some(dir) => PathBuf::from(glob::Pattern::escape(dir)).join(target),
                None => dir.join(target),
            }
        },
        _ => PathBuf::from(target),
    }
}

/// Expand a glob pattern into the files it matches
///
/// Zero matches is not an error. Directories matched by the pattern are
/// skipped.
pub fn expand_glob(pattern: &Path, sort: bool) -> Result<Vec<PathBuf>, IncludeError> {
    let pattern_str = pattern
        .to_str()
        .ok_or_else(|| IncludeError::BadInput(format!("non UTF-8 glob: {}", pattern.display())))?;

    let paths = glob::glob(pattern_str).map_err(|source| IncludeError::BadGlob {
        pattern: pattern_str.to_string(),
        source,
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            let location = Location::File(err.path().to_path_buf());
            IncludeError::Open {
                location,
                source: err.into_error(),
            }
        })?;
        if path.is_dir() {
            trace!("glob {pattern_str}: skipping directory {}", path.display());
            continue;
        }
        trace!("glob {pattern_str}: matched {}", path.display());
        matches.push(path);
    }

    if sort {
        matches.sort();
    }
    Ok(matches)
}

fn open_file(path: &Path) -> io::Result<Box<dyn BufRead>> {
    // Directories open fine on Unix and only fail on the first read
    if path.is_dir() {
        return Err(io::Error::new(io::ErrorKind::IsADirectory, "is a directory"));
    }
    Ok(Box::new(BufReader::new(File::open(path)?)))
}

/// Open a single resolved location
pub fn open(location: &Location, fetcher: &dyn Fetch) -> Result<IncludeSource, IncludeError> {
    debug!("opening {location}");
    let open_err = |source: io::Error| IncludeError::Open {
        location: location.clone(),
        source,
    };

    let reader: Box<dyn BufRead> = match location {
        Location::File(path) => open_file(path).map_err(open_err)?,
        Location::Url(url) => match url.scheme() {
            "file" => {
                let path = url.to_file_path().map_err(|()| {
                    open_err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "file URL has no local path",
                    ))
                })?;
                open_file(&path).map_err(open_err)?
            },
            "http" | "https" | "ftp" => fetcher.fetch(url).map_err(open_err)?,
            other => return Err(IncludeError::UnsupportedScheme(other.to_string())),
        },
    };

    Ok(IncludeSource::new(reader, Some(location.clone())))
}
