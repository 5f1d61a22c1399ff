//! Includer - expands `%include` directives into one flattened text
//!
//! An `Includer` preprocesses a text source, replacing every line that
//! matches the include pattern with the (recursively expanded) contents of
//! the file or URL it names. The default directive looks like this:
//!
//! ```text
//! %include "/absolute/path/to/file"
//! %include "../relative/path/to/file"
//! %include "local_reference"
//! %include "http://localhost/path/to/my.config"
//! ```
//!
//! Relative references resolve against the directory of the including file
//! or URL. Expansion happens eagerly at construction; the flattened result is
//! staged in a temporary file and can be streamed any number of times until
//! the includer is closed.
//!
//! # Examples
//!
//! ```no_run
//! use includer::{IncludeOptions, Includer};
//!
//! let inc = Includer::new("main.txt", IncludeOptions::default()).unwrap();
//! inc.each_line(|line| print!("{line}")).unwrap();
//! inc.close().unwrap();
//! ```

mod error;
pub mod source;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use regex::Regex;
use tempfile::NamedTempFile;

pub use error::IncludeError;
pub use source::{IncludeSource, Location, Source};

use crate::config::IncludeOptions;
use crate::fetch::{Fetch, default_fetcher};
use crate::stack::Stack;

/// A unit of pending work during expansion
enum Frame {
    /// A location not yet opened
    Pending(Location, usize),
    /// A source partially or not yet read
    Open(IncludeSource, usize),
}

/// A fully expanded text, staged in a temporary file
#[derive(Debug)]
pub struct Includer {
    location: Option<Location>,
    staged: NamedTempFile,
}

impl Includer {
    /// Expand `source` using the default network fetcher
    pub fn new(source: impl Into<Source>, options: IncludeOptions) -> Result<Self, IncludeError> {
        let fetcher = default_fetcher();
        Self::with_fetcher(source, options, fetcher.as_ref())
    }

    /// Expand `source`, opening remote URLs through `fetcher`
    pub fn with_fetcher(
        source: impl Into<Source>,
        options: IncludeOptions,
        fetcher: &dyn Fetch,
    ) -> Result<Self, IncludeError> {
        let expander = Expander::new(options, fetcher)?;

        let (location, roots) = match source.into() {
            Source::Path(raw) if raw.is_empty() => {
                return Err(IncludeError::BadInput("empty source path".to_string()));
            },
            Source::Path(raw) => {
                // The root is always opened literally; only include targets glob
                let location = Location::parse(&raw);
                let root = source::open(&location, fetcher)?;
                (Some(location), vec![Frame::Open(root, 1)])
            },
            Source::Lines(reader) => (None, vec![Frame::Open(IncludeSource::anonymous(reader), 1)]),
            Source::Unrepresentable(path) => {
                return Err(IncludeError::BadInput(format!(
                    "path is not valid UTF-8: {}",
                    path.display()
                )));
            },
        };

        let staged = tempfile::Builder::new().prefix("includer").tempfile()?;
        {
            let mut out = BufWriter::new(staged.as_file());
            expander.run(roots, &mut out)?;
            out.flush()?;
        }
        debug!("staged expanded output at {}", staged.path().display());

        Ok(Self { location, staged })
    }

    /// Location of the top-level source, or `None` for an anonymous source
    #[must_use]
    pub const fn path(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Path of the staged temporary file holding the expanded text
    #[must_use]
    pub fn staged_path(&self) -> &Path {
        self.staged.path()
    }

    /// Iterate over the expanded lines, each with its terminator
    pub fn lines(&self) -> Result<impl Iterator<Item = io::Result<String>>, IncludeError> {
        let file = File::open(self.staged.path())?;
        Ok(Lines {
            reader: BufReader::new(file),
        })
    }

    /// Call `visit` for every expanded line, in order
    pub fn each_line<F>(&self, mut visit: F) -> Result<(), IncludeError>
    where
        F: FnMut(&str),
    {
        for line in self.lines()? {
            visit(&line?);
        }
        Ok(())
    }

    /// Collect every expanded line
    pub fn read_lines(&self) -> Result<Vec<String>, IncludeError> {
        Ok(self.lines()?.collect::<io::Result<Vec<_>>>()?)
    }

    /// Delete the staged result
    pub fn close(self) -> Result<(), IncludeError> {
        debug!("removing staged output {}", self.staged.path().display());
        self.staged.close()?;
        Ok(())
    }
}

/// Line iterator over the staged file that keeps line terminators
struct Lines {
    reader: BufReader<File>,
}

impl Iterator for Lines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// The expansion engine: options, compiled pattern and fetcher
struct Expander<'a> {
    options: IncludeOptions,
    pattern: Regex,
    fetcher: &'a dyn Fetch,
}

impl<'a> Expander<'a> {
    fn new(options: IncludeOptions, fetcher: &'a dyn Fetch) -> Result<Self, IncludeError> {
        if options.max_nesting == 0 {
            return Err(IncludeError::BadInput(
                "max nesting depth must be at least 1".to_string(),
            ));
        }

        let pattern =
            Regex::new(&options.include_pattern).map_err(|e| IncludeError::InvalidPattern {
                pattern: options.include_pattern.clone(),
                reason: e.to_string(),
            })?;
        // captures_len counts the implicit whole-match group
        if pattern.captures_len() != 2 {
            return Err(IncludeError::InvalidPattern {
                pattern: options.include_pattern.clone(),
                reason: format!(
                    "expected exactly one capture group, found {}",
                    pattern.captures_len() - 1
                ),
            });
        }

        Ok(Self {
            options,
            pattern,
            fetcher,
        })
    }

    /// Turn an include target into frames, expanding globs when enabled
    fn expand_target(
        &self,
        target: &str,
        parent: Option<&Location>,
        depth: usize,
    ) -> Result<Vec<Frame>, IncludeError> {
        let resolved = source::resolve_target(target, parent);
        match &resolved {
            Location::File(_) if self.options.allow_glob => {
                let pattern = source::glob_pattern(target, parent);
                let matches = source::expand_glob(&pattern, self.options.sort_glob)?;
                debug!("glob {} matched {} file(s)", pattern.display(), matches.len());
                Ok(matches
                    .into_iter()
                    .map(|path| Frame::Pending(Location::File(path), depth))
                    .collect())
            },
            _ => Ok(vec![Frame::Open(source::open(&resolved, self.fetcher)?, depth)]),
        }
    }

    /// Depth-first expansion of `roots` into `out`
    fn run(&self, roots: Vec<Frame>, out: &mut impl Write) -> Result<(), IncludeError> {
        let mut stack = Stack::new();
        stack.push_all(roots.into_iter().rev());

        'frames: while let Some(frame) = stack.pop() {
            let (mut current, depth) = match frame {
                Frame::Pending(location, depth) => (source::open(&location, self.fetcher)?, depth),
                Frame::Open(current, depth) => (current, depth),
            };

            while let Some(line) = current.next_line()? {
                let Some(captures) = self.pattern.captures(&line) else {
                    out.write_all(line.as_bytes())?;
                    continue;
                };

                let directive = line.trim_end_matches(['\r', '\n']);
                if depth >= self.options.max_nesting {
                    return Err(IncludeError::TooManyIncludes {
                        depth,
                        line: directive.to_string(),
                    });
                }

                let target = captures.get(1).map_or("", |m| m.as_str());
                debug!("depth {depth}: {directive}");
                let nested = self.expand_target(target, current.location(), depth + 1)?;

                // Resume the current source once the nested content is done
                stack.push(Frame::Open(current, depth));
                stack.push_all(nested.into_iter().rev());
                continue 'frames;
            }
        }

        Ok(())
    }
}
