//! Command-line interface
//!
//! ```text
//! includer [OPTIONS] <SOURCE>
//! ```
//!
//! Expands `SOURCE` (a file path, a URL, or `-` for stdin) and writes the
//! flattened text to stdout or `--output`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::config::{self, IncludeOptions};
use crate::includer::{Includer, Source};

/// includer - expand %include directives into one flattened text
#[derive(Parser, Debug)]
#[command(name = "includer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// File path or URL to expand, or `-` for stdin
    pub source: String,

    /// Config file (defaults to ~/.config/includer/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum include nesting depth
    #[arg(long)]
    pub max_nesting: Option<usize>,

    /// Include directive regex, with one capture group for the target
    #[arg(long)]
    pub pattern: Option<String>,

    /// Treat file targets as glob patterns
    #[arg(long)]
    pub glob: bool,

    /// Keep glob matches in filesystem order instead of sorting them
    #[arg(long)]
    pub no_sort: bool,

    /// Write output here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Merge file configuration with command-line overrides
    pub fn options(&self) -> anyhow::Result<IncludeOptions> {
        let mut options = match &self.config {
            Some(path) => config::load(path)?,
            None => config::load_or_default()?,
        };
        if let Some(max) = self.max_nesting {
            options.max_nesting = max;
        }
        if let Some(pattern) = &self.pattern {
            options.include_pattern.clone_from(pattern);
        }
        if self.glob {
            options.allow_glob = true;
        }
        if self.no_sort {
            options.sort_glob = false;
        }
        Ok(options)
    }
}

/// Run the CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let options = cli.options()?;
    let source = if cli.source == "-" {
        Source::lines(io::stdin().lock())
    } else {
        Source::from(cli.source.as_str())
    };

    let includer = Includer::new(source, options)?;

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for line in includer.lines()? {
        out.write_all(line?.as_bytes())?;
    }
    out.flush()?;
    drop(out);

    includer.close()?;
    Ok(())
}
