//! Flat string templates with variable substitution
//!
//! Two syntaxes are supported:
//!
//! - [`UnixShellTemplate`]: `$name`, `${name}` and `${name?default}`, with
//!   `\$` producing a literal `$`
//! - [`WindowsCmdTemplate`]: `%name%`, with `\%` producing a literal `%`
//!
//! Values come from a [`Resolve`] implementation. In safe mode (the default)
//! an unknown variable with no default expands to the empty string; in unsafe
//! mode it is an error. Substitution is a single left-to-right pass, so
//! substituted values are never expanded again.
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use includer::template::{Template, UnixShellTemplate};
//!
//! let vars = HashMap::from([("a".to_string(), "alpha".to_string())]);
//! let t = UnixShellTemplate::new(vars);
//! assert_eq!(t.substitute("${a} ${b?beta} \\$a").unwrap(), "alpha beta $a");
//! ```

use std::collections::{BTreeMap, HashMap};

use regex::{Captures, Regex};
use thiserror::Error;

/// Default pattern for variable names
pub const DEFAULT_VAR_PATTERN: &str = "[A-Za-z0-9_]+";

/// Errors that can occur during substitution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Unsafe mode hit a variable with no value and no default
    #[error("variable not found: {0}")]
    VariableNotFound(String),

    /// The variable-name pattern does not compile
    #[error("invalid variable pattern: {0}")]
    InvalidPattern(String),
}

/// Looks up variable values by name
pub trait Resolve {
    /// The value of `name`, if it has one
    fn resolve(&self, name: &str) -> Option<String>;
}

impl Resolve for HashMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Resolve for BTreeMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<F> Resolve for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Resolves variables from the process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvResolver;

impl Resolve for EnvResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A variable reference found in a template string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Byte offset where the reference starts
    pub start: usize,
    /// Byte offset just past the reference
    pub end: usize,
    /// Variable name
    pub name: String,
    /// Default value, if the reference supplies one
    pub default: Option<String>,
}

/// A string template
pub trait Template {
    /// Replace every variable reference in `s`
    fn substitute(&self, s: &str) -> Result<String, TemplateError>;

    /// Locate the first unescaped variable reference in `s`
    fn find_variable(&self, s: &str) -> Option<Variable>;
}

/// What a single regex match turned out to be
enum Token {
    Escaped(char),
    Var(Variable),
}

/// Shared resolver handling for both template syntaxes
#[derive(Debug)]
struct Engine<R> {
    resolver: R,
    safe: bool,
    regex: Regex,
}

impl<R: Resolve> Engine<R> {
    fn value(&self, var: &Variable) -> Result<String, TemplateError> {
        if let Some(value) = self.resolver.resolve(&var.name) {
            return Ok(value);
        }
        match (&var.default, self.safe) {
            (Some(default), _) => Ok(default.clone()),
            (None, true) => Ok(String::new()),
            (None, false) => Err(TemplateError::VariableNotFound(var.name.clone())),
        }
    }

    fn substitute(&self, s: &str, token: impl Fn(&Captures<'_>) -> Token) -> Result<String, TemplateError> {
        let mut result = String::with_capacity(s.len());
        let mut last = 0;
        for caps in self.regex.captures_iter(s) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            result.push_str(&s[last..whole.start]);
            match token(&caps) {
                Token::Escaped(c) => result.push(c),
                Token::Var(var) => result.push_str(&self.value(&var)?),
            }
            last = whole.end;
        }
        result.push_str(&s[last..]);
        Ok(result)
    }

    fn find(&self, s: &str, token: impl Fn(&Captures<'_>) -> Token) -> Option<Variable> {
        self.regex.captures_iter(s).find_map(|caps| match token(&caps) {
            Token::Var(var) => Some(var),
            Token::Escaped(_) => None,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, TemplateError> {
    Regex::new(pattern).map_err(|e| TemplateError::InvalidPattern(e.to_string()))
}

/// Unix shell style: `$var`, `${var}`, `${var?default}`
#[derive(Debug)]
pub struct UnixShellTemplate<R> {
    engine: Engine<R>,
}

impl<R: Resolve> UnixShellTemplate<R> {
    /// Create a safe template using the default variable-name pattern
    #[allow(clippy::missing_panics_doc)]
    pub fn new(resolver: R) -> Self {
        Self::with_options(resolver, true, DEFAULT_VAR_PATTERN)
            .expect("default variable pattern compiles")
    }

    /// Create a template with explicit safety and variable-name pattern
    pub fn with_options(resolver: R, safe: bool, var_pattern: &str) -> Result<Self, TemplateError> {
        let regex = compile(&format!(
            r"\\\$|\$\{{(?P<long>{var_pattern})(?:\?(?P<default>[^}}]*))?\}}|\$(?P<short>{var_pattern})"
        ))?;
        Ok(Self {
            engine: Engine { resolver, safe, regex },
        })
    }

    fn token(caps: &Captures<'_>) -> Token {
        let start = caps.get(0).map_or(0, |m| m.start());
        let end = caps.get(0).map_or(0, |m| m.end());
        let var = |name: &str, default: Option<&str>| {
            Token::Var(Variable {
                start,
                end,
                name: name.to_string(),
                default: default.map(str::to_string),
            })
        };
        match (caps.name("long"), caps.name("short")) {
            (Some(long), _) => var(long.as_str(), caps.name("default").map(|m| m.as_str())),
            (None, Some(short)) => var(short.as_str(), None),
            (None, None) => Token::Escaped('$'),
        }
    }
}

impl<R: Resolve> Template for UnixShellTemplate<R> {
    fn substitute(&self, s: &str) -> Result<String, TemplateError> {
        self.engine.substitute(s, Self::token)
    }

    fn find_variable(&self, s: &str) -> Option<Variable> {
        self.engine.find(s, Self::token)
    }
}

/// Windows `cmd` style: `%var%`
#[derive(Debug)]
pub struct WindowsCmdTemplate<R> {
    engine: Engine<R>,
}

impl<R: Resolve> WindowsCmdTemplate<R> {
    /// Create a safe template using the default variable-name pattern
    #[allow(clippy::missing_panics_doc)]
    pub fn new(resolver: R) -> Self {
        Self::with_options(resolver, true, DEFAULT_VAR_PATTERN)
            .expect("default variable pattern compiles")
    }

    /// Create a template with explicit safety and variable-name pattern
    pub fn with_options(resolver: R, safe: bool, var_pattern: &str) -> Result<Self, TemplateError> {
        let regex = compile(&format!(r"\\%|%(?P<name>{var_pattern})%"))?;
        Ok(Self {
            engine: Engine { resolver, safe, regex },
        })
    }

    fn token(caps: &Captures<'_>) -> Token {
        match (caps.get(0), caps.name("name")) {
            (Some(whole), Some(name)) => Token::Var(Variable {
                start: whole.start(),
                end: whole.end(),
                name: name.as_str().to_string(),
                default: None,
            }),
            _ => Token::Escaped('%'),
        }
    }
}

impl<R: Resolve> Template for WindowsCmdTemplate<R> {
    fn substitute(&self, s: &str) -> Result<String, TemplateError> {
        self.engine.substitute(s, Self::token)
    }

    fn find_variable(&self, s: &str) -> Option<Variable> {
        self.engine.find(s, Self::token)
    }
}
