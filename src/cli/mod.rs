//! CLI support for ros-diff
//!
//! Provides programmatic access to the rosdiff CLI functionality for
//! embedding in other tools (like provisioning pipelines).

use std::io;

use crate::policy::Policy;
use crate::{Config, DiffError, ParseError};

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Parser error
    Parse(ParseError),
    /// Diff error
    Diff(DiffError),
    /// IO error
    Io(io::Error),
    /// No input provided
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Parse(e) => write!(f, "Parse error: {}", e),
            CliError::Diff(e) => write!(f, "Diff error: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => {
                write!(f, "No input provided. Pass a file or pipe a config to stdin.")
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Parse(e) => Some(e),
            CliError::Diff(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::NoInput => None,
        }
    }
}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        CliError::Parse(e)
    }
}

impl From<DiffError> for CliError {
    fn from(e: DiffError) -> Self {
        CliError::Diff(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

/// Inputs for a diff run. All three fields hold export-script text, not
/// file paths.
pub struct DiffOptions {
    pub old: String,
    pub new: String,
    pub verbose: Option<String>,
}

/// Diff two export scripts and render the migration script.
pub fn execute_diff(options: &DiffOptions, policy: &Policy) -> Result<String, CliError> {
    let old = Config::parse(&options.old)?;
    let new = Config::parse(&options.new)?;
    let verbose = options
        .verbose
        .as_deref()
        .map(Config::parse)
        .transpose()?;

    let diffed = new.diff(&old, verbose.as_ref(), policy)?;
    Ok(diffed.to_string())
}

/// Parse an export script and render it back in canonical form: one
/// expression per line, comments and continuations resolved.
pub fn execute_prettify(source: &str) -> Result<String, CliError> {
    let config = Config::parse(source)?;
    Ok(config.to_string())
}
