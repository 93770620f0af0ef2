use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::{DiffError, ParseError};
use crate::policy::Policy;
use crate::section::Section;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("valid pattern"))
}

/// A whole parsed export script: the optional header comment plus the
/// section blocks, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Export timestamp from the header comment, when present
    pub timestamp: Option<NaiveDateTime>,

    /// RouterOS version from the header comment, when present
    pub version: Option<(u32, u32, u32)>,

    pub sections: Vec<Section>,
}

impl Config {
    /// Parse a full export script.
    ///
    /// Section blocks start at lines beginning with `/`. Text before the
    /// first block is ignored, except for a leading header comment of the
    /// form `# <timestamp> by RouterOS <version>`. Blocks repeating an
    /// earlier path are merged into the first occurrence.
    ///
    /// ```
    /// use ros_diff::Config;
    ///
    /// let config = Config::parse(
    ///     "# jun/25/2021 01:07:55 by RouterOS 6.47.9\n\
    ///      /ip address\n\
    ///      add address=10.0.0.1/24 interface=ether1\n",
    /// )
    /// .unwrap();
    /// assert_eq!(config.version, Some((6, 47, 9)));
    /// assert_eq!(config.sections.len(), 1);
    /// ```
    pub fn parse(source: &str) -> Result<Config, ParseError> {
        let source = source.replace("\r\n", "\n");
        let source = source.trim();

        let mut timestamp = None;
        let mut version = None;
        if let Some(first_line) = source.lines().next() {
            if first_line.starts_with('#') && first_line.contains(" by RouterOS ") {
                (timestamp, version) = parse_header(first_line)?;
            }
        }

        let mut blocks: Vec<String> = Vec::new();
        for line in source.lines() {
            if line.starts_with('/') {
                blocks.push(line.to_string());
            } else if let Some(current) = blocks.last_mut() {
                current.push('\n');
                current.push_str(line);
            }
        }

        let mut sections: Vec<Section> = Vec::new();
        for block in &blocks {
            let parsed = Section::parse(block)?;
            match sections.iter_mut().find(|s| s.path == parsed.path) {
                Some(existing) => existing.expressions.extend(parsed.expressions),
                None => sections.push(parsed),
            }
        }

        Ok(Config {
            timestamp,
            version,
            sections,
        })
    }

    /// The section with the given path, if present.
    pub fn section(&self, path: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.path == path)
    }

    /// The section paths, in order of first appearance.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.path.as_str())
    }

    /// Compare this (new) config to `old` and return the config of
    /// expressions which migrates old to new.
    ///
    /// Sections are diffed pairwise by path, new-config order first and
    /// old-only paths after. `old_verbose`, when given, is a verbose export
    /// of the same old state and suppresses arguments which merely spell
    /// out values the device already holds. The result carries no header
    /// and omits sections whose diff came out empty.
    pub fn diff(
        &self,
        old: &Config,
        old_verbose: Option<&Config>,
        policy: &Policy,
    ) -> Result<Config, DiffError> {
        ensure_unique_paths(old, "old")?;
        ensure_unique_paths(self, "new")?;

        let mut paths: Vec<&str> = self.paths().collect();
        for path in old.paths() {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }

        let mut sections = Vec::new();
        for path in paths {
            let blank = Section::empty(path);
            let new_section = self.section(path).unwrap_or(&blank);
            let old_section = old.section(path).unwrap_or(&blank);
            let verbose = old_verbose.and_then(|c| c.section(path));

            let diffed = new_section.diff(old_section, verbose, policy)?;
            if !diffed.expressions.is_empty() {
                sections.push(diffed);
            }
        }

        Ok(Config {
            timestamp: None,
            version: None,
            sections,
        })
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .sections
            .iter()
            .filter(|s| !s.expressions.is_empty())
            .map(|s| s.to_string())
            .collect();
        write!(f, "{}", rendered.join("\n"))
    }
}

fn parse_header(
    line: &str,
) -> Result<(Option<NaiveDateTime>, Option<(u32, u32, u32)>), ParseError> {
    let trimmed = line.trim_start_matches('#').trim();
    let (date_part, version_part) = trimmed
        .split_once(" by RouterOS ")
        .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

    let timestamp = NaiveDateTime::parse_from_str(date_part.trim(), "%b/%d/%Y %H:%M:%S")
        .map_err(|_| ParseError::InvalidHeader(line.to_string()))?;

    let captures = version_regex()
        .captures(version_part)
        .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
    let number = |index: usize| -> Result<u32, ParseError> {
        captures
            .get(index)
            .map_or(Ok(0), |m| m.as_str().parse::<u32>())
            .map_err(|_| ParseError::InvalidHeader(line.to_string()))
    };
    let version = (number(1)?, number(2)?, number(3)?);

    Ok((Some(timestamp), Some(version)))
}

fn ensure_unique_paths(config: &Config, which: &str) -> Result<(), DiffError> {
    let mut seen = HashSet::new();
    for path in config.paths() {
        if !seen.insert(path) {
            return Err(DiffError::DuplicateSections(which.to_string()));
        }
    }
    Ok(())
}
