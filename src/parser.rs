// Filename parsing
// Pulls studio, performer names, title and date out of a file stem.

use regex::Regex;

use crate::constants::{DEFAULT_FILENAME_PATTERN, PERFORMER_DELIMITER};
use crate::error::{MapperError, Result};

/// Structured fields recovered from a filename
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFilename {
    pub studio: Option<String>,
    pub performers: Vec<String>,
    pub title: Option<String>,
    pub date: Option<String>,
}

/// Compiled filename pattern. Build once per generation run.
#[derive(Debug, Clone)]
pub struct FilenameParser {
    regex: Regex,
}

impl FilenameParser {
    /// Compile `pattern`, or the built-in default when `None`.
    /// The pattern must match the whole stem.
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        let source = pattern
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_FILENAME_PATTERN);

        let regex = Regex::new(&format!("^(?:{})$", source))
            .map_err(|e| MapperError::InvalidPattern(e.to_string()))?;

        Ok(Self { regex })
    }

    /// Parse a filename without its extension.
    /// `None` means no structured data, which is not an error.
    pub fn parse(&self, stem: &str) -> Option<ParsedFilename> {
        let caps = self.regex.captures(stem)?;

        let group = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        let parsed = ParsedFilename {
            studio: group("studio"),
            performers: group("performers")
                .map(|s| split_performers(&s))
                .unwrap_or_default(),
            title: group("title"),
            date: group("date"),
        };

        if parsed == ParsedFilename::default() {
            return None;
        }

        Some(parsed)
    }
}

fn split_performers(raw: &str) -> Vec<String> {
    raw.split(PERFORMER_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
