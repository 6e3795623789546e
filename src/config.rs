use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::runner::{Pattern, Predicate, Prefix};

/// Which names a run picks up.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Prefix(String),
    Pattern(String),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Prefix("test_".to_string())
    }
}

/// Run settings for a recipe module.
///
/// ```toml
/// separator_width = 40
/// verbose_transcripts = false
///
/// [select]
/// pattern = "^test_01"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    pub select: Selection,
    pub separator_char: char,
    pub separator_width: usize,
    pub verbose_transcripts: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            select: Selection::default(),
            separator_char: '=',
            separator_width: 30,
            verbose_transcripts: true,
        }
    }
}

impl RunnerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunnerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.separator_width == 0 {
            return Err(ConfigError::Invalid {
                field: "separator_width".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn separator(&self) -> String {
        std::iter::repeat(self.separator_char)
            .take(self.separator_width)
            .collect()
    }

    /// Builds the selection predicate, compiling the pattern if there is one.
    pub fn predicate(&self) -> Result<Box<dyn Predicate>, ConfigError> {
        match &self.select {
            Selection::Prefix(prefix) => Ok(Box::new(Prefix::new(prefix.clone()))),
            Selection::Pattern(pattern) => Ok(Box::new(Pattern::new(Regex::new(pattern)?))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
