use std::io;
use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Runner errors
// =============================================================================

/// Everything that can stop a selective run. None of these are recovered
/// inside the runner: the first one ends the run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("'{name}' is not callable (value {value})")]
    NotCallable { name: String, value: String },

    #[error("{name}() takes {arity} argument(s) but {given} were given")]
    Arity {
        name: String,
        arity: usize,
        given: usize,
    },

    #[error("call to {name}() failed: {source}")]
    Invocation {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write runner output: {0}")]
    Output(#[from] io::Error),
}

impl RunError {
    pub fn invocation(name: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Invocation {
            name: name.into(),
            source,
        }
    }

    /// Name of the symbol the error is about, if any.
    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            Self::NotCallable { name, .. }
            | Self::Arity { name, .. }
            | Self::Invocation { name, .. } => Some(name.as_str()),
            Self::Output(_) => None,
        }
    }
}

// =============================================================================
// Configuration errors
// =============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid selection pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

// =============================================================================
// Transcript errors
// =============================================================================

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("transcript '{name}', line {line}: {message}")]
    Syntax {
        name: String,
        line: usize,
        message: String,
    },

    #[error("failed to write transcript report: {0}")]
    Output(#[from] io::Error),
}

// =============================================================================
// Module errors
// =============================================================================

/// Failure of a whole `run_main`: setup, transcript output, or the run itself.
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error(transparent)]
    Run(#[from] RunError),
}
