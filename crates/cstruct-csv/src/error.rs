//! Error and warning types for structure conversion.
//!
//! Fatal failures return [`ConvertError`] and abort the current conversion group.
//! Recoverable problems are reported as [`ConversionWarning`] values, so a pass can
//! still produce partial but consistent output.

use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Fatal error for a conversion group.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Reading an input or writing an output failed
    #[error("IO error on {path}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed line in a conversion paths file
    #[error("Invalid conversion paths entry in {path}:{line}: {message}")]
    Config {
        /// Path of the conversion paths file
        path: PathBuf,
        /// 1-indexed line number
        line: usize,
        /// What was wrong with the entry
        message: String,
    },

    /// Serialization of the extracted model failed
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ConvertError {
    /// Create an IO error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }
}

/// Non-fatal problem found while converting a group.
///
/// Each warning is scoped to the smallest unit that could be skipped: a file, a
/// structure, or a single declaration line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionWarning {
    /// An input file of the group does not exist
    #[error("can't locate input file: {}", .0.display())]
    MissingInput(PathBuf),

    /// A structure closed without a resolvable name and was discarded
    #[error("missing structure name (closing line '{closing}')")]
    MissingStructureName {
        /// Text of the closing line
        closing: String,
    },

    /// A member line had no boundary between data type and variable name
    #[error("structure '{structure}' has an invalid variable definition: {text}")]
    InvalidMemberDefinition {
        /// Structure containing the line
        structure: String,
        /// Offending line
        text: String,
    },

    /// A declaration form the scanner does not handle (e.g. a non-struct typedef)
    #[error("unhandled typedef: {text}")]
    UnhandledDeclaration {
        /// Offending line
        text: String,
    },
}

/// Ordered collection of the warnings raised during one conversion pass.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<ConversionWarning>,
}

impl Diagnostics {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a warning and record it.
    pub fn warn(&mut self, warning: ConversionWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Warnings in the order they were raised.
    pub fn warnings(&self) -> &[ConversionWarning] {
        &self.warnings
    }

    /// `true` when nothing was warned about.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Consume the collector, keeping the recorded warnings.
    pub fn into_warnings(self) -> Vec<ConversionWarning> {
        self.warnings
    }
}
