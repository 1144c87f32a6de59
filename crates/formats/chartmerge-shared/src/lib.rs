//! Error types shared by the `chartmerge` format crates.

use std::error::Error as StdError;
use std::fmt;

/// A position within a source document, such as a GeoJSON feature.
///
/// All indices are 1-based where possible to align with human expectations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePosition {
    /// Line number in the source (1-based)
    pub line: Option<u64>,
    /// Column number in the source (1-based)
    pub column: Option<u64>,
    /// Index of the feature within its document (1-based)
    pub feature: Option<u64>,
}

impl SourcePosition {
    /// Returns true when the position does not contain any location metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line.is_none() && self.column.is_none() && self.feature.is_none()
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(line) = self.line {
            parts.push(format!("line {line}"));
        }
        if let Some(column) = self.column {
            parts.push(format!("column {column}"));
        }
        if let Some(feature) = self.feature {
            parts.push(format!("feature {feature}"));
        }

        if parts.is_empty() {
            write!(f, "unknown position")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Errors raised while reading or writing a vector format.
#[derive(Debug)]
pub enum VectorFormatError {
    /// An underlying I/O failure occurred.
    Io {
        /// The originating error.
        source: std::io::Error,
        /// Optional context describing what was being accessed.
        context: Option<String>,
    },
    /// Parsing failed for the input source.
    Parse {
        /// Human readable description of the failure.
        message: String,
        /// Optional position describing where the failure occurred.
        position: Option<SourcePosition>,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// A layer schema was malformed or could not be honoured.
    Schema {
        /// Human readable description of the failure.
        message: String,
        /// Optional context describing the layer involved.
        context: Option<String>,
    },
    /// A geometry could not be represented in the format.
    Geometry {
        /// Human readable description of the failure.
        message: String,
    },
}

impl VectorFormatError {
    fn fmt_context(context: Option<&str>) -> String {
        context.map(|c| format!(" in {c}")).unwrap_or_default()
    }

    fn fmt_position(position: Option<&SourcePosition>) -> String {
        position.map(|pos| format!(" at {pos}")).unwrap_or_default()
    }

    /// Wraps an I/O error with context.
    #[must_use]
    pub fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: Some(context.into()),
        }
    }

    /// Attach additional context to the error, returning the updated error.
    #[must_use]
    pub fn with_additional_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            VectorFormatError::Io {
                context: existing, ..
            }
            | VectorFormatError::Parse {
                context: existing, ..
            }
            | VectorFormatError::Schema {
                context: existing, ..
            } => match existing {
                Some(existing) if !existing.is_empty() => {
                    existing.push_str("; ");
                    existing.push_str(&context);
                },
                _ => *existing = Some(context),
            },
            VectorFormatError::Geometry { message } => {
                message.push_str(" (");
                message.push_str(&context);
                message.push(')');
            },
        }
        self
    }
}

impl fmt::Display for VectorFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorFormatError::Io { source, context } => {
                write!(
                    f,
                    "I/O error{}: {source}",
                    Self::fmt_context(context.as_deref())
                )
            },
            VectorFormatError::Parse {
                message,
                position,
                context,
            } => write!(
                f,
                "Parse error{}{}: {message}",
                Self::fmt_context(context.as_deref()),
                Self::fmt_position(position.as_ref())
            ),
            VectorFormatError::Schema { message, context } => write!(
                f,
                "Schema error{}: {message}",
                Self::fmt_context(context.as_deref())
            ),
            VectorFormatError::Geometry { message } => write!(f, "Geometry error: {message}"),
        }
    }
}

impl StdError for VectorFormatError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            VectorFormatError::Io { source, .. } => Some(source),
            VectorFormatError::Parse { .. }
            | VectorFormatError::Schema { .. }
            | VectorFormatError::Geometry { .. } => None,
        }
    }
}

/// Result type alias that uses [`VectorFormatError`].
pub type VectorFormatResult<T> = Result<T, VectorFormatError>;
