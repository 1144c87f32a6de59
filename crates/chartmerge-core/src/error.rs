//! Custom error types for `chartmerge` operations.
//!
//! Fatal conditions of a run surface as [`ChartMergeError`]. Per-feature copy
//! failures are not errors at this level; they are collected in the merge
//! report instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for `chartmerge` operations.
///
/// It uses `#[error(transparent)]` to delegate display formatting to the
/// underlying error variants.
#[derive(Debug, Error)]
pub enum ChartMergeError {
    /// Driver-related errors (not found, unsupported operations)
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// I/O errors (file read/write, discovery, directory setup)
    #[error(transparent)]
    Io(#[from] IoError),

    /// Geometry classification errors
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Errors raised by store implementations
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Driver-related errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Driver was not found in the registry
    #[error("Driver '{name}' not found. Available drivers: {available}")]
    NotFound {
        /// The requested driver name
        name: String,
        /// Comma-separated list of available drivers
        available: String,
    },

    /// Driver does not support the requested operation
    #[error("Driver '{driver}' does not support {operation}")]
    OperationNotSupported {
        /// The driver name
        driver: String,
        /// The operation that's not supported (e.g., "reading", "writing")
        operation: String,
    },
}

/// I/O related errors.
#[derive(Debug, Error)]
pub enum IoError {
    /// Failed to open or read a dataset
    #[error("Failed to read {format} dataset '{path}': {source}")]
    Read {
        /// The format being read (e.g., "`GeoJSON`")
        format: String,
        /// The dataset path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to create or write a dataset
    #[error("Failed to write {format} dataset '{path}': {source}")]
    Write {
        /// The format being written
        format: String,
        /// The dataset path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to create an output directory
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The directory path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// Path is invalid
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The invalid path
        path: PathBuf,
        /// Why the path is invalid
        reason: String,
    },

    /// File or directory was not found
    #[error("File not found: '{path}'")]
    FileNotFound {
        /// The missing path
        path: PathBuf,
    },

    /// Source directory holds no input datasets
    #[error("No '.{extension}' files found in '{path}'")]
    NoInputs {
        /// The searched directory
        path: PathBuf,
        /// The extension searched for
        extension: String,
    },
}

/// Geometry classification errors.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Geometry type has no generic kind
    #[error("Unsupported geometry kind: {geometry_type} (layer '{layer}')")]
    UnsupportedGeometryKind {
        /// Display name of the concrete type
        geometry_type: String,
        /// Layer in which the type was encountered
        layer: String,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },
}

/// Type alias for Results using `ChartMergeError`.
pub type Result<T> = std::result::Result<T, ChartMergeError>;

impl ChartMergeError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Driver(e) => e.user_message(),
            Self::Io(e) => e.user_message(),
            Self::Geometry(e) => e.to_string(),
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Other(e) => format!("Error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Driver(e) => e.recovery_suggestion(),
            Self::Io(e) => e.recovery_suggestion(),
            Self::Geometry(_) => Some(
                "Only point, line and polygon geometries (and their multi forms) can be merged."
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Check if this error is potentially recoverable.
    ///
    /// Recoverable errors might be fixed by retrying with different
    /// parameters.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Driver(DriverError::NotFound { .. })
        )
    }
}

impl DriverError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { name, available } => {
                format!(
                    "Driver '{name}' not found.\n\nAvailable drivers:\n{}",
                    available
                        .split(", ")
                        .map(|d| format!("  - {d}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            },
            Self::OperationNotSupported { driver, operation } => {
                format!("The '{driver}' driver does not support {operation}.")
            },
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } => {
                Some("Run 'chartmerge drivers' to see all available drivers.".to_string())
            },
            Self::OperationNotSupported { .. } => {
                Some("Try using a different driver that supports this operation.".to_string())
            },
        }
    }
}

impl IoError {
    fn user_message(&self) -> String {
        match self {
            Self::Read { format, path, .. } => {
                format!("Failed to read {} dataset: {}", format, path.display())
            },
            Self::Write { format, path, .. } => {
                format!("Failed to write {} dataset: {}", format, path.display())
            },
            Self::FileNotFound { path } => {
                format!("File not found: {}", path.display())
            },
            _ => self.to_string(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::FileNotFound { .. } => {
                Some("Check that the path is correct and exists.".to_string())
            },
            Self::NoInputs { .. } => {
                Some("Check the source directory and the --driver option.".to_string())
            },
            Self::CreateDir { .. } => {
                Some("Check permissions on the destination directory.".to_string())
            },
            Self::InvalidPath { .. } => {
                Some("Feature class names must be plain file name parts.".to_string())
            },
            _ => None,
        }
    }
}

/// Extension trait for adding I/O context to errors.
pub trait IoErrorExt<T> {
    /// Add read context to an error.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError::Read`] if the underlying operation fails.
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;

    /// Add write context to an error.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError::Write`] if the underlying operation fails.
    fn with_write_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoErrorExt<T> for anyhow::Result<T> {
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            ChartMergeError::Io(IoError::Read {
                format: format.to_string(),
                path: path.into(),
                source: e.into(),
            })
        })
    }

    fn with_write_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            ChartMergeError::Io(IoError::Write {
                format: format.to_string(),
                path: path.into(),
                source: e.into(),
            })
        })
    }
}

/// Helper to create `DriverError::NotFound` with available drivers.
#[must_use]
pub fn driver_not_found(name: &str) -> DriverError {
    use crate::drivers::get_driver_names;

    let available = get_driver_names().join(", ");
    DriverError::NotFound {
        name: name.to_string(),
        available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_not_found_lists_registry() {
        let err = ChartMergeError::from(driver_not_found("S57X"));
        assert!(err.to_string().contains("GeoJSON"));
        assert!(err.user_message().contains("  - GeoJSON"));
        assert!(err.recovery_suggestion().is_some());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_read_context_wraps_anyhow() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("truncated document"));
        let err = result
            .with_read_context("GeoJSON", "charts/NZ40100.geojson")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to read GeoJSON dataset 'charts/NZ40100.geojson': truncated document"
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_no_inputs_message() {
        let err = ChartMergeError::from(IoError::NoInputs {
            path: PathBuf::from("charts"),
            extension: "geojson".to_string(),
        });
        assert_eq!(err.to_string(), "No '.geojson' files found in 'charts'");
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_geometry_error_is_fatal() {
        let err = ChartMergeError::from(GeometryError::UnsupportedGeometryKind {
            geometry_type: "GeometryCollection".to_string(),
            layer: "DEPARE".to_string(),
        });
        assert!(err.to_string().contains("GeometryCollection"));
        assert!(!err.is_recoverable());
    }
}
