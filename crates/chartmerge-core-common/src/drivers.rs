//! Driver descriptors for vector chart store formats and their capabilities.
//!
//! A descriptor only states what a format can do; the store implementation
//! behind it is the [`VectorDriver`](crate::io::VectorDriver) trait.

/// Support status for a specific driver operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// The feature is fully supported and implemented.
    Supported,
    /// The feature is not supported by the driver.
    NotSupported,
    /// The feature is planned for future implementation.
    Planned,
}

impl SupportStatus {
    /// Returns `true` if the operation is fully supported and implemented.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }

    /// Returns the string representation of this support status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SupportStatus::Supported => "Supported",
            SupportStatus::NotSupported => "Not Supported",
            SupportStatus::Planned => "Planned",
        }
    }
}

/// Capabilities of a store driver: reading input datasets and writing
/// merged output.
#[derive(Debug, Clone, Copy)]
pub struct DriverCapabilities {
    /// Support status for opening datasets as merge inputs.
    pub read: SupportStatus,
    /// Support status for creating output datasets.
    pub write: SupportStatus,
}

impl DriverCapabilities {
    /// Returns `true` if at least one operation is fully supported.
    #[must_use]
    pub fn has_supported_operation(&self) -> bool {
        self.read.is_supported() || self.write.is_supported()
    }
}

/// Store format driver definition.
#[derive(Debug, Clone)]
pub struct Driver {
    /// Short name used in the CLI (e.g., `"GeoJSON"`).
    pub short_name: &'static str,
    /// Long descriptive name for display purposes.
    pub long_name: &'static str,
    /// Extension, without the dot, of input datasets discovered for this driver.
    pub extension: &'static str,
    /// Operations supported by this driver.
    pub capabilities: DriverCapabilities,
}

impl Driver {
    /// Creates a new driver definition with specified capabilities.
    #[must_use]
    pub const fn new(
        short_name: &'static str,
        long_name: &'static str,
        extension: &'static str,
        read: SupportStatus,
        write: SupportStatus,
    ) -> Self {
        Self {
            short_name,
            long_name,
            extension,
            capabilities: DriverCapabilities { read, write },
        }
    }
}
