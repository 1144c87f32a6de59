//! Run configuration for merge and shift operations.

use chartmerge_core_common::{LayerOptions, OpenOptions};

use crate::error::{ConfigError, Result};
use crate::schema::ExcludedFields;

/// Environment variable that, when set, replaces the default open options.
pub const S57_OPTIONS_ENV: &str = "OGR_S57_OPTIONS";

/// Reader switches passed through to the store when opening charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct S57Options {
    /// Add a `DEPTH` attribute to split soundings.
    pub add_soundg_depth: bool,
    /// Keep linkage reference attributes.
    pub lnam_refs: bool,
    /// Split multipoint soundings into individual points.
    pub split_multipoint: bool,
    /// Return feature-to-spatial linkages.
    pub return_linkages: bool,
}

impl Default for S57Options {
    fn default() -> Self {
        Self {
            add_soundg_depth: true,
            lnam_refs: true,
            split_multipoint: true,
            return_linkages: false,
        }
    }
}

impl S57Options {
    /// The switches as store open options.
    #[must_use]
    pub fn to_open_options(&self) -> OpenOptions {
        let on_off = |flag: bool| if flag { "ON" } else { "OFF" };
        let options = OpenOptions::new()
            .with("LNAM_REFS", on_off(self.lnam_refs))
            .with("ADD_SOUNDG_DEPTH", on_off(self.add_soundg_depth))
            .with("SPLIT_MULTIPOINT", on_off(self.split_multipoint));
        if self.return_linkages {
            options.with("RETURN_LINKAGES", "ON")
        } else {
            options
        }
    }

    /// Open options for a run: `env_value` (the content of
    /// [`S57_OPTIONS_ENV`]) replaces the switches when present and non-empty.
    ///
    /// The environment wins over the switches; `merge --help` says so.
    #[must_use]
    pub fn resolve(&self, env_value: Option<&str>) -> OpenOptions {
        match env_value.map(str::trim) {
            Some(value) if !value.is_empty() => OpenOptions::parse(value),
            _ => self.to_open_options(),
        }
    }
}

/// Options controlling how merged artifacts are produced.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Prepended to every artifact file name.
    pub prefix: String,
    /// Fields dropped from destination schemas.
    pub excluded: ExcludedFields,
    /// Creation options passed to every destination layer.
    pub layer_options: LayerOptions,
}

impl MergeOptions {
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_excluded(mut self, excluded: ExcludedFields) -> Self {
        self.excluded = excluded;
        self
    }

    #[must_use]
    pub fn with_layer_options(mut self, options: LayerOptions) -> Self {
        self.layer_options = options;
        self
    }

    /// Checks that the prefix yields plain file names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] when the prefix contains a path
    /// separator or a NUL byte.
    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self
            .prefix
            .chars()
            .find(|c| matches!(c, '/' | '\\' | '\0'))
        {
            return Err(ConfigError::InvalidOption {
                option: "prefix".to_string(),
                message: format!("'{}' contains the character {bad:?}", self.prefix),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartMergeError;

    #[test]
    fn test_default_open_options() {
        assert_eq!(
            S57Options::default().to_open_options().to_string(),
            "ADD_SOUNDG_DEPTH=ON,LNAM_REFS=ON,SPLIT_MULTIPOINT=ON"
        );
    }

    #[test]
    fn test_switches_turn_off() {
        let options = S57Options {
            add_soundg_depth: false,
            lnam_refs: false,
            split_multipoint: true,
            return_linkages: true,
        }
        .to_open_options();
        assert!(!options.flag("ADD_SOUNDG_DEPTH", true));
        assert!(!options.flag("LNAM_REFS", true));
        assert!(options.flag("RETURN_LINKAGES", false));
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let defaults = S57Options::default();
        let options = defaults.resolve(Some("SPLIT_MULTIPOINT=OFF"));
        assert!(!options.flag("SPLIT_MULTIPOINT", true));
        assert_eq!(options.get("LNAM_REFS"), None);

        assert_eq!(defaults.resolve(Some("  ")), defaults.to_open_options());
        assert_eq!(defaults.resolve(None), defaults.to_open_options());
    }

    #[test]
    fn test_prefix_validation() {
        assert!(MergeOptions::default().validate().is_ok());
        assert!(MergeOptions::default().with_prefix("nz_").validate().is_ok());

        let err = MergeOptions::default()
            .with_prefix("../escape")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ChartMergeError::Config(_)));
        assert!(err.is_recoverable());
    }
}
