//! The merge engine.
//!
//! For each (feature class, kind) pair of the registry the engine writes one
//! artifact holding the shifted features of that kind from every input that
//! carries the feature class. The first contributing input fixes the
//! destination schema; later inputs are copied into it by field name.

use std::fmt;
use std::path::{Path, PathBuf};

use chartmerge_core_common::{Dataset, LayerWriter, SpatialRef, VectorDriver};
use log::{debug, info, warn};

use crate::classify::{GenericKind, generic_kind, with_layer};
use crate::config::MergeOptions;
use crate::error::{IoError, IoErrorExt, Result};
use crate::registry::FeatureClassRegistry;
use crate::schema::SchemaUnifier;
use crate::shift::shift_optional;

/// A feature the destination refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCopyFailure {
    /// Source dataset name
    pub dataset: String,
    /// Source layer name
    pub layer: String,
    /// Source feature id, when the source assigns one
    pub feature_id: Option<u64>,
    /// Why the append failed
    pub cause: String,
}

impl fmt::Display for FeatureCopyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self
            .feature_id
            .map_or_else(|| "?".to_string(), |fid| fid.to_string());
        write!(
            f,
            "Could not write feature {id} from feature class {} in {}: {}",
            self.layer, self.dataset, self.cause
        )
    }
}

/// Outcome of one output artifact.
#[derive(Debug, Clone)]
pub struct ArtifactReport {
    pub feature_class: String,
    pub kind: GenericKind,
    pub path: PathBuf,
    /// Names of the input datasets that carry the feature class, in order.
    pub contributors: Vec<String>,
    pub features_written: u64,
    /// Features left out because their geometry is of another kind.
    pub features_skipped: u64,
    pub failures: Vec<FeatureCopyFailure>,
}

/// Outcome of a merge run.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub artifacts: Vec<ArtifactReport>,
}

impl MergeReport {
    #[must_use]
    pub fn features_written(&self) -> u64 {
        self.artifacts.iter().map(|a| a.features_written).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FeatureCopyFailure> {
        self.artifacts.iter().flat_map(|a| a.failures.iter())
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.artifacts.iter().map(|a| a.failures.len()).sum()
    }

    #[must_use]
    pub fn artifact(&self, feature_class: &str, kind: GenericKind) -> Option<&ArtifactReport> {
        self.artifacts
            .iter()
            .find(|a| a.feature_class == feature_class && a.kind == kind)
    }
}

/// Writes merged artifacts through a store driver.
pub struct MergeEngine<'a> {
    driver: &'a dyn VectorDriver,
    options: MergeOptions,
    unifier: SchemaUnifier,
}

impl<'a> MergeEngine<'a> {
    #[must_use]
    pub fn new(driver: &'a dyn VectorDriver, options: MergeOptions) -> Self {
        let unifier = SchemaUnifier::new(options.excluded.clone());
        Self {
            driver,
            options,
            unifier,
        }
    }

    /// Location of the artifact for a (feature class, kind) pair.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidPath`] when the feature class name contains
    /// a path separator or a NUL byte, since the artifact would land outside
    /// `output_dir`.
    pub fn artifact_path(
        &self,
        output_dir: &Path,
        feature_class: &str,
        kind: GenericKind,
    ) -> Result<PathBuf> {
        let file_name = format!(
            "{}{feature_class}_{kind}.{}",
            self.options.prefix,
            self.driver.extension()
        );
        if let Some(bad) = feature_class
            .chars()
            .find(|c| matches!(c, '/' | '\\' | '\0'))
        {
            return Err(IoError::InvalidPath {
                path: output_dir.join(file_name),
                reason: format!("feature class '{feature_class}' contains the character {bad:?}"),
            }
            .into());
        }
        Ok(output_dir.join(file_name))
    }

    /// Merges `datasets` into one artifact per registry pair.
    ///
    /// Inputs are dropped once every artifact is closed.
    ///
    /// # Errors
    ///
    /// Fails when an artifact cannot be created, written or closed, when an
    /// input cannot be read, or when a geometry has no generic kind.
    /// Features refused by the destination are reported, not raised.
    pub fn merge(
        &self,
        mut datasets: Vec<Box<dyn Dataset>>,
        registry: &FeatureClassRegistry,
        output_dir: &Path,
    ) -> Result<MergeReport> {
        // Every name is checked before the first artifact is written.
        let planned = registry
            .output_layers()
            .map(|(feature_class, kind)| {
                Ok((feature_class, kind, self.artifact_path(output_dir, feature_class, kind)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut report = MergeReport::default();
        for (feature_class, kind, path) in planned {
            let artifact = self.merge_layer(&mut datasets, feature_class, kind, path)?;
            info!(
                "{}: {} feature(s) from {} dataset(s), {} failure(s)",
                artifact.path.display(),
                artifact.features_written,
                artifact.contributors.len(),
                artifact.failures.len()
            );
            report.artifacts.push(artifact);
        }
        drop(datasets);
        Ok(report)
    }

    fn merge_layer(
        &self,
        datasets: &mut [Box<dyn Dataset>],
        feature_class: &str,
        kind: GenericKind,
        path: PathBuf,
    ) -> Result<ArtifactReport> {
        let format = self.driver.short_name();
        if self.driver.exists(&path) {
            debug!("Replacing existing '{}'", path.display());
            self.driver
                .delete(&path)
                .with_write_context(format, &path)?;
        }

        let mut writer = self.driver.create(&path).with_write_context(format, &path)?;
        let destination = writer
            .create_layer(
                feature_class,
                &SpatialRef::wgs84(),
                None,
                &self.options.layer_options,
            )
            .with_write_context(format, &path)?;

        let mut artifact = ArtifactReport {
            feature_class: feature_class.to_string(),
            kind,
            path: path.clone(),
            contributors: Vec::new(),
            features_written: 0,
            features_skipped: 0,
            failures: Vec::new(),
        };

        for dataset in datasets.iter_mut() {
            let dataset_name = dataset.name().to_string();
            let Some(source) = dataset.layer_by_name(feature_class) else {
                debug!("'{dataset_name}' has no feature class {feature_class}");
                continue;
            };
            if artifact.contributors.is_empty() {
                for field in self.unifier.build_fields(source) {
                    destination
                        .create_field(&field)
                        .with_write_context(format, &path)?;
                }
            }
            artifact.contributors.push(dataset_name.clone());
            self.copy_features(source, destination, &dataset_name, &mut artifact)?;
        }

        writer.close().with_write_context(format, &path)?;
        Ok(artifact)
    }

    fn copy_features(
        &self,
        source: &mut dyn chartmerge_core_common::Layer,
        destination: &mut dyn LayerWriter,
        dataset_name: &str,
        artifact: &mut ArtifactReport,
    ) -> Result<()> {
        let fields = destination.fields().to_vec();
        let layer_name = source.name().to_string();
        source.reset_reading();
        while let Some(mut feature) = source
            .next_feature()
            .with_read_context(self.driver.short_name(), dataset_name)?
        {
            shift_optional(feature.geometry.as_mut());
            if let Some(geometry) = &feature.geometry {
                let feature_kind = generic_kind(geometry.geometry_type())
                    .map_err(|err| with_layer(err, &layer_name))?;
                if feature_kind != artifact.kind {
                    artifact.features_skipped += 1;
                    continue;
                }
            }

            let feature_id = feature.fid;
            match destination.create_feature(feature.conform_to(&fields)) {
                Ok(()) => artifact.features_written += 1,
                Err(err) => {
                    let failure = FeatureCopyFailure {
                        dataset: dataset_name.to_string(),
                        layer: layer_name.clone(),
                        feature_id,
                        cause: format!("{err:#}"),
                    };
                    warn!("{failure}");
                    artifact.failures.push(failure);
                },
            }
        }
        Ok(())
    }
}
