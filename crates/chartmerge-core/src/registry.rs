//! Feature-class discovery across input datasets.
//!
//! The registry is built in a dedicated load phase and is immutable once
//! built. The merge phase receives it explicitly; it fixes which output
//! layers exist.

use std::collections::{BTreeMap, BTreeSet};

use chartmerge_core_common::Dataset;
use log::{debug, info};

use crate::classify::{GenericKind, observed_kinds};
use crate::error::Result;

/// Accumulates feature classes while datasets are registered.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    classes: BTreeMap<String, BTreeSet<GenericKind>>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans every layer of `dataset` and unions its kinds into the entry
    /// named after the layer.
    ///
    /// Layers without geometries still get an (empty) entry.
    ///
    /// # Errors
    ///
    /// Fails when a layer cannot be read or holds an unclassifiable geometry.
    pub fn register(&mut self, dataset: &mut dyn Dataset) -> Result<()> {
        debug!(
            "Registering {} layer(s) of '{}'",
            dataset.layer_count(),
            dataset.name()
        );
        for index in 0..dataset.layer_count() {
            let Some(layer) = dataset.layer(index) else {
                continue;
            };
            let kinds = observed_kinds(layer)?;
            self.classes
                .entry(layer.name().to_string())
                .or_default()
                .extend(kinds);
        }
        Ok(())
    }

    /// Freezes the accumulated entries.
    #[must_use]
    pub fn build(self) -> FeatureClassRegistry {
        FeatureClassRegistry {
            classes: self.classes,
        }
    }
}

/// Feature-class name to the generic kinds observed for it in any input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureClassRegistry {
    classes: BTreeMap<String, BTreeSet<GenericKind>>,
}

impl FeatureClassRegistry {
    /// Registers every dataset in order and freezes the result.
    ///
    /// # Errors
    ///
    /// Propagates the first registration failure.
    pub fn from_datasets(datasets: &mut [Box<dyn Dataset>]) -> Result<Self> {
        let mut builder = RegistryBuilder::new();
        for dataset in datasets.iter_mut() {
            builder.register(dataset.as_mut())?;
        }
        let registry = builder.build();
        info!(
            "Registered {} feature class(es), {} output layer(s)",
            registry.len(),
            registry.output_layer_count()
        );
        Ok(registry)
    }

    /// Kinds observed for `feature_class`, if it exists.
    #[must_use]
    pub fn kinds(&self, feature_class: &str) -> Option<&BTreeSet<GenericKind>> {
        self.classes.get(feature_class)
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<GenericKind>)> {
        self.classes.iter().map(|(name, kinds)| (name.as_str(), kinds))
    }

    /// Every (feature class, kind) pair, in name then kind order.
    pub fn output_layers(&self) -> impl Iterator<Item = (&str, GenericKind)> {
        self.iter()
            .flat_map(|(name, kinds)| kinds.iter().map(move |kind| (name, *kind)))
    }

    #[must_use]
    pub fn output_layer_count(&self) -> usize {
        self.classes.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartmerge_core_common::{Coord, Feature, Geometry, MemoryDataset, MemoryLayer};

    fn point() -> Feature {
        Feature::new().with_geometry(Geometry::point(Coord::xy(1.0, 1.0)))
    }

    fn line() -> Feature {
        Feature::new().with_geometry(Geometry::line_string(vec![
            Coord::xy(0.0, 0.0),
            Coord::xy(1.0, 1.0),
        ]))
    }

    fn area() -> Feature {
        Feature::new().with_geometry(Geometry::polygon(vec![vec![
            Coord::xy(0.0, 0.0),
            Coord::xy(1.0, 0.0),
            Coord::xy(0.0, 0.0),
        ]]))
    }

    fn datasets() -> Vec<Box<dyn Dataset>> {
        let a = MemoryDataset::new("A")
            .with_layer(MemoryLayer::new("DEPARE").with_feature(area()))
            .with_layer(MemoryLayer::new("LIGHTS").with_feature(point()))
            .with_layer(MemoryLayer::new("M_QUAL").with_feature(Feature::new()));
        let b = MemoryDataset::new("B")
            .with_layer(
                MemoryLayer::new("DEPARE")
                    .with_feature(line())
                    .with_feature(area()),
            )
            .with_layer(MemoryLayer::new("SOUNDG").with_feature(point()));
        vec![Box::new(a), Box::new(b)]
    }

    #[test]
    fn test_registry_is_union_of_layers() {
        let registry = FeatureClassRegistry::from_datasets(&mut datasets()).unwrap();

        let names: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["DEPARE", "LIGHTS", "M_QUAL", "SOUNDG"]);
        assert_eq!(
            registry.kinds("DEPARE").unwrap().iter().copied().collect::<Vec<_>>(),
            vec![GenericKind::Arc, GenericKind::Polygon]
        );
        assert!(registry.kinds("M_QUAL").unwrap().is_empty());
        assert!(registry.kinds("COALNE").is_none());
        assert_eq!(registry.output_layer_count(), 4);
    }

    #[test]
    fn test_registration_order_does_not_matter() {
        let forward = FeatureClassRegistry::from_datasets(&mut datasets()).unwrap();
        let mut reversed = datasets();
        reversed.reverse();
        let backward = FeatureClassRegistry::from_datasets(&mut reversed).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let mut inputs = datasets();
        let mut builder = RegistryBuilder::new();
        for dataset in &mut inputs {
            builder.register(dataset.as_mut()).unwrap();
        }
        let once = builder.clone().build();
        for dataset in &mut inputs {
            builder.register(dataset.as_mut()).unwrap();
        }
        assert_eq!(builder.build(), once);
    }

    #[test]
    fn test_output_layers_are_ordered() {
        let registry = FeatureClassRegistry::from_datasets(&mut datasets()).unwrap();
        let pairs: Vec<(&str, GenericKind)> = registry.output_layers().collect();
        assert_eq!(
            pairs,
            vec![
                ("DEPARE", GenericKind::Arc),
                ("DEPARE", GenericKind::Polygon),
                ("LIGHTS", GenericKind::Point),
                ("SOUNDG", GenericKind::Point),
            ]
        );
    }
}
