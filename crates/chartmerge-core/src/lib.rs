//! `chartmerge-core` is the core library of the `chartmerge` project, merging
//! many nautical chart datasets into normalized per-feature-class products.
//!
//! This crate includes:
//! - **Driver Registry**: A static registry of store formats and their capabilities.
//! - **Geometry Shifting**: Antimeridian-aware longitude renormalization into `[0, 360]`.
//! - **Classification**: Collapsing concrete geometry types into point, arc and polygon kinds.
//! - **Schema Unification**: Flat destination schemas without record-management fields.
//! - **Feature-Class Registry**: The union of layers and kinds across all inputs.
//! - **Merge Engine**: One artifact per (feature class, kind), with a per-feature failure report.
//!
//! The `operations` module exposes the end-to-end `merge` and `shift` runs consumed by the CLI.

pub mod classify;
pub mod config;
pub mod drivers;
pub mod error;
pub mod merge;
pub mod operations;
pub mod registry;
pub mod schema;
pub mod shift;

pub use classify::GenericKind;
pub use config::{MergeOptions, S57_OPTIONS_ENV, S57Options};
pub use error::{ChartMergeError, Result};
pub use merge::{ArtifactReport, FeatureCopyFailure, MergeEngine, MergeReport};
pub use operations::{MergeRequest, ShiftReport, ShiftRequest, merge_charts, shift_dataset};
pub use registry::FeatureClassRegistry;
pub use schema::{ExcludedFields, SchemaUnifier};
