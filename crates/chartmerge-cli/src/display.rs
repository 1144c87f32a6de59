//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions
//! for presenting driver capabilities and run summaries.

use std::path::Path;

use tabled::{Table, Tabled};

use chartmerge_core::drivers::Driver;
use chartmerge_core::{MergeReport, ShiftReport};

/// Table row representation for displaying driver information.
#[derive(Tabled)]
pub struct DriverRow {
    /// Short identifier for the driver (e.g., `GeoJSON`, `S57`).
    #[tabled(rename = "Short Name")]
    pub short_name: String,
    /// Full descriptive name of the driver format.
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    /// Extension of discovered input files.
    #[tabled(rename = "Extension")]
    pub extension: String,
    /// Support status for reading input charts.
    #[tabled(rename = "Read")]
    pub read: String,
    /// Support status for writing merged artifacts.
    #[tabled(rename = "Write")]
    pub write: String,
}

/// Table row representation for one merged artifact.
#[derive(Tabled)]
pub struct ArtifactRow {
    #[tabled(rename = "Artifact")]
    pub artifact: String,
    #[tabled(rename = "Feature Class")]
    pub feature_class: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Sources")]
    pub sources: usize,
    #[tabled(rename = "Written")]
    pub written: u64,
    #[tabled(rename = "Skipped")]
    pub skipped: u64,
    #[tabled(rename = "Failed")]
    pub failed: usize,
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Display the driver registry in a formatted table.
pub fn display_drivers(drivers: &[Driver]) {
    println!("\nKnown Drivers ({} total):\n", drivers.len());

    let rows: Vec<DriverRow> = drivers
        .iter()
        .map(|d| DriverRow {
            short_name: d.short_name.to_string(),
            long_name: d.long_name.to_string(),
            extension: format!(".{}", d.extension),
            read: d.capabilities.read.as_str().to_string(),
            write: d.capabilities.write.as_str().to_string(),
        })
        .collect();

    println!("{}", Table::new(rows));
}

/// Display a merge summary: one row per artifact followed by any features
/// the destination refused.
pub fn display_merge_report(report: &MergeReport, dest_dir: &Path) {
    println!(
        "\nMerged {} feature(s) into {} artifact(s) in {}\n",
        report.features_written(),
        report.artifacts.len(),
        dest_dir.display()
    );

    if report.artifacts.is_empty() {
        println!("No feature class holds point, line or polygon geometries.");
        return;
    }

    let rows: Vec<ArtifactRow> = report
        .artifacts
        .iter()
        .map(|a| ArtifactRow {
            artifact: file_name(&a.path),
            feature_class: a.feature_class.clone(),
            kind: a.kind.to_string(),
            sources: a.contributors.len(),
            written: a.features_written,
            skipped: a.features_skipped,
            failed: a.failures.len(),
        })
        .collect();
    println!("{}", Table::new(rows));

    if report.failure_count() > 0 {
        println!("\n=== Failed Features ({}) ===", report.failure_count());
        for failure in report.failures() {
            println!("{failure}");
        }
    }
}

/// Display a shift summary.
pub fn display_shift_report(report: &ShiftReport) {
    println!(
        "\nShifted {} feature(s) of layer '{}' into {}",
        report.features_written,
        report.layer,
        report.destination.display()
    );
    if !report.geographic {
        println!("Note: the source does not have a geographic coordinate system.");
    }
    if !report.failures.is_empty() {
        println!("\n=== Failed Features ({}) ===", report.failures.len());
        for failure in &report.failures {
            println!("{failure}");
        }
    }
}
