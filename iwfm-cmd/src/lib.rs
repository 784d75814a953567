//! Command implementations for the IWFM calibration CLI.
//!
//! `reconcile` only matches names; `compare` runs the full per-well
//! comparison and writes the result tables.

use anyhow::Context;
use clap::Subcommand;
use iwfm_model::config::AnalysisConfig;
use std::path::{Path, PathBuf};

pub mod compare;
pub mod export;
pub mod reconcile;

#[derive(Subcommand)]
pub enum Command {
    /// Match registry well names against an observation dataset
    Reconcile {
        /// Well registry CSV
        #[arg(short = 'w', long)]
        registry: PathBuf,

        /// Observation dataset CSV (may be gzipped)
        #[arg(short = 'o', long)]
        observations: PathBuf,

        /// Output path for the reconciliation CSV
        #[arg(short = 'r', long, default_value = "reconciliation.csv")]
        output: PathBuf,

        /// JSON analysis configuration
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,
    },

    /// Blend simulated hydrographs per well and score them against observations
    Compare {
        /// Well registry CSV
        #[arg(short = 'w', long)]
        registry: PathBuf,

        /// Observation dataset CSV (may be gzipped)
        #[arg(short = 'o', long)]
        observations: PathBuf,

        /// IWFM groundwater hydrograph output files
        #[arg(short = 'g', long = "hydrographs", required = true, num_args = 1..)]
        hydrographs: Vec<PathBuf>,

        /// Stratigraphy CSV; the registry's own elevations are used when absent
        #[arg(short = 's', long)]
        stratigraphy: Option<PathBuf>,

        /// Directory receiving per-well tables, statistics and diagnostics
        #[arg(short = 'd', long, default_value = "calibration")]
        output_dir: PathBuf,

        /// JSON analysis configuration
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Multiplier from well coordinates to stratigraphy units
        #[arg(long)]
        unit_factor: Option<f64>,

        /// Overlaps at or below this length do not count
        #[arg(long)]
        boundary_tolerance: Option<f64>,

        /// Skip the pooled statistic over all wells
        #[arg(long)]
        no_pooled: bool,
    },
}

/// Configuration from `path`, or the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("reading configuration {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Reconcile {
            registry,
            observations,
            output,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            reconcile::run_reconcile(&registry, &observations, &output, &config)
        }
        Command::Compare {
            registry,
            observations,
            hydrographs,
            stratigraphy,
            output_dir,
            config,
            unit_factor,
            boundary_tolerance,
            no_pooled,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(factor) = unit_factor {
                config.unit_factor = factor;
            }
            if let Some(tolerance) = boundary_tolerance {
                config.boundary_tolerance = tolerance;
            }
            if no_pooled {
                config.pooled_score = false;
            }
            config.validate().context("invalid analysis options")?;
            let inputs = compare::CompareInputs {
                registry: &registry,
                observations: &observations,
                hydrographs: &hydrographs,
                stratigraphy: stratigraphy.as_deref(),
            };
            compare::run_compare(&inputs, &output_dir, &config)
        }
    }
}
