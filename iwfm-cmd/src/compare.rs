//! Full comparison run: load inputs, analyse every matched well, export.

use crate::export::write_report;
use anyhow::Context;
use iwfm_calib::analysis::{run, AnalysisInputs};
use iwfm_model::casgem::ObservationDataset;
use iwfm_model::config::AnalysisConfig;
use iwfm_model::hydrograph::HydrographTable;
use iwfm_model::stratigraphy::{StratigraphyQuery, StratigraphyTable};
use iwfm_model::well::WellRegistry;
use log::info;
use std::path::{Path, PathBuf};

/// Input file locations for one comparison run.
pub struct CompareInputs<'a> {
    pub registry: &'a Path,
    pub observations: &'a Path,
    pub hydrographs: &'a [PathBuf],
    pub stratigraphy: Option<&'a Path>,
}

pub fn run_compare(
    inputs: &CompareInputs,
    output_dir: &Path,
    config: &AnalysisConfig,
) -> anyhow::Result<()> {
    let registry = WellRegistry::from_path(inputs.registry)
        .with_context(|| format!("reading well registry {}", inputs.registry.display()))?;
    let observations = ObservationDataset::from_path(inputs.observations, &config.observations)
        .with_context(|| format!("reading observations {}", inputs.observations.display()))?;

    let paths: Vec<&Path> = inputs.hydrographs.iter().map(PathBuf::as_path).collect();
    let hydrographs = HydrographTable::from_paths(&paths, &config.hydrograph, &config.time_suffix)
        .context("reading simulated hydrographs")?;

    let table = match inputs.stratigraphy {
        Some(path) => Some(
            StratigraphyTable::from_path(path)
                .with_context(|| format!("reading stratigraphy {}", path.display()))?,
        ),
        None => None,
    };
    let stratigraphy: &dyn StratigraphyQuery = match &table {
        Some(table) => table,
        None => &registry,
    };

    info!(
        "Comparing {} registry wells against {} observations",
        registry.wells().len(),
        observations.len()
    );
    let report = run(
        &AnalysisInputs {
            registry: &registry,
            hydrographs: &hydrographs,
            observations: &observations,
            stratigraphy,
        },
        config,
    );

    write_report(output_dir, &report)?;
    info!("Results written to {}", output_dir.display());
    Ok(())
}
