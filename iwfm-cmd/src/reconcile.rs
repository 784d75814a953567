//! Name matching between the well registry and an observation dataset.

use crate::export::write_reconciliation;
use anyhow::Context;
use iwfm_calib::reconcile::{model_wells_in, reconcile, stations_in};
use iwfm_model::casgem::ObservationDataset;
use iwfm_model::config::AnalysisConfig;
use iwfm_model::well::WellRegistry;
use log::info;
use std::fs::File;
use std::path::Path;

pub fn run_reconcile(
    registry_path: &Path,
    observations_path: &Path,
    output: &Path,
    config: &AnalysisConfig,
) -> anyhow::Result<()> {
    let registry = WellRegistry::from_path(registry_path)
        .with_context(|| format!("reading well registry {}", registry_path.display()))?;
    let observations = ObservationDataset::from_path(observations_path, &config.observations)
        .with_context(|| format!("reading observations {}", observations_path.display()))?;

    let reconciliation = reconcile(
        &model_wells_in(&registry),
        &stations_in(&observations),
        config.suffix_match_length,
    );

    let file = File::create(output)
        .with_context(|| format!("creating {}", output.display()))?;
    write_reconciliation(file, &reconciliation)?;
    info!("Reconciliation written to {}", output.display());
    Ok(())
}
