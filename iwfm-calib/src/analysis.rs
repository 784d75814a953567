//! Batch comparison of every matched well.
//!
//! Reconciliation runs once for the whole registry; each matched well is
//! then intersected, blended, clipped to the simulated period, aligned with
//! its observations and scored on its own. A well that cannot be processed
//! is recorded as failed and the run moves on.

use crate::align::{align, AlignedTable};
use crate::blend::blend;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::intersect::{intersect, IntersectOptions, LayerWeights};
use crate::reconcile::{model_wells_in, reconcile, stations_in, Reconciliation};
use crate::score::FitStatistics;
use iwfm_model::casgem::{ObservationDataset, ObservationRecord};
use iwfm_model::config::AnalysisConfig;
use iwfm_model::hydrograph::HydrographTable;
use iwfm_model::stratigraphy::StratigraphyQuery;
use iwfm_model::time_spec::{FixedTimeSpec, SimulationPeriod};
use iwfm_model::well::{Well, WellRegistry};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

/// Label of the statistics row covering all compared wells.
pub const POOLED_NAME: &str = "POOLED";

/// Everything the analysis reads, loaded up front.
pub struct AnalysisInputs<'a> {
    pub registry: &'a WellRegistry,
    pub hydrographs: &'a HydrographTable,
    pub observations: &'a ObservationDataset,
    pub stratigraphy: &'a dyn StratigraphyQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellComparison {
    pub name: String,
    pub external_id: String,
    pub weights: LayerWeights,
    pub table: AlignedTable,
    pub statistics: FitStatistics,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WellOutcome {
    Compared(WellComparison),
    Failed { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub reconciliation: Reconciliation,
    pub period: Option<SimulationPeriod>,
    /// One outcome per matched well, in registry order
    pub wells: Vec<WellOutcome>,
    pub pooled: Option<FitStatistics>,
}

impl AnalysisReport {
    pub fn compared(&self) -> impl Iterator<Item = &WellComparison> {
        self.wells.iter().filter_map(|outcome| match outcome {
            WellOutcome::Compared(comparison) => Some(comparison),
            WellOutcome::Failed { .. } => None,
        })
    }

    /// Statistics of wells with a defined R²; unscoreable wells are left out.
    pub fn scored(&self) -> impl Iterator<Item = &FitStatistics> {
        self.compared()
            .map(|comparison| &comparison.statistics)
            .filter(|statistics| statistics.is_scored())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.wells.iter().filter_map(|outcome| match outcome {
            WellOutcome::Failed { name, reason } => Some((name.as_str(), reason.as_str())),
            WellOutcome::Compared(_) => None,
        })
    }
}

/// Simulated period from the configured override, or from the hydrograph
/// table itself.
pub fn simulation_period(
    hydrographs: &HydrographTable,
    config: &AnalysisConfig,
) -> iwfm_model::error::Result<SimulationPeriod> {
    match &config.simulation_period {
        Some((start, end)) => {
            SimulationPeriod::from_query(&FixedTimeSpec::new(start, end), &config.time_suffix)
        }
        None => SimulationPeriod::from_query(hydrographs, &config.time_suffix),
    }
}

/// Observation rows grouped by the model well their identifiers resolve to.
fn observations_by_well<'a>(
    dataset: &'a ObservationDataset,
    reconciliation: &Reconciliation,
) -> HashMap<String, Vec<&'a ObservationRecord>> {
    let mut grouped: HashMap<String, Vec<&ObservationRecord>> = HashMap::new();
    for record in dataset.records() {
        let resolved = reconciliation.resolve(&record.primary_id).or_else(|| {
            record
                .alternate_id
                .as_deref()
                .and_then(|alternate| reconciliation.resolve(alternate))
        });
        if let Some(name) = resolved {
            grouped.entry(name.to_string()).or_default().push(record);
        }
    }
    grouped
}

fn compare_well(
    well: &Well,
    external_id: &str,
    observations: &[&ObservationRecord],
    inputs: &AnalysisInputs,
    config: &AnalysisConfig,
    period: Option<&SimulationPeriod>,
) -> Result<WellComparison, String> {
    if well.hydrographs.is_empty() {
        return Err("no hydrographs registered".to_string());
    }
    let stratigraphy = inputs
        .stratigraphy
        .stratigraphy_at(well.location, config.unit_factor)
        .map_err(|e| e.to_string())?;

    let mut diagnostics = Diagnostics::default();
    let mut available = BTreeMap::new();
    for (&layer, &id) in &well.hydrographs {
        if inputs.hydrographs.get(&id).is_some() {
            available.insert(layer, id);
        } else {
            diagnostics.push(
                &well.name,
                Diagnostic::MissingSeries {
                    layer,
                    hydrograph_id: id.0,
                },
            );
        }
    }

    let options = IntersectOptions {
        boundary_tolerance: config.boundary_tolerance,
    };
    let intersection = intersect(
        &well.screen,
        well.well_depth,
        &stratigraphy,
        &available,
        &options,
    );
    diagnostics.extend(&well.name, intersection.diagnostics);
    let weights = intersection.weights;

    let mut blended = blend(
        &weights,
        &available,
        inputs.hydrographs,
        stratigraphy.layer_count(),
    );
    if let Some(period) = period {
        blended.clip(period);
    }
    let incomplete = blended.incomplete_dates();
    if incomplete > 0 {
        diagnostics.push(&well.name, Diagnostic::IncompleteBlend { dates: incomplete });
    }

    let table = align(&blended, observations.iter().copied());
    let statistics = FitStatistics::from_pairs(&well.name, weights.layers(), &table.pairs());
    if !statistics.is_scored() {
        diagnostics.push(
            &well.name,
            Diagnostic::Unscoreable {
                paired_points: statistics.paired_points,
            },
        );
    }
    debug!(
        "Well {}: layers {:?}, {} pairs, R² {:?}",
        well.name, statistics.layers, statistics.paired_points, statistics.r_squared
    );

    Ok(WellComparison {
        name: well.name.clone(),
        external_id: external_id.to_string(),
        weights,
        table,
        statistics,
        diagnostics,
    })
}

/// Compare every registry well that has observations.
pub fn run(inputs: &AnalysisInputs, config: &AnalysisConfig) -> AnalysisReport {
    let reconciliation = reconcile(
        &model_wells_in(inputs.registry),
        &stations_in(inputs.observations),
        config.suffix_match_length,
    );

    let period = match simulation_period(inputs.hydrographs, config) {
        Ok(period) => Some(period),
        Err(e) => {
            warn!("Simulation period unavailable, dates are not clipped: {}", e);
            None
        }
    };

    let grouped = observations_by_well(inputs.observations, &reconciliation);
    let mut wells = Vec::new();
    for pair in reconciliation.matched() {
        let Some(well) = inputs.registry.get(&pair.model_name) else {
            continue;
        };
        let observations = grouped
            .get(&pair.model_name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let outcome = match compare_well(
            well,
            &pair.external_id,
            observations,
            inputs,
            config,
            period.as_ref(),
        ) {
            Ok(comparison) => WellOutcome::Compared(comparison),
            Err(reason) => {
                warn!("Well {} skipped: {}", well.name, reason);
                WellOutcome::Failed {
                    name: well.name.clone(),
                    reason,
                }
            }
        };
        wells.push(outcome);
    }

    let pooled = config.pooled_score.then(|| {
        let pairs: Vec<(f64, f64)> = wells
            .iter()
            .filter_map(|outcome| match outcome {
                WellOutcome::Compared(comparison) => Some(comparison.table.pairs()),
                WellOutcome::Failed { .. } => None,
            })
            .flatten()
            .collect();
        FitStatistics::from_pairs(POOLED_NAME, Vec::new(), &pairs)
    });

    let report = AnalysisReport {
        reconciliation,
        period,
        wells,
        pooled,
    };
    info!(
        "Compared {} wells, {} scored, {} failed",
        report.compared().count(),
        report.scored().count(),
        report.failures().count()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = "\
name,alt_name,hydrograph_id,layer,x,y,gse,lay_1_bot,lay_2_bot,lay_3_bot,lay_4_bot,screen_ref_elev,screen_top_depth,screen_bot_depth,well_depth
12N03E16A001,,7,2,6500,4200,150,120,80,40,0,150,50,90,
12N03E16A001,,8,3,6500,4200,150,120,80,40,0,150,50,90,
FAR AWAY,,9,1,99999,99999,,,,,,,,,
NO OBS,,10,1,6500,4200,150,120,80,40,0,,,,
";

    const GWHYD: &str = "\
*          HYDROGRAPH ID        7        8       10
*          LAYER                2        3        1
10/31/1973_24:00           100.0     90.0     50.0
11/30/1973_24:00           102.0     94.0     51.0
12/31/1973_24:00           104.0     96.0     52.0
01/31/1974_24:00           106.0     98.0     53.0
";

    const MEASUREMENTS: &str = "\
SWN,WELL_NAME,MSMT_DATE,WSE
12N03E16A001M,,1973/10/15 00:00:00,96.0
12N03E16A001M,,1973/11/15 00:00:00,97.0
12N03E16A001M,,1973/12/15 00:00:00,101.0
12N03E16A001M,,1974/02/15 00:00:00,110.0
far away,,1973/10/15,10.0
UNKNOWN,,1973/10/15,1.0
";

    struct Fixture {
        registry: WellRegistry,
        hydrographs: HydrographTable,
        observations: ObservationDataset,
    }

    impl Fixture {
        fn new() -> Self {
            let config = AnalysisConfig::default();
            Fixture {
                registry: WellRegistry::from_csv_str(REGISTRY).unwrap(),
                hydrographs: HydrographTable::parse(GWHYD, &config.hydrograph, &config.time_suffix)
                    .unwrap(),
                observations: ObservationDataset::from_csv_str(
                    MEASUREMENTS,
                    &config.observations,
                )
                .unwrap(),
            }
        }

        fn inputs(&self) -> AnalysisInputs<'_> {
            AnalysisInputs {
                registry: &self.registry,
                hydrographs: &self.hydrographs,
                observations: &self.observations,
                // Only registry rows carrying elevations answer
                stratigraphy: &self.registry,
            }
        }
    }

    #[test]
    fn test_end_to_end() {
        let fixture = Fixture::new();
        let report = run(&fixture.inputs(), &AnalysisConfig::default());

        assert_eq!(report.reconciliation.matched().len(), 2);
        assert_eq!(report.reconciliation.model_only(), &["NO OBS".to_string()]);
        assert_eq!(report.reconciliation.observation_only(), &["UNKNOWN".to_string()]);

        let comparison = report.compared().next().unwrap();
        assert_eq!(comparison.name, "12N03E16A001");
        assert_eq!(comparison.external_id, "12N03E16A001M");
        assert_eq!(comparison.weights.layers(), vec![2, 3]);
        assert!(comparison.table.report_average);
        // Sim rows 95, 98, 100, 102; February has no sim row
        assert_eq!(
            comparison.table.pairs(),
            vec![(96.0, 95.0), (97.0, 98.0), (101.0, 100.0)]
        );
        let r2 = comparison.statistics.r_squared.unwrap();
        // mean 98, SS_tot 14, SS_res 3
        assert!((r2 - (1.0 - 3.0 / 14.0)).abs() < 1e-12);
        assert!(comparison.diagnostics.is_empty());
    }

    #[test]
    fn test_registry_stratigraphy_with_unit_factor() {
        let fixture = Fixture::new();
        let config = AnalysisConfig {
            unit_factor: 3.2808,
            ..AnalysisConfig::default()
        };
        let report = run(&fixture.inputs(), &config);
        let comparison = report.compared().next().unwrap();
        assert_eq!(comparison.name, "12N03E16A001");
        assert_eq!(comparison.weights.layers(), vec![2, 3]);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_failed_well_does_not_stop_run() {
        let fixture = Fixture::new();
        let report = run(&fixture.inputs(), &AnalysisConfig::default());
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "FAR AWAY");
        assert_eq!(report.wells.len(), 2);
    }

    #[test]
    fn test_pooled_and_period_override() {
        let fixture = Fixture::new();
        let config = AnalysisConfig {
            simulation_period: Some(("11/01/1973_24:00".to_string(), "12/31/1973_24:00".to_string())),
            ..AnalysisConfig::default()
        };
        let report = run(&fixture.inputs(), &config);
        let comparison = report.compared().next().unwrap();
        assert_eq!(comparison.table.pairs(), vec![(97.0, 98.0), (101.0, 100.0)]);
        let pooled = report.pooled.unwrap();
        assert_eq!(pooled.name, POOLED_NAME);
        assert_eq!(pooled.paired_points, 2);

        let unpooled = run(
            &fixture.inputs(),
            &AnalysisConfig {
                pooled_score: false,
                ..AnalysisConfig::default()
            },
        );
        assert!(unpooled.pooled.is_none());
    }

    #[test]
    fn test_period_from_hydrograph_table() {
        let fixture = Fixture::new();
        let period = simulation_period(&fixture.hydrographs, &AnalysisConfig::default()).unwrap();
        assert_eq!(period.start, chrono::NaiveDate::from_ymd_opt(1973, 10, 31).unwrap());
        assert_eq!(period.end, chrono::NaiveDate::from_ymd_opt(1974, 1, 31).unwrap());
    }
}
