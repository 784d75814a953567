//! Blending per-layer simulated heads into one weighted hydrograph.

use crate::intersect::LayerWeights;
use chrono::NaiveDate;
use iwfm_model::hydrograph::HydrographTable;
use iwfm_model::time_spec::SimulationPeriod;
use iwfm_model::well::HydrographId;
use std::collections::BTreeMap;

/// One date of the wide table.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedRow {
    pub date: NaiveDate,
    /// Heads in the order of [`BlendedHydrograph::layers`]
    pub heads: Vec<Option<f64>>,
    /// Σ weight × head over the layers with a head at this date
    pub average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlendedHydrograph {
    pub layers: Vec<usize>,
    pub rows: Vec<BlendedRow>,
    /// Whether the average is a distinct series worth reporting: more than
    /// one layer but not every layer of the model.
    pub report_average: bool,
}

impl BlendedHydrograph {
    /// The series compared against observations. With a single layer this
    /// is that layer's heads.
    pub fn comparison_series(&self) -> Vec<(NaiveDate, f64)> {
        self.rows
            .iter()
            .filter_map(|row| row.average.map(|value| (row.date, value)))
            .collect()
    }

    /// Drop rows outside the simulated period.
    pub fn clip(&mut self, period: &SimulationPeriod) {
        self.rows.retain(|row| period.contains(&row.date));
    }

    /// Dates where some intersected layer had no head.
    pub fn incomplete_dates(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.heads.iter().any(Option::is_none))
            .count()
    }
}

/// Reshape the intersected layers' series into one row per date and add
/// the weighted average.
///
/// `hydrographs` maps layers to the well's hydrograph ids; a layer whose
/// series is absent from `table` leaves its column empty.
pub fn blend(
    weights: &LayerWeights,
    hydrographs: &BTreeMap<usize, HydrographId>,
    table: &HydrographTable,
    total_layers: usize,
) -> BlendedHydrograph {
    let layers = weights.layers();
    let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for (column, layer) in layers.iter().enumerate() {
        let Some(series) = hydrographs.get(layer).and_then(|id| table.get(id)) else {
            continue;
        };
        for &(date, head) in &series.heads {
            by_date.entry(date).or_insert_with(|| vec![None; layers.len()])[column] = Some(head);
        }
    }

    let rows = by_date
        .into_iter()
        .map(|(date, heads)| {
            let average = weights
                .entries
                .iter()
                .zip(heads.iter())
                .filter_map(|(entry, head)| head.map(|h| entry.weight * h))
                .fold(None, |sum: Option<f64>, term| Some(sum.unwrap_or(0.0) + term));
            BlendedRow {
                date,
                heads,
                average,
            }
        })
        .collect();

    BlendedHydrograph {
        report_average: layers.len() > 1 && layers.len() < total_layers,
        layers,
        rows,
    }
}
