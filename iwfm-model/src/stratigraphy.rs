//! Layer stratigraphy at a point and the query interface used to obtain it.

use crate::error::{IwfmError, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Planar model coordinates of a well or a stratigraphy sample.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Location { x, y }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Location::new(self.x * factor, self.y * factor)
    }

    fn distance_squared(&self, other: &Location) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }
}

/// Ground surface and layer bottom elevations at one location.
///
/// Layers are numbered from 1 at the surface. Layer `k` is bounded above by
/// the bottom of layer `k - 1` (the ground surface for layer 1) and below by
/// its own bottom. Boundaries strictly decrease with depth.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LayerStratigraphy {
    ground_surface: f64,
    bottoms: Vec<f64>,
}

impl LayerStratigraphy {
    pub fn new(ground_surface: f64, bottoms: Vec<f64>) -> Result<Self> {
        if bottoms.is_empty() {
            return Err(IwfmError::InvalidStratigraphy(
                "at least one layer bottom is required".to_string(),
            ));
        }
        if !ground_surface.is_finite() || bottoms.iter().any(|b| !b.is_finite()) {
            return Err(IwfmError::InvalidStratigraphy(format!(
                "non-finite elevation in {ground_surface} / {bottoms:?}"
            )));
        }
        let mut upper = ground_surface;
        for (index, &bottom) in bottoms.iter().enumerate() {
            if bottom >= upper {
                return Err(IwfmError::InvalidStratigraphy(format!(
                    "layer {} bottom {} is not below its top {}",
                    index + 1,
                    bottom,
                    upper
                )));
            }
            upper = bottom;
        }
        Ok(LayerStratigraphy {
            ground_surface,
            bottoms,
        })
    }

    /// Build from a `(ground surface, layer 1 bottom, …, layer N bottom)` vector,
    /// the shape returned by the model engine.
    pub fn from_elevations(elevations: &[f64]) -> Result<Self> {
        match elevations.split_first() {
            Some((gse, bottoms)) => Self::new(*gse, bottoms.to_vec()),
            None => Err(IwfmError::InvalidStratigraphy(
                "empty elevation vector".to_string(),
            )),
        }
    }

    pub fn ground_surface(&self) -> f64 {
        self.ground_surface
    }

    pub fn layer_count(&self) -> usize {
        self.bottoms.len()
    }

    pub fn bottoms(&self) -> &[f64] {
        &self.bottoms
    }

    /// Top elevation of 1-based `layer`.
    pub fn layer_top(&self, layer: usize) -> f64 {
        if layer <= 1 {
            self.ground_surface
        } else {
            self.bottoms[layer - 2]
        }
    }

    /// Bottom elevation of 1-based `layer`.
    pub fn layer_bottom(&self, layer: usize) -> f64 {
        self.bottoms[layer - 1]
    }

    pub fn thickness(&self, layer: usize) -> f64 {
        self.layer_top(layer) - self.layer_bottom(layer)
    }

    /// Ground surface to the bottom of the deepest layer.
    pub fn total_depth(&self) -> f64 {
        self.ground_surface - self.bottoms[self.bottoms.len() - 1]
    }

    /// Iterate `(layer, top, bottom)` from the surface down.
    pub fn layers(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        (1..=self.layer_count()).map(|k| (k, self.layer_top(k), self.layer_bottom(k)))
    }
}

/// Source of stratigraphy at arbitrary coordinates.
///
/// `unit_factor` converts the query coordinates into the units of the
/// underlying model before the lookup.
pub trait StratigraphyQuery {
    fn stratigraphy_at(&self, location: Location, unit_factor: f64) -> Result<LayerStratigraphy>;
}

/// Tabulated stratigraphy samples answered by nearest-neighbour lookup.
///
/// Expected CSV columns (with headers): `x, y, gse, lay_1_bot, …, lay_N_bot`
#[derive(Debug, Clone, Default)]
pub struct StratigraphyTable {
    samples: Vec<(Location, LayerStratigraphy)>,
}

impl StratigraphyTable {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| IwfmError::MissingColumn(name.to_string()))
        };
        let x_col = column("x")?;
        let y_col = column("y")?;
        let gse_col = column("gse")?;
        let layer_cols = layer_bottom_columns(&headers)?;

        let mut samples = Vec::new();
        for row in rdr.records() {
            let record = row?;
            let number = |index: usize| -> Result<f64> {
                let cell = record.get(index).unwrap_or("");
                cell.parse::<f64>().map_err(|e| {
                    IwfmError::InvalidFormat(format!("stratigraphy cell {cell:?}: {e}"))
                })
            };
            let location = Location::new(number(x_col)?, number(y_col)?);
            let bottoms = layer_cols
                .iter()
                .map(|&index| number(index))
                .collect::<Result<Vec<f64>>>()?;
            samples.push((location, LayerStratigraphy::new(number(gse_col)?, bottoms)?));
        }
        log::info!("Loaded {} stratigraphy samples", samples.len());
        Ok(StratigraphyTable { samples })
    }

    pub fn from_csv_str(csv_object: &str) -> Result<Self> {
        Self::from_reader(csv_object.as_bytes())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_reader(std::fs::File::open(path)?)
    }
}

impl StratigraphyQuery for StratigraphyTable {
    fn stratigraphy_at(&self, location: Location, unit_factor: f64) -> Result<LayerStratigraphy> {
        let target = location.scaled(unit_factor);
        self.samples
            .iter()
            .min_by(|(a, _), (b, _)| {
                a.distance_squared(&target)
                    .total_cmp(&b.distance_squared(&target))
            })
            .map(|(_, stratigraphy)| stratigraphy.clone())
            .ok_or(IwfmError::StratigraphyNotFound {
                x: target.x,
                y: target.y,
            })
    }
}

/// Indices of the `lay_<k>_bot` columns ordered by `k`, which must run 1..=N.
pub(crate) fn layer_bottom_columns(headers: &csv::StringRecord) -> Result<Vec<usize>> {
    let mut columns: Vec<(usize, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(index, header)| {
            let lowered = header.trim().to_ascii_lowercase();
            lowered
                .strip_prefix("lay_")
                .and_then(|rest| rest.strip_suffix("_bot"))
                .and_then(|k| k.parse::<usize>().ok())
                .map(|k| (k, index))
        })
        .collect();
    columns.sort();
    for (expected, (k, _)) in (1..).zip(columns.iter()) {
        if *k != expected {
            return Err(IwfmError::MissingColumn(format!("lay_{expected}_bot")));
        }
    }
    Ok(columns.into_iter().map(|(_, index)| index).collect())
}
