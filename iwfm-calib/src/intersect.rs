//! Which model layers a well screen crosses, and how much of the screen
//! falls in each.

use crate::diagnostics::Diagnostic;
use iwfm_model::stratigraphy::LayerStratigraphy;
use iwfm_model::well::{HydrographId, ScreenInterval};
use serde::Serialize;
use std::collections::BTreeMap;

/// The interval the weights were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightBasis {
    /// Known screen top and bottom
    Screen,
    /// Ground surface down to the well depth
    WellDepth,
    /// Every layer of the model column
    FullColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerWeight {
    /// 1-based model layer
    pub layer: usize,
    /// Length of the effective interval inside the layer
    pub overlap: f64,
    pub weight: f64,
}

/// Intersected layers from the surface down. Weights sum to 1 unless empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerWeights {
    pub basis: WeightBasis,
    pub entries: Vec<LayerWeight>,
}

impl LayerWeights {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn layers(&self) -> Vec<usize> {
        self.entries.iter().map(|entry| entry.layer).collect()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectOptions {
    /// Overlaps at or below this length are dropped. With the default of
    /// zero a layer that only touches the interval at a boundary is out.
    /// Negative values count as zero.
    pub boundary_tolerance: f64,
}

impl Default for IntersectOptions {
    fn default() -> Self {
        IntersectOptions {
            boundary_tolerance: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub weights: LayerWeights,
    pub diagnostics: Vec<Diagnostic>,
}

/// Weight the layers of `stratigraphy` by their overlap with the well's
/// effective interval.
///
/// The interval is the screen when both bounds are known (its top cut at
/// the ground surface), otherwise the ground surface down to `well_depth`,
/// otherwise the whole column. Layers missing from `hydrographs` are left
/// out and the remaining overlaps are normalized to sum to 1.
pub fn intersect(
    screen: &ScreenInterval,
    well_depth: Option<f64>,
    stratigraphy: &LayerStratigraphy,
    hydrographs: &BTreeMap<usize, HydrographId>,
    options: &IntersectOptions,
) -> Intersection {
    let ground = stratigraphy.ground_surface();
    let mut diagnostics = Vec::new();

    let (basis, interval) = match screen.bounds() {
        Some((top, bottom)) => {
            if top < bottom {
                diagnostics.push(Diagnostic::InvertedScreen { top, bottom });
            }
            if top > ground {
                diagnostics.push(Diagnostic::ScreenAboveGround {
                    top,
                    ground_surface: ground,
                });
            }
            (WeightBasis::Screen, Some((top.min(ground), bottom)))
        }
        None => {
            if !screen.is_unknown() {
                diagnostics.push(Diagnostic::PartialScreen {
                    top: screen.top,
                    bottom: screen.bottom,
                });
            }
            match well_depth {
                Some(depth) => (WeightBasis::WellDepth, Some((ground, ground - depth))),
                None => (WeightBasis::FullColumn, None),
            }
        }
    };

    let model_bottom = stratigraphy.layer_bottom(stratigraphy.layer_count());
    if let Some((_, bottom)) = interval {
        if bottom < model_bottom {
            diagnostics.push(Diagnostic::BelowModelBase {
                bottom,
                model_bottom,
            });
        }
    }

    let tolerance = options.boundary_tolerance.max(0.0);
    let mut entries = Vec::new();
    for (layer, top, bottom) in stratigraphy.layers() {
        let overlap = match interval {
            Some((effective_top, effective_bottom)) => {
                top.min(effective_top) - bottom.max(effective_bottom)
            }
            None => top - bottom,
        };
        if overlap <= tolerance {
            continue;
        }
        if !hydrographs.contains_key(&layer) {
            diagnostics.push(Diagnostic::MissingHydrograph { layer });
            continue;
        }
        entries.push(LayerWeight {
            layer,
            overlap,
            weight: 0.0,
        });
    }

    let total: f64 = entries.iter().map(|entry| entry.overlap).sum();
    if total > 0.0 {
        for entry in entries.iter_mut() {
            entry.weight = entry.overlap / total;
        }
    }
    if entries.is_empty() {
        diagnostics.push(Diagnostic::NoIntersectedLayers);
    }

    Intersection {
        weights: LayerWeights { basis, entries },
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_layers() -> LayerStratigraphy {
        LayerStratigraphy::new(150.0, vec![120.0, 80.0, 40.0, 0.0]).unwrap()
    }

    fn all_hydrographs(layers: usize) -> BTreeMap<usize, HydrographId> {
        (1..=layers).map(|k| (k, HydrographId(k as u32))).collect()
    }

    fn run(screen: ScreenInterval, depth: Option<f64>) -> Intersection {
        intersect(
            &screen,
            depth,
            &four_layers(),
            &all_hydrographs(4),
            &IntersectOptions::default(),
        )
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn test_screen_across_two_layers() {
        let result = run(ScreenInterval::new(100.0, 60.0), None);
        let weights = result.weights;
        assert_eq!(weights.basis, WeightBasis::Screen);
        assert_eq!(weights.layers(), vec![2, 3]);
        assert_close(weights.entries[0].overlap, 20.0);
        assert_close(weights.entries[1].overlap, 20.0);
        assert_close(weights.entries[0].weight, 0.5);
        assert_close(weights.entries[1].weight, 0.5);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_screen_inside_one_layer() {
        let result = run(ScreenInterval::new(75.0, 45.0), None);
        assert_eq!(result.weights.layers(), vec![3]);
        assert_close(result.weights.entries[0].weight, 1.0);
        assert_close(result.weights.entries[0].overlap, 30.0);
    }

    #[test]
    fn test_unknown_screen_and_depth_uses_thickness() {
        let result = run(ScreenInterval::unknown(), None);
        let weights = result.weights;
        assert_eq!(weights.basis, WeightBasis::FullColumn);
        assert_eq!(weights.layers(), vec![1, 2, 3, 4]);
        let expected = [30.0 / 150.0, 40.0 / 150.0, 40.0 / 150.0, 40.0 / 150.0];
        for (entry, want) in weights.entries.iter().zip(expected) {
            assert_close(entry.weight, want);
        }
        assert_close(weights.total_weight(), 1.0);
    }

    #[test]
    fn test_unknown_screen_known_depth() {
        let result = run(ScreenInterval::unknown(), Some(90.0));
        let weights = result.weights;
        assert_eq!(weights.basis, WeightBasis::WellDepth);
        assert_eq!(weights.layers(), vec![1, 2, 3]);
        assert_close(weights.entries[0].weight, 30.0 / 90.0);
        assert_close(weights.entries[2].overlap, 20.0);
        assert_close(weights.total_weight(), 1.0);
    }

    #[test]
    fn test_boundary_touch_is_excluded() {
        // Screen ends exactly on the layer 1/2 boundary
        let result = run(ScreenInterval::new(140.0, 120.0), None);
        assert_eq!(result.weights.layers(), vec![1]);

        let tolerant = intersect(
            &ScreenInterval::new(140.0, 119.5),
            None,
            &four_layers(),
            &all_hydrographs(4),
            &IntersectOptions {
                boundary_tolerance: 1.0,
            },
        );
        assert_eq!(tolerant.weights.layers(), vec![1]);
    }

    #[test]
    fn test_negative_tolerance_counts_as_zero() {
        let result = intersect(
            &ScreenInterval::new(120.0, 120.0),
            None,
            &four_layers(),
            &all_hydrographs(4),
            &IntersectOptions {
                boundary_tolerance: -1.0,
            },
        );
        assert!(result.weights.is_empty());
        assert!(result.weights.entries.iter().all(|entry| entry.weight.is_finite()));
        assert!(result.diagnostics.contains(&Diagnostic::NoIntersectedLayers));
    }

    #[test]
    fn test_screen_top_cut_at_ground() {
        let result = run(ScreenInterval::new(170.0, 130.0), None);
        assert_eq!(result.weights.layers(), vec![1]);
        assert_close(result.weights.entries[0].overlap, 20.0);
        assert!(matches!(
            result.diagnostics[0],
            Diagnostic::ScreenAboveGround { .. }
        ));
    }

    #[test]
    fn test_missing_hydrograph_layer_is_skipped() {
        let mut hydrographs = all_hydrographs(4);
        hydrographs.remove(&3);
        let result = intersect(
            &ScreenInterval::new(100.0, 60.0),
            None,
            &four_layers(),
            &hydrographs,
            &IntersectOptions::default(),
        );
        assert_eq!(result.weights.layers(), vec![2]);
        assert_close(result.weights.entries[0].weight, 1.0);
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::MissingHydrograph { layer: 3 }]
        );
    }

    #[test]
    fn test_inverted_screen_yields_no_layers() {
        let result = run(ScreenInterval::new(60.0, 100.0), None);
        assert!(result.weights.is_empty());
        assert_eq!(
            result.diagnostics,
            vec![
                Diagnostic::InvertedScreen {
                    top: 60.0,
                    bottom: 100.0
                },
                Diagnostic::NoIntersectedLayers
            ]
        );
    }

    #[test]
    fn test_depth_below_model_base() {
        let result = run(ScreenInterval::unknown(), Some(200.0));
        assert_eq!(result.weights.len(), 4);
        assert_close(result.weights.total_weight(), 1.0);
        assert!(result.diagnostics.contains(&Diagnostic::BelowModelBase {
            bottom: -50.0,
            model_bottom: 0.0
        }));
    }

    #[test]
    fn test_partial_screen_falls_back_to_depth() {
        let screen = ScreenInterval {
            top: Some(100.0),
            bottom: None,
        };
        let result = run(screen, Some(50.0));
        assert_eq!(result.weights.basis, WeightBasis::WellDepth);
        assert_eq!(result.weights.layers(), vec![1, 2]);
        assert!(matches!(
            result.diagnostics[0],
            Diagnostic::PartialScreen { .. }
        ));
    }
}
