//! Non-fatal findings recorded while processing one well.

use serde::Serialize;
use std::fmt;

/// Something about a well's data that was skipped, trimmed or could not be
/// scored. None of these stop the analysis of the well or of the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The screen crosses a layer the simulator printed no hydrograph for
    MissingHydrograph { layer: usize },
    /// A hydrograph id is registered but absent from the simulated output
    MissingSeries { layer: usize, hydrograph_id: u32 },
    /// Only one screen bound is known; the well depth rule was used instead
    PartialScreen {
        top: Option<f64>,
        bottom: Option<f64>,
    },
    InvertedScreen { top: f64, bottom: f64 },
    /// The screen top is above ground and was cut at the surface
    ScreenAboveGround { top: f64, ground_surface: f64 },
    /// The interval reaches below the deepest layer bottom
    BelowModelBase { bottom: f64, model_bottom: f64 },
    NoIntersectedLayers,
    /// Dates at which at least one intersected layer had no head
    IncompleteBlend { dates: usize },
    /// Fewer than two paired points, or constant observations
    Unscoreable { paired_points: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingHydrograph { layer } => {
                write!(f, "layer {layer} intersects the screen but has no hydrograph")
            }
            Diagnostic::MissingSeries {
                layer,
                hydrograph_id,
            } => write!(
                f,
                "hydrograph {hydrograph_id} (layer {layer}) not found in simulated output"
            ),
            Diagnostic::PartialScreen { top, bottom } => write!(
                f,
                "partial screen (top {top:?}, bottom {bottom:?}); using well depth"
            ),
            Diagnostic::InvertedScreen { top, bottom } => {
                write!(f, "screen top {top} is below screen bottom {bottom}")
            }
            Diagnostic::ScreenAboveGround {
                top,
                ground_surface,
            } => write!(
                f,
                "screen top {top} above ground surface {ground_surface}; trimmed"
            ),
            Diagnostic::BelowModelBase {
                bottom,
                model_bottom,
            } => write!(
                f,
                "interval bottom {bottom} is below the model base {model_bottom}"
            ),
            Diagnostic::NoIntersectedLayers => write!(f, "no layer intersects the screen"),
            Diagnostic::IncompleteBlend { dates } => {
                write!(f, "{dates} dates are missing heads for some layers")
            }
            Diagnostic::Unscoreable { paired_points } => {
                write!(f, "cannot score with {paired_points} paired points")
            }
        }
    }
}

/// Diagnostics collected for one well, logged as they are added.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn push(&mut self, well: &str, diagnostic: Diagnostic) {
        log::warn!("Well {}: {}", well, diagnostic);
        self.0.push(diagnostic);
    }

    pub fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, well: &str, diagnostics: I) {
        for diagnostic in diagnostics {
            self.push(well, diagnostic);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
