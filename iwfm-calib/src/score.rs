//! Goodness of fit between observed and simulated heads.

use serde::Serialize;

/// Coefficient of determination `1 - SS_res / SS_tot` over
/// `(observed, simulated)` pairs.
///
/// Undefined, and `None`, with fewer than two pairs or when every observed
/// value is the same.
pub fn r_squared(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let mean = pairs.iter().map(|(observed, _)| observed).sum::<f64>() / pairs.len() as f64;
    let ss_tot: f64 = pairs
        .iter()
        .map(|(observed, _)| (observed - mean).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return None;
    }
    let ss_res: f64 = pairs
        .iter()
        .map(|(observed, simulated)| (observed - simulated).powi(2))
        .sum();
    Some(1.0 - ss_res / ss_tot)
}

/// Fit of one well, or of every compared well pooled together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitStatistics {
    pub name: String,
    pub layers: Vec<usize>,
    pub paired_points: usize,
    pub r_squared: Option<f64>,
}

impl FitStatistics {
    pub fn from_pairs(name: &str, layers: Vec<usize>, pairs: &[(f64, f64)]) -> Self {
        FitStatistics {
            name: name.to_string(),
            layers,
            paired_points: pairs.len(),
            r_squared: r_squared(pairs),
        }
    }

    pub fn is_scored(&self) -> bool {
        self.r_squared.is_some()
    }
}
