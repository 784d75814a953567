//! Calibration core for IWFM groundwater wells.
//!
//! Matches model wells to observation stations, weights the model layers a
//! well screen crosses, blends per-layer heads and scores the blended
//! series against measured elevations month by month.

pub mod align;
pub mod analysis;
pub mod blend;
pub mod diagnostics;
pub mod intersect;
pub mod reconcile;
pub mod score;
