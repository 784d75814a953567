//! Analysis configuration.
//!
//! Every file-format flag, column name and numeric knob the analysis uses
//! lives here so nothing in the parsers or the calibration core is
//! hard-coded. Values come from [`AnalysisConfig::default`] or a JSON file;
//! missing keys fall back to their defaults.

use crate::error::{IwfmError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Header flags that locate sections of an IWFM groundwater hydrograph file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrographFlags {
    pub hydrograph_id: String,
    pub layer: String,
    pub node: String,
    pub element: String,
    /// Column heading on the last header line; time steps follow it
    pub time: String,
}

impl Default for HydrographFlags {
    fn default() -> Self {
        HydrographFlags {
            hydrograph_id: "HYDROGRAPH ID".to_string(),
            layer: "LAYER".to_string(),
            node: "NODE".to_string(),
            element: "ELEMENT".to_string(),
            time: "TIME".to_string(),
        }
    }
}

/// Column names of the external groundwater-elevation dataset (CASGEM
/// `GroundwaterElevation.csv` by default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationColumns {
    pub primary_id: String,
    pub alternate_id: String,
    pub date: String,
    pub value: String,
    /// Formats tried in order against the date cell once its time suffix is dropped
    pub date_formats: Vec<String>,
}

impl Default for ObservationColumns {
    fn default() -> Self {
        ObservationColumns {
            primary_id: "SWN".to_string(),
            alternate_id: "WELL_NAME".to_string(),
            date: "MSMT_DATE".to_string(),
            value: "WSE".to_string(),
            date_formats: vec![
                "%Y/%m/%d".to_string(),
                "%Y-%m-%d".to_string(),
                "%m/%d/%Y".to_string(),
            ],
        }
    }
}

/// Top-level configuration passed to every parser and to the analysis driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub hydrograph: HydrographFlags,
    pub observations: ObservationColumns,
    /// Time-of-day suffix on IWFM time stamps
    pub time_suffix: String,
    /// Length of a state well number carrying the base-and-meridian character
    pub suffix_match_length: usize,
    /// Multiplier converting well coordinates into stratigraphy-table units
    pub unit_factor: f64,
    /// Overlaps at or below this length do not count as intersecting
    pub boundary_tolerance: f64,
    /// Also score the pooled set of all compared wells
    pub pooled_score: bool,
    /// Optional `(start, end)` IWFM time stamps overriding the hydrograph file period
    pub simulation_period: Option<(String, String)>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            hydrograph: HydrographFlags::default(),
            observations: ObservationColumns::default(),
            time_suffix: iwfm_utils::dates::IWFM_TIME_SUFFIX.to_string(),
            suffix_match_length: 13,
            unit_factor: 1.0,
            boundary_tolerance: 0.0,
            pooled_score: true,
            simulation_period: None,
        }
    }
}

impl AnalysisConfig {
    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject numeric knobs the analysis cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.boundary_tolerance.is_finite() || self.boundary_tolerance < 0.0 {
            return Err(IwfmError::InvalidFormat(format!(
                "boundary_tolerance must be a non-negative length, got {}",
                self.boundary_tolerance
            )));
        }
        if !self.unit_factor.is_finite() || self.unit_factor <= 0.0 {
            return Err(IwfmError::InvalidFormat(format!(
                "unit_factor must be positive, got {}",
                self.unit_factor
            )));
        }
        Ok(())
    }

    /// Read a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.time_suffix, "_24:00");
        assert_eq!(config.suffix_match_length, 13);
        assert_eq!(config.observations.primary_id, "SWN");
        assert_eq!(config.hydrograph.hydrograph_id, "HYDROGRAPH ID");
        assert!(config.pooled_score);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "unit_factor": 3.2808,
            "observations": { "primary_id": "STN_ID" },
            "simulation_period": ["10/31/1973_24:00", "09/30/2015_24:00"]
        }"#;
        let config = AnalysisConfig::from_json_str(json).unwrap();
        assert!((config.unit_factor - 3.2808).abs() < f64::EPSILON);
        assert_eq!(config.observations.primary_id, "STN_ID");
        assert_eq!(config.observations.value, "WSE");
        assert_eq!(config.hydrograph, HydrographFlags::default());
        assert_eq!(
            config.simulation_period,
            Some(("10/31/1973_24:00".to_string(), "09/30/2015_24:00".to_string()))
        );
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{ "boundary_tolerance": -1.0 }"#),
            Err(IwfmError::InvalidFormat(_))
        ));
        let config = AnalysisConfig {
            unit_factor: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(AnalysisConfig::from_json_str("{ unit_factor: }").is_err());
    }
}
