use crate::error::{IwfmError, Result};
use crate::stratigraphy::{layer_bottom_columns, LayerStratigraphy, Location, StratigraphyQuery};
use csv::{ReaderBuilder, StringRecord};
use iwfm_utils::cells::{non_blank, parse_optional_f64};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Identifier of one simulated hydrograph column in the IWFM output.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct HydrographId(pub u32);

impl fmt::Display for HydrographId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Screened interval of a well as elevations; either bound may be unknown.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScreenInterval {
    pub top: Option<f64>,
    pub bottom: Option<f64>,
}

impl ScreenInterval {
    pub fn new(top: f64, bottom: f64) -> Self {
        ScreenInterval {
            top: Some(top),
            bottom: Some(bottom),
        }
    }

    pub fn unknown() -> Self {
        ScreenInterval::default()
    }

    /// Both bounds, when both are known.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.top.zip(self.bottom)
    }

    pub fn is_unknown(&self) -> bool {
        self.top.is_none() && self.bottom.is_none()
    }
}

/// An observation well as registered in the simulation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Well {
    /// Canonical (model-side) name, usually the state well number
    pub name: String,
    pub alternate_names: Vec<String>,
    pub location: Location,
    pub screen: ScreenInterval,
    /// Depth below ground surface
    pub well_depth: Option<f64>,
    /// One hydrograph per model layer the simulator printed for this well
    pub hydrographs: BTreeMap<usize, HydrographId>,
    /// Ground surface followed by layer bottoms, when the registry carries them
    pub elevations: Option<Vec<f64>>,
}

/// Expected CSV columns (with headers), one row per (well, hydrograph):
///
/// `name, alt_name, hydrograph_id, layer, x, y, gse, lay_1_bot … lay_N_bot,
/// screen_ref_elev, screen_top_depth, screen_bot_depth, well_depth`
///
/// Only `name`, `hydrograph_id`, `layer`, `x` and `y` are required. Screen
/// elevations are `screen_ref_elev - depth`, with `gse` standing in for a
/// missing reference elevation.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct WellRegistry {
    wells: Vec<Well>,
}

struct RegistryColumns {
    name: usize,
    alt_name: Option<usize>,
    hydrograph_id: usize,
    layer: usize,
    x: usize,
    y: usize,
    gse: Option<usize>,
    layer_bottoms: Vec<usize>,
    screen_ref_elev: Option<usize>,
    screen_top_depth: Option<usize>,
    screen_bot_depth: Option<usize>,
    well_depth: Option<usize>,
}

impl RegistryColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let optional = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let required =
            |name: &str| optional(name).ok_or_else(|| IwfmError::MissingColumn(name.to_string()));
        Ok(RegistryColumns {
            name: required("name")?,
            alt_name: optional("alt_name"),
            hydrograph_id: required("hydrograph_id")?,
            layer: required("layer")?,
            x: required("x")?,
            y: required("y")?,
            gse: optional("gse"),
            layer_bottoms: layer_bottom_columns(headers)?,
            screen_ref_elev: optional("screen_ref_elev"),
            screen_top_depth: optional("screen_top_depth"),
            screen_bot_depth: optional("screen_bot_depth"),
            well_depth: optional("well_depth"),
        })
    }
}

fn cell(record: &StringRecord, index: Option<usize>) -> &str {
    index.and_then(|i| record.get(i)).unwrap_or("")
}

fn optional_number(record: &StringRecord, index: Option<usize>, line: u64) -> Result<Option<f64>> {
    let raw = cell(record, index);
    parse_optional_f64(raw)
        .map_err(|e| IwfmError::InvalidFormat(format!("registry line {line}: {raw:?}: {e}")))
}

fn required_number<T: std::str::FromStr>(record: &StringRecord, index: usize, line: u64) -> Result<T>
where
    T::Err: fmt::Display,
{
    let raw = cell(record, Some(index));
    raw.parse::<T>()
        .map_err(|e| IwfmError::InvalidFormat(format!("registry line {line}: {raw:?}: {e}")))
}

impl WellRegistry {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns = RegistryColumns::from_headers(rdr.headers()?)?;

        let mut wells: Vec<Well> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for row in rdr.records() {
            let record = row?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let Some(name) = non_blank(cell(&record, Some(columns.name))) else {
                warn!("Registry line {}: blank well name, row skipped", line);
                continue;
            };
            let hydrograph_id = HydrographId(required_number(&record, columns.hydrograph_id, line)?);
            let layer: usize = required_number(&record, columns.layer, line)?;

            let index = match by_name.get(name) {
                Some(&index) => index,
                None => {
                    let well = Self::well_from_record(name, &record, &columns, line)?;
                    wells.push(well);
                    by_name.insert(name.to_string(), wells.len() - 1);
                    wells.len() - 1
                }
            };
            let well = &mut wells[index];
            if let Some(alt) = non_blank(cell(&record, columns.alt_name)) {
                if alt != well.name && !well.alternate_names.iter().any(|a| a == alt) {
                    well.alternate_names.push(alt.to_string());
                }
            }
            if let Some(existing) = well.hydrographs.get(&layer) {
                warn!(
                    "Well {}: layer {} already has hydrograph {}, ignoring {}",
                    well.name, layer, existing, hydrograph_id
                );
            } else {
                well.hydrographs.insert(layer, hydrograph_id);
            }
        }
        debug!("Registry holds {} wells", wells.len());
        Ok(WellRegistry { wells })
    }

    fn well_from_record(
        name: &str,
        record: &StringRecord,
        columns: &RegistryColumns,
        line: u64,
    ) -> Result<Well> {
        let location = Location::new(
            required_number(record, columns.x, line)?,
            required_number(record, columns.y, line)?,
        );
        let gse = optional_number(record, columns.gse, line)?;
        let reference = optional_number(record, columns.screen_ref_elev, line)?.or(gse);
        let top_depth = optional_number(record, columns.screen_top_depth, line)?;
        let bottom_depth = optional_number(record, columns.screen_bot_depth, line)?;
        let screen = ScreenInterval {
            top: reference.zip(top_depth).map(|(r, d)| r - d),
            bottom: reference.zip(bottom_depth).map(|(r, d)| r - d),
        };
        let bottoms = columns
            .layer_bottoms
            .iter()
            .map(|&index| optional_number(record, Some(index), line))
            .collect::<Result<Option<Vec<f64>>>>()?;
        let elevations = match (gse, bottoms) {
            (Some(gse), Some(bottoms)) if !bottoms.is_empty() => {
                Some(std::iter::once(gse).chain(bottoms).collect())
            }
            _ => None,
        };
        Ok(Well {
            name: name.to_string(),
            alternate_names: Vec::new(),
            location,
            screen,
            well_depth: optional_number(record, columns.well_depth, line)?,
            hydrographs: BTreeMap::new(),
            elevations,
        })
    }

    pub fn from_csv_str(csv_object: &str) -> Result<Self> {
        Self::from_reader(csv_object.as_bytes())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    pub fn wells(&self) -> &[Well] {
        &self.wells
    }

    pub fn get(&self, name: &str) -> Option<&Well> {
        self.wells.iter().find(|well| well.name == name)
    }
}

/// Answers stratigraphy queries from the elevations carried in the registry
/// rows, matching the well location exactly.
///
/// Those elevations were sampled at the registry's own coordinates, so the
/// unit factor does not apply here.
impl StratigraphyQuery for WellRegistry {
    fn stratigraphy_at(&self, location: Location, _unit_factor: f64) -> Result<LayerStratigraphy> {
        self.wells
            .iter()
            .filter(|well| well.location == location)
            .find_map(|well| well.elevations.as_deref())
            .ok_or(IwfmError::StratigraphyNotFound {
                x: location.x,
                y: location.y,
            })
            .and_then(LayerStratigraphy::from_elevations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = "\
name,alt_name,hydrograph_id,layer,x,y,gse,lay_1_bot,lay_2_bot,lay_3_bot,lay_4_bot,screen_ref_elev,screen_top_depth,screen_bot_depth,well_depth
12N03E16,12N03E16A001M,7,2,6500.0,4200.0,150,120,80,40,0,150,50,90,
12N03E16,12N03E16A001M,8,3,6500.0,4200.0,150,120,80,40,0,150,50,90,
13N04E01,,9,1,7000.0,4300.0,160,130,90,50,10,,,,120
13N04E01,,10,2,7000.0,4300.0,160,130,90,50,10,,,,120
";

    #[test]
    fn test_groups_rows_by_name() {
        let registry = WellRegistry::from_csv_str(REGISTRY).unwrap();
        let names: Vec<&str> = registry.wells().iter().map(|well| well.name.as_str()).collect();
        assert_eq!(names, vec!["12N03E16", "13N04E01"]);
        let well = registry.get("12N03E16").unwrap();
        assert_eq!(well.alternate_names, vec!["12N03E16A001M"]);
        assert_eq!(well.hydrographs.get(&2), Some(&HydrographId(7)));
        assert_eq!(well.hydrographs.get(&3), Some(&HydrographId(8)));
        assert_eq!(well.screen, ScreenInterval::new(100.0, 60.0));
        assert_eq!(well.well_depth, None);
    }

    #[test]
    fn test_unknown_screen_and_known_depth() {
        let registry = WellRegistry::from_csv_str(REGISTRY).unwrap();
        let well = registry.get("13N04E01").unwrap();
        assert!(well.screen.is_unknown());
        assert_eq!(well.well_depth, Some(120.0));
        assert!(well.alternate_names.is_empty());
    }

    #[test]
    fn test_registry_answers_stratigraphy() {
        let registry = WellRegistry::from_csv_str(REGISTRY).unwrap();
        let strat = registry
            .stratigraphy_at(Location::new(6500.0, 4200.0), 1.0)
            .unwrap();
        assert_eq!(strat.ground_surface(), 150.0);
        assert_eq!(strat.bottoms(), &[120.0, 80.0, 40.0, 0.0]);
        assert!(registry
            .stratigraphy_at(Location::new(1.0, 1.0), 1.0)
            .is_err());
    }

    #[test]
    fn test_registry_stratigraphy_ignores_unit_factor() {
        let registry = WellRegistry::from_csv_str(REGISTRY).unwrap();
        let strat = registry
            .stratigraphy_at(Location::new(6500.0, 4200.0), 3.2808)
            .unwrap();
        assert_eq!(strat.ground_surface(), 150.0);
        assert_eq!(strat.layer_count(), 4);
    }

    #[test]
    fn test_minimal_columns() {
        let csv_data = "name,hydrograph_id,layer,x,y\nS1,1,1,0,0\n";
        let registry = WellRegistry::from_csv_str(csv_data).unwrap();
        let well = registry.get("S1").unwrap();
        assert!(well.screen.is_unknown());
        assert!(well.elevations.is_none());
    }

    #[test]
    fn test_missing_required_column() {
        let csv_data = "name,layer,x,y\nS1,1,0,0\n";
        assert!(matches!(
            WellRegistry::from_csv_str(csv_data),
            Err(IwfmError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let csv_data = "name,hydrograph_id,layer,x,y\nS1,one,1,0,0\n";
        let err = WellRegistry::from_csv_str(csv_data).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
