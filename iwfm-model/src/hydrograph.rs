//! Simulated groundwater hydrographs printed by IWFM.
//!
//! The hydrograph output file starts with a commented header holding one
//! row per attribute (`HYDROGRAPH ID`, `LAYER`, `NODE`, `ELEMENT`), each
//! listing one value per hydrograph column, followed by one line per time
//! step: an IWFM time stamp and one head per column. The `TIME` heading
//! closes the header; files without it end their header at the first
//! uncommented line.
//!
//! ```text
//! *          HYDROGRAPH ID        1        2
//! *          LAYER                1        2
//! *          NODE               101      101
//! *          ELEMENT             88       88
//! *      TIME
//! 10/31/1973_24:00        95.1     94.7
//! ```

use crate::config::HydrographFlags;
use crate::error::{IwfmError, Result};
use crate::time_spec::TimeSpecQuery;
use crate::well::HydrographId;
use chrono::NaiveDate;
use iwfm_utils::dates::parse_iwfm_timestamp;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::Path;

/// Characters that open a comment line in IWFM text files.
const COMMENT_MARKERS: &[char] = &['C', 'c', '*', '#'];

/// Column attributes of one simulated hydrograph.
#[derive(Debug, PartialEq, Clone)]
pub struct HydrographColumn {
    pub id: HydrographId,
    pub layer: usize,
    pub node: Option<u32>,
    pub element: Option<u32>,
}

/// One hydrograph's heads in date order.
#[derive(Debug, PartialEq, Clone)]
pub struct HydrographSeries {
    pub column: HydrographColumn,
    pub heads: Vec<(NaiveDate, f64)>,
}

/// A printed time stamp kept verbatim next to its parsed date.
#[derive(Debug, PartialEq, Clone)]
struct Stamp {
    raw: String,
    date: NaiveDate,
}

/// All simulated hydrographs of a run keyed by hydrograph id.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct HydrographTable {
    series: BTreeMap<HydrographId, HydrographSeries>,
    /// First and last printed time steps
    period: Option<(Stamp, Stamp)>,
}

fn is_comment(line: &str) -> bool {
    line.starts_with(COMMENT_MARKERS)
}

/// Number of header lines: through the time heading that follows the
/// hydrograph-id row, or up to the first uncommented line when there is none.
fn header_end(lines: &[&str], flags: &HydrographFlags) -> usize {
    let time_line = lines
        .iter()
        .position(|line| line.contains(flags.hydrograph_id.as_str()))
        .filter(|_| !flags.time.is_empty())
        .and_then(|start| {
            lines[start..]
                .iter()
                .position(|line| line.contains(flags.time.as_str()))
                .map(|at| start + at)
        });
    match time_line {
        Some(at) => at + 1,
        None => lines
            .iter()
            .position(|line| !line.trim().is_empty() && !is_comment(line))
            .unwrap_or(lines.len()),
    }
}

/// Values following `flag` on the first header line that contains it.
fn header_values(header: &[&str], flag: &str) -> Option<Vec<String>> {
    header.iter().find_map(|line| {
        line.find(flag).map(|at| {
            line[at + flag.len()..]
                .split_whitespace()
                .map(str::to_string)
                .collect()
        })
    })
}

fn parse_numbers<T: std::str::FromStr>(values: &[String], flag: &str) -> Result<Vec<T>> {
    values
        .iter()
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| IwfmError::InvalidFormat(format!("{flag} value {v:?} is not a number")))
        })
        .collect()
}

impl HydrographTable {
    /// Parse the text of one hydrograph output file.
    pub fn parse(text: &str, flags: &HydrographFlags, time_suffix: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let header_len = header_end(&lines, flags);
        let header = &lines[..header_len];

        let ids: Vec<u32> = header_values(header, &flags.hydrograph_id)
            .ok_or_else(|| IwfmError::MissingSection(flags.hydrograph_id.clone()))
            .and_then(|v| parse_numbers(&v, &flags.hydrograph_id))?;
        let layers: Vec<usize> = header_values(header, &flags.layer)
            .ok_or_else(|| IwfmError::MissingSection(flags.layer.clone()))
            .and_then(|v| parse_numbers(&v, &flags.layer))?;
        let nodes: Option<Vec<u32>> = header_values(header, &flags.node)
            .map(|v| parse_numbers(&v, &flags.node))
            .transpose()?;
        let elements: Option<Vec<u32>> = header_values(header, &flags.element)
            .map(|v| parse_numbers(&v, &flags.element))
            .transpose()?;

        if layers.len() != ids.len() {
            return Err(IwfmError::InvalidFormat(format!(
                "{} hydrograph ids but {} layers",
                ids.len(),
                layers.len()
            )));
        }

        let mut columns: Vec<HydrographSeries> = ids
            .iter()
            .zip(layers.iter())
            .enumerate()
            .map(|(i, (&id, &layer))| HydrographSeries {
                column: HydrographColumn {
                    id: HydrographId(id),
                    layer,
                    node: nodes.as_ref().and_then(|n| n.get(i).copied()),
                    element: elements.as_ref().and_then(|e| e.get(i).copied()),
                },
                heads: Vec::new(),
            })
            .collect();

        let mut first_stamp: Option<Stamp> = None;
        let mut last_stamp: Option<Stamp> = None;
        for (offset, line) in lines[header_len..].iter().enumerate() {
            if line.trim().is_empty() || is_comment(line) {
                continue;
            }
            let line_number = header_len + offset + 1;
            let mut tokens = line.split_whitespace();
            let stamp = tokens.next().unwrap_or("");
            let date = parse_iwfm_timestamp(stamp, time_suffix)
                .map_err(|e| IwfmError::DateParse(format!("line {line_number}: {e}")))?;
            let heads: Vec<f64> = tokens
                .map(|token| {
                    token.parse::<f64>().map_err(|_| {
                        IwfmError::InvalidFormat(format!(
                            "line {line_number}: head {token:?} is not a number"
                        ))
                    })
                })
                .collect::<Result<_>>()?;
            if heads.len() != columns.len() {
                return Err(IwfmError::InvalidFormat(format!(
                    "line {line_number}: expected {} heads, found {}",
                    columns.len(),
                    heads.len()
                )));
            }
            for (series, head) in columns.iter_mut().zip(heads) {
                series.heads.push((date, head));
            }
            let stamp = Stamp {
                raw: stamp.to_string(),
                date,
            };
            if first_stamp.is_none() {
                first_stamp = Some(stamp.clone());
            }
            last_stamp = Some(stamp);
        }

        let period = first_stamp.zip(last_stamp);
        let mut series = BTreeMap::new();
        for column in columns {
            let id = column.column.id;
            if series.contains_key(&id) {
                warn!("Hydrograph id {} appears twice in one file; keeping the first", id);
                continue;
            }
            series.insert(id, column);
        }
        debug!("Parsed {} hydrographs", series.len());
        Ok(HydrographTable { series, period })
    }

    pub fn from_path(path: &Path, flags: &HydrographFlags, time_suffix: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let table = Self::parse(&text, flags, time_suffix)?;
        info!(
            "Read {} hydrographs from {}",
            table.series.len(),
            path.display()
        );
        Ok(table)
    }

    /// Read and merge several hydrograph files; the first file defining an id wins.
    pub fn from_paths(paths: &[&Path], flags: &HydrographFlags, time_suffix: &str) -> Result<Self> {
        let mut merged = HydrographTable::default();
        for path in paths {
            merged.merge(Self::from_path(path, flags, time_suffix)?);
        }
        Ok(merged)
    }

    pub fn merge(&mut self, other: HydrographTable) {
        for (id, series) in other.series {
            if self.series.contains_key(&id) {
                warn!("Hydrograph id {} already loaded; later copy ignored", id);
                continue;
            }
            self.series.insert(id, series);
        }
        self.period = match (self.period.take(), other.period) {
            (Some((first, last)), Some((other_first, other_last))) => Some((
                if other_first.date < first.date { other_first } else { first },
                if other_last.date > last.date { other_last } else { last },
            )),
            (mine, theirs) => mine.or(theirs),
        };
    }

    pub fn get(&self, id: &HydrographId) -> Option<&HydrographSeries> {
        self.series.get(id)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// The simulated period spans the first and last printed time steps.
impl TimeSpecQuery for HydrographTable {
    fn time_spec(&self) -> Result<(String, String)> {
        self.period
            .as_ref()
            .map(|(first, last)| (first.raw.clone(), last.raw.clone()))
            .ok_or_else(|| IwfmError::InvalidFormat("hydrograph table has no time steps".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GWHYD: &str = "\
*                       IWFM (v2015.0.1273)
*                 GROUNDWATER HYDROGRAPH OUTPUT
*          HYDROGRAPH ID            1          2          3
*          LAYER                    1          2          3
*          NODE                   101        101        101
*          ELEMENT                 88         88         88
*      TIME
10/31/1973_24:00          95.10      94.70      93.00
11/30/1973_24:00          96.00      95.50      93.40
12/31/1973_24:00          97.25      96.00      94.10
";

    fn parse() -> HydrographTable {
        HydrographTable::parse(GWHYD, &HydrographFlags::default(), "_24:00").unwrap()
    }

    #[test]
    fn test_parse_columns() {
        let table = parse();
        assert_eq!(table.len(), 3);
        let second = table.get(&HydrographId(2)).unwrap();
        assert_eq!(second.column.layer, 2);
        assert_eq!(second.column.node, Some(101));
        assert_eq!(second.column.element, Some(88));
        assert_eq!(second.heads.len(), 3);
        assert_eq!(
            second.heads[2],
            (NaiveDate::from_ymd_opt(1973, 12, 31).unwrap(), 96.0)
        );
    }

    #[test]
    fn test_time_spec_is_first_and_last_stamp() {
        let table = parse();
        assert_eq!(
            table.time_spec().unwrap(),
            ("10/31/1973_24:00".to_string(), "12/31/1973_24:00".to_string())
        );
    }

    #[test]
    fn test_time_heading_closes_uncommented_header() {
        let text = "\
   HYDROGRAPH ID 1 2
   LAYER 1 2
   DATE
10/31/1973_24:00 1.0 2.0
";
        let flags = HydrographFlags {
            time: "DATE".to_string(),
            ..HydrographFlags::default()
        };
        let table = HydrographTable::parse(text, &flags, "_24:00").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&HydrographId(2)).unwrap().heads.len(), 1);
        // Without the heading the first uncommented line is read as data
        assert!(HydrographTable::parse(text, &HydrographFlags::default(), "_24:00").is_err());
    }

    #[test]
    fn test_missing_layer_row() {
        let text = "*  HYDROGRAPH ID 1 2\n10/31/1973_24:00 1.0 2.0\n";
        let err = HydrographTable::parse(text, &HydrographFlags::default(), "_24:00").unwrap_err();
        assert!(matches!(err, IwfmError::MissingSection(flag) if flag == "LAYER"));
    }

    #[test]
    fn test_short_data_line() {
        let text = "*  HYDROGRAPH ID 1 2\n*  LAYER 1 2\n10/31/1973_24:00 1.0\n";
        let err = HydrographTable::parse(text, &HydrographFlags::default(), "_24:00").unwrap_err();
        assert!(err.to_string().contains("expected 2 heads"));
    }

    #[test]
    fn test_merge_keeps_first_and_widens_period() {
        let mut table = parse();
        let later = "\
*  HYDROGRAPH ID 3 4
*  LAYER 3 1
01/31/1974_24:00 1.0 2.0
";
        table.merge(HydrographTable::parse(later, &HydrographFlags::default(), "_24:00").unwrap());
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(&HydrographId(3)).unwrap().heads.len(), 3);
        assert_eq!(table.get(&HydrographId(4)).unwrap().column.layer, 1);
        assert_eq!(
            table.time_spec().unwrap(),
            ("10/31/1973_24:00".to_string(), "01/31/1974_24:00".to_string())
        );
    }
}
