//! Month-level join of simulated and observed heads.

use crate::blend::BlendedHydrograph;
use chrono::{Datelike, NaiveDate};
use iwfm_model::casgem::ObservationRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Calendar month used as the join key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn from_date(date: &NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    /// Simulated date
    pub date: NaiveDate,
    pub heads: Vec<Option<f64>>,
    /// Blended head compared against the observation
    pub simulated: Option<f64>,
    pub observed: Option<f64>,
    pub observed_date: Option<NaiveDate>,
}

/// Simulated rows with the observations of the same month attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    pub layers: Vec<usize>,
    pub report_average: bool,
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    /// `(observed, simulated)` for rows where both are present.
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.rows
            .iter()
            .filter_map(|row| row.observed.zip(row.simulated))
            .collect()
    }
}

/// Left join of `blended` with `observations` on year and month.
///
/// Every simulated row is kept. A row whose month holds several
/// measurements is repeated once per measurement; observations without an
/// elevation are ignored.
pub fn align<'a, I>(blended: &BlendedHydrograph, observations: I) -> AlignedTable
where
    I: IntoIterator<Item = &'a ObservationRecord>,
{
    let mut by_month: BTreeMap<YearMonth, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for record in observations {
        if let Some(wse) = record.wse {
            by_month
                .entry(YearMonth::from_date(&record.date))
                .or_default()
                .push((record.date, wse));
        }
    }

    let mut rows = Vec::with_capacity(blended.rows.len());
    for row in &blended.rows {
        let unmatched = AlignedRow {
            date: row.date,
            heads: row.heads.clone(),
            simulated: row.average,
            observed: None,
            observed_date: None,
        };
        match by_month.get(&YearMonth::from_date(&row.date)) {
            Some(measurements) => {
                for &(date, wse) in measurements {
                    rows.push(AlignedRow {
                        observed: Some(wse),
                        observed_date: Some(date),
                        ..unmatched.clone()
                    });
                }
            }
            None => rows.push(unmatched),
        }
    }

    AlignedTable {
        layers: blended.layers.clone(),
        report_average: blended.report_average,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::BlendedRow;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn blended() -> BlendedHydrograph {
        let rows = [(day(1974, 1, 31), 100.0), (day(1974, 2, 28), 101.0), (day(1974, 3, 31), 102.0)]
            .into_iter()
            .map(|(date, head)| BlendedRow {
                date,
                heads: vec![Some(head)],
                average: Some(head),
            })
            .collect();
        BlendedHydrograph {
            layers: vec![2],
            rows,
            report_average: false,
        }
    }

    fn observation(date: NaiveDate, wse: Option<f64>) -> ObservationRecord {
        ObservationRecord {
            primary_id: "12N03E16A001M".to_string(),
            alternate_id: None,
            date,
            wse,
        }
    }

    #[test]
    fn test_year_month() {
        let key = YearMonth::from_date(&day(1974, 3, 15));
        assert_eq!(key, YearMonth { year: 1974, month: 3 });
        assert_eq!(key.to_string(), "1974-03");
    }

    #[test]
    fn test_left_join_by_month() {
        let observations = vec![
            observation(day(1974, 1, 12), Some(99.0)),
            observation(day(1974, 3, 2), Some(103.0)),
            observation(day(1974, 3, 20), Some(104.0)),
            observation(day(1974, 2, 10), None),
            observation(day(1975, 1, 12), Some(50.0)),
        ];
        let table = align(&blended(), &observations);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[0].observed, Some(99.0));
        assert_eq!(table.rows[0].observed_date, Some(day(1974, 1, 12)));
        assert_eq!(table.rows[1].observed, None);
        assert_eq!(table.rows[2].date, day(1974, 3, 31));
        assert_eq!(table.rows[3].observed, Some(104.0));
        assert_eq!(
            table.pairs(),
            vec![(99.0, 100.0), (103.0, 102.0), (104.0, 102.0)]
        );
    }

    #[test]
    fn test_no_observations_keeps_every_row() {
        let table = align(&blended(), &Vec::<ObservationRecord>::new());
        assert_eq!(table.rows.len(), 3);
        assert!(table.pairs().is_empty());
    }
}
