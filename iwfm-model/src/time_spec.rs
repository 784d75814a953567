//! Simulation period handling.

use crate::error::{IwfmError, Result};
use chrono::NaiveDate;
use iwfm_utils::dates::parse_iwfm_timestamp;

/// Source of the simulated period as raw IWFM time stamps `(start, end)`,
/// e.g. `("10/31/1973_24:00", "09/30/2015_24:00")`.
pub trait TimeSpecQuery {
    fn time_spec(&self) -> Result<(String, String)>;
}

/// A period configured up front rather than read from model output.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedTimeSpec {
    pub start: String,
    pub end: String,
}

impl FixedTimeSpec {
    pub fn new(start: &str, end: &str) -> Self {
        FixedTimeSpec {
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

impl TimeSpecQuery for FixedTimeSpec {
    fn time_spec(&self) -> Result<(String, String)> {
        Ok((self.start.clone(), self.end.clone()))
    }
}

/// Inclusive simulated date range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SimulationPeriod {
    /// Parse raw time stamps, dropping `suffix` from each.
    pub fn parse(start: &str, end: &str, suffix: &str) -> Result<Self> {
        let parse = |stamp: &str| {
            parse_iwfm_timestamp(stamp, suffix).map_err(|e| IwfmError::DateParse(e.to_string()))
        };
        let period = SimulationPeriod {
            start: parse(start)?,
            end: parse(end)?,
        };
        if period.end < period.start {
            return Err(IwfmError::InvalidFormat(format!(
                "simulation ends ({end}) before it starts ({start})"
            )));
        }
        Ok(period)
    }

    pub fn from_query<Q: TimeSpecQuery + ?Sized>(query: &Q, suffix: &str) -> Result<Self> {
        let (start, end) = query.time_spec()?;
        Self::parse(&start, &end, suffix)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        *date >= self.start && *date <= self.end
    }
}
