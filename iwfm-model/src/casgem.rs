//! External groundwater-elevation measurements (CASGEM periodic
//! measurements or any CSV with the same shape).

use crate::config::ObservationColumns;
use crate::error::{IwfmError, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use iwfm_utils::cells::{non_blank, parse_optional_f64};
use iwfm_utils::dates::parse_date_with_formats;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One measured groundwater surface elevation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Station identifier, usually the 13-character state well number
    pub primary_id: String,
    pub alternate_id: Option<String>,
    pub date: NaiveDate,
    /// Absent when the measurement was recorded without a value
    pub wse: Option<f64>,
}

/// All rows of an observation dataset in file order.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ObservationDataset {
    records: Vec<ObservationRecord>,
}

impl ObservationDataset {
    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parse CSV with a header row. Rows with a blank id or unreadable date
    /// are skipped; unreadable elevations are kept as missing.
    pub fn from_reader<R: Read>(reader: R, columns: &ObservationColumns) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h == name);
        let primary_col = position(&columns.primary_id);
        let alternate_col = position(&columns.alternate_id);
        if primary_col.is_none() && alternate_col.is_none() {
            return Err(IwfmError::MissingColumn(columns.primary_id.clone()));
        }
        let date_col = position(&columns.date)
            .ok_or_else(|| IwfmError::MissingColumn(columns.date.clone()))?;
        let value_col = position(&columns.value)
            .ok_or_else(|| IwfmError::MissingColumn(columns.value.clone()))?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in rdr.records() {
            let record = row?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let get = |index: Option<usize>| {
                index
                    .and_then(|i| record.get(i))
                    .and_then(non_blank)
                    .map(str::to_string)
            };
            let alternate_id = get(alternate_col);
            // A station without a state well number is keyed by its name
            let Some(primary_id) = get(primary_col).or_else(|| alternate_id.clone()) else {
                warn!("Observation line {}: no station identifier, row skipped", line);
                skipped += 1;
                continue;
            };
            let raw_date = record.get(date_col).unwrap_or("");
            let date = match parse_date_with_formats(raw_date, &columns.date_formats) {
                Ok(date) => date,
                Err(e) => {
                    warn!("Observation line {}: {}, row skipped", line, e);
                    skipped += 1;
                    continue;
                }
            };
            let raw_value = record.get(value_col).unwrap_or("");
            let wse = parse_optional_f64(raw_value).unwrap_or_else(|e| {
                warn!("Observation line {}: elevation {:?}: {}", line, raw_value, e);
                None
            });
            records.push(ObservationRecord {
                primary_id,
                alternate_id,
                date,
                wse,
            });
        }
        if skipped > 0 {
            info!("Skipped {} unreadable observation rows", skipped);
        }
        Ok(ObservationDataset { records })
    }

    pub fn from_csv_str(csv_object: &str, columns: &ObservationColumns) -> Result<Self> {
        Self::from_reader(csv_object.as_bytes(), columns)
    }

    /// Read a dataset file; paths ending in `.gz` are decompressed on the fly.
    pub fn from_path(path: &Path, columns: &ObservationColumns) -> Result<Self> {
        let file = File::open(path)?;
        let dataset = if path.extension().is_some_and(|ext| ext == "gz") {
            Self::from_reader(GzDecoder::new(file), columns)?
        } else {
            Self::from_reader(file, columns)?
        };
        info!(
            "Read {} observations from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }
}
