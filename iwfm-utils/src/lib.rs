//! Shared utility functions for IWFM crates.

/// Date utility functions
pub mod dates {
    use anyhow::anyhow;
    use chrono::NaiveDate;

    /// Date format of IWFM time stamps once the time-of-day suffix is removed
    pub const IWFM_DATE_FORMAT: &str = "%m/%d/%Y";

    /// Time-of-day suffix IWFM appends to every time stamp
    pub const IWFM_TIME_SUFFIX: &str = "_24:00";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Remove a trailing time-of-day suffix such as `_24:00`.
    ///
    /// Strings without the suffix are returned trimmed but otherwise unchanged.
    pub fn strip_time_suffix<'a>(s: &'a str, suffix: &str) -> &'a str {
        let trimmed = s.trim();
        trimmed.strip_suffix(suffix).unwrap_or(trimmed)
    }

    /// Parse an IWFM time stamp such as `09/30/1990_24:00`.
    pub fn parse_iwfm_timestamp(s: &str, suffix: &str) -> anyhow::Result<NaiveDate> {
        let stripped = strip_time_suffix(s, suffix);
        NaiveDate::parse_from_str(stripped, IWFM_DATE_FORMAT)
            .map_err(|e| anyhow!("Date error: {s:?}: {e}"))
    }

    /// Parse a measurement date, dropping anything after the first whitespace
    /// (e.g. `1990/10/15 00:00:00`) and trying each format in turn.
    pub fn parse_date_with_formats(s: &str, formats: &[String]) -> anyhow::Result<NaiveDate> {
        let head = s.split_whitespace().next().unwrap_or("");
        formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(head, format).ok())
            .ok_or_else(|| anyhow!("Date error: {s:?} matches none of {formats:?}"))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_strip_time_suffix() {
            assert_eq!(strip_time_suffix("09/30/1990_24:00", "_24:00"), "09/30/1990");
            assert_eq!(strip_time_suffix(" 09/30/1990 ", "_24:00"), "09/30/1990");
        }

        #[test]
        fn test_parse_iwfm_timestamp() {
            let date = parse_iwfm_timestamp("10/31/1973_24:00", IWFM_TIME_SUFFIX).unwrap();
            assert_eq!(date, NaiveDate::from_ymd_opt(1973, 10, 31).unwrap());
            assert!(parse_iwfm_timestamp("1973-10-31", IWFM_TIME_SUFFIX).is_err());
        }

        #[test]
        fn test_parse_date_with_formats() {
            let formats = vec!["%Y/%m/%d".to_string(), "%Y-%m-%d".to_string()];
            let expected = NaiveDate::from_ymd_opt(1990, 10, 15).unwrap();
            assert_eq!(
                parse_date_with_formats("1990/10/15 00:00:00", &formats).unwrap(),
                expected
            );
            assert_eq!(parse_date_with_formats("1990-10-15", &formats).unwrap(), expected);
            let err = parse_date_with_formats("15.10.1990", &formats).unwrap_err();
            assert!(err.to_string().contains("15.10.1990"));
        }

        #[test]
        fn test_format_date() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 5).unwrap();
            assert_eq!(format_date(&date), "2023-06-05");
        }
    }
}

/// Cell parsing for loosely populated CSV and text columns
pub mod cells {
    /// Parse a numeric cell, treating blanks and the usual null spellings as absent.
    pub fn parse_optional_f64(cell: &str) -> anyhow::Result<Option<f64>> {
        let lowered = cell.trim().to_lowercase();
        match lowered.as_str() {
            "" | "null" | "nan" | "n/a" | "na" => Ok(None),
            s => {
                let value: f64 = s.parse()?;
                Ok(if value.is_nan() { None } else { Some(value) })
            }
        }
    }

    /// Returns `None` for blank cells, otherwise the trimmed contents.
    pub fn non_blank(cell: &str) -> Option<&str> {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

}
