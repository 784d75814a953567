//! CSV and JSON output of reconciliation and comparison results.

use anyhow::Context;
use iwfm_calib::align::AlignedTable;
use iwfm_calib::analysis::{AnalysisReport, WellOutcome};
use iwfm_calib::diagnostics::Diagnostics;
use iwfm_calib::intersect::LayerWeights;
use iwfm_calib::reconcile::Reconciliation;
use iwfm_calib::score::FitStatistics;
use iwfm_utils::dates::format_date;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

fn cell(value: Option<f64>) -> String {
    value.map_or(String::new(), |v| v.to_string())
}

/// `identifier, class, matched_to, rule`, one row per identifier.
pub fn write_reconciliation<W: Write>(writer: W, reconciliation: &Reconciliation) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["identifier", "class", "matched_to", "rule"])?;
    for pair in reconciliation.matched() {
        let rule = pair.rule.to_string();
        wtr.write_record([
            pair.model_name.as_str(),
            "matched",
            pair.external_id.as_str(),
            rule.as_str(),
        ])?;
    }
    for name in reconciliation.model_only() {
        wtr.write_record([name.as_str(), "model_only", "", ""])?;
    }
    for id in reconciliation.observation_only() {
        wtr.write_record([id.as_str(), "observation_only", "", ""])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Wide per-well table: `date, layer_<k>…, average, observed`. The average
/// column only appears when the table reports it.
pub fn write_well_table<W: Write>(writer: W, table: &AlignedTable) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["date".to_string()];
    header.extend(table.layers.iter().map(|layer| format!("layer_{layer}")));
    if table.report_average {
        header.push("average".to_string());
    }
    header.push("observed".to_string());
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![format_date(&row.date)];
        record.extend(row.heads.iter().map(|head| cell(*head)));
        if table.report_average {
            record.push(cell(row.simulated));
        }
        record.push(cell(row.observed));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// `name, layers, paired_points, r_squared` for every scored well, then
/// the pooled row when present.
pub fn write_statistics<W: Write>(writer: W, report: &AnalysisReport) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["name", "layers", "paired_points", "r_squared"])?;
    for statistics in report.scored().chain(report.pooled.as_ref()) {
        let layers: Vec<String> = statistics.layers.iter().map(usize::to_string).collect();
        wtr.write_record([
            statistics.name.clone(),
            layers.join(";"),
            statistics.paired_points.to_string(),
            cell(statistics.r_squared),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum WellEntry<'a> {
    Compared {
        name: &'a str,
        external_id: &'a str,
        weights: &'a LayerWeights,
        statistics: &'a FitStatistics,
        diagnostics: &'a Diagnostics,
    },
    Failed {
        name: &'a str,
        reason: &'a str,
    },
}

#[derive(Serialize)]
struct DiagnosticsDocument<'a> {
    period: Option<(String, String)>,
    wells: Vec<WellEntry<'a>>,
}

/// Per-well weights, statistics, diagnostics and failures as JSON.
pub fn write_diagnostics<W: Write>(writer: W, report: &AnalysisReport) -> anyhow::Result<()> {
    let wells = report
        .wells
        .iter()
        .map(|outcome| match outcome {
            WellOutcome::Compared(comparison) => WellEntry::Compared {
                name: &comparison.name,
                external_id: &comparison.external_id,
                weights: &comparison.weights,
                statistics: &comparison.statistics,
                diagnostics: &comparison.diagnostics,
            },
            WellOutcome::Failed { name, reason } => WellEntry::Failed { name, reason },
        })
        .collect();
    let document = DiagnosticsDocument {
        period: report
            .period
            .map(|period| (format_date(&period.start), format_date(&period.end))),
        wells,
    };
    serde_json::to_writer_pretty(writer, &document)?;
    Ok(())
}

/// File-system friendly form of a well name.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// One distinct file stem per name, in order. Names that sanitize to the
/// same stem get `_2`, `_3`, ... appended.
fn unique_stems<'a, I: IntoIterator<Item = &'a str>>(names: I) -> Vec<String> {
    let mut taken = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let base = file_stem(name);
            let mut stem = base.clone();
            let mut n = 1;
            while !taken.insert(stem.to_ascii_lowercase()) {
                n += 1;
                stem = format!("{base}_{n}");
            }
            stem
        })
        .collect()
}

/// Write every output of a comparison run into `dir`; per-well tables go
/// under `dir/wells`.
pub fn write_report(dir: &Path, report: &AnalysisReport) -> anyhow::Result<()> {
    let wells_dir = dir.join("wells");
    fs::create_dir_all(&wells_dir).with_context(|| format!("creating {}", wells_dir.display()))?;
    let create_in = |dir: &Path, name: &str| {
        let path = dir.join(name);
        File::create(&path).with_context(|| format!("creating {}", path.display()))
    };
    let create = |name: &str| create_in(dir, name);

    let comparisons: Vec<_> = report.compared().collect();
    let stems = unique_stems(comparisons.iter().map(|comparison| comparison.name.as_str()));
    for (comparison, stem) in comparisons.iter().zip(&stems) {
        write_well_table(create_in(&wells_dir, &format!("{stem}.csv"))?, &comparison.table)?;
    }
    write_statistics(create("statistics.csv")?, report)?;
    write_reconciliation(create("reconciliation.csv")?, &report.reconciliation)?;
    write_diagnostics(create("diagnostics.json")?, report)?;
    Ok(())
}
