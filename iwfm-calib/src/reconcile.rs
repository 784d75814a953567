//! Matching model-side well names to the identifiers used by an external
//! observation dataset.
//!
//! Three rules run in order, each only considering model names that are
//! still unmatched and external identifiers that are still unclaimed:
//!
//! 1. exact match against either identifier of a station;
//! 2. a state well number of the configured length with its trailing
//!    base-and-meridian character dropped (`12N03E16A001M` -> `12N03E16A001`);
//! 3. a match ignoring letter case.
//!
//! A model well is tried under its canonical name first, then under each
//! alternate name the registry lists for it.
//!
//! Nothing is rewritten in place. Matches by rules 2 and 3 are recorded as
//! aliases that [`Reconciliation::resolve`] consults afterwards.

use iwfm_model::casgem::ObservationDataset;
use iwfm_model::well::WellRegistry;
use log::{debug, info};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact,
    SuffixNormalized,
    CaseInsensitive,
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchRule::Exact => "exact",
            MatchRule::SuffixNormalized => "suffix_normalized",
            MatchRule::CaseInsensitive => "case_insensitive",
        };
        write!(f, "{label}")
    }
}

/// A model well tied to the external identifier that matched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedPair {
    pub model_name: String,
    pub external_id: String,
    pub rule: MatchRule,
}

/// The names one model well is known by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelWell {
    pub name: String,
    pub alternate_names: Vec<String>,
}

impl ModelWell {
    pub fn new(name: &str, alternate_names: &[&str]) -> Self {
        ModelWell {
            name: name.to_string(),
            alternate_names: alternate_names.iter().map(|alt| alt.to_string()).collect(),
        }
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.alternate_names.iter().map(String::as_str))
    }
}

/// Registry wells with their alternate names, in registry order.
pub fn model_wells_in(registry: &WellRegistry) -> Vec<ModelWell> {
    registry
        .wells()
        .iter()
        .map(|well| ModelWell {
            name: well.name.clone(),
            alternate_names: well.alternate_names.clone(),
        })
        .collect()
}

/// The identifiers one external station is known by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalStation {
    pub primary_id: String,
    pub alternate_id: Option<String>,
}

impl ExternalStation {
    pub fn new(primary_id: &str, alternate_id: Option<&str>) -> Self {
        ExternalStation {
            primary_id: primary_id.to_string(),
            alternate_id: alternate_id.map(str::to_string),
        }
    }

    fn ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_id.as_str()).chain(self.alternate_id.as_deref())
    }
}

/// Distinct stations of a dataset in first-appearance order.
pub fn stations_in(dataset: &ObservationDataset) -> Vec<ExternalStation> {
    let mut seen = HashSet::new();
    dataset
        .records()
        .iter()
        .map(|r| ExternalStation::new(&r.primary_id, r.alternate_id.as_deref()))
        .filter(|station| seen.insert(station.clone()))
        .collect()
}

/// Outcome of one reconciliation, fixed for the rest of the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    matched: Vec<MatchedPair>,
    model_only: Vec<String>,
    observation_only: Vec<String>,
    /// Every claimed external id mapped to its model name
    aliases: HashMap<String, String>,
}

impl Reconciliation {
    /// Matched wells in model order.
    pub fn matched(&self) -> &[MatchedPair] {
        &self.matched
    }

    pub fn model_only(&self) -> &[String] {
        &self.model_only
    }

    /// Stations none of whose identifiers were claimed, by primary id.
    pub fn observation_only(&self) -> &[String] {
        &self.observation_only
    }

    /// Model name an external identifier was matched to.
    pub fn resolve(&self, external_id: &str) -> Option<&str> {
        self.aliases.get(external_id).map(String::as_str)
    }
}

/// Unmatched model names and unclaimed external ids while rules run.
struct Claims<'a> {
    candidates: Vec<&'a str>,
    claimed: HashSet<&'a str>,
    matches: HashMap<&'a str, MatchedPair>,
}

impl<'a> Claims<'a> {
    fn apply<F>(&mut self, model_wells: &'a [ModelWell], rule: MatchRule, accepts: F)
    where
        F: Fn(&str, &str) -> bool,
    {
        for well in model_wells {
            let name = well.name.as_str();
            if self.matches.contains_key(name) {
                continue;
            }
            let found = well.keys().find_map(|key| {
                self.candidates
                    .iter()
                    .copied()
                    .find(|id| !self.claimed.contains(id) && accepts(key, id))
            });
            if let Some(id) = found {
                debug!("{} matched {} ({})", name, id, rule);
                self.claimed.insert(id);
                self.matches.insert(
                    name,
                    MatchedPair {
                        model_name: well.name.clone(),
                        external_id: id.to_string(),
                        rule,
                    },
                );
            }
        }
    }
}

/// Classify `model_wells` against `stations`.
///
/// `suffix_length` is the length an external id must have for rule 2.
/// Canonical names are expected to be unique; an empty station list leaves
/// every well model-only.
pub fn reconcile(
    model_wells: &[ModelWell],
    stations: &[ExternalStation],
    suffix_length: usize,
) -> Reconciliation {
    let mut candidates = Vec::new();
    let mut seen = HashSet::new();
    for id in stations.iter().flat_map(ExternalStation::ids) {
        if seen.insert(id) {
            candidates.push(id);
        }
    }

    let mut claims = Claims {
        candidates,
        claimed: HashSet::new(),
        matches: HashMap::new(),
    };
    claims.apply(model_wells, MatchRule::Exact, |name, id| name == id);
    claims.apply(model_wells, MatchRule::SuffixNormalized, |name, id| {
        id.chars().count() == suffix_length
            && id
                .char_indices()
                .last()
                .is_some_and(|(last, _)| &id[..last] == name)
    });
    claims.apply(model_wells, MatchRule::CaseInsensitive, |name, id| {
        name.to_lowercase() == id.to_lowercase()
    });

    let mut reconciliation = Reconciliation::default();
    for well in model_wells {
        match claims.matches.remove(well.name.as_str()) {
            Some(pair) => {
                reconciliation
                    .aliases
                    .insert(pair.external_id.clone(), pair.model_name.clone());
                reconciliation.matched.push(pair);
            }
            None => reconciliation.model_only.push(well.name.clone()),
        }
    }
    let mut reported = HashSet::new();
    for station in stations {
        if station.ids().any(|id| claims.claimed.contains(id)) {
            continue;
        }
        if reported.insert(station.primary_id.as_str()) {
            reconciliation
                .observation_only
                .push(station.primary_id.clone());
        }
    }
    info!(
        "Reconciled {} model wells: {} matched, {} model-only, {} observation-only",
        model_wells.len(),
        reconciliation.matched.len(),
        reconciliation.model_only.len(),
        reconciliation.observation_only.len()
    );
    reconciliation
}
