//! Mapping between institutional IDs and judge handles.

use crate::gradebook::Gradebook;
use crate::{Warning, normalize_handle};
use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// A row of the registration sheet. Other columns in the sheet are ignored.
#[derive(Debug, Deserialize)]
struct RosterRecord {
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    nusp: Option<String>,
}

/// Parse an institutional ID cell. Empty cells and `NaN` mean "no ID".
/// Spreadsheet exports sometimes render whole numbers as `12345.0`.
///
/// # Errors
/// Returns an error if the cell holds anything else that is not a whole number.
pub fn parse_optional_id(raw: Option<&str>) -> Result<Option<u64>, String> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let digits = raw.strip_suffix(".0").unwrap_or(raw);
    digits
        .parse::<u64>()
        .map(Some)
        .map_err(|_| format!("{raw:?} is not an institutional ID"))
}

/// Registered participants, looked up either way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    by_id: BTreeMap<u64, String>,
    by_handle: BTreeMap<String, u64>,
}

impl Roster {
    /// Register `handle` under `id`. If the ID was taken, the new handle
    /// replaces the old one and the displaced handle is returned.
    pub fn insert(&mut self, id: u64, handle: &str) -> Option<String> {
        let handle = normalize_handle(handle);
        let previous = self.by_id.insert(id, handle.clone());
        if let Some(previous) = &previous
            && self.by_handle.get(previous) == Some(&id)
        {
            // fall back to the highest ID the displaced handle still holds
            match self.by_id.iter().rev().find(|(_, h)| *h == previous) {
                Some((other_id, _)) => {
                    self.by_handle.insert(previous.clone(), *other_id);
                }
                None => {
                    self.by_handle.remove(previous);
                }
            }
        }
        self.by_handle.insert(handle, id);
        previous
    }

    /// Read the registration sheet. Needs `handle` and `nusp` columns.
    /// Unusable rows are skipped with a warning.
    ///
    /// # Errors
    /// Returns an error if the CSV itself cannot be read.
    pub fn from_csv<R: Read>(reader: R) -> Result<(Self, Vec<Warning>)> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut roster = Roster::default();
        let mut warnings = Vec::new();
        for (index, record) in csv_reader.deserialize::<RosterRecord>().enumerate() {
            // the header is line 1
            let line = index + 2;
            let record = record.with_context(|| format!("Failed to read roster line {line}"))?;

            let handle = record.handle.as_deref().map(normalize_handle);
            let Some(handle) = handle.filter(|h| !h.is_empty()) else {
                warnings.push(Warning::MalformedRosterRow {
                    line,
                    reason: "no handle".to_string(),
                });
                continue;
            };
            let id = match parse_optional_id(record.nusp.as_deref()) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    warnings.push(Warning::MalformedRosterRow {
                        line,
                        reason: format!("no institutional ID for {handle}"),
                    });
                    continue;
                }
                Err(reason) => {
                    warnings.push(Warning::MalformedRosterRow { line, reason });
                    continue;
                }
            };

            if let Some(previous) = roster.insert(id, &handle)
                && previous != handle
            {
                warnings.push(Warning::DuplicateId {
                    id,
                    previous,
                    handle,
                });
            }
        }

        for warning in &warnings {
            warn!("{warning}");
        }
        Ok((roster, warnings))
    }

    /// Handle registered under `id`.
    #[must_use]
    pub fn handle(&self, id: u64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// ID registered for `handle`. If several IDs share a handle, the last registered wins.
    #[must_use]
    pub fn id(&self, handle: &str) -> Option<u64> {
        self.by_handle.get(handle).copied()
    }

    /// Registered handles, sorted and without repeats.
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.by_handle.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Warn about registered handles that never got a problem accepted.
    pub fn check_participation(&self, gradebook: &Gradebook) -> Vec<Warning> {
        let warnings: Vec<Warning> = self
            .handles()
            .filter(|handle| !gradebook.participated(handle))
            .map(|handle| Warning::NoParticipation {
                handle: handle.to_string(),
            })
            .collect();
        for warning in &warnings {
            warn!("{warning}");
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HandleProblems, ProblemSet};

    #[test]
    fn test_parse_optional_id() {
        assert_eq!(parse_optional_id(None), Ok(None));
        assert_eq!(parse_optional_id(Some("")), Ok(None));
        assert_eq!(parse_optional_id(Some("  ")), Ok(None));
        assert_eq!(parse_optional_id(Some("NaN")), Ok(None));
        assert_eq!(parse_optional_id(Some("12345")), Ok(Some(12345)));
        assert_eq!(parse_optional_id(Some(" 12345.0 ")), Ok(Some(12345)));
        assert!(parse_optional_id(Some("abc")).is_err());
        assert!(parse_optional_id(Some("12.5")).is_err());
    }

    #[test_log::test]
    fn test_from_csv() {
        let csv = "\
Timestamp,nome,nusp,handle
2021/08/01,Alice,111,Alice
2021/08/01,Bob,222.0, bob
2021/08/02,Nobody,,ghost
2021/08/02,Nameless,333,
";
        let (roster, warnings) = Roster::from_csv(csv.as_bytes()).unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.handle(111), Some("alice"));
        assert_eq!(roster.handle(222), Some("bob"));
        assert_eq!(roster.id("alice"), Some(111));
        assert_eq!(roster.id("ghost"), None);
        assert_eq!(roster.handles().collect::<Vec<_>>(), vec!["alice", "bob"]);
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            warnings[0],
            Warning::MalformedRosterRow { line: 4, .. }
        ));
        assert!(matches!(
            warnings[1],
            Warning::MalformedRosterRow { line: 5, .. }
        ));
    }

    #[test_log::test]
    fn test_from_csv_duplicate_id() {
        let csv = "handle,nusp\nalice,111\nalicia,111\n";
        let (roster, warnings) = Roster::from_csv(csv.as_bytes()).unwrap();

        assert_eq!(roster.handle(111), Some("alicia"));
        assert_eq!(roster.id("alicia"), Some(111));
        assert_eq!(roster.id("alice"), None);
        assert_eq!(
            warnings,
            vec![Warning::DuplicateId {
                id: 111,
                previous: "alice".to_string(),
                handle: "alicia".to_string(),
            }]
        );
    }

    #[test_log::test]
    fn test_reassigned_id_keeps_other_ids_of_handle() {
        let csv = "handle,nusp\nteam1,111\nteam1,222\nbob,222\n";
        let (roster, warnings) = Roster::from_csv(csv.as_bytes()).unwrap();

        assert_eq!(roster.handle(111), Some("team1"));
        assert_eq!(roster.handle(222), Some("bob"));
        assert_eq!(roster.id("team1"), Some(111));
        assert_eq!(roster.id("bob"), Some(222));
        assert_eq!(roster.handles().collect::<Vec<_>>(), vec!["bob", "team1"]);
        assert_eq!(
            warnings,
            vec![Warning::DuplicateId {
                id: 222,
                previous: "team1".to_string(),
                handle: "bob".to_string(),
            }]
        );

        // team1 never submitted, but is still registered and gets a zero row
        let report = crate::report::Report::build(
            &Gradebook::new(),
            &roster,
            &crate::classify::ContestClassifier::default(),
        );
        let rows: Vec<(&str, Option<u64>)> = report
            .rows
            .iter()
            .map(|row| (row.handle.as_str(), row.id))
            .collect();
        assert_eq!(rows, vec![("bob", Some(222)), ("team1", Some(111))]);
        assert_eq!(
            roster.check_participation(&Gradebook::new()).len(),
            2
        );
    }

    #[test_log::test]
    fn test_shared_handle_keeps_last_id() {
        let mut roster = Roster::default();
        roster.insert(111, "team1");
        roster.insert(222, "Team1");

        assert_eq!(roster.handle(111), Some("team1"));
        assert_eq!(roster.handle(222), Some("team1"));
        assert_eq!(roster.id("team1"), Some(222));
    }

    #[test_log::test]
    fn test_check_participation() {
        let mut roster = Roster::default();
        roster.insert(111, "alice");
        roster.insert(222, "carol");

        let mut gradebook = Gradebook::new();
        let mut results = HandleProblems::new();
        results.insert("alice".to_string(), ProblemSet::from([1]));
        gradebook.add_contest("SCC0211 - A", results);

        assert_eq!(
            roster.check_participation(&gradebook),
            vec![Warning::NoParticipation {
                handle: "carol".to_string()
            }]
        );
    }
}
