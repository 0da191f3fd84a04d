//! Team contests are submitted from one member's account.
//! These utilities credit every declared teammate with the team's problems.

use crate::gradebook::Gradebook;
use crate::roster::{Roster, parse_optional_id};
use crate::{Warning, normalize_handle};
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::io::Read;

/// Most members a team row can declare.
pub const MAX_TEAM_MEMBERS: usize = 3;

#[derive(Debug, Deserialize)]
struct TeamRecord {
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    nusp1: Option<String>,
    #[serde(default)]
    nusp2: Option<String>,
    #[serde(default)]
    nusp3: Option<String>,
}

/// One team: the handle it submitted under and the IDs of its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRow {
    pub handle: String,
    pub members: [Option<u64>; MAX_TEAM_MEMBERS],
}

impl TeamRow {
    #[must_use]
    pub fn new(handle: &str, members: [Option<u64>; MAX_TEAM_MEMBERS]) -> Self {
        TeamRow {
            handle: normalize_handle(handle),
            members,
        }
    }

    /// Declared member IDs, empty slots skipped.
    pub fn member_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.members.iter().flatten().copied()
    }
}

/// Read a team sheet with `handle`, `nusp1`, `nusp2` and `nusp3` columns.
/// Rows without a handle and unreadable ID cells are skipped with a warning.
///
/// # Errors
/// Returns an error if the CSV itself cannot be read.
pub fn read_team_rows<R: Read>(reader: R) -> Result<(Vec<TeamRow>, Vec<Warning>)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    for (index, record) in csv_reader.deserialize::<TeamRecord>().enumerate() {
        let line = index + 2;
        let record = record.with_context(|| format!("Failed to read team line {line}"))?;

        let handle = record.handle.as_deref().map(normalize_handle);
        let Some(handle) = handle.filter(|h| !h.is_empty()) else {
            warnings.push(Warning::MalformedTeamRow {
                line,
                reason: "skipped, team has no handle".to_string(),
            });
            continue;
        };

        let mut members = [None; MAX_TEAM_MEMBERS];
        let slots = [&record.nusp1, &record.nusp2, &record.nusp3];
        for (member, slot) in members.iter_mut().zip(slots) {
            match parse_optional_id(slot.as_deref()) {
                Ok(id) => *member = id,
                Err(reason) => warnings.push(Warning::MalformedTeamRow { line, reason }),
            }
        }
        rows.push(TeamRow { handle, members });
    }

    for warning in &warnings {
        warn!("{warning}");
    }
    Ok((rows, warnings))
}

/// Credit every member of every team with the problems the team got
/// accepted in `contest`.
///
/// Credit flows only from what a team handle submitted itself, so running
/// this again, or over the rows in another order, gives the same result.
/// Problems are added, never removed.
pub fn merge_team_credit(
    rows: &[TeamRow],
    contest: &str,
    roster: &Roster,
    gradebook: &mut Gradebook,
) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if !gradebook.has_contest(contest) {
        warnings.push(Warning::MissingTeamContest {
            contest: contest.to_string(),
        });
    } else {
        for row in rows {
            let Some(team_problems) = gradebook.submitted(contest, &row.handle).cloned() else {
                warnings.push(Warning::TeamHandleAbsent {
                    handle: row.handle.clone(),
                    contest: contest.to_string(),
                });
                continue;
            };

            for id in row.member_ids() {
                let Some(member) = roster.handle(id) else {
                    warnings.push(Warning::UnregisteredMember {
                        id,
                        team_handle: row.handle.clone(),
                    });
                    continue;
                };
                debug!(
                    "Crediting {member} with {} problems from {} in {contest}",
                    team_problems.len(),
                    row.handle
                );
                gradebook.credit(contest, member, &team_problems);
            }
        }
    }

    for warning in &warnings {
        warn!("{warning}");
    }
    warnings
}
