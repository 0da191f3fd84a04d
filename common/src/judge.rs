//! Payloads returned by the judge and their conversion into contest results.

use crate::{Contest, HandleProblems, normalize_handle};
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Verdict flag the judge uses for an accepted submission.
pub const ACCEPTED_FLAG: i64 = 1;

/// Response of the contest listing endpoint.
/// Each record is a positional array: `[id, title, ...]`.
#[derive(Debug, Deserialize)]
pub struct ContestListData {
    pub data: Vec<Vec<Value>>,
}

/// Response of the single-contest rank endpoint.
#[derive(Debug, Deserialize)]
pub struct RankData {
    /// `[participant id, problem index, verdict flag, time, ...]`
    pub submissions: Vec<Vec<Value>>,
    /// Participant id (as a string) to `[handle, display name, ...]`.
    pub participants: HashMap<String, Vec<Value>>,
}

/// Ids show up both as JSON numbers and as numeric strings.
fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert the listing records into contests, keeping the judge's order.
///
/// # Errors
/// Returns an error if a record has no usable id or title.
pub fn parse_contest_list(list: &ContestListData) -> Result<Vec<Contest>> {
    list.data
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let id = record
                .first()
                .and_then(value_to_u64)
                .ok_or_else(|| anyhow!("Contest record #{index} has no id: {record:?}"))?;
            let name = record
                .get(1)
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("Contest record #{index} has no title: {record:?}"))?;
            Ok(Contest {
                id,
                name: name.to_string(),
            })
        })
        .collect()
}

/// Collect the accepted problems of every participant.
/// Resubmissions of a problem collapse into one entry.
///
/// # Errors
/// Returns an error if an accepted submission is malformed or points to an
/// unknown participant.
pub fn accepted_by_handle(rank: &RankData) -> Result<HandleProblems> {
    let mut handle_problems = HandleProblems::new();

    for (index, submission) in rank.submissions.iter().enumerate() {
        let verdict = submission.get(2).and_then(Value::as_i64);
        if verdict != Some(ACCEPTED_FLAG) {
            continue;
        }

        let participant_id = submission
            .first()
            .and_then(value_to_u64)
            .ok_or_else(|| anyhow!("Submission #{index} has no participant: {submission:?}"))?;
        let problem = submission
            .get(1)
            .and_then(value_to_u64)
            .and_then(|p| u32::try_from(p).ok())
            .ok_or_else(|| anyhow!("Submission #{index} has no problem: {submission:?}"))?;

        let handle = rank
            .participants
            .get(&participant_id.to_string())
            .and_then(|p| p.first())
            .and_then(Value::as_str)
            .with_context(|| format!("Participant {participant_id} is missing a handle"))?;

        handle_problems
            .entry(normalize_handle(handle))
            .or_default()
            .insert(problem);
    }

    Ok(handle_problems)
}
