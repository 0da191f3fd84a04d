//! Accumulates the accepted problems of every handle across all contests.

use crate::{ContestResults, HandleProblems, ProblemSet};
use log::warn;
use std::collections::BTreeSet;

/// Per-contest results of a run.
///
/// What each handle actually submitted is kept apart from what it is
/// credited with, so team credit is always given from real submissions and
/// never passes through a handle that only received credit itself.
#[derive(Debug, Clone, Default)]
pub struct Gradebook {
    submitted: ContestResults,
    credited: ContestResults,
    handles: BTreeSet<String>,
}

impl Gradebook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the accepted problems of a contest.
    /// A contest listed twice under the same name has its results merged.
    pub fn add_contest(&mut self, name: &str, submissions: HandleProblems) {
        if self.submitted.contains_key(name) {
            warn!("Contest {name} was listed more than once, merging its results.");
        }
        self.handles.extend(submissions.keys().cloned());

        for (handle, problems) in submissions {
            self.submitted
                .entry(name.to_string())
                .or_default()
                .entry(handle.clone())
                .or_default()
                .extend(problems.iter().copied());
            self.credited
                .entry(name.to_string())
                .or_default()
                .entry(handle)
                .or_default()
                .extend(problems);
        }
        // keep contests without any accepted submission as columns
        self.submitted.entry(name.to_string()).or_default();
        self.credited.entry(name.to_string()).or_default();
    }

    /// Give `handle` credit for `problems` in `contest`.
    /// Returns false if the contest is unknown, in which case nothing changes.
    pub fn credit(&mut self, contest: &str, handle: &str, problems: &ProblemSet) -> bool {
        let Some(results) = self.credited.get_mut(contest) else {
            return false;
        };
        results
            .entry(handle.to_string())
            .or_default()
            .extend(problems.iter().copied());
        self.handles.insert(handle.to_string());
        true
    }

    #[must_use]
    pub fn has_contest(&self, contest: &str) -> bool {
        self.credited.contains_key(contest)
    }

    /// Contest names, sorted.
    pub fn contests(&self) -> impl Iterator<Item = &str> {
        self.credited.keys().map(String::as_str)
    }

    /// Every handle with a submission or credit in some contest, sorted.
    #[must_use]
    pub fn handles(&self) -> &BTreeSet<String> {
        &self.handles
    }

    /// Problems `handle` got accepted under its own account.
    #[must_use]
    pub fn submitted(&self, contest: &str, handle: &str) -> Option<&ProblemSet> {
        self.submitted.get(contest)?.get(handle)
    }

    /// Problems `handle` is credited with, own submissions and team credit alike.
    #[must_use]
    pub fn solved(&self, contest: &str, handle: &str) -> Option<&ProblemSet> {
        self.credited.get(contest)?.get(handle)
    }

    /// Number of distinct problems credited to `handle`, 0 if none.
    #[must_use]
    pub fn solved_count(&self, contest: &str, handle: &str) -> usize {
        self.solved(contest, handle).map_or(0, BTreeSet::len)
    }

    /// Whether `handle` submitted an accepted solution to any contest.
    #[must_use]
    pub fn participated(&self, handle: &str) -> bool {
        self.submitted
            .values()
            .any(|results| results.contains_key(handle))
    }

    /// All credited results, by contest then handle.
    #[must_use]
    pub fn results(&self) -> &ContestResults {
        &self.credited
    }
}
