//! A library with common utilities for grading judge contests against course rosters.

pub mod classify;
pub mod client_api;
pub mod gradebook;
pub mod judge;
pub mod report;
pub mod roster;
pub mod team;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base URL of the judge platform.
pub const JUDGE_BASE_URL: &str = "https://vjudge.net";

/// Contest titles must contain this to be listed.
pub const DEFAULT_TITLE_FILTER: &str = "SCC0211";

/// How many contests to request from the listing endpoint in one page.
pub const CONTEST_PAGE_LENGTH: u32 = 100;

/// Course code that marks a contest as part of the course.
pub const COURSE_CODE: &str = "SCC0211";

/// Marker for team (mock exam) contests.
pub const MOCK_EXAM_MARKER: &str = "Simulado";

/// Default path of the generated report.
pub const DEFAULT_OUTPUT_PATH: &str = "Notas.csv";

/// Sheet mapping institutional IDs to handles: (document id, sheet id).
pub const ROSTER_SHEET: (&str, &str) = ("1vSAxQ5Idg0usQpud3OpXqZm3HgfIeZT4g8V3a-sJLWA", "737892149");

/// Team rosters and the contest each one applies to: (document id, sheet id, contest).
pub const TEAM_SHEETS: [(&str, &str, &str); 2] = [
    (
        "1Wzgyra6nsrPUo1zvl0yYZwKKpccYBIR6y6ihtMgRkgU",
        "1771707662",
        "SCC0211 - Simulado 1",
    ),
    (
        "1U5BADLoNBwwFI3qJE3LrDYfUzRRIdnwaqUTA5geBvlE",
        "1497459820",
        "SCC0211 - Simulado 2",
    ),
];

/// Problems solved by one handle in one contest.
pub type ProblemSet = BTreeSet<u32>;

/// Solved problems per lowercase handle, for a single contest.
pub type HandleProblems = BTreeMap<String, ProblemSet>;

/// Solved problems per handle, per contest name.
pub type ContestResults = BTreeMap<String, HandleProblems>;

/// A contest as listed by the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    pub id: u64,
    pub name: String,
}

/// Handles are case-insensitive on the judge, so every lookup uses this form.
#[must_use]
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().to_lowercase()
}

/// A sheet inside a spreadsheet document, exportable as CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    pub doc_id: String,
    pub sheet_id: String,
}

impl SheetRef {
    /// URL that downloads the sheet as CSV.
    #[must_use]
    pub fn export_url(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
            self.doc_id, self.sheet_id
        )
    }
}

impl From<(&str, &str)> for SheetRef {
    fn from((doc_id, sheet_id): (&str, &str)) -> Self {
        SheetRef {
            doc_id: doc_id.to_string(),
            sheet_id: sheet_id.to_string(),
        }
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.doc_id, self.sheet_id)
    }
}

/// Parses `DOC_ID:SHEET_ID`.
impl FromStr for SheetRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (doc_id, sheet_id) = s
            .split_once(':')
            .ok_or_else(|| format!("Expected DOC_ID:SHEET_ID, got {s:?}."))?;
        let (doc_id, sheet_id) = (doc_id.trim(), sheet_id.trim());
        if doc_id.is_empty() || sheet_id.is_empty() {
            return Err(format!("Expected DOC_ID:SHEET_ID, got {s:?}."));
        }
        Ok(SheetRef::from((doc_id, sheet_id)))
    }
}

/// A team roster sheet and the contest its rows give credit in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSheet {
    pub sheet: SheetRef,
    pub contest: String,
}

impl TeamSheet {
    /// The team sheets configured in source.
    #[must_use]
    pub fn defaults() -> Vec<TeamSheet> {
        TEAM_SHEETS
            .iter()
            .map(|(doc_id, sheet_id, contest)| TeamSheet {
                sheet: SheetRef::from((*doc_id, *sheet_id)),
                contest: (*contest).to_string(),
            })
            .collect()
    }
}

impl fmt::Display for TeamSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.sheet, self.contest)
    }
}

/// Parses `DOC_ID:SHEET_ID=CONTEST NAME`.
impl FromStr for TeamSheet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sheet, contest) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected DOC_ID:SHEET_ID=CONTEST, got {s:?}."))?;
        let contest = contest.trim();
        if contest.is_empty() {
            return Err(format!("Missing contest name in {s:?}."));
        }
        Ok(TeamSheet {
            sheet: sheet.parse()?,
            contest: contest.to_string(),
        })
    }
}

/// Data-consistency problems. These never stop a run: the affected record is
/// skipped and the report is built from whatever is left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A roster handle that has no accepted submission in any contest.
    NoParticipation { handle: String },
    /// A roster row that could not be used.
    MalformedRosterRow { line: usize, reason: String },
    /// A team sheet row that could not be used, fully or in part.
    MalformedTeamRow { line: usize, reason: String },
    /// The same institutional ID was registered twice; the later row wins.
    DuplicateId {
        id: u64,
        previous: String,
        handle: String,
    },
    /// A team sheet names a contest that was not fetched.
    MissingTeamContest { contest: String },
    /// A team submitted nothing under its declared handle.
    TeamHandleAbsent { handle: String, contest: String },
    /// A team member that is not in the roster.
    UnregisteredMember { id: u64, team_handle: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NoParticipation { handle } => {
                write!(f, "User {handle} did not participate in any contest.")
            }
            Warning::MalformedRosterRow { line, reason } => {
                write!(f, "Skipping roster line {line}: {reason}")
            }
            Warning::MalformedTeamRow { line, reason } => {
                write!(f, "Team sheet line {line}: {reason}")
            }
            Warning::DuplicateId {
                id,
                previous,
                handle,
            } => write!(
                f,
                "ID {id} registered for both {previous} and {handle}, keeping {handle}."
            ),
            Warning::MissingTeamContest { contest } => {
                write!(f, "Team contest {contest} was not found, no credit given.")
            }
            Warning::TeamHandleAbsent { handle, contest } => {
                write!(f, "User {handle} didn't participate in contest {contest}.")
            }
            Warning::UnregisteredMember { id, team_handle } => write!(
                f,
                "ID {id} is listed under team {team_handle} but did not register a handle."
            ),
        }
    }
}
