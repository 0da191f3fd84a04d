//! The grading report: solved problems per handle and contest, plus totals.

use crate::classify::{ContestClassifier, ContestKind};
use crate::gradebook::Gradebook;
use crate::roster::Roster;
use anyhow::{Context, Result};
use log::warn;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

pub const HANDLE_COLUMN: &str = "handle";
pub const ID_COLUMN: &str = "N.USP";
pub const REGULAR_TOTAL_COLUMN: &str = "Ex.Semanais";
pub const MOCK_TOTAL_COLUMN: &str = "Ex.Simulado";

/// A contest column of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportColumn {
    /// Contest name as listed by the judge.
    pub contest: String,
    /// Name shown in the header.
    pub title: String,
    pub kind: ContestKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub handle: String,
    /// Institutional ID, if the handle is registered.
    pub id: Option<u64>,
    /// Solved problems per contest, aligned with `Report::columns`.
    pub counts: Vec<usize>,
    pub regular_total: usize,
    pub mock_total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Build the report from the final (team-merged) gradebook.
    ///
    /// There is one row per handle that has a result in any contest, and
    /// one per registered handle, so a registered student who solved
    /// nothing still shows up with zeros. Rows and columns are sorted.
    #[must_use]
    pub fn build(gradebook: &Gradebook, roster: &Roster, classifier: &ContestClassifier) -> Self {
        let columns: Vec<ReportColumn> = gradebook
            .contests()
            .map(|contest| ReportColumn {
                contest: contest.to_string(),
                title: classifier.display_name(contest),
                kind: classifier.kind(contest),
            })
            .collect();

        let handles: BTreeSet<&str> = gradebook
            .handles()
            .iter()
            .map(String::as_str)
            .chain(roster.handles())
            .collect();

        let rows = handles
            .into_iter()
            .map(|handle| {
                let counts: Vec<usize> = columns
                    .iter()
                    .map(|column| gradebook.solved_count(&column.contest, handle))
                    .collect();
                let total_of = |kind: ContestKind| -> usize {
                    columns
                        .iter()
                        .zip(&counts)
                        .filter(|(column, _)| column.kind == kind)
                        .map(|(_, count)| count)
                        .sum()
                };
                ReportRow {
                    handle: handle.to_string(),
                    id: roster.id(handle),
                    regular_total: total_of(ContestKind::Regular),
                    mock_total: total_of(ContestKind::MockExam),
                    counts,
                }
            })
            .collect();

        let report = Report { columns, rows };
        for (title, contests) in report.duplicate_titles() {
            warn!(
                "Contests {} share the column title {title:?}.",
                contests.join(", ")
            );
        }
        report
    }

    /// Column titles used by more than one contest, with those contests.
    #[must_use]
    pub fn duplicate_titles(&self) -> Vec<(&str, Vec<&str>)> {
        let mut by_title: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for column in &self.columns {
            by_title
                .entry(column.title.as_str())
                .or_default()
                .push(column.contest.as_str());
        }
        by_title
            .into_iter()
            .filter(|(_, contests)| contests.len() > 1)
            .collect()
    }

    /// Header line of the CSV output.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![HANDLE_COLUMN.to_string(), ID_COLUMN.to_string()];
        header.extend(self.columns.iter().map(|c| c.title.clone()));
        header.push(REGULAR_TOTAL_COLUMN.to_string());
        header.push(MOCK_TOTAL_COLUMN.to_string());
        header
    }

    #[must_use]
    pub fn row(&self, handle: &str) -> Option<&ReportRow> {
        self.rows
            .binary_search_by(|row| row.handle.as_str().cmp(handle))
            .ok()
            .map(|index| &self.rows[index])
    }

    /// Solved count of `handle` in the contest named `contest`.
    #[must_use]
    pub fn count(&self, handle: &str, contest: &str) -> Option<usize> {
        let column = self.columns.iter().position(|c| c.contest == contest)?;
        self.row(handle).map(|row| row.counts[column])
    }

    /// Write the report as CSV. Unregistered handles get an empty ID cell.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer
            .write_record(self.header())
            .context("Failed to write report header")?;

        for row in &self.rows {
            let mut record = vec![
                row.handle.clone(),
                row.id.map(|id| id.to_string()).unwrap_or_default(),
            ];
            record.extend(row.counts.iter().map(ToString::to_string));
            record.push(row.regular_total.to_string());
            record.push(row.mock_total.to_string());
            csv_writer
                .write_record(&record)
                .with_context(|| format!("Failed to write report row for {}", row.handle))?;
        }

        csv_writer.flush().context("Failed to flush report")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::{TeamRow, merge_team_credit};
    use crate::{HandleProblems, ProblemSet};

    fn contest(entries: &[(&str, &[u32])]) -> HandleProblems {
        entries
            .iter()
            .map(|(handle, ids)| ((*handle).to_string(), ids.iter().copied().collect::<ProblemSet>()))
            .collect()
    }

    fn create_test_gradebook() -> Gradebook {
        let mut gradebook = Gradebook::new();
        gradebook.add_contest(
            "SCC0211 - Aula 2",
            contest(&[("alice", &[1, 2, 3]), ("dave", &[1])]),
        );
        gradebook.add_contest("SCC0211 - Aula 1", contest(&[("alice", &[1]), ("bob", &[1, 2])]));
        gradebook.add_contest("SCC0211 - Simulado 1", contest(&[("alice", &[4, 5])]));
        gradebook.add_contest("Maratona Extra", contest(&[("bob", &[7])]));
        gradebook
    }

    fn create_test_roster() -> Roster {
        let mut roster = Roster::default();
        roster.insert(111, "alice");
        roster.insert(222, "bob");
        roster.insert(333, "carol");
        roster
    }

    #[test_log::test]
    fn test_build_columns_and_rows() {
        let report = Report::build(
            &create_test_gradebook(),
            &create_test_roster(),
            &ContestClassifier::default(),
        );

        assert_eq!(
            report.header(),
            vec![
                "handle",
                "N.USP",
                "Maratona Extra",
                "Aula 1",
                "Aula 2",
                "Simulado 1",
                "Ex.Semanais",
                "Ex.Simulado"
            ]
        );
        let handles: Vec<&str> = report.rows.iter().map(|r| r.handle.as_str()).collect();
        assert_eq!(handles, vec!["alice", "bob", "carol", "dave"]);

        let alice = report.row("alice").unwrap();
        assert_eq!(alice.id, Some(111));
        assert_eq!(alice.counts, vec![0, 1, 3, 2]);
        assert_eq!(alice.regular_total, 4);
        assert_eq!(alice.mock_total, 2);

        let bob = report.row("bob").unwrap();
        assert_eq!(bob.counts, vec![1, 2, 0, 0]);
        // "Maratona Extra" is not a course contest
        assert_eq!(bob.regular_total, 2);
        assert_eq!(bob.mock_total, 0);

        let dave = report.row("dave").unwrap();
        assert_eq!(dave.id, None);
    }

    #[test_log::test]
    fn test_roster_only_handle_has_zero_row() {
        let report = Report::build(
            &create_test_gradebook(),
            &create_test_roster(),
            &ContestClassifier::default(),
        );

        let carol = report.row("carol").unwrap();
        assert_eq!(carol.id, Some(333));
        assert!(carol.counts.iter().all(|c| *c == 0));
        assert_eq!(carol.regular_total + carol.mock_total, 0);
    }

    #[test_log::test]
    fn test_totals_match_column_sums() {
        let report = Report::build(
            &create_test_gradebook(),
            &create_test_roster(),
            &ContestClassifier::default(),
        );

        for row in &report.rows {
            let sum_of = |kind: ContestKind| -> usize {
                report
                    .columns
                    .iter()
                    .zip(&row.counts)
                    .filter(|(c, _)| c.kind == kind)
                    .map(|(_, n)| n)
                    .sum()
            };
            assert_eq!(row.regular_total, sum_of(ContestKind::Regular));
            assert_eq!(row.mock_total, sum_of(ContestKind::MockExam));
        }
    }

    #[test_log::test]
    fn test_cells_follow_team_credit() {
        let mut gradebook = Gradebook::new();
        gradebook.add_contest("X - A", contest(&[("alice", &[1, 2])]));
        let mut roster = Roster::default();
        roster.insert(111, "bob");
        let rows = vec![TeamRow::new("alice", [Some(111), None, None])];

        merge_team_credit(&rows, "X - A", &roster, &mut gradebook);
        let report = Report::build(&gradebook, &roster, &ContestClassifier::default());

        assert_eq!(report.count("bob", "X - A"), Some(2));
        assert_eq!(report.count("alice", "X - A"), Some(2));
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.header()[2], "X - A");
    }

    #[test_log::test]
    fn test_duplicate_titles() {
        let mut gradebook = Gradebook::new();
        gradebook.add_contest("Aula 1", contest(&[("alice", &[1])]));
        gradebook.add_contest("SCC0211 - Aula 1", contest(&[("alice", &[2, 3])]));
        gradebook.add_contest("SCC0211 - Aula 2", contest(&[("alice", &[4])]));

        let report = Report::build(&gradebook, &Roster::default(), &ContestClassifier::default());

        assert_eq!(
            report.duplicate_titles(),
            vec![("Aula 1", vec!["Aula 1", "SCC0211 - Aula 1"])]
        );
        // both columns are kept, each with its own count
        assert_eq!(report.count("alice", "Aula 1"), Some(1));
        assert_eq!(report.count("alice", "SCC0211 - Aula 1"), Some(2));
    }

    #[test_log::test]
    fn test_no_duplicate_titles() {
        let report = Report::build(
            &create_test_gradebook(),
            &create_test_roster(),
            &ContestClassifier::default(),
        );
        assert!(report.duplicate_titles().is_empty());
    }

    #[test_log::test]
    fn test_write_csv() {
        let mut gradebook = Gradebook::new();
        gradebook.add_contest("SCC0211 - Aula 1", contest(&[("alice", &[1, 2]), ("zed", &[3])]));
        gradebook.add_contest("SCC0211 - Simulado 1", contest(&[("alice", &[1])]));
        let mut roster = Roster::default();
        roster.insert(111, "alice");

        let report = Report::build(&gradebook, &roster, &ContestClassifier::default());
        let mut out = Vec::new();
        report.write_csv(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\
handle,N.USP,Aula 1,Simulado 1,Ex.Semanais,Ex.Simulado
alice,111,2,1,2,1
zed,,1,0,1,0
"
        );
    }
}
