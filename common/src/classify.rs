//! Tell course contests apart by their titles.

use crate::{COURSE_CODE, MOCK_EXAM_MARKER};

/// What a contest counts towards in the report.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContestKind {
    /// A weekly course contest.
    Regular,
    /// A team contest run as a mock exam.
    MockExam,
    /// Not a course contest; shown but not summed.
    Other,
}

/// Classifies contests by substrings of their titles. Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestClassifier {
    pub course_code: String,
    pub mock_marker: String,
}

impl Default for ContestClassifier {
    fn default() -> Self {
        ContestClassifier::new(COURSE_CODE, MOCK_EXAM_MARKER)
    }
}

impl ContestClassifier {
    #[must_use]
    pub fn new(course_code: &str, mock_marker: &str) -> Self {
        ContestClassifier {
            course_code: course_code.to_string(),
            mock_marker: mock_marker.to_string(),
        }
    }

    #[must_use]
    pub fn is_course_contest(&self, name: &str) -> bool {
        name.contains(&self.course_code)
    }

    #[must_use]
    pub fn is_mock_exam(&self, name: &str) -> bool {
        self.is_course_contest(name) && name.contains(&self.mock_marker)
    }

    #[must_use]
    pub fn is_regular(&self, name: &str) -> bool {
        self.is_course_contest(name) && !name.contains(&self.mock_marker)
    }

    #[must_use]
    pub fn kind(&self, name: &str) -> ContestKind {
        if self.is_mock_exam(name) {
            ContestKind::MockExam
        } else if self.is_regular(name) {
            ContestKind::Regular
        } else {
            ContestKind::Other
        }
    }

    /// Column title for a contest: the course code and the separator around
    /// it are dropped, so `"SCC0211 - Aula 1"` becomes `"Aula 1"`.
    #[must_use]
    pub fn display_name(&self, name: &str) -> String {
        if !self.is_course_contest(name) {
            return name.to_string();
        }
        let stripped = name
            .replacen(&self.course_code, "", 1)
            .trim_matches(|c: char| c.is_whitespace() || c == '-')
            .to_string();
        // a title made only of the course code keeps it
        if stripped.is_empty() {
            name.to_string()
        } else {
            stripped
        }
    }
}
