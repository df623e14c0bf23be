//! Per-source coverage and mismatch reporting.

use std::path::PathBuf;

/// Non-blank cell count of one requested column in one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCount {
    pub column: String,
    pub non_blank: usize,
}

/// Coverage of one translation source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCoverage {
    /// Country/language token derived from the filename.
    pub token: String,
    pub path: PathBuf,
    pub columns: Vec<ColumnCount>,
}

/// Requested columns a translation source does not contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMismatch {
    pub token: String,
    pub path: PathBuf,
    pub missing_columns: Vec<String>,
}

/// A translation source that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub token: String,
    pub path: PathBuf,
    pub message: String,
}

/// Per-source non-blank counts, in processing order.
///
/// Counts every non-blank cell a source holds for a requested column,
/// whether or not the value ended up in the lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStatistics {
    /// Processing order.
    sources: Vec<SourceCoverage>,
}

impl MergeStatistics {
    /// Appends one source's counts.
    pub(crate) fn push(&mut self, coverage: SourceCoverage) {
        self.sources.push(coverage);
    }

    #[must_use]
    pub fn sources(&self) -> &[SourceCoverage] {
        &self.sources
    }

    /// First source recorded under `token`.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<&SourceCoverage> {
        self.sources.iter().find(|source| source.token == token)
    }

    /// Count for `column` in the first source recorded under `token`.
    #[must_use]
    pub fn count(&self, token: &str, column: &str) -> Option<usize> {
        self.get(token)?
            .columns
            .iter()
            .find(|count| count.column == column)
            .map(|count| count.non_blank)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Per-source lists of absent requested columns.
///
/// Sources that contain every requested column have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MismatchReport {
    /// Processing order, only sources with missing columns.
    sources: Vec<SourceMismatch>,
}

impl MismatchReport {
    /// Appends a source if it lacks any requested column.
    pub(crate) fn push(&mut self, mismatch: SourceMismatch) {
        if !mismatch.missing_columns.is_empty() {
            self.sources.push(mismatch);
        }
    }

    #[must_use]
    pub fn sources(&self) -> &[SourceMismatch] {
        &self.sources
    }

    #[must_use]
    pub fn missing_for(&self, token: &str) -> Option<&[String]> {
        self.sources
            .iter()
            .find(|source| source.token == token)
            .map(|source| source.missing_columns.as_slice())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Everything lookup construction learned about the translation sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    pub statistics: MergeStatistics,
    pub mismatches: MismatchReport,
    pub failures: Vec<SourceFailure>,
}

impl CoverageReport {
    #[must_use]
    pub const fn new(
        statistics: MergeStatistics,
        mismatches: MismatchReport,
        failures: Vec<SourceFailure>,
    ) -> Self {
        Self { statistics, mismatches, failures }
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn coverage(token: &str, counts: &[(&str, usize)]) -> SourceCoverage {
        SourceCoverage {
            token: token.to_string(),
            path: PathBuf::from(format!("P1__{token}_translated.xlsx")),
            columns: counts
                .iter()
                .map(|(column, non_blank)| ColumnCount {
                    column: (*column).to_string(),
                    non_blank: *non_blank,
                })
                .collect(),
        }
    }

    #[rstest]
    fn statistics_count_uses_first_matching_token() {
        let mut statistics = MergeStatistics::default();
        statistics.push(coverage("DEU", &[("outro", 3)]));
        statistics.push(coverage("DEU", &[("outro", 9)]));
        statistics.push(coverage("FRA", &[("outro", 1), ("q2", 0)]));

        assert_that!(statistics.count("DEU", "outro"), some(eq(3)));
        assert_that!(statistics.count("FRA", "q2"), some(eq(0)));
        assert_that!(statistics.count("FRA", "q3"), none());
        assert_that!(statistics.count("ITA", "outro"), none());
        assert_that!(statistics.sources().len(), eq(3));
    }

    #[rstest]
    fn mismatch_report_skips_complete_sources() {
        let mut mismatches = MismatchReport::default();
        mismatches.push(SourceMismatch {
            token: "DEU".to_string(),
            path: PathBuf::from("P1__DEU_translated.xlsx"),
            missing_columns: vec![],
        });
        mismatches.push(SourceMismatch {
            token: "FRA".to_string(),
            path: PathBuf::from("P1__FRA_translated.xlsx"),
            missing_columns: vec!["outro".to_string()],
        });

        assert_that!(mismatches.sources().len(), eq(1));
        assert_that!(mismatches.missing_for("DEU"), none());
        assert_eq!(mismatches.missing_for("FRA"), Some(&["outro".to_string()][..]));
    }
}
