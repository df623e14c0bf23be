//! 実行ログ (`translation_merge.txt`) の生成と追記
//!
//! 1 回の実行ごとに 1 ブロックを追記する。既存の内容は消さない。

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{
    Path,
    PathBuf,
};
use std::time::Duration;

use chrono::{
    DateTime,
    Local,
};
use thiserror::Error;

use crate::merge::{
    ColumnTally,
    CoverageReport,
};

/// 出力ディレクトリ内のログファイル名 (固定)
pub const AUDIT_LOG_FILE_NAME: &str = "translation_merge.txt";

/// ログに書く日時の書式
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
#[error("Failed to append audit log '{}': {source}", path.display())]
pub struct AuditLogError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// 成功した実行の記録
#[derive(Debug, Clone)]
pub struct RunLog {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
    pub main_path: PathBuf,
    pub translation_paths: Vec<PathBuf>,
    pub requested_columns: Vec<String>,
    pub id_column: String,
    pub tallies: Vec<ColumnTally>,
    pub destination: PathBuf,
    pub coverage: CoverageReport,
}

/// 途中で失敗した実行の記録
#[derive(Debug, Clone)]
pub struct FailedRunLog {
    pub started_at: DateTime<Local>,
    pub main_path: PathBuf,
    pub error: String,
}

/// ログファイルのパス
#[must_use]
pub fn audit_log_path(directory: &Path) -> PathBuf {
    directory.join(AUDIT_LOG_FILE_NAME)
}

/// パスをカンマ区切りで並べる
fn join_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|path| path.display().to_string()).collect::<Vec<_>>().join(", ")
}

impl RunLog {
    /// 全列の未検出行数の合計
    #[must_use]
    pub fn total_not_found(&self) -> usize {
        self.tallies.iter().map(|tally| tally.not_found).sum()
    }

    /// ログブロックを文字列にする
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        // String への書き込みは失敗しない
        let _ = self.write_block(&mut out);
        out
    }

    /// 成功ブロックの本文を書く
    fn write_block(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out)?;
        writeln!(out, "--- Translation Merge Run ---")?;
        writeln!(out, "Start time: {}", self.started_at.format(TIMESTAMP_FORMAT))?;
        writeln!(out, "End time: {}", self.finished_at.format(TIMESTAMP_FORMAT))?;
        writeln!(out, "Run time (seconds): {:.2}", self.elapsed.as_secs_f64())?;
        writeln!(out)?;

        writeln!(out, "Main file: {}", self.main_path.display())?;
        writeln!(out, "Translation files: {}", join_paths(&self.translation_paths))?;
        writeln!(out, "Number of translation files: {}", self.translation_paths.len())?;
        writeln!(out)?;

        writeln!(out, "Columns merged: {}", self.requested_columns.join(", "))?;
        for tally in &self.tallies {
            writeln!(
                out,
                "  {} - {} found, {} not found",
                tally.column, tally.found, tally.not_found
            )?;
        }
        writeln!(out)?;

        writeln!(
            out,
            "Number of rows not found in translation files (by {}): {}",
            self.id_column,
            self.total_not_found()
        )?;
        writeln!(out)?;
        writeln!(out, "Path to the saved merged file: {}", self.destination.display())?;

        if !self.coverage.failures.is_empty() {
            writeln!(out)?;
            writeln!(out, "--- Skipped translation files ---")?;
            for failure in &self.coverage.failures {
                writeln!(out, "{}: {}", failure.path.display(), failure.message)?;
            }
        }

        writeln!(out)?;
        writeln!(out, "--- Requested columns missing per country ---")?;
        if self.coverage.mismatches.is_empty() {
            writeln!(out, "None")?;
        }
        for mismatch in self.coverage.mismatches.sources() {
            writeln!(out, "{}", mismatch.token)?;
            for column in &mismatch.missing_columns {
                writeln!(out, "  {column}")?;
            }
        }

        writeln!(out)?;
        writeln!(out, "--- Per-country, per-column merge stats ---")?;
        for source in self.coverage.statistics.sources() {
            writeln!(out, "{}", source.token)?;
            for count in &source.columns {
                writeln!(out, "  {} - {} non blank cells merged", count.column, count.non_blank)?;
            }
            writeln!(out)?;
        }

        Ok(())
    }

    /// `directory` のログファイルに追記する
    ///
    /// # Errors
    /// ログファイルを開けない、または書き込めない
    pub fn append_to(&self, directory: &Path) -> Result<PathBuf, AuditLogError> {
        append_block(directory, &self.render())
    }
}

impl FailedRunLog {
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "\n--- Translation Merge Run ---\nStart time: {}\n\nMain file: {}\nError: {}\n",
            self.started_at.format(TIMESTAMP_FORMAT),
            self.main_path.display(),
            self.error
        )
    }

    /// `directory` のログファイルに追記する
    ///
    /// # Errors
    /// ログファイルを開けない、または書き込めない
    pub fn append_to(&self, directory: &Path) -> Result<PathBuf, AuditLogError> {
        append_block(directory, &self.render())
    }
}

/// ログファイルの末尾にブロックを追記する
fn append_block(directory: &Path, block: &str) -> Result<PathBuf, AuditLogError> {
    let path = audit_log_path(directory);
    let to_error = |source| AuditLogError { path: path.clone(), source };

    let mut file = OpenOptions::new().create(true).append(true).open(&path).map_err(to_error)?;
    file.write_all(block.as_bytes()).map_err(to_error)?;

    tracing::debug!(path = %path.display(), "Audit log appended");
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use chrono::TimeZone;
    use googletest::prelude::*;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;
    use crate::merge::LookupBuilder;
    use crate::test_utils::{
        columns,
        text_table,
    };

    const ID: &str = "Respondent.Serial";

    #[fixture]
    fn run_log() -> RunLog {
        let requested = columns(&["outro", "q2"]);
        let mut builder = LookupBuilder::new(&requested, ID);
        builder.add_table(
            Path::new("/data/P1__DEU_translated.xlsx"),
            &text_table(&[ID, "outro"], &[&["a1", "Hello"], &["b2", ""]]),
        );
        builder.add_table(
            Path::new("/data/P1__FRA_translated.xlsx"),
            &text_table(&[ID, "outro", "q2"], &[&["c3", "Salut", "Oui"]]),
        );
        let coverage = builder.finish().coverage;

        RunLog {
            started_at: Local.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
            finished_at: Local.with_ymd_and_hms(2026, 10, 18, 9, 30, 2).unwrap(),
            elapsed: Duration::from_millis(2_346),
            main_path: PathBuf::from("/data/P1__Overall.xlsx"),
            translation_paths: vec![
                PathBuf::from("/data/P1__DEU_translated.xlsx"),
                PathBuf::from("/data/P1__FRA_translated.xlsx"),
            ],
            requested_columns: requested,
            id_column: ID.to_string(),
            tallies: vec![
                ColumnTally {
                    requested: "outro".to_string(),
                    column: "outro_ENG_Trans".to_string(),
                    found: 2,
                    not_found: 1,
                },
                ColumnTally {
                    requested: "q2".to_string(),
                    column: "q2_ENG_Trans".to_string(),
                    found: 1,
                    not_found: 2,
                },
            ],
            destination: PathBuf::from("/data/P1__Overall_Merged.xlsx"),
            coverage,
        }
    }

    #[rstest]
    fn render_contains_run_summary(run_log: RunLog) {
        let text = run_log.render();

        assert_that!(text, contains_substring("--- Translation Merge Run ---"));
        assert_that!(text, contains_substring("Start time: 2026-10-18 09:30:00"));
        assert_that!(text, contains_substring("End time: 2026-10-18 09:30:02"));
        assert_that!(text, contains_substring("Run time (seconds): 2.35"));
        assert_that!(text, contains_substring("Number of translation files: 2"));
        assert_that!(text, contains_substring("Columns merged: outro, q2"));
        assert_that!(text, contains_substring("  outro_ENG_Trans - 2 found, 1 not found"));
        assert_that!(
            text,
            contains_substring("Number of rows not found in translation files (by Respondent.Serial): 3")
        );
        assert_that!(
            text,
            contains_substring("Path to the saved merged file: /data/P1__Overall_Merged.xlsx")
        );
    }

    #[rstest]
    fn render_contains_mismatches_and_statistics(run_log: RunLog) {
        let text = run_log.render();

        assert_that!(text, contains_substring("--- Requested columns missing per country ---\nDEU\n  q2\n"));
        assert_that!(text, contains_substring("DEU\n  outro - 1 non blank cells merged\n"));
        assert_that!(
            text,
            contains_substring("FRA\n  outro - 1 non blank cells merged\n  q2 - 1 non blank cells merged\n")
        );
        assert_that!(text, not(contains_substring("Skipped translation files")));
    }

    #[rstest]
    fn append_to_keeps_previous_runs(run_log: RunLog) {
        let temp_dir = TempDir::new().unwrap();

        let path = run_log.append_to(temp_dir.path()).unwrap();
        run_log.append_to(temp_dir.path()).unwrap();

        assert_eq!(path, temp_dir.path().join(AUDIT_LOG_FILE_NAME));
        let content = fs::read_to_string(&path).unwrap();
        assert_that!(content.matches("--- Translation Merge Run ---").count(), eq(2));
    }

    #[rstest]
    fn append_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let failed = FailedRunLog {
            started_at: Local::now(),
            main_path: PathBuf::from("/data/P1__Overall.xlsx"),
            error: "boom".to_string(),
        };

        let result = failed.append_to(&temp_dir.path().join("missing"));

        assert_that!(result, err(anything()));
    }

    #[rstest]
    fn failed_run_records_error() {
        let failed = FailedRunLog {
            started_at: Local.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
            main_path: PathBuf::from("/data/P1__Overall.xlsx"),
            error: "Failed to load main dataset".to_string(),
        };

        let text = failed.render();

        assert_that!(text, contains_substring("Start time: 2026-10-18 09:30:00"));
        assert_that!(text, contains_substring("Error: Failed to load main dataset"));
    }
}
