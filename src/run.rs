//! 1 回分の結合処理
//!
//! 探索、結合、書き出し、実行ログへの追記を順に行う。

use std::path::{
    Path,
    PathBuf,
};
use std::time::{
    Duration,
    Instant,
};

use chrono::Local;
use thiserror::Error;

use crate::config::MergeSettings;
use crate::discovery::find_translation_files;
use crate::export::{
    AuditLogError,
    ExportError,
    FailedRunLog,
    RunLog,
    write_table,
};
use crate::export::audit_log::audit_log_path;
use crate::merge::{
    MergeError,
    MergeOutcome,
    merge,
};

#[derive(Error, Debug)]
pub enum RunError {
    /// 結合する列が指定されていない
    #[error("No columns selected for merging")]
    NoColumns,

    /// メインファイルの読み込みまたは識別子列の確認に失敗
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// 結合結果を書き出せない
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// 結合の依頼内容
#[derive(Debug, Clone, Default)]
pub struct MergeRequest {
    pub main_path: PathBuf,
    /// `None` ならメインファイルと同じディレクトリから探す
    pub translation_paths: Option<Vec<PathBuf>>,
    /// 空なら設定ファイルの `columns` を使う
    pub columns: Vec<String>,
    /// `None` なら設定ファイルの `idColumn` を使う
    pub id_column: Option<String>,
    /// `None` なら `<stem><outputSuffix>.xlsx`
    pub output_path: Option<PathBuf>,
}

/// 成功した実行の結果
#[derive(Debug)]
pub struct RunSummary {
    pub destination: PathBuf,
    pub translation_paths: Vec<PathBuf>,
    pub outcome: MergeOutcome,
    pub elapsed: Duration,
    pub log_path: PathBuf,
    /// 結合ファイルは書けたがログに追記できなかった
    pub log_error: Option<AuditLogError>,
}

/// 書き出しまで終わった実行の中身
struct Executed {
    /// 使った翻訳ファイル (処理順)
    translation_paths: Vec<PathBuf>,
    /// 結合した列
    columns: Vec<String>,
    /// 照合に使った識別子列
    id_column: String,
    /// 結合結果
    outcome: MergeOutcome,
}

/// 結合を実行し、結果を書き出してログに追記する
///
/// # Errors
/// - 結合する列が 1 つもない
/// - メインファイルを読めない、または識別子列がない
/// - 結合結果を書き出せない
pub fn run_merge(request: &MergeRequest, settings: &MergeSettings) -> Result<RunSummary, RunError> {
    let columns =
        if request.columns.is_empty() { settings.columns.clone() } else { request.columns.clone() };
    if columns.is_empty() {
        return Err(RunError::NoColumns);
    }

    let started_at = Local::now();
    let timer = Instant::now();
    let destination = request
        .output_path
        .clone()
        .unwrap_or_else(|| default_output_path(&request.main_path, &settings.output_suffix));
    let log_directory = parent_directory(&destination);

    let executed = match execute(request, settings, columns, &destination) {
        Ok(executed) => executed,
        Err(error) => {
            let failed = FailedRunLog {
                started_at,
                main_path: request.main_path.clone(),
                error: error.to_string(),
            };
            if let Err(log_error) = failed.append_to(&log_directory) {
                tracing::warn!("{log_error}");
            }
            return Err(error);
        }
    };

    let elapsed = timer.elapsed();
    let run_log = RunLog {
        started_at,
        finished_at: Local::now(),
        elapsed,
        main_path: request.main_path.clone(),
        translation_paths: executed.translation_paths.clone(),
        requested_columns: executed.columns,
        id_column: executed.id_column,
        tallies: executed.outcome.tallies.clone(),
        destination: destination.clone(),
        coverage: executed.outcome.coverage.clone(),
    };

    let log_error = run_log.append_to(&log_directory).err();
    if let Some(error) = &log_error {
        tracing::warn!("{error}");
    }

    tracing::info!(
        destination = %destination.display(),
        elapsed_secs = elapsed.as_secs_f64(),
        not_found = executed.outcome.total_not_found(),
        "Merge run finished"
    );

    Ok(RunSummary {
        destination,
        translation_paths: executed.translation_paths,
        outcome: executed.outcome,
        elapsed,
        log_path: audit_log_path(&log_directory),
        log_error,
    })
}

/// 探索から書き出しまでを行う (ログは書かない)
fn execute(
    request: &MergeRequest,
    settings: &MergeSettings,
    columns: Vec<String>,
    destination: &Path,
) -> Result<Executed, RunError> {
    let id_column = request.id_column.clone().unwrap_or_else(|| settings.id_column.clone());

    let translation_paths = match &request.translation_paths {
        Some(paths) => paths.clone(),
        None => discover_beside(&request.main_path),
    };
    if translation_paths.is_empty() {
        tracing::warn!(main = %request.main_path.display(), "No translation files found");
    }

    let outcome = merge(&request.main_path, &translation_paths, &columns, &id_column)?;
    write_table(&outcome.table, destination)?;

    Ok(Executed { translation_paths, columns, id_column, outcome })
}

/// メインファイルと同じディレクトリの翻訳ファイル
#[must_use]
pub fn discover_beside(main_path: &Path) -> Vec<PathBuf> {
    let main_file_name =
        main_path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();

    find_translation_files(&parent_directory(main_path), &main_file_name)
}

/// `<dir>/<stem><suffix>.xlsx`
///
/// `.xls` の入力でも出力は `.xlsx` になる。
#[must_use]
pub fn default_output_path(main_path: &Path, suffix: &str) -> PathBuf {
    let stem = main_path
        .file_stem()
        .map_or_else(|| "merged".to_string(), |stem| stem.to_string_lossy().into_owned());

    main_path.with_file_name(format!("{stem}{suffix}.xlsx"))
}

/// 親ディレクトリ (相対パスのファイル名だけなら `.`)
#[must_use]
pub fn parent_directory(path: &Path) -> PathBuf {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;
    use crate::export::AUDIT_LOG_FILE_NAME;
    use crate::input::Table;
    use crate::test_utils::{
        column_text,
        columns,
        text_table,
    };

    const ID: &str = "Respondent.Serial";

    #[rstest]
    #[case("/data/P1__Overall.xlsx", "/data/P1__Overall_Merged.xlsx")]
    #[case("/data/P1__Overall.xls", "/data/P1__Overall_Merged.xlsx")]
    #[case("main.xlsx", "main_Merged.xlsx")]
    fn default_output_path_appends_suffix(#[case] main: &str, #[case] expected: &str) {
        assert_eq!(default_output_path(Path::new(main), "_Merged"), Path::new(expected));
    }

    #[rstest]
    #[case("main.xlsx", ".")]
    #[case("/data/main.xlsx", "/data")]
    fn parent_directory_defaults_to_current(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(parent_directory(Path::new(path)), Path::new(expected));
    }

    #[rstest]
    fn run_without_columns_fails_before_touching_disk() {
        let temp_dir = TempDir::new().unwrap();
        let request = MergeRequest {
            main_path: temp_dir.path().join("P1__Overall.xlsx"),
            ..MergeRequest::default()
        };

        let result = run_merge(&request, &MergeSettings::default());

        assert!(matches!(result, Err(RunError::NoColumns)));
        assert!(!temp_dir.path().join(AUDIT_LOG_FILE_NAME).exists());
    }

    #[rstest]
    fn run_discovers_sources_and_writes_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let main_path = temp_dir.path().join("P1__Overall.xlsx");
        write_table(&text_table(&[ID, "outro"], &[&["a1", "Hallo"], &["b2", "Hej"]]), &main_path)
            .unwrap();
        write_table(
            &text_table(&[ID, "outro"], &[&["a1", "Hello"]]),
            &temp_dir.path().join("P1__DEU_translated.xlsx"),
        )
        .unwrap();

        let settings = MergeSettings { columns: columns(&["outro"]), ..MergeSettings::default() };
        let request = MergeRequest { main_path, ..MergeRequest::default() };

        let summary = run_merge(&request, &settings).unwrap();

        assert_eq!(summary.destination, temp_dir.path().join("P1__Overall_Merged.xlsx"));
        assert_that!(summary.translation_paths.len(), eq(1));
        assert!(summary.log_error.is_none());

        let merged = Table::load(&summary.destination).unwrap();
        assert_that!(column_text(&merged, "outro_ENG_Trans"), elements_are![eq("Hello"), eq("")]);

        let log = fs::read_to_string(&summary.log_path).unwrap();
        assert_that!(log, contains_substring("Columns merged: outro"));
        assert_that!(log, contains_substring("(by Respondent.Serial): 1"));
    }

    #[rstest]
    fn failed_run_appends_error_block() {
        let temp_dir = TempDir::new().unwrap();
        let main_path = temp_dir.path().join("P1__Overall.xlsx");
        write_table(&text_table(&["Serial", "outro"], &[&["a1", "Hallo"]]), &main_path).unwrap();

        let request = MergeRequest {
            main_path,
            translation_paths: Some(Vec::new()),
            columns: columns(&["outro"]),
            ..MergeRequest::default()
        };

        let result = run_merge(&request, &MergeSettings::default());

        assert!(matches!(result, Err(RunError::Merge(MergeError::MissingIdColumn { .. }))));
        let log = fs::read_to_string(temp_dir.path().join(AUDIT_LOG_FILE_NAME)).unwrap();
        assert_that!(log, contains_substring("Error: Identifier column 'Respondent.Serial' not found"));
        assert!(!temp_dir.path().join("P1__Overall_Merged.xlsx").exists());
    }

    #[rstest]
    fn log_failure_keeps_merged_file() {
        let temp_dir = TempDir::new().unwrap();
        let main_path = temp_dir.path().join("P1__Overall.xlsx");
        write_table(&text_table(&[ID, "outro"], &[&["a1", "Hallo"]]), &main_path).unwrap();
        write_table(
            &text_table(&[ID, "outro"], &[&["a1", "Hello"]]),
            &temp_dir.path().join("P1__DEU_translated.xlsx"),
        )
        .unwrap();
        // ログファイル名をディレクトリで塞いで追記を失敗させる
        fs::create_dir(temp_dir.path().join(AUDIT_LOG_FILE_NAME)).unwrap();

        let request = MergeRequest { main_path, columns: columns(&["outro"]), ..MergeRequest::default() };

        let summary = run_merge(&request, &MergeSettings::default()).unwrap();

        assert!(summary.log_error.is_some());
        assert!(summary.destination.exists());
        let merged = Table::load(&summary.destination).unwrap();
        assert_that!(column_text(&merged, "outro_ENG_Trans"), elements_are![eq("Hello")]);
    }
}
