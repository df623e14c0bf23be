//! 識別子の重なり診断
//!
//! 結合結果が空だったときに、メインファイルと翻訳ファイルで
//! 識別子や列名がどれだけ一致しているかを調べる。

use std::collections::{
    BTreeSet,
    HashSet,
};
use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use crate::input::{
    Column,
    Table,
    TableError,
};
use crate::normalize::{
    normalize_column_name,
    normalize_identifier,
};

/// 重なりのサンプルとして表示する識別子の数
pub const OVERLAP_SAMPLE_SIZE: usize = 10;

#[derive(Error, Debug)]
pub enum InspectError {
    /// どちらかのファイルを読めない
    #[error(transparent)]
    Load(#[from] TableError),

    /// 識別子列がない
    #[error("Identifier column '{column}' not found in '{}'", path.display())]
    MissingIdColumn {
        /// 探した列名
        column: String,
        /// 列がなかったファイル
        path: PathBuf,
    },
}

/// 翻訳ファイル側の 1 列の充足状況
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProbe {
    pub column: String,
    /// 翻訳ファイルに列が存在するか (大文字小文字・前後空白は無視)
    pub present: bool,
    /// 識別子が重なる行のうち、値が空でない行の数
    pub non_blank_overlapping: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapReport {
    pub main_id_count: usize,
    pub translation_id_count: usize,
    pub overlap_count: usize,
    /// 重なった識別子 (正規化済み、昇順で先頭から最大 10 件)
    pub overlap_sample: Vec<String>,
    pub shared_columns: Vec<String>,
    pub main_only_columns: Vec<String>,
    pub translation_only_columns: Vec<String>,
    pub probe: Option<ColumnProbe>,
}

/// 2 つのファイルを読み込んで識別子と列名の重なりを調べる
///
/// # Errors
/// - どちらかのファイルを読み込めない
/// - どちらかのファイルに識別子列がない
pub fn inspect_overlap(
    main_path: &Path,
    translation_path: &Path,
    id_column: &str,
    probe_column: Option<&str>,
) -> Result<OverlapReport, InspectError> {
    let main = Table::load(main_path)?;
    let translation = Table::load(translation_path)?;

    compare_tables(main_path, &main, translation_path, &translation, id_column, probe_column)
}

/// 読み込み済みの 2 つの表を比べる
fn compare_tables(
    main_path: &Path,
    main: &Table,
    translation_path: &Path,
    translation: &Table,
    id_column: &str,
    probe_column: Option<&str>,
) -> Result<OverlapReport, InspectError> {
    let main_ids = identifier_set(require_id_column(main, main_path, id_column)?);
    let translation_id_column = require_id_column(translation, translation_path, id_column)?;
    let translation_ids = identifier_set(translation_id_column);

    let overlap: BTreeSet<&String> = main_ids.intersection(&translation_ids).collect();

    let main_columns = column_name_set(main);
    let translation_columns = column_name_set(translation);

    let probe = probe_column.map(|column| ColumnProbe {
        column: column.to_string(),
        present: translation.column_normalized(column).is_some(),
        non_blank_overlapping: translation.column_normalized(column).map_or(0, |values| {
            count_non_blank_overlapping(translation_id_column, values, &main_ids)
        }),
    });

    let report = OverlapReport {
        main_id_count: main_ids.len(),
        translation_id_count: translation_ids.len(),
        overlap_count: overlap.len(),
        overlap_sample: overlap.iter().take(OVERLAP_SAMPLE_SIZE).map(|id| (*id).clone()).collect(),
        shared_columns: main_columns.intersection(&translation_columns).cloned().collect(),
        main_only_columns: main_columns.difference(&translation_columns).cloned().collect(),
        translation_only_columns: translation_columns.difference(&main_columns).cloned().collect(),
        probe,
    };
    tracing::debug!(overlap = report.overlap_count, "Identifier overlap inspected");

    Ok(report)
}

/// 識別子列を表記どおりに探す
fn require_id_column<'t>(
    table: &'t Table,
    path: &Path,
    id_column: &str,
) -> Result<&'t Column, InspectError> {
    table.column(id_column).ok_or_else(|| InspectError::MissingIdColumn {
        column: id_column.to_string(),
        path: path.to_path_buf(),
    })
}

/// 正規化済みの識別子 (空は除く)
fn identifier_set(column: &Column) -> BTreeSet<String> {
    column.cells.iter().map(normalize_identifier).filter(|id| !id.is_empty()).collect()
}

/// 正規化済みの列名
fn column_name_set(table: &Table) -> BTreeSet<String> {
    table.columns().iter().map(|column| normalize_column_name(&column.name)).collect()
}

/// メイン側にもある識別子の行で、空でない値を数える
fn count_non_blank_overlapping(
    id_column: &Column,
    values: &Column,
    main_ids: &BTreeSet<String>,
) -> usize {
    let overlapping: HashSet<usize> = id_column
        .cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| main_ids.contains(&normalize_identifier(cell)))
        .map(|(row, _)| row)
        .collect();

    values
        .cells
        .iter()
        .enumerate()
        .filter(|(row, cell)| overlapping.contains(row) && !cell.is_blank())
        .count()
}

impl fmt::Display for OverlapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of IDs in main file: {}", self.main_id_count)?;
        writeln!(f, "Number of IDs in translation file: {}", self.translation_id_count)?;
        writeln!(f, "Number of overlapping IDs: {}", self.overlap_count)?;
        writeln!(f, "Sample overlapping IDs: {}", self.overlap_sample.join(", "))?;
        writeln!(f)?;
        writeln!(f, "Columns in BOTH main and translation file: {}", self.shared_columns.join(", "))?;
        writeln!(f, "Columns ONLY in main file: {}", self.main_only_columns.join(", "))?;
        writeln!(f, "Columns ONLY in translation file: {}", self.translation_only_columns.join(", "))?;

        if let Some(probe) = &self.probe {
            writeln!(f)?;
            if probe.present {
                writeln!(
                    f,
                    "Rows in translation file with non-empty '{}' for overlapping IDs: {}",
                    probe.column, probe.non_blank_overlapping
                )?;
            } else {
                writeln!(f, "'{}' column not found in translation file.", probe.column)?;
            }
        }

        Ok(())
    }
}
