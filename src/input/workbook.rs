//! スプレッドシートの読み込み

use std::path::{
    Path,
    PathBuf,
};

use calamine::{
    Data,
    Reader,
    open_workbook_auto,
};
use thiserror::Error;

use super::table::{
    CellValue,
    Column,
    Table,
};

/// 読み込みに対応する拡張子
pub const SPREADSHEET_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

#[derive(Error, Debug)]
pub enum TableError {
    /// 対応していない拡張子
    #[error("Unsupported file type '{}': expected one of .xlsx, .xls", .0.display())]
    UnsupportedExtension(PathBuf),

    /// ファイルを開けない、または壊れている
    #[error("Failed to open workbook '{}': {source}", path.display())]
    Open {
        /// 読み込もうとしたファイル
        path: PathBuf,
        /// calamine のエラー
        #[source]
        source: calamine::Error,
    },

    /// シートが 1 枚もない
    #[error("Workbook '{}' has no worksheet", .0.display())]
    NoWorksheet(PathBuf),

    /// 見出し行がない
    #[error("Worksheet in '{}' has no header row", .0.display())]
    NoHeader(PathBuf),
}

/// 拡張子がスプレッドシートかどうか (大文字小文字は区別しない)
#[must_use]
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SPREADSHEET_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

impl Table {
    /// 先頭のワークシートを読み込む
    ///
    /// 1 行目をヘッダーとして扱う。空のヘッダーは `Unnamed: <列番号>` になる。
    ///
    /// # Errors
    /// - 拡張子が `.xlsx` / `.xls` 以外
    /// - ファイルが開けない、または壊れている
    /// - ワークシートやヘッダー行がない
    pub fn load(path: &Path) -> Result<Self, TableError> {
        if !is_spreadsheet(path) {
            return Err(TableError::UnsupportedExtension(path.to_path_buf()));
        }

        tracing::debug!(path = %path.display(), "Loading workbook");

        let open_error = |source| TableError::Open { path: path.to_path_buf(), source };
        let mut workbook = open_workbook_auto(path).map_err(open_error)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| TableError::NoWorksheet(path.to_path_buf()))?
            .map_err(open_error)?;

        let mut rows = range.rows();
        let header = rows.next().ok_or_else(|| TableError::NoHeader(path.to_path_buf()))?;

        let mut columns: Vec<Column> = header
            .iter()
            .enumerate()
            .map(|(index, cell)| Column::new(header_name(index, cell), Vec::new()))
            .collect();

        for row in rows {
            for (column, cell) in columns.iter_mut().zip(row) {
                column.cells.push(cell_value(cell));
            }
        }

        let table = Self::from_columns(columns);
        tracing::debug!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.columns().len(),
            "Workbook loaded"
        );
        Ok(table)
    }
}

/// 見出しセルの列名 (空なら `Unnamed: <位置>`)
fn header_name(index: usize, cell: &Data) -> String {
    match cell_value(cell) {
        value if value.is_blank() => format!("Unnamed: {index}"),
        value => value.to_string(),
    }
}

/// calamine のセルを変換する
///
/// 日付と日時は `DateTime` に、経過時間は数値にする。
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            CellValue::Text(text.clone())
        }
        Data::Int(int) => CellValue::Int(*int),
        Data::Float(number) => CellValue::Number(*number),
        Data::Bool(flag) => CellValue::Bool(*flag),
        Data::DateTime(datetime) if datetime.is_datetime() => CellValue::DateTime(datetime.as_f64()),
        Data::DateTime(duration) => CellValue::Number(duration.as_f64()),
    }
}
