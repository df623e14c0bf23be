//! スプレッドシートの書き出し

use std::io::Write as _;
use std::path::{
    Path,
    PathBuf,
};

use rust_xlsxwriter::{
    Format,
    Workbook,
    XlsxError,
};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::input::{
    CellValue,
    Table,
};

/// 日付セルの表示形式
const DATE_FORMAT: &str = "yyyy-mm-dd";

/// 時刻を含む日時セルの表示形式
const DATE_TIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Error, Debug)]
pub enum ExportError {
    /// ワークブックの組み立てに失敗
    #[error("Failed to build workbook: {0}")]
    Xlsx(#[from] XlsxError),

    /// 書き込み先への書き込みに失敗
    #[error("Failed to write '{}': {source}", path.display())]
    Io {
        /// 書き込み先
        path: PathBuf,
        /// I/O エラー
        #[source]
        source: std::io::Error,
    },

    /// ワークシートの上限を超える
    #[error("Table is too large for a worksheet: {0}")]
    TooLarge(String),
}

/// 表を `.xlsx` として書き出す
///
/// 既存ファイルは上書きする。同じディレクトリの一時ファイルに書き切ってから
/// 置き換えるので、失敗しても書きかけのファイルは残らない。
///
/// # Errors
/// - ワークシートの行数・列数の上限を超える
/// - 書き込み先に書けない
pub fn write_table(table: &Table, destination: &Path) -> Result<(), ExportError> {
    tracing::debug!(destination = %destination.display(), rows = table.row_count(), "Writing workbook");

    let buffer = render_workbook(table)?;

    let io_error = |source: std::io::Error| ExportError::Io { path: destination.to_path_buf(), source };
    let directory =
        destination.parent().filter(|parent| !parent.as_os_str().is_empty()).unwrap_or(Path::new("."));

    // 一時ファイルは persist しなければ drop 時に消える
    let mut temp_file = NamedTempFile::new_in(directory).map_err(io_error)?;
    temp_file.write_all(&buffer).map_err(io_error)?;
    temp_file.persist(destination).map_err(|e| io_error(e.error))?;

    tracing::info!(destination = %destination.display(), "Workbook written");
    Ok(())
}

/// 日時のシリアル値に時刻部分があるか
fn has_time_of_day(serial: f64) -> bool {
    serial.fract().abs() > f64::EPSILON
}

/// 表を xlsx のバイト列に変換する
#[allow(clippy::cast_precision_loss)]
fn render_workbook(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let date_time_format = Format::new().set_num_format(DATE_TIME_FORMAT);
    let worksheet = workbook.add_worksheet();

    for (column_index, column) in table.columns().iter().enumerate() {
        let col = u16::try_from(column_index)
            .map_err(|_| ExportError::TooLarge(format!("{} columns", table.columns().len())))?;

        worksheet.write_string(0, col, column.name.as_str())?;

        for (row_index, cell) in column.cells.iter().enumerate() {
            let row = u32::try_from(row_index + 1)
                .map_err(|_| ExportError::TooLarge(format!("{} rows", table.row_count())))?;

            match cell {
                CellValue::Empty => {}
                CellValue::Text(text) if text.is_empty() => {}
                CellValue::Text(text) => {
                    worksheet.write_string(row, col, text.as_str())?;
                }
                CellValue::Int(int) => {
                    worksheet.write_number(row, col, *int as f64)?;
                }
                CellValue::Number(number) | CellValue::DateTime(number) if number.is_nan() => {}
                CellValue::Number(number) => {
                    worksheet.write_number(row, col, *number)?;
                }
                CellValue::DateTime(serial) => {
                    let format = if has_time_of_day(*serial) { &date_time_format } else { &date_format };
                    worksheet.write_number_with_format(row, col, *serial, format)?;
                }
                CellValue::Bool(flag) => {
                    worksheet.write_boolean(row, col, *flag)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
