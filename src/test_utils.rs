//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]

use crate::input::{
    CellValue,
    Column,
    Table,
};

/// 列名のリストを作成する
pub(crate) fn columns(names: &[&str]) -> Vec<String> {
    names.iter().copied().map(String::from).collect()
}

/// 文字列セルだけのテスト用の表を作成する
///
/// 空文字列のセルは `CellValue::Empty` になる。
///
/// # Arguments
/// * `headers` - 列名
/// * `rows` - 行ごとのセル値 (列数に満たない行は空セルで埋める)
pub(crate) fn text_table(headers: &[&str], rows: &[&[&str]]) -> Table {
    let columns = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let cells = rows
                .iter()
                .map(|row| match row.get(index) {
                    Some(value) if !value.is_empty() => CellValue::Text((*value).to_string()),
                    _ => CellValue::Empty,
                })
                .collect();
            Column::new(*header, cells)
        })
        .collect();

    Table::from_columns(columns)
}

/// 列のセルを文字列として取り出す
pub(crate) fn column_text(table: &Table, name: &str) -> Vec<String> {
    table
        .column(name)
        .map(|column| column.cells.iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}
