//! 表形式データの型定義
//!
//! スプレッドシートのセルは読み込み時に [`CellValue`] へ変換し、
//! 列名は正規化済みの名前から位置への索引で引けるようにする。

use std::collections::HashMap;
use std::fmt;

use crate::normalize::normalize_column_name;

/// 1 セル分の値
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 空セル
    Empty,
    /// 文字列
    Text(String),
    /// 整数
    Int(i64),
    /// 浮動小数
    Number(f64),
    /// 日付または日時 (Excel のシリアル値)
    ///
    /// 書き出し時に日付の表示形式を付け直すため、数値とは区別して持つ。
    DateTime(f64),
    /// 真偽値
    Bool(bool),
}

impl CellValue {
    /// 空セル、空白のみの文字列、NaN を空とみなす
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(number) | Self::DateTime(number) => number.is_nan(),
            Self::Int(_) | Self::Bool(_) => false,
        }
    }

    /// 結合先に書き込む「見つからなかった」値
    #[must_use]
    pub const fn sentinel() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Int(int) => write!(f, "{int}"),
            Self::Number(number) | Self::DateTime(number) => write_number(f, *number),
            Self::Bool(flag) => write!(f, "{flag}"),
        }
    }
}

/// 整数値の浮動小数は小数部なしで書く (`1001.0` -> `1001`)
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn write_number(f: &mut fmt::Formatter<'_>, number: f64) -> fmt::Result {
    /// 2^53
    const I64_BOUND: f64 = 9_007_199_254_740_992.0;

    if number.is_finite() && number.fract() == 0.0 && number.abs() < I64_BOUND {
        write!(f, "{}", number as i64)
    } else {
        write!(f, "{number}")
    }
}

/// 名前付きの 1 列
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self { name: name.into(), cells }
    }
}

/// 列指向の表
///
/// 列順はファイル上の順序を保つ。`index` は正規化済み列名から列位置への対応で、
/// 同じ名前に正規化される列が複数あれば先頭の列を指す。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// 列 (ファイル上の順序)
    columns: Vec<Column>,
    /// 全列共通の行数
    row_count: usize,
    /// 正規化済み列名 -> 列位置
    index: HashMap<String, usize>,
}

impl Table {
    /// 列の集合から表を作成する
    ///
    /// 列ごとの行数が揃っていない場合は短い列を空セルで埋める。
    #[must_use]
    pub fn from_columns(mut columns: Vec<Column>) -> Self {
        let row_count = columns.iter().map(|column| column.cells.len()).max().unwrap_or(0);
        for column in &mut columns {
            column.cells.resize(row_count, CellValue::Empty);
        }

        let mut table = Self { columns, row_count, index: HashMap::new() };
        table.rebuild_index();
        table
    }

    /// 列名の索引を作り直す
    fn rebuild_index(&mut self) {
        self.index.clear();
        for (position, column) in self.columns.iter().enumerate() {
            self.index.entry(normalize_column_name(&column.name)).or_insert(position);
        }
    }

    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// 列名を元の表記のまま返す
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    /// 表記が完全に一致する列を探す
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// 表記が完全に一致する列の位置
    #[must_use]
    pub fn position_exact(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// 大文字小文字・前後の空白を無視して列の位置を探す
    #[must_use]
    pub fn position_normalized(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize_column_name(name)).copied()
    }

    /// 大文字小文字・前後の空白を無視して列を探す
    #[must_use]
    pub fn column_normalized(&self, name: &str) -> Option<&Column> {
        self.position_normalized(name).and_then(|position| self.columns.get(position))
    }

    /// 指定位置の直後に列を挿入する
    ///
    /// `after` が範囲外なら末尾に追加する。戻り値は挿入した位置。
    pub fn insert_column_after(&mut self, after: Option<usize>, mut column: Column) -> usize {
        column.cells.resize(self.row_count, CellValue::Empty);
        let position = after.map_or(self.columns.len(), |p| (p + 1).min(self.columns.len()));
        self.columns.insert(position, column);
        self.rebuild_index();
        position
    }

    /// 既存列のセルを丸ごと置き換える
    ///
    /// 位置が範囲外なら何もせず `false` を返す。
    pub fn replace_cells(&mut self, position: usize, mut cells: Vec<CellValue>) -> bool {
        let row_count = self.row_count;
        let Some(column) = self.columns.get_mut(position) else {
            return false;
        };
        cells.resize(row_count, CellValue::Empty);
        column.cells = cells;
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    #[rstest]
    #[case::empty(CellValue::Empty, true)]
    #[case::empty_text(text(""), true)]
    #[case::whitespace(text("  \t"), true)]
    #[case::nan(CellValue::Number(f64::NAN), true)]
    #[case::text(text("Hello"), false)]
    #[case::zero(CellValue::Int(0), false)]
    #[case::number(CellValue::Number(1.5), false)]
    #[case::bool(CellValue::Bool(false), false)]
    #[case::date(CellValue::DateTime(45356.0), false)]
    #[case::nan_date(CellValue::DateTime(f64::NAN), true)]
    fn is_blank_cases(#[case] value: CellValue, #[case] expected: bool) {
        assert_that!(value.is_blank(), eq(expected));
    }

    #[rstest]
    #[case::integral_float(CellValue::Number(1001.0), "1001")]
    #[case::negative_integral(CellValue::Number(-3.0), "-3")]
    #[case::fraction(CellValue::Number(2.5), "2.5")]
    #[case::int(CellValue::Int(42), "42")]
    #[case::bool(CellValue::Bool(true), "true")]
    #[case::date(CellValue::DateTime(45356.0), "45356")]
    #[case::date_time(CellValue::DateTime(45356.5), "45356.5")]
    #[case::empty(CellValue::Empty, "")]
    #[case::text(text(" A1 "), " A1 ")]
    fn display_cases(#[case] value: CellValue, #[case] expected: &str) {
        assert_that!(value.to_string(), eq(expected));
    }

    #[rstest]
    fn from_columns_pads_short_columns() {
        let table = Table::from_columns(vec![
            Column::new("id", vec![text("a"), text("b")]),
            Column::new("outro", vec![text("x")]),
        ]);

        assert_that!(table.row_count(), eq(2));
        assert_eq!(table.columns()[1].cells[1], CellValue::Empty);
    }

    #[rstest]
    fn position_normalized_ignores_case_and_whitespace() {
        let table = Table::from_columns(vec![
            Column::new("Respondent.Serial", vec![]),
            Column::new(" Outro ", vec![]),
        ]);

        assert_that!(table.position_normalized("outro"), some(eq(1)));
        assert_that!(table.position_normalized("OUTRO  "), some(eq(1)));
        assert_that!(table.position_normalized("intro"), none());
        assert_that!(table.position_exact("outro"), none());
    }

    #[rstest]
    fn position_normalized_prefers_first_duplicate() {
        let table =
            Table::from_columns(vec![Column::new("Q1", vec![]), Column::new("q1 ", vec![])]);

        assert_that!(table.position_normalized("q1"), some(eq(0)));
    }

    #[rstest]
    fn insert_column_after_shifts_following_columns() {
        let mut table = Table::from_columns(vec![
            Column::new("id", vec![text("1")]),
            Column::new("q1", vec![text("a")]),
            Column::new("q2", vec![text("b")]),
        ]);

        let position = table.insert_column_after(Some(1), Column::new("q1_new", vec![]));

        assert_that!(position, eq(2));
        assert_that!(table.column_names(), elements_are![eq("id"), eq("q1"), eq("q1_new"), eq("q2")]);
        assert_that!(table.position_normalized("q2"), some(eq(3)));
        assert_eq!(table.columns()[2].cells, vec![CellValue::Empty]);
    }

    #[rstest]
    fn insert_column_after_none_appends() {
        let mut table = Table::from_columns(vec![Column::new("id", vec![text("1")])]);

        let position = table.insert_column_after(None, Column::new("extra", vec![text("x")]));

        assert_that!(position, eq(1));
        assert_that!(table.column_names(), elements_are![eq("id"), eq("extra")]);
    }

    #[rstest]
    fn replace_cells_out_of_range_is_rejected() {
        let mut table = Table::from_columns(vec![Column::new("id", vec![text("1")])]);

        assert_that!(table.replace_cells(5, vec![]), eq(false));
        assert_that!(table.replace_cells(0, vec![text("2")]), eq(true));
        assert_eq!(table.column("id").unwrap().cells, vec![text("2")]);
    }
}
