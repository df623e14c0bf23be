//! 入力ファイルの読み込み
/// Typed cells and column-oriented tables
pub mod table;
/// Translation source helpers
pub mod translation;
/// Spreadsheet reader
pub mod workbook;

pub use table::{
    CellValue,
    Column,
    Table,
};
pub use workbook::TableError;
