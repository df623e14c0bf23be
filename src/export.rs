//! 結合結果の書き出し
/// Append-only run log
pub mod audit_log;
/// Spreadsheet writer
pub mod workbook;

pub use audit_log::{
    AUDIT_LOG_FILE_NAME,
    AuditLogError,
    FailedRunLog,
    RunLog,
};
pub use workbook::{
    ExportError,
    write_table,
};
