//! Identifier and column-name normalization.

use crate::input::table::CellValue;

/// Canonical form of a respondent identifier: string form, trimmed, lower-cased.
///
/// Integral floats lose their fractional part so `1001.0` and `"1001"` compare equal.
#[must_use]
pub fn normalize_identifier(value: &CellValue) -> String {
    value.to_string().trim().to_lowercase()
}

/// Canonical form of a column header.
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}
