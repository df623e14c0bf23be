//! Column merging: writes `<column>_ENG_Trans` next to each requested column.

use super::lookup::Lookup;
use crate::input::{
    CellValue,
    Column,
    Table,
};
use crate::normalize::{
    normalize_column_name,
    normalize_identifier,
};

/// Suffix of the column holding merged translations.
pub const MERGED_COLUMN_SUFFIX: &str = "_ENG_Trans";

/// Found/not-found tally of one merged column.
///
/// `found + not_found` always equals the main table's row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTally {
    /// Column name as requested by the caller.
    pub requested: String,
    /// Name of the written `_ENG_Trans` column.
    pub column: String,
    pub found: usize,
    pub not_found: usize,
}

/// Name of the merged column for `column`.
#[must_use]
pub fn merged_column_name(column: &str) -> String {
    format!("{column}{MERGED_COLUMN_SUFFIX}")
}

/// Merge every requested column, in order.
#[must_use]
pub fn merge_columns(
    table: &mut Table,
    lookup: &Lookup,
    requested_columns: &[String],
    id_column: &str,
) -> Vec<ColumnTally> {
    let identifiers: Vec<String> = table
        .column(id_column)
        .map(|column| column.cells.iter().map(normalize_identifier).collect())
        .unwrap_or_default();

    requested_columns
        .iter()
        .map(|requested| merge_column(table, lookup, requested, &identifiers))
        .collect()
}

/// Merge one requested column.
///
/// `identifiers` are the main table's normalized identifiers, row by row.
/// The requested name is resolved case-insensitively against the main table;
/// when absent it is used verbatim and the merged column goes to the end.
/// An existing merged column with the exact name is overwritten in place.
pub fn merge_column(
    table: &mut Table,
    lookup: &Lookup,
    requested: &str,
    identifiers: &[String],
) -> ColumnTally {
    let resolved_position = table.position_normalized(requested);
    let resolved_name = resolved_position
        .and_then(|position| table.columns().get(position))
        .map_or_else(|| requested.to_string(), |column| column.name.clone());
    let lookup_column = normalize_column_name(requested);

    let mut found = 0;
    let cells: Vec<CellValue> = (0..table.row_count())
        .map(|row| {
            let hit = identifiers
                .get(row)
                .filter(|identifier| !identifier.is_empty())
                .and_then(|identifier| lookup.get(identifier, &lookup_column))
                .filter(|value| !value.is_blank());
            match hit {
                Some(value) => {
                    found += 1;
                    value.clone()
                }
                None => CellValue::sentinel(),
            }
        })
        .collect();
    let not_found = table.row_count() - found;

    let merged_name = merged_column_name(&resolved_name);
    match table.position_exact(&merged_name) {
        Some(existing) => {
            table.replace_cells(existing, cells);
        }
        None => {
            if resolved_position.is_none() {
                tracing::warn!(column = %requested, "Requested column not in main dataset, appending merged column at the end");
            }
            table.insert_column_after(resolved_position, Column::new(merged_name.clone(), cells));
        }
    }

    tracing::info!(column = %merged_name, found, not_found, "Merged column");

    ColumnTally { requested: requested.to_string(), column: merged_name, found, not_found }
}
