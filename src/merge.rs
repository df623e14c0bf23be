//! Merge engine
//!
//! Joins translated columns from per-country translation files into the main
//! survey dataset, keyed by the normalized respondent identifier.
/// `_ENG_Trans` column writer
pub mod column;
/// Cross-file translation lookup
pub mod lookup;
/// Coverage and mismatch reporting
pub mod report;

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

pub use column::{
    ColumnTally,
    MERGED_COLUMN_SUFFIX,
    merged_column_name,
};
pub use lookup::{
    Lookup,
    LookupBuild,
    LookupBuilder,
    build_lookup,
};
pub use report::{
    CoverageReport,
    MergeStatistics,
    MismatchReport,
    SourceFailure,
};

use crate::input::{
    Table,
    TableError,
};

#[derive(Error, Debug)]
pub enum MergeError {
    /// メインファイルを読めない
    #[error("Failed to load main dataset: {0}")]
    MainLoad(#[source] TableError),

    /// メインファイルに識別子列がない
    #[error("Identifier column '{column}' not found in main dataset '{}'", path.display())]
    MissingIdColumn {
        /// 探した列名
        column: String,
        /// メインファイル
        path: PathBuf,
    },
}

/// Result of one merge invocation.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Main dataset with the `_ENG_Trans` columns.
    pub table: Table,
    /// One tally per requested column, in request order.
    pub tallies: Vec<ColumnTally>,
    /// Per-source statistics, mismatches and skipped files.
    pub coverage: CoverageReport,
    /// Number of translation files given, loadable or not.
    source_count: usize,
}

impl MergeOutcome {
    /// True when no translation source was supplied.
    #[must_use]
    pub const fn is_no_op(&self) -> bool {
        self.source_count == 0
    }

    #[must_use]
    pub fn total_not_found(&self) -> usize {
        self.tallies.iter().map(|tally| tally.not_found).sum()
    }

    #[must_use]
    pub const fn statistics(&self) -> &MergeStatistics {
        &self.coverage.statistics
    }

    #[must_use]
    pub const fn mismatches(&self) -> &MismatchReport {
        &self.coverage.mismatches
    }
}

/// Merge translations into the main dataset.
///
/// Translation sources are processed in the given order; the first source
/// holding a non-blank value for an (identifier, column) pair wins. Sources
/// that fail to load are skipped and listed in `coverage.failures`.
///
/// # Errors
/// - The main dataset cannot be loaded
/// - The main dataset has no column named exactly `id_column`
pub fn merge(
    main_path: &Path,
    translation_paths: &[PathBuf],
    requested_columns: &[String],
    id_column: &str,
) -> Result<MergeOutcome, MergeError> {
    tracing::info!(
        main = %main_path.display(),
        sources = translation_paths.len(),
        columns = ?requested_columns,
        "Starting merge"
    );

    let table = Table::load(main_path).map_err(MergeError::MainLoad)?;
    if table.column(id_column).is_none() {
        return Err(MergeError::MissingIdColumn {
            column: id_column.to_string(),
            path: main_path.to_path_buf(),
        });
    }

    if translation_paths.is_empty() {
        tracing::warn!("No translation files supplied; merged columns will be empty");
    }

    let build = build_lookup(translation_paths, requested_columns, id_column);
    tracing::debug!(entries = build.lookup.len(), "Lookup built");

    Ok(merge_table(table, build, requested_columns, id_column, translation_paths.len()))
}

/// In-memory half of [`merge`].
fn merge_table(
    mut table: Table,
    build: LookupBuild,
    requested_columns: &[String],
    id_column: &str,
    source_count: usize,
) -> MergeOutcome {
    let tallies = column::merge_columns(&mut table, &build.lookup, requested_columns, id_column);

    MergeOutcome { table, tallies, coverage: build.coverage, source_count }
}
