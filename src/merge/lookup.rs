//! 翻訳ファイル横断の Lookup 構築
//!
//! すべての翻訳ファイルを処理順に読み込み、
//! (正規化済み ID, 正規化済み列名) をキーとする 1 つの表にまとめる。
//! 既に値があるキーは上書きしない (先に処理したファイルが勝つ)。

use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};

use super::report::{
    ColumnCount,
    CoverageReport,
    MergeStatistics,
    MismatchReport,
    SourceCoverage,
    SourceFailure,
    SourceMismatch,
};
use crate::input::translation::source_token;
use crate::input::{
    CellValue,
    Table,
};
use crate::normalize::{
    normalize_column_name,
    normalize_identifier,
};

/// Lookup のキー
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedKey {
    pub identifier: String,
    pub column: String,
}

/// 正規化済みキーから翻訳値への対応
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    /// 最初に入った値だけを保持する
    entries: HashMap<NormalizedKey, CellValue>,
}

impl Lookup {
    /// 正規化済みの ID と列名で値を引く
    #[must_use]
    pub fn get(&self, identifier: &str, column: &str) -> Option<&CellValue> {
        self.entries
            .get(&NormalizedKey { identifier: identifier.to_string(), column: column.to_string() })
    }

    /// 空いているキーにだけ値を入れる
    ///
    /// 空の値と空の ID は入れない。入れた場合は `true`。
    fn insert_if_vacant(&mut self, key: NormalizedKey, value: &CellValue) -> bool {
        if key.identifier.is_empty() || value.is_blank() {
            return false;
        }
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value.clone());
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lookup 構築の結果
#[derive(Debug, Clone, Default)]
pub struct LookupBuild {
    pub lookup: Lookup,
    pub coverage: CoverageReport,
}

/// 翻訳ファイルから Lookup を組み立てる
#[derive(Debug)]
pub struct LookupBuilder<'a> {
    /// 結合する列 (元の表記)
    requested_columns: &'a [String],
    /// 識別子列 (表記どおりに照合)
    id_column: &'a str,
    /// 組み立て中の Lookup
    lookup: Lookup,
    /// ソースごとの空でないセル数
    statistics: MergeStatistics,
    /// ソースごとの欠けている列
    mismatches: MismatchReport,
    /// 読み飛ばしたソース
    failures: Vec<SourceFailure>,
}

impl<'a> LookupBuilder<'a> {
    #[must_use]
    pub fn new(requested_columns: &'a [String], id_column: &'a str) -> Self {
        Self {
            requested_columns,
            id_column,
            lookup: Lookup::default(),
            statistics: MergeStatistics::default(),
            mismatches: MismatchReport::default(),
            failures: Vec::new(),
        }
    }

    /// 翻訳ファイルを読み込んで追加する
    ///
    /// 読み込みに失敗したファイルは記録してスキップする (エラーは返さない)。
    pub fn add_path(&mut self, path: &Path) {
        match Table::load(path) {
            Ok(table) => self.add_table(path, &table),
            Err(e) => self.record_failure(path, e.to_string()),
        }
    }

    /// 読み込み済みの翻訳表を追加する
    ///
    /// `path` はトークンの導出と報告にのみ使う。
    pub fn add_table(&mut self, path: &Path, table: &Table) {
        let Some(id_position) = table.position_exact(self.id_column) else {
            self.record_failure(path, format!("Identifier column '{}' not found", self.id_column));
            return;
        };

        let token = source_token(path);
        tracing::debug!(token = %token, path = %path.display(), rows = table.row_count(), "Adding translation source");

        self.record_coverage(&token, path, table);

        let identifiers: Vec<String> = table
            .columns()
            .get(id_position)
            .map(|column| column.cells.iter().map(normalize_identifier).collect())
            .unwrap_or_default();

        // 要求列だけでなく、ファイルにあるすべての列を入れる
        let mut inserted = 0_usize;
        for column in table.columns() {
            let column_name = normalize_column_name(&column.name);
            for (identifier, value) in identifiers.iter().zip(&column.cells) {
                let key = NormalizedKey { identifier: identifier.clone(), column: column_name.clone() };
                if self.lookup.insert_if_vacant(key, value) {
                    inserted += 1;
                }
            }
        }

        tracing::debug!(token = %token, inserted, "Translation source added");
    }

    /// 依頼された列ごとの有無と空でないセル数を記録する
    fn record_coverage(&mut self, token: &str, path: &Path, table: &Table) {
        let mut columns = Vec::new();
        let mut missing_columns = Vec::new();

        for requested in self.requested_columns {
            match table.column_normalized(requested) {
                Some(column) => columns.push(ColumnCount {
                    column: requested.clone(),
                    non_blank: column.cells.iter().filter(|cell| !cell.is_blank()).count(),
                }),
                None => missing_columns.push(requested.clone()),
            }
        }

        if !missing_columns.is_empty() {
            tracing::info!(token = %token, missing = ?missing_columns, "Requested columns missing from translation source");
        }

        self.statistics.push(SourceCoverage {
            token: token.to_string(),
            path: path.to_path_buf(),
            columns,
        });
        self.mismatches.push(SourceMismatch {
            token: token.to_string(),
            path: path.to_path_buf(),
            missing_columns,
        });
    }

    /// 読み飛ばしたソースを記録する
    fn record_failure(&mut self, path: &Path, message: String) {
        tracing::warn!(path = %path.display(), "Skipping translation source: {message}");
        self.failures.push(SourceFailure {
            token: source_token(path),
            path: PathBuf::from(path),
            message,
        });
    }

    /// 構築を終えて Lookup と集計を返す
    #[must_use]
    pub fn finish(self) -> LookupBuild {
        LookupBuild {
            lookup: self.lookup,
            coverage: CoverageReport::new(self.statistics, self.mismatches, self.failures),
        }
    }
}

/// 翻訳ファイルを順に読み込んで Lookup を作る
#[must_use]
pub fn build_lookup(
    translation_paths: &[PathBuf],
    requested_columns: &[String],
    id_column: &str,
) -> LookupBuild {
    let mut builder = LookupBuilder::new(requested_columns, id_column);
    for path in translation_paths {
        builder.add_path(path);
    }
    builder.finish()
}
