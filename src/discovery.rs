//! 翻訳ファイルの探索

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    GlobBuilder,
    GlobMatcher,
};
use ignore::WalkBuilder;

/// 翻訳ファイル名のパターン (大文字小文字は区別しない)
const TRANSLATION_FILE_PATTERN: &str = "*_translated*.{xlsx,xls}";

/// 翻訳ファイル名の matcher (パターンが壊れていれば `None`)
fn translation_file_matcher() -> Option<GlobMatcher> {
    match GlobBuilder::new(TRANSLATION_FILE_PATTERN).case_insensitive(true).build() {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            tracing::error!("Invalid translation file pattern '{TRANSLATION_FILE_PATTERN}': {e}");
            None
        }
    }
}

/// メインファイルと同じディレクトリにある翻訳ファイルを探す
///
/// ファイル名に `_translated` を含み (大文字小文字は区別しない)、
/// 拡張子が `.xlsx` / `.xls` で、メインファイル自身ではないファイルを返す。
/// サブディレクトリは探さない。
///
/// 順序はディレクトリの列挙順のまま。この順序が Lookup の「先勝ち」を決める。
///
/// # Arguments
/// * `directory` - 探索するディレクトリ
/// * `main_file_name` - メインファイルのファイル名 (パスではない)
///
/// # Returns
/// 見つかった翻訳ファイルのパス。ディレクトリが読めない場合は空
#[must_use]
pub fn find_translation_files(directory: &Path, main_file_name: &str) -> Vec<PathBuf> {
    tracing::debug!(directory = %directory.display(), "Scanning for translation files");

    let Some(matcher) = translation_file_matcher() else {
        return Vec::new();
    };

    let mut found_files = Vec::new();

    for result in WalkBuilder::new(directory)
        .standard_filters(false)
        .max_depth(Some(1))
        .follow_links(false)
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        // ファイルのみを対象
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let file_name = entry.file_name();
        if file_name == main_file_name || !matcher.is_match(file_name) {
            continue;
        }

        found_files.push(entry.path().to_path_buf());
    }

    tracing::debug!(count = found_files.len(), "Translation files found");
    found_files
}
