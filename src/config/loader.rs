//! 設定ファイルの読み込み関数

use std::io::ErrorKind;
use std::path::Path;

use super::{
    ConfigError,
    MergeSettings,
};

/// 設定ファイル名
pub const CONFIG_FILE_NAME: &str = ".translation-merge.json";

/// ディレクトリから設定を読み込む
///
/// `.translation-merge.json` ファイルを探して読み込む
///
/// # Arguments
/// * `directory` - メインファイルのあるディレクトリ
///
/// # Returns
/// - `Ok(Some(settings))`: 設定ファイルが見つかり、読み込みに成功
/// - `Ok(None)`: 設定ファイルが見つからない
/// - `Err(ConfigError)`: ファイル読み込みまたはパースエラー
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub(super) fn load_from_directory(directory: &Path) -> Result<Option<MergeSettings>, ConfigError> {
    let config_path = directory.join(CONFIG_FILE_NAME);

    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %config_path.display(), "No settings file, using defaults");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(path = %config_path.display(), "Settings file read");
    Ok(Some(serde_json::from_str(&content)?))
}

/// 設定を読み込み、バリデーションする
///
/// 設定ファイルがなければデフォルト値を使う。
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
/// - バリデーションエラー
pub fn load_settings(directory: &Path) -> Result<MergeSettings, ConfigError> {
    let settings = load_from_directory(directory)?.unwrap_or_default();

    settings.validate().map_err(ConfigError::ValidationErrors)?;
    tracing::debug!("Settings loaded successfully: {:?}", settings);

    Ok(settings)
}
