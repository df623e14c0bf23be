//! 設定ファイル (`.translation-merge.json`) の読み込み
/// Config file loader
mod loader;
/// Configuration types and settings
mod types;

pub use loader::{
    CONFIG_FILE_NAME,
    load_settings,
};
pub use types::{
    ConfigError,
    MergeSettings,
    ValidationError,
};
