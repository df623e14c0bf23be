//! translation-merge
//!
//! 国別に翻訳されたアンケート回答を、回答者 ID をキーにしてメインのデータセットへ結合する。

pub mod config;
pub mod discovery;
pub mod export;
pub mod input;
pub mod inspect;
pub mod merge;
pub mod normalize;
pub mod run;

#[cfg(test)]
/// テスト用の表ヘルパー
mod test_utils;

pub use merge::{
    MergeError,
    MergeOutcome,
    merge,
};
pub use run::{
    MergeRequest,
    RunError,
    RunSummary,
    run_merge,
};
