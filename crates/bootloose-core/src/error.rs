use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("YAMLパースエラー: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON変換エラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定:\n{}", .0.iter().map(|e| format!("  • {}", e)).collect::<Vec<_>>().join("\n"))]
    InvalidConfig(Vec<String>),

    #[error("設定キー '{key}' が存在しません（パス: {path}）")]
    UnknownKey { path: String, key: String },

    #[error("'{key}' は配列のインデックスではありません（パス: {path}）")]
    InvalidIndex { path: String, key: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
