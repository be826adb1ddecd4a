pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};

/// 設定ファイルの既定名
pub const DEFAULT_CONFIG_FILE: &str = "bootloose.yaml";

/// 設定ファイルパスを指定する環境変数
pub const CONFIG_ENV: &str = "BOOTLOOSE_CONFIG";

/// キーストアのディレクトリを指定する環境変数
pub const KEY_STORE_ENV: &str = "BOOTLOOSE_KEY_STORE";

/// bootlooseの設定ディレクトリを取得（なければ作成）
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("bootloose");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// キーストアの既定ディレクトリ（`<config dir>/bootloose/keys`）
///
/// ディレクトリ自体はキーストアの初期化時に作成される。
pub fn default_key_store_dir() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("keys"))
}

/// クラスタ設定ファイルのパスを決定する
///
/// 優先順位:
/// 1. 明示的な指定（`--config`）
/// 2. 環境変数 BOOTLOOSE_CONFIG
/// 3. カレントディレクトリの bootloose.yaml
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        tracing::debug!(path = ?path, "Using config path from {}", CONFIG_ENV);
        return PathBuf::from(path);
    }

    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// 設定ファイルを探す。存在しない場合はエラー
pub fn find_config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    let path = resolve_config_path(explicit);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::ConfigFileNotFound(path))
    }
}
