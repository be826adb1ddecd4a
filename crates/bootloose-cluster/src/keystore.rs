//! 公開鍵のキーストア
//!
//! 1つの鍵を1つのファイルとして保存します。

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("キー '{0}' は既に存在します")]
    Conflict(String),

    #[error("キー '{0}' が見つかりません")]
    Missing(String),

    #[error("キーストアの操作に失敗しました ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

type Result<T> = std::result::Result<T, KeyStoreError>;

#[derive(Debug, Clone)]
pub struct KeyStore {
    base_path: PathBuf,
}

impl KeyStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// ストアのディレクトリを作成（既にあれば何もしない）
    pub fn init(&self) -> Result<()> {
        let io_err = |source| KeyStoreError::Io {
            path: self.base_path.clone(),
            source,
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o760)
                .create(&self.base_path)
                .map_err(io_err)
        }
        #[cfg(not(unix))]
        {
            fs::create_dir_all(&self.base_path).map_err(io_err)
        }
    }

    fn key_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    fn key_exists(&self, name: &str) -> bool {
        self.key_path(name).exists()
    }

    /// 鍵を保存する。同名の鍵があれば上書きせずにエラー
    pub fn store(&self, name: &str, key: &[u8]) -> Result<()> {
        if self.key_exists(name) {
            return Err(KeyStoreError::Conflict(name.to_string()));
        }

        let path = self.key_path(name);
        write_file(&path, key, 0o644).map_err(|source| KeyStoreError::Io { path, source })?;
        tracing::debug!(key = %name, "Stored key");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Vec<u8>> {
        if !self.key_exists(name) {
            return Err(KeyStoreError::Missing(name.to_string()));
        }
        let path = self.key_path(name);
        fs::read(&path).map_err(|source| KeyStoreError::Io { path, source })
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        if !self.key_exists(name) {
            return Err(KeyStoreError::Missing(name.to_string()));
        }
        let path = self.key_path(name);
        fs::remove_file(&path).map_err(|source| KeyStoreError::Io { path, source })?;
        tracing::debug!(key = %name, "Removed key");
        Ok(())
    }
}

/// ファイルを書き込み、パーミッションを明示的に設定する
pub(crate) fn write_file(path: &Path, data: &[u8], mode: u32) -> std::io::Result<()> {
    fs::write(path, data)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;
    Ok(())
}
