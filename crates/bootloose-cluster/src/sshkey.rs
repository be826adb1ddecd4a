//! クラスタ共通の SSH 鍵ペア
//!
//! 秘密鍵が既にあれば何もしません（上書きしない）。

use crate::error::{ClusterError, Result};
use crate::keystore::write_file;
use ssh_key::{Algorithm, LineEnding, PrivateKey};
use std::path::{Path, PathBuf};

/// 先頭の `~`（`~` 単体または `~/...`）をホームディレクトリに展開
pub fn expand_home(path: &str) -> Result<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(std::path::is_separator) => rest,
        _ => return Ok(PathBuf::from(path)),
    };

    let home = dirs::home_dir().ok_or_else(|| ClusterError::SshKey {
        path: PathBuf::from(path),
        message: "ホームディレクトリが見つかりません".to_string(),
    })?;
    Ok(home.join(rest.trim_start_matches(std::path::is_separator)))
}

/// 公開鍵ファイルのパス（`<秘密鍵>.pub`）
pub fn public_key_path(private_key: &Path) -> PathBuf {
    let mut path = private_key.as_os_str().to_owned();
    path.push(".pub");
    PathBuf::from(path)
}

/// Ed25519 の鍵ペアを生成して保存する
///
/// 秘密鍵は 0600、公開鍵は 0644。既に秘密鍵がある場合は false を返す。
pub fn ensure_ssh_key(path: &Path) -> Result<bool> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "SSH key already exists");
        return Ok(false);
    }

    let key_error = |message: String| ClusterError::SshKey {
        path: path.to_path_buf(),
        message,
    };

    let private_key = PrivateKey::random(&mut ssh_key::rand_core::OsRng, Algorithm::Ed25519)
        .map_err(|e| key_error(format!("鍵の生成に失敗しました: {}", e)))?;
    let private_pem = private_key
        .to_openssh(LineEnding::LF)
        .map_err(|e| key_error(format!("秘密鍵の変換に失敗しました: {}", e)))?;
    let public_line = private_key
        .public_key()
        .to_openssh()
        .map_err(|e| key_error(format!("公開鍵の変換に失敗しました: {}", e)))?;

    write_file(path, private_pem.as_bytes(), 0o600)
        .map_err(|e| key_error(format!("秘密鍵を保存できません: {}", e)))?;
    write_file(
        &public_key_path(path),
        format!("{}\n", public_line).as_bytes(),
        0o644,
    )
    .map_err(|e| key_error(format!("公開鍵を保存できません: {}", e)))?;

    tracing::info!("Generated SSH key pair: {}", path.display());
    Ok(true)
}
