use crate::keystore::KeyStoreError;
use crate::ssh::SshError;
use bootloose_container::ContainerError;
use bootloose_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    #[error(transparent)]
    Ssh(#[from] SshError),

    #[error("マシン '{0}' は存在しません")]
    MachineNotFound(String),

    #[error("マシン '{machine}' のホストポートを取得できません（コンテナポート {port}）: {reason}")]
    HostPortUnresolved {
        machine: String,
        port: u16,
        reason: String,
    },

    #[error("マシン '{machine}' にコンテナポート {port} のマッピングがありません")]
    UnknownContainerPort { machine: String, port: u16 },

    #[error("SSH 鍵の準備に失敗しました ({path}): {message}")]
    SshKey { path: PathBuf, message: String },

    #[error("SSH 鍵が指定されていません（cluster.privateKey またはマシンの publicKey を設定してください）")]
    NoSshKey,

    #[error("SSH の接続先が不正です: {0}")]
    InvalidSshTarget(String),

    #[error("IO エラー ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ClusterError>;
