//! クラスタのライフサイクル管理
//!
//! テンプレートからマシンを展開し、コンテナランタイムへの問い合わせで
//! 状態を判定します。ローカルに状態は保存しません。

pub mod error;
pub mod keystore;
pub mod machine;
pub mod manager;
pub mod network;
pub mod replicator;
pub mod ssh;
pub mod sshkey;

#[cfg(test)]
mod fake;

pub use error::{ClusterError, Result};
pub use keystore::{KeyStore, KeyStoreError};
pub use machine::{Machine, MachineState, MachineStatus, PortStatus};
pub use manager::ClusterManager;
pub use network::RuntimeNetwork;
pub use replicator::Replicator;
pub use ssh::{OpenSshClient, RetryPolicy, SshClient, SshError, SshOutput, SshTarget};
