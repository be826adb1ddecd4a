//! ポートマッピング定義

use super::index::GlobalIndex;
use serde::{Deserialize, Serialize};

/// コンテナポートとホストポートの対応
///
/// YAML形式：
/// ```yaml
/// portMappings:
/// - containerPort: 22
///   hostPort: 2222
///   address: 127.0.0.1
///   protocol: tcp
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    /// コンテナ側のポート（必須）
    pub container_port: u16,
    /// ホスト側のベースポート。未指定ならランタイムが自動割り当て
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<u16>,
    /// バインドアドレス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// プロトコル（tcp / udp）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl PortMapping {
    pub fn new(container_port: u16) -> Self {
        Self {
            container_port,
            ..Default::default()
        }
    }

    /// 実際に公開するホストポートを計算
    ///
    /// ベースポートにクラスタ全体の通し番号を足したもの。
    /// `hostPort: 0` は未指定と同じ扱い。
    pub fn effective_host_port(&self, index: GlobalIndex) -> Option<u32> {
        self.host_port
            .filter(|port| *port != 0)
            .map(|port| u32::from(port) + index.get() as u32)
    }
}
