//! コンテナが接続しているネットワーク

use bootloose_container::ContainerInspect;
use serde::Serialize;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeNetwork {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mask: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gateway: String,
}

/// プレフィックス長からドット区切りのネットマスクを作る
pub fn netmask(prefix_len: u8) -> Ipv4Addr {
    let bits = match prefix_len {
        0 => 0,
        len => u32::MAX << (32 - u32::from(len.min(32))),
    };
    Ipv4Addr::from(bits)
}

impl RuntimeNetwork {
    /// inspect 結果からネットワーク一覧を作成（名前順）
    pub fn from_inspect(inspect: &ContainerInspect) -> Vec<Self> {
        let mut networks: Vec<Self> = inspect
            .networks()
            .map(|(name, endpoint)| Self {
                name: name.clone(),
                ip: endpoint.ip_address.clone(),
                mask: netmask(endpoint.ip_prefix_len).to_string(),
                gateway: endpoint.gateway.clone(),
            })
            .collect();
        networks.sort_by(|a, b| a.name.cmp(&b.name));
        networks
    }
}
