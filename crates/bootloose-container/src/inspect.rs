//! `docker inspect` の出力（必要な部分のみ）
//!
//! ランタイムは値のない項目に `null` を返すことがあるため、
//! コレクションはすべて Option で受ける。

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mounts: Option<Vec<MountPoint>>,
    #[serde(default)]
    pub config: Option<ContainerConfig>,
    #[serde(default)]
    pub network_settings: Option<NetworkSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MountPoint {
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(rename = "Source", default)]
    pub source: String,
    #[serde(rename = "Destination", default)]
    pub destination: String,
    #[serde(rename = "RW", default)]
    pub rw: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub cmd: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkSettings {
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
    #[serde(rename = "Ports", default)]
    pub ports: Option<HashMap<String, Option<Vec<PortBinding>>>>,
    #[serde(rename = "Networks", default)]
    pub networks: Option<HashMap<String, EndpointSettings>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    #[serde(default)]
    pub host_ip: String,
    #[serde(default)]
    pub host_port: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointSettings {
    #[serde(rename = "Gateway", default)]
    pub gateway: String,
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
    #[serde(rename = "IPPrefixLen", default)]
    pub ip_prefix_len: u8,
}

/// 公開中のポート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPort {
    pub container_port: u16,
    pub protocol: String,
    pub host_ip: String,
    pub host_port: u16,
}

impl ContainerInspect {
    /// コンテナのコマンド（`,` 区切り）
    pub fn command(&self) -> String {
        self.config
            .as_ref()
            .and_then(|c| c.cmd.as_ref())
            .map(|cmd| cmd.join(","))
            .unwrap_or_default()
    }

    pub fn mounts(&self) -> &[MountPoint] {
        self.mounts.as_deref().unwrap_or_default()
    }

    pub fn ip_address(&self) -> &str {
        self.network_settings
            .as_ref()
            .map(|n| n.ip_address.as_str())
            .unwrap_or_default()
    }

    pub fn networks(&self) -> impl Iterator<Item = (&String, &EndpointSettings)> {
        self.network_settings
            .as_ref()
            .and_then(|n| n.networks.as_ref())
            .into_iter()
            .flatten()
    }

    /// 実際にホストへ公開されているポート（コンテナポート順）
    ///
    /// バインドのないポートは含めない。
    pub fn published_ports(&self) -> Vec<PublishedPort> {
        let mut ports: Vec<PublishedPort> = self
            .network_settings
            .as_ref()
            .and_then(|n| n.ports.as_ref())
            .into_iter()
            .flatten()
            .filter_map(|(key, bindings)| {
                let binding = bindings.as_ref()?.first()?;
                let (port, protocol) = key.split_once('/').unwrap_or((key.as_str(), "tcp"));
                Some(PublishedPort {
                    container_port: port.parse().ok()?,
                    protocol: protocol.to_string(),
                    host_ip: binding.host_ip.clone(),
                    host_port: binding.host_port.parse().unwrap_or(0),
                })
            })
            .collect();
        ports.sort_by(|a, b| {
            (a.container_port, &a.protocol).cmp(&(b.container_port, &b.protocol))
        });
        ports
    }
}
