//! マシン（テンプレートの1レプリカ）
//!
//! マシンは操作のたびに作り直す値で、状態は持たない。状態は常に
//! ランタイムへの問い合わせから導出する。例外はホストポートのキャッシュで、
//! これは1つの Machine 値の中に閉じている。

use crate::error::{ClusterError, Result};
use crate::network::RuntimeNetwork;
use bootloose_container::{ContainerError, ContainerRuntime};
use bootloose_core::{GlobalIndex, MachineSpec, TemplateIndex};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// マシンの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MachineState {
    #[serde(rename = "Not created")]
    NotCreated,
    Stopped,
    Running,
    /// ランタイムへの問い合わせに失敗した（inspect の一覧表示のみ）
    Unknown,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineState::NotCreated => write!(f, "Not created"),
            MachineState::Stopped => write!(f, "Stopped"),
            MachineState::Running => write!(f, "Running"),
            MachineState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// ポートの対応（host が 0 なら不明）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortStatus {
    pub host: u16,
    pub guest: u16,
}

/// マシンのスナップショット
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineStatus {
    pub container: String,
    pub image: String,
    #[serde(rename = "cmd", skip_serializing_if = "String::is_empty")]
    pub command: String,
    pub spec: MachineSpec,
    pub hostname: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip: String,
    pub state: MachineState,
    pub ports: Vec<PortStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runtime_networks: Vec<RuntimeNetwork>,
}

#[derive(Debug, Clone)]
pub struct Machine<'a> {
    spec: &'a MachineSpec,
    index: TemplateIndex,
    global_index: GlobalIndex,
    hostname: String,
    container_name: String,
    /// コンテナポート -> ホストポート
    host_ports: HashMap<u16, u16>,
}

impl<'a> Machine<'a> {
    pub fn new(
        cluster: &str,
        spec: &'a MachineSpec,
        index: TemplateIndex,
        global_index: GlobalIndex,
    ) -> Self {
        let hostname = spec.hostname(index);
        let container_name = format!("{}-{}", cluster, hostname);
        Self {
            spec,
            index,
            global_index,
            hostname,
            container_name,
            host_ports: HashMap::new(),
        }
    }

    pub fn spec(&self) -> &'a MachineSpec {
        self.spec
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// テンプレート内の番号（名前付け用）
    pub fn index(&self) -> TemplateIndex {
        self.index
    }

    /// クラスタ全体の通し番号（ポート計算用）
    pub fn global_index(&self) -> GlobalIndex {
        self.global_index
    }

    /// コンテナが作成済みか（停止中も含む）
    pub async fn is_created<R: ContainerRuntime>(&self, runtime: &R) -> Result<bool> {
        match runtime.inspect(&self.container_name, "{{.Name}}").await {
            Ok(lines) => Ok(lines.first().is_some_and(|l| !l.is_empty())),
            Err(ContainerError::ContainerNotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn is_started<R: ContainerRuntime>(&self, runtime: &R) -> Result<bool> {
        let lines = runtime
            .inspect(&self.container_name, "{{.State.Running}}")
            .await?;
        Ok(lines
            .first()
            .is_some_and(|l| l.trim_matches('\'') == "true"))
    }

    pub async fn state<R: ContainerRuntime>(&self, runtime: &R) -> Result<MachineState> {
        if !self.is_created(runtime).await? {
            return Ok(MachineState::NotCreated);
        }
        if self.is_started(runtime).await? {
            Ok(MachineState::Running)
        } else {
            Ok(MachineState::Stopped)
        }
    }

    /// コンテナポートに対応するホストポートを取得
    ///
    /// 一度取得した値はこの Machine の中でキャッシュする。
    pub async fn host_port<R: ContainerRuntime>(
        &mut self,
        runtime: &R,
        container_port: u16,
    ) -> Result<u16> {
        if let Some(port) = self.host_ports.get(&container_port) {
            return Ok(*port);
        }

        let unresolved = |reason: String| ClusterError::HostPortUnresolved {
            machine: self.container_name.clone(),
            port: container_port,
            reason,
        };

        if !self.is_created(runtime).await? {
            return Err(unresolved("コンテナが作成されていません".to_string()));
        }
        if !self.is_started(runtime).await? {
            return Err(unresolved("コンテナが起動していません".to_string()));
        }

        let format = format!(
            "{{{{(index (index .NetworkSettings.Ports \"{}/tcp\") 0).HostPort}}}}",
            container_port
        );
        let lines = runtime
            .inspect(&self.container_name, &format)
            .await
            .map_err(|e| unresolved(e.to_string()))?;

        if lines.len() != 1 {
            return Err(unresolved(format!(
                "1行の応答を期待しましたが {} 行でした",
                lines.len()
            )));
        }

        let value = lines[0].replace('\'', "");
        let port: u16 = value
            .trim()
            .parse()
            .map_err(|_| unresolved(format!("ポート番号を解析できません: '{}'", value)))?;

        self.host_ports.insert(container_port, port);
        Ok(port)
    }

    /// 現在のスナップショットを取得
    ///
    /// 問い合わせに失敗しても中断しない。状態が取れなければ識別情報だけを返す。
    pub async fn status<R: ContainerRuntime>(&mut self, runtime: &R) -> MachineStatus {
        let state = match self.state(runtime).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Failed to query state of {}: {}", self.container_name, e);
                MachineState::Unknown
            }
        };

        let mut status = MachineStatus {
            container: self.container_name.clone(),
            image: self.spec.image.clone(),
            command: self.spec.cmd.clone().unwrap_or_default(),
            spec: self.spec.clone(),
            hostname: self.hostname.clone(),
            ip: String::new(),
            state,
            ports: Vec::new(),
            runtime_networks: Vec::new(),
        };

        if matches!(state, MachineState::NotCreated | MachineState::Unknown) {
            status.ports = self.unresolved_ports();
            return status;
        }

        let spec = self.spec;
        let mut ports = Vec::new();
        for mapping in &spec.port_mappings {
            let host = match self.host_port(runtime, mapping.container_port).await {
                Ok(port) => port,
                Err(e) => {
                    tracing::debug!("{}", e);
                    0
                }
            };
            ports.push(PortStatus {
                host,
                guest: mapping.container_port,
            });
        }
        status.ports = ports;

        match runtime.inspect_object(&self.container_name).await {
            Ok(inspect) => {
                let mut spec = spec.clone();
                spec.port_mappings = inspect
                    .published_ports()
                    .into_iter()
                    .map(|p| bootloose_core::PortMapping {
                        container_port: p.container_port,
                        host_port: Some(p.host_port),
                        address: Some(p.host_ip).filter(|a| !a.is_empty()),
                        protocol: Some(p.protocol),
                    })
                    .collect();
                spec.volumes = inspect
                    .mounts()
                    .iter()
                    .map(|m| bootloose_core::Volume {
                        kind: if m.kind == "bind" {
                            bootloose_core::VolumeType::Bind
                        } else {
                            bootloose_core::VolumeType::Volume
                        },
                        source: Some(m.source.clone()).filter(|s| !s.is_empty()),
                        destination: m.destination.clone(),
                        read_only: !m.rw,
                    })
                    .collect();
                let command = inspect.command();
                if !command.is_empty() {
                    spec.cmd = Some(command.clone());
                    status.command = command;
                }
                status.spec = spec;
                status.ip = inspect.ip_address().to_string();
                status.runtime_networks = RuntimeNetwork::from_inspect(&inspect);
            }
            Err(e) => {
                tracing::warn!("Failed to inspect {}: {}", self.container_name, e);
            }
        }

        status
    }

    fn unresolved_ports(&self) -> Vec<PortStatus> {
        self.spec
            .port_mappings
            .iter()
            .map(|m| PortStatus {
                host: 0,
                guest: m.container_port,
            })
            .collect()
    }
}
