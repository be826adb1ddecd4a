//! クラスタ定義

use super::index::GlobalIndex;
use super::machine::{DEFAULT_BACKEND, MachineSpec};
use super::port::PortMapping;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// 既定のイメージ
pub const DEFAULT_IMAGE: &str = "quay.io/k0sproject/bootloose-ubuntu20.04";

/// クラスタ全体の設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSettings {
    pub name: String,
    /// SSH秘密鍵のパス。`~` はホームディレクトリに展開される
    ///
    /// 省略した場合、各マシンに publicKey を指定する必要がある。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// 同じ定義から複製されるマシン群
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineTemplate {
    pub count: usize,
    pub spec: MachineSpec,
}

/// クラスタ定義（設定ファイルのトップレベル）
///
/// YAML形式：
/// ```yaml
/// cluster:
///   name: cluster
///   privateKey: cluster-key
/// machines:
/// - count: 3
///   spec:
///     name: node%d
///     image: quay.io/k0sproject/bootloose-ubuntu20.04
///     portMappings:
///     - containerPort: 22
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub cluster: ClusterSettings,
    #[serde(default)]
    pub machines: Vec<MachineTemplate>,
}

impl Default for ClusterSpec {
    fn default() -> Self {
        Self {
            cluster: ClusterSettings {
                name: "cluster".to_string(),
                private_key: Some("cluster-key".to_string()),
            },
            machines: vec![MachineTemplate {
                count: 1,
                spec: MachineSpec {
                    name: "node%d".to_string(),
                    image: DEFAULT_IMAGE.to_string(),
                    port_mappings: vec![PortMapping::new(22)],
                    backend: DEFAULT_BACKEND.to_string(),
                    ..Default::default()
                },
            }],
        }
    }
}

impl ClusterSpec {
    pub fn name(&self) -> &str {
        &self.cluster.name
    }

    /// 設定されている秘密鍵のパス（空文字は未設定扱い）
    pub fn private_key(&self) -> Option<&str> {
        self.cluster
            .private_key
            .as_deref()
            .filter(|path| !path.is_empty())
    }

    /// 全テンプレートのマシン総数
    pub fn machine_count(&self) -> usize {
        self.machines.iter().map(|t| t.count).sum()
    }

    /// 構造チェック
    ///
    /// 問題はまとめて [`CoreError::InvalidConfig`] で返す。
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.cluster.name.is_empty() {
            errors.push("クラスタ名が空です".to_string());
        }

        let mut first_index = 0;
        for template in &self.machines {
            if template.count == 0 {
                errors.push(format!(
                    "マシン '{}' の count は 1 以上を指定してください",
                    template.spec.name
                ));
            }
            errors.extend(template.spec.validate());

            // ホストポートは通し番号の分だけずれるため、最後のレプリカで上限を確認する
            let last_index = GlobalIndex(first_index + template.count.saturating_sub(1));
            for mapping in &template.spec.port_mappings {
                if let Some(port) = mapping.effective_host_port(last_index)
                    && port > u32::from(u16::MAX)
                {
                    errors.push(format!(
                        "マシン '{}' のホストポート {} (コンテナポート {}) が上限 {} を超えます",
                        template.spec.name,
                        port,
                        mapping.container_port,
                        u16::MAX
                    ));
                }
            }
            first_index += template.count;
        }

        if errors.is_empty() {
            Ok(())
        } else {
            for error in &errors {
                tracing::error!("{}", error);
            }
            Err(CoreError::InvalidConfig(errors))
        }
    }
}
