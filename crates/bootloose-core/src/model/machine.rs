//! マシン定義

use super::index::TemplateIndex;
use super::port::PortMapping;
use super::volume::Volume;
use serde::{Deserialize, Serialize};

/// 名前パターン中のインデックス置換子
pub const INDEX_PLACEHOLDER: &str = "%d";

/// 既定のバックエンド
pub const DEFAULT_BACKEND: &str = "docker";

/// マシン定義（テンプレートの中身）
///
/// YAML形式：
/// ```yaml
/// spec:
///   name: node%d
///   image: quay.io/k0sproject/bootloose-ubuntu20.04
///   networks: [bootloose-net]
///   portMappings:
///   - containerPort: 22
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    /// `%d` をちょうど1つ含む名前パターン（例: `node%d`）
    pub name: String,
    pub image: String,
    /// コマンドの上書き。未指定なら `/sbin/init`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(default)]
    pub privileged: bool,
    /// 接続するネットワーク（先頭がプライマリ）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_mappings: Vec<PortMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    /// キーストアに登録された公開鍵の名前
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub backend: String,
    /// ランタイムにそのまま渡す追加引数
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,
}

impl MachineSpec {
    /// 名前パターンにインデックスを埋め込む
    pub fn hostname(&self, index: TemplateIndex) -> String {
        self.name.replacen(INDEX_PLACEHOLDER, &index.to_string(), 1)
    }

    /// 指定されたコンテナポートのマッピングを取得
    pub fn port_mapping(&self, container_port: u16) -> Option<&PortMapping> {
        self.port_mappings
            .iter()
            .find(|m| m.container_port == container_port)
    }

    /// コンテナに渡すコマンド
    pub fn command(&self) -> Vec<String> {
        match self.cmd.as_deref().map(str::trim) {
            Some(cmd) if !cmd.is_empty() => cmd.split_whitespace().map(String::from).collect(),
            _ => vec!["/sbin/init".to_string()],
        }
    }

    pub fn backend(&self) -> &str {
        if self.backend.is_empty() {
            DEFAULT_BACKEND
        } else {
            &self.backend
        }
    }

    /// 構造チェック。問題点をすべて返す
    pub(crate) fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push("マシン名が空です".to_string());
        } else {
            let placeholders = self.name.matches(INDEX_PLACEHOLDER).count();
            if placeholders != 1 {
                errors.push(format!(
                    "マシン名 '{}' には {} をちょうど1つ含めてください（{} 個見つかりました）",
                    self.name, INDEX_PLACEHOLDER, placeholders
                ));
            }
        }

        if self.image.is_empty() {
            errors.push(format!("マシン '{}' に image が指定されていません", self.name));
        }

        for mapping in &self.port_mappings {
            if mapping.container_port == 0 {
                errors.push(format!(
                    "マシン '{}' の containerPort が指定されていません",
                    self.name
                ));
            }
        }

        for volume in &self.volumes {
            if volume.destination.is_empty() {
                errors.push(format!(
                    "マシン '{}' のボリュームに destination が指定されていません",
                    self.name
                ));
            }
            if volume.kind == super::VolumeType::Bind
                && volume.source.as_deref().is_none_or(str::is_empty)
            {
                errors.push(format!(
                    "マシン '{}' の bind ボリューム '{}' に source が指定されていません",
                    self.name, volume.destination
                ));
            }
        }

        if self.backend() != DEFAULT_BACKEND {
            errors.push(format!(
                "マシン '{}' のバックエンド '{}' はサポートされていません",
                self.name, self.backend
            ));
        }

        errors
    }
}
