//! ボリューム定義

use serde::{Deserialize, Serialize};
use std::fmt;

/// マウント種別
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    /// ホストのパスをそのままマウント
    Bind,
    /// 名前付きボリューム
    #[default]
    Volume,
}

impl VolumeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bind => "bind",
            Self::Volume => "volume",
        }
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ボリューム定義
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(rename = "type", default)]
    pub kind: VolumeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub destination: String,
    #[serde(default)]
    pub read_only: bool,
}

impl Volume {
    /// `-v` フラグ形式の文字列からボリュームを生成
    ///
    /// - `/host/path:/container/path` (bind)
    /// - `volume:/container/path` (名前付きボリューム)
    /// - 末尾に `:ro` / `:rw` を付けられる
    pub fn parse(value: &str) -> Result<Self, String> {
        if value.is_empty() {
            return Err("ボリュームの値が空です".to_string());
        }
        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(format!("無効なボリューム指定: {}", value));
        }

        let kind = if parts[0].starts_with('/') {
            VolumeType::Bind
        } else {
            VolumeType::Volume
        };

        Ok(Self {
            kind,
            source: Some(parts[0].to_string()),
            destination: parts[1].to_string(),
            read_only: parts.get(2).is_some_and(|mode| *mode == "ro"),
        })
    }
}
