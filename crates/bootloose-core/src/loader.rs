//! 設定ファイルの読み書き

use crate::error::{CoreError, Result};
use crate::model::ClusterSpec;
use std::path::Path;
use tracing::{debug, instrument};

impl ClusterSpec {
    /// YAML文字列からクラスタ定義を読み込み、検証する
    pub fn from_yaml(data: &str) -> Result<Self> {
        let spec: ClusterSpec = serde_yaml::from_str(data)?;
        spec.validate()?;
        Ok(spec)
    }

    /// YAMLファイルからクラスタ定義を読み込み、検証する
    #[instrument(fields(path = %path.display()))]
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| CoreError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(bytes = data.len(), "Loaded cluster configuration");
        Self::from_yaml(&data)
    }

    /// 検証せずにYAMLファイルを読み込む（config get 用）
    pub fn from_file_unchecked(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| CoreError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(serde_yaml::from_str(&data)?)
    }

    /// YAMLとしてファイルに保存
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        std::fs::write(path, data).map_err(|e| CoreError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
