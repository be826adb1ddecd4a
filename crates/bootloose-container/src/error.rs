use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "コンテナランタイムに接続できません: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • docker コマンドが PATH にあるか確認してください"
    )]
    RuntimeUnavailable(String),

    #[error("イメージ '{image}' の取得に失敗しました（{attempts}回試行）: {message}")]
    ImagePullFailed {
        image: String,
        attempts: u32,
        message: String,
    },

    #[error("コンテナ '{container}' が見つかりません")]
    ContainerNotFound { container: String },

    #[error("コマンドが失敗しました: {command}\n{output}")]
    CommandFailed { command: String, output: String },

    #[error("inspect の出力を解析できません: {0}")]
    MalformedInspect(#[from] serde_json::Error),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

impl ContainerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::ContainerNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;
