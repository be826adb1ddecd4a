use crate::error::Result;
use crate::inspect::ContainerInspect;

/// ホストの cgroup バージョン
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgroupVersion {
    V1,
    V2,
}

impl CgroupVersion {
    /// `docker info --format {{.CgroupVersion}}` の出力から判定
    ///
    /// "2" 以外はすべて V1 として扱う。
    pub fn from_info(value: &str) -> Self {
        if value.trim() == "2" {
            CgroupVersion::V2
        } else {
            CgroupVersion::V1
        }
    }
}

/// コンテナランタイムのトレイト
///
/// ランタイムは外部プロセスとして操作する。`name` はコンテナ名。
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// ランタイムに接続できることを確認
    async fn ensure_running(&self) -> Result<()>;

    async fn info(&self, format: &str) -> Result<Vec<String>>;

    /// イメージがローカルになければ取得する。取得した場合は true
    async fn pull_if_not_present(&self, image: &str, retries: u32) -> Result<bool>;

    /// コンテナを作成し、IDを返す
    async fn create(&self, image: &str, run_args: &[String], cmd: &[String]) -> Result<String>;

    async fn start(&self, name: &str) -> Result<()>;

    async fn stop(&self, name: &str) -> Result<()>;

    async fn kill(&self, signal: &str, name: &str) -> Result<()>;

    async fn remove(&self, name: &str, volumes: bool) -> Result<()>;

    async fn connect_network(&self, name: &str, network: &str, alias: Option<&str>) -> Result<()>;

    /// コンテナ内でコマンドを実行。`stdin` があれば標準入力に流し込む
    async fn exec(&self, name: &str, cmd: &[&str], stdin: Option<&[u8]>) -> Result<()>;

    /// Go テンプレートでコンテナ情報を取得（1行1要素）
    async fn inspect(&self, name: &str, format: &str) -> Result<Vec<String>>;

    /// コンテナ情報をまとめて取得
    async fn inspect_object(&self, name: &str) -> Result<ContainerInspect>;

    async fn cgroup_version(&self) -> Result<CgroupVersion> {
        let lines = self.info("{{.CgroupVersion}}").await?;
        let value = lines.first().map(String::as_str).unwrap_or_default();
        Ok(CgroupVersion::from_info(value))
    }
}
