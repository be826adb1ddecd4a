use bootloose_cluster::{ClusterManager, KeyStore};
use bootloose_container::DockerCli;
use bootloose_core::ClusterSpec;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// 設定ファイルを探して読み込む（検証込み）
pub fn load_cluster(config: Option<&Path>) -> anyhow::Result<ClusterSpec> {
    let path = bootloose_config::find_config_file(config)?;
    tracing::debug!(path = %path.display(), "Loading cluster configuration");
    Ok(ClusterSpec::from_file(&path)?)
}

/// 読み込んだ設定ファイルを表示
pub fn print_loaded_config_file(config: Option<&Path>) {
    let path = bootloose_config::resolve_config_path(config);
    println!("📄 設定ファイル: {}", path.display().to_string().cyan());
}

/// キーストアのディレクトリ（指定がなければ既定のディレクトリ）
pub fn key_store_dir(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Ok(bootloose_config::default_key_store_dir()?),
    }
}

/// マシンが公開鍵名を参照しているか
pub fn uses_key_store(spec: &ClusterSpec) -> bool {
    spec.machines
        .iter()
        .any(|t| t.spec.public_key.as_deref().is_some_and(|k| !k.is_empty()))
}

/// docker CLI を使うクラスタマネージャを作る
///
/// キーストアは明示された場合か、マシンが公開鍵名を参照している場合のみ使う。
pub fn cluster_manager(
    spec: ClusterSpec,
    key_store: Option<&Path>,
) -> anyhow::Result<ClusterManager<DockerCli>> {
    let needs_store = key_store.is_some() || uses_key_store(&spec);
    let manager = ClusterManager::new(spec, DockerCli::default())?;

    if needs_store {
        let dir = key_store_dir(key_store)?;
        tracing::debug!(dir = %dir.display(), "Using key store");
        Ok(manager.with_key_store(KeyStore::new(dir)))
    } else {
        Ok(manager)
    }
}

/// ホスト名の一覧を表示用に整形
pub fn describe_hosts(hostnames: &[String]) -> String {
    if hostnames.is_empty() {
        "すべてのマシン".to_string()
    } else {
        hostnames.join(", ")
    }
}
