use crate::utils;
use bootloose_cluster::{OpenSshClient, RetryPolicy};
use std::path::Path;

pub async fn handle(
    config: Option<&Path>,
    key_store: Option<&Path>,
    target: &str,
    verbose: bool,
    remote_args: &[String],
) -> anyhow::Result<()> {
    let spec = utils::load_cluster(config)?;
    let manager = utils::cluster_manager(spec, key_store)?;

    // Ctrl-C で再試行を打ち切る。シグナルを待てない環境では打ち切らない
    let cancel = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    manager
        .ssh(
            target,
            remote_args,
            verbose,
            &OpenSshClient::default(),
            RetryPolicy::default(),
            cancel,
        )
        .await?;
    Ok(())
}
