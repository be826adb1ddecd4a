use crate::utils;
use colored::Colorize;
use std::path::Path;

pub async fn handle(
    config: Option<&Path>,
    key_store: Option<&Path>,
    hostnames: &[String],
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("マシンを停止中: {}", utils::describe_hosts(hostnames)).yellow()
    );

    let spec = utils::load_cluster(config)?;
    let manager = utils::cluster_manager(spec, key_store)?;
    manager.stop(hostnames).await?;

    println!();
    println!("{}", "✓ 停止しました".green().bold());
    Ok(())
}
