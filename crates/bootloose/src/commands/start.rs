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
        format!("マシンを起動中: {}", utils::describe_hosts(hostnames)).blue()
    );

    let spec = utils::load_cluster(config)?;
    let manager = utils::cluster_manager(spec, key_store)?;
    manager.start(hostnames).await?;

    println!();
    println!("{}", "✓ 起動しました".green().bold());
    Ok(())
}
