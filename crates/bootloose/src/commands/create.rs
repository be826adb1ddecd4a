use crate::utils;
use colored::Colorize;
use std::path::Path;

pub async fn handle(config: Option<&Path>, key_store: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "クラスタを作成中...".blue());
    utils::print_loaded_config_file(config);

    let spec = utils::load_cluster(config)?;
    let manager = utils::cluster_manager(spec, key_store)?;

    println!("クラスタ: {}", manager.name().cyan());
    println!(
        "マシン数: {}",
        manager.spec().machine_count().to_string().cyan()
    );

    manager.create().await?;

    println!();
    println!(
        "{}",
        format!("✓ クラスタ '{}' を作成しました", manager.name())
            .green()
            .bold()
    );
    Ok(())
}
