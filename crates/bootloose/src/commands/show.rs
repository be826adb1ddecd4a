use crate::utils;
use bootloose_cluster::{MachineState, MachineStatus, PortStatus};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// show の出力形式
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Serialize)]
struct MachineList<'a> {
    machines: &'a [MachineStatus],
}

pub async fn handle(
    config: Option<&Path>,
    key_store: Option<&Path>,
    hostnames: &[String],
    output: OutputFormat,
) -> anyhow::Result<()> {
    let spec = utils::load_cluster(config)?;
    let manager = utils::cluster_manager(spec, key_store)?;
    let machines = manager.inspect(hostnames).await?;

    match output {
        OutputFormat::Json => println!("{}", render_json(&machines)?),
        OutputFormat::Table => print_table(&machines),
    }
    Ok(())
}

/// `{"machines": [...]}` 形式の JSON
pub fn render_json(machines: &[MachineStatus]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&MachineList { machines })?)
}

fn print_table(machines: &[MachineStatus]) {
    if machines.is_empty() {
        println!("{}", "マシンはありません".dimmed());
        return;
    }

    println!(
        "{}",
        format!(
            "{:<24} {:<15} {:<20} {:<16} {:<45} {:<15} {:<12}",
            "CONTAINER", "HOSTNAME", "PORTS", "IP", "IMAGE", "CMD", "STATE"
        )
        .bold()
    );
    println!("{}", "─".repeat(151).dimmed());

    for machine in machines {
        let state = machine.state.to_string();
        let state_colored = match machine.state {
            MachineState::Running => state.green(),
            MachineState::Stopped => state.yellow(),
            MachineState::NotCreated => state.red(),
            MachineState::Unknown => state.dimmed(),
        };

        println!(
            "{:<24} {:<15} {:<20} {:<16} {:<45} {:<15} {:<12}",
            machine.container.cyan(),
            machine.hostname,
            format_ports(&machine.ports).dimmed(),
            or_dash(&machine.ip),
            machine.image,
            or_dash(&machine.command),
            state_colored
        );
    }
}

/// `ホスト->ゲスト` をカンマ区切りで並べる。ホスト側が不明なら `?`
pub fn format_ports(ports: &[PortStatus]) -> String {
    ports
        .iter()
        .map(|p| match p.host {
            0 => format!("?->{}", p.guest),
            host => format!("{}->{}", host, p.guest),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
