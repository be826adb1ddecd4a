use bootloose_core::{ClusterSpec, DEFAULT_IMAGE, Volume};
use colored::Colorize;
use std::path::Path;

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// 既存の設定ファイルを上書きする
    #[arg(long = "override")]
    pub override_existing: bool,
    /// クラスタ名
    #[arg(short, long, default_value = "cluster")]
    pub name: String,
    /// 秘密鍵と公開鍵のファイル名
    #[arg(short, long, default_value = "cluster-key")]
    pub key: String,
    /// マシンを接続するネットワーク
    #[arg(long, value_delimiter = ',')]
    pub networks: Vec<String>,
    /// マシンのレプリカ数
    #[arg(short, long, default_value_t = 1)]
    pub replicas: usize,
    /// コンテナのイメージ
    #[arg(short, long, default_value = DEFAULT_IMAGE)]
    pub image: String,
    /// 特権コンテナとして作成する
    #[arg(long)]
    pub privileged: bool,
    /// コンテナで実行するコマンド
    #[arg(short = 'd', long)]
    pub cmd: Option<String>,
    /// マウントするボリューム (src:dst[:ro|rw])
    #[arg(short = 'v', long = "volume", value_delimiter = ',')]
    pub volumes: Vec<String>,
}

impl CreateArgs {
    /// 既定の設定にフラグを反映する
    pub fn to_spec(&self) -> anyhow::Result<ClusterSpec> {
        let mut spec = ClusterSpec::default();
        spec.cluster.name = self.name.clone();
        spec.cluster.private_key = Some(self.key.clone());

        for template in &mut spec.machines {
            template.count = self.replicas;
            template.spec.image = self.image.clone();
            template.spec.privileged = self.privileged;
            template.spec.networks = self.networks.clone();
            template.spec.cmd = self.cmd.clone().filter(|c| !c.is_empty());
            for value in &self.volumes {
                let volume = Volume::parse(value).map_err(|e| anyhow::anyhow!(e))?;
                template.spec.volumes.push(volume);
            }
        }

        spec.validate()?;
        Ok(spec)
    }
}

pub fn handle_create(config: Option<&Path>, args: CreateArgs) -> anyhow::Result<()> {
    let spec = args.to_spec()?;
    let path = bootloose_config::resolve_config_path(config);

    if path.is_file() && !args.override_existing {
        return Err(anyhow::anyhow!(
            "設定ファイル {} は既に存在します（上書きするには --override を指定してください）",
            path.display()
        ));
    }

    spec.save(&path)?;
    tracing::info!(path = %path.display(), "Cluster configuration written");
    println!(
        "{}",
        format!("✓ 設定ファイルを作成しました: {}", path.display())
            .green()
            .bold()
    );
    Ok(())
}

pub fn handle_get(config: Option<&Path>, path: Option<&str>) -> anyhow::Result<()> {
    let file = bootloose_config::find_config_file(config)?;
    let spec = ClusterSpec::from_file_unchecked(&file)?;
    let value = spec.get_value(path.unwrap_or_default())?;
    println!("{}", render_value(&value)?);
    Ok(())
}

/// 文字列はそのまま、それ以外は整形済み JSON として出力する
pub fn render_value(value: &serde_json::Value) -> anyhow::Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string_pretty(other)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootloose_core::VolumeType;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CreateArgs,
    }

    fn parse(args: &[&str]) -> CreateArgs {
        let mut argv = vec!["create"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).args
    }

    #[test]
    fn test_defaults_match_default_spec() {
        let spec = parse(&[]).to_spec().unwrap();
        assert_eq!(spec, ClusterSpec::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let spec = parse(&[
            "--name",
            "lab",
            "--key",
            "lab-key",
            "--replicas",
            "3",
            "--image",
            "ubuntu:24.04",
            "--privileged",
            "--networks",
            "net1,net2",
            "--cmd",
            "/lib/systemd/systemd",
            "-v",
            "/data:/data:ro",
            "-v",
            "cache:/cache",
        ])
        .to_spec()
        .unwrap();

        assert_eq!(spec.name(), "lab");
        assert_eq!(spec.private_key(), Some("lab-key"));

        let machine = &spec.machines[0];
        assert_eq!(machine.count, 3);
        assert_eq!(machine.spec.image, "ubuntu:24.04");
        assert!(machine.spec.privileged);
        assert_eq!(machine.spec.networks, vec!["net1", "net2"]);
        assert_eq!(machine.spec.cmd.as_deref(), Some("/lib/systemd/systemd"));
        assert_eq!(machine.spec.volumes.len(), 2);
        assert_eq!(machine.spec.volumes[0].kind, VolumeType::Bind);
        assert!(machine.spec.volumes[0].read_only);
        assert_eq!(machine.spec.volumes[1].kind, VolumeType::Volume);
    }

    #[test]
    fn test_invalid_volume_rejected() {
        assert!(parse(&["-v", "/only"]).to_spec().is_err());
    }

    #[test]
    fn test_zero_replicas_rejected() {
        assert!(parse(&["--replicas", "0"]).to_spec().is_err());
    }

    #[test]
    fn test_render_value() {
        assert_eq!(
            render_value(&serde_json::json!("node%d")).unwrap(),
            "node%d"
        );
        assert_eq!(render_value(&serde_json::json!(true)).unwrap(), "true");
        assert_eq!(
            render_value(&serde_json::json!({"name": "cluster"})).unwrap(),
            "{\n  \"name\": \"cluster\"\n}"
        );
    }
}
