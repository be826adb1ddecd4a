//! MachineSpec から `docker create` の引数への変換

use crate::runtime::CgroupVersion;
use bootloose_core::{GlobalIndex, MachineSpec, PortMapping, Volume};

/// 所有者ラベル
pub const OWNER_LABEL: &str = "io.k0sproject.bootloose.owner=bootloose";

/// クラスタ名ラベルのキー
pub const CLUSTER_LABEL_KEY: &str = "io.k0sproject.bootloose.cluster";

/// エイリアスを付けない既定ネットワーク
pub const DEFAULT_NETWORK: &str = "bridge";

const CGROUP_MOUNTPOINT: &str = "/sys/fs/cgroup";

/// 全マシンの親 cgroup。systemd ドライバでは `.slice` で終わる必要がある
const CGROUP_PARENT: &str = "bootloose.slice";

/// ネットワークに付けるエイリアス（既定ネットワークには付けない）
pub fn network_alias<'a>(network: &str, hostname: &'a str) -> Option<&'a str> {
    (network != DEFAULT_NETWORK).then_some(hostname)
}

/// `--mount` の値
pub fn mount_arg(volume: &Volume) -> String {
    let mut mount = format!("type={}", volume.kind);
    if let Some(source) = volume.source.as_deref().filter(|s| !s.is_empty()) {
        mount.push_str(&format!(",src={}", source));
    }
    mount.push_str(&format!(",dst={}", volume.destination));
    if volume.read_only {
        mount.push_str(",readonly");
    }
    mount
}

/// `-p` の値。ホストポートにはクラスタ全体の通し番号を足す
pub fn publish_arg(mapping: &PortMapping, index: GlobalIndex) -> String {
    let mut publish = String::new();
    if let Some(address) = mapping.address.as_deref().filter(|a| !a.is_empty()) {
        publish.push_str(&format!("{}:", address));
    }
    if let Some(host_port) = mapping.effective_host_port(index) {
        publish.push_str(&format!("{}:", host_port));
    }
    publish.push_str(&mapping.container_port.to_string());
    if let Some(protocol) = mapping.protocol.as_deref().filter(|p| !p.is_empty()) {
        publish.push_str(&format!("/{}", protocol));
    }
    publish
}

/// コンテナ作成時の引数を組み立てる
///
/// 入力が同じなら常に同じ順序で同じ引数を返す。二つ目以降のネットワークは
/// 起動後に接続するためここには含まれない。
pub fn build_run_args(
    cluster: &str,
    container_name: &str,
    hostname: &str,
    spec: &MachineSpec,
    index: GlobalIndex,
    cgroup: CgroupVersion,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-it".into(),
        "--label".into(),
        OWNER_LABEL.into(),
        "--label".into(),
        format!("{}={}", CLUSTER_LABEL_KEY, cluster),
        "--name".into(),
        container_name.into(),
        "--hostname".into(),
        hostname.into(),
        "--tmpfs".into(),
        "/run".into(),
        "--tmpfs".into(),
        "/run/lock".into(),
        "--tmpfs".into(),
        "/tmp:exec,mode=777".into(),
    ];

    match cgroup {
        CgroupVersion::V2 => {
            args.extend(["--cgroupns".to_string(), "private".to_string()]);

            // 非特権コンテナの /sys/fs/cgroup は読み取り専用になるため、
            // マシンごとの cgroup を書き込み可能でマウントする
            if !spec.privileged {
                let cgroup_path = format!(
                    "{}/{}/cluster-{}.scope/machine-{}.scope",
                    CGROUP_MOUNTPOINT, CGROUP_PARENT, cluster, container_name
                );
                args.extend([
                    "--cgroup-parent".to_string(),
                    CGROUP_PARENT.to_string(),
                    "-v".to_string(),
                    format!("{}:{}:rw", cgroup_path, CGROUP_MOUNTPOINT),
                ]);
            }
        }
        CgroupVersion::V1 => {
            args.extend([
                "-v".to_string(),
                format!("{}:{}", CGROUP_MOUNTPOINT, CGROUP_MOUNTPOINT),
            ]);
        }
    }

    for volume in &spec.volumes {
        args.extend(["--mount".to_string(), mount_arg(volume)]);
    }

    for mapping in &spec.port_mappings {
        args.extend(["-p".to_string(), publish_arg(mapping, index)]);
    }

    if spec.privileged {
        args.push("--privileged".to_string());
    }

    if let Some(network) = spec.networks.first() {
        args.extend(["--network".to_string(), network.clone()]);
        if let Some(alias) = network_alias(network, hostname) {
            args.extend(["--network-alias".to_string(), alias.to_string()]);
        }
    }

    args.extend(spec.extra_args.iter().cloned());
    args
}
