//! テンプレートをマシンに展開する
//!
//! 宣言順にテンプレートを辿り、各テンプレートのレプリカを 0..count の順に返す。
//! ホスト名の番号はテンプレートごとに 0 から始まり、ポート計算用の通し番号は
//! クラスタ全体で連続する。

use crate::error::{ClusterError, Result};
use crate::machine::Machine;
use bootloose_core::{ClusterSpec, GlobalIndex, TemplateIndex};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct Replicator<'a> {
    spec: &'a ClusterSpec,
}

impl<'a> Replicator<'a> {
    pub fn new(spec: &'a ClusterSpec) -> Self {
        Self { spec }
    }

    /// すべてのマシン（宣言順）
    pub fn for_each(self) -> impl Iterator<Item = Machine<'a>> {
        let spec = self.spec;
        let cluster = spec.name();
        spec.machines
            .iter()
            .flat_map(|template| {
                (0..template.count).map(move |i| (template, TemplateIndex(i)))
            })
            .enumerate()
            .map(move |(global, (template, index))| {
                Machine::new(cluster, &template.spec, index, GlobalIndex(global))
            })
    }

    /// 指定されたホスト名のマシンのみ（宣言順）
    ///
    /// 存在しないホスト名は警告を出して無視する。
    pub fn for_specific(self, hostnames: &[String]) -> Vec<Machine<'a>> {
        let requested: HashSet<&str> = hostnames.iter().map(String::as_str).collect();

        let machines: Vec<Machine<'a>> = self
            .for_each()
            .filter(|m| requested.contains(m.hostname()))
            .collect();

        for hostname in self.missing_hostnames(hostnames) {
            tracing::warn!("machine {} does not exist", hostname);
        }

        machines
    }

    /// 存在しないホスト名（指定順、重複なし）
    pub fn missing_hostnames<'h>(self, hostnames: &'h [String]) -> Vec<&'h str> {
        let known: HashSet<String> = self.for_each().map(|m| m.hostname().to_string()).collect();
        let mut seen = HashSet::new();
        hostnames
            .iter()
            .map(String::as_str)
            .filter(|h| !known.contains(*h) && seen.insert(*h))
            .collect()
    }

    /// ホスト名が空なら全マシン、そうでなければ指定分のみ
    pub fn select(self, hostnames: &[String]) -> Vec<Machine<'a>> {
        if hostnames.is_empty() {
            self.for_each().collect()
        } else {
            self.for_specific(hostnames)
        }
    }

    pub fn machine_from_hostname(self, hostname: &str) -> Result<Machine<'a>> {
        self.for_each()
            .find(|m| m.hostname() == hostname)
            .ok_or_else(|| ClusterError::MachineNotFound(hostname.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootloose_core::{MachineSpec, MachineTemplate, PortMapping};

    fn template(name: &str, count: usize, host_port: Option<u16>) -> MachineTemplate {
        MachineTemplate {
            count,
            spec: MachineSpec {
                name: name.to_string(),
                image: "ubuntu".to_string(),
                port_mappings: vec![PortMapping {
                    container_port: 22,
                    host_port,
                    ..Default::default()
                }],
                ..Default::default()
            },
        }
    }

    fn cluster(machines: Vec<MachineTemplate>) -> ClusterSpec {
        let mut spec = ClusterSpec::default();
        spec.cluster.name = "demo".to_string();
        spec.machines = machines;
        spec
    }

    #[test]
    fn test_hostnames_restart_per_template() {
        let spec = cluster(vec![
            template("node%d", 3, None),
            template("worker%d", 2, None),
        ]);
        let hostnames: Vec<String> = Replicator::new(&spec)
            .for_each()
            .map(|m| m.hostname().to_string())
            .collect();
        assert_eq!(
            hostnames,
            vec!["node0", "node1", "node2", "worker0", "worker1"]
        );
    }

    #[test]
    fn test_global_index_is_continuous() {
        let spec = cluster(vec![
            template("node%d", 2, None),
            template("worker%d", 3, None),
        ]);
        let indices: Vec<(usize, usize)> = Replicator::new(&spec)
            .for_each()
            .map(|m| (m.index().get(), m.global_index().get()))
            .collect();
        assert_eq!(indices, vec![(0, 0), (1, 1), (0, 2), (1, 3), (2, 4)]);
    }

    // テンプレート間で同じベースポートを共有しても、通し番号で
    // オフセットするため計算上のホストポートは重複しない
    #[test]
    fn test_host_ports_strictly_increase_across_templates() {
        let spec = cluster(vec![
            template("node%d", 2, Some(2222)),
            template("worker%d", 3, Some(2222)),
            template("edge%d", 1, Some(2222)),
        ]);
        let ports: Vec<u32> = Replicator::new(&spec)
            .for_each()
            .filter_map(|m| m.spec().port_mappings[0].effective_host_port(m.global_index()))
            .collect();

        assert_eq!(ports, vec![2222, 2223, 2224, 2225, 2226, 2227]);
        assert!(ports.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_demo_cluster_second_machine() {
        let spec = cluster(vec![template("node%d", 2, Some(2222))]);
        let machine = Replicator::new(&spec).for_each().nth(1).unwrap();

        assert_eq!(machine.hostname(), "node1");
        assert_eq!(machine.container_name(), "demo-node1");
        assert_eq!(
            machine.spec().port_mappings[0].effective_host_port(machine.global_index()),
            Some(2223)
        );
    }

    #[test]
    fn test_for_specific_filters_and_keeps_order() {
        let spec = cluster(vec![
            template("node%d", 3, None),
            template("worker%d", 2, None),
        ]);
        let hostnames = vec![
            "worker1".to_string(),
            "node0".to_string(),
            "ghost".to_string(),
        ];
        let machines = Replicator::new(&spec).for_specific(&hostnames);
        let names: Vec<&str> = machines.iter().map(|m| m.hostname()).collect();
        assert_eq!(names, vec!["node0", "worker1"]);
        // 通し番号は全体展開時と同じ
        assert_eq!(machines[1].global_index(), GlobalIndex(4));
    }

    #[test]
    fn test_for_specific_unknown_only() {
        let spec = cluster(vec![template("node%d", 2, None)]);
        let machines = Replicator::new(&spec).for_specific(&["nope".to_string()]);
        assert!(machines.is_empty());
    }

    #[test]
    fn test_missing_hostnames_are_deduplicated() {
        let spec = cluster(vec![template("node%d", 2, None)]);
        let hostnames = vec![
            "ghost".to_string(),
            "node1".to_string(),
            "ghost".to_string(),
            "nope".to_string(),
        ];
        assert_eq!(
            Replicator::new(&spec).missing_hostnames(&hostnames),
            vec!["ghost", "nope"]
        );
        assert!(
            Replicator::new(&spec)
                .missing_hostnames(&["node0".to_string()])
                .is_empty()
        );
    }

    #[test]
    fn test_select_empty_means_all() {
        let spec = cluster(vec![template("node%d", 2, None)]);
        assert_eq!(Replicator::new(&spec).select(&[]).len(), 2);
    }

    #[test]
    fn test_machine_from_hostname() {
        let spec = cluster(vec![template("node%d", 2, None)]);
        let replicator = Replicator::new(&spec);
        assert_eq!(
            replicator.machine_from_hostname("node1").unwrap().container_name(),
            "demo-node1"
        );
        assert!(matches!(
            replicator.machine_from_hostname("node9"),
            Err(ClusterError::MachineNotFound(_))
        ));
    }
}
