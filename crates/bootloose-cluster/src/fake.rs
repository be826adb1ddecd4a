//! テスト用のメモリ上のコンテナランタイム

use bootloose_container::{ContainerError, ContainerInspect, ContainerRuntime, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct FakeContainer {
    pub image: String,
    pub running: bool,
    pub run_args: Vec<String>,
    pub cmd: Vec<String>,
    /// (コンテナポート, ホストポート)
    pub ports: Vec<(u16, String)>,
    pub networks: Vec<String>,
    pub authorized_keys: Vec<u8>,
    pub scripts: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    containers: BTreeMap<String, FakeContainer>,
    images: BTreeSet<String>,
    calls: Vec<String>,
    failing_inspect: BTreeSet<String>,
    unavailable: bool,
    cgroup_version: String,
    next_port: u16,
}

#[derive(Debug, Default)]
pub struct FakeRuntime {
    state: Mutex<State>,
}

impl FakeRuntime {
    pub fn add_container(&self, name: &str, running: bool, ports: &[(u16, &str)]) {
        let mut state = self.state.lock().unwrap();
        state.containers.insert(
            name.to_string(),
            FakeContainer {
                image: "ubuntu".to_string(),
                running,
                cmd: vec!["/sbin/init".to_string()],
                ports: ports.iter().map(|(c, h)| (*c, h.to_string())).collect(),
                networks: vec!["bridge".to_string()],
                ..Default::default()
            },
        );
    }

    pub fn remove_container(&self, name: &str) {
        self.state.lock().unwrap().containers.remove(name);
    }

    pub fn set_running(&self, name: &str, running: bool) {
        if let Some(container) = self.state.lock().unwrap().containers.get_mut(name) {
            container.running = running;
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn set_cgroup_version(&self, version: &str) {
        self.state.lock().unwrap().cgroup_version = version.to_string();
    }

    /// 指定したコンテナへの inspect を失敗させる
    pub fn fail_inspect(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_inspect
            .insert(name.to_string());
    }

    pub fn add_image(&self, image: &str) {
        self.state.lock().unwrap().images.insert(image.to_string());
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.state.lock().unwrap().containers.get(name).cloned()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state.lock().unwrap().containers.keys().cloned().collect()
    }

    /// 状態を変える呼び出しの記録
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn check(&self) -> Result<()> {
        if self.state.lock().unwrap().unavailable {
            Err(ContainerError::RuntimeUnavailable(
                "Cannot connect to the Docker daemon".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn with_container<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut FakeContainer) -> Result<T>,
    ) -> Result<T> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        match state.containers.get_mut(name) {
            Some(container) => f(container),
            None => Err(ContainerError::ContainerNotFound {
                container: name.to_string(),
            }),
        }
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

impl ContainerRuntime for FakeRuntime {
    async fn ensure_running(&self) -> Result<()> {
        self.check()
    }

    async fn info(&self, format: &str) -> Result<Vec<String>> {
        self.check()?;
        let state = self.state.lock().unwrap();
        match format {
            "{{.CgroupVersion}}" if !state.cgroup_version.is_empty() => {
                Ok(vec![state.cgroup_version.clone()])
            }
            "{{.CgroupVersion}}" => Ok(vec!["2".to_string()]),
            _ => Ok(Vec::new()),
        }
    }

    async fn pull_if_not_present(&self, image: &str, _retries: u32) -> Result<bool> {
        self.check()?;
        let inserted = self.state.lock().unwrap().images.insert(image.to_string());
        if inserted {
            self.record(format!("pull {}", image));
        }
        Ok(inserted)
    }

    async fn create(&self, image: &str, run_args: &[String], cmd: &[String]) -> Result<String> {
        self.check()?;
        let name = arg_value(run_args, "--name").unwrap_or_default().to_string();

        let mut state = self.state.lock().unwrap();
        if state.containers.contains_key(&name) {
            return Err(ContainerError::CommandFailed {
                command: format!("create {}", name),
                output: "Conflict. The container name is already in use".to_string(),
            });
        }

        let mut ports = Vec::new();
        let mut iter = run_args.iter();
        while let Some(arg) = iter.next() {
            if arg == "-p"
                && let Some(publish) = iter.next()
            {
                let spec = publish.split('/').next().unwrap_or_default();
                let parts: Vec<&str> = spec.split(':').collect();
                let container_port: u16 = parts.last().and_then(|p| p.parse().ok()).unwrap_or(0);
                let host_port = if parts.len() >= 2 {
                    parts[parts.len() - 2].to_string()
                } else {
                    state.next_port += 1;
                    (32768 + state.next_port).to_string()
                };
                ports.push((container_port, host_port));
            }
        }

        let networks = arg_value(run_args, "--network")
            .map(|n| vec![n.to_string()])
            .unwrap_or_else(|| vec!["bridge".to_string()]);

        state.containers.insert(
            name.clone(),
            FakeContainer {
                image: image.to_string(),
                running: false,
                run_args: run_args.to_vec(),
                cmd: cmd.to_vec(),
                ports,
                networks,
                ..Default::default()
            },
        );
        state.calls.push(format!("create {}", name));
        Ok(format!("id-{}", name))
    }

    async fn start(&self, name: &str) -> Result<()> {
        self.with_container(name, |c| {
            c.running = true;
            Ok(())
        })?;
        self.record(format!("start {}", name));
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<()> {
        self.with_container(name, |c| {
            c.running = false;
            Ok(())
        })?;
        self.record(format!("stop {}", name));
        Ok(())
    }

    async fn kill(&self, signal: &str, name: &str) -> Result<()> {
        self.with_container(name, |c| {
            c.running = false;
            Ok(())
        })?;
        self.record(format!("kill {} {}", signal, name));
        Ok(())
    }

    async fn remove(&self, name: &str, volumes: bool) -> Result<()> {
        self.check()?;
        let removed = self.state.lock().unwrap().containers.remove(name);
        if removed.is_none() {
            return Err(ContainerError::ContainerNotFound {
                container: name.to_string(),
            });
        }
        self.record(format!(
            "rm {}{}",
            if volumes { "--volumes " } else { "" },
            name
        ));
        Ok(())
    }

    async fn connect_network(&self, name: &str, network: &str, alias: Option<&str>) -> Result<()> {
        self.with_container(name, |c| {
            c.networks.push(network.to_string());
            Ok(())
        })?;
        self.record(format!(
            "network connect {} {}{}",
            network,
            name,
            alias.map(|a| format!(" alias={}", a)).unwrap_or_default()
        ));
        Ok(())
    }

    async fn exec(&self, name: &str, cmd: &[&str], stdin: Option<&[u8]>) -> Result<()> {
        self.with_container(name, |c| {
            if !c.running {
                return Err(ContainerError::CommandFailed {
                    command: format!("exec {}", name),
                    output: "container is not running".to_string(),
                });
            }
            match stdin {
                Some(input) => c.authorized_keys.extend_from_slice(input),
                None => c.scripts.push(cmd.join(" ")),
            }
            Ok(())
        })?;
        self.record(format!("exec {}", name));
        Ok(())
    }

    async fn inspect(&self, name: &str, format: &str) -> Result<Vec<String>> {
        if self.state.lock().unwrap().failing_inspect.contains(name) {
            return Err(ContainerError::CommandFailed {
                command: format!("inspect {}", name),
                output: "template parsing error".to_string(),
            });
        }
        self.with_container(name, |c| match format {
            "{{.Name}}" => Ok(vec![format!("/{}", name)]),
            "{{.State.Running}}" => Ok(vec![c.running.to_string()]),
            _ => {
                let host_port = c.ports.iter().find_map(|(port, host)| {
                    format
                        .contains(&format!("\"{}/tcp\"", port))
                        .then(|| host.clone())
                });
                host_port.map(|p| vec![p]).ok_or_else(|| ContainerError::CommandFailed {
                    command: format!("inspect {}", name),
                    output: "template: :1:10: executing \"\" at <index>: error calling index"
                        .to_string(),
                })
            }
        })
    }

    async fn inspect_object(&self, name: &str) -> Result<ContainerInspect> {
        let json = self.with_container(name, |c| {
            let ports: serde_json::Map<String, serde_json::Value> = c
                .ports
                .iter()
                .map(|(port, host)| {
                    (
                        format!("{}/tcp", port),
                        serde_json::json!([{"HostIp": "0.0.0.0", "HostPort": host}]),
                    )
                })
                .collect();
            let networks: serde_json::Map<String, serde_json::Value> = c
                .networks
                .iter()
                .enumerate()
                .map(|(i, network)| {
                    (
                        network.clone(),
                        serde_json::json!({
                            "Gateway": format!("172.{}.0.1", 17 + i),
                            "IPAddress": format!("172.{}.0.2", 17 + i),
                            "IPPrefixLen": 16,
                        }),
                    )
                })
                .collect();
            Ok(serde_json::json!({
                "Id": format!("id-{}", name),
                "Name": format!("/{}", name),
                "Mounts": [],
                "Config": {"Image": c.image, "Cmd": c.cmd},
                "NetworkSettings": {
                    "IPAddress": "172.17.0.2",
                    "Ports": ports,
                    "Networks": networks,
                },
            }))
        })?;
        Ok(serde_json::from_value(json)?)
    }
}
