//! クラスタ操作
//!
//! すべての操作はマシンを1台ずつ宣言順に処理する。

use crate::error::{ClusterError, Result};
use crate::keystore::KeyStore;
use crate::machine::{Machine, MachineState, MachineStatus};
use crate::replicator::Replicator;
use crate::ssh::{self, RetryPolicy, SshClient, SshTarget};
use crate::sshkey::{ensure_ssh_key, expand_home, public_key_path};
use bootloose_container::{CgroupVersion, ContainerRuntime, build_run_args, network_alias};
use bootloose_core::ClusterSpec;
use std::future::Future;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// イメージ取得の再試行回数
const PULL_RETRIES: u32 = 2;

/// 起動直後にコンテナ内で実行する初期化スクリプト
const INIT_SCRIPT: &str = r#"
set -e
rm -f /run/nologin
sshdir=/root/.ssh
test -d "$sshdir" || mkdir $sshdir
chmod 700 $sshdir
touch $sshdir/authorized_keys; chmod 600 $sshdir/authorized_keys
"#;

const AUTHORIZED_KEYS_APPEND: &str = "cat >> /root/.ssh/authorized_keys";

pub struct ClusterManager<R> {
    spec: ClusterSpec,
    key_store: Option<KeyStore>,
    runtime: R,
}

impl<R: ContainerRuntime> ClusterManager<R> {
    /// 検証済みのクラスタ定義から作成
    pub fn new(spec: ClusterSpec, runtime: R) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            key_store: None,
            runtime,
        })
    }

    /// マシンごとの公開鍵を取り出すキーストアを設定
    pub fn with_key_store(mut self, key_store: KeyStore) -> Self {
        self.key_store = Some(key_store);
        self
    }

    pub fn spec(&self) -> &ClusterSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    fn replicator(&self) -> Replicator<'_> {
        Replicator::new(&self.spec)
    }

    fn private_key_path(&self) -> Result<Option<PathBuf>> {
        self.spec.private_key().map(expand_home).transpose()
    }

    /// クラスタを作成して起動する
    ///
    /// 作成済みのマシンは飛ばす。途中で失敗した場合はそこで中断し、
    /// それまでに作成したマシンはそのまま残る。
    #[instrument(skip(self), fields(cluster = %self.name()))]
    pub async fn create(&self) -> Result<()> {
        if let Some(path) = self.private_key_path()? {
            ensure_ssh_key(&path)?;
        }

        self.runtime.ensure_running().await?;

        let mut images: Vec<&str> = Vec::new();
        for template in &self.spec.machines {
            if !images.contains(&template.spec.image.as_str()) {
                images.push(&template.spec.image);
            }
        }
        for image in images {
            self.runtime.pull_if_not_present(image, PULL_RETRIES).await?;
        }

        let cgroup = self.runtime.cgroup_version().await?;

        for machine in self.replicator().for_each() {
            self.create_machine(&machine, cgroup).await?;
        }
        Ok(())
    }

    async fn create_machine(&self, machine: &Machine<'_>, cgroup: CgroupVersion) -> Result<()> {
        let name = machine.container_name();

        if machine.is_created(&self.runtime).await? {
            info!("Machine {} is already created...", name);
            return Ok(());
        }

        let public_key = self.public_key(machine)?;
        let spec = machine.spec();

        info!("Creating machine: {} ...", name);
        let run_args = build_run_args(
            self.name(),
            name,
            machine.hostname(),
            spec,
            machine.global_index(),
            cgroup,
        );
        self.runtime
            .create(&spec.image, &run_args, &spec.command())
            .await?;

        for network in spec.networks.iter().skip(1) {
            info!("Connecting {} to the {} network...", name, network);
            self.runtime
                .connect_network(name, network, network_alias(network, machine.hostname()))
                .await?;
        }

        self.runtime.start(name).await?;

        self.runtime
            .exec(name, &["/bin/sh", "-c", INIT_SCRIPT], None)
            .await?;
        self.runtime
            .exec(
                name,
                &["/bin/sh", "-c", AUTHORIZED_KEYS_APPEND],
                Some(&public_key),
            )
            .await?;

        Ok(())
    }

    /// マシンに登録する公開鍵
    ///
    /// マシン個別の鍵（キーストア）を優先し、なければクラスタの鍵を使う。
    fn public_key(&self, machine: &Machine<'_>) -> Result<Vec<u8>> {
        if let (Some(name), Some(store)) = (
            machine.spec().public_key.as_deref().filter(|n| !n.is_empty()),
            &self.key_store,
        ) {
            let mut key = store.get(name)?;
            key.push(b'\n');
            return Ok(key);
        }

        let path = self.private_key_path()?.ok_or(ClusterError::NoSshKey)?;
        let public = public_key_path(&path);
        std::fs::read(&public).map_err(|source| ClusterError::Io {
            path: public,
            source,
        })
    }

    /// マシンを削除する（ホスト名が空なら全マシン）
    #[instrument(skip(self), fields(cluster = %self.name()))]
    pub async fn delete(&self, hostnames: &[String]) -> Result<()> {
        self.runtime.ensure_running().await?;

        for machine in self.replicator().select(hostnames) {
            let name = machine.container_name();
            match machine.state(&self.runtime).await? {
                MachineState::NotCreated => {
                    info!("Machine {} hasn't been created...", name);
                }
                MachineState::Unknown => {
                    warn!("State of machine {} is unknown, skipping...", name);
                }
                MachineState::Running => {
                    info!("Machine {} is started, stopping and deleting machine...", name);
                    self.runtime.kill("KILL", name).await?;
                    self.runtime.remove(name, true).await?;
                }
                MachineState::Stopped => {
                    info!("Deleting machine: {} ...", name);
                    self.runtime.remove(name, true).await?;
                }
            }
        }
        Ok(())
    }

    /// マシンを起動する（ホスト名が空なら全マシン）
    #[instrument(skip(self), fields(cluster = %self.name()))]
    pub async fn start(&self, hostnames: &[String]) -> Result<()> {
        self.runtime.ensure_running().await?;

        for machine in self.replicator().select(hostnames) {
            let name = machine.container_name();
            match machine.state(&self.runtime).await? {
                MachineState::NotCreated => {
                    warn!("Machine {} hasn't been created...", name);
                }
                MachineState::Unknown => {
                    warn!("State of machine {} is unknown, skipping...", name);
                }
                MachineState::Running => {
                    info!("Machine {} is already started...", name);
                }
                MachineState::Stopped => {
                    info!("Starting machine: {} ...", name);
                    self.runtime.start(name).await?;
                }
            }
        }
        Ok(())
    }

    /// マシンを停止する（ホスト名が空なら全マシン）
    #[instrument(skip(self), fields(cluster = %self.name()))]
    pub async fn stop(&self, hostnames: &[String]) -> Result<()> {
        self.runtime.ensure_running().await?;

        for machine in self.replicator().select(hostnames) {
            let name = machine.container_name();
            match machine.state(&self.runtime).await? {
                MachineState::NotCreated => {
                    info!("Machine {} hasn't been created...", name);
                }
                MachineState::Unknown => {
                    warn!("State of machine {} is unknown, skipping...", name);
                }
                MachineState::Stopped => {
                    info!("Machine {} is already stopped...", name);
                }
                MachineState::Running => {
                    info!("Stopping machine: {} ...", name);
                    self.runtime.stop(name).await?;
                }
            }
        }
        Ok(())
    }

    /// マシンの状態一覧（ホスト名が空なら全マシン）
    pub async fn inspect(&self, hostnames: &[String]) -> Result<Vec<MachineStatus>> {
        self.runtime.ensure_running().await?;

        let mut statuses = Vec::new();
        for mut machine in self.replicator().select(hostnames) {
            statuses.push(machine.status(&self.runtime).await);
        }
        Ok(statuses)
    }

    /// マシンに SSH でログインする
    ///
    /// `target` は `[user@]hostname`。sshd の準備ができるまで再試行する。
    pub async fn ssh<C, F>(
        &self,
        target: &str,
        remote_args: &[String],
        verbose: bool,
        client: &C,
        policy: RetryPolicy,
        cancel: F,
    ) -> Result<()>
    where
        C: SshClient,
        F: Future<Output = ()>,
    {
        let target = SshTarget::parse(target)
            .ok_or_else(|| ClusterError::InvalidSshTarget(target.to_string()))?;
        let mut machine = self.replicator().machine_from_hostname(&target.hostname)?;

        let mapping = machine.spec().port_mapping(22).ok_or_else(|| {
            ClusterError::UnknownContainerPort {
                machine: machine.container_name().to_string(),
                port: 22,
            }
        })?;
        let remote = mapping
            .address
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or("localhost")
            .to_string();

        let port = machine.host_port(&self.runtime, 22).await?;
        let private_key = self.private_key_path()?;

        let args = ssh::build_ssh_args(
            private_key.as_deref(),
            port,
            &target.user,
            &remote,
            verbose,
            remote_args,
        );

        let attempts = ssh::connect(client, &args, policy, cancel).await?;
        tracing::debug!(attempts, "SSH session finished");
        Ok(())
    }
}
