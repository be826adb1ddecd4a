//! docker CLI ラッパー
//!
//! `docker` コマンドを外部プロセスとして起動し、終了コードと出力だけで
//! 成否を判定します。

use crate::error::{ContainerError, Result};
use crate::inspect::ContainerInspect;
use crate::runtime::ContainerRuntime;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const NOT_FOUND_MARKERS: [&str; 2] = ["No such object", "No such container"];

/// docker CLI を使うランタイム
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// docker コマンドを実行し、標準出力を返す
    ///
    /// `container` が指定された場合、存在しないコンテナへの操作は
    /// `ContainerNotFound` として返す。
    async fn run_command(
        &self,
        container: Option<&str>,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let command_line = format!("{} {}", self.binary, args.join(" "));
        tracing::debug!("Running: {}", command_line);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ContainerError::RuntimeUnavailable(format!("{}: {}", self.binary, e))
            } else {
                ContainerError::Io(e)
            }
        })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input).await?;
            // EOF を送るために閉じる
            drop(pipe);
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(command_error(container, command_line, stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// 失敗したコマンドの stderr をエラーに変換する
fn command_error(container: Option<&str>, command_line: String, stderr: String) -> ContainerError {
    if let Some(name) = container
        && NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m))
    {
        return ContainerError::ContainerNotFound {
            container: name.to_string(),
        };
    }
    tracing::error!(command = %command_line, "{}", stderr);
    ContainerError::CommandFailed {
        command: command_line,
        output: stderr,
    }
}

fn lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

impl ContainerRuntime for DockerCli {
    async fn ensure_running(&self) -> Result<()> {
        match self
            .run_command(None, &["version", "--format", "{{.Server.Version}}"], None)
            .await
        {
            Ok(version) => {
                tracing::debug!(version = %version.trim(), "Container runtime is reachable");
                Ok(())
            }
            Err(ContainerError::CommandFailed { output, .. }) => {
                Err(ContainerError::RuntimeUnavailable(output))
            }
            Err(e) => Err(e),
        }
    }

    async fn info(&self, format: &str) -> Result<Vec<String>> {
        let output = self.run_command(None, &["info", "--format", format], None).await?;
        Ok(lines(&output))
    }

    async fn pull_if_not_present(&self, image: &str, retries: u32) -> Result<bool> {
        if self
            .run_command(None, &["image", "inspect", "--format", "{{.Id}}", image], None)
            .await
            .is_ok()
        {
            tracing::debug!(image = %image, "Image is already present");
            return Ok(false);
        }

        let attempts = retries + 1;
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            tracing::info!("Pulling image: {} ...", image);
            match self.run_command(None, &["pull", image], None).await {
                Ok(_) => return Ok(true),
                Err(ContainerError::CommandFailed { output, .. }) => {
                    tracing::warn!(attempt, "Failed to pull image {}", image);
                    last_error = output;
                }
                Err(e) => return Err(e),
            }
        }

        Err(ContainerError::ImagePullFailed {
            image: image.to_string(),
            attempts,
            message: last_error,
        })
    }

    async fn create(&self, image: &str, run_args: &[String], cmd: &[String]) -> Result<String> {
        let mut args = vec!["create"];
        args.extend(run_args.iter().map(String::as_str));
        args.push(image);
        args.extend(cmd.iter().map(String::as_str));

        let output = self.run_command(None, &args, None).await?;
        Ok(output.trim().to_string())
    }

    async fn start(&self, name: &str) -> Result<()> {
        self.run_command(Some(name), &["start", name], None).await?;
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<()> {
        self.run_command(Some(name), &["stop", name], None).await?;
        Ok(())
    }

    async fn kill(&self, signal: &str, name: &str) -> Result<()> {
        self.run_command(Some(name), &["kill", "-s", signal, name], None).await?;
        Ok(())
    }

    async fn remove(&self, name: &str, volumes: bool) -> Result<()> {
        let mut args = vec!["rm"];
        if volumes {
            args.push("--volumes");
        }
        args.push(name);
        self.run_command(Some(name), &args, None).await?;
        Ok(())
    }

    async fn connect_network(&self, name: &str, network: &str, alias: Option<&str>) -> Result<()> {
        let mut args = vec!["network", "connect"];
        if let Some(alias) = alias {
            args.extend(["--alias", alias]);
        }
        args.extend([network, name]);
        self.run_command(Some(name), &args, None).await?;
        Ok(())
    }

    async fn exec(&self, name: &str, cmd: &[&str], stdin: Option<&[u8]>) -> Result<()> {
        let mut args = vec!["exec"];
        if stdin.is_some() {
            args.push("-i");
        }
        args.push(name);
        args.extend_from_slice(cmd);
        self.run_command(Some(name), &args, stdin).await?;
        Ok(())
    }

    async fn inspect(&self, name: &str, format: &str) -> Result<Vec<String>> {
        let output = self
            .run_command(
                Some(name),
                &["inspect", "--type", "container", "--format", format, name],
                None,
            )
            .await?;
        Ok(lines(&output))
    }

    async fn inspect_object(&self, name: &str) -> Result<ContainerInspect> {
        let output = self
            .run_command(
                Some(name),
                &["inspect", "--type", "container", "--format", "{{json .}}", name],
                None,
            )
            .await?;
        Ok(serde_json::from_str(output.trim())?)
    }
}
