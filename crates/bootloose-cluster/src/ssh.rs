//! SSH 接続
//!
//! コンテナ起動直後は sshd がまだ接続を受け付けず、鍵交換の段階で切断される。
//! その間は一定間隔で再試行し、それ以外の失敗はすぐに返す。

use regex::bytes::Regex;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::time::MissedTickBehavior;

/// sshd の準備ができていないときのメッセージ
///
/// 例: `ssh_exchange_identification: read: Connection reset by peer`
static TRANSIENT_REFUSAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(ssh|kex)_exchange_identification:.+?$").expect("valid regex")
});

/// stderr に一時的な接続拒否のメッセージが含まれるか
pub fn is_transient_refusal(stderr: &[u8]) -> bool {
    TRANSIENT_REFUSAL.is_match(stderr)
}

#[derive(Error, Debug)]
pub enum SshError {
    #[error("SSH サーバーの準備ができていません: {0}")]
    TransientRefusal(String),

    #[error("ssh が失敗しました（終了コード {}）: {stderr}", describe_code(.code))]
    Failed { code: Option<i32>, stderr: String },

    #[error("SSH 接続がタイムアウトしました{}", describe_last(.last))]
    Timeout { last: Option<Box<SshError>> },

    #[error("SSH 接続が中断されました")]
    Cancelled,

    #[error("ssh を起動できません: {0}")]
    Spawn(#[from] std::io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "なし".to_string())
}

fn describe_last(last: &Option<Box<SshError>>) -> String {
    last.as_ref()
        .map(|e| format!(": {}", e))
        .unwrap_or_default()
}

/// ssh 1回分の結果
#[derive(Debug, Clone, Default)]
pub struct SshOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: Vec<u8>,
}

/// ssh クライアントの起動
#[allow(async_fn_in_trait)]
pub trait SshClient {
    async fn run(&self, args: &[String]) -> std::io::Result<SshOutput>;
}

/// OpenSSH の `ssh` コマンド
///
/// 標準入出力はそのまま引き継ぎ、stderr は一時的な接続拒否の行だけを除いて転送する。
#[derive(Debug, Clone)]
pub struct OpenSshClient {
    binary: String,
}

impl Default for OpenSshClient {
    fn default() -> Self {
        Self {
            binary: "ssh".to_string(),
        }
    }
}

impl SshClient for OpenSshClient {
    async fn run(&self, args: &[String]) -> std::io::Result<SshOutput> {
        tracing::debug!("Running: {} {}", self.binary, args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut captured = Vec::new();
        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr);
            let mut out = tokio::io::stderr();
            let mut line = Vec::new();
            loop {
                line.clear();
                if reader.read_until(b'\n', &mut line).await? == 0 {
                    break;
                }
                if !is_transient_refusal(&line) {
                    out.write_all(&line).await?;
                }
                captured.extend_from_slice(&line);
            }
            out.flush().await?;
        }

        let status = child.wait().await?;
        Ok(SshOutput {
            success: status.success(),
            code: status.code(),
            stderr: captured,
        })
    }
}

/// 1回の試行の分類
#[derive(Debug)]
pub enum Attempt {
    Success,
    Retryable(SshError),
    Fatal(SshError),
}

impl Attempt {
    pub fn classify(result: std::io::Result<SshOutput>) -> Self {
        match result {
            Ok(output) if output.success => Attempt::Success,
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                match TRANSIENT_REFUSAL.find(&output.stderr) {
                    Some(m) => Attempt::Retryable(SshError::TransientRefusal(
                        String::from_utf8_lossy(m.as_bytes()).trim().to_string(),
                    )),
                    None => Attempt::Fatal(SshError::Failed {
                        code: output.code,
                        stderr,
                    }),
                }
            }
            Err(e) => Attempt::Fatal(SshError::Spawn(e)),
        }
    }
}

/// 再試行の状態
#[derive(Debug)]
pub enum RetryState {
    Idle,
    Attempting {
        attempt: u32,
        last: Option<SshError>,
    },
    Retrying {
        attempt: u32,
        last: SshError,
    },
    Succeeded {
        attempts: u32,
    },
    Failed(SshError),
    TimedOut {
        last: Option<SshError>,
    },
    Cancelled,
}

impl RetryState {
    /// 次の試行を始める
    pub fn on_tick(self) -> Self {
        match self {
            RetryState::Idle => RetryState::Attempting {
                attempt: 1,
                last: None,
            },
            RetryState::Retrying { attempt, last } => RetryState::Attempting {
                attempt: attempt + 1,
                last: Some(last),
            },
            other => other,
        }
    }

    /// 試行の結果を反映する
    pub fn on_attempt(self, outcome: Attempt) -> Self {
        match self {
            RetryState::Attempting { attempt, .. } => match outcome {
                Attempt::Success => RetryState::Succeeded { attempts: attempt },
                Attempt::Retryable(last) => RetryState::Retrying { attempt, last },
                Attempt::Fatal(e) => RetryState::Failed(e),
            },
            other => other,
        }
    }

    pub fn on_deadline(self) -> Self {
        match self {
            RetryState::Idle => RetryState::TimedOut { last: None },
            RetryState::Attempting { last, .. } => RetryState::TimedOut { last },
            RetryState::Retrying { last, .. } => RetryState::TimedOut { last: Some(last) },
            other => other,
        }
    }

    pub fn on_cancel(self) -> Self {
        if self.is_terminal() {
            self
        } else {
            RetryState::Cancelled
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetryState::Succeeded { .. }
                | RetryState::Failed(_)
                | RetryState::TimedOut { .. }
                | RetryState::Cancelled
        )
    }

    /// 終了状態なら結果を返す
    pub fn finish(self) -> Result<Result<u32, SshError>, Self> {
        match self {
            RetryState::Succeeded { attempts } => Ok(Ok(attempts)),
            RetryState::Failed(e) => Ok(Err(e)),
            RetryState::TimedOut { last } => Ok(Err(SshError::Timeout {
                last: last.map(Box::new),
            })),
            RetryState::Cancelled => Ok(Err(SshError::Cancelled)),
            other => Err(other),
        }
    }
}

/// 再試行の間隔と上限
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub tick: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            timeout: Duration::from_secs(120),
        }
    }
}

/// ssh を実行し、一時的な接続拒否の間は再試行する
///
/// 成功時は試行回数を返す。`cancel` が完了すると中断する。
pub async fn connect<C, F>(
    client: &C,
    args: &[String],
    policy: RetryPolicy,
    cancel: F,
) -> Result<u32, SshError>
where
    C: SshClient,
    F: Future<Output = ()>,
{
    let deadline = tokio::time::sleep(policy.timeout);
    tokio::pin!(deadline);
    tokio::pin!(cancel);

    let mut ticker = tokio::time::interval(policy.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut state = RetryState::Idle;
    loop {
        state = tokio::select! {
            biased;
            _ = &mut cancel => state.on_cancel(),
            _ = &mut deadline => state.on_deadline(),
            _ = ticker.tick() => {
                let attempting = state.on_tick();
                let outcome = Attempt::classify(client.run(args).await);
                if let Attempt::Retryable(e) = &outcome {
                    tracing::debug!("{}", e);
                }
                attempting.on_attempt(outcome)
            }
        };

        state = match state.finish() {
            Ok(result) => return result,
            Err(pending) => pending,
        };
    }
}

/// `[user@]hostname` 形式の接続先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub user: String,
    pub hostname: String,
}

impl SshTarget {
    /// ユーザーが省略された場合は USER、LOGNAME の順で現在のユーザーを使う
    pub fn parse(target: &str) -> Option<Self> {
        let mut parts = target.split('@');
        let (user, hostname) = match (parts.next(), parts.next(), parts.next()) {
            (Some(hostname), None, None) => (current_user(), hostname),
            (Some(user), Some(hostname), None) => (user.to_string(), hostname),
            _ => return None,
        };
        if user.is_empty() || hostname.is_empty() {
            return None;
        }
        Some(Self {
            user,
            hostname: hostname.to_string(),
        })
    }
}

fn current_user() -> String {
    user_from_env(|var| std::env::var(var).ok()).unwrap_or_else(|| {
        tracing::warn!("Neither USER nor LOGNAME is set, logging in as root");
        "root".to_string()
    })
}

/// USER、LOGNAME の順に空でない値を探す
fn user_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    ["USER", "LOGNAME"]
        .into_iter()
        .filter_map(lookup)
        .find(|v| !v.is_empty())
}

/// ssh の引数を組み立てる
pub fn build_ssh_args(
    private_key: Option<&Path>,
    port: u16,
    user: &str,
    remote: &str,
    verbose: bool,
    remote_args: &[String],
) -> Vec<String> {
    let mut args: Vec<String> = [
        "-o",
        "UserKnownHostsFile=/dev/null",
        "-o",
        "StrictHostKeyChecking=no",
        "-o",
        "IdentitiesOnly=yes",
        "-o",
        "LogLevel=error",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if verbose {
        args.push("-v".to_string());
    }
    if let Some(key) = private_key {
        args.push("-i".to_string());
        args.push(key.display().to_string());
    }
    args.extend([
        "-p".to_string(),
        port.to_string(),
        "-l".to_string(),
        user.to_string(),
        remote.to_string(),
    ]);
    args.extend(remote_args.iter().cloned());
    args
}
