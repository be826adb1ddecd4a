use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 一時ディレクトリ上の作業環境
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.path().join("bootloose.yaml")
    }

    #[allow(dead_code)]
    pub fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn key_store(&self) -> PathBuf {
        self.root.path().join("keys")
    }

    /// 作業ディレクトリで実行し、利用者の環境変数の影響を受けないコマンド
    pub fn command(&self) -> Command {
        bootloose_in(self.root.path())
    }
}

pub fn bootloose_in(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("bootloose").unwrap();
    cmd.current_dir(dir)
        .env_remove("BOOTLOOSE_CONFIG")
        .env_remove("BOOTLOOSE_KEY_STORE")
        .env("NO_COLOR", "1");
    cmd
}
