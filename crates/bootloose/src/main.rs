mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::show::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bootloose")]
#[command(about = "bootloose - 仮想マシンのように振る舞うコンテナ", long_about = None)]
struct Cli {
    /// クラスタ設定ファイル（既定: bootloose.yaml）
    #[arg(short = 'c', long = "config", global = true, env = "BOOTLOOSE_CONFIG")]
    config: Option<PathBuf>,

    /// 公開鍵キーストアのディレクトリ
    #[arg(long = "key-store", global = true, env = "BOOTLOOSE_KEY_STORE")]
    key_store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// クラスタ設定の管理
    #[command(subcommand)]
    Config(ConfigCommands),
    /// クラスタを作成
    Create,
    /// クラスタを削除
    Delete {
        /// 対象のホスト名（省略時はすべて）
        hostnames: Vec<String>,
    },
    /// マシンを起動
    Start {
        /// 対象のホスト名（省略時はすべて）
        hostnames: Vec<String>,
    },
    /// マシンを停止
    Stop {
        /// 対象のホスト名（省略時はすべて）
        hostnames: Vec<String>,
    },
    /// マシンの一覧を表示
    #[command(visible_alias = "status")]
    Show {
        /// 対象のホスト名（省略時はすべて）
        hostnames: Vec<String>,
        /// 出力形式
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// マシンに SSH でログイン
    Ssh {
        /// 接続先 ([user@]hostname)
        target: String,
        /// ssh を詳細モードで実行
        #[arg(short, long)]
        verbose: bool,
        /// リモートで実行するコマンド（-- 以降）
        #[arg(last = true)]
        remote_args: Vec<String>,
    },
    /// 公開鍵キーストアの管理
    #[command(subcommand)]
    Key(KeyCommands),
    /// バージョン情報を表示
    Version,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// クラスタ設定ファイルを作成
    Create(commands::config::CreateArgs),
    /// 設定値を取得（例: machines[0].spec.image）
    Get {
        /// 設定値のパス（省略時は全体）
        path: Option<String>,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// 公開鍵を登録
    Add {
        /// 鍵の名前
        name: String,
        /// 公開鍵ファイル
        file: PathBuf,
    },
    /// 公開鍵を表示
    Get {
        /// 鍵の名前
        name: String,
    },
    /// 公開鍵を削除
    Remove {
        /// 鍵の名前
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 結果は stdout、ログは stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = cli.config.as_deref();
    let key_store = cli.key_store.as_deref();

    match cli.command {
        Commands::Version => {
            println!("bootloose {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Config(ConfigCommands::Create(args)) => {
            commands::config::handle_create(config, args)?;
        }
        Commands::Config(ConfigCommands::Get { path }) => {
            commands::config::handle_get(config, path.as_deref())?;
        }
        Commands::Key(KeyCommands::Add { name, file }) => {
            commands::key::handle_add(key_store, &name, &file)?;
        }
        Commands::Key(KeyCommands::Get { name }) => {
            commands::key::handle_get(key_store, &name)?;
        }
        Commands::Key(KeyCommands::Remove { name }) => {
            commands::key::handle_remove(key_store, &name)?;
        }
        Commands::Create => {
            commands::create::handle(config, key_store).await?;
        }
        Commands::Delete { hostnames } => {
            commands::delete::handle(config, key_store, &hostnames).await?;
        }
        Commands::Start { hostnames } => {
            commands::start::handle(config, key_store, &hostnames).await?;
        }
        Commands::Stop { hostnames } => {
            commands::stop::handle(config, key_store, &hostnames).await?;
        }
        Commands::Show { hostnames, output } => {
            commands::show::handle(config, key_store, &hostnames, output).await?;
        }
        Commands::Ssh {
            target,
            verbose,
            remote_args,
        } => {
            commands::ssh::handle(config, key_store, &target, verbose, &remote_args).await?;
        }
    }

    Ok(())
}
