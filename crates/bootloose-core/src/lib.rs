//! bootloose のクラスタ定義
//!
//! 設定ファイル（YAML）のモデル、読み書き、構造チェックを提供します。

pub mod error;
pub mod loader;
pub mod model;
pub mod query;

pub use error::{CoreError, Result};
pub use model::*;
