//! モデル定義
//!
//! bootlooseで使用されるデータモデルを定義します。
//! 各モデルは機能ごとにモジュールに分離されています。

mod cluster;
mod index;
mod machine;
mod port;
mod volume;

// Re-exports
pub use cluster::*;
pub use index::*;
pub use machine::*;
pub use port::*;
pub use volume::*;
