//! マシンのインデックス
//!
//! 名前付け用のテンプレート内インデックスと、ポート計算用の
//! クラスタ全体の通し番号は別の型として扱う。

use std::fmt;

/// テンプレート内のレプリカ番号（0..count）。ホスト名の `%d` に使う
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TemplateIndex(pub usize);

/// クラスタ全体での通し番号。ホストポートのオフセットにのみ使う
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GlobalIndex(pub usize);

impl TemplateIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

impl GlobalIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for TemplateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GlobalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
