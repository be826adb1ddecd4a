use crate::utils;
use bootloose_cluster::KeyStore;
use colored::Colorize;
use std::io::Write;
use std::path::Path;

fn open_store(key_store: Option<&Path>) -> anyhow::Result<KeyStore> {
    let store = KeyStore::new(utils::key_store_dir(key_store)?);
    store.init()?;
    Ok(store)
}

pub fn handle_add(key_store: Option<&Path>, name: &str, file: &Path) -> anyhow::Result<()> {
    let key = std::fs::read(file)
        .map_err(|e| anyhow::anyhow!("公開鍵ファイル {} を読み込めません: {}", file.display(), e))?;

    let store = open_store(key_store)?;
    store.store(name, &key)?;

    tracing::info!(key = %name, dir = %store.base_path().display(), "Public key stored");
    println!(
        "{}",
        format!("✓ 公開鍵 '{}' を登録しました", name).green().bold()
    );
    Ok(())
}

pub fn handle_get(key_store: Option<&Path>, name: &str) -> anyhow::Result<()> {
    let store = open_store(key_store)?;
    let key = store.get(name)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&key)?;
    if !key.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}

pub fn handle_remove(key_store: Option<&Path>, name: &str) -> anyhow::Result<()> {
    let store = open_store(key_store)?;
    store.remove(name)?;

    println!(
        "{}",
        format!("✓ 公開鍵 '{}' を削除しました", name).green().bold()
    );
    Ok(())
}
