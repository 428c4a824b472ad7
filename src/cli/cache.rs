// src/cli/cache.rs — `tourney cache`: summarize the cache file

use std::path::Path;

use crate::cache::CacheStore;

pub fn show_cache(path: &Path, json: bool) -> anyhow::Result<()> {
    let store = CacheStore::open(path)?;
    let stats = store.stats();

    if json {
        let summary = serde_json::json!({
            "path": store.path(),
            "themes": store.themes(),
            "entries": stats.entries,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Cache: {}", store.path().display());
    if !store.path().exists() {
        println!("  (not created yet)");
        return Ok(());
    }
    println!("  {} theme(s), {} entr(ies)", stats.themes, stats.entries);
    for theme in store.themes() {
        println!("    {theme}");
    }
    Ok(())
}
