//! Cache command - inspect and clear recorded artifacts

use crate::cache::{CacheEntry, FileCache};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::{Config, ConfigManager};
use crate::error::KilnResult;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> KilnResult<()> {
    let cache = FileCache::new(ConfigManager::cache_dir(config));

    match args.action {
        CacheAction::List { format } => list_entries(&cache, format).await,
        CacheAction::Dir => {
            println!("{}", ConfigManager::cache_dir(config).display());
            Ok(())
        }
        CacheAction::Clear { yes } => clear_entries(&cache, yes).await,
    }
}

async fn list_entries(cache: &FileCache, format: OutputFormat) -> KilnResult<()> {
    let entries = cache.entries().await?;

    match format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[(String, CacheEntry)]) {
    if entries.is_empty() {
        println!("No cached artifacts.");
        return;
    }

    println!(
        "{:<40} {:<16} {:<17} {}",
        "KEY", "VERSION", "RECORDED", "LOCATION"
    );
    println!("{}", "-".repeat(100));

    for (key, entry) in entries {
        println!(
            "{:<40} {:<16} {:<17} {}",
            key,
            style(&entry.version).green(),
            entry.recorded_at.format("%Y-%m-%d %H:%M"),
            entry.location
        );
    }

    println!();
    println!("Total: {} artifact(s)", entries.len());
}

fn print_json(entries: &[(String, CacheEntry)]) -> KilnResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson<'a> {
        key: &'a str,
        version: &'a str,
        location: &'a str,
        recorded_at: String,
    }

    let json: Vec<EntryJson<'_>> = entries
        .iter()
        .map(|(key, entry)| EntryJson {
            key,
            version: &entry.version,
            location: &entry.location,
            recorded_at: entry.recorded_at.to_rfc3339(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_plain(entries: &[(String, CacheEntry)]) {
    for (key, entry) in entries {
        println!("{} {} {}", key, entry.version, entry.location);
    }
}

async fn clear_entries(cache: &FileCache, yes: bool) -> KilnResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let entries = cache.entries().await.unwrap_or_default();

    if entries.is_empty() && !cache.index_path().exists() {
        ui::step_info(&ctx, "Cache is already empty");
        return Ok(());
    }

    for (key, entry) in &entries {
        ui::remark(&ctx, &format!("{} {}", key, entry.version));
    }

    let prompt = format!("Remove {} cached artifact(s)?", entries.len());
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Aborted", "Pass --yes to skip confirmation");
        return Ok(());
    }

    let removed = cache.clear().await?;
    ui::step_ok(&ctx, &format!("Cleared {} artifact(s)", removed));

    Ok(())
}
