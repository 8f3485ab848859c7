//! Compact command implementation.

use todosync_server::ServerConfig;
use todosync_storage::{CompactStats, FileStore};

/// Runs the compact command.
pub fn run(config: &ServerConfig, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("Compacting store log at {:?}", config.store_path);
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let stats = compact(config, dry_run)?;

    println!("Compaction Analysis:");
    println!("  Input records:     {}", stats.input_records);
    println!("  Output records:    {}", stats.output_records);
    println!("  Obsolete versions: {}", stats.obsolete_removed());
    println!();
    println!("  Size before: {} bytes", stats.bytes_before);
    println!("  Size after:  {} bytes", stats.bytes_after);
    println!(
        "  Space saved: {} bytes ({:.1}%)",
        stats.bytes_before - stats.bytes_after,
        if stats.bytes_before > 0 {
            ((stats.bytes_before - stats.bytes_after) as f64 / stats.bytes_before as f64) * 100.0
        } else {
            0.0
        }
    );

    if !dry_run {
        println!();
        if stats.is_needed() {
            println!("✓ Compaction complete");
        } else {
            println!("No compaction needed - log is already compact");
        }
    }

    Ok(())
}

/// Compacts the store at `config.store_path`, or only measures it when
/// `dry_run` is set.
pub fn compact(
    config: &ServerConfig,
    dry_run: bool,
) -> Result<CompactStats, Box<dyn std::error::Error>> {
    if !config.store_path.exists() {
        return Err(format!("No store found at {:?}", config.store_path).into());
    }

    let store = FileStore::open(&config.store_path)?;
    let stats = if dry_run {
        store.compaction_stats()?
    } else {
        store.compact()?
    };
    Ok(stats)
}
