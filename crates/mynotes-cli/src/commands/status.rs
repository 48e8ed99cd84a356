//! Status command handler

use anyhow::Result;

use mynotes_core::storage::get_schema_version;
use mynotes_core::{Config, NoteColor, NoteRepository};

use crate::output::{local_time, Output, OutputFormat};

/// Show storage location, size and note counts
pub fn show(repo: &NoteRepository, config: &Config, output: &Output) -> Result<()> {
    let store = repo.store();
    let notes = repo.list()?;
    let schema_version = get_schema_version(store.connection())?;
    let db_path = config.sqlite_path();

    let by_color: Vec<(NoteColor, usize)> = NoteColor::ALL
        .iter()
        .map(|c| (*c, notes.iter().filter(|n| n.color == *c).count()))
        .filter(|(_, count)| *count > 0)
        .collect();

    match output.format {
        OutputFormat::Json => {
            let colors: serde_json::Map<String, serde_json::Value> = by_color
                .iter()
                .map(|(c, n)| (c.name().to_string(), serde_json::json!(n)))
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "database": db_path,
                    "database_size": store.file_size(),
                    "schema_version": schema_version,
                    "counts": {
                        "notes": notes.len(),
                        "by_color": colors
                    },
                    "last_updated": notes.first().map(|n| n.updated_at())
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", notes.len());
        }
        OutputFormat::Human => {
            println!("mynotes Status");
            println!("==============");
            println!();
            println!("Storage:");
            println!("  Location: {}", db_path.display());
            println!("  Size:     {}", human_size(store.file_size()));
            if let Some(version) = schema_version {
                println!("  Schema:   v{}", version);
            }
            println!();
            println!("Contents:");
            println!("  Notes: {}", notes.len());
            for (color, count) in &by_color {
                println!("    {:<8} {}", color.name(), count);
            }
            if let Some(latest) = notes.first() {
                println!();
                println!("Last updated: {}", local_time(latest.updated_at()));
            }
        }
    }

    Ok(())
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
