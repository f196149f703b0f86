//! Lists saved recordings.

use crate::config::paths;
use crate::history::RecordingHistory;

/// Prints saved recordings, newest first, numbered for `vidrec play --index`.
///
/// # Errors
/// If the history directory cannot be read.
pub fn handle_history() -> Result<(), anyhow::Error> {
    let history = RecordingHistory::new(&paths::data_dir()?)?;
    let entries = history.list()?;

    if entries.is_empty() {
        println!("No recordings saved yet. Run `vidrec` to record one.");
        return Ok(());
    }

    println!();
    println!("Saved recordings (newest first):");
    println!();

    for (position, entry) in entries.iter().enumerate() {
        let kind = if entry.transcoded { "mp4+jpg" } else { "webm" };
        println!(
            "  {:>2}. {}  [{}]",
            position + 1,
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            kind
        );
        for file in &entry.files {
            let marker = if file.exists() { "" } else { " (missing)" };
            println!("        {}{}", file.display(), marker);
        }
    }
    println!();

    Ok(())
}
