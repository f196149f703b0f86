//! Configuration file editor command.

use crate::config::{paths, VidrecConfig};
use std::fs;
use std::path::Path;
use std::process::Command;

/// Opens `~/.config/vidrec/vidrec.toml` in the user's editor.
///
/// Uses `$VISUAL`, then `$EDITOR`, then nano, then vi. The file already exists
/// at this point; startup setup writes it.
///
/// # Errors
/// - If no editor can be started
/// - If the editor exits with an error
pub fn handle_config() -> anyhow::Result<()> {
    let config_path = paths::config_path()?;
    let editor = find_editor()?;
    edit_config(&editor, &config_path)
}

/// Runs `editor` on the file, then parses it again so mistakes surface right away.
fn edit_config(editor: &str, config_path: &Path) -> anyhow::Result<()> {
    tracing::info!("Opening {} with {}", config_path.display(), editor);

    let status = Command::new(editor)
        .arg(config_path)
        .status()
        .map_err(|e| anyhow::anyhow!("Failed to open editor '{editor}': {e}"))?;

    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    let parsed = fs::read_to_string(config_path)
        .map_err(anyhow::Error::from)
        .and_then(|content| VidrecConfig::parse(&content));
    match parsed {
        Ok(_) => tracing::info!("Config file edited successfully"),
        Err(e) => {
            tracing::warn!("Edited config does not parse: {}", e);
            eprintln!("Warning: {e}");
        }
    }
    Ok(())
}

fn find_editor() -> anyhow::Result<String> {
    for var in ["VISUAL", "EDITOR"] {
        if let Ok(editor) = std::env::var(var) {
            if !editor.trim().is_empty() {
                return Ok(editor);
            }
        }
    }

    ["nano", "vi"]
        .into_iter()
        .find(|editor| on_path(editor))
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

fn on_path(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
