//! First-run setup and config migration.
//!
//! The config file starts with a `config_version = "X.Y.Z"` line. A missing file
//! or one written by an older release is replaced with the bundled template.

use crate::config::paths;
use anyhow::anyhow;
use regex::Regex;
use std::path::Path;

/// Embedded default configuration template.
pub const DEFAULT_CONFIG: &str = include_str!("../../environments/vidrec.toml");

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes the default config if it is missing or outdated.
///
/// An outdated file is kept next to the new one as `vidrec.toml.bak`.
///
/// # Errors
/// If the config directory or file cannot be written.
pub fn ensure_config() -> anyhow::Result<()> {
    let config_path = paths::config_path()?;

    match setup_needed(&config_path)? {
        SetupReason::UpToDate => {
            tracing::debug!("Config version up to date ({})", CURRENT_VERSION);
            return Ok(());
        }
        SetupReason::Missing => {
            tracing::info!("No config found, writing defaults to {}", config_path.display());
        }
        SetupReason::Outdated(old) => {
            let backup = config_path.with_extension("toml.bak");
            std::fs::copy(&config_path, &backup)?;
            tracing::info!(
                "Migrating config from version {} to {} (previous file kept at {})",
                old,
                CURRENT_VERSION,
                backup.display()
            );
        }
    }

    write_default_config(&config_path)
}

#[derive(Debug, PartialEq, Eq)]
enum SetupReason {
    Missing,
    Outdated(String),
    UpToDate,
}

fn setup_needed(config_path: &Path) -> anyhow::Result<SetupReason> {
    if !config_path.exists() {
        return Ok(SetupReason::Missing);
    }
    let content = std::fs::read_to_string(config_path)?;
    Ok(classify(&content))
}

fn classify(content: &str) -> SetupReason {
    match read_version(content) {
        Some(version) if version >= parse_version(CURRENT_VERSION).unwrap_or_default() => {
            SetupReason::UpToDate
        }
        Some((major, minor, patch)) => SetupReason::Outdated(format!("{major}.{minor}.{patch}")),
        // Unversioned files predate versioning
        None => SetupReason::Outdated("unversioned".to_string()),
    }
}

/// Extracts the version from the first non-empty line.
fn read_version(content: &str) -> Option<(u32, u32, u32)> {
    let pattern = Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)"\s*$"#).ok()?;
    let first_line = content.lines().find(|line| !line.trim().is_empty())?;
    let captures = pattern.captures(first_line)?;
    parse_version(captures.get(1)?.as_str())
}

fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let mut parts = version.trim().split('.').map(|p| p.parse::<u32>().ok());
    let version = (parts.next()??, parts.next()??, parts.next()??);
    match parts.next() {
        None => Some(version),
        Some(_) => None,
    }
}

fn write_default_config(config_path: &Path) -> anyhow::Result<()> {
    let parent = config_path
        .parent()
        .ok_or_else(|| anyhow!("Invalid config path: {}", config_path.display()))?;
    std::fs::create_dir_all(parent)?;

    let content = format!("config_version = \"{CURRENT_VERSION}\"\n{DEFAULT_CONFIG}");
    std::fs::write(config_path, content)?;
    tracing::info!("Wrote default configuration to {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.2.3"), Some((1, 2, 3)));
        assert_eq!(parse_version("1.2"), None);
        assert_eq!(parse_version("1.2.3.4"), None);
        assert_eq!(parse_version("a.b.c"), None);
    }

    #[test]
    fn test_classify() {
        let current = format!("config_version = \"{CURRENT_VERSION}\"\n[capture]\n");
        assert_eq!(classify(&current), SetupReason::UpToDate);
        assert_eq!(
            classify("config_version = \"0.0.0\"\n"),
            SetupReason::Outdated("0.0.0".to_string())
        );
        assert_eq!(
            classify("# config_version = \"9.9.9\"\n"),
            SetupReason::Outdated("unversioned".to_string())
        );
        assert_eq!(
            classify("config_version = \"999.0.0\""),
            SetupReason::UpToDate
        );
    }

    #[test]
    fn test_write_default_config_is_versioned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vidrec.toml");

        write_default_config(&path).unwrap();

        assert_eq!(setup_needed(&path).unwrap(), SetupReason::UpToDate);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(crate::config::VidrecConfig::parse(&content).is_ok());
    }

    #[test]
    fn test_missing_file_needs_setup() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            setup_needed(&dir.path().join("vidrec.toml")).unwrap(),
            SetupReason::Missing
        );
    }
}
