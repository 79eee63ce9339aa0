use crate::settings::Settings;
use anyhow::{Context as AnyhowContext, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn load_document_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read configuration from {}", path.display()))
}

pub fn load_settings_from_yaml(path: &Path) -> Result<Settings> {
    let yaml_content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;

    let settings: Settings = serde_yaml::from_str(&yaml_content)
        .with_context(|| format!("Failed to deserialize settings from {}", path.display()))?;

    Ok(settings)
}

/// Files below `root` with one of `extensions`, sorted.
pub fn collect_config_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to list directory {}", dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to list directory {}", dir.display()))?
                .path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|x| x == e))
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Writes `content` to `path`, first copying the old file to
/// `<path><backup_suffix>` when a suffix is given.
pub fn write_document(path: &Path, content: &[u8], backup_suffix: Option<&str>) -> Result<()> {
    if let Some(suffix) = backup_suffix {
        let mut backup = path.as_os_str().to_owned();
        backup.push(suffix);
        fs::copy(path, &backup)
            .with_context(|| format!("Failed to back up {}", path.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write configuration to {}", path.display()))
}
