use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

/// Every `*.toml` file under `root`, sorted, skipping build output and VCS
/// directories.
pub fn discover_scenarios(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| filter_entry(e.path()))
    {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            found.push(path.to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}

fn filter_entry(path: &Path) -> bool {
    let ignored = ["target", ".git", "reports"];
    !path.components().any(|part| match part {
        Component::Normal(os_str) => os_str.to_str().is_some_and(|s| ignored.contains(&s)),
        _ => false,
    })
}
