use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Platform data directory (e.g. `~/.local/share/keygate`), created on demand.
pub fn data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("dev", "keygate", "keygate")
        .context("could not determine a home directory; set KEYGATE_DATA_DIR")?;
    let dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&dir).context("create data dir")?;
    Ok(dir)
}
