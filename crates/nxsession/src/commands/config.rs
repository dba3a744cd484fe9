//! Config command implementation

use std::path::Path;

use anyhow::{Context, Result};

use nxs_core::config::{default_config_path, save_config, NxConfig};

use crate::output::print_success;

/// Write the default configuration to `config_path` (or the default path)
pub fn config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if path.exists() && !force {
        anyhow::bail!("Config file already exists: {:?} (use -f to overwrite)", path);
    }

    save_config(&path, &NxConfig::default())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    print_success(&format!("Created configuration file: {:?}", path));
    Ok(())
}
