//! List command implementation

use std::path::Path;

use anyhow::{Context, Result};

use nxs_coordinator::SessionContext;
use nxs_core::config::NxConfig;

use crate::output::format_sessions;

/// Execute the list command
pub fn list_command(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = NxConfig::load(config_path)?;
    let ctx = SessionContext::from_config(config)?;
    let sessions = ctx
        .list()
        .with_context(|| format!("Failed to list sessions under {:?}", ctx.store.root()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
    } else {
        println!("{}", format_sessions(&sessions));
    }

    Ok(())
}
