use std::path::Path;

use anyhow::{Result, bail};
use placegrid_core::PlacegridConfig;

/// Write a scaffold config with `groups` groups of `disks_per_group` disks.
pub fn init(groups: usize, disks_per_group: usize, output: &Path) -> Result<()> {
    if output.exists() {
        bail!("{} already exists", output.display());
    }
    let config = PlacegridConfig::scaffold(groups, disks_per_group);
    std::fs::write(output, config.to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
