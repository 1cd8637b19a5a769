//! `placegrid schedule` — one placement against a configured topology.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use placegrid_cluster::ClusterMgr;
use placegrid_core::{DiskStatus, ItemRef, PlacegridConfig};
use placegrid_placement::PlacementResult;
use placegrid_scheduler::{FlatScheduler, PlacementArguments};

pub fn schedule(
    config_path: &Path,
    replicas: u16,
    bucket: i32,
    status: Option<DiskStatus>,
    bfs: bool,
) -> Result<()> {
    let config = PlacegridConfig::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let result = place(&config, replicas, bucket, status, bfs)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.is_ok() {
        bail!("placement failed: {}", result.err_msg);
    }
    Ok(())
}

fn place(
    config: &PlacegridConfig,
    replicas: u16,
    bucket: i32,
    status: Option<DiskStatus>,
    bfs: bool,
) -> Result<PlacementResult> {
    let topology = config
        .topology
        .as_ref()
        .context("config has no [topology] table")?;
    let mgr = ClusterMgr::from_topology(topology)?;
    let scheduler = FlatScheduler::from_config(&config.scheduler);

    let mut args =
        PlacementArguments::from_config(replicas, config).with_bucket(ItemRef::from_raw(bucket));
    if let Some(status) = status {
        args = args.with_status(status);
    }
    if bfs {
        args = args.with_default_placement(false);
    }

    let result = scheduler.schedule(&mgr.cluster_data(), &args);
    info!(ret_code = result.ret_code, ids = ?result.ids, "schedule finished");
    Ok(result)
}
