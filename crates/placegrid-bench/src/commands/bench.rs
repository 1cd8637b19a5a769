//! `placegrid bench` — concurrent scheduling throughput.
//!
//! Builds the scaffold topology (one site, N groups of disks), then has
//! every thread fetch the current snapshot and schedule against it in a
//! tight loop, once per selected seed strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;

use placegrid_cluster::ClusterMgr;
use placegrid_core::{PlacegridConfig, PlacementStrategyKind};
use placegrid_scheduler::{FlatScheduler, PlacementArguments};

#[derive(Debug, Clone)]
pub struct BenchParams {
    pub groups: usize,
    pub disks_per_group: usize,
    pub replicas: u16,
    pub threads: usize,
    pub iterations: usize,
}

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub strategy: PlacementStrategyKind,
    pub groups: usize,
    pub replicas: u16,
    pub threads: usize,
    pub calls: usize,
    pub failures: usize,
    pub elapsed_ms: u128,
    pub calls_per_sec: f64,
}

pub fn run(params: &BenchParams, kinds: &[PlacementStrategyKind], format: &str) -> Result<()> {
    if params.groups == 0 || params.disks_per_group == 0 {
        bail!("bench needs at least one group with one disk");
    }
    if params.threads == 0 {
        bail!("bench needs at least one thread");
    }

    let config = PlacegridConfig::scaffold(params.groups, params.disks_per_group);
    let topology = config
        .topology
        .as_ref()
        .context("scaffold config has no topology")?;
    let mgr = ClusterMgr::from_topology(topology)?;
    info!(
        groups = params.groups,
        disks = params.groups * params.disks_per_group,
        "bench topology ready"
    );

    let mut reports = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let scheduler = FlatScheduler::new(kind, config.scheduler.max_buckets);
        let args = PlacementArguments::from_config(params.replicas, &config);
        reports.push(measure(&mgr, &scheduler, &args, kind, params));
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&reports)?),
        _ => {
            for r in &reports {
                println!(
                    "{:?}: {} threads, {} replicas, {} groups: {} calls in {} ms ({:.0} calls/s, {} failed)",
                    r.strategy,
                    r.threads,
                    r.replicas,
                    r.groups,
                    r.calls,
                    r.elapsed_ms,
                    r.calls_per_sec,
                    r.failures
                );
            }
        }
    }
    Ok(())
}

fn measure(
    mgr: &ClusterMgr,
    scheduler: &FlatScheduler,
    args: &PlacementArguments,
    kind: PlacementStrategyKind,
    params: &BenchParams,
) -> BenchReport {
    let failures = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|s| {
        for _ in 0..params.threads {
            s.spawn(|| {
                let mut failed = 0;
                for _ in 0..params.iterations {
                    let data = mgr.cluster_data();
                    if !scheduler.schedule(&data, args).is_ok() {
                        failed += 1;
                    }
                }
                failures.fetch_add(failed, Ordering::Relaxed);
            });
        }
    });

    let elapsed = start.elapsed();
    let calls = params.threads * params.iterations;
    let report = BenchReport {
        strategy: kind,
        groups: params.groups,
        replicas: params.replicas,
        threads: params.threads,
        calls,
        failures: failures.into_inner(),
        elapsed_ms: elapsed.as_millis(),
        calls_per_sec: rate(calls, elapsed),
    };
    info!(strategy = ?kind, calls, failures = report.failures, "bench run finished");
    report
}

fn rate(calls: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { calls as f64 / secs } else { 0.0 }
}
