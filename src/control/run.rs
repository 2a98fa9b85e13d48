use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::backend::connector_for;
use crate::bench::{RunContext, run_workload};
use crate::config::{RunConfig, load_run_config};
use crate::error::AppResult;
use crate::protocol::{ControlOperation, TransferRequest};

use super::broadcast::{BroadcastSettings, broadcast};

/// Pause after each step so the cluster settles before the next one.
const STEP_SETTLE: Duration = Duration::from_secs(5);

/// The controller's whole run: start the database on every agent, drive the
/// workload against it, then stop everything.
///
/// # Errors
///
/// Returns an error when the configuration is invalid, any agent rejects a
/// lifecycle operation, or the workload itself fails.
pub async fn run_control(config_path: &Path) -> AppResult<()> {
    let config = load_run_config(config_path)?;
    let base = base_request(&config);
    let agents = config.agent_endpoints();
    let settings = BroadcastSettings::default();

    if config.step1.skip {
        info!("step 1 skipped");
    } else {
        info!(test_name = %config.test_name, database = %config.database, "step 1: starting database");
        broadcast(ControlOperation::Start, &base, &agents, settings).await?;
        tokio::time::sleep(STEP_SETTLE).await;
    }

    if config.step2.skip {
        info!("step 2 skipped");
    } else {
        info!("step 2: running workload");
        let connector = connector_for(config.database, config.database_endpoints());
        let ctx = RunContext::new(connector, config.step2.clone());
        run_workload(&ctx).await?;
        tokio::time::sleep(STEP_SETTLE).await;
    }

    if config.step3.skip {
        info!("step 3 skipped");
    } else {
        info!("step 3: stopping database");
        broadcast(ControlOperation::Stop, &base, &agents, settings).await?;
    }

    info!("control run finished");
    Ok(())
}

/// The invariant part of every control message. Broadcast fills in the
/// operation and per-node fields.
fn base_request(config: &RunConfig) -> TransferRequest {
    TransferRequest {
        operation: ControlOperation::Start,
        database: config.database,
        peer_ip_string: config.peer_ip_string(),
        server_index: 0,
        zookeeper_myid: 1,
        etcd_compression: config.tuning.etcd_compression.clone(),
        zookeeper_max_client_cnxns: config.tuning.zookeeper_max_client_cnxns,
        zookeeper_snap_count: config.tuning.zookeeper_snap_count,
        test_name: config.test_name.clone(),
        storage_project: config.storage.project.clone(),
        storage_bucket: config.storage.bucket.clone(),
        storage_subdirectory: config.storage.subdirectory.clone(),
        storage_key: config.storage_key.clone(),
        storage_endpoint: config.storage.endpoint.clone(),
    }
}
