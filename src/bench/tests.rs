use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::args::BenchType;
use crate::backend::Connector;
use crate::backend::test_support::MockConnector;
use crate::config::WorkloadConfig;
use crate::error::{AppError, ControlError};

use super::driver::{PRIME_ATTEMPTS, RunContext};
use super::progress::NullProgress;
use super::run_workload;

fn workload(bench_type: BenchType, total_requests: u64) -> WorkloadConfig {
    WorkloadConfig {
        skip: false,
        bench_type,
        key_size: 8,
        value_size: 4,
        value_test_data_path: None,
        same_key: false,
        total_requests,
        clients: 4,
        connections: 2,
        request_interval_ms: 0,
        local_read: false,
        etcdv3_compaction_cycle: 0,
    }
}

fn context(mock: &Arc<MockConnector>, workload: WorkloadConfig) -> RunContext {
    RunContext {
        connector: Arc::clone(mock) as Arc<dyn Connector>,
        workload,
        progress: Arc::new(NullProgress),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Runtime build failed: {}", err))
}

#[test]
fn every_request_yields_exactly_one_outcome() -> Result<(), String> {
    runtime()?.block_on(async {
        let mock = Arc::new(MockConnector::failing_first(3));
        let ctx = context(&mock, workload(BenchType::Write, 10));
        let report = run_workload(&ctx)
            .await
            .map_err(|err| format!("Workload failed: {}", err))?;
        if report.total != 10 {
            return Err(format!("Expected 10 outcomes, got {}", report.total));
        }
        if report.errors != 3 {
            return Err(format!("Expected 3 errors, got {}", report.errors));
        }
        if mock.executed.load(Ordering::SeqCst) != 7 {
            return Err("Expected 7 successful executions".to_owned());
        }
        Ok(())
    })
}

#[test]
fn sequential_write_keys_are_zero_padded() -> Result<(), String> {
    runtime()?.block_on(async {
        let mock = Arc::new(MockConnector::new());
        let ctx = context(&mock, workload(BenchType::Write, 3));
        run_workload(&ctx)
            .await
            .map_err(|err| format!("Workload failed: {}", err))?;
        let mut keys = mock.executed_keys().await;
        keys.sort();
        if keys != vec!["00000000", "00000001", "00000002"] {
            return Err(format!("Unexpected keys {:?}", keys));
        }
        Ok(())
    })
}

#[test]
fn same_key_workload_repeats_one_key() -> Result<(), String> {
    runtime()?.block_on(async {
        let mock = Arc::new(MockConnector::new());
        let mut shape = workload(BenchType::Write, 5);
        shape.same_key = true;
        let ctx = context(&mock, shape);
        run_workload(&ctx)
            .await
            .map_err(|err| format!("Workload failed: {}", err))?;
        let keys = mock.executed_keys().await;
        // 5 workload writes plus the priming create.
        if keys.len() != 6 || keys.iter().any(|k| k != "aaaaaaaa") {
            return Err(format!("Unexpected keys {:?}", keys));
        }
        Ok(())
    })
}

#[test]
fn reads_target_a_single_fixed_key() -> Result<(), String> {
    runtime()?.block_on(async {
        let mock = Arc::new(MockConnector::new());
        let ctx = context(&mock, workload(BenchType::Read, 4));
        run_workload(&ctx)
            .await
            .map_err(|err| format!("Workload failed: {}", err))?;
        // The priming write plus every read hit the same fixed key.
        let keys = mock.executed_keys().await;
        if keys.len() != 5 || keys.iter().any(|k| k != "aaaaaaaa") {
            return Err(format!("Expected one fixed key, got {:?}", keys));
        }
        Ok(())
    })
}

#[test]
fn generator_stalls_at_the_queue_capacity() -> Result<(), String> {
    runtime()?.block_on(async {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let mock = Arc::new(MockConnector::gated(Arc::clone(&gate)));
        let mut shape = workload(BenchType::Write, 20);
        shape.clients = 2;
        shape.connections = 2;
        let ctx = context(&mock, shape);
        let run = tokio::spawn(async move { run_workload(&ctx).await });

        // Let the generator run ahead as far as the queue allows.
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
        // 2 buffered in the queue, 2 held by blocked workers, 1 stuck in
        // the send.
        let built = mock.ops_built.load(Ordering::SeqCst);
        if built > 5 {
            return Err(format!("Generator ran ahead of the queue: built {}", built));
        }

        gate.add_permits(20);
        let report = run
            .await
            .map_err(|err| format!("Join failed: {}", err))?
            .map_err(|err| format!("Workload failed: {}", err))?;
        if report.total != 20 || report.errors != 0 {
            return Err(format!(
                "Expected 20 clean outcomes, got total={} errors={}",
                report.total, report.errors
            ));
        }
        Ok(())
    })
}

#[test]
fn compaction_fires_every_cycle() -> Result<(), String> {
    runtime()?.block_on(async {
        let mock = Arc::new(MockConnector::new().with_compaction());
        let mut shape = workload(BenchType::Write, 10);
        shape.etcdv3_compaction_cycle = 2;
        let ctx = context(&mock, shape);
        run_workload(&ctx)
            .await
            .map_err(|err| format!("Workload failed: {}", err))?;
        if mock.compactions.load(Ordering::SeqCst) != 5 {
            return Err(format!(
                "Expected 5 compactions, got {}",
                mock.compactions.load(Ordering::SeqCst)
            ));
        }
        Ok(())
    })
}

#[test]
fn priming_recovers_within_the_attempt_budget() -> Result<(), String> {
    runtime()?.block_on(async {
        let mock = Arc::new(MockConnector::failing_first((PRIME_ATTEMPTS - 1) as u64));
        let ctx = context(&mock, workload(BenchType::Read, 4));
        let report = run_workload(&ctx)
            .await
            .map_err(|err| format!("Workload failed: {}", err))?;
        if report.total != 4 || report.errors != 0 {
            return Err(format!(
                "Expected 4 clean reads, got total={} errors={}",
                report.total, report.errors
            ));
        }
        Ok(())
    })
}

#[test]
fn priming_exhaustion_aborts_the_run() -> Result<(), String> {
    runtime()?.block_on(async {
        let mock = Arc::new(MockConnector::failing_first(PRIME_ATTEMPTS as u64));
        let ctx = context(&mock, workload(BenchType::Read, 4));
        match run_workload(&ctx).await {
            Err(AppError::Control(ControlError::PrimingExhausted { attempts, .. }))
                if attempts == PRIME_ATTEMPTS =>
            {
                Ok(())
            }
            Ok(_) => Err("Expected priming exhaustion".to_owned()),
            Err(other) => Err(format!("Unexpected error {}", other)),
        }
    })
}
