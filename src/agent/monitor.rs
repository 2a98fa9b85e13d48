use std::path::PathBuf;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
const CSV_HEADER: &str = "unix_ts,pid,utime_ticks,stime_ticks,num_threads,rss_bytes\n";

/// A running resource monitor for one database process.
pub(crate) struct MonitorHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stops sampling and waits for the final row to be flushed.
    pub(crate) async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

/// Samples `/proc/<pid>/stat` once immediately and then every second,
/// appending one CSV row per sample. Sampling errors are logged and skipped;
/// a vanished process ends the task.
pub(crate) fn spawn_monitor(pid: i32, csv_path: PathBuf) -> MonitorHandle {
    let (stop, mut stopped) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SAMPLE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = stopped.changed() => {
                    debug!(pid, "monitor stopping");
                    break;
                }
                _ = interval.tick() => {
                    match sample(pid) {
                        Ok(Some(row)) => {
                            if let Err(error) = append_row(&csv_path, &row).await {
                                warn!(pid, %error, "monitor write failed");
                            }
                        }
                        Ok(None) => {
                            debug!(pid, "monitored process is gone");
                            break;
                        }
                        Err(error) => warn!(pid, %error, "monitor sample failed"),
                    }
                }
            }
        }
    });
    MonitorHandle { stop, task }
}

/// One sample, or `None` once the process has exited.
fn sample(pid: i32) -> Result<Option<String>, std::io::Error> {
    let stat = match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error),
    };
    // comm may contain spaces; fields are positional after the closing paren.
    let after_comm = match stat.rfind(')') {
        Some(idx) => &stat[idx + 1..],
        None => stat.as_str(),
    };
    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    // Post-paren indices: state=0 ... utime=11, stime=12, num_threads=17, rss=21.
    let utime = fields.get(11).copied().unwrap_or("0");
    let stime = fields.get(12).copied().unwrap_or("0");
    let threads = fields.get(17).copied().unwrap_or("0");
    let rss_pages: u64 = fields
        .get(21)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let rss_bytes = rss_pages.saturating_mul(page_size());
    let unix_ts = chrono::Utc::now().timestamp();
    Ok(Some(format!(
        "{},{},{},{},{},{}\n",
        unix_ts, pid, utime, stime, threads, rss_bytes
    )))
}

fn page_size() -> u64 {
    // SAFETY: sysconf only reads the page size; no pointers involved.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    u64::try_from(page_size).unwrap_or(4096)
}

async fn append_row(csv_path: &std::path::Path, row: &str) -> Result<(), std::io::Error> {
    let write_header = tokio::fs::metadata(csv_path)
        .await
        .map(|meta| meta.len() == 0)
        .unwrap_or(true);
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)
        .await?;
    if write_header {
        file.write_all(CSV_HEADER.as_bytes()).await?;
    }
    file.write_all(row.as_bytes()).await?;
    file.flush().await
}
