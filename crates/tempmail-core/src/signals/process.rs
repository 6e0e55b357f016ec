//! `sysinfo`-backed process statistics.

use parking_lot::Mutex;
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use super::{StatsError, SystemSnapshot, SystemStatsSource};

/// Reads memory, thread and CPU figures for the current process.
///
/// CPU usage needs two samples, so the first snapshot reports `None` for it.
/// Rust has no garbage collector; `gc_pause_total` is always zero here and only
/// becomes meaningful with a custom [`SystemStatsSource`].
pub struct ProcessStatsReader {
    pid: Pid,
    state: Mutex<ReaderState>,
}

struct ReaderState {
    system: System,
    primed: bool,
}

impl ProcessStatsReader {
    /// Creates a reader bound to the current process.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Unavailable`] if the platform cannot report the
    /// current PID.
    pub fn new() -> Result<Self, StatsError> {
        let pid = sysinfo::get_current_pid().map_err(|e| StatsError::Unavailable(e.to_string()))?;
        Ok(Self { pid, state: Mutex::new(ReaderState { system: System::new(), primed: false }) })
    }
}

impl SystemStatsSource for ProcessStatsReader {
    fn snapshot(&self) -> Result<SystemSnapshot, StatsError> {
        let mut state = self.state.lock();
        state.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu().with_tasks(),
        );

        let primed = state.primed;
        state.primed = true;

        let process = state
            .system
            .process(self.pid)
            .ok_or_else(|| StatsError::Unavailable(format!("process {} not found", self.pid)))?;

        Ok(SystemSnapshot {
            memory_bytes: process.memory(),
            thread_count: process.tasks().map_or(1, |tasks| tasks.len().max(1)),
            gc_pause_total: Duration::ZERO,
            cpu_usage_percent: primed.then(|| f64::from(process.cpu_usage())),
        })
    }
}
