//! Fixed-period control cycle driving the motion orchestrator.
//!
//! ## RT Setup
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)` to lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to pin to an isolated CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)` for RT priority.
//!
//! All RT calls are no-ops without the `rt` feature.
//!
//! ## Cycle Body
//! `update(dt)` on the orchestrator with `dt` equal to the interpolation
//! period, then a status publish every `status_interval_cycles`.
//!
//! ## Termination
//! The loop returns once the active move completes, when the cycle budget
//! runs out, or with [`CycleError::SafetyStop`] if an axis tripped.

use thiserror::Error;
use tracing::{debug, warn};
use xxcnc_common::motion::state::MotionState;

use crate::orchestrator::MotionOrchestrator;
use crate::status::StatusBoard;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    pub cycle_count: u64,
    /// Last cycle body duration [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    pub sum_cycle_ns: i64,
    /// Cycles whose body exceeded the period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns], 0 before the first cycle.
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// Hard deadline missed (RT builds only).
    #[error("cycle overrun: {actual_ns}ns > {budget_ns}ns budget")]
    CycleOverrun { actual_ns: i64, budget_ns: i64 },

    /// An axis tripped a soft limit and motion was stopped.
    #[error("safety stop at cycle {cycle}")]
    SafetyStop { cycle: u64 },
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the loop does not fault pages in.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup sequence. Call once before [`CycleRunner::run`].
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// How a [`CycleRunner::run`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The move finished; all axes at rest.
    Completed { cycles: u64 },
    /// `max_cycles` reached with motion still active.
    BudgetExhausted { cycles: u64 },
}

pub struct CycleRunner {
    pub orchestrator: MotionOrchestrator,
    pub stats: CycleStats,
    board: StatusBoard,
    cycle_time_ns: i64,
    dt: f64,
    status_interval: u64,
}

impl CycleRunner {
    pub fn new(orchestrator: MotionOrchestrator, board: StatusBoard) -> Self {
        let period_ms = orchestrator.interpolation_period();
        let status_interval = u64::from(orchestrator.config().status_interval_cycles.max(1));
        Self {
            orchestrator,
            stats: CycleStats::new(),
            board,
            cycle_time_ns: i64::from(period_ms) * 1_000_000,
            dt: f64::from(period_ms) / 1000.0,
            status_interval,
        }
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    /// Cycle period [s].
    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// One cycle body, without pacing.
    ///
    /// Returns `Ok(true)` while motion is still active.
    pub fn step(&mut self) -> Result<bool, CycleError> {
        self.orchestrator.update(self.dt);
        let cycle = self.stats.cycle_count;

        let faulted = self.orchestrator.state() == MotionState::Error;
        let active = self.orchestrator.is_moving();
        if faulted || !active || cycle % self.status_interval == 0 {
            self.publish(cycle);
        }
        if faulted {
            return Err(CycleError::SafetyStop { cycle });
        }
        Ok(active)
    }

    fn publish(&self, cycle: u64) {
        let mut status = self.orchestrator.status();
        status.cycle = cycle;
        self.board.publish(&status);
    }

    /// Run paced cycles until the move completes or `max_cycles` elapse.
    pub fn run(&mut self, max_cycles: u64) -> Result<RunOutcome, CycleError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop(max_cycles)
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop(max_cycles)
        }
    }

    /// `clock_nanosleep(TIMER_ABSTIME)` pacing on `CLOCK_MONOTONIC`.
    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, max_cycles: u64) -> Result<RunOutcome, CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || {
            clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))
        };
        let mut next_wake = now()?;

        for _ in 0..max_cycles {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = now()?;
            let active = self.step()?;
            let cycle_end = now()?;

            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            self.stats.record(duration_ns, 0);
            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                debug!("cycle overrun: {duration_ns}ns");
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }
            if !active {
                return Ok(RunOutcome::Completed {
                    cycles: self.stats.cycle_count,
                });
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
            let woke = now()?;
            let latency = timespec_diff_ns(&woke, &next_wake).abs();
            self.stats.max_latency_ns = self.stats.max_latency_ns.max(latency);
        }
        warn!("cycle budget of {max_cycles} exhausted with motion active");
        Ok(RunOutcome::BudgetExhausted {
            cycles: self.stats.cycle_count,
        })
    }

    /// `std::thread::sleep` pacing. Overruns are counted, not fatal.
    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, max_cycles: u64) -> Result<RunOutcome, CycleError> {
        use std::time::{Duration, Instant};

        let period = Duration::from_nanos(self.cycle_time_ns as u64);

        for _ in 0..max_cycles {
            let cycle_start = Instant::now();
            let active = self.step()?;
            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;

            self.stats.record(duration_ns, 0);
            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                debug!("cycle overrun: {duration_ns}ns");
            }
            if !active {
                return Ok(RunOutcome::Completed {
                    cycles: self.stats.cycle_count,
                });
            }
            if let Some(remaining) = period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        warn!("cycle budget of {max_cycles} exhausted with motion active");
        Ok(RunOutcome::BudgetExhausted {
            cycles: self.stats.cycle_count,
        })
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
