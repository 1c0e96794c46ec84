//! Task records and lifecycle states.
//!
//! The task map is the authoritative store; the runqueue holds only
//! identifiers referring into it.

use crate::cpumask::CpuMask;
use crate::types::{CpuId, Nice, Vtime, Weight};
use crate::weight::{clamp_nice, nice_to_weight};

/// Lifecycle state of a simulated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Eligible for dispatch; present in the runqueue at tick
    /// boundaries.
    Runnable,
    /// Waiting to be unblocked; absent from the runqueue.
    Blocked,
    /// Finished. Exited records are retained so late events targeting
    /// them degrade to safe no-ops; they never re-enter the runqueue.
    Exited,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub nice: Nice,
    /// Derived purely from `nice` via the weight table.
    pub weight: Weight,
    pub cgroup_id: String,
    pub state: TaskState,
    /// Non-decreasing except the wake/yield jump to the vruntime
    /// ceiling (which only ever moves forward).
    pub vruntime: Vtime,
    pub affinity: CpuMask,
    /// Last CPU this task was assigned to; `None` before the first
    /// dispatch.
    pub last_cpu: Option<CpuId>,
    /// Remaining burst ticks; while positive the task shrugs off
    /// block events.
    pub burst_remaining: i64,
}

impl Task {
    /// A new runnable task entering at the current vruntime ceiling
    /// with full affinity.
    pub fn new(nice: Nice, cgroup_id: String, vruntime: Vtime, cpu_count: usize) -> Self {
        let nice = clamp_nice(nice);
        Task {
            nice,
            weight: nice_to_weight(nice),
            cgroup_id,
            state: TaskState::Runnable,
            vruntime,
            affinity: CpuMask::all(cpu_count),
            last_cpu: None,
            burst_remaining: 0,
        }
    }

    /// Apply a niceness change, re-deriving the weight.
    pub fn set_nice(&mut self, nice: Nice) {
        self.nice = clamp_nice(nice);
        self.weight = nice_to_weight(self.nice);
    }

    /// Masks must always be `cpu_count` long; rebuild to full affinity
    /// if the stored mask does not match.
    pub fn ensure_mask_len(&mut self, cpu_count: usize) {
        if self.affinity.len() != cpu_count {
            self.affinity = CpuMask::all(cpu_count);
        }
    }
}
