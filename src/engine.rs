//! The scheduler core: event application and the per-tick dispatch.
//!
//! The core is a pure function of (prior state, event batch) producing
//! (next state, result record). Each tick applies its events in batch
//! order, then fills CPUs one at a time from a single vruntime-ordered
//! runqueue, honoring per-task affinity and per-cgroup CPU masks, and
//! finally accounts vruntime, preemptions, and migrations.
//!
//! Nothing in here suspends or blocks; callers invoke [`Scheduler::tick`]
//! serially.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use crate::cgroup::{Cgroup, CgroupSet, ROOT_CGROUP_ID};
use crate::cpumask::CpuMask;
use crate::event::SchedEvent;
use crate::runqueue::RunQueue;
use crate::task::{Task, TaskState};
use crate::types::{CpuId, Vtime};
use crate::weight::{effective_weight, vruntime_delta};

/// Name a CPU slot carries in the emitted schedule when nothing is
/// assigned.
pub const IDLE: &str = "idle";

/// Per-tick counters surfaced in the result record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickMeta {
    /// CPU slots whose non-idle occupant changed since the prior tick.
    pub preemptions: u64,
    /// Tasks assigned to a different CPU than they last ran on.
    pub migrations: u64,
}

/// The emitted result for one tick. Field order matches the wire
/// format: `vtime`, `schedule`, `meta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickResult {
    /// The batch label, echoed back untouched.
    pub vtime: i64,
    /// One entry per CPU: a task id or [`IDLE`].
    pub schedule: Vec<String>,
    pub meta: TickMeta,
}

/// The process-wide scheduler state.
pub struct Scheduler {
    cpu_count: usize,
    quanta: i64,
    tasks: HashMap<String, Task>,
    cgroups: CgroupSet,
    rq: RunQueue,
    /// The highest vruntime ever observed among scheduled tasks; only
    /// non-decreasing. New and waking tasks enter at this ceiling.
    max_vruntime: Vtime,
    last_schedule: Vec<Option<String>>,
}

impl Scheduler {
    /// Build an empty scheduler. `cpu_count` and `quanta` are floored
    /// at 1; both are fixed for the scheduler's lifetime.
    pub fn new(cpu_count: usize, quanta: i64) -> Self {
        let cpu_count = cpu_count.max(1);
        Scheduler {
            cpu_count,
            quanta: quanta.max(1),
            tasks: HashMap::new(),
            cgroups: CgroupSet::new(cpu_count),
            rq: RunQueue::new(),
            max_vruntime: 0,
            last_schedule: vec![None; cpu_count],
        }
    }

    pub fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn cgroups(&self) -> &CgroupSet {
        &self.cgroups
    }

    /// Whether a task is currently queued.
    pub fn queued(&self, id: &str) -> bool {
        self.rq.contains(id)
    }

    pub fn max_vruntime(&self) -> Vtime {
        self.max_vruntime
    }

    /// Run one tick: apply `events` in order, then dispatch.
    pub fn tick(&mut self, vtime: i64, events: &[SchedEvent]) -> TickResult {
        for ev in events {
            self.apply_event(ev);
        }

        let schedule = self.select_all();
        let meta = self.account(&schedule);
        self.last_schedule.clone_from(&schedule);

        TickResult {
            vtime,
            schedule: schedule
                .into_iter()
                .map(|slot| slot.unwrap_or_else(|| IDLE.to_string()))
                .collect(),
            meta,
        }
    }

    /// Fill each CPU in ascending index order from the runqueue.
    ///
    /// Candidates popped for one CPU but only runnable elsewhere are
    /// stashed and re-inserted before the next CPU's pass, so a task
    /// pinned to a later CPU is never lost to an earlier one.
    fn select_all(&mut self) -> Vec<Option<String>> {
        let mut schedule: Vec<Option<String>> = vec![None; self.cpu_count];
        let mut stash: Vec<String> = Vec::new();

        for cpu in 0..self.cpu_count {
            let mut pick: Option<String> = None;

            while let Some(cand) = self.rq.pop_min() {
                // Stale queue entries (exited or blocked since last
                // push) are dropped, not stashed.
                let Some(task) = self.tasks.get(&cand) else {
                    continue;
                };
                if task.state != TaskState::Runnable {
                    continue;
                }
                if !task.affinity.any_allowed() {
                    stash.push(cand);
                    continue;
                }
                if !self.cgroups.get_or_root(&task.cgroup_id).cpu_mask.any_allowed() {
                    stash.push(cand);
                    continue;
                }
                if self.can_run_on(task, CpuId(cpu)) {
                    pick = Some(cand);
                    break;
                }
                stash.push(cand);
            }

            trace!(cpu, pick = pick.as_deref().unwrap_or(IDLE), "selected");
            schedule[cpu] = pick;

            for id in stash.drain(..) {
                if let Some(task) = self.tasks.get(&id) {
                    self.rq.push(&id, task.vruntime);
                }
            }
        }

        schedule
    }

    /// The accounting pass: count preemptions and migrations, advance
    /// vruntime for every scheduled task, and rotate it back into the
    /// runqueue under its new key.
    fn account(&mut self, schedule: &[Option<String>]) -> TickMeta {
        let mut meta = TickMeta::default();

        for (cpu, slot) in schedule.iter().enumerate() {
            if *slot != self.last_schedule[cpu] && self.last_schedule[cpu].is_some() {
                meta.preemptions += 1;
            }

            let Some(id) = slot else {
                continue;
            };
            let Some(task) = self.tasks.get(id) else {
                continue;
            };
            let delta = self.delta_for(task);

            if let Some(task) = self.tasks.get_mut(id) {
                if matches!(task.last_cpu, Some(last) if last != CpuId(cpu)) {
                    meta.migrations += 1;
                }
                task.last_cpu = Some(CpuId(cpu));
                task.vruntime = task.vruntime.saturating_add(delta);
                self.max_vruntime = self.max_vruntime.max(task.vruntime);
                if task.burst_remaining > 0 {
                    task.burst_remaining -= 1;
                }
                // The selected task left the queue during selection;
                // re-enter it with the advanced key so fairness rotates.
                if task.state == TaskState::Runnable {
                    self.rq.push(id, task.vruntime);
                }
            }
        }

        meta
    }

    fn can_run_on(&self, task: &Task, cpu: CpuId) -> bool {
        task.state == TaskState::Runnable
            && task.affinity.allows(cpu)
            && self.cgroups.get_or_root(&task.cgroup_id).cpu_mask.allows(cpu)
    }

    /// Per-tick vruntime advance for this task under its cgroup's
    /// share weighting.
    fn delta_for(&self, task: &Task) -> Vtime {
        let shares = self.cgroups.get_or_root(&task.cgroup_id).cpu_shares;
        vruntime_delta(self.quanta, effective_weight(task.weight, shares))
    }

    /// Apply one event. Every lookup tolerates missing referents, and
    /// events targeting exited tasks are no-ops.
    pub fn apply_event(&mut self, ev: &SchedEvent) {
        match ev {
            SchedEvent::TaskCreate {
                task_id,
                nice,
                cgroup_id,
            } => self.task_create(task_id, *nice, cgroup_id.as_deref()),
            SchedEvent::TaskExit { task_id } => self.task_exit(task_id),
            SchedEvent::TaskBlock { task_id } => self.task_block(task_id),
            SchedEvent::TaskUnblock { task_id } => self.task_unblock(task_id),
            SchedEvent::TaskYield { task_id } => self.task_yield(task_id),
            SchedEvent::TaskSetNice { task_id, new_nice } => {
                self.task_set_nice(task_id, *new_nice)
            }
            SchedEvent::TaskSetAffinity { task_id, cpus } => {
                self.task_set_affinity(task_id, cpus)
            }
            SchedEvent::CgroupCreate {
                cgroup_id,
                cpu_shares,
                cpu_quota_us,
                cpu_period_us,
                cpu_mask,
            } => self.cgroup_create(
                cgroup_id,
                *cpu_shares,
                *cpu_quota_us,
                *cpu_period_us,
                cpu_mask.as_deref(),
            ),
            SchedEvent::CgroupModify {
                cgroup_id,
                cpu_shares,
                cpu_quota_us,
                cpu_period_us,
                cpu_mask,
            } => self.cgroup_modify(
                cgroup_id,
                *cpu_shares,
                *cpu_quota_us,
                *cpu_period_us,
                cpu_mask.as_deref(),
            ),
            SchedEvent::CgroupDelete { cgroup_id } => self.cgroup_delete(cgroup_id),
            SchedEvent::TaskMoveCgroup {
                task_id,
                new_cgroup_id,
            } => self.task_move_cgroup(task_id, new_cgroup_id),
            SchedEvent::CpuBurst { task_id, duration } => self.cpu_burst(task_id, *duration),
        }
    }

    fn task_create(&mut self, id: &str, nice: Option<i64>, cgroup_id: Option<&str>) {
        // A second create for a live id must not reset its state.
        if self.tasks.contains_key(id) {
            return;
        }

        let cgroup_id = match cgroup_id {
            Some(cg) if self.cgroups.contains(cg) => cg.to_string(),
            _ => ROOT_CGROUP_ID.to_string(),
        };

        let task = Task::new(
            nice.unwrap_or(0),
            cgroup_id,
            self.max_vruntime,
            self.cpu_count,
        );
        self.rq.push(id, task.vruntime);
        self.tasks.insert(id.to_string(), task);
    }

    fn task_exit(&mut self, id: &str) {
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        self.rq.remove(id);
        task.state = TaskState::Exited;
    }

    fn task_block(&mut self, id: &str) {
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        if task.state == TaskState::Exited {
            return;
        }
        // An active burst shields the task from blocking.
        if task.burst_remaining > 0 {
            return;
        }
        self.rq.remove(id);
        task.state = TaskState::Blocked;
    }

    fn task_unblock(&mut self, id: &str) {
        let max_vruntime = self.max_vruntime;
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        if task.state == TaskState::Exited {
            return;
        }
        // Waking tasks enter at the ceiling so incumbents are never
        // starved by a burst of arrivals.
        task.vruntime = max_vruntime;
        task.state = TaskState::Runnable;
        task.ensure_mask_len(self.cpu_count);
        self.rq.push(id, task.vruntime);
    }

    fn task_yield(&mut self, id: &str) {
        let max_vruntime = self.max_vruntime;
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        if task.state != TaskState::Runnable {
            return;
        }
        task.vruntime = max_vruntime;
        self.rq.fix_key(id, task.vruntime);
    }

    fn task_set_nice(&mut self, id: &str, new_nice: i64) {
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        if task.state == TaskState::Exited {
            return;
        }
        task.set_nice(new_nice);
        // Weight does not enter the ordering key, but a stale key from
        // an earlier in-queue wake gets refreshed here.
        self.rq.fix_key(id, task.vruntime);
    }

    fn task_set_affinity(&mut self, id: &str, cpus: &[i64]) {
        let cpu_count = self.cpu_count;
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        if task.state == TaskState::Exited {
            return;
        }
        // An empty result leaves the task queued; dispatch filters it.
        task.affinity = CpuMask::from_indices(cpu_count, cpus);
    }

    fn cgroup_create(
        &mut self,
        id: &str,
        cpu_shares: Option<i64>,
        cpu_quota_us: Option<i64>,
        cpu_period_us: Option<i64>,
        cpu_mask: Option<&[i64]>,
    ) {
        let mut cg = Cgroup::with_defaults(self.cpu_count);
        if let Some(shares) = cpu_shares {
            cg.cpu_shares = shares.max(1);
        }
        if let Some(quota) = cpu_quota_us {
            cg.cpu_quota_us = quota;
        }
        if let Some(period) = cpu_period_us {
            cg.cpu_period_us = period;
        }
        if let Some(mask) = cpu_mask {
            cg.cpu_mask = CpuMask::from_indices(self.cpu_count, mask);
        }
        self.cgroups.insert(id.to_string(), cg);
    }

    fn cgroup_modify(
        &mut self,
        id: &str,
        cpu_shares: Option<i64>,
        cpu_quota_us: Option<i64>,
        cpu_period_us: Option<i64>,
        cpu_mask: Option<&[i64]>,
    ) {
        let cpu_count = self.cpu_count;
        let cg = self.cgroups.get_or_insert_default(id);
        if let Some(shares) = cpu_shares {
            cg.cpu_shares = shares.max(1);
        }
        if let Some(quota) = cpu_quota_us {
            cg.cpu_quota_us = quota;
        }
        if let Some(period) = cpu_period_us {
            cg.cpu_period_us = period;
        }
        if let Some(mask) = cpu_mask {
            cg.cpu_mask = CpuMask::from_indices(cpu_count, mask);
        }
    }

    fn cgroup_delete(&mut self, id: &str) {
        if !self.cgroups.remove(id) {
            return;
        }
        // Orphaned members fall back to the root; exited records keep
        // their historical membership.
        for task in self.tasks.values_mut() {
            if task.cgroup_id == id && task.state != TaskState::Exited {
                task.cgroup_id = ROOT_CGROUP_ID.to_string();
            }
        }
    }

    fn task_move_cgroup(&mut self, id: &str, new_cgroup_id: &str) {
        let target = if self.cgroups.contains(new_cgroup_id) {
            new_cgroup_id
        } else {
            ROOT_CGROUP_ID
        };
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        if task.state == TaskState::Exited {
            return;
        }
        task.cgroup_id = target.to_string();
    }

    fn cpu_burst(&mut self, id: &str, duration: i64) {
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        if task.state == TaskState::Exited {
            return;
        }
        task.burst_remaining = duration.max(0);
    }
}
