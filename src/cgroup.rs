//! Control-group records and the process-wide registry.
//!
//! A cgroup carries a share multiplier feeding the effective-weight
//! computation and a CPU mask constraining where member tasks may be
//! placed. Quota and period are accepted and stored but not enforced.
//!
//! The registry always contains the root cgroup `"0"`; lookups of
//! unknown ids resolve to the root, and the root cannot be deleted.

use std::collections::HashMap;

use crate::cpumask::CpuMask;

/// The reserved root cgroup id.
pub const ROOT_CGROUP_ID: &str = "0";

/// Default `cpu_shares` for new cgroups and the root.
pub const DEFAULT_SHARES: i64 = 1024;

/// Default `cpu_quota_us` (-1 = unlimited).
pub const DEFAULT_QUOTA_US: i64 = -1;

/// Default `cpu_period_us`.
pub const DEFAULT_PERIOD_US: i64 = 100_000;

#[derive(Debug, Clone)]
pub struct Cgroup {
    /// Share multiplier, floored at 1. 1024 means "no scaling".
    pub cpu_shares: i64,
    /// Stored but not enforced; quota accounting is out of scope.
    pub cpu_quota_us: i64,
    /// Stored but not enforced.
    pub cpu_period_us: i64,
    /// CPUs member tasks may be placed on.
    pub cpu_mask: CpuMask,
}

impl Cgroup {
    /// A cgroup with default shares, quota, period, and an all-ones mask.
    pub fn with_defaults(cpu_count: usize) -> Self {
        Cgroup {
            cpu_shares: DEFAULT_SHARES,
            cpu_quota_us: DEFAULT_QUOTA_US,
            cpu_period_us: DEFAULT_PERIOD_US,
            cpu_mask: CpuMask::all(cpu_count),
        }
    }
}

/// Registry of cgroups. The root (`"0"`) exists from construction on.
#[derive(Debug)]
pub struct CgroupSet {
    groups: HashMap<String, Cgroup>,
    cpu_count: usize,
}

impl CgroupSet {
    pub fn new(cpu_count: usize) -> Self {
        let mut groups = HashMap::new();
        groups.insert(
            ROOT_CGROUP_ID.to_string(),
            Cgroup::with_defaults(cpu_count),
        );
        CgroupSet { groups, cpu_count }
    }

    pub fn get(&self, id: &str) -> Option<&Cgroup> {
        self.groups.get(id)
    }

    /// Resolve an id, falling back to the root when absent.
    pub fn get_or_root(&self, id: &str) -> &Cgroup {
        self.groups.get(id).unwrap_or(&self.groups[ROOT_CGROUP_ID])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.groups.contains_key(id)
    }

    /// Insert or overwrite a cgroup.
    pub fn insert(&mut self, id: String, cgroup: Cgroup) {
        self.groups.insert(id, cgroup);
    }

    /// Fetch an existing cgroup, inserting one with defaults if absent.
    pub fn get_or_insert_default(&mut self, id: &str) -> &mut Cgroup {
        let cpu_count = self.cpu_count;
        self.groups
            .entry(id.to_string())
            .or_insert_with(|| Cgroup::with_defaults(cpu_count))
    }

    /// Remove a cgroup. The root is protected; returns whether a
    /// cgroup was actually removed.
    pub fn remove(&mut self, id: &str) -> bool {
        if id == ROOT_CGROUP_ID {
            return false;
        }
        self.groups.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
