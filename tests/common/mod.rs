#![allow(dead_code)]

use fairsim::SchedEvent;

/// Initialize tracing from `RUST_LOG` so failing tests can be re-run
/// with scheduler internals visible. `try_init()` is idempotent: the
/// first call in the process succeeds, later calls are ignored.
pub fn setup_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// TASK_CREATE with default nice in the root cgroup.
pub fn create(id: &str) -> SchedEvent {
    SchedEvent::TaskCreate {
        task_id: id.to_string(),
        nice: None,
        cgroup_id: None,
    }
}

/// TASK_CREATE with an explicit niceness.
pub fn create_nice(id: &str, nice: i64) -> SchedEvent {
    SchedEvent::TaskCreate {
        task_id: id.to_string(),
        nice: Some(nice),
        cgroup_id: None,
    }
}

/// TASK_CREATE into a specific cgroup.
pub fn create_in(id: &str, cgroup: &str) -> SchedEvent {
    SchedEvent::TaskCreate {
        task_id: id.to_string(),
        nice: None,
        cgroup_id: Some(cgroup.to_string()),
    }
}

/// TASK_SET_AFFINITY to the given CPU indices.
pub fn set_affinity(id: &str, cpus: &[i64]) -> SchedEvent {
    SchedEvent::TaskSetAffinity {
        task_id: id.to_string(),
        cpus: cpus.to_vec(),
    }
}
