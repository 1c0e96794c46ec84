//! Inbound event decoding.
//!
//! Events arrive as loosely-typed JSON objects tagged with an `action`
//! discriminator. Decoding is total: an unknown action, a missing
//! required field, or a mistyped field decodes to `None` and the event
//! is skipped, never surfaced as an error. Optional fields that are
//! absent or JSON `null` are treated as unset. Additional fields are
//! ignored.

use serde_json::{Map, Value};
use tracing::debug;

/// A decoded scheduler event.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedEvent {
    TaskCreate {
        task_id: String,
        nice: Option<i64>,
        cgroup_id: Option<String>,
    },
    TaskExit {
        task_id: String,
    },
    TaskBlock {
        task_id: String,
    },
    TaskUnblock {
        task_id: String,
    },
    TaskYield {
        task_id: String,
    },
    TaskSetNice {
        task_id: String,
        new_nice: i64,
    },
    TaskSetAffinity {
        task_id: String,
        cpus: Vec<i64>,
    },
    CgroupCreate {
        cgroup_id: String,
        cpu_shares: Option<i64>,
        cpu_quota_us: Option<i64>,
        cpu_period_us: Option<i64>,
        cpu_mask: Option<Vec<i64>>,
    },
    CgroupModify {
        cgroup_id: String,
        cpu_shares: Option<i64>,
        cpu_quota_us: Option<i64>,
        cpu_period_us: Option<i64>,
        cpu_mask: Option<Vec<i64>>,
    },
    CgroupDelete {
        cgroup_id: String,
    },
    TaskMoveCgroup {
        task_id: String,
        new_cgroup_id: String,
    },
    CpuBurst {
        task_id: String,
        duration: i64,
    },
}

impl SchedEvent {
    /// Decode one event object. `None` means "skip this event".
    pub fn decode(value: &Value) -> Option<SchedEvent> {
        let obj = value.as_object()?;
        let action = str_field(obj, "action")?;

        match action {
            "TASK_CREATE" => Some(SchedEvent::TaskCreate {
                task_id: str_field(obj, "taskId")?.to_string(),
                nice: opt_int_field(obj, "nice")?,
                cgroup_id: opt_str_field(obj, "cgroupId")?.map(str::to_string),
            }),
            "TASK_EXIT" => Some(SchedEvent::TaskExit {
                task_id: str_field(obj, "taskId")?.to_string(),
            }),
            "TASK_BLOCK" => Some(SchedEvent::TaskBlock {
                task_id: str_field(obj, "taskId")?.to_string(),
            }),
            "TASK_UNBLOCK" => Some(SchedEvent::TaskUnblock {
                task_id: str_field(obj, "taskId")?.to_string(),
            }),
            "TASK_YIELD" => Some(SchedEvent::TaskYield {
                task_id: str_field(obj, "taskId")?.to_string(),
            }),
            "TASK_SETNICE" => Some(SchedEvent::TaskSetNice {
                task_id: str_field(obj, "taskId")?.to_string(),
                new_nice: int_field(obj, "newNice")?,
            }),
            "TASK_SET_AFFINITY" => Some(SchedEvent::TaskSetAffinity {
                task_id: str_field(obj, "taskId")?.to_string(),
                cpus: int_list_field(obj, "cpuMask")?,
            }),
            "CGROUP_CREATE" => Some(SchedEvent::CgroupCreate {
                cgroup_id: str_field(obj, "cgroupId")?.to_string(),
                cpu_shares: opt_int_field(obj, "cpuShares")?,
                cpu_quota_us: opt_int_field(obj, "cpuQuotaUs")?,
                cpu_period_us: opt_int_field(obj, "cpuPeriodUs")?,
                cpu_mask: opt_int_list_field(obj, "cpuMask")?,
            }),
            "CGROUP_MODIFY" => Some(SchedEvent::CgroupModify {
                cgroup_id: str_field(obj, "cgroupId")?.to_string(),
                cpu_shares: opt_int_field(obj, "cpuShares")?,
                cpu_quota_us: opt_int_field(obj, "cpuQuotaUs")?,
                cpu_period_us: opt_int_field(obj, "cpuPeriodUs")?,
                cpu_mask: opt_int_list_field(obj, "cpuMask")?,
            }),
            "CGROUP_DELETE" => Some(SchedEvent::CgroupDelete {
                cgroup_id: str_field(obj, "cgroupId")?.to_string(),
            }),
            "TASK_MOVE_CGROUP" => Some(SchedEvent::TaskMoveCgroup {
                task_id: str_field(obj, "taskId")?.to_string(),
                new_cgroup_id: str_field(obj, "newCgroupId")?.to_string(),
            }),
            "CPU_BURST" => Some(SchedEvent::CpuBurst {
                task_id: str_field(obj, "taskId")?.to_string(),
                duration: int_field(obj, "duration")?,
            }),
            _ => None,
        }
    }
}

/// One inbound record: a batch label and its events in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBatch {
    pub vtime: i64,
    pub events: Vec<SchedEvent>,
}

impl EventBatch {
    /// Decode a framed record. `None` when the record is not an object,
    /// lacks an integer `vtime`, or lacks an array `events`. Individual
    /// events that fail to decode are dropped; the rest of the batch
    /// survives.
    pub fn decode(value: &Value) -> Option<EventBatch> {
        let obj = value.as_object()?;
        let vtime = int_field(obj, "vtime")?;
        let raw_events = obj.get("events")?.as_array()?;

        let mut events = Vec::with_capacity(raw_events.len());
        for raw in raw_events {
            match SchedEvent::decode(raw) {
                Some(ev) => events.push(ev),
                None => debug!(vtime, "skipping undecodable event"),
            }
        }

        Some(EventBatch { vtime, events })
    }
}

/// A required string field; `None` if absent or not a string.
fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)?.as_str()
}

/// A required integer field; `None` if absent or not an integer.
fn int_field(obj: &Map<String, Value>, key: &str) -> Option<i64> {
    obj.get(key)?.as_i64()
}

/// A required array-of-integers field; `None` if absent, not an array,
/// or containing a non-integer element.
fn int_list_field(obj: &Map<String, Value>, key: &str) -> Option<Vec<i64>> {
    obj.get(key)?
        .as_array()?
        .iter()
        .map(Value::as_i64)
        .collect()
}

/// An optional integer field. Absent and `null` both mean unset; a
/// present non-integer is a schema mismatch failing the whole event.
fn opt_int_field(obj: &Map<String, Value>, key: &str) -> Option<Option<i64>> {
    match obj.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(v) => v.as_i64().map(Some),
    }
}

/// An optional string field, with the same unset/mismatch rules.
fn opt_str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<Option<&'a str>> {
    match obj.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(v) => v.as_str().map(Some),
    }
}

/// An optional array-of-integers field, with the same rules.
fn opt_int_list_field(obj: &Map<String, Value>, key: &str) -> Option<Option<Vec<i64>>> {
    match obj.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(v) => v
            .as_array()?
            .iter()
            .map(Value::as_i64)
            .collect::<Option<Vec<i64>>>()
            .map(Some),
    }
}
