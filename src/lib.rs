//! fairsim - Tick-driven, CFS-inspired scheduling simulator.
//!
//! The core is a pure function of (prior state, event batch) producing
//! (next state, result record): each tick applies a batch of lifecycle,
//! priority, affinity, and control-group events, then assigns at most
//! one runnable task to each simulated CPU from a single
//! vruntime-ordered runqueue, reporting preemption and migration
//! counts.
//!
//! # Architecture
//!
//! - **Engine**: event application plus the per-tick dispatch procedure
//! - **Runqueue**: ordered view over runnable tasks, keyed `(vruntime, id)`
//! - **Tasks / Cgroups**: authoritative records the queue refers into
//! - **Weight**: the 40-entry nice table and share-scaled vruntime math
//! - **Frame / Transport**: self-delimited JSON record framing over a
//!   Unix stream socket, results as JSON lines on stdout
//!
//! # Usage
//!
//! ```rust
//! use fairsim::{SchedEvent, Scheduler};
//!
//! let mut sched = Scheduler::new(2, 1);
//! let result = sched.tick(
//!     0,
//!     &[SchedEvent::TaskCreate {
//!         task_id: "worker".into(),
//!         nice: None,
//!         cgroup_id: None,
//!     }],
//! );
//! assert_eq!(result.schedule, vec!["worker".to_string(), "idle".to_string()]);
//! ```

pub mod cgroup;
pub mod cpumask;
pub mod engine;
pub mod event;
pub mod frame;
pub mod runqueue;
pub mod task;
pub mod transport;
pub mod types;
pub mod weight;

// Re-export the main public types for convenience.
pub use cgroup::{Cgroup, CgroupSet, ROOT_CGROUP_ID};
pub use cpumask::CpuMask;
pub use engine::{Scheduler, TickMeta, TickResult, IDLE};
pub use event::{EventBatch, SchedEvent};
pub use frame::FrameExtractor;
pub use runqueue::RunQueue;
pub use task::{Task, TaskState};
pub use types::{CpuId, Nice, Vtime, Weight};
