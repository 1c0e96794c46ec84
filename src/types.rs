//! Newtype wrappers and type aliases for domain concepts.
//!
//! The CPU identifier gets a newtype to prevent silent index confusion.
//! Quantities (vruntime, weight, niceness) are plain aliases:
//! self-documenting without the boilerplate of implementing arithmetic
//! traits.

/// CPU identifier, an index in `[0, cpu_count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CpuId(pub usize);

/// Virtual runtime for fair scheduling (signed, opaque units; a lower
/// value means the task is "behind" and is preferred).
pub type Vtime = i64;

/// Scheduler weight (higher = more CPU share).
pub type Weight = i64;

/// Niceness, clamped to `[-20, 19]` on every ingress path.
pub type Nice = i64;
