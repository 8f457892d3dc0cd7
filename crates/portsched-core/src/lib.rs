//! Cycle-stepped issue model for out-of-order pipelines.
//!
//! Given a functional-unit pool built from a frozen
//! [`portsched_config::FuPoolConfig`], the [`IssueScheduler`] decides each
//! cycle which queued micro-ops begin execution, on which unit, and when
//! their results become available.
//!
//! - **Units:** [`FunctionalUnit`] holds one capability table and per-replica busy state
//! - **Table:** [`OpClassTable`] maps each class to candidate units in declaration order
//! - **Pool:** [`FunctionalUnitPool`] grants the first free candidate
//! - **Scheduler:** [`IssueScheduler`] drives grants, stalls, completions, and squashes
//!
//! # Example
//!
//! ```rust
//! use portsched_config::{presets, OpClass};
//! use portsched_core::{IssueEvent, IssueScheduler};
//!
//! let mut sched = IssueScheduler::from_config(&presets::xeon_o3()).unwrap();
//! let load = sched.submit(OpClass::MemRead, 0).unwrap().unwrap();
//!
//! let report = sched.tick(0).unwrap();
//! assert!(matches!(
//!     report.events[0],
//!     IssueEvent::Granted { id, unit: 2, completes_at: 1, .. } if id == load
//! ));
//! ```

pub mod error;
pub mod pool;
pub mod scheduler;
pub mod stats;
pub mod table;
pub mod unit;

/// A simulated clock cycle.
pub type Cycle = u64;

pub use error::{ErrorKind, Result, SchedError};
pub use pool::FunctionalUnitPool;
pub use scheduler::{CycleReport, IssueEvent, IssueRequest, IssueScheduler, RequestId, StallReason};
pub use stats::{ClassStats, IssueStats};
pub use table::OpClassTable;
pub use unit::{Booking, FunctionalUnit, OpTiming};
