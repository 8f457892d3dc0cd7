//! Scheduler errors.
//!
//! Structural stalls are not errors; they surface as
//! [`IssueEvent::Stalled`](crate::IssueEvent::Stalled) and in the stats.
//! Everything here aborts the simulation.

use portsched_config::{ConfigError, OpClass};
use thiserror::Error;

use crate::scheduler::RequestId;
use crate::Cycle;

/// Errors raised by the pool and scheduler.
#[derive(Debug, Error)]
pub enum SchedError {
    /// No unit in the pool executes the requested class.
    #[error("no unit can execute {op_class} (cycle {cycle})")]
    UndeclaredOpClass {
        /// The undeclared class.
        op_class: OpClass,
        /// Cycle of the request.
        cycle: Cycle,
    },

    /// The pool has no units, or no replicas at all.
    #[error("functional-unit pool '{pool}' has no units")]
    EmptyPool {
        /// Pool name.
        pool: String,
    },

    /// A capability entry with zero latency.
    #[error("unit {unit} ('{name}') declares zero latency for {op_class}")]
    ZeroLatency {
        /// Unit index.
        unit: usize,
        /// Unit name.
        name: String,
        /// The offending class.
        op_class: OpClass,
    },

    /// Invalid pool or scheduler parameters.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A booking was released that its unit does not track.
    #[error(
        "release of unreserved booking on unit {unit} replica {replica} \
         (completion {completion}, cycle {cycle})"
    )]
    ReleaseUnreserved {
        /// Unit index.
        unit: usize,
        /// Replica index.
        replica: usize,
        /// Completion cycle recorded in the booking.
        completion: Cycle,
        /// Cycle of the release.
        cycle: Cycle,
    },

    /// A squash named a request that is neither queued nor in flight.
    #[error("request {id} is neither queued nor in flight (cycle {cycle})")]
    UnknownRequest {
        /// The unknown id.
        id: RequestId,
        /// Cycle of the squash.
        cycle: Cycle,
    },

    /// A tick or squash went backwards in time.
    #[error("cycle {now} is not after cycle {last}")]
    CycleRegression {
        /// Requested cycle.
        now: Cycle,
        /// Latest cycle already seen.
        last: Cycle,
    },
}

/// Broad category of a [`SchedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad pool or request data; detected at startup or on submission.
    Configuration,
    /// Integration bug in the host simulator.
    InvariantViolation,
}

impl SchedError {
    /// Categorize this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedError::UndeclaredOpClass { .. }
            | SchedError::EmptyPool { .. }
            | SchedError::ZeroLatency { .. }
            | SchedError::Config(_) => ErrorKind::Configuration,
            SchedError::ReleaseUnreserved { .. }
            | SchedError::UnknownRequest { .. }
            | SchedError::CycleRegression { .. } => ErrorKind::InvariantViolation,
        }
    }
}

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedError>;
