//! Pool descriptors.
//!
//! Plain, serializable data describing a functional-unit pool. Nothing
//! here carries runtime state; the scheduler core builds its units from
//! a frozen `FuPoolConfig` once and never re-reads it.

use serde::{Deserialize, Serialize};

use crate::op_class::OpClass;

fn default_latency() -> u32 {
    1
}

fn default_pipelined() -> bool {
    true
}

/// One `(operation class, latency, pipelined)` capability entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpDesc {
    /// The class this entry executes.
    pub op_class: OpClass,
    /// Cycles from issue until the result is available.
    #[serde(default = "default_latency")]
    pub latency: u32,
    /// Whether the unit accepts a new operation the following cycle.
    #[serde(default = "default_pipelined")]
    pub pipelined: bool,
}

impl OpDesc {
    /// A pipelined, single-cycle entry.
    pub fn new(op_class: OpClass) -> Self {
        Self {
            op_class,
            latency: default_latency(),
            pipelined: default_pipelined(),
        }
    }

    /// Set the latency.
    pub fn latency(mut self, latency: u32) -> Self {
        self.latency = latency;
        self
    }

    /// Mark the entry non-pipelined: the unit stays busy for the full latency.
    pub fn unpipelined(mut self) -> Self {
        self.pipelined = false;
        self
    }
}

/// A declared unit kind with `count` identical replicas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FuDesc {
    /// Unit name (e.g., "IntALU", "port0").
    pub name: String,
    /// Number of replicas sharing this capability list.
    pub count: u32,
    /// Capability entries in declaration order.
    pub op_list: Vec<OpDesc>,
}

impl FuDesc {
    /// An empty unit description.
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            op_list: Vec::new(),
        }
    }

    /// Append a capability entry.
    pub fn op(mut self, op: OpDesc) -> Self {
        self.op_list.push(op);
        self
    }

    /// Find the entry for a class.
    pub fn find_op(&self, op_class: OpClass) -> Option<&OpDesc> {
        self.op_list.iter().find(|o| o.op_class == op_class)
    }

    pub(crate) fn find_op_mut(&mut self, op_class: OpClass) -> Option<&mut OpDesc> {
        self.op_list.iter_mut().find(|o| o.op_class == op_class)
    }
}

/// A complete functional-unit pool: an ordered unit list.
///
/// Unit order is significant. It is the tie-break order the scheduler
/// uses when several units can execute the same class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FuPoolConfig {
    /// Pool name (e.g., "DefaultX86FUPool").
    pub name: String,
    /// Units in declaration order.
    pub units: Vec<FuDesc>,
}

impl FuPoolConfig {
    /// Total replicas across all units.
    pub fn total_replicas(&self) -> u64 {
        self.units.iter().map(|u| u64::from(u.count)).sum()
    }
}

/// Issue-stage parameters that sit beside the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchedulerParams {
    /// Maximum grants per cycle.
    #[serde(default = "default_issue_width")]
    pub issue_width: u32,
    /// Issue-queue capacity. A request occupies an entry from submission
    /// until it is granted or squashed.
    #[serde(default = "default_iq_entries")]
    pub iq_entries: u32,
}

fn default_issue_width() -> u32 {
    8
}

fn default_iq_entries() -> u32 {
    64
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            issue_width: default_issue_width(),
            iq_entries: default_iq_entries(),
        }
    }
}

/// Everything the issue model needs, composed from independent parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CoreConfig {
    /// Model name (e.g., "X86O3CPU").
    pub name: String,
    /// Issue-stage parameters.
    #[serde(default)]
    pub scheduler: SchedulerParams,
    /// Functional-unit pool.
    pub fu_pool: FuPoolConfig,
}
