//! Functional-unit pool descriptions for the portsched issue model.
//!
//! A pool description is plain data: an ordered list of units, each with a
//! replica count and a list of `(operation class, latency, pipelined)`
//! entries. This crate provides:
//! - **Operation classes:** the closed set of micro-op categories
//! - **Descriptors:** `OpDesc`, `FuDesc`, `FuPoolConfig`, `CoreConfig`
//! - **Builder:** override latencies and counts, then freeze
//! - **Presets:** the stock x86 pools and the Xeon port layout
//! - **TOML:** load, validate, and serialize pool files
//! - **Fingerprint:** content hash of a frozen configuration

pub mod builder;
pub mod desc;
pub mod error;
pub mod hash;
pub mod op_class;
pub mod parse;
pub mod presets;

pub use builder::FuPoolBuilder;
pub use desc::{CoreConfig, FuDesc, FuPoolConfig, OpDesc, SchedulerParams};
pub use error::{ConfigError, Result};
pub use hash::{fingerprint, hash_hex, ContentHash};
pub use op_class::OpClass;
pub use parse::{
    core_to_toml, load_core_toml, load_pool_toml, parse_core_toml, parse_pool_toml,
    pool_to_toml, require_valid, validate_pool, ValidationIssue,
};
