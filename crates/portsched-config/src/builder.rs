//! Builder for functional-unit pools.
//!
//! Pools are assembled from unit descriptions, adjusted with per-unit
//! overrides, and frozen by [`FuPoolBuilder::build`], which validates the
//! result. Frozen configs are never mutated in place; to derive a
//! variant, start a new builder from the frozen value.
//!
//! # Example
//!
//! ```rust
//! use portsched_config::{FuDesc, FuPoolBuilder, OpClass, OpDesc};
//!
//! let mut builder = FuPoolBuilder::new("small");
//! builder
//!     .unit(FuDesc::new("alu", 2).op(OpDesc::new(OpClass::IntAlu)))
//!     .unit(FuDesc::new("div", 1).op(OpDesc::new(OpClass::IntDiv).latency(20).unpipelined()));
//! builder.set_op_latency(1, OpClass::IntDiv, 12).unwrap();
//!
//! let pool = builder.build().unwrap();
//! assert_eq!(pool.units[1].op_list[0].latency, 12);
//! ```

use crate::desc::{FuDesc, FuPoolConfig, OpDesc};
use crate::error::{ConfigError, Result};
use crate::op_class::OpClass;
use crate::parse::require_valid;

/// A builder for [`FuPoolConfig`] values.
#[derive(Debug, Clone)]
pub struct FuPoolBuilder {
    name: String,
    units: Vec<FuDesc>,
}

impl FuPoolBuilder {
    /// Start an empty pool.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: Vec::new(),
        }
    }

    /// Start from an existing pool, typically a preset.
    pub fn from_config(config: FuPoolConfig) -> Self {
        Self {
            name: config.name,
            units: config.units,
        }
    }

    /// Rename the pool.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Append a unit. Its index is the number of units added before it.
    pub fn unit(&mut self, unit: FuDesc) -> &mut Self {
        self.units.push(unit);
        self
    }

    /// Override the replica count of a unit.
    pub fn set_count(&mut self, unit: usize, count: u32) -> Result<&mut Self> {
        self.unit_mut(unit)?.count = count;
        Ok(self)
    }

    /// Override the latency of one class on one unit.
    pub fn set_op_latency(
        &mut self,
        unit: usize,
        op_class: OpClass,
        latency: u32,
    ) -> Result<&mut Self> {
        self.op_mut(unit, op_class)?.latency = latency;
        Ok(self)
    }

    /// Override the pipelining of one class on one unit.
    pub fn set_pipelined(
        &mut self,
        unit: usize,
        op_class: OpClass,
        pipelined: bool,
    ) -> Result<&mut Self> {
        self.op_mut(unit, op_class)?.pipelined = pipelined;
        Ok(self)
    }

    /// Validate and freeze the pool.
    pub fn build(&self) -> Result<FuPoolConfig> {
        let config = FuPoolConfig {
            name: self.name.clone(),
            units: self.units.clone(),
        };
        require_valid(&config)?;
        Ok(config)
    }

    fn unit_mut(&mut self, index: usize) -> Result<&mut FuDesc> {
        let len = self.units.len();
        self.units
            .get_mut(index)
            .ok_or(ConfigError::UnknownUnit { index, len })
    }

    fn op_mut(&mut self, unit: usize, op_class: OpClass) -> Result<&mut OpDesc> {
        let desc = self.unit_mut(unit)?;
        let name = desc.name.clone();
        desc.find_op_mut(op_class).ok_or(ConfigError::UnknownOpClass {
            unit,
            name,
            op_class,
        })
    }
}
