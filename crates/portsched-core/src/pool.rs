//! Functional-unit pool: units plus the class table built from them.

use portsched_config::{FuPoolConfig, OpClass};

use crate::error::{Result, SchedError};
use crate::table::OpClassTable;
use crate::unit::{Booking, FunctionalUnit};
use crate::Cycle;

/// An ordered set of functional units.
///
/// The unit list and class table are fixed at construction; only replica
/// busy state changes afterwards.
#[derive(Debug, Clone)]
pub struct FunctionalUnitPool {
    name: String,
    units: Vec<FunctionalUnit>,
    table: OpClassTable,
}

impl FunctionalUnitPool {
    /// Build a pool from a frozen configuration.
    pub fn new(config: &FuPoolConfig) -> Result<Self> {
        if config.units.is_empty() || config.total_replicas() == 0 {
            return Err(SchedError::EmptyPool {
                pool: config.name.clone(),
            });
        }

        let units = config
            .units
            .iter()
            .enumerate()
            .map(|(i, desc)| FunctionalUnit::from_desc(i, desc))
            .collect::<Result<Vec<_>>>()?;
        let table = OpClassTable::build(&units);

        log::debug!(
            "built pool '{}': {} units, {} replicas, {} classes",
            config.name,
            units.len(),
            config.total_replicas(),
            table.declared().count()
        );

        Ok(Self {
            name: config.name.clone(),
            units,
            table,
        })
    }

    /// Pool name from the configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared units, including those without replicas.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the pool declares no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in declaration order.
    pub fn units(&self) -> &[FunctionalUnit] {
        &self.units
    }

    /// Unit at `index`, if declared.
    pub fn unit(&self, index: usize) -> Option<&FunctionalUnit> {
        self.units.get(index)
    }

    /// The class-to-candidates index.
    pub fn table(&self) -> &OpClassTable {
        &self.table
    }

    /// Candidate units for `op_class` in tie-break order.
    pub fn candidates_for(&self, op_class: OpClass) -> &[usize] {
        self.table.candidates_for(op_class)
    }

    /// Whether unit `index` could accept `op_class` at `now`.
    pub fn is_available(&self, index: usize, op_class: OpClass, now: Cycle) -> bool {
        self.unit(index)
            .is_some_and(|u| u.is_available(op_class, now))
    }

    /// The unit [`grant`](Self::grant) would pick, without reserving it.
    pub fn probe(&self, op_class: OpClass, now: Cycle) -> Result<Option<usize>> {
        let candidates = self.table.lookup(op_class, now)?;
        Ok(candidates
            .iter()
            .copied()
            .find(|&i| self.units[i].is_available(op_class, now)))
    }

    /// Reserve the first free candidate for `op_class` at `now`.
    ///
    /// `Ok(None)` is a structural stall: every capable unit is busy.
    pub fn grant(&mut self, op_class: OpClass, now: Cycle) -> Result<Option<Booking>> {
        let Some(index) = self.probe(op_class, now)? else {
            return Ok(None);
        };
        Ok(self.units[index].try_reserve(op_class, now))
    }

    /// Release a booking on the unit that issued it.
    pub fn release(&mut self, booking: &Booking, now: Cycle) -> Result<()> {
        match self.units.get_mut(booking.unit) {
            Some(unit) => unit.release(booking, now),
            None => Err(SchedError::ReleaseUnreserved {
                unit: booking.unit,
                replica: booking.replica,
                completion: booking.completes_at,
                cycle: now,
            }),
        }
    }

    /// Operations currently reserved across the pool.
    pub fn in_flight(&self) -> usize {
        self.units.iter().map(FunctionalUnit::in_flight).sum()
    }
}
