//! Operation class table: class -> candidate units.

use portsched_config::OpClass;

use crate::error::{Result, SchedError};
use crate::unit::FunctionalUnit;
use crate::Cycle;

/// Immutable index from each operation class to the units that execute it.
///
/// Built once from the unit list. Candidates keep unit declaration order,
/// which is the grant tie-break order. Units without replicas are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpClassTable {
    candidates: Vec<Vec<usize>>,
}

impl OpClassTable {
    /// Build the table from units in declaration order.
    pub fn build(units: &[FunctionalUnit]) -> Self {
        let mut candidates = vec![Vec::new(); OpClass::COUNT];
        for unit in units.iter().filter(|u| u.replica_count() > 0) {
            for &(op_class, _) in unit.capabilities() {
                candidates[op_class.index()].push(unit.index());
            }
        }
        Self { candidates }
    }

    /// Candidate unit indices for `op_class`; empty when undeclared.
    pub fn candidates_for(&self, op_class: OpClass) -> &[usize] {
        &self.candidates[op_class.index()]
    }

    /// Candidates for `op_class`, failing when no unit executes it.
    pub fn lookup(&self, op_class: OpClass, cycle: Cycle) -> Result<&[usize]> {
        let found = self.candidates_for(op_class);
        if found.is_empty() {
            Err(SchedError::UndeclaredOpClass { op_class, cycle })
        } else {
            Ok(found)
        }
    }

    /// Whether some unit with replicas executes `op_class`.
    pub fn is_declared(&self, op_class: OpClass) -> bool {
        !self.candidates_for(op_class).is_empty()
    }

    /// Declared classes in index order.
    pub fn declared(&self) -> impl Iterator<Item = OpClass> + '_ {
        OpClass::ALL.iter().copied().filter(|&c| self.is_declared(c))
    }

    /// Fail on the first class in `classes` that no unit executes.
    ///
    /// Hosts call this at startup with every class their front end can
    /// produce, so a missing unit is caught before the first cycle.
    pub fn ensure_covers(&self, classes: &[OpClass]) -> Result<()> {
        for &op_class in classes {
            self.lookup(op_class, 0)?;
        }
        Ok(())
    }
}
