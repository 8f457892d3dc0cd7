//! Issue statistics.

use std::collections::BTreeMap;
use std::fmt;

use portsched_config::OpClass;
use serde::Serialize;

/// Grant and stall counts for one operation class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClassStats {
    /// Grants for this class.
    pub granted: u64,
    /// Cycles a request of this class waited for a free unit.
    pub structural_stalls: u64,
}

/// Counters accumulated by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct IssueStats {
    /// Cycles ticked.
    pub cycles: u64,
    /// Requests accepted into the issue queue.
    pub submitted: u64,
    /// Requests granted a unit.
    pub granted: u64,
    /// Requests whose results became available.
    pub completed: u64,
    /// Submissions turned away because the issue queue was full.
    pub queue_full: u64,
    /// Request-cycles lost to busy units.
    pub structural_stalls: u64,
    /// Request-cycles lost to the issue width limit.
    pub width_stalls: u64,
    /// Squashes of requests still in the queue.
    pub squashed_queued: u64,
    /// Squashes of requests holding a unit.
    pub squashed_in_flight: u64,
    /// Per-class breakdown; classes never seen are absent.
    pub per_class: BTreeMap<OpClass, ClassStats>,
    /// Grants per unit index.
    pub per_unit: Vec<u64>,
}

impl IssueStats {
    pub(crate) fn new(unit_count: usize) -> Self {
        Self {
            per_unit: vec![0; unit_count],
            ..Self::default()
        }
    }

    pub(crate) fn record_grant(&mut self, op_class: OpClass, unit: usize) {
        self.granted += 1;
        self.per_class.entry(op_class).or_default().granted += 1;
        if let Some(n) = self.per_unit.get_mut(unit) {
            *n += 1;
        }
    }

    pub(crate) fn record_structural_stall(&mut self, op_class: OpClass) {
        self.structural_stalls += 1;
        self.per_class.entry(op_class).or_default().structural_stalls += 1;
    }

    /// Mean grants per ticked cycle.
    pub fn issue_rate(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.granted as f64 / self.cycles as f64
        }
    }

    /// Export as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for IssueStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Issue Report ===")?;
        writeln!(f, "Cycles: {}", self.cycles)?;
        writeln!(
            f,
            "Requests: {} submitted, {} granted, {} completed",
            self.submitted, self.granted, self.completed
        )?;
        writeln!(f, "Issue rate: {:.2} per cycle", self.issue_rate())?;
        writeln!(
            f,
            "Stalls: {} structural, {} width",
            self.structural_stalls, self.width_stalls
        )?;
        writeln!(f, "Queue full: {} rejected", self.queue_full)?;
        writeln!(
            f,
            "Squashed: {} queued, {} in flight",
            self.squashed_queued, self.squashed_in_flight
        )?;

        if !self.per_class.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Classes ---")?;
            for (class, stats) in &self.per_class {
                writeln!(
                    f,
                    "  {class}: {} granted, {} stalled",
                    stats.granted, stats.structural_stalls
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_by_class_and_unit() {
        let mut stats = IssueStats::new(2);
        stats.record_grant(OpClass::IntAlu, 1);
        stats.record_grant(OpClass::IntAlu, 0);
        stats.record_structural_stall(OpClass::IntDiv);

        assert_eq!(stats.granted, 2);
        assert_eq!(stats.per_unit, vec![1, 1]);
        assert_eq!(stats.per_class[&OpClass::IntAlu].granted, 2);
        assert_eq!(stats.per_class[&OpClass::IntDiv].structural_stalls, 1);
    }

    #[test]
    fn issue_rate_handles_zero_cycles() {
        let mut stats = IssueStats::new(1);
        assert_eq!(stats.issue_rate(), 0.0);
        stats.cycles = 4;
        stats.granted = 6;
        assert!((stats.issue_rate() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn json_keys_use_class_names() {
        let mut stats = IssueStats::new(1);
        stats.record_grant(OpClass::MemRead, 0);
        let json = stats.to_json().unwrap();
        assert!(json.contains("\"MemRead\""));
        assert!(json.contains("\"per-class\""));
    }

    #[test]
    fn display_report() {
        let mut stats = IssueStats::new(1);
        stats.cycles = 2;
        stats.record_grant(OpClass::IntAlu, 0);
        stats.queue_full = 3;
        let text = stats.to_string();
        assert!(text.contains("=== Issue Report ==="));
        assert!(text.contains("Queue full: 3 rejected"));
        assert!(text.contains("IntAlu: 1 granted, 0 stalled"));
    }
}
