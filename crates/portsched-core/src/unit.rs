//! Functional units.
//!
//! A unit is one declared port kind: a capability table shared by all of
//! its replicas, plus a busy state per replica. A replica is free at cycle
//! `c` when `free_at <= c`. A pipelined reservation holds the replica for
//! one cycle; a non-pipelined reservation holds it for the full latency.

use portsched_config::{FuDesc, OpClass};
use serde::Serialize;

use crate::error::{Result, SchedError};
use crate::Cycle;

/// Latency and pipelining of one class on one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpTiming {
    /// Cycles from issue to result.
    pub latency: u32,
    /// Whether a new op may start on the replica every cycle.
    pub pipelined: bool,
}

/// A successful reservation of one replica.
///
/// Handed back to [`FunctionalUnit::release`] when the operation retires or
/// is squashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Booking {
    /// Owning unit index in the pool.
    pub unit: usize,
    /// Replica within the unit.
    pub replica: usize,
    /// Class the replica was reserved for.
    pub op_class: OpClass,
    /// Cycle of the reservation.
    pub issued_at: Cycle,
    /// Cycle at which the result is available.
    pub completes_at: Cycle,
    tag: u64,
    prior_free_at: Cycle,
}

#[derive(Debug, Clone, Default)]
struct Replica {
    free_at: Cycle,
    /// Tag of the reservation that last moved `free_at`.
    last_tag: Option<u64>,
    /// Outstanding `(tag, completes_at)` pairs, oldest first.
    in_flight: Vec<(u64, Cycle)>,
}

/// A functional unit with `count` identical replicas.
#[derive(Debug, Clone)]
pub struct FunctionalUnit {
    index: usize,
    name: String,
    capabilities: Vec<(OpClass, OpTiming)>,
    lookup: Vec<Option<OpTiming>>,
    replicas: Vec<Replica>,
    next_tag: u64,
}

impl FunctionalUnit {
    /// Build unit `index` from its description.
    pub fn from_desc(index: usize, desc: &FuDesc) -> Result<Self> {
        let mut capabilities = Vec::with_capacity(desc.op_list.len());
        let mut lookup = vec![None; OpClass::COUNT];

        for op in &desc.op_list {
            if op.latency == 0 {
                return Err(SchedError::ZeroLatency {
                    unit: index,
                    name: desc.name.clone(),
                    op_class: op.op_class,
                });
            }
            let slot = &mut lookup[op.op_class.index()];
            if slot.is_some() {
                return Err(portsched_config::ConfigError::Validation {
                    detail: format!(
                        "unit {index} ('{}') declares {} more than once",
                        desc.name, op.op_class
                    ),
                }
                .into());
            }
            let timing = OpTiming {
                latency: op.latency,
                pipelined: op.pipelined,
            };
            *slot = Some(timing);
            capabilities.push((op.op_class, timing));
        }

        Ok(Self {
            index,
            name: desc.name.clone(),
            capabilities,
            lookup,
            replicas: vec![Replica::default(); desc.count as usize],
            next_tag: 0,
        })
    }

    /// Position in the pool's declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Declared unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of identical replicas.
    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    /// Capability entries in declaration order.
    pub fn capabilities(&self) -> &[(OpClass, OpTiming)] {
        &self.capabilities
    }

    /// Timing for `op_class`, if this unit executes it.
    pub fn capable(&self, op_class: OpClass) -> Option<OpTiming> {
        self.lookup[op_class.index()]
    }

    /// Lowest-indexed replica free at `now`.
    pub fn free_replica(&self, now: Cycle) -> Option<usize> {
        self.replicas.iter().position(|r| r.free_at <= now)
    }

    /// Whether `op_class` could be reserved here at `now`.
    pub fn is_available(&self, op_class: OpClass, now: Cycle) -> bool {
        self.capable(op_class).is_some() && self.free_replica(now).is_some()
    }

    /// Operations reserved and not yet released, across all replicas.
    pub fn in_flight(&self) -> usize {
        self.replicas.iter().map(|r| r.in_flight.len()).sum()
    }

    /// Reserve a replica for `op_class` starting at `now`.
    ///
    /// Returns `None` when the unit does not execute the class or every
    /// replica is busy. The booking's `completes_at` is `now + latency`,
    /// saturating at `Cycle::MAX`.
    pub fn try_reserve(&mut self, op_class: OpClass, now: Cycle) -> Option<Booking> {
        let timing = self.capable(op_class)?;
        let replica = self.free_replica(now)?;

        let tag = self.next_tag;
        self.next_tag += 1;

        let completes_at = now.saturating_add(Cycle::from(timing.latency));
        let r = &mut self.replicas[replica];
        let prior_free_at = r.free_at;
        r.free_at = if timing.pipelined {
            now.saturating_add(1)
        } else {
            completes_at
        };
        r.last_tag = Some(tag);
        r.in_flight.push((tag, completes_at));

        Some(Booking {
            unit: self.index,
            replica,
            op_class,
            issued_at: now,
            completes_at,
            tag,
            prior_free_at,
        })
    }

    /// Release a booking at `now`.
    ///
    /// At or after `completes_at` this retires the operation. Before it,
    /// the operation is abandoned: if no later reservation has touched the
    /// replica, its availability rolls back to the pre-reservation value.
    pub fn release(&mut self, booking: &Booking, now: Cycle) -> Result<()> {
        let unreserved = SchedError::ReleaseUnreserved {
            unit: self.index,
            replica: booking.replica,
            completion: booking.completes_at,
            cycle: now,
        };
        if booking.unit != self.index {
            return Err(unreserved);
        }
        let Some(r) = self.replicas.get_mut(booking.replica) else {
            return Err(unreserved);
        };
        let tracked = (booking.tag, booking.completes_at);
        let Some(pos) = r.in_flight.iter().position(|&entry| entry == tracked) else {
            return Err(unreserved);
        };
        r.in_flight.remove(pos);

        if now < booking.completes_at && r.last_tag == Some(booking.tag) {
            r.free_at = booking.prior_free_at;
            r.last_tag = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portsched_config::OpDesc;

    fn muldiv(count: u32) -> FunctionalUnit {
        let desc = FuDesc::new("muldiv", count)
            .op(OpDesc::new(OpClass::IntMult).latency(3))
            .op(OpDesc::new(OpClass::IntDiv).latency(4).unpipelined());
        FunctionalUnit::from_desc(0, &desc).unwrap()
    }

    #[test]
    fn capable_lookup() {
        let fu = muldiv(1);
        assert_eq!(
            fu.capable(OpClass::IntDiv),
            Some(OpTiming {
                latency: 4,
                pipelined: false
            })
        );
        assert!(fu.capable(OpClass::IntAlu).is_none());
        assert_eq!(fu.capabilities()[0].0, OpClass::IntMult);
    }

    #[test]
    fn pipelined_accepts_one_per_cycle() {
        let mut fu = muldiv(1);
        let a = fu.try_reserve(OpClass::IntMult, 0).unwrap();
        assert_eq!(a.completes_at, 3);
        assert!(fu.try_reserve(OpClass::IntMult, 0).is_none());
        let b = fu.try_reserve(OpClass::IntMult, 1).unwrap();
        assert_eq!(b.completes_at, 4);
        assert_eq!(fu.in_flight(), 2);
    }

    #[test]
    fn unpipelined_holds_for_latency() {
        let mut fu = muldiv(1);
        let div = fu.try_reserve(OpClass::IntDiv, 0).unwrap();
        assert_eq!(div.completes_at, 4);
        for cycle in 1..4 {
            assert!(fu.try_reserve(OpClass::IntMult, cycle).is_none());
            assert!(fu.try_reserve(OpClass::IntDiv, cycle).is_none());
        }
        fu.release(&div, 4).unwrap();
        assert!(fu.try_reserve(OpClass::IntDiv, 4).is_some());
    }

    #[test]
    fn replicas_fill_lowest_first() {
        let mut fu = muldiv(2);
        let a = fu.try_reserve(OpClass::IntDiv, 0).unwrap();
        let b = fu.try_reserve(OpClass::IntDiv, 0).unwrap();
        assert_eq!((a.replica, b.replica), (0, 1));
        assert!(fu.try_reserve(OpClass::IntDiv, 0).is_none());
    }

    #[test]
    fn early_release_rolls_back() {
        let mut fu = muldiv(1);
        let div = fu.try_reserve(OpClass::IntDiv, 0).unwrap();
        assert!(!fu.is_available(OpClass::IntDiv, 2));
        fu.release(&div, 2).unwrap();
        assert!(fu.is_available(OpClass::IntDiv, 2));
        assert_eq!(fu.in_flight(), 0);
    }

    #[test]
    fn squashing_older_pipelined_op_keeps_newer_reservation() {
        let mut fu = muldiv(1);
        let older = fu.try_reserve(OpClass::IntMult, 5).unwrap();
        let newer = fu.try_reserve(OpClass::IntMult, 6).unwrap();
        fu.release(&older, 6).unwrap();
        // `newer` still occupies cycle 6.
        assert!(!fu.is_available(OpClass::IntMult, 6));
        fu.release(&newer, 6).unwrap();
        assert!(fu.is_available(OpClass::IntMult, 6));
    }

    #[test]
    fn double_release_is_violation() {
        let mut fu = muldiv(1);
        let div = fu.try_reserve(OpClass::IntDiv, 0).unwrap();
        fu.release(&div, 4).unwrap();
        let err = fu.release(&div, 4).unwrap_err();
        assert!(matches!(
            err,
            SchedError::ReleaseUnreserved {
                unit: 0,
                replica: 0,
                completion: 4,
                ..
            }
        ));
    }

    #[test]
    fn foreign_booking_does_not_touch_state() {
        let mut a = muldiv(1);
        let mut b = FunctionalUnit::from_desc(
            1,
            &FuDesc::new("other", 1).op(OpDesc::new(OpClass::IntDiv).latency(4).unpipelined()),
        )
        .unwrap();
        let held = a.try_reserve(OpClass::IntDiv, 0).unwrap();
        let foreign = b.try_reserve(OpClass::IntDiv, 0).unwrap();

        assert!(a.release(&foreign, 1).is_err());
        assert!(!a.is_available(OpClass::IntDiv, 1));
        assert_eq!(a.in_flight(), 1);
        a.release(&held, 1).unwrap();
    }

    #[test]
    fn reservation_near_end_of_time_saturates() {
        let mut fu = muldiv(1);
        let late = Cycle::MAX - 1;
        let mult = fu.try_reserve(OpClass::IntMult, late).unwrap();
        assert_eq!(mult.completes_at, Cycle::MAX);
        assert!(fu.try_reserve(OpClass::IntMult, Cycle::MAX).is_some());

        let mut fu = muldiv(1);
        let div = fu.try_reserve(OpClass::IntDiv, Cycle::MAX).unwrap();
        assert_eq!(div.completes_at, Cycle::MAX);
        fu.release(&div, Cycle::MAX).unwrap();
        assert_eq!(fu.in_flight(), 0);
    }

    #[test]
    fn zero_latency_rejected() {
        let desc = FuDesc::new("bad", 1).op(OpDesc::new(OpClass::IntAlu).latency(0));
        let err = FunctionalUnit::from_desc(3, &desc).unwrap_err();
        assert!(matches!(err, SchedError::ZeroLatency { unit: 3, .. }));
    }

    #[test]
    fn duplicate_class_rejected() {
        let desc = FuDesc::new("dup", 1)
            .op(OpDesc::new(OpClass::IntAlu))
            .op(OpDesc::new(OpClass::IntAlu).latency(2));
        assert!(matches!(
            FunctionalUnit::from_desc(0, &desc),
            Err(SchedError::Config(_))
        ));
    }

    #[test]
    fn zero_count_never_reserves() {
        let mut fu = muldiv(0);
        assert!(fu.capable(OpClass::IntMult).is_some());
        assert!(fu.try_reserve(OpClass::IntMult, 0).is_none());
    }
}
