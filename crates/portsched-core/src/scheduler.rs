//! Issue scheduler.
//!
//! Each [`tick`](IssueScheduler::tick) first retires operations whose
//! results are due, then walks the queue oldest-first (arrival cycle, then
//! request id) and grants each eligible request the first free capable
//! unit. A request that finds no unit stays queued and is retried the next
//! cycle in the same order. Squashes roll unit state back in the cycle they
//! are raised, so later grants in that cycle see the freed unit.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use portsched_config::{ConfigError, CoreConfig, OpClass, SchedulerParams};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedError};
use crate::pool::FunctionalUnitPool;
use crate::stats::IssueStats;
use crate::unit::Booking;
use crate::Cycle;

/// Identifier of a submitted request. Ids increase in submission order,
/// so a larger id is younger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A micro-op waiting for a functional unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueRequest {
    /// Identifier handed back by `submit`.
    pub id: RequestId,
    /// Class the op needs a unit for.
    pub op_class: OpClass,
    /// Cycle the op became ready; it is not considered before this cycle.
    pub arrival: Cycle,
}

/// Why a request was not granted this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StallReason {
    /// Every capable unit was busy.
    NoFreeUnit,
    /// The per-cycle grant limit was already reached.
    IssueWidth,
}

/// Observable outcome of scheduler activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum IssueEvent {
    /// The request began execution.
    Granted {
        /// Granted request.
        id: RequestId,
        /// Class of the request.
        op_class: OpClass,
        /// Pool index of the unit chosen.
        unit: usize,
        /// Replica within that unit.
        replica: usize,
        /// Cycle execution began.
        issued_at: Cycle,
        /// Cycle the result is available.
        completes_at: Cycle,
    },
    /// The request stays queued for another cycle.
    Stalled {
        /// Waiting request.
        id: RequestId,
        /// Class of the request.
        op_class: OpClass,
        /// Why no grant was made.
        reason: StallReason,
    },
    /// The result became available and the reservation was released.
    Completed {
        /// Retired request.
        id: RequestId,
        /// Class of the request.
        op_class: OpClass,
        /// Unit that executed it.
        unit: usize,
        /// Completion cycle.
        cycle: Cycle,
    },
    /// The request was cancelled.
    Squashed {
        /// Cancelled request.
        id: RequestId,
        /// Class of the request.
        op_class: OpClass,
        /// Whether a unit had already been reserved.
        in_flight: bool,
        /// Cycle the squash took effect.
        cycle: Cycle,
    },
}

impl IssueEvent {
    /// Request the event refers to.
    pub fn id(&self) -> RequestId {
        match self {
            IssueEvent::Granted { id, .. }
            | IssueEvent::Stalled { id, .. }
            | IssueEvent::Completed { id, .. }
            | IssueEvent::Squashed { id, .. } => *id,
        }
    }
}

/// Events produced by one [`IssueScheduler::tick`], in the order they happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Cycle that was ticked.
    pub cycle: Cycle,
    /// Completions first, then grants and stalls in priority order.
    pub events: Vec<IssueEvent>,
}

impl CycleReport {
    /// `(id, unit, completes_at)` for every grant this cycle.
    pub fn granted(&self) -> impl Iterator<Item = (RequestId, usize, Cycle)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            IssueEvent::Granted {
                id,
                unit,
                completes_at,
                ..
            } => Some((id, unit, completes_at)),
            _ => None,
        })
    }

    /// `(id, reason)` for every stall this cycle.
    pub fn stalled(&self) -> impl Iterator<Item = (RequestId, StallReason)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            IssueEvent::Stalled { id, reason, .. } => Some((id, reason)),
            _ => None,
        })
    }

    /// Ids whose results became available this cycle.
    pub fn completed(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.events.iter().filter_map(|e| match *e {
            IssueEvent::Completed { id, .. } => Some(id),
            _ => None,
        })
    }
}

/// Issue scheduler over a functional-unit pool it owns.
///
/// Unit state is only reachable mutably through the scheduler; observers
/// get the pool read-only via [`pool`](Self::pool).
#[derive(Debug, Clone)]
pub struct IssueScheduler {
    pool: FunctionalUnitPool,
    params: SchedulerParams,
    /// Waiting requests keyed by priority.
    queue: BTreeMap<(Cycle, RequestId), IssueRequest>,
    /// Arrival cycle of each queued request, for lookup by id.
    queued: BTreeMap<RequestId, Cycle>,
    in_flight: BTreeMap<RequestId, Booking>,
    /// Pending completions keyed by `(completes_at, id)`.
    completions: BTreeSet<(Cycle, RequestId)>,
    next_id: u64,
    now: Cycle,
    last_tick: Option<Cycle>,
    stats: IssueStats,
}

impl IssueScheduler {
    /// Create a scheduler over `pool`.
    pub fn new(pool: FunctionalUnitPool, params: SchedulerParams) -> Result<Self> {
        if params.issue_width == 0 {
            return Err(ConfigError::Validation {
                detail: "issue width must be at least 1".into(),
            }
            .into());
        }
        if params.iq_entries == 0 {
            return Err(ConfigError::Validation {
                detail: "issue queue must have at least 1 entry".into(),
            }
            .into());
        }
        let stats = IssueStats::new(pool.len());
        Ok(Self {
            pool,
            params,
            queue: BTreeMap::new(),
            queued: BTreeMap::new(),
            in_flight: BTreeMap::new(),
            completions: BTreeSet::new(),
            next_id: 0,
            now: 0,
            last_tick: None,
            stats,
        })
    }

    /// Build the pool and scheduler from a full issue-model description.
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        let pool = FunctionalUnitPool::new(&config.fu_pool)?;
        Self::new(pool, config.scheduler.clone())
    }

    /// Read-only view of the pool and its unit state.
    pub fn pool(&self) -> &FunctionalUnitPool {
        &self.pool
    }

    /// Width and capacity this scheduler was built with.
    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &IssueStats {
        &self.stats
    }

    /// The latest cycle seen by `tick` or `squash`.
    pub fn now(&self) -> Cycle {
        self.now
    }

    /// Requests occupying issue-queue entries.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Issue-queue entries still free for [`submit`](Self::submit).
    pub fn queue_free(&self) -> usize {
        (self.params.iq_entries as usize).saturating_sub(self.queue.len())
    }

    /// Requests granted and not yet completed or squashed.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// No queued or in-flight requests remain.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }

    /// Queued requests in priority order.
    pub fn queued(&self) -> impl Iterator<Item = &IssueRequest> {
        self.queue.values()
    }

    /// The reservation held by an in-flight request.
    pub fn booking(&self, id: RequestId) -> Option<&Booking> {
        self.in_flight.get(&id)
    }

    /// Queue a ready micro-op.
    ///
    /// Fails immediately if no unit in the pool executes `op_class`.
    /// Returns `Ok(None)` when every issue-queue entry is taken; the caller
    /// holds the op and resubmits once a grant or squash frees an entry.
    pub fn submit(&mut self, op_class: OpClass, arrival: Cycle) -> Result<Option<RequestId>> {
        self.pool.table().lookup(op_class, self.now)?;
        if self.queue_free() == 0 {
            self.stats.queue_full += 1;
            log::trace!("issue queue full, rejected {op_class} arriving at {arrival}");
            return Ok(None);
        }

        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.queue.insert(
            (arrival, id),
            IssueRequest {
                id,
                op_class,
                arrival,
            },
        );
        self.queued.insert(id, arrival);
        self.stats.submitted += 1;
        log::trace!("queued {id} {op_class} arriving at {arrival}");
        Ok(Some(id))
    }

    /// Advance to cycle `now`: retire due completions, then issue.
    ///
    /// Each cycle may be ticked once, in increasing order. Squashes for
    /// cycle `now` must be delivered before `tick(now)`; a unit freed by a
    /// squash after the tick is first granted at `now + 1`.
    pub fn tick(&mut self, now: Cycle) -> Result<CycleReport> {
        self.check_cycle(now)?;
        if let Some(last) = self.last_tick {
            if now <= last {
                return Err(SchedError::CycleRegression { now, last });
            }
        }
        self.now = now;
        self.last_tick = Some(now);
        self.stats.cycles += 1;

        let mut events = Vec::new();
        self.retire_due(now, &mut events)?;
        self.issue_ready(now, &mut events)?;
        Ok(CycleReport { cycle: now, events })
    }

    /// Cancel one request at cycle `now`, whether queued or in flight.
    ///
    /// An in-flight request's unit is released immediately, so a
    /// non-pipelined unit it held is available to a `tick(now)` that
    /// follows. Deliver squashes before ticking the same cycle. On error
    /// the scheduler is left unchanged.
    pub fn squash(&mut self, id: RequestId, now: Cycle) -> Result<IssueEvent> {
        self.check_cycle(now)?;
        if !self.queued.contains_key(&id) && !self.in_flight.contains_key(&id) {
            return Err(SchedError::UnknownRequest { id, cycle: now });
        }
        self.now = now;

        if let Some(arrival) = self.queued.remove(&id) {
            let request = self
                .queue
                .remove(&(arrival, id))
                .ok_or(SchedError::UnknownRequest { id, cycle: now })?;
            self.stats.squashed_queued += 1;
            log::debug!("squashed queued {id} {}", request.op_class);
            return Ok(IssueEvent::Squashed {
                id,
                op_class: request.op_class,
                in_flight: false,
                cycle: now,
            });
        }

        let booking = self
            .in_flight
            .remove(&id)
            .ok_or(SchedError::UnknownRequest { id, cycle: now })?;
        self.completions.remove(&(booking.completes_at, id));
        self.pool.release(&booking, now)?;
        self.stats.squashed_in_flight += 1;
        log::debug!(
            "squashed in-flight {id} {} on unit {} (due {})",
            booking.op_class,
            booking.unit,
            booking.completes_at
        );
        Ok(IssueEvent::Squashed {
            id,
            op_class: booking.op_class,
            in_flight: true,
            cycle: now,
        })
    }

    /// Squash every queued or in-flight request with id `>= from`,
    /// youngest first. Older requests are untouched.
    pub fn squash_younger(&mut self, from: RequestId, now: Cycle) -> Result<Vec<IssueEvent>> {
        self.check_cycle(now)?;
        let mut victims: Vec<RequestId> = self
            .queued
            .range(from..)
            .map(|(&id, _)| id)
            .chain(self.in_flight.range(from..).map(|(&id, _)| id))
            .collect();
        victims.sort_unstable_by(|a, b| b.cmp(a));

        victims.into_iter().map(|id| self.squash(id, now)).collect()
    }

    fn check_cycle(&self, now: Cycle) -> Result<()> {
        if now < self.now {
            return Err(SchedError::CycleRegression {
                now,
                last: self.now,
            });
        }
        Ok(())
    }

    fn retire_due(&mut self, now: Cycle, events: &mut Vec<IssueEvent>) -> Result<()> {
        while let Some(&(due, id)) = self.completions.first() {
            if due > now {
                break;
            }
            self.completions.pop_first();
            let booking = self
                .in_flight
                .remove(&id)
                .ok_or(SchedError::UnknownRequest { id, cycle: now })?;
            self.pool.release(&booking, now)?;
            self.stats.completed += 1;
            events.push(IssueEvent::Completed {
                id,
                op_class: booking.op_class,
                unit: booking.unit,
                cycle: due,
            });
        }
        Ok(())
    }

    fn issue_ready(&mut self, now: Cycle, events: &mut Vec<IssueEvent>) -> Result<()> {
        let eligible: Vec<IssueRequest> = self
            .queue
            .range(..=(now, RequestId(u64::MAX)))
            .map(|(_, r)| *r)
            .collect();

        let width = self.params.issue_width as usize;
        let mut granted = 0;

        for request in eligible {
            let IssueRequest {
                id,
                op_class,
                arrival,
            } = request;

            if granted >= width {
                self.stats.width_stalls += 1;
                events.push(IssueEvent::Stalled {
                    id,
                    op_class,
                    reason: StallReason::IssueWidth,
                });
                continue;
            }

            match self.pool.grant(op_class, now)? {
                Some(booking) => {
                    self.queue.remove(&(arrival, id));
                    self.queued.remove(&id);
                    self.completions.insert((booking.completes_at, id));
                    self.in_flight.insert(id, booking);
                    self.stats.record_grant(op_class, booking.unit);
                    granted += 1;
                    log::debug!(
                        "cycle {now}: granted {id} {op_class} on unit {}.{} until {}",
                        booking.unit,
                        booking.replica,
                        booking.completes_at
                    );
                    events.push(IssueEvent::Granted {
                        id,
                        op_class,
                        unit: booking.unit,
                        replica: booking.replica,
                        issued_at: now,
                        completes_at: booking.completes_at,
                    });
                }
                None => {
                    self.stats.record_structural_stall(op_class);
                    log::trace!("cycle {now}: {id} {op_class} stalled, no free unit");
                    events.push(IssueEvent::Stalled {
                        id,
                        op_class,
                        reason: StallReason::NoFreeUnit,
                    });
                }
            }
        }
        Ok(())
    }
}
