//! Periodic timer engine.
//!
//! The scheduler owns no clock and never sleeps.  The caller passes the
//! current time to [`Scheduler::poll`], the scheduler notifies a
//! [`SchedulerDelegate`] for every schedule that is due, and
//! [`Scheduler::next_due_in`] tells the caller how long it may wait.
//!
//! ```text
//!   Clock ──now_ms──▶ Scheduler.poll() ──on_schedule_fired──▶ Delegate
//!     ▲                     │
//!     └──sleep_ms(next_due_in)
//! ```
//!
//! Because time is injected, a virtual clock can drive days of schedule
//! in a unit test without waiting.

use crate::app::ports::SchedulerDelegate;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A recurring schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Human-readable label (e.g., "ec-reading").
    pub label: &'static str,
    /// Time between fires.
    pub interval_ms: u64,
    /// Fire on the first poll instead of one interval after start.
    pub fire_immediately: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
    origin_ms: u64,
}

/// Internal bookkeeping for a live schedule.
#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    next_due_ms: u64,
}

impl Scheduler {
    /// Create a scheduler whose schedules count from `origin_ms`.
    pub fn new(origin_ms: u64) -> Self {
        Self {
            schedules: [None, None, None, None],
            origin_ms,
        }
    }

    /// Add a schedule.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, mut schedule: Schedule) -> Option<usize> {
        schedule.interval_ms = schedule.interval_ms.max(1);
        let next_due_ms = if schedule.fire_immediately {
            self.origin_ms
        } else {
            self.origin_ms + schedule.interval_ms
        };

        let (i, slot) = self
            .schedules
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())?;
        info!(
            "Scheduler: added '{}' at slot {} (every {} ms)",
            schedule.label, i, schedule.interval_ms
        );
        *slot = Some(ScheduleEntry {
            schedule,
            next_due_ms,
        });
        Some(i)
    }

    /// Fire every schedule that is due at `now_ms`.
    ///
    /// A schedule fires at most once per poll.  If the caller fell more
    /// than one interval behind, the missed fires are skipped rather than
    /// delivered in a burst.
    pub fn poll(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        for entry in self.schedules.iter_mut().flatten() {
            if now_ms < entry.next_due_ms {
                continue;
            }

            debug!("Scheduler: '{}' fired at {} ms", entry.schedule.label, now_ms);
            delegate.on_schedule_fired(entry.schedule.label, now_ms);

            let interval = entry.schedule.interval_ms;
            entry.next_due_ms += interval;
            if entry.next_due_ms <= now_ms {
                let missed = (now_ms - entry.next_due_ms) / interval + 1;
                info!(
                    "Scheduler: '{}' skipped {} missed fire(s)",
                    entry.schedule.label, missed
                );
                entry.next_due_ms += missed * interval;
            }
        }
    }

    /// Milliseconds until the earliest schedule is due (0 if one is
    /// already due), or `None` if nothing is scheduled.
    pub fn next_due_in(&self, now_ms: u64) -> Option<u64> {
        self.schedules
            .iter()
            .flatten()
            .map(|e| e.next_due_ms.saturating_sub(now_ms))
            .min()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
