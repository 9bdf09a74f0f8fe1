//! Daily slot planning
//!
//! Computes the ordered post times for one calendar day: a single fixed
//! slot (skipped when already elapsed) plus a number of randomly
//! distributed slots filling `[now, end-of-day)`. When the remaining day
//! cannot hold the requested count at minimum spacing, the count degrades
//! and the survivors are spaced evenly. A late start never aborts
//! planning, it just yields fewer, tighter slots.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::PostType;

/// Identity of one slot within a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlotId {
    /// The fixed daily slot
    Fixed,
    /// Random slot by index into the plan's random slot list
    Random(usize),
}

impl SlotId {
    /// Post type a trigger for this slot is classified as
    pub fn post_type(&self) -> PostType {
        match self {
            Self::Fixed => PostType::Scheduled,
            Self::Random(_) => PostType::Random,
        }
    }
}

/// The ordered set of target timestamps for one calendar day
///
/// Owned exclusively by the scheduler loop; everything else reads
/// [`PlanSnapshot`] copies.
#[derive(Debug, Clone)]
pub struct DailyPlan {
    /// Calendar day this plan covers
    pub date: NaiveDate,

    /// Fixed slot time, absent when already elapsed at plan time
    pub fixed_slot: Option<NaiveDateTime>,

    /// Random slots, strictly increasing, all within `[now, end-of-day)`
    pub random_slots: Vec<NaiveDateTime>,

    /// Slots already fired
    consumed: BTreeSet<SlotId>,
}

impl DailyPlan {
    /// Empty plan for a day (no slots at all)
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            fixed_slot: None,
            random_slots: Vec::new(),
            consumed: BTreeSet::new(),
        }
    }

    /// Total number of slots in the plan
    pub fn total_slots(&self) -> usize {
        usize::from(self.fixed_slot.is_some()) + self.random_slots.len()
    }

    /// Number of slots not yet fired
    pub fn remaining(&self) -> usize {
        self.total_slots() - self.consumed.len()
    }

    /// Whether every slot has fired
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Time of a slot, if it exists in this plan
    pub fn slot_time(&self, id: SlotId) -> Option<NaiveDateTime> {
        match id {
            SlotId::Fixed => self.fixed_slot,
            SlotId::Random(i) => self.random_slots.get(i).copied(),
        }
    }

    /// Earliest unconsumed slot and its time
    pub fn next_unconsumed(&self) -> Option<(SlotId, NaiveDateTime)> {
        let mut best: Option<(SlotId, NaiveDateTime)> = None;

        let mut consider = |id: SlotId, at: NaiveDateTime| {
            if self.consumed.contains(&id) {
                return;
            }
            if best.map_or(true, |(_, t)| at < t) {
                best = Some((id, at));
            }
        };

        if let Some(at) = self.fixed_slot {
            consider(SlotId::Fixed, at);
        }
        for (i, at) in self.random_slots.iter().enumerate() {
            consider(SlotId::Random(i), *at);
        }

        best
    }

    /// Mark a slot as fired
    pub fn mark_consumed(&mut self, id: SlotId) {
        if self.slot_time(id).is_some() {
            self.consumed.insert(id);
        }
    }

    /// Read-only copy for status reporting
    pub fn snapshot(&self) -> PlanSnapshot {
        let mut slots = Vec::with_capacity(self.total_slots());

        if let Some(at) = self.fixed_slot {
            slots.push(SlotView {
                post_type: PostType::Scheduled,
                at,
                consumed: self.consumed.contains(&SlotId::Fixed),
            });
        }
        for (i, at) in self.random_slots.iter().enumerate() {
            slots.push(SlotView {
                post_type: PostType::Random,
                at: *at,
                consumed: self.consumed.contains(&SlotId::Random(i)),
            });
        }
        slots.sort_by_key(|s| s.at);

        PlanSnapshot {
            date: self.date,
            slots,
        }
    }
}

/// One slot in a [`PlanSnapshot`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlotView {
    /// Classification a trigger for this slot carries
    pub post_type: PostType,

    /// Target time
    pub at: NaiveDateTime,

    /// Whether the slot already fired
    pub consumed: bool,
}

/// Serializable snapshot of a [`DailyPlan`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
}

impl PlanSnapshot {
    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Compute the plan for the day containing `now`
///
/// - The fixed slot lands at `fixed_time` when `now` is still before it;
///   otherwise it is considered elapsed for today and omitted.
/// - `random_count` slots are drawn across `[now, end-of-day)` with
///   adjacent spacing in `[min_interval, max_interval]`; when the span
///   cannot hold them, the count degrades (see [`plan_with_rng`]).
pub fn plan(
    now: NaiveDateTime,
    fixed_time: NaiveTime,
    random_count: usize,
    min_interval: Duration,
    max_interval: Duration,
) -> DailyPlan {
    plan_with_rng(
        now,
        fixed_time,
        random_count,
        min_interval,
        max_interval,
        &mut rand::thread_rng(),
    )
}

/// [`plan`] with an injected random source (deterministic in tests)
pub fn plan_with_rng<R: Rng + ?Sized>(
    now: NaiveDateTime,
    fixed_time: NaiveTime,
    random_count: usize,
    min_interval: Duration,
    max_interval: Duration,
    rng: &mut R,
) -> DailyPlan {
    let date = now.date();
    let end_of_day = date.and_time(NaiveTime::MIN) + Duration::days(1);

    let fixed_today = date.and_time(fixed_time);
    let fixed_slot = (now < fixed_today).then_some(fixed_today);

    let random_slots = draw_random_slots(now, end_of_day, random_count, min_interval, max_interval, rng);

    DailyPlan {
        date,
        fixed_slot,
        random_slots,
        consumed: BTreeSet::new(),
    }
}

/// Draw random slot times within `[now, end_of_day)`
fn draw_random_slots<R: Rng + ?Sized>(
    now: NaiveDateTime,
    end_of_day: NaiveDateTime,
    random_count: usize,
    min_interval: Duration,
    max_interval: Duration,
    rng: &mut R,
) -> Vec<NaiveDateTime> {
    let span = (end_of_day - now).num_seconds();
    if random_count == 0 || span <= 0 {
        return Vec::new();
    }

    let min_s = min_interval.num_seconds().max(1);
    let max_s = max_interval.num_seconds().max(min_s);
    let count = random_count as i64;

    if span > count * min_s {
        // Feasible: sequential draws, each clamped so the remaining slots
        // can still fit at minimum spacing strictly before end-of-day.
        let mut slots = Vec::with_capacity(random_count);
        let mut prev = now;

        for i in 0..count {
            let remaining_after = count - 1 - i;
            let latest = end_of_day - Duration::seconds(remaining_after * min_s + 1);
            let lower = prev + Duration::seconds(min_s);
            let upper = (prev + Duration::seconds(max_s)).min(latest);

            let at = if upper <= lower {
                lower.min(latest)
            } else {
                let window = (upper - lower).num_seconds();
                lower + Duration::seconds(rng.gen_range(0..=window))
            };

            slots.push(at);
            prev = at;
        }

        slots
    } else {
        // Degraded: the span cannot hold the requested count at minimum
        // spacing. Reduce the count and space the survivors evenly with a
        // uniform gap of at least `min_interval`.
        let effective = (span - 1) / min_s;
        if effective <= 0 {
            return Vec::new();
        }

        let pad = (span - effective * min_s) / (effective + 1);
        let gap = min_s + pad;

        (1..=effective)
            .map(|i| now + Duration::seconds(i * gap))
            .collect()
    }
}
