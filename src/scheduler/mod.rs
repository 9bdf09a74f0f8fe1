//! Slot planning and the scheduling loop
//!
//! The planner is a pure function computing the day's slot times; the
//! runner owns the resulting [`DailyPlan`] and drives the state machine
//! Planning -> Waiting -> Firing -> RollingOver. External observers only
//! ever see snapshot copies of the plan, never the live value.

pub mod error;
pub mod planner;
pub mod runner;

pub use error::{SchedulerError, SchedulerResult};
pub use planner::{plan, DailyPlan, PlanSnapshot, SlotId};
pub use runner::Scheduler;
