//! Scheduling core: schedule generator, conflict detector, heat-policy
//! evaluator, officials optimizer, and their supporting ports. No I/O —
//! callers inject a clock, a weather port and a route provider so the
//! whole crate stays deterministic under test.

pub mod clock;
pub mod conflicts;
pub mod generator;
pub mod heat;
pub mod ics;
pub mod model;
pub mod notify;
pub mod officials;
pub mod travel;
pub mod weather;
