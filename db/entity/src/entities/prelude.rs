//! `SeaORM` Entity.

pub use super::assignment::Entity as Assignment;
pub use super::blackout_date::Entity as BlackoutDate;
pub use super::division::Entity as Division;
pub use super::game::Entity as Game;
pub use super::official::Entity as Official;
pub use super::schedule_generation_log::Entity as ScheduleGenerationLog;
pub use super::season::Entity as Season;
pub use super::team::Entity as Team;
pub use super::venue::Entity as Venue;
pub use super::venue_availability_rule::Entity as VenueAvailabilityRule;
