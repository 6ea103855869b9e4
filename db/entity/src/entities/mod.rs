pub mod prelude;

pub mod assignment;
pub mod blackout_date;
pub mod division;
pub mod game;
pub mod official;
pub mod schedule_generation_log;
pub mod season;
pub mod team;
pub mod venue;
pub mod venue_availability_rule;
