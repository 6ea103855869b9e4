//! Domain types shared by the generator, conflict detector, heat-policy
//! evaluator and officials optimizer. Every "kind" field the source treats
//! as an untyped string is a closed enum here so that adding a new variant
//! is a compile error at every match site until handled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonStatus {
    Upcoming,
    RegistrationOpen,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Competitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VenueType {
    Indoor,
    Outdoor,
    Hybrid,
}

impl VenueType {
    pub fn is_outdoor(self) -> bool {
        matches!(self, VenueType::Outdoor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        use chrono::Weekday::*;
        match weekday {
            Mon => DayOfWeek::Mon,
            Tue => DayOfWeek::Tue,
            Wed => DayOfWeek::Wed,
            Thu => DayOfWeek::Thu,
            Fri => DayOfWeek::Fri,
            Sat => DayOfWeek::Sat,
            Sun => DayOfWeek::Sun,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityKind {
    Available,
    Blocked,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameType {
    Regular,
    Playoff,
    Championship,
    Scrimmage,
    Semifinal,
    Quarterfinal,
}

impl GameType {
    /// Used by the officials optimizer to order games by importance.
    pub fn importance(self) -> u8 {
        match self {
            GameType::Championship => 5,
            GameType::Playoff => 4,
            GameType::Semifinal => 3,
            GameType::Quarterfinal => 2,
            GameType::Regular | GameType::Scrimmage => 1,
        }
    }

    pub fn pay_multiplier(self) -> f64 {
        match self {
            GameType::Championship => 1.5,
            GameType::Playoff => 1.25,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Forfeited,
    Postponed,
}

impl GameStatus {
    /// Valid status transitions for a game. `false` means no move is
    /// allowed from this starting status (it is terminal).
    pub fn can_transition_to(self, next: GameStatus) -> bool {
        use GameStatus::*;
        matches!(
            (self, next),
            (Scheduled, InProgress)
                | (Scheduled, Cancelled)
                | (Scheduled, Postponed)
                | (InProgress, Completed)
                | (InProgress, Forfeited)
                | (InProgress, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameStatus::Completed | GameStatus::Forfeited | GameStatus::Cancelled
        )
    }

    pub fn is_cancelled(self) -> bool {
        matches!(self, GameStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfficialCertification {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl OfficialCertification {
    /// `10 * certification_level` term of the candidate scoring formula.
    pub fn level(self) -> u32 {
        match self {
            OfficialCertification::Beginner => 1,
            OfficialCertification::Intermediate => 2,
            OfficialCertification::Advanced => 3,
            OfficialCertification::Expert => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfficialSpecialty {
    HeadReferee,
    AssistantReferee,
    Scorekeeper,
    ClockOperator,
}

impl OfficialSpecialty {
    pub fn role_multiplier(self) -> f64 {
        match self {
            OfficialSpecialty::HeadReferee => 1.0,
            OfficialSpecialty::AssistantReferee => 0.8,
            OfficialSpecialty::Scorekeeper => 0.6,
            OfficialSpecialty::ClockOperator => 0.5,
        }
    }

    /// How many officials of this role a single game may book.
    pub fn max_per_game(self) -> u8 {
        match self {
            OfficialSpecialty::AssistantReferee => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeatWarningLevel {
    None,
    Caution,
    Warning,
    Danger,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    VenueDoubleBooking,
    TeamDoubleBooking,
    InsufficientRestTime,
    TravelTimeConflict,
    HeatPolicyViolation,
    OfficialDoubleBooking,
    VenueUnavailable,
    BlackoutDate,
    SkillMismatch,
}

impl ConflictType {
    pub fn default_severity(self) -> ConflictSeverity {
        use ConflictSeverity::*;
        use ConflictType::*;
        match self {
            TeamDoubleBooking | OfficialDoubleBooking => Critical,
            VenueDoubleBooking | HeatPolicyViolation | VenueUnavailable | BlackoutDate
            | SkillMismatch => High,
            InsufficientRestTime | TravelTimeConflict => Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStrategy {
    RescheduleGame,
    ChangeVenue,
    SwapHomeAway,
    SplitGameTime,
    ManualResolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionEffort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleAlgorithm {
    RoundRobin,
    DoubleRoundRobin,
    Tournament,
}

/// A geo-point used for the haversine travel-time estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub venue_type: VenueType,
    pub geo: Option<GeoPoint>,
    pub active: bool,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VenueAvailabilityRule {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_minute: u32,
    pub end_minute: u32,
    pub kind: AvailabilityKind,
    pub priority: i32,
    pub expiry_date: Option<chrono::NaiveDate>,
}

impl VenueAvailabilityRule {
    /// A rule whose `expiry_date < today` is inactive.
    pub fn is_active_on(&self, date: chrono::NaiveDate) -> bool {
        match self.expiry_date {
            Some(expiry) => expiry >= date,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Division {
    pub id: Uuid,
    pub name: String,
    pub skill_level: SkillLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub division_id: Uuid,
    pub preferred_venues: Vec<Uuid>,
    pub blackout_dates: Vec<chrono::NaiveDate>,
    pub max_games_per_week: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackoutDate {
    pub id: Uuid,
    pub season_id: Uuid,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    /// Empty means "all venues".
    pub affects_venues: Vec<Uuid>,
    /// Empty means "all divisions".
    pub affects_divisions: Vec<Uuid>,
}

impl BlackoutDate {
    pub fn covers(&self, date: chrono::NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn affects_venue(&self, venue_id: Uuid) -> bool {
        self.affects_venues.is_empty() || self.affects_venues.contains(&venue_id)
    }

    pub fn affects_division(&self, division_id: Uuid) -> bool {
        self.affects_divisions.is_empty() || self.affects_divisions.contains(&division_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub season_id: Uuid,
    pub division_id: Uuid,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub venue_id: Uuid,
    pub game_number: String,
    pub game_type: GameType,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: u32,
    pub status: GameStatus,
}

impl Game {
    pub fn end(&self) -> DateTime<Utc> {
        self.scheduled_start + chrono::Duration::minutes(self.duration_minutes as i64)
    }

    /// The interval used for venue-overlap checks: duration plus buffer.
    pub fn buffered_end(&self, buffer_minutes: u32) -> DateTime<Utc> {
        self.scheduled_start
            + chrono::Duration::minutes(self.duration_minutes as i64 + buffer_minutes as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Official {
    pub id: Uuid,
    pub certification: OfficialCertification,
    pub max_games_per_day: u32,
    pub max_games_per_week: u32,
    pub travel_radius_km: f64,
    pub hourly_rate: f64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficialProfile {
    pub official: Official,
    pub specialties: Vec<OfficialSpecialty>,
    pub home: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub game_id: Uuid,
    pub official_id: Uuid,
    pub role: OfficialSpecialty,
    pub status: AssignmentStatus,
    pub pay_rate: f64,
    pub estimated_pay: f64,
}

/// Overlap check shared by every conflict type and the generator's
/// placement loop: `[a_start, a_end) ∩ [b_start, b_end) ≠ ∅`.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_detects_partial_overlap() {
        let base = Utc::now();
        let a_start = base;
        let a_end = base + chrono::Duration::minutes(60);
        let b_start = base + chrono::Duration::minutes(30);
        let b_end = base + chrono::Duration::minutes(90);
        assert!(intervals_overlap(a_start, a_end, b_start, b_end));
    }

    #[test]
    fn overlap_false_when_adjacent() {
        let base = Utc::now();
        let a_end = base + chrono::Duration::minutes(60);
        assert!(!intervals_overlap(base, a_end, a_end, a_end + chrono::Duration::minutes(30)));
    }

    #[test]
    fn game_status_transitions_form_the_spec_dag() {
        assert!(GameStatus::Scheduled.can_transition_to(GameStatus::InProgress));
        assert!(GameStatus::InProgress.can_transition_to(GameStatus::Completed));
        assert!(!GameStatus::Completed.can_transition_to(GameStatus::Scheduled));
        assert!(GameStatus::Completed.is_terminal());
    }

    #[test]
    fn availability_rule_expires() {
        let rule = VenueAvailabilityRule {
            id: Uuid::new_v4(),
            venue_id: Uuid::new_v4(),
            day_of_week: DayOfWeek::Sat,
            start_minute: 540,
            end_minute: 600,
            kind: AvailabilityKind::Available,
            priority: 0,
            expiry_date: Some(chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
        };
        assert!(!rule.is_active_on(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
    }
}
