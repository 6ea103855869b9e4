//! String <-> domain-enum conversions for the columns that store a closed
//! backend enum as `SCREAMING_SNAKE_CASE`/`UPPERCASE` text (mirrors the
//! teacher's `DateTime::<Utc>::from_str` pattern for its own string-backed
//! columns).

use backend::model::*;

use crate::errors::StoreError;

macro_rules! string_enum_convert {
    ($fn_to:ident, $fn_from:ident, $ty:ty, { $($variant:ident => $repr:literal),+ $(,)? }) => {
        pub fn $fn_to(value: $ty) -> String {
            match value {
                $(<$ty>::$variant => $repr.to_string()),+
            }
        }

        pub fn $fn_from(raw: &str) -> Result<$ty, StoreError> {
            match raw {
                $($repr => Ok(<$ty>::$variant)),+,
                other => Err(StoreError::Validation(format!(
                    "unrecognized {} value: {other}",
                    stringify!($ty)
                ))),
            }
        }
    };
}

string_enum_convert!(season_status_to_str, season_status_from_str, SeasonStatus, {
    Upcoming => "UPCOMING",
    RegistrationOpen => "REGISTRATION_OPEN",
    Active => "ACTIVE",
    Completed => "COMPLETED",
});

string_enum_convert!(skill_level_to_str, skill_level_from_str, SkillLevel, {
    Beginner => "BEGINNER",
    Intermediate => "INTERMEDIATE",
    Advanced => "ADVANCED",
    Competitive => "COMPETITIVE",
});

string_enum_convert!(venue_type_to_str, venue_type_from_str, VenueType, {
    Indoor => "INDOOR",
    Outdoor => "OUTDOOR",
    Hybrid => "HYBRID",
});

string_enum_convert!(day_of_week_to_str, day_of_week_from_str, DayOfWeek, {
    Mon => "MON",
    Tue => "TUE",
    Wed => "WED",
    Thu => "THU",
    Fri => "FRI",
    Sat => "SAT",
    Sun => "SUN",
});

string_enum_convert!(availability_kind_to_str, availability_kind_from_str, AvailabilityKind, {
    Available => "AVAILABLE",
    Blocked => "BLOCKED",
    Maintenance => "MAINTENANCE",
});

string_enum_convert!(game_type_to_str, game_type_from_str, GameType, {
    Regular => "REGULAR",
    Playoff => "PLAYOFF",
    Championship => "CHAMPIONSHIP",
    Scrimmage => "SCRIMMAGE",
    Semifinal => "SEMIFINAL",
    Quarterfinal => "QUARTERFINAL",
});

string_enum_convert!(game_status_to_str, game_status_from_str, GameStatus, {
    Scheduled => "SCHEDULED",
    InProgress => "IN_PROGRESS",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
    Forfeited => "FORFEITED",
    Postponed => "POSTPONED",
});

string_enum_convert!(certification_to_str, certification_from_str, OfficialCertification, {
    Beginner => "BEGINNER",
    Intermediate => "INTERMEDIATE",
    Advanced => "ADVANCED",
    Expert => "EXPERT",
});

string_enum_convert!(specialty_to_str, specialty_from_str, OfficialSpecialty, {
    HeadReferee => "HEAD_REFEREE",
    AssistantReferee => "ASSISTANT_REFEREE",
    Scorekeeper => "SCOREKEEPER",
    ClockOperator => "CLOCK_OPERATOR",
});

string_enum_convert!(assignment_status_to_str, assignment_status_from_str, AssignmentStatus, {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Declined => "DECLINED",
    Cancelled => "CANCELLED",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_status_round_trips() {
        for status in [
            GameStatus::Scheduled,
            GameStatus::InProgress,
            GameStatus::Completed,
            GameStatus::Cancelled,
            GameStatus::Forfeited,
            GameStatus::Postponed,
        ] {
            let raw = game_status_to_str(status);
            assert_eq!(game_status_from_str(&raw).unwrap(), status);
        }
    }

    #[test]
    fn unrecognized_value_is_a_validation_error() {
        assert!(game_status_from_str("NOT_A_STATUS").is_err());
    }
}
