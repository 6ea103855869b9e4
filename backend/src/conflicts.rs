//! Pure conflict detector. Given a season's game set and ancillary
//! data, returns a sorted list of typed conflicts with resolution hints.
//! Side-effect-free and deterministic: every check reads its inputs and
//! nothing else.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Timelike, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    intervals_overlap, Assignment, BlackoutDate, ConflictSeverity, ConflictType, Game, GameStatus,
    OfficialProfile, ResolutionEffort, ResolutionStrategy, Team, Venue, VenueAvailabilityRule,
    VenueType,
};
use crate::travel::{estimate_travel_minutes, RouteProviderPort};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionOption {
    pub strategy: ResolutionStrategy,
    pub effort: ResolutionEffort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub id: Uuid,
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub description: String,
    pub affected_games: Vec<Uuid>,
    pub affected_teams: Vec<Uuid>,
    pub affected_venues: Vec<Uuid>,
    pub affected_officials: Vec<Uuid>,
    pub scheduled_time: DateTime<Utc>,
    pub suggested_resolution: ResolutionStrategy,
    pub resolution_options: Vec<ResolutionOption>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

fn resolution_options_for(conflict_type: ConflictType) -> (ResolutionStrategy, Vec<ResolutionOption>) {
    use ConflictType::*;
    use ResolutionEffort::*;
    use ResolutionStrategy::*;

    let options = match conflict_type {
        VenueDoubleBooking => vec![
            ResolutionOption { strategy: RescheduleGame, effort: Medium },
            ResolutionOption { strategy: ChangeVenue, effort: Low },
        ],
        TeamDoubleBooking => vec![
            ResolutionOption { strategy: RescheduleGame, effort: Medium },
            ResolutionOption { strategy: ManualResolution, effort: High },
        ],
        InsufficientRestTime => vec![
            ResolutionOption { strategy: RescheduleGame, effort: Low },
            ResolutionOption { strategy: SplitGameTime, effort: Medium },
        ],
        TravelTimeConflict => vec![
            ResolutionOption { strategy: ChangeVenue, effort: Medium },
            ResolutionOption { strategy: RescheduleGame, effort: Medium },
        ],
        HeatPolicyViolation => vec![
            ResolutionOption { strategy: RescheduleGame, effort: Low },
            ResolutionOption { strategy: SplitGameTime, effort: Medium },
        ],
        OfficialDoubleBooking => vec![
            ResolutionOption { strategy: ManualResolution, effort: High },
        ],
        VenueUnavailable => vec![
            ResolutionOption { strategy: ChangeVenue, effort: Low },
            ResolutionOption { strategy: RescheduleGame, effort: Medium },
        ],
        BlackoutDate => vec![
            ResolutionOption { strategy: RescheduleGame, effort: Low },
        ],
        SkillMismatch => vec![
            ResolutionOption { strategy: ManualResolution, effort: High },
        ],
    };

    (options[0].strategy, options)
}

fn make_conflict(
    conflict_type: ConflictType,
    description: String,
    affected_games: Vec<Uuid>,
    affected_teams: Vec<Uuid>,
    affected_venues: Vec<Uuid>,
    affected_officials: Vec<Uuid>,
    scheduled_time: DateTime<Utc>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
) -> Conflict {
    let (suggested_resolution, resolution_options) = resolution_options_for(conflict_type);
    Conflict {
        id: Uuid::new_v4(),
        conflict_type,
        severity: conflict_type.default_severity(),
        description,
        affected_games,
        affected_teams,
        affected_venues,
        affected_officials,
        scheduled_time,
        suggested_resolution,
        resolution_options,
        metadata,
        created_at,
    }
}

pub struct ConflictDetectorConfig {
    pub buffer_minutes: u32,
    pub min_rest_hours: f64,
    pub max_travel_minutes: f64,
    pub minutes_per_mile: f64,
}

impl Default for ConflictDetectorConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: 30,
            min_rest_hours: 12.0,
            max_travel_minutes: 90.0,
            minutes_per_mile: 2.0,
        }
    }
}

pub struct ConflictDetector<'a> {
    pub config: ConflictDetectorConfig,
    pub route_provider: &'a dyn RouteProviderPort,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(route_provider: &'a dyn RouteProviderPort) -> Self {
        Self {
            config: ConflictDetectorConfig::default(),
            route_provider,
        }
    }

    pub fn with_config(mut self, config: ConflictDetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs every independent check concurrently and merges the results.
    /// Deterministic regardless of scheduling: the merge step always
    /// applies the same sort.
    #[allow(clippy::too_many_arguments)]
    pub fn detect(
        &self,
        games: &[Game],
        venues: &[Venue],
        availability_rules: &[VenueAvailabilityRule],
        blackout_dates: &[BlackoutDate],
        teams: &[Team],
        officials: &[OfficialProfile],
        assignments: &[Assignment],
        now: DateTime<Utc>,
    ) -> Vec<Conflict> {
        let active_games: Vec<&Game> = games.iter().filter(|g| !g.status.is_cancelled()).collect();

        let venue_by_id: HashMap<Uuid, &Venue> = venues.iter().map(|v| (v.id, v)).collect();

        let checks: Vec<Box<dyn Fn() -> Vec<Conflict> + Sync + '_>> = vec![
            Box::new(|| self.venue_double_booking(&active_games, now)),
            Box::new(|| self.team_double_booking(&active_games, now)),
            Box::new(|| self.insufficient_rest(&active_games, now)),
            Box::new(|| self.travel_time(&active_games, &venue_by_id, now)),
            Box::new(|| self.heat_policy(&active_games, &venue_by_id, now)),
            Box::new(|| self.official_double_booking(assignments, games, now)),
            Box::new(|| self.venue_unavailable(&active_games, availability_rules, now)),
            Box::new(|| self.blackout(&active_games, blackout_dates, now)),
        ];

        let mut merged: Vec<Conflict> = checks.par_iter().flat_map(|check| check()).collect();

        // teams is accepted for symmetry with the data model's
        // affected_teams annotation, even though team validity (existence)
        // is assumed by the caller.
        let _ = teams;

        merged.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.scheduled_time.cmp(&b.scheduled_time))
        });

        merged
    }

    fn venue_double_booking(&self, games: &[&Game], now: DateTime<Utc>) -> Vec<Conflict> {
        let mut out = vec![];
        let buffer = self.config.buffer_minutes;

        for i in 0..games.len() {
            for j in (i + 1)..games.len() {
                let (a, b) = (games[i], games[j]);
                if a.venue_id != b.venue_id {
                    continue;
                }
                if intervals_overlap(a.scheduled_start, a.buffered_end(buffer), b.scheduled_start, b.buffered_end(buffer)) {
                    out.push(make_conflict(
                        ConflictType::VenueDoubleBooking,
                        format!(
                            "games {} and {} overlap at the same venue (with buffer)",
                            a.game_number, b.game_number
                        ),
                        vec![a.id, b.id],
                        vec![a.home_team_id, a.away_team_id, b.home_team_id, b.away_team_id],
                        vec![a.venue_id],
                        vec![],
                        a.scheduled_start.min(b.scheduled_start),
                        serde_json::json!({"buffer_minutes": buffer}),
                        now,
                    ));
                }
            }
        }
        out
    }

    fn team_double_booking(&self, games: &[&Game], now: DateTime<Utc>) -> Vec<Conflict> {
        let mut out = vec![];

        for i in 0..games.len() {
            for j in (i + 1)..games.len() {
                let (a, b) = (games[i], games[j]);
                let a_teams: HashSet<Uuid> = [a.home_team_id, a.away_team_id].into_iter().collect();
                let b_teams: HashSet<Uuid> = [b.home_team_id, b.away_team_id].into_iter().collect();
                let shared: Vec<Uuid> = a_teams.intersection(&b_teams).copied().collect();
                if shared.is_empty() {
                    continue;
                }
                if intervals_overlap(a.scheduled_start, a.end(), b.scheduled_start, b.end()) {
                    let overlap_minutes = overlap_minutes(a.scheduled_start, a.end(), b.scheduled_start, b.end());
                    out.push(make_conflict(
                        ConflictType::TeamDoubleBooking,
                        format!("team is booked in both {} and {}", a.game_number, b.game_number),
                        vec![a.id, b.id],
                        shared.clone(),
                        vec![a.venue_id, b.venue_id],
                        vec![],
                        a.scheduled_start.min(b.scheduled_start),
                        serde_json::json!({"overlap_minutes": overlap_minutes}),
                        now,
                    ));
                }
            }
        }
        out
    }

    fn insufficient_rest(&self, games: &[&Game], now: DateTime<Utc>) -> Vec<Conflict> {
        let mut by_team: HashMap<Uuid, Vec<&Game>> = HashMap::new();
        for g in games {
            by_team.entry(g.home_team_id).or_default().push(g);
            by_team.entry(g.away_team_id).or_default().push(g);
        }

        let mut out = vec![];
        for (_team, mut team_games) in by_team {
            team_games.sort_by_key(|g| g.scheduled_start);
            for pair in team_games.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                let gap_hours = (next.scheduled_start - prev.end()).num_minutes() as f64 / 60.0;
                if gap_hours < self.config.min_rest_hours {
                    out.push(make_conflict(
                        ConflictType::InsufficientRestTime,
                        format!(
                            "only {gap_hours:.1}h rest between {} and {}",
                            prev.game_number, next.game_number
                        ),
                        vec![prev.id, next.id],
                        vec![prev.home_team_id, prev.away_team_id],
                        vec![prev.venue_id, next.venue_id],
                        vec![],
                        next.scheduled_start,
                        serde_json::json!({"gap_hours": gap_hours}),
                        now,
                    ));
                }
            }
        }
        out
    }

    fn travel_time(
        &self,
        games: &[&Game],
        venues: &HashMap<Uuid, &Venue>,
        now: DateTime<Utc>,
    ) -> Vec<Conflict> {
        let mut by_team: HashMap<Uuid, Vec<&Game>> = HashMap::new();
        for g in games {
            by_team.entry(g.home_team_id).or_default().push(g);
            by_team.entry(g.away_team_id).or_default().push(g);
        }

        let mut out = vec![];
        for (_team, mut team_games) in by_team {
            team_games.sort_by_key(|g| g.scheduled_start);
            for pair in team_games.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                if prev.venue_id == next.venue_id {
                    continue;
                }
                let gap_minutes = (next.scheduled_start - prev.end()).num_minutes() as f64;
                if gap_minutes < 0.0 {
                    continue;
                }
                let prev_geo = venues.get(&prev.venue_id).and_then(|v| v.geo);
                let next_geo = venues.get(&next.venue_id).and_then(|v| v.geo);
                let travel_minutes = estimate_travel_minutes(self.route_provider, prev_geo, next_geo);

                if travel_minutes > gap_minutes && travel_minutes > self.config.max_travel_minutes {
                    out.push(make_conflict(
                        ConflictType::TravelTimeConflict,
                        format!(
                            "estimated {travel_minutes:.0} min travel exceeds the {gap_minutes:.0} min gap between {} and {}",
                            prev.game_number, next.game_number
                        ),
                        vec![prev.id, next.id],
                        vec![prev.home_team_id, prev.away_team_id],
                        vec![prev.venue_id, next.venue_id],
                        vec![],
                        next.scheduled_start,
                        serde_json::json!({"travel_minutes": travel_minutes, "gap_minutes": gap_minutes}),
                        now,
                    ));
                }
            }
        }
        out
    }

    fn heat_policy(
        &self,
        games: &[&Game],
        venues: &HashMap<Uuid, &Venue>,
        now: DateTime<Utc>,
    ) -> Vec<Conflict> {
        let mut out = vec![];
        for game in games {
            let Some(venue) = venues.get(&game.venue_id) else {
                continue;
            };
            if venue.venue_type != VenueType::Outdoor {
                continue;
            }
            let month = game.scheduled_start.month();
            if !(5..=10).contains(&month) {
                continue;
            }
            let hour = game.scheduled_start.hour();
            if !(11..18).contains(&hour) {
                continue;
            }
            out.push(make_conflict(
                ConflictType::HeatPolicyViolation,
                format!("{} is outdoors during dangerous hours in-season", game.game_number),
                vec![game.id],
                vec![game.home_team_id, game.away_team_id],
                vec![game.venue_id],
                vec![],
                game.scheduled_start,
                serde_json::json!({"month": month, "hour": hour}),
                now,
            ));
        }
        out
    }

    fn official_double_booking(
        &self,
        assignments: &[Assignment],
        games: &[Game],
        now: DateTime<Utc>,
    ) -> Vec<Conflict> {
        let game_by_id: HashMap<Uuid, &Game> = games.iter().map(|g| (g.id, g)).collect();
        let mut by_official: HashMap<Uuid, Vec<&Assignment>> = HashMap::new();
        for a in assignments {
            by_official.entry(a.official_id).or_default().push(a);
        }

        let mut out = vec![];
        for (official_id, official_assignments) in by_official {
            for i in 0..official_assignments.len() {
                for j in (i + 1)..official_assignments.len() {
                    let (Some(ga), Some(gb)) = (
                        game_by_id.get(&official_assignments[i].game_id),
                        game_by_id.get(&official_assignments[j].game_id),
                    ) else {
                        continue;
                    };
                    if ga.id == gb.id {
                        continue;
                    }
                    if intervals_overlap(ga.scheduled_start, ga.end(), gb.scheduled_start, gb.end()) {
                        out.push(make_conflict(
                            ConflictType::OfficialDoubleBooking,
                            format!(
                                "official is booked for overlapping games {} and {}",
                                ga.game_number, gb.game_number
                            ),
                            vec![ga.id, gb.id],
                            vec![],
                            vec![ga.venue_id, gb.venue_id],
                            vec![official_id],
                            ga.scheduled_start.min(gb.scheduled_start),
                            serde_json::json!({}),
                            now,
                        ));
                    }
                }
            }
        }
        out
    }

    fn venue_unavailable(
        &self,
        games: &[&Game],
        availability_rules: &[VenueAvailabilityRule],
        now: DateTime<Utc>,
    ) -> Vec<Conflict> {
        let mut by_venue: HashMap<Uuid, Vec<&VenueAvailabilityRule>> = HashMap::new();
        for rule in availability_rules {
            by_venue.entry(rule.venue_id).or_default().push(rule);
        }

        let mut out = vec![];
        for game in games {
            let date = game.scheduled_start.date_naive();
            let day = crate::model::DayOfWeek::from_chrono(game.scheduled_start.weekday());
            let start_minute = game.scheduled_start.hour() * 60 + game.scheduled_start.minute();
            let end_minute = start_minute + game.duration_minutes;

            let rules = by_venue.get(&game.venue_id).cloned().unwrap_or_default();
            let mut applicable: Vec<&&VenueAvailabilityRule> = rules
                .iter()
                .filter(|r| r.day_of_week == day && r.is_active_on(date))
                .collect();
            applicable.sort_by_key(|r| std::cmp::Reverse(r.priority));

            let covering = applicable
                .iter()
                .find(|r| r.start_minute <= start_minute && end_minute <= r.end_minute);

            let blocked = applicable.iter().any(|r| {
                matches!(
                    r.kind,
                    crate::model::AvailabilityKind::Blocked | crate::model::AvailabilityKind::Maintenance
                ) && start_minute < r.end_minute
                    && r.start_minute < end_minute
            });

            let outside_available = match covering {
                Some(r) => r.kind != crate::model::AvailabilityKind::Available,
                None => true,
            };

            if blocked || outside_available {
                out.push(make_conflict(
                    ConflictType::VenueUnavailable,
                    format!("{} falls outside the venue's available window", game.game_number),
                    vec![game.id],
                    vec![game.home_team_id, game.away_team_id],
                    vec![game.venue_id],
                    vec![],
                    game.scheduled_start,
                    serde_json::json!({}),
                    now,
                ));
            }
        }
        out
    }

    fn blackout(
        &self,
        games: &[&Game],
        blackout_dates: &[BlackoutDate],
        now: DateTime<Utc>,
    ) -> Vec<Conflict> {
        let mut out = vec![];
        for game in games {
            let date = game.scheduled_start.date_naive();
            for blackout in blackout_dates {
                if blackout.covers(date)
                    && blackout.affects_venue(game.venue_id)
                    && blackout.affects_division(game.division_id)
                {
                    out.push(make_conflict(
                        ConflictType::BlackoutDate,
                        format!("{} falls inside a blackout window", game.game_number),
                        vec![game.id],
                        vec![game.home_team_id, game.away_team_id],
                        vec![game.venue_id],
                        vec![],
                        game.scheduled_start,
                        serde_json::json!({"blackout_id": blackout.id}),
                        now,
                    ));
                }
            }
        }
        out
    }

    /// Per-game API used by reschedule/publish guards: evaluates a
    /// single proposed placement against the rest of the season's games.
    #[allow(clippy::too_many_arguments)]
    pub fn detect_game_conflicts(
        &self,
        venue: &Venue,
        start: DateTime<Utc>,
        duration_minutes: u32,
        team_ids: &[Uuid],
        existing_games: &[Game],
        exclude_game_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Vec<Conflict> {
        let candidate = Game {
            id: exclude_game_id.unwrap_or_else(Uuid::new_v4),
            season_id: Uuid::nil(),
            division_id: Uuid::nil(),
            home_team_id: team_ids.first().copied().unwrap_or_else(Uuid::new_v4),
            away_team_id: team_ids.get(1).copied().unwrap_or_else(Uuid::new_v4),
            venue_id: venue.id,
            game_number: "CANDIDATE".to_string(),
            game_type: crate::model::GameType::Regular,
            scheduled_start: start,
            duration_minutes,
            status: GameStatus::Scheduled,
        };

        let mut merged: Vec<Game> = existing_games
            .iter()
            .filter(|g| Some(g.id) != exclude_game_id)
            .cloned()
            .collect();
        merged.push(candidate);

        let refs: Vec<&Game> = merged.iter().collect();
        let venues = HashMap::from([(venue.id, venue)]);

        let mut out = self.venue_double_booking(&refs, now);
        out.extend(self.team_double_booking(&refs, now));
        out.extend(self.travel_time(&refs, &venues, now));
        out.retain(|c| c.affected_games.iter().any(|g| merged.iter().any(|m| m.id == *g && m.game_number == "CANDIDATE")));
        out
    }
}

fn overlap_minutes(a_start: DateTime<Utc>, a_end: DateTime<Utc>, b_start: DateTime<Utc>, b_end: DateTime<Utc>) -> i64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    (end - start).num_minutes().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GameType;
    use crate::travel::HaversineFallback;
    use chrono::TimeZone;

    fn game(id: Uuid, home: Uuid, away: Uuid, venue: Uuid, start: DateTime<Utc>) -> Game {
        Game {
            id,
            season_id: Uuid::nil(),
            division_id: Uuid::nil(),
            home_team_id: home,
            away_team_id: away,
            venue_id: venue,
            game_number: format!("G{id}"),
            game_type: GameType::Regular,
            scheduled_start: start,
            duration_minutes: 90,
            status: GameStatus::Scheduled,
        }
    }

    #[test]
    fn scenario_3_team_double_booking_reports_overlap_minutes() {
        let fallback = HaversineFallback::default();
        let detector = ConflictDetector::new(&fallback);

        let team_a = Uuid::new_v4();
        let team_b = Uuid::new_v4();
        let team_c = Uuid::new_v4();
        let venue1 = Uuid::new_v4();
        let venue2 = Uuid::new_v4();

        let base = Utc.with_ymd_and_hms(2024, 7, 13, 9, 0, 0).unwrap();
        let g1 = game(Uuid::new_v4(), team_a, team_b, venue1, base);
        let g2 = game(Uuid::new_v4(), team_a, team_c, venue2, base + chrono::Duration::minutes(60));

        let conflicts = detector.detect(&[g1, g2], &[], &[], &[], &[], &[], &[], base);

        let team_conflict = conflicts
            .iter()
            .find(|c| c.conflict_type == ConflictType::TeamDoubleBooking)
            .expect("expected a TEAM_DOUBLE_BOOKING conflict");

        assert_eq!(team_conflict.severity, ConflictSeverity::Critical);
        assert_eq!(team_conflict.metadata["overlap_minutes"], 30);
    }

    #[test]
    fn scenario_4_reschedule_produces_both_venue_and_team_conflicts() {
        let fallback = HaversineFallback::default();
        let detector = ConflictDetector::new(&fallback);

        let team_a = Uuid::new_v4();
        let team_b = Uuid::new_v4();
        let team_c = Uuid::new_v4();
        let venue1 = Uuid::new_v4();

        let base = Utc.with_ymd_and_hms(2024, 7, 13, 9, 0, 0).unwrap();
        let g1 = game(Uuid::new_v4(), team_a, team_b, venue1, base);

        let venue = Venue {
            id: venue1,
            name: "V1".into(),
            venue_type: VenueType::Indoor,
            geo: None,
            active: true,
            city: "Phoenix".into(),
            state: "AZ".into(),
        };

        let conflicts = detector.detect_game_conflicts(
            &venue,
            base + chrono::Duration::minutes(30),
            90,
            &[team_a, team_c],
            &[g1.clone()],
            None,
            base,
        );

        assert!(conflicts.iter().any(|c| c.conflict_type == ConflictType::VenueDoubleBooking));
        assert!(conflicts.iter().any(|c| c.conflict_type == ConflictType::TeamDoubleBooking));
    }

    #[test]
    fn sorting_is_by_severity_then_time() {
        let fallback = HaversineFallback::default();
        let detector = ConflictDetector::new(&fallback);

        let base = Utc.with_ymd_and_hms(2024, 7, 13, 9, 0, 0).unwrap();
        let venue1 = Uuid::new_v4();

        // Two overlapping games at the same venue with different teams
        // give one VENUE_DOUBLE_BOOKING (HIGH) and no TEAM_DOUBLE_BOOKING.
        let g1 = game(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), venue1, base);
        let g2 = game(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), venue1, base + chrono::Duration::minutes(10));

        let conflicts = detector.detect(&[g1, g2], &[], &[], &[], &[], &[], &[], base);
        for window in conflicts.windows(2) {
            assert!(window[0].severity >= window[1].severity);
        }
    }
}
