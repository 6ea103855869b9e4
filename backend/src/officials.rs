//! Officials optimizer: assigns qualified officials to scheduled
//! games, sequential by game, scored candidate selection within each game.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflicts::Conflict;
use crate::model::{
    intervals_overlap, AssignmentStatus, ConflictSeverity, ConflictType, Game, GameType,
    OfficialProfile, OfficialSpecialty, SkillLevel,
};
use crate::travel::{estimate_travel_minutes, RouteProviderPort};

#[derive(Debug, Clone)]
pub struct AssignmentConstraints {
    pub require_certification: Option<crate::model::OfficialCertification>,
    pub preferred_specialties: Vec<OfficialSpecialty>,
    pub max_travel_distance_km: Option<f64>,
    pub min_rest_period_minutes: u32,
    pub allow_back_to_back_games: bool,
    pub max_games_per_official_per_day: u32,
    pub max_games_per_official_per_week: u32,
    pub require_confirmation_hours: u32,
}

impl Default for AssignmentConstraints {
    fn default() -> Self {
        Self {
            require_certification: None,
            preferred_specialties: vec![],
            max_travel_distance_km: None,
            min_rest_period_minutes: 30,
            allow_back_to_back_games: true,
            max_games_per_official_per_day: 4,
            max_games_per_official_per_week: 10,
            require_confirmation_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TentativeAssignment {
    pub game_id: Uuid,
    pub official_id: Uuid,
    pub role: OfficialSpecialty,
    pub status: AssignmentStatus,
    pub pay_rate: f64,
    pub estimated_pay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnassignedGame {
    pub game_id: Uuid,
    pub missing_roles: Vec<OfficialSpecialty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationStatistics {
    pub games_considered: usize,
    pub assignments_made: usize,
    pub unassigned_games: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub success: bool,
    pub assignments: Vec<TentativeAssignment>,
    pub unassigned_games: Vec<UnassignedGame>,
    pub conflicts: Vec<Conflict>,
    pub statistics: OptimizationStatistics,
}

/// The required roles for a game, derived from its division's
/// skill level and game type.
fn required_roles(skill_level: SkillLevel, game_type: GameType) -> Vec<OfficialSpecialty> {
    let mut roles = vec![
        OfficialSpecialty::HeadReferee,
        OfficialSpecialty::Scorekeeper,
        OfficialSpecialty::ClockOperator,
    ];
    let needs_assistant = matches!(skill_level, SkillLevel::Advanced | SkillLevel::Competitive)
        || game_type != GameType::Regular;
    if needs_assistant {
        roles.push(OfficialSpecialty::AssistantReferee);
    }
    roles
}

fn skill_level_multiplier(skill_level: SkillLevel) -> f64 {
    match skill_level {
        SkillLevel::Competitive => 1.2,
        SkillLevel::Advanced => 1.1,
        _ => 1.0,
    }
}

#[derive(Default)]
struct Workload {
    daily: HashMap<NaiveDate, u32>,
    weekly: u32,
    last_game_end: Option<DateTime<Utc>>,
}

pub struct OfficialsOptimizer<'a> {
    pub constraints: AssignmentConstraints,
    pub route_provider: &'a dyn RouteProviderPort,
    pub tz: chrono_tz::Tz,
}

impl<'a> OfficialsOptimizer<'a> {
    pub fn new(route_provider: &'a dyn RouteProviderPort) -> Self {
        Self {
            constraints: AssignmentConstraints::default(),
            route_provider,
            tz: chrono_tz::America::Phoenix,
        }
    }

    pub fn with_constraints(mut self, constraints: AssignmentConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Candidate scoring formula. `distance_km` is `f64::INFINITY` when
    /// unknown, which always scores below any candidate with a known
    /// distance.
    fn score(certification_level: u32, distance_km: f64, hourly_rate: f64) -> f64 {
        10.0 * certification_level as f64
            + (50.0 - distance_km).max(0.0)
            + 0.1 * (100.0 - hourly_rate).max(0.0)
    }

    fn pay_rate(
        hourly_rate: f64,
        role: OfficialSpecialty,
        game_type: GameType,
        skill_level: SkillLevel,
    ) -> f64 {
        hourly_rate * role.role_multiplier() * game_type.pay_multiplier() * skill_level_multiplier(skill_level)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn optimize(
        &self,
        games: &[(Game, SkillLevel)],
        officials: &[OfficialProfile],
        venue_geo: &HashMap<Uuid, crate::model::GeoPoint>,
        now: DateTime<Utc>,
    ) -> OptimizationResult {
        let active: Vec<&OfficialProfile> = officials.iter().filter(|o| o.official.active).collect();

        let mut ordered: Vec<&(Game, SkillLevel)> = games.iter().collect();
        ordered.sort_by(|(a, _), (b, _)| {
            a.scheduled_start
                .cmp(&b.scheduled_start)
                .then(b.game_type.importance().cmp(&a.game_type.importance()))
                .then(a.game_number.cmp(&b.game_number))
        });

        let mut workloads: HashMap<Uuid, Workload> = HashMap::new();
        let mut assignments = vec![];
        let mut unassigned = vec![];
        let mut conflicts = vec![];

        for (game, skill_level) in &ordered {
            let roles = required_roles(*skill_level, game.game_type);
            let mut missing = vec![];
            let game_end = game.end();
            let game_geo = venue_geo.get(&game.venue_id).copied();
            let local_date = game.scheduled_start.with_timezone(&self.tz).date_naive();

            for &role in &roles {
                let slots_needed = role.max_per_game();
                let mut filled = 0u8;

                while filled < slots_needed {
                    let best = active
                        .iter()
                        .filter(|o| o.specialties.contains(&role))
                        .filter(|o| {
                            self.constraints
                                .require_certification
                                .map(|min| o.official.certification >= min)
                                .unwrap_or(true)
                        })
                        .filter(|o| {
                            let workload = workloads.get(&o.official.id);
                            let daily = workload.and_then(|w| w.daily.get(&local_date)).copied().unwrap_or(0);
                            let weekly = workload.map(|w| w.weekly).unwrap_or(0);
                            daily < self.constraints.max_games_per_official_per_day.min(o.official.max_games_per_day)
                                && weekly < self.constraints.max_games_per_official_per_week.min(o.official.max_games_per_week)
                        })
                        .filter(|o| {
                            if self.constraints.allow_back_to_back_games {
                                return true;
                            }
                            match workloads.get(&o.official.id).and_then(|w| w.last_game_end) {
                                Some(last_end) => {
                                    let rest_minutes = (game.scheduled_start - last_end).num_minutes();
                                    rest_minutes >= self.constraints.min_rest_period_minutes as i64
                                }
                                None => true,
                            }
                        })
                        .filter(|o| !assignments.iter().any(|a: &TentativeAssignment| a.game_id == game.id && a.official_id == o.official.id))
                        .filter_map(|o| {
                            let distance_km = match (o.home, game_geo) {
                                (Some(home), Some(venue)) => {
                                    estimate_travel_minutes(self.route_provider, Some(home), Some(venue)) / 2.0
                                }
                                _ => f64::INFINITY,
                            };
                            let radius = o
                                .official
                                .travel_radius_km
                                .min(self.constraints.max_travel_distance_km.unwrap_or(f64::INFINITY));
                            if distance_km.is_finite() && distance_km > radius {
                                return None;
                            }
                            let score = Self::score(o.official.certification.level(), distance_km, o.official.hourly_rate);
                            Some((*o, score))
                        })
                        .max_by(|(a, score_a), (b, score_b)| {
                            score_a
                                .partial_cmp(score_b)
                                .unwrap_or(std::cmp::Ordering::Equal)
                                .then(b.official.id.cmp(&a.official.id))
                        });

                    let Some((candidate, _score)) = best else {
                        break;
                    };

                    let pay_rate = Self::pay_rate(candidate.official.hourly_rate, role, game.game_type, *skill_level);
                    let duration_hours = game.duration_minutes as f64 / 60.0;

                    assignments.push(TentativeAssignment {
                        game_id: game.id,
                        official_id: candidate.official.id,
                        role,
                        status: AssignmentStatus::Pending,
                        pay_rate,
                        estimated_pay: pay_rate * duration_hours,
                    });

                    let workload = workloads.entry(candidate.official.id).or_default();
                    *workload.daily.entry(local_date).or_insert(0) += 1;
                    workload.weekly += 1;
                    workload.last_game_end = Some(game_end);

                    filled += 1;
                }

                if filled == 0 {
                    missing.push(role);
                }
            }

            if !missing.is_empty() {
                for role in &missing {
                    conflicts.push(skill_mismatch_conflict(game, *role, now));
                }
                unassigned.push(UnassignedGame {
                    game_id: game.id,
                    missing_roles: missing,
                });
            }
        }

        // Cross-assignment conflict pass over the produced assignments.
        let game_by_id: HashMap<Uuid, &Game> = ordered.iter().map(|(g, _)| (g.id, g)).collect();
        conflicts.extend(cross_assignment_conflicts(&assignments, &game_by_id, now));

        let has_critical = conflicts.iter().any(|c| c.severity == ConflictSeverity::Critical);

        let statistics = OptimizationStatistics {
            games_considered: ordered.len(),
            assignments_made: assignments.len(),
            unassigned_games: unassigned.len(),
        };

        OptimizationResult {
            success: unassigned.is_empty() && !has_critical,
            assignments,
            unassigned_games: unassigned,
            conflicts,
            statistics,
        }
    }
}

fn skill_mismatch_conflict(game: &Game, role: OfficialSpecialty, now: DateTime<Utc>) -> Conflict {
    crate::conflicts::Conflict {
        id: Uuid::new_v4(),
        conflict_type: ConflictType::SkillMismatch,
        severity: ConflictType::SkillMismatch.default_severity(),
        description: format!("no qualified {role:?} available for {}", game.game_number),
        affected_games: vec![game.id],
        affected_teams: vec![game.home_team_id, game.away_team_id],
        affected_venues: vec![game.venue_id],
        affected_officials: vec![],
        scheduled_time: game.scheduled_start,
        suggested_resolution: crate::model::ResolutionStrategy::ManualResolution,
        resolution_options: vec![crate::conflicts::ResolutionOption {
            strategy: crate::model::ResolutionStrategy::ManualResolution,
            effort: crate::model::ResolutionEffort::High,
        }],
        metadata: serde_json::json!({"role": format!("{role:?}")}),
        created_at: now,
    }
}

fn cross_assignment_conflicts(
    assignments: &[TentativeAssignment],
    games: &HashMap<Uuid, &Game>,
    now: DateTime<Utc>,
) -> Vec<Conflict> {
    let mut by_official: HashMap<Uuid, Vec<&TentativeAssignment>> = HashMap::new();
    for a in assignments {
        by_official.entry(a.official_id).or_default().push(a);
    }

    let mut out = vec![];
    for (official_id, official_assignments) in by_official {
        for i in 0..official_assignments.len() {
            for j in (i + 1)..official_assignments.len() {
                let (Some(ga), Some(gb)) = (
                    games.get(&official_assignments[i].game_id),
                    games.get(&official_assignments[j].game_id),
                ) else {
                    continue;
                };
                if ga.id == gb.id {
                    continue;
                }

                if intervals_overlap(ga.scheduled_start, ga.end(), gb.scheduled_start, gb.end()) {
                    out.push(Conflict {
                        id: Uuid::new_v4(),
                        conflict_type: ConflictType::OfficialDoubleBooking,
                        severity: ConflictSeverity::Critical,
                        description: format!(
                            "official double-booked across {} and {}",
                            ga.game_number, gb.game_number
                        ),
                        affected_games: vec![ga.id, gb.id],
                        affected_teams: vec![],
                        affected_venues: vec![ga.venue_id, gb.venue_id],
                        affected_officials: vec![official_id],
                        scheduled_time: ga.scheduled_start.min(gb.scheduled_start),
                        suggested_resolution: crate::model::ResolutionStrategy::ManualResolution,
                        resolution_options: vec![crate::conflicts::ResolutionOption {
                            strategy: crate::model::ResolutionStrategy::ManualResolution,
                            effort: crate::model::ResolutionEffort::High,
                        }],
                        metadata: serde_json::json!({}),
                        created_at: now,
                    });
                    continue;
                }

                let gap_minutes = if ga.scheduled_start <= gb.scheduled_start {
                    (gb.scheduled_start - ga.end()).num_minutes()
                } else {
                    (ga.scheduled_start - gb.end()).num_minutes()
                };
                if ga.venue_id != gb.venue_id && gap_minutes >= 0 && gap_minutes < 30 {
                    out.push(Conflict {
                        id: Uuid::new_v4(),
                        conflict_type: ConflictType::TravelTimeConflict,
                        severity: ConflictSeverity::High,
                        description: format!(
                            "official has a tight cross-venue turnaround between {} and {}",
                            ga.game_number, gb.game_number
                        ),
                        affected_games: vec![ga.id, gb.id],
                        affected_teams: vec![],
                        affected_venues: vec![ga.venue_id, gb.venue_id],
                        affected_officials: vec![official_id],
                        scheduled_time: ga.scheduled_start.min(gb.scheduled_start),
                        suggested_resolution: crate::model::ResolutionStrategy::ManualResolution,
                        resolution_options: vec![crate::conflicts::ResolutionOption {
                            strategy: crate::model::ResolutionStrategy::ManualResolution,
                            effort: crate::model::ResolutionEffort::Medium,
                        }],
                        metadata: serde_json::json!({"gap_minutes": gap_minutes}),
                        created_at: now,
                    });
                }
            }
        }
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRow {
    pub official_id: Uuid,
    pub official_name: String,
    pub game_date: NaiveDate,
    pub game_number: String,
    pub role: OfficialSpecialty,
    pub hours: f64,
    pub hourly_rate: f64,
    pub total_pay: f64,
    pub status: AssignmentStatus,
}

/// Payroll export: CSV projection over completed assignments in a
/// date range.
pub fn payroll_csv(rows: &[PayrollRow]) -> String {
    let mut out = String::from("official_id,official_name,game_date,game_number,role,hours,hourly_rate,total_pay,status\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{:?},{:.2},{:.2},{:.2},{:?}\n",
            row.official_id,
            row.official_name,
            row.game_date,
            row.game_number,
            row.role,
            row.hours,
            row.hourly_rate,
            row.total_pay,
            row.status
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameStatus, Official, OfficialCertification};
    use crate::travel::HaversineFallback;
    use chrono::TimeZone;

    fn game_at(hour: u32) -> Game {
        let start = chrono_tz::America::Phoenix
            .with_ymd_and_hms(2024, 7, 13, hour, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        Game {
            id: Uuid::new_v4(),
            season_id: Uuid::nil(),
            division_id: Uuid::nil(),
            home_team_id: Uuid::new_v4(),
            away_team_id: Uuid::new_v4(),
            venue_id: Uuid::new_v4(),
            game_number: format!("G{hour}"),
            game_type: GameType::Regular,
            scheduled_start: start,
            duration_minutes: 90,
            status: GameStatus::Scheduled,
        }
    }

    #[test]
    fn scenario_5_fourth_game_is_unassigned_due_to_daily_cap() {
        let fallback = HaversineFallback::default();
        let optimizer = OfficialsOptimizer::new(&fallback).with_constraints(AssignmentConstraints {
            max_games_per_official_per_day: 3,
            ..Default::default()
        });

        let official = OfficialProfile {
            official: Official {
                id: Uuid::new_v4(),
                certification: OfficialCertification::Advanced,
                max_games_per_day: 3,
                max_games_per_week: 10,
                travel_radius_km: 100.0,
                hourly_rate: 40.0,
                active: true,
            },
            specialties: vec![OfficialSpecialty::HeadReferee],
            home: None,
        };

        let games: Vec<(Game, SkillLevel)> = [9, 11, 13, 15]
            .iter()
            .map(|h| (game_at(*h), SkillLevel::Beginner))
            .collect();

        let result = optimizer.optimize(&games, &[official], &HashMap::new(), Utc::now());

        let head_ref_assignments = result
            .assignments
            .iter()
            .filter(|a| a.role == OfficialSpecialty::HeadReferee)
            .count();
        assert_eq!(head_ref_assignments, 3);
        assert_eq!(result.unassigned_games.len(), 1);
        assert!(result
            .conflicts
            .iter()
            .any(|c| c.conflict_type == ConflictType::SkillMismatch));
        assert!(!result.success);
    }

    #[test]
    fn pay_rate_applies_all_three_multipliers() {
        let rate = OfficialsOptimizer::pay_rate(40.0, OfficialSpecialty::HeadReferee, GameType::Championship, SkillLevel::Competitive);
        assert!((rate - (40.0 * 1.0 * 1.5 * 1.2)).abs() < 1e-9);
    }

    #[test]
    fn payroll_csv_contains_header_and_rows() {
        let rows = vec![PayrollRow {
            official_id: Uuid::new_v4(),
            official_name: "J. Smith".into(),
            game_date: NaiveDate::from_ymd_opt(2024, 7, 13).unwrap(),
            game_number: "G001".into(),
            role: OfficialSpecialty::HeadReferee,
            hours: 1.5,
            hourly_rate: 40.0,
            total_pay: 60.0,
            status: AssignmentStatus::Confirmed,
        }];
        let csv = payroll_csv(&rows);
        assert!(csv.starts_with("official_id,official_name"));
        assert_eq!(csv.lines().count(), 2);
    }
}
