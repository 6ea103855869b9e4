use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use backend::conflicts::ConflictDetector;
use backend::generator::{GenerationParams, ScheduleGenerator};
use backend::model::{
    BlackoutDate, Game, GameStatus, GameType, GeoPoint, Official, OfficialCertification,
    OfficialProfile, SkillLevel, Team, Venue,
};
use backend::officials::{payroll_csv, OfficialsOptimizer, PayrollRow};
use backend::travel::HaversineFallback;
use db::cache::InMemoryCache;

#[derive(Debug, Parser)]
#[command(version, about = "Operator CLI for the scheduling backend", long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: Commands,
    /// Overrides `DATABASE_URL`.
    #[arg(long = "db", required(false))]
    db_url: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// Season inspection and creation.
    Season {
        #[command(subcommand)]
        cmd: SeasonCommands,
    },
    /// Offline schedule generation.
    Schedule {
        #[command(subcommand)]
        cmd: ScheduleCommands,
    },
    /// Conflict detection over an existing season.
    Conflicts {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        season: Uuid,
    },
    /// Officials assignment optimization and payroll export.
    Officials {
        #[command(subcommand)]
        cmd: OfficialsCommands,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum SeasonCommands {
    List {
        #[arg(long)]
        tenant: Uuid,
    },
    Create {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum ScheduleCommands {
    /// Generate a schedule and print the resulting plan as JSON.
    Generate {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        season: Uuid,
        /// Insert the generated games immediately instead of only previewing them.
        #[arg(long, default_value_t = false)]
        publish: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum OfficialsCommands {
    /// Run the assignment optimizer for a season and persist the result.
    Optimize {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        season: Uuid,
    },
    /// Export a payroll CSV for a season, optionally bounded by date.
    Payroll {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        season: Uuid,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

/// Loads a season's divisions (with teams), active venues, and blackout
/// dates, all converted to domain ids, for the generator and detector.
async fn load_schedule_inputs(
    client: &db::Client,
    tenant_id: Uuid,
    season_row_id: i32,
) -> Result<(Vec<(Uuid, Vec<Team>)>, Vec<Venue>, Vec<BlackoutDate>)> {
    let division_rows = client.get_divisions_for_season(tenant_id, season_row_id).await?;

    let mut divisions = Vec::with_capacity(division_rows.len());
    for division in &division_rows {
        let teams = client
            .get_teams_for_division(division.id)
            .await?
            .into_iter()
            .map(|row| Team {
                id: row.external_id,
                name: row.name,
                division_id: division.external_id,
                preferred_venues: serde_json::from_value(row.preferred_venues).unwrap_or_default(),
                blackout_dates: serde_json::from_value(row.blackout_dates).unwrap_or_default(),
                max_games_per_week: row.max_games_per_week.map(|n| n as u32),
            })
            .collect();
        divisions.push((division.external_id, teams));
    }

    let venues = client
        .get_venues(tenant_id)
        .await?
        .into_iter()
        .filter(|v| v.active)
        .map(|row| Venue {
            id: row.external_id,
            name: row.name,
            venue_type: db::convert::venue_type_from_str(&row.venue_type)
                .unwrap_or(backend::model::VenueType::Indoor),
            geo: match (row.latitude, row.longitude) {
                (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
                _ => None,
            },
            active: row.active,
            city: row.city,
            state: row.state,
        })
        .collect();

    let blackouts = client
        .get_blackout_dates_for_season(season_row_id)
        .await?
        .into_iter()
        .map(|row| BlackoutDate {
            id: row.external_id,
            season_id: Uuid::nil(),
            start_date: row.start_date,
            end_date: row.end_date,
            affects_venues: serde_json::from_value(row.affects_venues).unwrap_or_default(),
            affects_divisions: serde_json::from_value(row.affects_divisions).unwrap_or_default(),
        })
        .collect();

    Ok((divisions, venues, blackouts))
}

/// Full conversion pass shared by the conflicts and officials commands:
/// games, venues, teams, and officials with reverse-mapped domain ids.
#[allow(clippy::type_complexity)]
async fn load_season_snapshot(
    client: &db::Client,
    tenant_id: Uuid,
    season_row_id: i32,
) -> Result<(
    Vec<Game>,
    Vec<Venue>,
    Vec<Team>,
    Vec<OfficialProfile>,
    HashMap<i32, Uuid>,
    HashMap<i32, Uuid>,
)> {
    let division_rows = client.get_divisions_for_season(tenant_id, season_row_id).await?;
    let division_ext: HashMap<i32, Uuid> = division_rows.iter().map(|d| (d.id, d.external_id)).collect();

    let mut team_rows = vec![];
    for division in &division_rows {
        team_rows.extend(client.get_teams_for_division(division.id).await?);
    }
    let team_ext: HashMap<i32, Uuid> = team_rows.iter().map(|t| (t.id, t.external_id)).collect();

    let venue_rows = client.get_venues(tenant_id).await?;
    let venue_ext: HashMap<i32, Uuid> = venue_rows.iter().map(|v| (v.id, v.external_id)).collect();

    let venues: Vec<Venue> = venue_rows
        .iter()
        .map(|row| Venue {
            id: row.external_id,
            name: row.name.clone(),
            venue_type: db::convert::venue_type_from_str(&row.venue_type)
                .unwrap_or(backend::model::VenueType::Indoor),
            geo: match (row.latitude, row.longitude) {
                (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
                _ => None,
            },
            active: row.active,
            city: row.city.clone(),
            state: row.state.clone(),
        })
        .collect();

    let teams: Vec<Team> = team_rows
        .iter()
        .map(|row| Team {
            id: row.external_id,
            name: row.name.clone(),
            division_id: division_ext.get(&row.division_id).copied().unwrap_or(Uuid::nil()),
            preferred_venues: serde_json::from_value(row.preferred_venues.clone()).unwrap_or_default(),
            blackout_dates: serde_json::from_value(row.blackout_dates.clone()).unwrap_or_default(),
            max_games_per_week: row.max_games_per_week.map(|n| n as u32),
        })
        .collect();

    let game_rows = client.get_games_for_season(season_row_id).await?;
    let game_ext: HashMap<i32, Uuid> = game_rows.iter().map(|g| (g.id, g.external_id)).collect();
    let games: Vec<Game> = game_rows
        .iter()
        .map(|row| Game {
            id: row.external_id,
            season_id: Uuid::nil(),
            division_id: division_ext.get(&row.division_id).copied().unwrap_or(Uuid::nil()),
            home_team_id: team_ext.get(&row.home_team_id).copied().unwrap_or(Uuid::nil()),
            away_team_id: team_ext.get(&row.away_team_id).copied().unwrap_or(Uuid::nil()),
            venue_id: venue_ext.get(&row.venue_id).copied().unwrap_or(Uuid::nil()),
            game_number: row.game_number.clone(),
            game_type: db::convert::game_type_from_str(&row.game_type).unwrap_or(GameType::Regular),
            scheduled_start: row.scheduled_start,
            duration_minutes: row.duration_minutes as u32,
            status: db::convert::game_status_from_str(&row.status).unwrap_or(GameStatus::Scheduled),
        })
        .collect();

    let official_rows = client.get_officials(tenant_id).await?;
    let official_ext: HashMap<i32, Uuid> = official_rows.iter().map(|o| (o.id, o.external_id)).collect();
    let officials: Vec<OfficialProfile> = official_rows
        .iter()
        .map(|row| OfficialProfile {
            official: Official {
                id: row.external_id,
                certification: db::convert::certification_from_str(&row.certification)
                    .unwrap_or(OfficialCertification::Beginner),
                max_games_per_day: row.max_games_per_day as u32,
                max_games_per_week: row.max_games_per_week as u32,
                travel_radius_km: row.travel_radius_km,
                hourly_rate: row.hourly_rate,
                active: row.active,
            },
            specialties: serde_json::from_value::<Vec<String>>(row.specialties.clone())
                .unwrap_or_default()
                .iter()
                .filter_map(|s| db::convert::specialty_from_str(s).ok())
                .collect(),
            home: match (row.home_latitude, row.home_longitude) {
                (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
                _ => None,
            },
        })
        .collect();

    Ok((games, venues, teams, officials, game_ext, official_ext))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::from_path(Path::new(".env"));
    env_logger::init();

    let args = Args::parse();

    let db_url = args
        .db_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .context("`DATABASE_URL` was not set, and no database url was supplied via `--db`")?;

    let config = db::Config::new(db_url);
    let client = db::Client::new(&config).await?;

    match args.cmd {
        Commands::Migrate => {
            client.up().await?;
            println!("migrations applied");
        }

        Commands::Season { cmd } => match cmd {
            SeasonCommands::List { tenant } => {
                let seasons = client.get_seasons(tenant).await?;
                println!("{}", serde_json::to_string_pretty(&seasons)?);
            }
            SeasonCommands::Create { tenant, name, start, end } => {
                let season = client.create_season(tenant, name, start, end).await?;
                println!("{}", serde_json::to_string_pretty(&season)?);
            }
        },

        Commands::Schedule { cmd } => match cmd {
            ScheduleCommands::Generate { tenant, season, publish } => {
                let season_row = client
                    .get_season(tenant, season)
                    .await?
                    .context("season not found")?;

                let (divisions, venues, blackouts) =
                    load_schedule_inputs(&client, tenant, season_row.id).await?;

                let route_provider = HaversineFallback::default();
                let detector = ConflictDetector::new(&route_provider);
                let generator = ScheduleGenerator::new(&detector);
                let result = generator.generate(
                    &GenerationParams::default(),
                    season_row.start_date,
                    season_row.end_date,
                    &divisions,
                    &venues,
                    &blackouts,
                    chrono::Utc::now(),
                );

                log::info!(
                    "generated {}/{} games ({} with conflicts) in {}ms",
                    result.statistics.scheduled,
                    result.statistics.total_games,
                    result.statistics.with_conflicts,
                    result.statistics.generation_time_ms
                );
                println!("{}", serde_json::to_string_pretty(&result)?);

                if publish {
                    let cache = InMemoryCache::default();
                    let domain_games: Vec<Game> = result
                        .games
                        .iter()
                        .map(|g| Game {
                            id: Uuid::new_v4(),
                            season_id: season,
                            division_id: g.division_id,
                            home_team_id: g.home_team_id,
                            away_team_id: g.away_team_id,
                            venue_id: g.venue_id,
                            game_number: g.game_number.clone(),
                            game_type: g.game_type,
                            scheduled_start: g.scheduled_start,
                            duration_minutes: g.estimated_duration_minutes,
                            status: GameStatus::Scheduled,
                        })
                        .collect();
                    client.cache_generated_schedule(&cache, tenant, season, &domain_games);

                    let division_rows = client.get_divisions_for_season(tenant, season_row.id).await?;
                    let mut team_rows = vec![];
                    for division in &division_rows {
                        team_rows.extend(client.get_teams_for_division(division.id).await?);
                    }
                    let venue_rows = client.get_venues(tenant).await?;

                    let division_lookup = db::external_id_lookup(&division_rows);
                    let team_lookup = db::external_id_lookup(&team_rows);
                    let venue_lookup = db::external_id_lookup(&venue_rows);

                    let inserted = client
                        .publish_cached_schedule(
                            &cache,
                            tenant,
                            season,
                            season_row.id,
                            &division_lookup,
                            &team_lookup,
                            &venue_lookup,
                        )
                        .await?;
                    println!("published {} games", inserted.len());
                }
            }
        },

        Commands::Conflicts { tenant, season } => {
            let season_row = client
                .get_season(tenant, season)
                .await?
                .context("season not found")?;

            let (games, venues, teams, officials, _, _) =
                load_season_snapshot(&client, tenant, season_row.id).await?;

            let venue_rows = client.get_venues(tenant).await?;
            let mut rules = vec![];
            for venue in &venue_rows {
                rules.extend(
                    client
                        .get_availability_rules_for_venue(venue.id)
                        .await?
                        .into_iter()
                        .map(|row| backend::model::VenueAvailabilityRule {
                            id: row.external_id,
                            venue_id: venue.external_id,
                            day_of_week: db::convert::day_of_week_from_str(&row.day_of_week)
                                .unwrap_or(backend::model::DayOfWeek::Mon),
                            start_minute: row.start_minute as u32,
                            end_minute: row.end_minute as u32,
                            kind: db::convert::availability_kind_from_str(&row.kind)
                                .unwrap_or(backend::model::AvailabilityKind::Available),
                            priority: row.priority,
                            expiry_date: row.expiry_date,
                        }),
                );
            }

            let blackouts = client
                .get_blackout_dates_for_season(season_row.id)
                .await?
                .into_iter()
                .map(|row| BlackoutDate {
                    id: row.external_id,
                    season_id: Uuid::nil(),
                    start_date: row.start_date,
                    end_date: row.end_date,
                    affects_venues: serde_json::from_value(row.affects_venues).unwrap_or_default(),
                    affects_divisions: serde_json::from_value(row.affects_divisions).unwrap_or_default(),
                })
                .collect();

            let route_provider = HaversineFallback::default();
            let detector = ConflictDetector::new(&route_provider);
            let conflicts = detector.detect(&games, &venues, &rules, &blackouts, &teams, &officials, &[], chrono::Utc::now());

            println!("{}", serde_json::to_string_pretty(&conflicts)?);
        }

        Commands::Officials { cmd } => match cmd {
            OfficialsCommands::Optimize { tenant, season } => {
                let season_row = client
                    .get_season(tenant, season)
                    .await?
                    .context("season not found")?;

                let division_rows = client.get_divisions_for_season(tenant, season_row.id).await?;
                let skill_by_division_row: HashMap<i32, SkillLevel> = division_rows
                    .iter()
                    .map(|d| {
                        (
                            d.id,
                            db::convert::skill_level_from_str(&d.skill_level).unwrap_or(SkillLevel::Beginner),
                        )
                    })
                    .collect();

                let venue_rows = client.get_venues(tenant).await?;
                let venue_geo: HashMap<Uuid, GeoPoint> = venue_rows
                    .iter()
                    .filter_map(|v| match (v.latitude, v.longitude) {
                        (Some(latitude), Some(longitude)) => Some((v.external_id, GeoPoint { latitude, longitude })),
                        _ => None,
                    })
                    .collect();

                let (games, _, _, officials, game_ext, official_ext) =
                    load_season_snapshot(&client, tenant, season_row.id).await?;
                let games_with_skill: Vec<(Game, SkillLevel)> = games
                    .into_iter()
                    .filter(|g| g.status != GameStatus::Cancelled)
                    .map(|g| {
                        let division_row_id = division_rows.iter().find(|d| d.external_id == g.division_id).map(|d| d.id);
                        let skill = division_row_id
                            .and_then(|id| skill_by_division_row.get(&id).copied())
                            .unwrap_or(SkillLevel::Beginner);
                        (g, skill)
                    })
                    .collect();

                let route_provider = HaversineFallback::default();
                let optimizer = OfficialsOptimizer::new(&route_provider);
                let result = optimizer.optimize(&games_with_skill, &officials, &venue_geo, chrono::Utc::now());

                for tentative in &result.assignments {
                    let game_row_id = game_ext.iter().find(|(_, ext)| **ext == tentative.game_id).map(|(id, _)| *id);
                    let official_row_id = official_ext
                        .iter()
                        .find(|(_, ext)| **ext == tentative.official_id)
                        .map(|(id, _)| *id);
                    let (Some(game_row_id), Some(official_row_id)) = (game_row_id, official_row_id) else {
                        continue;
                    };
                    let assignment = backend::model::Assignment {
                        id: Uuid::new_v4(),
                        game_id: tentative.game_id,
                        official_id: tentative.official_id,
                        role: tentative.role,
                        status: tentative.status,
                        pay_rate: tentative.pay_rate,
                        estimated_pay: tentative.estimated_pay,
                    };
                    client.create_assignment(tenant, game_row_id, official_row_id, assignment).await?;
                }

                println!("{}", serde_json::to_string_pretty(&result)?);
            }

            OfficialsCommands::Payroll { tenant, season, from, to } => {
                let season_row = client
                    .get_season(tenant, season)
                    .await?
                    .context("season not found")?;

                let official_rows = client.get_officials(tenant).await?;
                let official_by_row: HashMap<i32, &db::official::Model> =
                    official_rows.iter().map(|o| (o.id, o)).collect();

                let game_rows = client.get_games_for_season(season_row.id).await?;
                let mut rows = vec![];
                for game in &game_rows {
                    let date = game.scheduled_start.date_naive();
                    if from.is_some_and(|f| date < f) || to.is_some_and(|t| date > t) {
                        continue;
                    }
                    for assignment in client.get_assignments_for_game(game.id).await? {
                        let Some(official) = official_by_row.get(&assignment.official_id) else {
                            continue;
                        };
                        let status = db::convert::assignment_status_from_str(&assignment.status)
                            .unwrap_or(backend::model::AssignmentStatus::Pending);
                        if status != backend::model::AssignmentStatus::Confirmed {
                            continue;
                        }
                        let role = db::convert::specialty_from_str(&assignment.role)
                            .unwrap_or(backend::model::OfficialSpecialty::HeadReferee);
                        rows.push(PayrollRow {
                            official_id: official.external_id,
                            official_name: official.name.clone(),
                            game_date: date,
                            game_number: game.game_number.clone(),
                            role,
                            hours: game.duration_minutes as f64 / 60.0,
                            hourly_rate: assignment.pay_rate,
                            total_pay: assignment.estimated_pay,
                            status,
                        });
                    }
                }

                print!("{}", payroll_csv(&rows));
            }
        },
    }

    Ok(())
}
