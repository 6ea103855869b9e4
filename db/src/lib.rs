pub mod cache;
pub mod convert;
pub mod errors;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionError, TransactionTrait,
};
use uuid::Uuid;

use backend::model::{
    Assignment, AssignmentStatus, BlackoutDate, Game, GameStatus, OfficialProfile, Team, Venue,
    VenueAvailabilityRule,
};
use cache::{tenant_key, CachePort};
use convert::*;
use errors::*;

pub use entity::*;
pub use sea_orm::DeleteResult;

pub type DBResult<T> = Result<T, DbErr>;

const SCHEDULE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    connection_url: String,
}

impl Config {
    pub fn new(connection_url: impl Into<String>) -> Self {
        Self {
            connection_url: connection_url.into(),
        }
    }
}

#[derive(Debug)]
pub struct Client {
    connection: DatabaseConnection,
}

impl Client {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db = Database::connect(&config.connection_url).await?;

        if db.ping().await.is_err() {
            anyhow::bail!("database did not respond to ping");
        }

        let result = Client { connection: db };
        result.up().await?;
        Ok(result)
    }

    pub async fn up(&self) -> DBResult<()> {
        Migrator::up(&self.connection, None).await
    }

    pub async fn refresh(&self) -> DBResult<()> {
        Migrator::refresh(&self.connection).await
    }

    // -- seasons ---------------------------------------------------------

    pub async fn create_season(
        &self,
        tenant_id: Uuid,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<season::Model, CreateSeasonError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SeasonNameValidationError::EmptyName.into());
        }
        if trimmed.len() > 120 {
            return Err(SeasonNameValidationError::NameTooLong { len: trimmed.len() }.into());
        }
        if start_date > end_date {
            return Err(SeasonNameValidationError::InvertedRange {
                start: start_date.to_string(),
                end: end_date.to_string(),
            }
            .into());
        }

        season::Entity::insert(season::ActiveModel {
            external_id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(trimmed.to_string()),
            status: Set(season_status_to_str(backend::model::SeasonStatus::Upcoming)),
            start_date: Set(start_date),
            end_date: Set(end_date),
            ..Default::default()
        })
        .exec_with_returning(&self.connection)
        .await
        .map_err(|e| CreateSeasonError::DatabaseError(e.to_string()))
    }

    pub async fn get_seasons(&self, tenant_id: Uuid) -> DBResult<Vec<season::Model>> {
        season::Entity::find()
            .filter(season::Column::TenantId.eq(tenant_id))
            .all(&self.connection)
            .await
    }

    pub async fn get_season(&self, tenant_id: Uuid, id: Uuid) -> DBResult<Option<season::Model>> {
        season::Entity::find()
            .filter(season::Column::TenantId.eq(tenant_id))
            .filter(season::Column::ExternalId.eq(id))
            .one(&self.connection)
            .await
    }

    // -- divisions --------------------------------------------------------

    pub async fn create_division(
        &self,
        tenant_id: Uuid,
        season_row_id: i32,
        name: String,
        skill_level: backend::model::SkillLevel,
    ) -> DBResult<division::Model> {
        division::Entity::insert(division::ActiveModel {
            external_id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            season_id: Set(season_row_id),
            name: Set(name),
            skill_level: Set(skill_level_to_str(skill_level)),
            ..Default::default()
        })
        .exec_with_returning(&self.connection)
        .await
    }

    pub async fn get_divisions_for_season(
        &self,
        tenant_id: Uuid,
        season_row_id: i32,
    ) -> DBResult<Vec<division::Model>> {
        division::Entity::find()
            .filter(division::Column::TenantId.eq(tenant_id))
            .filter(division::Column::SeasonId.eq(season_row_id))
            .all(&self.connection)
            .await
    }

    // -- venues ------------------------------------------------------------

    pub async fn create_venue(
        &self,
        tenant_id: Uuid,
        venue: Venue,
    ) -> Result<venue::Model, CreateVenueError> {
        if venue.name.trim().is_empty() {
            return Err(CreateVenueError::EmptyName);
        }

        venue::Entity::insert(venue::ActiveModel {
            external_id: Set(venue.id),
            tenant_id: Set(tenant_id),
            name: Set(venue.name),
            venue_type: Set(venue_type_to_str(venue.venue_type)),
            latitude: Set(venue.geo.map(|g| g.latitude)),
            longitude: Set(venue.geo.map(|g| g.longitude)),
            active: Set(venue.active),
            city: Set(venue.city),
            state: Set(venue.state),
            ..Default::default()
        })
        .exec_with_returning(&self.connection)
        .await
        .map_err(|e| CreateVenueError::DatabaseError(e.to_string()))
    }

    pub async fn get_venues(&self, tenant_id: Uuid) -> DBResult<Vec<venue::Model>> {
        venue::Entity::find()
            .filter(venue::Column::TenantId.eq(tenant_id))
            .all(&self.connection)
            .await
    }

    /// Refuses deletion while the venue is referenced by a non-cancelled
    /// game: venue deletion never orphans a scheduled game.
    pub async fn delete_venue(
        &self,
        tenant_id: Uuid,
        venue_external_id: Uuid,
    ) -> Result<(), DeleteVenueError> {
        let row = venue::Entity::find()
            .filter(venue::Column::TenantId.eq(tenant_id))
            .filter(venue::Column::ExternalId.eq(venue_external_id))
            .one(&self.connection)
            .await
            .map_err(|e| DeleteVenueError::DatabaseError(e.to_string()))?
            .ok_or(DeleteVenueError::NotFound(venue_external_id))?;

        let still_referenced = game::Entity::find()
            .filter(game::Column::VenueId.eq(row.id))
            .filter(game::Column::Status.ne(game_status_to_str(GameStatus::Cancelled)))
            .count(&self.connection)
            .await
            .map_err(|e| DeleteVenueError::DatabaseError(e.to_string()))?
            > 0;

        if still_referenced {
            return Err(DeleteVenueError::StillReferenced(venue_external_id));
        }

        row.delete(&self.connection)
            .await
            .map_err(|e| DeleteVenueError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    pub async fn create_venue_availability_rule(
        &self,
        tenant_id: Uuid,
        venue_row_id: i32,
        rule: VenueAvailabilityRule,
    ) -> DBResult<venue_availability_rule::Model> {
        venue_availability_rule::Entity::insert(venue_availability_rule::ActiveModel {
            external_id: Set(rule.id),
            tenant_id: Set(tenant_id),
            venue_id: Set(venue_row_id),
            day_of_week: Set(day_of_week_to_str(rule.day_of_week)),
            start_minute: Set(rule.start_minute),
            end_minute: Set(rule.end_minute),
            kind: Set(availability_kind_to_str(rule.kind)),
            priority: Set(rule.priority),
            expiry_date: Set(rule.expiry_date),
            ..Default::default()
        })
        .exec_with_returning(&self.connection)
        .await
    }

    pub async fn get_availability_rules_for_venue(
        &self,
        venue_row_id: i32,
    ) -> DBResult<Vec<venue_availability_rule::Model>> {
        venue_availability_rule::Entity::find()
            .filter(venue_availability_rule::Column::VenueId.eq(venue_row_id))
            .all(&self.connection)
            .await
    }

    // -- teams ---------------------------------------------------------------

    pub async fn create_team(
        &self,
        tenant_id: Uuid,
        division_row_id: i32,
        team: Team,
    ) -> DBResult<team::Model> {
        team::Entity::insert(team::ActiveModel {
            external_id: Set(team.id),
            tenant_id: Set(tenant_id),
            division_id: Set(division_row_id),
            name: Set(team.name),
            preferred_venues: Set(serde_json::to_value(&team.preferred_venues).unwrap()),
            blackout_dates: Set(serde_json::to_value(&team.blackout_dates).unwrap()),
            max_games_per_week: Set(team.max_games_per_week.map(|n| n as i32)),
            ..Default::default()
        })
        .exec_with_returning(&self.connection)
        .await
    }

    pub async fn get_teams_for_division(
        &self,
        division_row_id: i32,
    ) -> DBResult<Vec<team::Model>> {
        team::Entity::find()
            .filter(team::Column::DivisionId.eq(division_row_id))
            .all(&self.connection)
            .await
    }

    // -- blackout dates --------------------------------------------------------

    pub async fn create_blackout_date(
        &self,
        tenant_id: Uuid,
        season_row_id: i32,
        blackout: BlackoutDate,
    ) -> DBResult<blackout_date::Model> {
        blackout_date::Entity::insert(blackout_date::ActiveModel {
            external_id: Set(blackout.id),
            tenant_id: Set(tenant_id),
            season_id: Set(season_row_id),
            start_date: Set(blackout.start_date),
            end_date: Set(blackout.end_date),
            affects_venues: Set(serde_json::to_value(&blackout.affects_venues).unwrap()),
            affects_divisions: Set(serde_json::to_value(&blackout.affects_divisions).unwrap()),
            ..Default::default()
        })
        .exec_with_returning(&self.connection)
        .await
    }

    pub async fn get_blackout_dates_for_season(
        &self,
        season_row_id: i32,
    ) -> DBResult<Vec<blackout_date::Model>> {
        blackout_date::Entity::find()
            .filter(blackout_date::Column::SeasonId.eq(season_row_id))
            .all(&self.connection)
            .await
    }

    // -- games -----------------------------------------------------------------

    /// Inserts an entire generated schedule inside one transaction: either
    /// every game lands, or none do.
    ///
    /// `games` carry domain (`Uuid`) foreign keys; `divisions`/`teams`/
    /// `venues` translate those to row ids via [`external_id_lookup`] --
    /// callers build these from whatever rows they just loaded or inserted.
    pub async fn bulk_insert_games(
        &self,
        tenant_id: Uuid,
        season_row_id: i32,
        games: Vec<Game>,
        divisions: &HashMap<Uuid, i32>,
        teams: &HashMap<Uuid, i32>,
        venues: &HashMap<Uuid, i32>,
    ) -> Result<Vec<game::Model>, BulkInsertGamesError> {
        let count = games.len();
        let mut active_models = Vec::with_capacity(count);
        for g in &games {
            let division_id = *divisions
                .get(&g.division_id)
                .ok_or(BulkInsertGamesError::UnknownForeignKey(g.division_id))?;
            let home_team_id = *teams
                .get(&g.home_team_id)
                .ok_or(BulkInsertGamesError::UnknownForeignKey(g.home_team_id))?;
            let away_team_id = *teams
                .get(&g.away_team_id)
                .ok_or(BulkInsertGamesError::UnknownForeignKey(g.away_team_id))?;
            let venue_id = *venues
                .get(&g.venue_id)
                .ok_or(BulkInsertGamesError::UnknownForeignKey(g.venue_id))?;

            active_models.push(game::ActiveModel {
                external_id: Set(g.id),
                tenant_id: Set(tenant_id),
                season_id: Set(season_row_id),
                division_id: Set(division_id),
                home_team_id: Set(home_team_id),
                away_team_id: Set(away_team_id),
                venue_id: Set(venue_id),
                game_number: Set(g.game_number.clone()),
                game_type: Set(game_type_to_str(g.game_type)),
                scheduled_start: Set(g.scheduled_start),
                duration_minutes: Set(g.duration_minutes as i32),
                status: Set(game_status_to_str(g.status)),
                home_score: Set(None),
                away_score: Set(None),
                cancelled_reason: Set(None),
                notes: Set(None),
                ..Default::default()
            });
        }

        self.connection
            .transaction::<_, Vec<game::Model>, DbErr>(|txn| {
                Box::pin(async move {
                    let mut inserted = Vec::with_capacity(active_models.len());
                    for active in active_models {
                        inserted.push(game::Entity::insert(active).exec_with_returning(txn).await?);
                    }
                    Ok(inserted)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => BulkInsertGamesError::TransactionFailed {
                    count,
                    source: db.to_string(),
                },
                TransactionError::Transaction(db) => BulkInsertGamesError::TransactionFailed {
                    count,
                    source: db.to_string(),
                },
            })
    }

    pub async fn get_games_for_season(&self, season_row_id: i32) -> DBResult<Vec<game::Model>> {
        game::Entity::find()
            .filter(game::Column::SeasonId.eq(season_row_id))
            .order_by(game::Column::ScheduledStart, Order::Asc)
            .all(&self.connection)
            .await
    }

    pub async fn get_game(&self, tenant_id: Uuid, id: Uuid) -> DBResult<Option<game::Model>> {
        game::Entity::find()
            .filter(game::Column::TenantId.eq(tenant_id))
            .filter(game::Column::ExternalId.eq(id))
            .one(&self.connection)
            .await
    }

    /// Returns the games at `venue_row_id` whose buffered window overlaps
    /// `[start, end)`, for the per-game "would this placement conflict"
    /// check.
    pub async fn find_conflicts_at(
        &self,
        venue_row_id: i32,
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    ) -> Result<Vec<game::Model>, FindConflictsAtError> {
        game::Entity::find()
            .filter(game::Column::VenueId.eq(venue_row_id))
            .filter(game::Column::Status.ne(game_status_to_str(GameStatus::Cancelled)))
            .all(&self.connection)
            .await
            .map(|rows| {
                rows.into_iter()
                    .filter(|g| {
                        let g_end = g.scheduled_start
                            + chrono::Duration::minutes(g.duration_minutes as i64);
                        g.scheduled_start < end && start < g_end
                    })
                    .collect()
            })
            .map_err(|e| FindConflictsAtError::DatabaseError(e.to_string()))
    }

    pub async fn reschedule_game(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        new_start: chrono::DateTime<Utc>,
        new_venue_row_id: Option<i32>,
    ) -> Result<game::Model, RescheduleGameError> {
        let row = game::Entity::find()
            .filter(game::Column::TenantId.eq(tenant_id))
            .filter(game::Column::ExternalId.eq(id))
            .one(&self.connection)
            .await
            .map_err(|e| RescheduleGameError::DatabaseError(e.to_string()))?
            .ok_or(RescheduleGameError::NotFound(id))?;

        let mut active: game::ActiveModel = row.into();
        active.scheduled_start = Set(new_start);
        if let Some(venue_row_id) = new_venue_row_id {
            active.venue_id = Set(venue_row_id);
        }
        active
            .update(&self.connection)
            .await
            .map_err(|e| RescheduleGameError::DatabaseError(e.to_string()))
    }

    pub async fn cancel_game(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        reason: String,
    ) -> Result<game::Model, RescheduleGameError> {
        let row = game::Entity::find()
            .filter(game::Column::TenantId.eq(tenant_id))
            .filter(game::Column::ExternalId.eq(id))
            .one(&self.connection)
            .await
            .map_err(|e| RescheduleGameError::DatabaseError(e.to_string()))?
            .ok_or(RescheduleGameError::NotFound(id))?;

        let mut active: game::ActiveModel = row.into();
        active.status = Set(game_status_to_str(GameStatus::Cancelled));
        active.cancelled_reason = Set(Some(reason));
        active
            .update(&self.connection)
            .await
            .map_err(|e| RescheduleGameError::DatabaseError(e.to_string()))
    }

    // -- officials & assignments -------------------------------------------------

    pub async fn create_official(
        &self,
        tenant_id: Uuid,
        name: String,
        profile: OfficialProfile,
    ) -> Result<official::Model, LoadOfficialsError> {
        official::Entity::insert(official::ActiveModel {
            external_id: Set(profile.official.id),
            tenant_id: Set(tenant_id),
            name: Set(name),
            certification: Set(certification_to_str(profile.official.certification)),
            specialties: Set(serde_json::to_value(
                profile
                    .specialties
                    .iter()
                    .map(|s| specialty_to_str(*s))
                    .collect::<Vec<_>>(),
            )
            .unwrap()),
            max_games_per_day: Set(profile.official.max_games_per_day as i32),
            max_games_per_week: Set(profile.official.max_games_per_week as i32),
            travel_radius_km: Set(profile.official.travel_radius_km),
            hourly_rate: Set(profile.official.hourly_rate),
            home_latitude: Set(profile.home.map(|g| g.latitude)),
            home_longitude: Set(profile.home.map(|g| g.longitude)),
            active: Set(profile.official.active),
            ..Default::default()
        })
        .exec_with_returning(&self.connection)
        .await
        .map_err(|e| LoadOfficialsError::DatabaseError(e.to_string()))
    }

    pub async fn get_officials(&self, tenant_id: Uuid) -> Result<Vec<official::Model>, LoadOfficialsError> {
        official::Entity::find()
            .filter(official::Column::TenantId.eq(tenant_id))
            .filter(official::Column::Active.eq(true))
            .all(&self.connection)
            .await
            .map_err(|e| LoadOfficialsError::DatabaseError(e.to_string()))
    }

    pub async fn create_assignment(
        &self,
        tenant_id: Uuid,
        game_row_id: i32,
        official_row_id: i32,
        assignment: Assignment,
    ) -> DBResult<assignment::Model> {
        assignment::Entity::insert(assignment::ActiveModel {
            external_id: Set(assignment.id),
            tenant_id: Set(tenant_id),
            game_id: Set(game_row_id),
            official_id: Set(official_row_id),
            role: Set(specialty_to_str(assignment.role)),
            status: Set(assignment_status_to_str(assignment.status)),
            pay_rate: Set(assignment.pay_rate),
            estimated_pay: Set(assignment.estimated_pay),
            ..Default::default()
        })
        .exec_with_returning(&self.connection)
        .await
    }

    pub async fn get_assignments_for_game(
        &self,
        game_row_id: i32,
    ) -> DBResult<Vec<assignment::Model>> {
        assignment::Entity::find()
            .filter(assignment::Column::GameId.eq(game_row_id))
            .all(&self.connection)
            .await
    }

    pub async fn update_assignment_status(
        &self,
        id: Uuid,
        status: AssignmentStatus,
    ) -> DBResult<assignment::Model> {
        let row = assignment::Entity::find()
            .filter(assignment::Column::ExternalId.eq(id))
            .one(&self.connection)
            .await?
            .ok_or(DbErr::RecordNotFound(format!("assignment {id}")))?;
        let mut active: assignment::ActiveModel = row.into();
        active.status = Set(assignment_status_to_str(status));
        active.update(&self.connection).await
    }

    // -- schedule generation log -------------------------------------------------

    pub async fn record_generation_run(
        &self,
        tenant_id: Uuid,
        season_row_id: i32,
        status: &str,
        total_games: usize,
        scheduled: usize,
        generation_time_ms: u128,
    ) -> DBResult<schedule_generation_log::Model> {
        schedule_generation_log::Entity::insert(schedule_generation_log::ActiveModel {
            external_id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            season_id: Set(season_row_id),
            status: Set(status.to_string()),
            total_games: Set(total_games as i32),
            scheduled: Set(scheduled as i32),
            generation_time_ms: Set(generation_time_ms as i64),
            started_at: Set(Utc::now()),
            ..Default::default()
        })
        .exec_with_returning(&self.connection)
        .await
    }

    // -- generated-schedule cache -------------------------------------------

    pub fn cache_generated_schedule(
        &self,
        cache: &dyn CachePort,
        tenant_id: Uuid,
        season_id: Uuid,
        games: &[Game],
    ) {
        let key = tenant_key(tenant_id, &format!("schedule:{season_id}"));
        cache::set(cache, &key, &games, SCHEDULE_CACHE_TTL);
    }

    pub fn load_cached_schedule(
        &self,
        cache: &dyn CachePort,
        tenant_id: Uuid,
        season_id: Uuid,
    ) -> Option<Vec<Game>> {
        let key = tenant_key(tenant_id, &format!("schedule:{season_id}"));
        cache::get(cache, &key)
    }

    pub async fn publish_cached_schedule(
        &self,
        cache: &dyn CachePort,
        tenant_id: Uuid,
        season_id: Uuid,
        season_row_id: i32,
        divisions: &HashMap<Uuid, i32>,
        teams: &HashMap<Uuid, i32>,
        venues: &HashMap<Uuid, i32>,
    ) -> Result<Vec<game::Model>, PublishScheduleError> {
        let games = self
            .load_cached_schedule(cache, tenant_id, season_id)
            .ok_or(PublishScheduleError::CacheEmpty(season_id))?;

        let inserted = self
            .bulk_insert_games(tenant_id, season_row_id, games, divisions, teams, venues)
            .await?;

        cache.invalidate(&tenant_key(tenant_id, &format!("schedule:{season_id}")));
        Ok(inserted)
    }
}

/// Builds the external-id -> row-id lookup `bulk_insert_games` needs when
/// translating a freshly generated schedule back into foreign keys.
pub fn external_id_lookup<M>(rows: &[M]) -> HashMap<Uuid, i32>
where
    M: ExternalIdRow,
{
    rows.iter().map(|r| (r.external_id(), r.row_id())).collect()
}

pub trait ExternalIdRow {
    fn external_id(&self) -> Uuid;
    fn row_id(&self) -> i32;
}

impl ExternalIdRow for division::Model {
    fn external_id(&self) -> Uuid {
        self.external_id
    }
    fn row_id(&self) -> i32 {
        self.id
    }
}

impl ExternalIdRow for team::Model {
    fn external_id(&self) -> Uuid {
        self.external_id
    }
    fn row_id(&self) -> i32 {
        self.id
    }
}

impl ExternalIdRow for venue::Model {
    fn external_id(&self) -> Uuid {
        self.external_id
    }
    fn row_id(&self) -> i32 {
        self.id
    }
}
