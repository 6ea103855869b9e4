use std::sync::Arc;
use std::time::Instant;

use actix_web::web;
use serde::Serialize;
use uuid::Uuid;

use backend::conflicts::ConflictDetector;
use backend::generator::{GenerationParams, ScheduleGenerator, ScheduledGame};
use backend::model::{BlackoutDate, Game, GameStatus, Team, Venue};

use crate::auth::Principal;
use crate::error::{api_not_found, created_json, ok_json, ApiError, ApiResult};
use crate::state::AppState;

fn feature_gate(state: &AppState) -> ApiResult<()> {
    if !state.settings.feature_scheduling_v1 {
        return Err(ApiError::Forbidden("FEATURE_SCHEDULING_V1 is disabled".to_string()));
    }
    Ok(())
}

fn to_domain_game(season_id: Uuid, scheduled: &ScheduledGame) -> Game {
    Game {
        id: Uuid::new_v4(),
        season_id,
        division_id: scheduled.division_id,
        home_team_id: scheduled.home_team_id,
        away_team_id: scheduled.away_team_id,
        venue_id: scheduled.venue_id,
        game_number: scheduled.game_number.clone(),
        game_type: scheduled.game_type,
        scheduled_start: scheduled.scheduled_start,
        duration_minutes: scheduled.estimated_duration_minutes,
        status: GameStatus::Scheduled,
    }
}

/// Loads everything the generator needs for one season: divisions (each
/// with its teams), active venues, and season-wide blackout dates. All
/// returned with domain (external) ids -- the ids the generator, the
/// conflict detector, and the cache all speak in.
async fn load_generation_inputs(
    state: &AppState,
    tenant_id: Uuid,
    season_row_id: i32,
) -> ApiResult<(Vec<(Uuid, Vec<Team>)>, Vec<Venue>, Vec<BlackoutDate>)> {
    let division_rows = state.db.get_divisions_for_season(tenant_id, season_row_id).await?;

    let mut divisions = Vec::with_capacity(division_rows.len());
    for division in &division_rows {
        let team_rows = state.db.get_teams_for_division(division.id).await?;
        let teams = team_rows
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

    let venue_rows = state.db.get_venues(tenant_id).await?;
    let venues = venue_rows
        .into_iter()
        .filter(|v| v.active)
        .map(|row| Venue {
            id: row.external_id,
            name: row.name,
            venue_type: db::convert::venue_type_from_str(&row.venue_type)
                .unwrap_or(backend::model::VenueType::Indoor),
            geo: match (row.latitude, row.longitude) {
                (Some(latitude), Some(longitude)) => {
                    Some(backend::model::GeoPoint { latitude, longitude })
                }
                _ => None,
            },
            active: row.active,
            city: row.city,
            state: row.state,
        })
        .collect();

    let blackout_rows = state.db.get_blackout_dates_for_season(season_row_id).await?;
    let blackouts = blackout_rows
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

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub games: Vec<ScheduledGame>,
    pub warnings: usize,
    pub total_games: usize,
    pub scheduled: usize,
    pub with_conflicts: usize,
    pub generation_time_ms: u64,
}

pub async fn generate(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    feature_gate(&state)?;
    if let Err(retry_after_secs) = state.rate_limiters.generation.check(&principal.tenant_id.to_string()) {
        return Err(ApiError::RateLimited { retry_after_secs });
    }

    let season_id = path.into_inner();
    let season = state
        .db
        .get_season(principal.tenant_id, season_id)
        .await?
        .ok_or_else(|| api_not_found("season", season_id))?;

    let (divisions, venues, blackouts) =
        load_generation_inputs(&state, principal.tenant_id, season.id).await?;

    let started_at = Instant::now();
    let detector = ConflictDetector::new(state.route_provider.as_ref());
    let generator = ScheduleGenerator::new(&detector);
    let result = generator.generate(
        &GenerationParams::default(),
        season.start_date,
        season.end_date,
        &divisions,
        &venues,
        &blackouts,
        state.clock.now(),
    );

    let domain_games: Vec<Game> = result.games.iter().map(|g| to_domain_game(season_id, g)).collect();
    state.db.cache_generated_schedule(state.cache.as_ref(), principal.tenant_id, season_id, &domain_games);

    state
        .db
        .record_generation_run(
            principal.tenant_id,
            season.id,
            if result.success { "SUCCESS" } else { "PARTIAL" },
            result.statistics.total_games,
            result.statistics.scheduled,
            started_at.elapsed().as_millis(),
        )
        .await?;

    Ok(created_json(GenerateResponse {
        success: result.success,
        with_conflicts: result.statistics.with_conflicts,
        total_games: result.statistics.total_games,
        scheduled: result.statistics.scheduled,
        warnings: result.warnings.len(),
        generation_time_ms: result.statistics.generation_time_ms,
        games: result.games,
    }))
}

pub async fn preview(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<actix_web::HttpResponse> {
    let season_id = path.into_inner();
    let games = state
        .db
        .load_cached_schedule(state.cache.as_ref(), principal.tenant_id, season_id)
        .ok_or_else(|| ApiError::Conflict(format!("no cached plan for season {season_id}; generate first")))?;
    Ok(ok_json(games))
}

pub async fn publish(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    let season_id = path.into_inner();
    let season = state
        .db
        .get_season(principal.tenant_id, season_id)
        .await?
        .ok_or_else(|| api_not_found("season", season_id))?;

    let division_rows = state.db.get_divisions_for_season(principal.tenant_id, season.id).await?;
    let mut team_rows = vec![];
    for division in &division_rows {
        team_rows.extend(state.db.get_teams_for_division(division.id).await?);
    }
    let venue_rows = state.db.get_venues(principal.tenant_id).await?;

    let divisions = db::external_id_lookup(&division_rows);
    let teams = db::external_id_lookup(&team_rows);
    let venues = db::external_id_lookup(&venue_rows);

    let inserted = state
        .db
        .publish_cached_schedule(
            state.cache.as_ref(),
            principal.tenant_id,
            season_id,
            season.id,
            &divisions,
            &teams,
            &venues,
        )
        .await?;

    Ok(created_json(serde_json::json!({ "published_games": inserted.len() })))
}
