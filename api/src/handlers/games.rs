use std::sync::Arc;

use actix_web::web;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use backend::conflicts::{Conflict, ConflictDetector};
use backend::model::{GameStatus, GameType, Venue};

use crate::auth::Principal;
use crate::error::{api_not_found, ok_json, ApiError, ApiResult};
use crate::state::AppState;

/// Row ids only need to compare equal to themselves within one request's
/// conflict check, so a game/venue row id is embedded directly rather than
/// resolved through `external_id_lookup` (which exists for the write path).
fn row_uuid(id: i32) -> Uuid {
    Uuid::from_u128(id as u128)
}

fn row_to_backend_game(row: &db::game::Model) -> backend::model::Game {
    backend::model::Game {
        id: row.external_id,
        season_id: Uuid::nil(),
        division_id: row_uuid(row.division_id),
        home_team_id: row_uuid(row.home_team_id),
        away_team_id: row_uuid(row.away_team_id),
        venue_id: row_uuid(row.venue_id),
        game_number: row.game_number.clone(),
        game_type: db::convert::game_type_from_str(&row.game_type).unwrap_or(GameType::Regular),
        scheduled_start: row.scheduled_start,
        duration_minutes: row.duration_minutes as u32,
        status: db::convert::game_status_from_str(&row.status).unwrap_or(GameStatus::Scheduled),
    }
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub id: Uuid,
    pub game_number: String,
    pub game_type: GameType,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: GameStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub cancelled_reason: Option<String>,
}

impl GameResponse {
    fn from_row(row: db::game::Model) -> Self {
        GameResponse {
            id: row.external_id,
            game_number: row.game_number,
            game_type: db::convert::game_type_from_str(&row.game_type).unwrap_or(GameType::Regular),
            scheduled_start: row.scheduled_start,
            duration_minutes: row.duration_minutes,
            status: db::convert::game_status_from_str(&row.status).unwrap_or(GameStatus::Scheduled),
            home_score: row.home_score,
            away_score: row.away_score,
            cancelled_reason: row.cancelled_reason,
        }
    }
}

pub async fn get_game(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<actix_web::HttpResponse> {
    let game_id = path.into_inner();
    let row = state
        .db
        .get_game(principal.tenant_id, game_id)
        .await?
        .ok_or_else(|| api_not_found("game", game_id))?;
    Ok(ok_json(GameResponse::from_row(row)))
}

#[derive(Debug, Deserialize)]
pub struct RescheduleGameRequest {
    pub new_time: DateTime<Utc>,
    pub new_venue_id: Option<Uuid>,
    pub reason: String,
}

pub async fn reschedule_game(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<RescheduleGameRequest>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    let game_id = path.into_inner();
    let body = body.into_inner();

    let existing = state
        .db
        .get_game(principal.tenant_id, game_id)
        .await?
        .ok_or_else(|| api_not_found("game", game_id))?;

    let venue_rows = state.db.get_venues(principal.tenant_id).await?;
    let target_venue_row_id = match body.new_venue_id {
        Some(v) => {
            let row = venue_rows
                .iter()
                .find(|r| r.external_id == v)
                .ok_or_else(|| api_not_found("venue", v))?;
            row.id
        }
        None => existing.venue_id,
    };
    let target_venue_row = venue_rows
        .iter()
        .find(|r| r.id == target_venue_row_id)
        .ok_or_else(|| api_not_found("venue", body.new_venue_id.unwrap_or_default()))?;

    let venue = Venue {
        id: row_uuid(target_venue_row.id),
        name: target_venue_row.name.clone(),
        venue_type: db::convert::venue_type_from_str(&target_venue_row.venue_type)
            .unwrap_or(backend::model::VenueType::Indoor),
        geo: match (target_venue_row.latitude, target_venue_row.longitude) {
            (Some(latitude), Some(longitude)) => {
                Some(backend::model::GeoPoint { latitude, longitude })
            }
            _ => None,
        },
        active: target_venue_row.active,
        city: target_venue_row.city.clone(),
        state: target_venue_row.state.clone(),
    };

    let season_games = state.db.get_games_for_season(existing.season_id).await?;
    let existing_domain: Vec<backend::model::Game> =
        season_games.iter().map(row_to_backend_game).collect();

    let detector = ConflictDetector::new(state.route_provider.as_ref());
    let conflicts: Vec<Conflict> = detector.detect_game_conflicts(
        &venue,
        body.new_time,
        existing.duration_minutes as u32,
        &[row_uuid(existing.home_team_id), row_uuid(existing.away_team_id)],
        &existing_domain,
        Some(existing.external_id),
        state.clock.now(),
    );

    if !conflicts.is_empty() {
        return Err(ApiError::Conflict(format!(
            "reschedule would produce {} conflict(s): {}",
            conflicts.len(),
            conflicts
                .iter()
                .map(|c| format!("{:?}", c.conflict_type))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let new_venue_row_id = body.new_venue_id.map(|_| target_venue_row_id);
    let row = state
        .db
        .reschedule_game(principal.tenant_id, game_id, body.new_time, new_venue_row_id)
        .await?;
    Ok(ok_json(GameResponse::from_row(row)))
}

#[derive(Debug, Deserialize)]
pub struct CancelGameRequest {
    pub reason: String,
}

pub async fn cancel_game(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<CancelGameRequest>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    let game_id = path.into_inner();
    let row = state
        .db
        .cancel_game(principal.tenant_id, game_id, body.into_inner().reason)
        .await?;
    Ok(ok_json(GameResponse::from_row(row)))
}
