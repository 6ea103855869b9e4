use std::sync::Arc;

use actix_web::web;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use backend::model::{BlackoutDate, Team};

use crate::auth::Principal;
use crate::error::{api_not_found, created_json, ok_json, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub preferred_venues: Vec<Uuid>,
    pub blackout_dates: Vec<NaiveDate>,
    pub max_games_per_week: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub preferred_venues: Vec<Uuid>,
    pub blackout_dates: Vec<NaiveDate>,
    pub max_games_per_week: Option<u32>,
}

impl TeamResponse {
    fn from_row(row: db::team::Model) -> Self {
        TeamResponse {
            id: row.external_id,
            name: row.name,
            preferred_venues: serde_json::from_value(row.preferred_venues).unwrap_or_default(),
            blackout_dates: serde_json::from_value(row.blackout_dates).unwrap_or_default(),
            max_games_per_week: row.max_games_per_week.map(|n| n as u32),
        }
    }
}

pub async fn create_team(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<CreateTeamRequest>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    let division_id = path.into_inner();

    // Divisions aren't looked up by external id anywhere else yet, so we
    // search across the tenant's seasons to resolve the division row.
    let seasons = state.db.get_seasons(principal.tenant_id).await?;
    let mut division_row_id = None;
    for season in &seasons {
        let divisions = state
            .db
            .get_divisions_for_season(principal.tenant_id, season.id)
            .await?;
        if let Some(d) = divisions.into_iter().find(|d| d.external_id == division_id) {
            division_row_id = Some(d.id);
            break;
        }
    }
    let division_row_id = division_row_id.ok_or_else(|| api_not_found("division", division_id))?;

    let body = body.into_inner();
    let team = Team {
        id: Uuid::new_v4(),
        name: body.name,
        division_id,
        preferred_venues: body.preferred_venues,
        blackout_dates: body.blackout_dates,
        max_games_per_week: body.max_games_per_week,
    };

    let row = state.db.create_team(principal.tenant_id, division_row_id, team).await?;
    Ok(created_json(TeamResponse::from_row(row)))
}

pub async fn list_teams(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<actix_web::HttpResponse> {
    let division_id = path.into_inner();
    let seasons = state.db.get_seasons(principal.tenant_id).await?;
    let mut division_row_id = None;
    for season in &seasons {
        let divisions = state
            .db
            .get_divisions_for_season(principal.tenant_id, season.id)
            .await?;
        if let Some(d) = divisions.into_iter().find(|d| d.external_id == division_id) {
            division_row_id = Some(d.id);
            break;
        }
    }
    let division_row_id = division_row_id.ok_or_else(|| api_not_found("division", division_id))?;

    let rows = state.db.get_teams_for_division(division_row_id).await?;
    Ok(ok_json(rows.into_iter().map(TeamResponse::from_row).collect::<Vec<_>>()))
}

#[derive(Debug, Deserialize)]
pub struct CreateBlackoutDateRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub affects_venues: Vec<Uuid>,
    pub affects_divisions: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BlackoutDateResponse {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub affects_venues: Vec<Uuid>,
    pub affects_divisions: Vec<Uuid>,
}

impl BlackoutDateResponse {
    fn from_row(row: db::blackout_date::Model) -> Self {
        BlackoutDateResponse {
            id: row.external_id,
            start_date: row.start_date,
            end_date: row.end_date,
            affects_venues: serde_json::from_value(row.affects_venues).unwrap_or_default(),
            affects_divisions: serde_json::from_value(row.affects_divisions).unwrap_or_default(),
        }
    }
}

pub async fn create_blackout_date(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<CreateBlackoutDateRequest>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    let season_id = path.into_inner();
    let season = state
        .db
        .get_season(principal.tenant_id, season_id)
        .await?
        .ok_or_else(|| api_not_found("season", season_id))?;

    let body = body.into_inner();
    let blackout = BlackoutDate {
        id: Uuid::new_v4(),
        season_id,
        start_date: body.start_date,
        end_date: body.end_date,
        affects_venues: body.affects_venues,
        affects_divisions: body.affects_divisions,
    };

    let row = state.db.create_blackout_date(principal.tenant_id, season.id, blackout).await?;
    Ok(created_json(BlackoutDateResponse::from_row(row)))
}

pub async fn list_blackout_dates(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<actix_web::HttpResponse> {
    let season_id = path.into_inner();
    let season = state
        .db
        .get_season(principal.tenant_id, season_id)
        .await?
        .ok_or_else(|| api_not_found("season", season_id))?;

    let rows = state.db.get_blackout_dates_for_season(season.id).await?;
    Ok(ok_json(
        rows.into_iter().map(BlackoutDateResponse::from_row).collect::<Vec<_>>(),
    ))
}
