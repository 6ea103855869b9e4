use std::sync::Arc;

use actix_web::web;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use backend::model::SkillLevel;

use crate::auth::Principal;
use crate::error::{ api_not_found, ok_json, created_json, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSeasonRequest {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct SeasonResponse {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<db::season::Model> for SeasonResponse {
    fn from(row: db::season::Model) -> Self {
        SeasonResponse {
            id: row.external_id,
            name: row.name,
            status: row.status,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

pub async fn create_season(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    body: web::Json<CreateSeasonRequest>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    let body = body.into_inner();
    let row = state
        .db
        .create_season(principal.tenant_id, body.name, body.start_date, body.end_date)
        .await?;
    Ok(created_json(SeasonResponse::from(row)))
}

pub async fn list_seasons(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
) -> ApiResult<actix_web::HttpResponse> {
    let rows = state.db.get_seasons(principal.tenant_id).await?;
    Ok(ok_json(
        rows.into_iter().map(SeasonResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn get_season(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<actix_web::HttpResponse> {
    let season_id = path.into_inner();
    let row = state
        .db
        .get_season(principal.tenant_id, season_id)
        .await?
        .ok_or_else(|| api_not_found("season", season_id))?;
    Ok(ok_json(SeasonResponse::from(row)))
}

#[derive(Debug, Deserialize)]
pub struct CreateDivisionRequest {
    pub name: String,
    pub skill_level: SkillLevel,
}

#[derive(Debug, Serialize)]
pub struct DivisionResponse {
    pub id: Uuid,
    pub name: String,
    pub skill_level: SkillLevel,
}

pub async fn create_division(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<CreateDivisionRequest>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    let season_id = path.into_inner();
    let season = state
        .db
        .get_season(principal.tenant_id, season_id)
        .await?
        .ok_or_else(|| api_not_found("season", season_id))?;

    let body = body.into_inner();
    let row = state
        .db
        .create_division(principal.tenant_id, season.id, body.name, body.skill_level)
        .await?;
    Ok(created_json(DivisionResponse {
        id: row.external_id,
        name: row.name,
        skill_level: body.skill_level,
    }))
}

pub async fn list_divisions(
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

    let rows = state
        .db
        .get_divisions_for_season(principal.tenant_id, season.id)
        .await?;
    Ok(ok_json(
        rows.into_iter()
            .map(|row| {
                let skill_level = db::convert::skill_level_from_str(&row.skill_level)
                    .unwrap_or(SkillLevel::Beginner);
                DivisionResponse {
                    id: row.external_id,
                    name: row.name,
                    skill_level,
                }
            })
            .collect::<Vec<_>>(),
    ))
}
