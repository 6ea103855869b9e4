use std::collections::HashMap;
use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use backend::model::{
    AssignmentStatus, GameStatus, GeoPoint, Official, OfficialCertification, OfficialProfile,
    OfficialSpecialty, SkillLevel,
};
use backend::officials::{payroll_csv, OfficialsOptimizer, PayrollRow};

use crate::auth::Principal;
use crate::error::{api_not_found, created_json, ok_json, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOfficialRequest {
    pub name: String,
    pub certification: OfficialCertification,
    pub specialties: Vec<OfficialSpecialty>,
    pub max_games_per_day: u32,
    pub max_games_per_week: u32,
    pub travel_radius_km: f64,
    pub hourly_rate: f64,
    pub home_latitude: Option<f64>,
    pub home_longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct OfficialResponse {
    pub id: Uuid,
    pub name: String,
    pub certification: OfficialCertification,
    pub specialties: Vec<OfficialSpecialty>,
    pub max_games_per_day: u32,
    pub max_games_per_week: u32,
    pub travel_radius_km: f64,
    pub hourly_rate: f64,
    pub active: bool,
}

fn row_to_response(row: db::official::Model) -> OfficialResponse {
    OfficialResponse {
        id: row.external_id,
        name: row.name,
        certification: db::convert::certification_from_str(&row.certification)
            .unwrap_or(OfficialCertification::Beginner),
        specialties: serde_json::from_value::<Vec<String>>(row.specialties)
            .unwrap_or_default()
            .iter()
            .filter_map(|s| db::convert::specialty_from_str(s).ok())
            .collect(),
        max_games_per_day: row.max_games_per_day as u32,
        max_games_per_week: row.max_games_per_week as u32,
        travel_radius_km: row.travel_radius_km,
        hourly_rate: row.hourly_rate,
        active: row.active,
    }
}

pub async fn create_official(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    body: web::Json<CreateOfficialRequest>,
) -> ApiResult<HttpResponse> {
    principal.require_admin()?;
    let body = body.into_inner();

    let profile = OfficialProfile {
        official: Official {
            id: Uuid::new_v4(),
            certification: body.certification,
            max_games_per_day: body.max_games_per_day,
            max_games_per_week: body.max_games_per_week,
            travel_radius_km: body.travel_radius_km,
            hourly_rate: body.hourly_rate,
            active: true,
        },
        specialties: body.specialties,
        home: match (body.home_latitude, body.home_longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        },
    };

    let row = state.db.create_official(principal.tenant_id, body.name, profile).await?;
    Ok(created_json(row_to_response(row)))
}

pub async fn list_officials(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
) -> ApiResult<HttpResponse> {
    let rows = state.db.get_officials(principal.tenant_id).await?;
    Ok(ok_json(rows.into_iter().map(row_to_response).collect::<Vec<_>>()))
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub season_id: Uuid,
}

pub async fn optimize(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    body: web::Json<OptimizeRequest>,
) -> ApiResult<HttpResponse> {
    principal.require_admin()?;
    let season_id = body.into_inner().season_id;
    let season = state
        .db
        .get_season(principal.tenant_id, season_id)
        .await?
        .ok_or_else(|| api_not_found("season", season_id))?;

    let division_rows = state.db.get_divisions_for_season(principal.tenant_id, season.id).await?;
    let skill_by_division_row: HashMap<i32, SkillLevel> = division_rows
        .iter()
        .map(|d| {
            (
                d.id,
                db::convert::skill_level_from_str(&d.skill_level).unwrap_or(SkillLevel::Beginner),
            )
        })
        .collect();

    let venue_rows = state.db.get_venues(principal.tenant_id).await?;
    let venue_geo: HashMap<Uuid, GeoPoint> = venue_rows
        .iter()
        .filter_map(|v| match (v.latitude, v.longitude) {
            (Some(latitude), Some(longitude)) => Some((v.external_id, GeoPoint { latitude, longitude })),
            _ => None,
        })
        .collect();

    let game_rows = state.db.get_games_for_season(season.id).await?;
    let games: Vec<(backend::model::Game, SkillLevel)> = game_rows
        .iter()
        .filter(|g| db::convert::game_status_from_str(&g.status).unwrap_or(GameStatus::Scheduled) != GameStatus::Cancelled)
        .map(|row| {
            let skill = skill_by_division_row.get(&row.division_id).copied().unwrap_or(SkillLevel::Beginner);
            let venue_ext = venue_rows.iter().find(|v| v.id == row.venue_id).map(|v| v.external_id).unwrap_or(Uuid::nil());
            (
                backend::model::Game {
                    id: row.external_id,
                    season_id,
                    division_id: Uuid::nil(),
                    home_team_id: Uuid::nil(),
                    away_team_id: Uuid::nil(),
                    venue_id: venue_ext,
                    game_number: row.game_number.clone(),
                    game_type: db::convert::game_type_from_str(&row.game_type).unwrap_or(backend::model::GameType::Regular),
                    scheduled_start: row.scheduled_start,
                    duration_minutes: row.duration_minutes as u32,
                    status: db::convert::game_status_from_str(&row.status).unwrap_or(GameStatus::Scheduled),
                },
                skill,
            )
        })
        .collect();

    let official_rows = state.db.get_officials(principal.tenant_id).await?;
    let official_ext: HashMap<Uuid, i32> = official_rows.iter().map(|o| (o.external_id, o.id)).collect();
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

    let optimizer = OfficialsOptimizer::new(state.route_provider.as_ref());
    let result = optimizer.optimize(&games, &officials, &venue_geo, state.clock.now());

    let game_ext: HashMap<Uuid, i32> = game_rows.iter().map(|g| (g.external_id, g.id)).collect();
    for tentative in &result.assignments {
        let (Some(&game_row_id), Some(&official_row_id)) = (
            game_ext.get(&tentative.game_id),
            official_ext.get(&tentative.official_id),
        ) else {
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
        state
            .db
            .create_assignment(principal.tenant_id, game_row_id, official_row_id, assignment)
            .await?;
    }

    Ok(created_json(result))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssignmentStatusRequest {
    pub status: AssignmentStatus,
}

pub async fn update_assignment_status(
    state: web::Data<Arc<AppState>>,
    _principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<UpdateAssignmentStatusRequest>,
) -> ApiResult<HttpResponse> {
    let assignment_id = path.into_inner();
    let row = state
        .db
        .update_assignment_status(assignment_id, body.into_inner().status)
        .await?;
    Ok(ok_json(serde_json::json!({
        "id": row.external_id,
        "status": db::convert::assignment_status_from_str(&row.status).unwrap_or(AssignmentStatus::Pending),
    })))
}

#[derive(Debug, Deserialize)]
pub struct PayrollQuery {
    pub season_id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub async fn payroll_csv_handler(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    query: web::Query<PayrollQuery>,
) -> ApiResult<HttpResponse> {
    principal.require_admin()?;
    let query = query.into_inner();
    let season = state
        .db
        .get_season(principal.tenant_id, query.season_id)
        .await?
        .ok_or_else(|| api_not_found("season", query.season_id))?;

    let official_rows = state.db.get_officials(principal.tenant_id).await?;
    let official_by_row: HashMap<i32, &db::official::Model> =
        official_rows.iter().map(|o| (o.id, o)).collect();

    let game_rows = state.db.get_games_for_season(season.id).await?;
    let mut rows = vec![];
    for game in &game_rows {
        let date = game.scheduled_start.with_timezone(&state.tz).date_naive();
        if query.from.is_some_and(|from| date < from) || query.to.is_some_and(|to| date > to) {
            continue;
        }

        for assignment in state.db.get_assignments_for_game(game.id).await? {
            let Some(official) = official_by_row.get(&assignment.official_id) else {
                continue;
            };
            let status = db::convert::assignment_status_from_str(&assignment.status)
                .unwrap_or(AssignmentStatus::Pending);
            if status != AssignmentStatus::Confirmed {
                continue;
            }
            let role = db::convert::specialty_from_str(&assignment.role)
                .unwrap_or(OfficialSpecialty::HeadReferee);
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

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .body(payroll_csv(&rows)))
}
