use std::sync::Arc;

use actix_web::web;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use backend::model::{AvailabilityKind, DayOfWeek, GeoPoint, Venue, VenueAvailabilityRule, VenueType};

use crate::auth::Principal;
use crate::error::{api_not_found, created_json, ok_json, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateVenueRequest {
    pub name: String,
    pub venue_type: VenueType,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Serialize)]
pub struct VenueResponse {
    pub id: Uuid,
    pub name: String,
    pub venue_type: VenueType,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub active: bool,
    pub city: String,
    pub state: String,
}

impl VenueResponse {
    fn from_row(row: db::venue::Model) -> Self {
        VenueResponse {
            id: row.external_id,
            name: row.name,
            venue_type: db::convert::venue_type_from_str(&row.venue_type)
                .unwrap_or(VenueType::Indoor),
            latitude: row.latitude,
            longitude: row.longitude,
            active: row.active,
            city: row.city,
            state: row.state,
        }
    }
}

pub async fn create_venue(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    body: web::Json<CreateVenueRequest>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    let body = body.into_inner();
    let geo = match (body.latitude, body.longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
        _ => None,
    };

    let venue = Venue {
        id: Uuid::new_v4(),
        name: body.name,
        venue_type: body.venue_type,
        geo,
        active: true,
        city: body.city,
        state: body.state,
    };

    let row = state.db.create_venue(principal.tenant_id, venue).await?;
    Ok(created_json(VenueResponse::from_row(row)))
}

pub async fn list_venues(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
) -> ApiResult<actix_web::HttpResponse> {
    let rows = state.db.get_venues(principal.tenant_id).await?;
    Ok(ok_json(
        rows.into_iter().map(VenueResponse::from_row).collect::<Vec<_>>(),
    ))
}

pub async fn delete_venue(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    let venue_id = path.into_inner();
    state.db.delete_venue(principal.tenant_id, venue_id).await?;
    Ok(ok_json(serde_json::json!({ "deleted": venue_id })))
}

#[derive(Debug, Deserialize)]
pub struct CreateAvailabilityRuleRequest {
    pub day_of_week: DayOfWeek,
    pub start_minute: i32,
    pub end_minute: i32,
    pub kind: AvailabilityKind,
    pub priority: i32,
    pub expiry_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityRuleResponse {
    pub id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_minute: i32,
    pub end_minute: i32,
    pub kind: AvailabilityKind,
    pub priority: i32,
}

pub async fn create_availability_rule(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<CreateAvailabilityRuleRequest>,
) -> ApiResult<actix_web::HttpResponse> {
    principal.require_admin()?;
    let venue_id = path.into_inner();
    let venue_row = state
        .db
        .get_venues(principal.tenant_id)
        .await?
        .into_iter()
        .find(|v| v.external_id == venue_id)
        .ok_or_else(|| api_not_found("venue", venue_id))?;

    let body = body.into_inner();
    let rule = VenueAvailabilityRule {
        id: Uuid::new_v4(),
        venue_id,
        day_of_week: body.day_of_week,
        start_minute: body.start_minute as u32,
        end_minute: body.end_minute as u32,
        kind: body.kind,
        priority: body.priority,
        expiry_date: body.expiry_date,
    };

    let row = state
        .db
        .create_venue_availability_rule(principal.tenant_id, venue_row.id, rule)
        .await?;

    Ok(created_json(AvailabilityRuleResponse {
        id: row.external_id,
        day_of_week: body.day_of_week,
        start_minute: row.start_minute,
        end_minute: row.end_minute,
        kind: body.kind,
        priority: row.priority,
    }))
}

pub async fn list_availability_rules(
    state: web::Data<Arc<AppState>>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<actix_web::HttpResponse> {
    let venue_id = path.into_inner();
    let venue_row = state
        .db
        .get_venues(principal.tenant_id)
        .await?
        .into_iter()
        .find(|v| v.external_id == venue_id)
        .ok_or_else(|| api_not_found("venue", venue_id))?;

    let rows = state.db.get_availability_rules_for_venue(venue_row.id).await?;
    Ok(ok_json(
        rows.into_iter()
            .map(|row| AvailabilityRuleResponse {
                id: row.external_id,
                day_of_week: db::convert::day_of_week_from_str(&row.day_of_week)
                    .unwrap_or(DayOfWeek::Mon),
                start_minute: row.start_minute,
                end_minute: row.end_minute,
                kind: db::convert::availability_kind_from_str(&row.kind)
                    .unwrap_or(AvailabilityKind::Available),
                priority: row.priority,
            })
            .collect::<Vec<_>>(),
    ))
}
