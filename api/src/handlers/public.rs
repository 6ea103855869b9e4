//! Public read surface: unauthenticated, tenant-in-path, cached and
//! rate-limited per source IP. Every response carries `Cache-Control`,
//! `ETag`, and the fixed security headers; a matching `If-None-Match`
//! short-circuits to `304 Not Modified`.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use backend::ics::{render_calendar, CalendarEvent};
use backend::model::{GameStatus, GameType};

use crate::error::{api_not_found, ApiError, ApiResult};
use crate::state::AppState;

fn client_ip(req: &HttpRequest) -> String {
    req.connection_info().realip_remote_addr().unwrap_or("unknown").to_string()
}

fn check_public_rate_limit(state: &AppState, req: &HttpRequest) -> ApiResult<()> {
    state
        .rate_limiters
        .public
        .check(&client_ip(req))
        .map_err(|retry_after_secs| ApiError::RateLimited { retry_after_secs })
}

fn etag_for<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("\"{:x}\"", hasher.finish())
}

fn not_modified(req: &HttpRequest, etag: &str) -> bool {
    req.headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == etag)
        .unwrap_or(false)
}

fn cached_json<T: Serialize>(req: &HttpRequest, value: T, max_age_secs: u64) -> HttpResponse {
    let etag = etag_for(&value);
    if not_modified(req, &etag) {
        return HttpResponse::NotModified()
            .insert_header((header::ETAG, etag))
            .finish();
    }

    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, format!("public, max-age={max_age_secs}")))
        .insert_header((header::ETAG, etag))
        .insert_header(("X-Content-Type-Options", "nosniff"))
        .insert_header(("X-Frame-Options", "DENY"))
        .json(crate::error::Envelope::ok(value))
}

async fn resolve_tenant(tenant: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(tenant).map_err(|_| ApiError::Validation("tenant must be a uuid".to_string()))
}

#[derive(Debug, Default, Serialize)]
struct TeamStanding {
    team_id: Uuid,
    wins: u32,
    losses: u32,
    ties: u32,
    points_for: i64,
    points_against: i64,
    point_differential: i64,
    win_percentage: f64,
}

#[derive(Debug, Deserialize)]
pub struct StandingsQuery {
    pub season: Uuid,
    pub division: Option<Uuid>,
}

pub async fn standings(
    req: HttpRequest,
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    query: web::Query<StandingsQuery>,
) -> ApiResult<HttpResponse> {
    check_public_rate_limit(&state, &req)?;
    let tenant_id = resolve_tenant(&path.into_inner()).await?;
    let query = query.into_inner();

    let season = state
        .db
        .get_season(tenant_id, query.season)
        .await?
        .ok_or_else(|| api_not_found("season", query.season))?;

    let mut division_row_ids = vec![];
    for division in state.db.get_divisions_for_season(tenant_id, season.id).await? {
        if query.division.is_none() || query.division == Some(division.external_id) {
            division_row_ids.push(division.id);
        }
    }

    let mut standings: HashMap<i32, TeamStanding> = HashMap::new();
    let mut team_ext: HashMap<i32, Uuid> = HashMap::new();
    for division_row_id in &division_row_ids {
        for team in state.db.get_teams_for_division(*division_row_id).await? {
            team_ext.insert(team.id, team.external_id);
            standings.entry(team.id).or_insert_with(|| TeamStanding {
                team_id: team.external_id,
                ..Default::default()
            });
        }
    }

    for game in state.db.get_games_for_season(season.id).await? {
        let status = db::convert::game_status_from_str(&game.status).unwrap_or(GameStatus::Scheduled);
        if status != GameStatus::Completed {
            continue;
        }
        let (Some(home_score), Some(away_score)) = (game.home_score, game.away_score) else {
            continue;
        };

        for (team_row_id, own, opp) in [
            (game.home_team_id, home_score, away_score),
            (game.away_team_id, away_score, home_score),
        ] {
            let Some(entry) = standings.get_mut(&team_row_id) else {
                continue;
            };
            entry.points_for += own as i64;
            entry.points_against += opp as i64;
            match own.cmp(&opp) {
                std::cmp::Ordering::Greater => entry.wins += 1,
                std::cmp::Ordering::Less => entry.losses += 1,
                std::cmp::Ordering::Equal => entry.ties += 1,
            }
        }
    }

    let mut rows: Vec<TeamStanding> = standings.into_values().collect();
    for row in &mut rows {
        let played = row.wins + row.losses + row.ties;
        row.point_differential = row.points_for - row.points_against;
        row.win_percentage = (row.wins as f64 + 0.5 * row.ties as f64) / played.max(1) as f64;
    }
    rows.sort_by(|a, b| {
        b.win_percentage
            .partial_cmp(&a.win_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.point_differential.cmp(&a.point_differential))
    });

    Ok(cached_json(&req, rows, 5 * 60))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub season: Option<Uuid>,
    pub team: Option<Uuid>,
    pub venue: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct PublicGame {
    id: Uuid,
    game_number: String,
    game_type: GameType,
    scheduled_start: chrono::DateTime<chrono::Utc>,
    status: GameStatus,
    home_score: Option<i32>,
    away_score: Option<i32>,
}

async fn season_games_for_tenant(
    state: &AppState,
    tenant_id: Uuid,
    season_external: Option<Uuid>,
) -> ApiResult<Vec<db::game::Model>> {
    let mut games = vec![];
    match season_external {
        Some(season_id) => {
            let season = state
                .db
                .get_season(tenant_id, season_id)
                .await?
                .ok_or_else(|| api_not_found("season", season_id))?;
            games.extend(state.db.get_games_for_season(season.id).await?);
        }
        None => {
            for season in state.db.get_seasons(tenant_id).await? {
                games.extend(state.db.get_games_for_season(season.id).await?);
            }
        }
    }
    Ok(games)
}

pub async fn schedule(
    req: HttpRequest,
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    query: web::Query<ScheduleQuery>,
) -> ApiResult<HttpResponse> {
    check_public_rate_limit(&state, &req)?;
    let tenant_id = resolve_tenant(&path.into_inner()).await?;
    let query = query.into_inner();

    let mut games = season_games_for_tenant(&state, tenant_id, query.season).await?;

    if let Some(venue_id) = query.venue {
        let venue_rows = state.db.get_venues(tenant_id).await?;
        if let Some(venue_row) = venue_rows.into_iter().find(|v| v.external_id == venue_id) {
            games.retain(|g| g.venue_id == venue_row.id);
        }
    }

    if let Some(date_from) = query.date_from {
        games.retain(|g| g.scheduled_start.with_timezone(&state.tz).date_naive() >= date_from);
    }
    if let Some(date_to) = query.date_to {
        games.retain(|g| g.scheduled_start.with_timezone(&state.tz).date_naive() <= date_to);
    }

    let limit = query.limit.unwrap_or(200).min(200) as usize;
    games.truncate(limit);

    let out: Vec<PublicGame> = games
        .into_iter()
        .map(|row| PublicGame {
            id: row.external_id,
            game_number: row.game_number,
            game_type: db::convert::game_type_from_str(&row.game_type).unwrap_or(GameType::Regular),
            scheduled_start: row.scheduled_start,
            status: db::convert::game_status_from_str(&row.status).unwrap_or(GameStatus::Scheduled),
            home_score: row.home_score,
            away_score: row.away_score,
        })
        .collect();

    Ok(cached_json(&req, out, 5 * 60))
}

#[derive(Debug, Serialize)]
struct TeamDetail {
    team_id: Uuid,
    name: String,
    last_games: Vec<PublicGame>,
    next_games: Vec<PublicGame>,
}

pub async fn team(
    req: HttpRequest,
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, Uuid)>,
) -> ApiResult<HttpResponse> {
    check_public_rate_limit(&state, &req)?;
    let (tenant, team_id) = path.into_inner();
    let tenant_id = resolve_tenant(&tenant).await?;

    let mut team_row = None;
    'outer: for season in state.db.get_seasons(tenant_id).await? {
        for division in state.db.get_divisions_for_season(tenant_id, season.id).await? {
            if let Some(row) = state
                .db
                .get_teams_for_division(division.id)
                .await?
                .into_iter()
                .find(|t| t.external_id == team_id)
            {
                team_row = Some(row);
                break 'outer;
            }
        }
    }
    let team_row = team_row.ok_or_else(|| api_not_found("team", team_id))?;

    let mut games = season_games_for_tenant(&state, tenant_id, None).await?;
    games.retain(|g| g.home_team_id == team_row.id || g.away_team_id == team_row.id);
    games.sort_by_key(|g| g.scheduled_start);

    let now = state.clock.now();
    let (past, future): (Vec<_>, Vec<_>) = games.into_iter().partition(|g| g.scheduled_start < now);

    let to_public = |row: db::game::Model| PublicGame {
        id: row.external_id,
        game_number: row.game_number,
        game_type: db::convert::game_type_from_str(&row.game_type).unwrap_or(GameType::Regular),
        scheduled_start: row.scheduled_start,
        status: db::convert::game_status_from_str(&row.status).unwrap_or(GameStatus::Scheduled),
        home_score: row.home_score,
        away_score: row.away_score,
    };

    let last_games = past.into_iter().rev().take(10).map(to_public).collect();
    let next_games = future.into_iter().take(5).map(to_public).collect();

    Ok(cached_json(
        &req,
        TeamDetail {
            team_id,
            name: team_row.name,
            last_games,
            next_games,
        },
        5 * 60,
    ))
}

pub async fn game(
    req: HttpRequest,
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, Uuid)>,
) -> ApiResult<HttpResponse> {
    check_public_rate_limit(&state, &req)?;
    let (tenant, game_id) = path.into_inner();
    let tenant_id = resolve_tenant(&tenant).await?;

    let row = state
        .db
        .get_game(tenant_id, game_id)
        .await?
        .ok_or_else(|| api_not_found("game", game_id))?;
    let status = db::convert::game_status_from_str(&row.status).unwrap_or(GameStatus::Scheduled);
    let ttl = if status == GameStatus::Completed { 60 * 60 } else { 5 * 60 };

    Ok(cached_json(
        &req,
        PublicGame {
            id: row.external_id,
            game_number: row.game_number,
            game_type: db::convert::game_type_from_str(&row.game_type).unwrap_or(GameType::Regular),
            scheduled_start: row.scheduled_start,
            status,
            home_score: row.home_score,
            away_score: row.away_score,
        },
        ttl,
    ))
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub season: Option<Uuid>,
    pub team: Option<Uuid>,
}

pub async fn calendar(
    req: HttpRequest,
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    query: web::Query<CalendarQuery>,
) -> ApiResult<HttpResponse> {
    check_public_rate_limit(&state, &req)?;
    let tenant_id = resolve_tenant(&path.into_inner()).await?;
    let query = query.into_inner();

    let mut games = season_games_for_tenant(&state, tenant_id, query.season).await?;
    if let Some(team_id) = query.team {
        let mut team_row_id = None;
        'outer: for season in state.db.get_seasons(tenant_id).await? {
            for division in state.db.get_divisions_for_season(tenant_id, season.id).await? {
                if let Some(row) = state
                    .db
                    .get_teams_for_division(division.id)
                    .await?
                    .into_iter()
                    .find(|t| t.external_id == team_id)
                {
                    team_row_id = Some(row.id);
                    break 'outer;
                }
            }
        }
        if let Some(team_row_id) = team_row_id {
            games.retain(|g| g.home_team_id == team_row_id || g.away_team_id == team_row_id);
        }
    }
    games.retain(|g| db::convert::game_status_from_str(&g.status).unwrap_or(GameStatus::Scheduled) != GameStatus::Cancelled);

    let venue_rows = state.db.get_venues(tenant_id).await?;
    let venue_by_row: HashMap<i32, &db::venue::Model> = venue_rows.iter().map(|v| (v.id, v)).collect();

    let events: Vec<CalendarEvent> = games
        .iter()
        .map(|row| {
            let venue_name = venue_by_row.get(&row.venue_id).map(|v| v.name.as_str()).unwrap_or("TBD");
            let domain_game = backend::model::Game {
                id: row.external_id,
                season_id: tenant_id,
                division_id: Uuid::nil(),
                home_team_id: Uuid::nil(),
                away_team_id: Uuid::nil(),
                venue_id: Uuid::nil(),
                game_number: row.game_number.clone(),
                game_type: db::convert::game_type_from_str(&row.game_type).unwrap_or(GameType::Regular),
                scheduled_start: row.scheduled_start,
                duration_minutes: row.duration_minutes as u32,
                status: db::convert::game_status_from_str(&row.status).unwrap_or(GameStatus::Scheduled),
            };
            CalendarEvent::from_game(&domain_game, "Home", "Away", venue_name)
        })
        .collect();

    let ics = render_calendar(&events, "-//scheduling-core//EN");
    let etag = format!("\"{:x}\"", {
        let mut hasher = DefaultHasher::new();
        ics.hash(&mut hasher);
        hasher.finish()
    });
    if not_modified(&req, &etag) {
        return Ok(HttpResponse::NotModified().insert_header((header::ETAG, etag)).finish());
    }

    Ok(HttpResponse::Ok()
        .content_type("text/calendar")
        .insert_header((header::CACHE_CONTROL, "public, max-age=300"))
        .insert_header((header::ETAG, etag))
        .insert_header(("X-Content-Type-Options", "nosniff"))
        .insert_header(("X-Frame-Options", "DENY"))
        .body(ics))
}
