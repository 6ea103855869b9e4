pub mod conflicts;
pub mod games;
pub mod officials;
pub mod public;
pub mod schedule;
pub mod seasons;
pub mod teams;
pub mod venues;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/seasons")
            .route("", web::post().to(seasons::create_season))
            .route("", web::get().to(seasons::list_seasons))
            .route("/{season_id}", web::get().to(seasons::get_season))
            .route("/{season_id}/divisions", web::post().to(seasons::create_division))
            .route("/{season_id}/divisions", web::get().to(seasons::list_divisions))
            .route("/{season_id}/blackouts", web::post().to(teams::create_blackout_date))
            .route("/{season_id}/blackouts", web::get().to(teams::list_blackout_dates))
            .route("/{season_id}/schedule/generate", web::post().to(schedule::generate))
            .route("/{season_id}/schedule/preview", web::get().to(schedule::preview))
            .route("/{season_id}/schedule/publish", web::post().to(schedule::publish))
            .route("/{season_id}/conflicts/validate", web::post().to(conflicts::validate_season))
            .route("/{season_id}/conflicts", web::get().to(conflicts::list_by_severity)),
    );

    cfg.service(
        web::scope("/divisions/{division_id}/teams")
            .route("", web::post().to(teams::create_team))
            .route("", web::get().to(teams::list_teams)),
    );

    cfg.service(
        web::scope("/venues")
            .route("", web::post().to(venues::create_venue))
            .route("", web::get().to(venues::list_venues))
            .route("/{venue_id}", web::delete().to(venues::delete_venue))
            .route("/{venue_id}/availability", web::post().to(venues::create_availability_rule))
            .route("/{venue_id}/availability", web::get().to(venues::list_availability_rules)),
    );

    cfg.service(
        web::scope("/games")
            .route("/{game_id}", web::get().to(games::get_game))
            .route("/{game_id}/reschedule", web::post().to(games::reschedule_game))
            .route("/{game_id}/cancel", web::post().to(games::cancel_game)),
    );

    cfg.service(
        web::scope("/conflicts/{conflict_id}")
            .route("/resolve", web::post().to(conflicts::resolve)),
    );

    cfg.service(
        web::scope("/officials")
            .route("", web::post().to(officials::create_official))
            .route("", web::get().to(officials::list_officials))
            .route("/optimize", web::post().to(officials::optimize))
            .route("/payroll", web::get().to(officials::payroll_csv_handler)),
    );

    cfg.service(
        web::scope("/assignments/{assignment_id}")
            .route("/status", web::post().to(officials::update_assignment_status)),
    );

    cfg.service(
        web::scope("/public/{tenant}")
            .route("/standings", web::get().to(public::standings))
            .route("/schedule", web::get().to(public::schedule))
            .route("/teams/{team}", web::get().to(public::team))
            .route("/games/{game}", web::get().to(public::game))
            .route("/calendar.ics", web::get().to(public::calendar)),
    );
}
