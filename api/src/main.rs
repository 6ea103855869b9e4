use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};

mod auth;
mod config;
mod error;
mod handlers;
mod rate_limit;
mod state;
mod weather_client;

use auth::{AuthPort, PassthroughAuth};
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let settings = config::Settings::from_env();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&settings.log_level));

    let bind_addr = format!("{}:{}", settings.host, settings.port);
    log::info!("starting scheduling API at {bind_addr}");

    let app_state = AppState::new(settings)
        .await
        .expect("failed to initialize application state");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let auth_port: Box<dyn AuthPort> = Box::new(PassthroughAuth);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(auth_port))
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .configure(handlers::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
