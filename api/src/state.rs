use std::sync::Arc;

use backend::clock::{Clock, SystemClock};
use backend::notify::{NotificationPort, NullNotifier};
use backend::travel::{HaversineFallback, RouteProviderPort};
use backend::weather::WeatherPort;
use chrono_tz::Tz;
use db::cache::{CachePort, InMemoryCache};
use db::Client;

use crate::config::Settings;
use crate::rate_limit::RateLimiters;
use crate::weather_client::ReqwestWeatherClient;

pub struct AppState {
    pub db: Client,
    pub cache: Box<dyn CachePort>,
    pub weather: Box<dyn WeatherPort>,
    pub route_provider: Box<dyn RouteProviderPort>,
    pub notifier: Box<dyn NotificationPort>,
    pub clock: Box<dyn Clock>,
    pub rate_limiters: RateLimiters,
    pub tz: Tz,
    pub settings: Settings,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Arc<Self>> {
        let db = Client::new(&db::Config::new(settings.db_url.clone())).await?;
        let tz: Tz = settings
            .tz_default
            .parse()
            .unwrap_or(chrono_tz::America::Phoenix);

        let weather: Box<dyn WeatherPort> = match &settings.weather_api_url {
            Some(url) => Box::new(ReqwestWeatherClient::new(
                url.clone(),
                settings.weather_api_key.clone(),
            )),
            None => Box::new(backend::weather::DeterministicWeatherMock::default()),
        };

        Ok(Arc::new(AppState {
            db,
            cache: Box::new(InMemoryCache::default()),
            weather,
            route_provider: Box::new(HaversineFallback::default()),
            notifier: Box::new(NullNotifier),
            clock: Box::new(SystemClock),
            rate_limiters: RateLimiters::default(),
            tz,
            settings,
        }))
    }
}
