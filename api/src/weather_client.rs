//! Production `WeatherPort` backed by `reqwest`. `WeatherPort`'s
//! methods are synchronous (the evaluator is plain sync code shared with
//! `backend`'s unit tests), so this wraps a blocking client with a 5 s
//! timeout.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

use backend::weather::{WeatherError, WeatherPort, WeatherReading};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ReqwestWeatherClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl ReqwestWeatherClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builds with static config");
        Self {
            base_url,
            api_key,
            client,
        }
    }

    fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<ProviderReading, WeatherError> {
        let mut request = self.client.get(format!("{}{}", self.base_url, path)).query(query);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                WeatherError::Timeout
            } else {
                WeatherError::Provider(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(WeatherError::Provider(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        response
            .json::<ProviderReading>()
            .map_err(|e| WeatherError::Provider(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ProviderReading {
    temperature_f: f64,
    humidity_pct: f64,
    wind_mph: f64,
}

impl WeatherPort for ReqwestWeatherClient {
    fn get_forecast(
        &self,
        city: &str,
        state: &str,
        target_time: DateTime<Utc>,
    ) -> Result<WeatherReading, WeatherError> {
        let reading = self.fetch(
            "/forecast",
            &[("city", city), ("state", state), ("at", &target_time.to_rfc3339())],
        )?;
        Ok(WeatherReading {
            temperature_f: reading.temperature_f,
            humidity_pct: reading.humidity_pct,
            wind_mph: reading.wind_mph,
            at: target_time,
        })
    }

    fn get_current(&self, city: &str, state: &str) -> Result<WeatherReading, WeatherError> {
        let reading = self.fetch("/current", &[("city", city), ("state", state)])?;
        Ok(WeatherReading {
            temperature_f: reading.temperature_f,
            humidity_pct: reading.humidity_pct,
            wind_mph: reading.wind_mph,
            at: Utc::now(),
        })
    }
}
