//! The weather port. Provider-neutral: the heat evaluator recomputes
//! the heat index locally so forecast providers never need to agree on
//! their own math.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_f: f64,
    pub humidity_pct: f64,
    pub wind_mph: f64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather provider timed out")]
    Timeout,
    #[error("weather provider returned an error: {0}")]
    Provider(String),
}

/// Implemented by a real forecast provider in production and a
/// deterministic mock in tests.
pub trait WeatherPort: Send + Sync {
    fn get_forecast(
        &self,
        city: &str,
        state: &str,
        target_time: DateTime<Utc>,
    ) -> Result<WeatherReading, WeatherError>;

    fn get_current(&self, city: &str, state: &str) -> Result<WeatherReading, WeatherError>;
}

/// Picks the forecast sample with the smallest `|forecast_time - target|`.
pub fn closest_reading<'a>(
    readings: &'a [WeatherReading],
    target: DateTime<Utc>,
) -> Option<&'a WeatherReading> {
    readings.iter().min_by_key(|r| (r.at - target).num_seconds().abs())
}

#[derive(Debug, Default)]
pub struct DeterministicWeatherMock {
    pub fixed: Option<WeatherReading>,
}

impl WeatherPort for DeterministicWeatherMock {
    fn get_forecast(
        &self,
        _city: &str,
        _state: &str,
        target_time: DateTime<Utc>,
    ) -> Result<WeatherReading, WeatherError> {
        self.fixed
            .map(|mut r| {
                r.at = target_time;
                r
            })
            .ok_or_else(|| WeatherError::Provider("no fixed reading configured".into()))
    }

    fn get_current(&self, city: &str, state: &str) -> Result<WeatherReading, WeatherError> {
        self.get_forecast(city, state, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_reading_picks_nearest_sample() {
        let base = Utc::now();
        let readings = vec![
            WeatherReading {
                temperature_f: 90.0,
                humidity_pct: 20.0,
                wind_mph: 5.0,
                at: base,
            },
            WeatherReading {
                temperature_f: 100.0,
                humidity_pct: 15.0,
                wind_mph: 5.0,
                at: base + chrono::Duration::hours(3),
            },
        ];
        let picked = closest_reading(&readings, base + chrono::Duration::hours(1)).unwrap();
        assert_eq!(picked.temperature_f, 90.0);
    }
}
