//! Heat-policy evaluator: Rothfusz heat-index regression plus the
//! dangerous-hours decision table. Outdoor venues only; indoor and hybrid
//! venues always return `NONE`/allowed.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{HeatWarningLevel, VenueType};
use crate::weather::{WeatherPort, WeatherReading};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DangerousHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for DangerousHours {
    fn default() -> Self {
        // Default 11:00-18:00 local.
        Self {
            start_hour: 11,
            end_hour: 18,
        }
    }
}

impl DangerousHours {
    pub fn contains(&self, local_hour: u32) -> bool {
        local_hour >= self.start_hour && local_hour < self.end_hour
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatPolicyResult {
    pub allowed: bool,
    pub level: HeatWarningLevel,
    pub temperature_f: f64,
    pub heat_index_f: f64,
    pub recommendations: Vec<String>,
    pub restrictions: Vec<String>,
    pub automatic_cancellation: bool,
    pub reason: Option<String>,
}

impl HeatPolicyResult {
    fn none(temperature_f: f64) -> Self {
        Self {
            allowed: true,
            level: HeatWarningLevel::None,
            temperature_f,
            heat_index_f: temperature_f,
            recommendations: vec![],
            restrictions: vec![],
            automatic_cancellation: false,
            reason: None,
        }
    }
}

/// Rothfusz regression, applied only when `T >= 80F`; below that
/// the heat index is just the dry-bulb temperature.
pub fn heat_index_f(temperature_f: f64, relative_humidity_pct: f64) -> f64 {
    let t = temperature_f;
    let r = relative_humidity_pct;

    if t < 80.0 {
        return t;
    }

    let mut hi = -42.379 + 2.04901523 * t + 10.14333127 * r - 0.22475541 * t * r
        - 0.00683783 * t * t
        - 0.05481717 * r * r
        + 0.00122874 * t * t * r
        + 0.00085282 * t * r * r
        - 0.00000199 * t * t * r * r;

    if r < 13.0 && (80.0..=112.0).contains(&t) {
        let adjustment = ((13.0 - r) / 4.0) * ((17.0 - (t - 95.0).abs()) / 17.0).sqrt();
        hi -= adjustment;
    } else if r > 85.0 && (80.0..=87.0).contains(&t) {
        let adjustment = ((r - 85.0) / 10.0) * ((87.0 - t) / 5.0);
        hi += adjustment;
    }

    hi
}

pub struct HeatPolicyEvaluator<'a> {
    pub weather: &'a dyn WeatherPort,
    pub dangerous_hours: DangerousHours,
}

impl<'a> HeatPolicyEvaluator<'a> {
    pub fn new(weather: &'a dyn WeatherPort) -> Self {
        Self {
            weather,
            dangerous_hours: DangerousHours::default(),
        }
    }

    pub fn with_dangerous_hours(mut self, hours: DangerousHours) -> Self {
        self.dangerous_hours = hours;
        self
    }

    /// Evaluates the heat-policy decision table for a candidate
    /// pre-scheduling slot, looking up a forecast via the weather port.
    pub fn evaluate_for_schedule(
        &self,
        venue_type: VenueType,
        local_start: DateTime<chrono_tz::Tz>,
        city: &str,
        state: &str,
    ) -> HeatPolicyResult {
        if !venue_type.is_outdoor() {
            return HeatPolicyResult::none(70.0);
        }

        match self
            .weather
            .get_forecast(city, state, local_start.with_timezone(&Utc))
        {
            Ok(reading) => self.evaluate_reading(local_start, reading),
            Err(_) => {
                // A weather error pre-scheduling is a conservative WARNING, not allowed.
                HeatPolicyResult {
                    allowed: false,
                    level: HeatWarningLevel::Warning,
                    temperature_f: 0.0,
                    heat_index_f: 0.0,
                    recommendations: vec![],
                    restrictions: vec!["weather data unavailable".into()],
                    automatic_cancellation: false,
                    reason: Some("forecast lookup failed".into()),
                }
            }
        }
    }

    /// Same decision table but used while a game is already underway; a
    /// weather error never halts a live game.
    pub fn evaluate_for_ongoing(
        &self,
        venue_type: VenueType,
        local_start: DateTime<chrono_tz::Tz>,
        city: &str,
        state: &str,
    ) -> HeatPolicyResult {
        if !venue_type.is_outdoor() {
            return HeatPolicyResult::none(70.0);
        }

        match self.weather.get_current(city, state) {
            Ok(reading) => self.evaluate_reading(local_start, reading),
            Err(_) => HeatPolicyResult {
                allowed: true,
                level: HeatWarningLevel::Warning,
                temperature_f: 0.0,
                heat_index_f: 0.0,
                recommendations: vec![],
                restrictions: vec!["weather telemetry unavailable, continuing play".into()],
                automatic_cancellation: false,
                reason: Some("live weather lookup failed".into()),
            },
        }
    }

    pub fn evaluate_reading(
        &self,
        local_start: DateTime<chrono_tz::Tz>,
        reading: WeatherReading,
    ) -> HeatPolicyResult {
        let hi = heat_index_f(reading.temperature_f, reading.humidity_pct);
        let in_dangerous_hours = self.dangerous_hours.contains(local_start.hour());

        let (level, allowed, auto_cancel) = classify(hi, in_dangerous_hours);

        let mut recommendations = vec![];
        let mut restrictions = vec![];

        match level {
            HeatWarningLevel::None => {}
            HeatWarningLevel::Caution => {
                recommendations.push("increase hydration breaks".to_string());
            }
            HeatWarningLevel::Warning => {
                recommendations.push("mandatory water breaks every quarter".to_string());
                restrictions.push("limit warmup duration".to_string());
            }
            HeatWarningLevel::Danger => {
                restrictions.push("outdoor play not permitted at this time".to_string());
            }
            HeatWarningLevel::Extreme => {
                restrictions.push("all outdoor play cancelled".to_string());
            }
        }

        HeatPolicyResult {
            allowed,
            level,
            temperature_f: reading.temperature_f,
            heat_index_f: hi,
            recommendations,
            restrictions,
            automatic_cancellation: auto_cancel,
            reason: None,
        }
    }
}

fn classify(heat_index: f64, in_dangerous_hours: bool) -> (HeatWarningLevel, bool, bool) {
    if heat_index >= 115.0 {
        (HeatWarningLevel::Extreme, false, true)
    } else if heat_index >= 105.0 {
        if in_dangerous_hours {
            (HeatWarningLevel::Danger, false, false)
        } else {
            (HeatWarningLevel::Warning, true, false)
        }
    } else if (95.0..105.0).contains(&heat_index) {
        if in_dangerous_hours {
            (HeatWarningLevel::Warning, true, false)
        } else {
            (HeatWarningLevel::Caution, true, false)
        }
    } else {
        (HeatWarningLevel::None, true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::DeterministicWeatherMock;
    use chrono::TimeZone;

    fn phoenix_local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<chrono_tz::Tz> {
        chrono_tz::America::Phoenix
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn heat_index_below_80_returns_temperature() {
        assert_eq!(heat_index_f(72.0, 50.0), 72.0);
    }

    #[test]
    fn scenario_2_heat_reject_at_112f_18pct_is_danger_in_dangerous_hours() {
        let mock = DeterministicWeatherMock {
            fixed: Some(WeatherReading {
                temperature_f: 112.0,
                humidity_pct: 18.0,
                wind_mph: 5.0,
                at: Utc::now(),
            }),
        };
        let evaluator = HeatPolicyEvaluator::new(&mock);
        let local_start = phoenix_local(2024, 7, 13, 13, 0);

        let result = evaluator.evaluate_for_schedule(VenueType::Outdoor, local_start, "Phoenix", "AZ");

        assert!((result.heat_index_f - 106.0).abs() < 2.0);
        assert_eq!(result.level, HeatWarningLevel::Danger);
        assert!(!result.allowed);
        assert!(!result.automatic_cancellation);
    }

    #[test]
    fn scenario_2_same_venue_outside_dangerous_hours_is_warning_and_allowed() {
        let mock = DeterministicWeatherMock {
            fixed: Some(WeatherReading {
                temperature_f: 112.0,
                humidity_pct: 18.0,
                wind_mph: 5.0,
                at: Utc::now(),
            }),
        };
        let evaluator = HeatPolicyEvaluator::new(&mock);
        let local_start = phoenix_local(2024, 7, 13, 19, 30);

        let result = evaluator.evaluate_for_schedule(VenueType::Outdoor, local_start, "Phoenix", "AZ");

        assert_eq!(result.level, HeatWarningLevel::Warning);
        assert!(result.allowed);
        assert!(!result.restrictions.is_empty() || !result.recommendations.is_empty());
    }

    #[test]
    fn indoor_venues_bypass_the_table() {
        let mock = DeterministicWeatherMock { fixed: None };
        let evaluator = HeatPolicyEvaluator::new(&mock);
        let local_start = phoenix_local(2024, 7, 13, 13, 0);
        let result = evaluator.evaluate_for_schedule(VenueType::Indoor, local_start, "Phoenix", "AZ");
        assert_eq!(result.level, HeatWarningLevel::None);
        assert!(result.allowed);
    }

    #[test]
    fn extreme_heat_is_never_allowed_regardless_of_hour() {
        assert_eq!(classify(120.0, false).0, HeatWarningLevel::Extreme);
        assert!(!classify(120.0, false).1);
        assert!(classify(120.0, false).2);
    }

    #[test]
    fn weather_error_pre_scheduling_is_conservative() {
        let mock = DeterministicWeatherMock { fixed: None };
        let evaluator = HeatPolicyEvaluator::new(&mock);
        let local_start = phoenix_local(2024, 7, 13, 13, 0);
        let result = evaluator.evaluate_for_schedule(VenueType::Outdoor, local_start, "Phoenix", "AZ");
        assert!(!result.allowed);
        assert_eq!(result.level, HeatWarningLevel::Warning);
    }

    #[test]
    fn weather_error_during_a_live_game_never_halts_play() {
        let mock = DeterministicWeatherMock { fixed: None };
        let evaluator = HeatPolicyEvaluator::new(&mock);
        let local_start = phoenix_local(2024, 7, 13, 13, 0);
        let result = evaluator.evaluate_for_ongoing(VenueType::Outdoor, local_start, "Phoenix", "AZ");
        assert!(result.allowed);
    }
}
