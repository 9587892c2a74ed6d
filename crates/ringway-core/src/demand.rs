//! Demand forecasting seam.
//!
//! The engine does not compute demand. A collaborator may install a
//! [`DemandForecast`]; each tick the engine samples it for the simulated
//! hour and weekday, scales its request probabilities by the sample's
//! multiplier and uses the route breakdown to weight corridor choice.
//! Without a forecast the fixed rates from the configuration apply.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::id::CityId;

/// Day of the week. Clock zero is a Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// 0 = Monday .. 6 = Sunday. Wraps modulo 7.
    pub fn from_index(index: u64) -> Self {
        Self::ALL[(index % 7) as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Hour-of-day (0-23) and weekday for a simulated clock value.
pub fn calendar_at(clock_ms: f64, start_hour: u8) -> (u8, Weekday) {
    let hours = (clock_ms.max(0.0) / MS_PER_HOUR).floor() as u64 + start_hour as u64;
    ((hours % 24) as u8, Weekday::from_index(hours / 24))
}

/// Forecast flights on one origin-destination pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDemand {
    pub from: CityId,
    pub to: CityId,
    pub flights: u32,
}

/// One forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSample {
    pub spawn_rate_multiplier: f64,
    pub routes: Vec<RouteDemand>,
}

impl DemandSample {
    /// Forecast flights from `from` to `to`, 0 if the pair is not listed.
    pub fn flights(&self, from: CityId, to: CityId) -> u32 {
        self.routes
            .iter()
            .filter(|r| r.from == from && r.to == to)
            .map(|r| r.flights)
            .sum()
    }

    /// The multiplier, with non-finite or negative values treated as zero.
    pub fn multiplier(&self) -> f64 {
        if self.spawn_rate_multiplier.is_finite() {
            self.spawn_rate_multiplier.max(0.0)
        } else {
            0.0
        }
    }
}

/// Supplies demand per simulated hour and weekday.
pub trait DemandForecast {
    fn sample(&self, hour: u8, weekday: Weekday) -> DemandSample;
}

/// Table-driven forecast: the multiplier is `hourly[hour] * daily[weekday]`
/// and the route mix is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyProfile {
    /// 24 entries, hour 0 first.
    pub hourly: Vec<f64>,
    /// 7 entries, Monday first.
    pub daily: Vec<f64>,
    #[serde(default)]
    pub routes: Vec<RouteDemand>,
}

impl HourlyProfile {
    /// Multiplier 1 around the clock with no route preference.
    pub fn flat() -> Self {
        Self {
            hourly: vec![1.0; 24],
            daily: vec![1.0; 7],
            routes: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hourly.len() != 24 || self.daily.len() != 7 {
            return Err(ConfigError::ProfileShape {
                hourly: self.hourly.len(),
                daily: self.daily.len(),
            });
        }
        if let Some(&value) = self
            .hourly
            .iter()
            .chain(self.daily.iter())
            .find(|v| !(v.is_finite() && **v >= 0.0))
        {
            return Err(ConfigError::InvalidMultiplier(value));
        }
        Ok(())
    }
}

impl DemandForecast for HourlyProfile {
    fn sample(&self, hour: u8, weekday: Weekday) -> DemandSample {
        let hourly = self.hourly.get(hour as usize).copied().unwrap_or(1.0);
        let daily = self.daily.get(weekday.index()).copied().unwrap_or(1.0);
        DemandSample {
            spawn_rate_multiplier: hourly * daily,
            routes: self.routes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_starts_monday_at_start_hour() {
        assert_eq!(calendar_at(0.0, 6), (6, Weekday::Monday));
        assert_eq!(calendar_at(MS_PER_HOUR * 18.0, 6), (0, Weekday::Tuesday));
        assert_eq!(calendar_at(MS_PER_HOUR * 24.0 * 7.0, 0), (0, Weekday::Monday));
        assert_eq!(calendar_at(MS_PER_HOUR * 24.0 * 6.0 + 1.0, 0), (0, Weekday::Sunday));
    }

    #[test]
    fn profile_multiplies_hour_and_day() {
        let mut profile = HourlyProfile::flat();
        profile.hourly[8] = 2.0;
        profile.daily[Weekday::Saturday.index()] = 0.5;
        assert_eq!(profile.sample(8, Weekday::Saturday).spawn_rate_multiplier, 1.0);
        assert_eq!(profile.sample(8, Weekday::Monday).spawn_rate_multiplier, 2.0);
        assert_eq!(profile.sample(3, Weekday::Saturday).spawn_rate_multiplier, 0.5);
    }

    #[test]
    fn route_lookup_sums_matching_pairs() {
        let sample = DemandSample {
            spawn_rate_multiplier: 1.0,
            routes: vec![
                RouteDemand {
                    from: CityId(0),
                    to: CityId(1),
                    flights: 3,
                },
                RouteDemand {
                    from: CityId(0),
                    to: CityId(1),
                    flights: 2,
                },
            ],
        };
        assert_eq!(sample.flights(CityId(0), CityId(1)), 5);
        assert_eq!(sample.flights(CityId(1), CityId(0)), 0);
    }

    #[test]
    fn bad_multipliers_clamped_to_zero() {
        let sample = DemandSample {
            spawn_rate_multiplier: f64::NAN,
            routes: Vec::new(),
        };
        assert_eq!(sample.multiplier(), 0.0);
    }

    #[test]
    fn profile_shape_validated() {
        let mut profile = HourlyProfile::flat();
        assert!(profile.validate().is_ok());
        profile.hourly.pop();
        assert_eq!(
            profile.validate(),
            Err(ConfigError::ProfileShape {
                hourly: 23,
                daily: 7
            })
        );
        let mut profile = HourlyProfile::flat();
        profile.daily[2] = -1.0;
        assert_eq!(profile.validate(), Err(ConfigError::InvalidMultiplier(-1.0)));
    }
}
