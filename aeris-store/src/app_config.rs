use std::collections::HashMap;
use std::env;

use aeris_booking::FarePolicy;
use aeris_fleet::seatmap::{CabinClass, CabinLayout};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub policies: PolicyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Booking policy knobs: cabin banding and fare multipliers. Values here
/// are defaults; `DbClient::fetch_policy_rules` can override them from
/// the `booking_policies` table.
#[derive(Debug, Deserialize, Clone)]
pub struct PolicyConfig {
    #[serde(default = "default_business_rows")]
    pub business_rows: i32,
    #[serde(default = "default_premium_rows")]
    pub premium_rows: i32,
    #[serde(default = "default_economy_multiplier")]
    pub economy_multiplier: f64,
    #[serde(default = "default_premium_multiplier")]
    pub premium_multiplier: f64,
    #[serde(default = "default_business_multiplier")]
    pub business_multiplier: f64,
}

fn default_business_rows() -> i32 {
    2
}

fn default_premium_rows() -> i32 {
    4
}

fn default_economy_multiplier() -> f64 {
    1.0
}

fn default_premium_multiplier() -> f64 {
    1.5
}

fn default_business_multiplier() -> f64 {
    2.0
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            business_rows: default_business_rows(),
            premium_rows: default_premium_rows(),
            economy_multiplier: default_economy_multiplier(),
            premium_multiplier: default_premium_multiplier(),
            business_multiplier: default_business_multiplier(),
        }
    }
}

impl PolicyConfig {
    pub fn cabin_layout(&self) -> CabinLayout {
        CabinLayout {
            business_rows: self.business_rows,
            premium_rows: self.premium_rows,
        }
    }

    pub fn fare_policy(&self) -> FarePolicy {
        let mut multipliers = HashMap::new();
        multipliers.insert(CabinClass::Economy, self.economy_multiplier);
        multipliers.insert(CabinClass::Premium, self.premium_multiplier);
        multipliers.insert(CabinClass::Business, self.business_multiplier);
        FarePolicy::new(multipliers)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Environment variables with a prefix of AERIS
            // E.g. `AERIS__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("AERIS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults_match_published_fares() {
        let policies = PolicyConfig::default();
        let fares = policies.fare_policy();

        assert_eq!(fares.quote(10_000, CabinClass::Economy).unwrap(), 10_000);
        assert_eq!(fares.quote(10_000, CabinClass::Business).unwrap(), 20_000);

        let layout = policies.cabin_layout();
        assert_eq!(layout.cabin_for_row(1), CabinClass::Business);
        assert_eq!(layout.cabin_for_row(5), CabinClass::Premium);
        assert_eq!(layout.cabin_for_row(9), CabinClass::Economy);
    }
}
