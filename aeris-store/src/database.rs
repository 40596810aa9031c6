use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres, Row};
use tracing::info;

use crate::app_config::{DatabaseConfig, PolicyConfig};

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay policy rows from `booking_policies` onto the configured
    /// defaults. Each row is `rule_key` -> `{"value": <number>}`; unknown
    /// keys and malformed values are skipped.
    pub async fn fetch_policy_rules(
        &self,
        defaults: PolicyConfig,
    ) -> Result<PolicyConfig, sqlx::Error> {
        let rows = sqlx::query("SELECT rule_key, rule_value FROM booking_policies")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = defaults;

        for row in rows {
            let rule_key: String = row.get("rule_key");
            let rule_value: serde_json::Value = row.get("rule_value");

            let Some(v) = rule_value.get("value") else {
                continue;
            };

            match rule_key.as_str() {
                "business_rows" => {
                    if let Some(n) = v.as_i64() {
                        rules.business_rows = n as i32;
                    }
                }
                "premium_rows" => {
                    if let Some(n) = v.as_i64() {
                        rules.premium_rows = n as i32;
                    }
                }
                "economy_multiplier" => {
                    if let Some(f) = v.as_f64() {
                        rules.economy_multiplier = f;
                    }
                }
                "premium_multiplier" => {
                    if let Some(f) = v.as_f64() {
                        rules.premium_multiplier = f;
                    }
                }
                "business_multiplier" => {
                    if let Some(f) = v.as_f64() {
                        rules.business_multiplier = f;
                    }
                }
                _ => {}
            }
        }

        Ok(rules)
    }
}
