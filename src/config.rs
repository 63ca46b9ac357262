use std::time::Duration;

use serde::Deserialize;

use crate::board::BoardOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub cors_origin: String,
    /// Base URL board clients use to reach the pipeline API.
    pub api_url: String,
    pub mutation_timeout_secs: u64,
    pub seed_demo: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        Ok(Self {
            port,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            api_url: std::env::var("REVUOO_API_URL")
                .unwrap_or_else(|_| format!("http://127.0.0.1:{}", port)),
            mutation_timeout_secs: match std::env::var("MUTATION_TIMEOUT_SECS") {
                Ok(v) => v
                    .parse()
                    .map_err(|e| anyhow::anyhow!("Invalid MUTATION_TIMEOUT_SECS '{}': {}", v, e))?,
                Err(_) => defaults.mutation_timeout_secs,
            },
            seed_demo: std::env::var("SEED_DEMO")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.seed_demo),
        })
    }

    /// Mutation timeout handed to boards, never below one second.
    pub fn mutation_timeout(&self) -> Duration {
        Duration::from_secs(self.mutation_timeout_secs.max(1))
    }

    pub fn board_options(&self) -> BoardOptions {
        BoardOptions {
            mutation_timeout: self.mutation_timeout(),
            ..BoardOptions::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 21547,
            database_url: "sqlite:revuoo.db".into(),
            cors_origin: "http://localhost:21548,http://127.0.0.1:21548".into(),
            api_url: "http://127.0.0.1:21547".into(),
            mutation_timeout_secs: 15,
            seed_demo: false,
        }
    }
}
