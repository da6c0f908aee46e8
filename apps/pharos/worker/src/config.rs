//! Configuration for the worker

use core_config::FromEnv;
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;
use eyre::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: PostgresConfig,
    pub redis: RedisConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: PostgresConfig::from_env()?,
            redis: RedisConfig::from_env()?,
        })
    }
}
