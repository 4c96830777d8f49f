//! Loads config from config.toml

use serde_derive::Deserialize;
use cached::proc_macro::cached;
use std::fs;
use std::process::exit;
use toml;
use sqlx::postgres::{PgPoolOptions, PgPool};

#[derive(Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub count: CountConfig,
    pub market: MarketConfig,
    pub storage: StorageConfig
}

#[derive(Deserialize, Clone)]
pub struct CountConfig {
    pub min_password_length: usize,
    pub max_password_length: usize,
    pub max_name_length: usize,
    pub max_bio_length: usize,
    pub max_title_length: usize,
    pub max_description_length: usize,
    pub max_comment_length: usize
}

#[derive(Deserialize, Clone)]
pub struct DatabaseConfig {
    pub ip: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String
}

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log: bool,
    // Secure cookies require https, so only set in production deployments
    pub production: bool,
    pub token_valid_duration_seconds: i64,

    pub request_quota_replenish_ms: u64,
    pub request_quota: u32
}

#[derive(Deserialize, Clone)]
pub struct MarketConfig {
    pub max_price_cents: i64
}

#[derive(Deserialize, Clone)]
pub struct StorageConfig {
    pub upload_url: String,
    pub api_key: String,
    pub max_upload_bytes: usize
}

#[cached]
pub async fn get_pool() -> PgPool {
    let config = get_config();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(format!("postgres://{}:{}@{}:{}/{}", // user:password / ip/db
            config.database.user,
            config.database.password,
            config.database.ip,
            config.database.port,
            config.database.name
        ).as_str())
        .await;
    pool.unwrap()
}

#[cached]
pub fn get_config() -> Config {
    let contents = match fs::read_to_string("config.toml") {
        Ok(c) => c,
        Err(_) => {
            eprintln!("Could not find config.toml, please create or ensure it's accessible");
            exit(1);
        }
    };

    let data: Config = match toml::from_str(&contents) {
        Ok(d) => d,
        Err(_) => {
            eprintln!("Unable to load data from config");
            exit(1);
        }
    };
    return data;
}
