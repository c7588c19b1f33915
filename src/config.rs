use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub data_dir: String,
    pub uploads_dir: String,
    pub jwt_secret: String,
    pub webhook_secret: String,
    pub webhook_url: Option<String>,
    pub admin_rps: u32,
    pub public_rps: u32,
    pub download_token_ttl_minutes: i64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            data_dir: get_env("DATA_DIR")?,
            uploads_dir: get_env("UPLOADS_DIR")?,
            jwt_secret: get_env("JWT_SECRET")?,
            webhook_secret: get_env("WEBHOOK_SECRET")?,
            webhook_url: env::var("WEBHOOK_URL").ok(),
            admin_rps: get_env_parse("ADMIN_RPS")?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            download_token_ttl_minutes: env::var("DOWNLOAD_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
