use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:birth_records.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:8080";
pub const DEFAULT_EXPORT_DIR: &str = "./certificates";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Site hosting the verification page; also the allowed CORS origin
    pub public_origin: String,
    pub export_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_addr = var("BIRTHREG_BIND_ADDR", DEFAULT_BIND_ADDR);

        Ok(AppConfig {
            database_url: var("BIRTHREG_DATABASE_URL", DEFAULT_DATABASE_URL),
            bind_addr: bind_addr
                .parse()
                .with_context(|| format!("BIRTHREG_BIND_ADDR is not a socket address: {}", bind_addr))?,
            public_origin: var("BIRTHREG_PUBLIC_ORIGIN", DEFAULT_PUBLIC_ORIGIN)
                .trim_end_matches('/')
                .to_string(),
            export_dir: PathBuf::from(var("BIRTHREG_EXPORT_DIR", DEFAULT_EXPORT_DIR)),
        })
    }
}
