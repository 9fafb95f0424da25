use std::env;

use log::warn;

const DEFAULT_DATABASE_URL: &str = "sqlite:///tmp/schedule.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const INSECURE_DEFAULT_SECRET: &str = "a-very-insecure-default-secret-key";

/// Process configuration, resolved once at startup and passed to the
/// components that need it instead of being read from the environment ad hoc.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!(
                "JWT_SECRET environment variable not set, falling back to an \
                 insecure default; set a strong secret in production"
            );
            INSECURE_DEFAULT_SECRET.to_string()
        });
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Self {
            database_url,
            jwt_secret,
            bind_addr,
        }
    }
}
