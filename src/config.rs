// src/config.rs

use std::env;
use std::net::SocketAddr;

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When absent the in-memory store is used.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    /// Whether a recipe owner may mark their own recipe.
    pub allow_self_rating: bool,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set")?;

        let jwt_expiration = match env::var("JWT_EXPIRATION") {
            Ok(raw) => raw.parse::<u64>()?,
            Err(_) => 86_400,
        };

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let allow_self_rating = match env::var("ALLOW_SELF_RATING") {
            Ok(raw) => parse_flag(&raw).ok_or("ALLOW_SELF_RATING must be true or false")?,
            Err(_) => false,
        };

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            allow_self_rating,
            bind_addr,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
