use std::{env, net::{SocketAddr, ToSocketAddrs as _}};

use chrono::Duration;
use sea_orm::ConnectOptions;
use thiserror::Error;
use tracing::info;

use crate::consts::DEFAULT_TOKEN_TTL_HOURS;

pub struct Config {
    pub host_address: SocketAddr,

    pub database_opt: ConnectOptions,

    pub jwt_key: String,

    pub token_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment `{0}` is required to be set")]
    Missing(&'static str),

    #[error("environment `{0}` is not in a valid format")]
    Invalid(&'static str),

    #[error("unable to resolve host from `HOST_ADDRESS`")]
    Unresolved(#[from] std::io::Error),
}

pub fn load() -> Result<Config, ConfigError> {
    Ok(Config {
        host_address: load_host_address()?,
        database_opt: load_database_opt()?.into(),
        jwt_key: load_jwt_key()?,
        token_ttl: load_token_ttl()?,
    })
}

fn load_host_address() -> Result<SocketAddr, ConfigError> {
    info!("Loading environment `HOST_ADDRESS`");

    let var = env::var("HOST_ADDRESS").unwrap_or_else(|_| "127.0.0.1:0".to_string());

    var.to_socket_addrs()?
        .next()
        .ok_or(ConfigError::Invalid("HOST_ADDRESS"))
}

fn load_database_opt() -> Result<impl Into<ConnectOptions>, ConfigError> {
    info!("Loading environment `DATABASE_URL`");

    env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))
}

fn load_jwt_key() -> Result<String, ConfigError> {
    info!("Loading environment `JWT_SECRET`");

    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))
}

fn load_token_ttl() -> Result<Duration, ConfigError> {
    info!("Loading environment `TOKEN_TTL_HOURS`");

    parse_token_ttl(env::var("TOKEN_TTL_HOURS").ok().as_deref())
}

fn parse_token_ttl(var: Option<&str>) -> Result<Duration, ConfigError> {
    let Some(var) = var else {
        return Ok(Duration::hours(DEFAULT_TOKEN_TTL_HOURS));
    };

    match var.trim().parse::<i64>() {
        Ok(hours) if hours > 0 => Ok(Duration::hours(hours)),
        _ => Err(ConfigError::Invalid("TOKEN_TTL_HOURS")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_ttl() {
        assert_eq!(parse_token_ttl(None).unwrap(), Duration::hours(DEFAULT_TOKEN_TTL_HOURS));
        assert_eq!(parse_token_ttl(Some("12")).unwrap(), Duration::hours(12));

        assert!(matches!(parse_token_ttl(Some("0")), Err(ConfigError::Invalid(_))));
        assert!(matches!(parse_token_ttl(Some("soon")), Err(ConfigError::Invalid(_))));
    }
}
