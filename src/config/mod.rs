/// 환경 변수 기반 설정
/// 경매 유지 시간(AUCTION_INTERVAL)은 잘못된 값이어도 기본값으로 대체되어 실패하지 않는다.
// region:    --- Imports
use std::env::VarError;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

// endregion: --- Imports

// region:    --- Constants
pub const AUCTION_INTERVAL_VAR: &str = "AUCTION_INTERVAL";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const DATABASE_MAX_CONNECTIONS_VAR: &str = "DATABASE_MAX_CONNECTIONS";
pub const BIND_ADDR_VAR: &str = "BIND_ADDR";

/// 경매 기본 유지 시간 (5분)
pub const DEFAULT_AUCTION_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// endregion: --- Constants

// region:    --- Config Error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
// endregion: --- Config Error

// region:    --- Auction Interval
/// 경매 유지 시간 조회. 값이 없거나 파싱할 수 없으면 기본값(5분)을 반환한다.
pub fn resolve_auction_interval() -> Duration {
    resolve_auction_interval_with(|key| std::env::var(key))
}

fn resolve_auction_interval_with<F>(lookup: F) -> Duration
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let Ok(raw) = lookup(AUCTION_INTERVAL_VAR) else {
        return DEFAULT_AUCTION_INTERVAL;
    };
    match parse_auction_interval(&raw) {
        Ok(interval) => interval,
        Err(e) => {
            warn!(
                "{:<12} --> {} - 기본값 {:?} 사용",
                "Config", e, DEFAULT_AUCTION_INTERVAL
            );
            DEFAULT_AUCTION_INTERVAL
        }
    }
}

/// "2s", "5m", "1h 30m" 형식의 문자열을 파싱
pub fn parse_auction_interval(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: AUCTION_INTERVAL_VAR.to_string(),
        reason,
    };
    let interval = humantime::parse_duration(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if interval.is_zero() {
        return Err(invalid("interval must be greater than zero".to_string()));
    }
    Ok(interval)
}
// endregion: --- Auction Interval

// region:    --- App Config
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub auction_interval: Duration,
}

impl AppConfig {
    /// .env 파일을 먼저 읽은 뒤 환경 변수로 설정 생성
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::build(|key| std::env::var(key))
    }

    fn build<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let database_url = lookup(DATABASE_URL_VAR)
            .map_err(|_| ConfigError::MissingEnvVar(DATABASE_URL_VAR.to_string()))?;

        let bind_addr = lookup(BIND_ADDR_VAR)
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: BIND_ADDR_VAR.to_string(),
                reason: e.to_string(),
            })?;

        let database_max_connections = match lookup(DATABASE_MAX_CONNECTIONS_VAR) {
            Ok(raw) => raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
                var: DATABASE_MAX_CONNECTIONS_VAR.to_string(),
                reason: e.to_string(),
            })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            database_max_connections,
            bind_addr,
            auction_interval: resolve_auction_interval_with(&lookup),
        })
    }
}
// endregion: --- App Config
