//! Server configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

/// Default room time-to-live: four weeks.
pub const DEFAULT_ROOM_TTL_SECS: u64 = 2_419_200;

/// Default interval between expiry sweeps: one week.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 604_800;

/// Deck a freshly created room starts with.
pub const DEFAULT_VOTING_CARD: &str = "Fibonacci";

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// Idle time after which a room becomes eligible for removal.
    pub room_ttl: Duration,

    /// How often the background sweep looks for expired rooms.
    pub sweep_interval: Duration,

    /// Voting card a new room is created with.
    pub default_voting_card: String,

    /// Mount a permissive CORS layer in front of every route.
    pub cors_permissive: bool,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()?;

        let room_ttl = Duration::from_secs(parse_env("ROOM_TTL_SECS", DEFAULT_ROOM_TTL_SECS));
        let sweep_interval = Duration::from_secs(
            parse_env("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS).max(1),
        );
        let default_voting_card = std::env::var("DEFAULT_VOTING_CARD")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VOTING_CARD.to_string());
        let cors_permissive = parse_env_bool("CORS_PERMISSIVE", true);

        Ok(Self {
            listen_addr,
            room_ttl,
            sweep_interval,
            default_voting_card,
            cors_permissive,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            room_ttl: Duration::from_secs(DEFAULT_ROOM_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            default_voting_card: DEFAULT_VOTING_CARD.to_string(),
            cors_permissive: true,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
