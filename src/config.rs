// Configuration - Runtime settings read from the environment
// A .env file is loaded first when present.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::tsunami_model::{ArrivalDepth, TsunamiOptions};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_NEOWS_BASE_URL: &str = "https://api.nasa.gov/neo/rest/v1";
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2500;
const DEFAULT_CATALOG_CACHE_SECS: u64 = 3600;

/// People per km² assumed when no population resolver answers.
pub const DEFAULT_POPULATION_DENSITY: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub nasa_api_key: Option<String>,
    pub neows_base_url: String,
    pub lookup_timeout: Duration,
    pub catalog_cache_ttl: Duration,
    pub default_population_density: f64,
    pub tsunami: TsunamiOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            nasa_api_key: None,
            neows_base_url: DEFAULT_NEOWS_BASE_URL.to_string(),
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_SECS),
            default_population_density: DEFAULT_POPULATION_DENSITY,
            tsunami: TsunamiOptions::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env locally; safe to ignore when not present.
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = parsed::<IpAddr, _>(&lookup, "IMPACT_LAB_HOST")
            .unwrap_or(defaults.bind_addr.ip());
        let port = parsed::<u16, _>(&lookup, "IMPACT_LAB_PORT").unwrap_or(DEFAULT_PORT);

        let nasa_api_key = lookup("NASA_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let neows_base_url = lookup("NEOWS_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.neows_base_url);

        let lookup_timeout = parsed::<u64, _>(&lookup, "LOOKUP_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.lookup_timeout);

        let catalog_cache_ttl = parsed::<u64, _>(&lookup, "CATALOG_CACHE_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.catalog_cache_ttl);

        let default_population_density = parsed::<f64, _>(&lookup, "DEFAULT_POPULATION_DENSITY")
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(DEFAULT_POPULATION_DENSITY);

        let arrival_depth = match lookup("TSUNAMI_ARRIVAL_DEPTH").as_deref() {
            Some("fixed") => ArrivalDepth::FixedShelf,
            Some("resolved") | None => ArrivalDepth::Resolved,
            Some(other) => {
                tracing::warn!(value = other, "unknown TSUNAMI_ARRIVAL_DEPTH, using resolved");
                ArrivalDepth::Resolved
            }
        };
        let depth_floor = parsed::<bool, _>(&lookup, "TSUNAMI_DEPTH_FLOOR").unwrap_or(true);

        Self {
            bind_addr: SocketAddr::new(host, port),
            nasa_api_key,
            neows_base_url,
            lookup_timeout,
            catalog_cache_ttl,
            default_population_density,
            tsunami: TsunamiOptions {
                depth_floor,
                arrival_depth,
            },
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
