use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::placement::PlacementConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub placement: PlacementSettings,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            placement: PlacementSettings::from_env(),
            storage: StorageConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const HOST_VAR: &'static str = "WAREHOUSE_LAYOUT_API_HOST";
    const PORT_VAR: &'static str = "WAREHOUSE_LAYOUT_API_PORT";
    const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let (bind_ip, display_host) = match env_string(Self::HOST_VAR) {
            Some(raw) => match raw.parse::<IpAddr>() {
                Ok(ip) => (ip, raw),
                Err(err) => {
                    warn!(
                        var = Self::HOST_VAR,
                        value = %raw,
                        error = %err,
                        fallback = %Self::DEFAULT_HOST,
                        "could not parse host, using default"
                    );
                    (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string())
                }
            },
            None => (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string()),
        };

        let port = match env_string(Self::PORT_VAR) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(
                        var = Self::PORT_VAR,
                        fallback = Self::DEFAULT_PORT,
                        "port must not be 0, using default"
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        var = Self::PORT_VAR,
                        value = %raw,
                        error = %err,
                        fallback = Self::DEFAULT_PORT,
                        "could not parse port, using default"
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_ip: Self::DEFAULT_HOST,
            display_host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
        }
    }
}

/// Placement and editing tolerances.
#[derive(Clone, Debug, Default)]
pub struct PlacementSettings {
    placement: PlacementConfig,
}

impl PlacementSettings {
    const OVERLAP_EPSILON_VAR: &'static str = "WAREHOUSE_LAYOUT_OVERLAP_EPSILON";
    const SNAP_ENABLED_VAR: &'static str = "WAREHOUSE_LAYOUT_SNAP_ENABLED";
    const HISTORY_LIMIT_VAR: &'static str = "WAREHOUSE_LAYOUT_HISTORY_LIMIT";
    const MIN_EXTENT_VAR: &'static str = "WAREHOUSE_LAYOUT_MIN_EXTENT";
    const MAX_HISTORY_LIMIT: usize = 200;

    fn from_env() -> Self {
        let overlap_epsilon = load_f64_with_warning(
            Self::OVERLAP_EPSILON_VAR,
            PlacementConfig::DEFAULT_OVERLAP_EPSILON,
            |value| (0.0..1.0).contains(&value),
            "must be at least 0 and below 1",
            "adjusted overlap tolerance changes which units count as supports",
        );

        let min_extent = load_f64_with_warning(
            Self::MIN_EXTENT_VAR,
            PlacementConfig::DEFAULT_MIN_EXTENT,
            |value| value > 0.0,
            "must be greater than 0",
            "adjusted minimum extent applies to every resize and import",
        );

        let snap_enabled = env_string(Self::SNAP_ENABLED_VAR)
            .and_then(|raw| parse_bool(&raw, Self::SNAP_ENABLED_VAR))
            .unwrap_or(PlacementConfig::DEFAULT_SNAP_ENABLED);

        let history_limit = load_usize_in_range(
            Self::HISTORY_LIMIT_VAR,
            PlacementConfig::DEFAULT_HISTORY_LIMIT,
            1..=Self::MAX_HISTORY_LIMIT,
        );

        let placement = PlacementConfig::builder()
            .overlap_epsilon(overlap_epsilon)
            .snap_enabled(snap_enabled)
            .history_limit(history_limit)
            .min_extent(min_extent)
            .build();

        Self { placement }
    }

    /// Returns the configured PlacementConfig.
    pub fn placement_config(&self) -> PlacementConfig {
        self.placement
    }
}

/// Where the multi-layout store is kept on disk.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    path: PathBuf,
}

impl StorageConfig {
    const PATH_VAR: &'static str = "WAREHOUSE_LAYOUT_STORE_PATH";
    const DEFAULT_PATH: &'static str = "warehouse_layouts.json";

    fn from_env() -> Self {
        let path = env_string(Self::PATH_VAR).unwrap_or_else(|| Self::DEFAULT_PATH.to_string());
        Self {
            path: PathBuf::from(path),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(Self::DEFAULT_PATH),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(var = name, error = %err, "could not read variable, using default");
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                var = var_name,
                value = other,
                "could not interpret value as boolean, using default"
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    notice: &str,
) -> f64 {
    let Some(raw) = env_string(var_name) else {
        return default;
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = (default.abs().max(1.0)) * 1e-9;
            if (value - default).abs() > tolerance {
                info!(var = var_name, value, "{notice}");
            }
            value
        }
        Ok(_) => {
            warn!(
                var = var_name,
                value = %raw,
                fallback = default,
                "invalid value: {invalid_hint}"
            );
            default
        }
        Err(err) => {
            warn!(
                var = var_name,
                value = %raw,
                error = %err,
                fallback = default,
                "could not parse number, using default"
            );
            default
        }
    }
}

fn load_usize_in_range(
    var_name: &str,
    default: usize,
    range: std::ops::RangeInclusive<usize>,
) -> usize {
    let Some(raw) = env_string(var_name) else {
        return default;
    };
    match raw.parse::<usize>() {
        Ok(value) if range.contains(&value) => value,
        Ok(value) => {
            warn!(
                var = var_name,
                value,
                min = *range.start(),
                max = *range.end(),
                fallback = default,
                "value out of range, using default"
            );
            default
        }
        Err(err) => {
            warn!(
                var = var_name,
                value = %raw,
                error = %err,
                fallback = default,
                "could not parse integer, using default"
            );
            default
        }
    }
}
