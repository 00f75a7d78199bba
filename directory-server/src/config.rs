//! Process configuration read from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::{ResourceTypes, ResourceTypesError};
use crate::transit::TransitConfig;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATABASE: &str = "directory.sqlite3";
const DEFAULT_GTFS_DIR: &str = "gtfs";

/// Errors building the configuration. All of them abort startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} is not {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to load resource types from {}: {source}", path.display())]
    ResourceTypes {
        path: PathBuf,
        #[source]
        source: ResourceTypesError,
    },
}

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,

    /// Directory holding the GTFS text files.
    pub gtfs_dir: PathBuf,

    /// JSON catalog of resource types; the built-in list when absent.
    pub resource_types_path: Option<PathBuf>,

    pub transit: TransitConfig,
}

impl ServerConfig {
    /// Read `DIRECTORY_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// Unset and empty variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_raw = get("DIRECTORY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                var: "DIRECTORY_BIND_ADDR",
                value: bind_raw.clone(),
                expected: "a socket address",
            })?;

        let mut transit = TransitConfig::default();
        if let Some(raw) = get("DIRECTORY_MAX_WALK_MILES") {
            let miles = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|m| m.is_finite() && *m > 0.0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "DIRECTORY_MAX_WALK_MILES",
                    value: raw.clone(),
                    expected: "a positive number of miles",
                })?;
            transit = transit.with_default_max_walk(miles);
        }

        Ok(Self {
            bind_addr,
            database_path: get("DIRECTORY_DATABASE")
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
                .into(),
            gtfs_dir: get("DIRECTORY_GTFS_DIR")
                .unwrap_or_else(|| DEFAULT_GTFS_DIR.to_string())
                .into(),
            resource_types_path: get("DIRECTORY_RESOURCE_TYPES").map(PathBuf::from),
            transit,
        })
    }

    /// Load the configured resource type catalog.
    pub fn load_resource_types(&self) -> Result<ResourceTypes, ConfigError> {
        match &self.resource_types_path {
            None => Ok(ResourceTypes::builtin()),
            Some(path) => {
                ResourceTypes::from_json_file(path).map_err(|source| ConfigError::ResourceTypes {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}
