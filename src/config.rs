/// Configuration file and credential resolution.
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::CliError;

pub const DEFAULT_REGION: &str = "dd-na";

const REGION_ENDPOINTS: &[(&str, &str)] = &[
    ("dd-na", "https://api-na.dimensiondata.com"),
    ("dd-eu", "https://api-eu.dimensiondata.com"),
    ("dd-au", "https://api-au.dimensiondata.com"),
    ("dd-au-gov", "https://api-canberra.dimensiondata.com"),
    ("dd-af", "https://api-mea.dimensiondata.com"),
    ("dd-ap", "https://api-ap.dimensiondata.com"),
    ("dd-latam", "https://api-latam.dimensiondata.com"),
    ("dd-canada", "https://api-canada.dimensiondata.com"),
];

/// Base URL of the CloudControl API for a region name.
pub fn region_endpoint(region: &str) -> Option<&'static str> {
    REGION_ENDPOINTS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, url)| *url)
}

// config like:
// user = "fakeuser"
// password = "fakepass"
// region = "dd-eu"
// # endpoint overrides the region's URL
// endpoint = "https://api-eu.dimensiondata.com"
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    pub user: Option<String>,
    pub password: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;

        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".didata").join("config.toml"))
    }

    /// Load the named file, or the default file when it exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()));
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::debug!("Loading config from {}", path.display());
                Self::load(&path)
                    .with_context(|| format!("Failed to load config '{}'", path.display()))
            }
            _ => Ok(Self::default()),
        }
    }

    /// Merge command line values (flags or environment) over the file values.
    pub fn resolve(&self, overrides: &CredentialOverrides) -> Result<Credentials, CliError> {
        let user = overrides
            .user
            .clone()
            .or_else(|| self.user.clone())
            .ok_or_else(|| CliError::usage("Missing user: pass --user or set DIDATA_USER"))?;
        let password = overrides
            .password
            .clone()
            .or_else(|| self.password.clone())
            .ok_or_else(|| {
                CliError::usage("Missing password: pass --password or set DIDATA_PASSWORD")
            })?;
        let region = overrides
            .region
            .clone()
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let base_url = match overrides.endpoint.clone().or_else(|| self.endpoint.clone()) {
            Some(endpoint) => endpoint,
            None => region_endpoint(&region)
                .ok_or_else(|| {
                    let known: Vec<_> = REGION_ENDPOINTS.iter().map(|(n, _)| *n).collect();
                    CliError::usage(format!(
                        "Unknown region '{}', expected one of: {}",
                        region,
                        known.join(", ")
                    ))
                })?
                .to_string(),
        };

        Ok(Credentials {
            user,
            password,
            region,
            base_url,
        })
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct CredentialOverrides {
    pub user: Option<String>,
    pub password: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub region: String,
    pub base_url: String,
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.user, self.region, self.base_url)
    }
}
