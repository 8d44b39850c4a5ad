//! Start-up configuration read from the environment.

use std::fmt;

use thiserror::Error;
use traits_store::DEFAULT_BUCKET;
use url::Url;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE: &str = "(default)";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub project_id: String,
    pub database: String,
    pub bucket: String,
    pub access_token: Option<String>,
    pub firestore_base_url: Option<Url>,
    pub storage_base_url: Option<Url>,
    pub gemini_base_url: Option<Url>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("bucket", &self.bucket)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("firestore_base_url", &self.firestore_base_url)
            .field("storage_base_url", &self.storage_base_url)
            .field("gemini_base_url", &self.gemini_base_url)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let url = |name: &'static str| {
            var(name)
                .map(|raw| Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { var: name, source }))
                .transpose()
        };

        let api_key = var("API_KEY").ok_or(ConfigError::Missing("API_KEY"))?;
        let project_id =
            var("GOOGLE_CLOUD_PROJECT").ok_or(ConfigError::Missing("GOOGLE_CLOUD_PROJECT"))?;

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: var("PORT").and_then(|value| value.parse::<u16>().ok()).unwrap_or(DEFAULT_PORT),
            api_key,
            project_id,
            database: var("FIRESTORE_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            bucket: var("TRAITS_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            access_token: var("GOOGLE_ACCESS_TOKEN"),
            firestore_base_url: url("FIRESTORE_BASE_URL")?,
            storage_base_url: url("STORAGE_BASE_URL")?,
            gemini_base_url: url("GEMINI_BASE_URL")?,
        })
    }
}
