use crate::error::ConfigError;
use crate::request::QrRequest;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    pub api_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub event_id: Option<u64>,
    #[serde(default)]
    pub payload: Option<String>,
}

impl Config {
    pub fn load(filename: &str) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(filename)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        let mut config: Config = toml::from_str(text)?;

        let url = reqwest::Url::parse(&config.api_url).map_err(|e| ConfigError::InvalidUrl {
            url: config.api_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: config.api_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        config.api_url = config.api_url.trim_end_matches('/').to_string();

        config.listen_addr()?;
        config.startup_request()?;
        Ok(config)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .parse()
            .map_err(|_| ConfigError::InvalidListen(self.listen.clone()))
    }

    /// The request rendered once when the server starts, if configured.
    pub fn startup_request(&self) -> Result<Option<QrRequest>, ConfigError> {
        match (self.event_id, &self.payload) {
            (Some(_), Some(_)) => Err(ConfigError::Conflict),
            (Some(id), None) => Ok(Some(QrRequest::event(id)?)),
            (None, Some(payload)) => Ok(Some(QrRequest::payload(payload.as_str())?)),
            (None, None) => Ok(None),
        }
    }
}

fn default_listen() -> String {
    String::from("127.0.0.1:8080")
}

fn default_log_level() -> String {
    String::from("info")
}
