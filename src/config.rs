//! Configuration types for board-backup

use crate::error::{Error, Result};
use crate::types::AssetKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Placeholder replaced by the plural asset kind in [`Config::asset_host_template`]
pub const KIND_PLACEHOLDER: &str = "{kind}";

/// Main configuration for a backup run
///
/// Defaults target the public service and write into the current directory,
/// which is what the command-line tool uses unless overridden.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Service base URL (default: "https://trello.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory receiving export files and asset directories (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Storage host that asset URLs must live under, with `{kind}` standing in
    /// for "attachments" or "backgrounds"
    /// (default: "trello-{kind}.s3.amazonaws.com")
    #[serde(default = "default_asset_host_template")]
    pub asset_host_template: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output_dir: default_output_dir(),
            asset_host_template: default_asset_host_template(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Check that the configuration can drive a run
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the base URL does not parse as an http(s)
    /// URL or the asset host template lacks the `{kind}` placeholder.
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;
        if !self.asset_host_template.contains(KIND_PLACEHOLDER) {
            return Err(Error::Config {
                message: format!(
                    "asset host template must contain {KIND_PLACEHOLDER}: {}",
                    self.asset_host_template
                ),
                key: Some("asset_host_template".to_string()),
            });
        }
        Ok(())
    }

    /// The base URL as a parsed [`Url`]
    pub fn parsed_base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL {}: {}", self.base_url, e),
            key: Some("base_url".to_string()),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::Config {
                message: format!("base URL must be an http(s) URL with a host: {}", self.base_url),
                key: Some("base_url".to_string()),
            });
        }
        Ok(url)
    }

    /// Storage host for one asset kind
    pub fn asset_host(&self, kind: AssetKind) -> String {
        self.asset_host_template
            .replace(KIND_PLACEHOLDER, kind.plural())
    }
}

fn default_base_url() -> String {
    "https://trello.com".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_asset_host_template() -> String {
    format!("trello-{KIND_PLACEHOLDER}.s3.amazonaws.com")
}

fn default_user_agent() -> String {
    concat!("board-backup/", env!("CARGO_PKG_VERSION")).to_string()
}
