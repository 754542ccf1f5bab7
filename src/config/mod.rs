/// Configuration management for the wizard
///
/// Handles the local API listener, the generation service location and where
/// archives land when no save-as target is chosen.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Local API server configuration
    pub server: ServerConfig,
    /// Generation service configuration
    pub generator: GeneratorConfig,
    /// Archive fallback location
    pub download: DownloadConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "127.0.0.1")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Remote code-generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Base URL; requests go to `{api_url}/api/v1/generate`
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory archives are written to when there is no save-as target (default: ".")
    pub dir: String,
}

pub const DEFAULT_API_URL: &str = "http://osdk-backend-osdk.apps-crc.testing";

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("OSDK_WIZARD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: std::env::var("OSDK_WIZARD_PORT")
                    .unwrap_or_else(|_| "3005".to_string())
                    .parse()
                    .unwrap_or(3005),
            },
            generator: GeneratorConfig {
                api_url: std::env::var("OSDK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            },
            download: DownloadConfig {
                dir: std::env::var("OSDK_DOWNLOAD_DIR").unwrap_or_else(|_| ".".to_string()),
            },
        }
    }
}

impl Config {
    /// Apply command-line overrides on top of the environment
    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        download_dir: Option<String>,
        port: Option<u16>,
    ) -> Self {
        if let Some(api_url) = api_url {
            self.generator.api_url = api_url;
        }
        if let Some(dir) = download_dir {
            self.download.dir = dir;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }
}
