use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "moments", about = "A self-hosted social moments server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub moments: MomentsConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
}

/// Limits and defaults applied to moments, comments and the feed.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MomentsConfig {
    pub max_content_chars: usize,
    pub max_comment_chars: usize,
    pub preview_chars: usize,
    pub feed_default_limit: i64,
    pub feed_max_limit: i64,
    pub id_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "moments_session".to_string(),
            session_hours: 720,
        }
    }
}

impl Default for MomentsConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 2000,
            max_comment_chars: 1000,
            preview_chars: 100,
            feed_default_limit: 20,
            feed_max_limit: 100,
            id_prefix: "MOM".to_string(),
        }
    }
}

impl MomentsConfig {
    /// Clamp a requested page size into `[1, feed_max_limit]`.
    pub fn feed_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.feed_default_limit)
            .clamp(1, self.feed_max_limit.max(1))
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("moments.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".moments")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("moments.db"))
    }

    pub fn moments(&self) -> &MomentsConfig {
        &self.moments
    }
}
