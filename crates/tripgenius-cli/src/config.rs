//! Configuration file management for tripgenius.
//!
//! Provides a TOML-based config file at `~/.config/tripgenius/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.
//!
//! Secrets tighten with posture: in development a missing token secret
//! falls back to a fixed dev value with a warning; when `TRIPGENIUS_ENV`
//! is `production`, missing secrets abort instead of running insecurely.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use tripgenius_core::auth::token::TokenConfig;
use tripgenius_core::generate::gemini;
use tripgenius_db::config::DbConfig;

/// Signing secret used when none is configured outside production.
const DEV_TOKEN_SECRET: &[u8] = b"dev-secret-do-not-use-in-prod";

/// Default listening port when neither the CLI flag nor `PORT` is set.
const DEFAULT_PORT: u16 = 3000;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub auth: AuthSection,
    #[serde(default)]
    pub generator: GeneratorSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded token secret (64 hex chars = 32 bytes).
    pub token_secret: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeneratorSection {
    /// Gemini API key. `GEMINI_API_KEY` takes precedence.
    pub api_key: Option<String>,
    /// Model identifier; defaults to the client's built-in default.
    pub model: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the tripgenius config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/tripgenius` or
/// `~/.config/tripgenius`. We intentionally ignore the platform-specific
/// `dirs::config_dir()` (which returns `~/Library/Application Support` on
/// macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("tripgenius");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tripgenius")
}

/// Return the path to the tripgenius config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // Set permissions to 0600 (owner read/write only) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Token secret generation
// -----------------------------------------------------------------------

/// Generate a random token secret: 32 random bytes, hex-encoded (64 chars).
pub fn generate_token_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct TripgeniusConfig {
    pub db_config: DbConfig,
    pub token_config: TokenConfig,
    /// `None` means generation is unconfigured; the plan endpoint reports
    /// a misconfiguration error (or `serve` aborts in production).
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// Browser origins allowed by CORS. Empty means permissive (dev).
    pub allowed_origins: Vec<String>,
    pub port: u16,
    pub production: bool,
}

impl TripgeniusConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config
    /// file > default.
    ///
    /// - DB URL: `cli_db_url` > `TRIPGENIUS_DATABASE_URL` env >
    ///   `config_file.database.url` > `DbConfig::DEFAULT_URL`
    /// - Token secret: `TRIPGENIUS_TOKEN_SECRET` env >
    ///   `config_file.auth.token_secret` (hex-decoded) > dev fallback, or
    ///   an error in production
    /// - Gemini key: `GEMINI_API_KEY` env > `config_file.generator.api_key`
    /// - Origins: `TRIPGENIUS_ALLOWED_ORIGINS` (comma-separated)
    /// - Port: `PORT` env > 3000
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let production = std::env::var("TRIPGENIUS_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let file_config = load_config().ok();

        // DB URL resolution.
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("TRIPGENIUS_DATABASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        // Token secret resolution.
        let token_config = if let Ok(secret_hex) = std::env::var("TRIPGENIUS_TOKEN_SECRET") {
            let bytes = hex::decode(&secret_hex)
                .context("TRIPGENIUS_TOKEN_SECRET env var is not valid hex")?;
            TokenConfig::new(bytes)
        } else if let Some(ref cfg) = file_config {
            let bytes = hex::decode(&cfg.auth.token_secret)
                .context("invalid hex in config file token_secret")?;
            TokenConfig::new(bytes)
        } else if production {
            bail!(
                "token secret not found; set TRIPGENIUS_TOKEN_SECRET or run `tripgenius init` \
                 (refusing to fall back to the dev secret in production)"
            );
        } else {
            warn!("no token secret configured; using the dev fallback secret");
            TokenConfig::new(DEV_TOKEN_SECRET.to_vec())
        };

        // Generator resolution.
        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .or_else(|| file_config.as_ref().and_then(|c| c.generator.api_key.clone()))
            .filter(|k| !k.is_empty());
        let gemini_model = file_config
            .as_ref()
            .and_then(|c| c.generator.model.clone())
            .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());

        let allowed_origins = std::env::var("TRIPGENIUS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            db_config,
            token_config,
            gemini_api_key,
            gemini_model,
            allowed_origins,
            port,
            production,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
