//! Configuration management for kdctl
//!
//! Supports:
//! - TOML config file at XDG locations
//! - Environment variable overrides
//! - Command-line argument overrides

use std::env;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat};
use env_logger::fmt::WriteStyle;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::api::{Auth, ClientSettings};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::session::Session;

const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Runtime context containing resolved configuration
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    pub global: GlobalOpts,
    pub config: AppConfig,
    config_path: PathBuf,
}

impl RuntimeContext {
    pub fn new(global: &GlobalOpts) -> Result<Self> {
        let config_path = resolve_config_path(global.config.as_ref())?;
        let config = load_config(&config_path, global)?;

        Ok(Self {
            global: global.clone(),
            config,
            config_path,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn init_logging(&self) -> Result<()> {
        if self.global.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }

        let mut builder = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(&self.config.logging.level),
        );

        if let Some(level) = self.cli_log_level() {
            builder.filter_level(level);
        }

        let force_color = env::var_os("FORCE_COLOR").is_some();
        let disable_color = self.global.no_color
            || env::var_os("NO_COLOR").is_some()
            || (!force_color && !std::io::stderr().is_terminal());

        if disable_color {
            builder.write_style(WriteStyle::Never);
        } else if force_color {
            builder.write_style(WriteStyle::Always);
        } else {
            builder.write_style(WriteStyle::Auto);
        }

        builder.try_init().or_else(|err| {
            if self.global.verbose > 0 {
                eprintln!("logger already initialized: {err}");
            }
            Ok(())
        })
    }

    /// Level requested on the command line; `None` leaves the config/env level
    fn cli_log_level(&self) -> Option<LevelFilter> {
        if self.global.trace {
            Some(LevelFilter::Trace)
        } else if self.global.debug {
            Some(LevelFilter::Debug)
        } else {
            match self.global.verbose {
                0 => None,
                1 => Some(LevelFilter::Info),
                2 => Some(LevelFilter::Debug),
                _ => Some(LevelFilter::Trace),
            }
        }
    }

    /// Get the effective server URL
    pub fn server_url(&self) -> Result<&str> {
        self.global
            .server
            .as_deref()
            .or(self.config.kuberdock.server.as_deref())
            .ok_or_else(|| {
                anyhow!(
                    "No KuberDock server configured.\n\
                    Set via --server, KD_SERVER env var, or in config file."
                )
            })
    }

    /// Get the effective user name
    pub fn user(&self) -> Option<&str> {
        self.global
            .user
            .as_deref()
            .or(self.config.kuberdock.user.as_deref())
    }

    /// Get the effective password
    pub fn password(&self) -> Option<&str> {
        self.global
            .password
            .as_deref()
            .or(self.config.kuberdock.password.as_deref())
    }

    /// Pick credentials: explicit token, then a stored login session for
    /// this server, then user/password
    pub fn auth(&self) -> Result<Auth> {
        if let Some(token) = self
            .global
            .token
            .as_deref()
            .or(self.config.kuberdock.token.as_deref())
        {
            return Ok(Auth::Token(token.to_string()));
        }

        let server = self.server_url()?;
        match Session::load(server, self.config.session.ttl) {
            Ok(Some(session)) => {
                log::debug!("Using stored session for {}", session.user);
                return Ok(Auth::Token(session.token));
            }
            Ok(None) => {}
            Err(err) => log::warn!("Ignoring unreadable session file: {err:#}"),
        }

        match (self.user(), self.password()) {
            (Some(user), Some(password)) => Ok(Auth::Basic {
                user: user.to_string(),
                password: password.to_string(),
            }),
            _ => Ok(Auth::None),
        }
    }

    /// Get the effective timeout in seconds
    pub fn timeout(&self) -> u64 {
        self.global.timeout.unwrap_or(self.config.kuberdock.timeout)
    }

    /// Check if SSL verification should be skipped
    pub fn insecure(&self) -> bool {
        self.global.insecure || self.config.kuberdock.insecure
    }

    /// Settings for building an API client
    pub fn client_settings(&self) -> Result<ClientSettings> {
        Ok(ClientSettings {
            base_url: self.server_url()?.to_string(),
            auth: self.auth()?,
            timeout: self.timeout(),
            insecure: self.insecure(),
        })
    }

    /// Get the effective output format
    pub fn output_format(&self) -> OutputFormat {
        if self.global.json {
            return OutputFormat::Json;
        }
        self.global
            .output_format
            .unwrap_or(match self.config.output.format.as_str() {
                "json" => OutputFormat::Json,
                "yaml" => OutputFormat::Yaml,
                "table" => OutputFormat::Table,
                _ => OutputFormat::Auto,
            })
    }
}

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub kuberdock: KuberDockConfig,
    pub session: SessionConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KuberDockConfig {
    pub server: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub timeout: u64,
    pub insecure: bool,
}

impl Default for KuberDockConfig {
    fn default() -> Self {
        Self {
            server: None,
            user: None,
            password: None,
            token: None,
            timeout: 30,
            insecure: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a stored login token is reused
    pub ttl: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl: 3600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub no_headers: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "auto".to_string(),
            no_headers: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

fn resolve_config_path(override_path: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        let expanded = expand_path(path)?;
        if expanded.is_dir() {
            return Ok(expanded.join("config.toml"));
        }
        return Ok(expanded);
    }

    Ok(default_config_dir()?.join("config.toml"))
}

fn load_config(config_path: &Path, global: &GlobalOpts) -> Result<AppConfig> {
    // Create default config if it doesn't exist
    if !config_path.exists() {
        write_default_config(config_path)?;
    }

    let config = Config::builder()
        .set_default("kuberdock.timeout", 30_i64)?
        .set_default("kuberdock.insecure", false)?
        .set_default("session.ttl", 3600_i64)?
        .set_default("output.format", "auto")?
        .set_default("output.no_headers", false)?
        .set_default("logging.level", "warn")?
        .add_source(
            File::from(config_path)
                .format(FileFormat::Toml)
                .required(false),
        )
        // KDCTL__SECTION__KEY overrides any value
        .add_source(
            Environment::with_prefix("KDCTL")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut app_config: AppConfig = config.try_deserialize()?;

    // Apply CLI overrides
    if global.no_headers {
        app_config.output.no_headers = true;
    }

    Ok(app_config)
}

pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }

    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config).context("serializing default config")?;

    let content = format!(
        "# kdctl configuration\n\
        # File: {}\n\
        #\n\
        # Environment variables:\n\
        #   KD_SERVER   - KuberDock server URL\n\
        #   KD_USER     - User name\n\
        #   KD_PASSWORD - Password\n\
        #   KD_TOKEN    - API token\n\
        #   KDCTL__*    - Override any config value (e.g., KDCTL__LOGGING__LEVEL=debug)\n\
        \n\
        {toml}",
        path.display()
    );

    fs::write(path, content).with_context(|| format!("writing config to {}", path.display()))
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    if let Some(text) = path.to_str() {
        let expanded = shellexpand::full(text).context("expanding path")?;
        Ok(PathBuf::from(expanded.to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_opts() -> GlobalOpts {
        GlobalOpts {
            output_format: None,
            json: false,
            server: None,
            user: None,
            password: None,
            token: None,
            timeout: None,
            insecure: false,
            config: None,
            quiet: false,
            verbose: 0,
            debug: false,
            trace: false,
            no_color: false,
            no_headers: false,
        }
    }

    fn context(global: GlobalOpts, config: AppConfig) -> RuntimeContext {
        RuntimeContext {
            global,
            config,
            config_path: PathBuf::from("/nonexistent/config.toml"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.kuberdock.timeout, 30);
        assert!(!config.kuberdock.insecure);
        assert_eq!(config.session.ttl, 3600);
        assert_eq!(config.output.format, "auto");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[kuberdock]"));
        assert!(toml.contains("[session]"));
        assert!(toml.contains("[output]"));
        assert!(toml.contains("[logging]"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[kuberdock]\nserver = \"https://kd.example.com\"\ntimeout = 5\n",
        )
        .unwrap();

        let config = load_config(&path, &global_opts()).unwrap();
        assert_eq!(
            config.kuberdock.server.as_deref(),
            Some("https://kd.example.com")
        );
        assert_eq!(config.kuberdock.timeout, 5);
        assert_eq!(config.output.format, "auto");
    }

    #[test]
    fn test_missing_config_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        load_config(&path, &global_opts()).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# kdctl configuration"));
        assert!(written.contains("[kuberdock]"));
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = AppConfig::default();
        config.kuberdock.server = Some("https://from-config".to_string());
        config.kuberdock.timeout = 10;

        let mut global = global_opts();
        global.server = Some("https://from-cli".to_string());
        global.timeout = Some(60);
        global.json = true;

        let ctx = context(global, config);
        assert_eq!(ctx.server_url().unwrap(), "https://from-cli");
        assert_eq!(ctx.timeout(), 60);
        assert_eq!(ctx.output_format(), OutputFormat::Json);
    }

    #[test]
    fn test_auth_prefers_token() {
        let mut config = AppConfig::default();
        config.kuberdock.server = Some("https://kd".to_string());
        config.kuberdock.token = Some("secret".to_string());
        config.kuberdock.user = Some("admin".to_string());
        config.kuberdock.password = Some("pw".to_string());

        let ctx = context(global_opts(), config);
        assert_eq!(ctx.auth().unwrap(), Auth::Token("secret".to_string()));
    }

    #[test]
    fn test_missing_server_is_an_error() {
        let ctx = context(global_opts(), AppConfig::default());
        let err = ctx.server_url().unwrap_err();
        assert!(err.to_string().contains("No KuberDock server configured"));
    }
}
