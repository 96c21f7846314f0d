//! Config command implementations

use anyhow::Result;

use crate::cli::ConfigCommand;
use crate::config::{self as app_config, RuntimeContext};
use crate::output::print_output;

const REDACTED: &str = "********";

pub fn run(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Path => path(ctx),
        ConfigCommand::Get { key } => get(ctx, key.as_deref()),
        ConfigCommand::Reset => reset(ctx),
    }
}

fn show(ctx: &RuntimeContext) -> Result<()> {
    print_output(ctx, &redacted(&ctx.config))?;
    Ok(())
}

fn path(ctx: &RuntimeContext) -> Result<()> {
    println!("{}", ctx.config_path().display());
    Ok(())
}

fn get(ctx: &RuntimeContext, key: Option<&str>) -> Result<()> {
    if let Some(key) = key {
        // Get a specific key using dot notation
        let value = get_config_value(&ctx.config, key)?;
        println!("{value}");
    } else {
        show(ctx)?;
    }
    Ok(())
}

fn reset(ctx: &RuntimeContext) -> Result<()> {
    app_config::write_default_config(ctx.config_path())?;
    println!(
        "Configuration reset to defaults at: {}",
        ctx.config_path().display()
    );
    Ok(())
}

/// Copy of the config with secrets masked
fn redacted(config: &app_config::AppConfig) -> app_config::AppConfig {
    let mut config = config.clone();
    if config.kuberdock.password.is_some() {
        config.kuberdock.password = Some(REDACTED.to_string());
    }
    if config.kuberdock.token.is_some() {
        config.kuberdock.token = Some(REDACTED.to_string());
    }
    config
}

fn get_config_value(config: &app_config::AppConfig, key: &str) -> Result<String> {
    // Convert config to JSON for easy traversal
    let json = serde_json::to_value(config)?;

    let mut current = &json;
    for part in key.split('.') {
        current = current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {key}"))?;
    }

    Ok(match current {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "null".to_string(),
        other => serde_json::to_string(other)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_get_config_value() {
        let config = AppConfig::default();

        assert_eq!(get_config_value(&config, "kuberdock.timeout").unwrap(), "30");
        assert_eq!(get_config_value(&config, "session.ttl").unwrap(), "3600");
        assert_eq!(get_config_value(&config, "kuberdock.server").unwrap(), "null");
        assert!(get_config_value(&config, "nonexistent.key").is_err());
    }

    #[test]
    fn test_show_redacts_secrets() {
        let mut config = AppConfig::default();
        config.kuberdock.password = Some("hunter2".to_string());
        config.kuberdock.user = Some("admin".to_string());

        let shown = redacted(&config);
        assert_eq!(shown.kuberdock.password.as_deref(), Some(REDACTED));
        assert_eq!(shown.kuberdock.user.as_deref(), Some("admin"));
        assert!(shown.kuberdock.token.is_none());
    }
}
