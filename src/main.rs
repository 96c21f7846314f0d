//! kdctl - a command-line management client for KuberDock
//!
//! Manages domains, images, pods, predefined applications, persistent
//! storage and system settings of a KuberDock cluster over its REST API.

mod api;
mod cli;
mod commands;
mod config;
mod error;
mod models;
mod output;
mod resolve;
mod session;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::RuntimeContext;

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(io::stderr(), "Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    // Completions need neither config nor network
    if let Command::Completions { shell } = cli.command {
        return commands::completions::run(shell);
    }

    let ctx = RuntimeContext::new(&cli.global)?;
    ctx.init_logging()?;

    log::debug!("Config loaded from: {:?}", ctx.config_path());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_command(&ctx, cli.command))
}

async fn run_command(ctx: &RuntimeContext, command: Command) -> Result<()> {
    match command {
        Command::Domains { command } => commands::domains::run(ctx, command).await,
        Command::Images { command } => commands::images::run(ctx, command).await,
        Command::Pods { command } => commands::pods::run(ctx, command).await,
        Command::PredefinedApps { command } => commands::predefined_apps::run(ctx, command).await,
        Command::Pstorage { command } => commands::pstorage::run(ctx, command).await,
        Command::SystemSettings { command } => commands::system_settings::run(ctx, command).await,
        Command::Login => commands::login::login(ctx).await,
        Command::Logout => commands::login::logout(ctx),
        Command::Config { command } => commands::config::run(ctx, command),
        Command::Completions { shell } => commands::completions::run(shell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
