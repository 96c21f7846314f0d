//! Login and logout command implementations

use anyhow::{anyhow, Result};

use crate::api::{Auth, ClientSettings, KdClient};
use crate::config::RuntimeContext;
use crate::session::{self, Session};

pub async fn login(ctx: &RuntimeContext) -> Result<()> {
    let server = ctx.server_url()?;
    let user = ctx.user().ok_or_else(|| {
        anyhow!(
            "No user name given.\n\
            Set via --user, KD_USER env var, or in config file."
        )
    })?;
    let password = ctx.password().ok_or_else(|| {
        anyhow!(
            "No password given.\n\
            Set via --password, KD_PASSWORD env var, or in config file."
        )
    })?;

    let client = KdClient::from_settings(ClientSettings {
        base_url: server.to_string(),
        auth: Auth::None,
        timeout: ctx.timeout(),
        insecure: ctx.insecure(),
    })?;
    let token = client.login(user, password).await?;

    let path = Session::new(server, user, token).save()?;
    log::debug!("Session stored at {}", path.display());

    if !ctx.global.quiet {
        println!("Logged in to {server} as {user}");
    }
    Ok(())
}

pub fn logout(ctx: &RuntimeContext) -> Result<()> {
    let removed = session::clear()?;
    if !ctx.global.quiet {
        if removed {
            println!("Logged out");
        } else {
            println!("No stored session");
        }
    }
    Ok(())
}
