//! Predefined application command implementations
//!
//! Predefined apps are YAML templates stored on the server. `create-pod`
//! instantiates one for a chosen plan with user-supplied variable values.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use tabled::Tabled;

use crate::api::KdClient;
use crate::cli::PredefinedAppsCommand;
use crate::config::RuntimeContext;
use crate::models::PredefinedApp;
use crate::output::{
    output_for_format, print_list, print_message, print_output, read_template, read_values,
};
use crate::resolve::resolve;

#[derive(Debug, Tabled)]
struct AppRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ORIGIN")]
    origin: String,
    #[tabled(rename = "MODIFIED")]
    modified: String,
}

impl From<&PredefinedApp> for AppRow {
    fn from(app: &PredefinedApp) -> Self {
        Self {
            id: app.id,
            name: app.name.clone(),
            origin: app.origin.clone().unwrap_or_else(|| "-".to_string()),
            modified: app
                .modified
                .as_deref()
                .or(app.created.as_deref())
                .unwrap_or("-")
                .to_string(),
        }
    }
}

pub async fn run(ctx: &RuntimeContext, command: PredefinedAppsCommand) -> Result<()> {
    match command {
        PredefinedAppsCommand::List { file_only } => list(ctx, file_only).await,
        PredefinedAppsCommand::Get {
            selector,
            file_only,
        } => {
            let client = KdClient::new(ctx)?;
            let id = resolve::<PredefinedApp>(&client, &selector).await?;
            get(ctx, &client, &id, file_only).await
        }
        PredefinedAppsCommand::Create {
            name,
            origin,
            template,
        } => {
            let template = read_template(&template)?;
            let client = KdClient::new(ctx)?;
            let body = json!({ "name": name, "origin": origin, "template": template });
            let result = client.create::<PredefinedApp>(&body).await?;
            print_output(ctx, &result)
        }
        PredefinedAppsCommand::Update {
            selector,
            new_name,
            template,
        } => {
            let template = read_template(&template)?;
            let client = KdClient::new(ctx)?;
            let id = resolve::<PredefinedApp>(&client, &selector).await?;
            let mut body = json!({ "template": template });
            if let Some(name) = new_name {
                body["name"] = json!(name);
            }
            let result = client.update::<PredefinedApp>(&id, &body).await?;
            print_output(ctx, &result)
        }
        PredefinedAppsCommand::Delete { selector } => {
            let client = KdClient::new(ctx)?;
            let id = resolve::<PredefinedApp>(&client, &selector).await?;
            client.delete::<PredefinedApp>(&id).await?;
            print_message(ctx, &format!("Predefined app {id} deleted"));
            Ok(())
        }
        PredefinedAppsCommand::CreatePod {
            selector,
            plan,
            values,
        } => {
            let values = read_values(&values)?;
            let client = KdClient::new(ctx)?;
            let id = resolve::<PredefinedApp>(&client, &selector).await?;
            let pod = client.create_pod_from_app(&id, plan, &values).await?;
            print_output(ctx, &pod)
        }
        PredefinedAppsCommand::ValidateTemplate { template } => {
            let template = read_template(&template)?;
            let client = KdClient::new(ctx)?;
            let result = client.validate_template(&template).await?;
            output_for_format(ctx, &result, || {
                println!("Template is valid");
                Ok(())
            })
        }
    }
}

async fn list(ctx: &RuntimeContext, file_only: bool) -> Result<()> {
    let client = KdClient::new(ctx)?;
    let data = client.list_predefined_apps(file_only).await?;

    if file_only {
        return output_for_format(ctx, &data, || {
            let templates = templates_of(&data);
            if templates.is_empty() {
                println!("No predefined apps found");
            } else {
                println!("{}", templates.join("\n---\n"));
            }
            Ok(())
        });
    }

    let apps: Vec<PredefinedApp> =
        serde_json::from_value(data).context("decoding predefined apps")?;
    let rows: Vec<AppRow> = apps.iter().map(AppRow::from).collect();
    print_list(ctx, &apps, rows, "No predefined apps found")
}

async fn get(ctx: &RuntimeContext, client: &KdClient, id: &str, file_only: bool) -> Result<()> {
    let app: PredefinedApp = client.get(id).await?;

    if file_only {
        let template = app
            .template
            .as_deref()
            .ok_or_else(|| anyhow!("Predefined app {id} has no template"))?;
        print!("{template}");
        if !template.ends_with('\n') {
            println!();
        }
        return Ok(());
    }

    output_for_format(ctx, &app, || {
        let row = AppRow::from(&app);
        println!("ID:       {}", row.id);
        println!("Name:     {}", row.name);
        println!("Origin:   {}", row.origin);
        println!("Modified: {}", row.modified);
        if let Some(template) = &app.template {
            println!();
            println!("{template}");
        }
        Ok(())
    })
}

/// Template texts from a file-only listing: either plain strings or
/// objects carrying a `template` field
fn templates_of(data: &Value) -> Vec<&str> {
    data.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.as_str()
                        .or_else(|| item.get("template").and_then(Value::as_str))
                })
                .map(|t| t.trim_end())
                .collect()
        })
        .unwrap_or_default()
}
