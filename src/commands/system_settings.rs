//! System settings command implementations

use anyhow::Result;
use serde_json::json;
use tabled::Tabled;

use crate::api::KdClient;
use crate::cli::SystemSettingsCommand;
use crate::config::RuntimeContext;
use crate::models::{display_value, SystemSetting};
use crate::output::{output_for_format, print_list, print_output, truncate};
use crate::resolve::resolve;

#[derive(Debug, Tabled)]
struct SettingRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "VALUE")]
    value: String,
    #[tabled(rename = "LABEL")]
    label: String,
}

impl From<&SystemSetting> for SettingRow {
    fn from(setting: &SystemSetting) -> Self {
        Self {
            id: setting.id,
            name: setting.name.clone(),
            value: truncate(&display_value(&setting.value), 40),
            label: setting.label.clone().unwrap_or_default(),
        }
    }
}

pub async fn run(ctx: &RuntimeContext, command: SystemSettingsCommand) -> Result<()> {
    match command {
        SystemSettingsCommand::List => {
            let client = KdClient::new(ctx)?;
            let settings: Vec<SystemSetting> = client.list().await?;
            let rows: Vec<SettingRow> = settings.iter().map(SettingRow::from).collect();
            print_list(ctx, &settings, rows, "No system settings found")
        }
        SystemSettingsCommand::Get { selector } => {
            let client = KdClient::new(ctx)?;
            let id = resolve::<SystemSetting>(&client, &selector).await?;
            let setting: SystemSetting = client.get(&id).await?;
            output_for_format(ctx, &setting, || {
                println!("ID:    {}", setting.id);
                println!("Name:  {}", setting.name);
                println!("Value: {}", display_value(&setting.value));
                if let Some(label) = &setting.label {
                    println!("Label: {label}");
                }
                if let Some(description) = &setting.description {
                    println!();
                    println!("{description}");
                }
                Ok(())
            })
        }
        SystemSettingsCommand::Update { selector, value } => {
            let client = KdClient::new(ctx)?;
            let id = resolve::<SystemSetting>(&client, &selector).await?;
            let result = client
                .patch::<SystemSetting>(&id, &json!({ "value": value }))
                .await?;
            print_output(ctx, &result)
        }
    }
}
