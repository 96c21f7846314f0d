//! Persistent storage command implementations

use anyhow::{bail, Result};
use serde_json::json;
use tabled::Tabled;

use crate::api::KdClient;
use crate::cli::PstorageCommand;
use crate::config::RuntimeContext;
use crate::models::PersistentDisk;
use crate::output::{output_for_format, print_list, print_message, print_output};
use crate::resolve::resolve;

#[derive(Debug, Tabled)]
struct DiskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "SIZE (GB)")]
    size: u64,
    #[tabled(rename = "IN USE")]
    in_use: &'static str,
    #[tabled(rename = "POD")]
    pod: String,
}

impl From<&PersistentDisk> for DiskRow {
    fn from(disk: &PersistentDisk) -> Self {
        Self {
            id: disk.id.clone(),
            name: disk.name.clone(),
            size: disk.size,
            in_use: if disk.in_use { "yes" } else { "no" },
            pod: disk.pod_name.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub async fn run(ctx: &RuntimeContext, command: PstorageCommand) -> Result<()> {
    match command {
        PstorageCommand::List { free_only } => {
            let client = KdClient::new(ctx)?;
            let disks = client.list_disks(free_only).await?;
            let rows: Vec<DiskRow> = disks.iter().map(DiskRow::from).collect();
            print_list(ctx, &disks, rows, "No persistent volumes found")
        }
        PstorageCommand::Get { selector } => {
            let client = KdClient::new(ctx)?;
            let id = resolve::<PersistentDisk>(&client, &selector).await?;
            let disk: PersistentDisk = client.get(&id).await?;
            output_for_format(ctx, &disk, || {
                let row = DiskRow::from(&disk);
                println!("ID:     {}", row.id);
                println!("Name:   {}", row.name);
                println!("Size:   {} GB", row.size);
                println!("In use: {}", row.in_use);
                println!("Pod:    {}", row.pod);
                Ok(())
            })
        }
        PstorageCommand::Create { name, size } => {
            validate_size(size)?;
            let client = KdClient::new(ctx)?;
            let result = client
                .create::<PersistentDisk>(&json!({ "name": name, "size": size }))
                .await?;
            print_output(ctx, &result)
        }
        PstorageCommand::Delete { selector } => {
            let client = KdClient::new(ctx)?;
            let id = resolve::<PersistentDisk>(&client, &selector).await?;
            client.delete::<PersistentDisk>(&id).await?;
            print_message(ctx, &format!("Persistent volume {id} deleted"));
            Ok(())
        }
    }
}

fn validate_size(size: u32) -> Result<()> {
    if size == 0 {
        bail!("Volume size must be at least 1 GB");
    }
    Ok(())
}
