//! Pod command implementations

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{json, Map, Value};
use tabled::Tabled;

use crate::api::KdClient;
use crate::cli::{ContainerTarget, PodsCommand, TextSelector};
use crate::config::RuntimeContext;
use crate::models::{display_value, Pod, PodDump};
use crate::output::{output_for_format, print_list, print_message, print_output, read_payload};
use crate::resolve::resolve;

#[derive(Debug, Tabled)]
struct PodRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "OWNER")]
    owner: String,
    #[tabled(rename = "KUBES")]
    kubes: u64,
}

impl From<&Pod> for PodRow {
    fn from(pod: &Pod) -> Self {
        Self {
            id: pod.id.clone(),
            name: pod.name.clone(),
            status: if pod.status.is_empty() {
                "-".to_string()
            } else {
                pod.status.clone()
            },
            owner: pod.owner_name(),
            kubes: pod.kubes(),
        }
    }
}

pub async fn run(ctx: &RuntimeContext, command: PodsCommand) -> Result<()> {
    match command {
        PodsCommand::List { owner } => list(ctx, owner.as_deref()).await,
        PodsCommand::Get { selector } => {
            let client = KdClient::new(ctx)?;
            let id = resolve::<Pod>(&client, &selector).await?;
            get(ctx, &client, &id).await
        }
        PodsCommand::Create { payload } => {
            let body = read_payload(&payload)?;
            let client = KdClient::new(ctx)?;
            let result = client.create::<Pod>(&body).await?;
            print_output(ctx, &result)
        }
        PodsCommand::Update { selector, payload } => {
            let body = read_payload(&payload)?;
            let client = KdClient::new(ctx)?;
            let id = resolve::<Pod>(&client, &selector).await?;
            let result = client.update::<Pod>(&id, &body).await?;
            print_output(ctx, &result)
        }
        PodsCommand::Start { selector } => lifecycle(ctx, &selector, "start", Map::new()).await,
        PodsCommand::Stop { selector } => lifecycle(ctx, &selector, "stop", Map::new()).await,
        PodsCommand::Resize { selector, replicas } => {
            let mut params = Map::new();
            params.insert("replicas".to_string(), json!(replicas));
            lifecycle(ctx, &selector, "resize", params).await
        }
        PodsCommand::ContainerStart { selector, target } => {
            lifecycle(ctx, &selector, "container_start", container_params(&target)).await
        }
        PodsCommand::ContainerStop { selector, target } => {
            lifecycle(ctx, &selector, "container_stop", container_params(&target)).await
        }
        PodsCommand::ContainerDelete { selector, target } => {
            lifecycle(ctx, &selector, "container_delete", container_params(&target)).await
        }
        PodsCommand::Delete { selector } => {
            let client = KdClient::new(ctx)?;
            let id = resolve::<Pod>(&client, &selector).await?;
            client.delete::<Pod>(&id).await?;
            print_message(ctx, &format!("Pod {id} deleted"));
            Ok(())
        }
        PodsCommand::Dump { pod_id } => {
            let client = KdClient::new(ctx)?;
            let dump = client.dump_pod(&pod_id).await?;
            print_output(ctx, &dump)
        }
        PodsCommand::BatchDump { owner, target_dir } => {
            let client = KdClient::new(ctx)?;
            let dumps = client.batch_dump(owner.as_deref()).await?;
            match target_dir {
                None => print_output(ctx, &dumps),
                Some(dir) => {
                    save_dumps(&dumps, &dir, |path| {
                        if !ctx.global.quiet {
                            println!("Saved {}", path.display());
                        }
                    })?;
                    Ok(())
                }
            }
        }
    }
}

async fn list(ctx: &RuntimeContext, owner: Option<&str>) -> Result<()> {
    let client = KdClient::new(ctx)?;
    let pods = client.list_pods(owner).await?;
    let rows: Vec<PodRow> = pods.iter().map(PodRow::from).collect();
    print_list(ctx, &pods, rows, "No pods found")
}

async fn get(ctx: &RuntimeContext, client: &KdClient, id: &str) -> Result<()> {
    let pod: Pod = client.get(id).await?;

    output_for_format(ctx, &pod, || {
        println!("ID:     {}", pod.id);
        println!("Name:   {}", pod.name);
        println!("Status: {}", PodRow::from(&pod).status);
        println!("Owner:  {}", pod.owner_name());
        if let Some(kube_type) = pod.kube_type {
            println!("Kube type: {kube_type}");
        }
        println!();
        println!("Containers:");
        for container in &pod.containers {
            println!(
                "  {} ({}, {} kubes)",
                container.name, container.image, container.kubes
            );
        }
        Ok(())
    })
}

async fn lifecycle(
    ctx: &RuntimeContext,
    selector: &TextSelector,
    command: &str,
    params: Map<String, Value>,
) -> Result<()> {
    let client = KdClient::new(ctx)?;
    let id = resolve::<Pod>(&client, selector).await?;
    let result = client.pod_command(&id, command, params).await?;

    output_for_format(ctx, &result, || {
        let status = result
            .get("status")
            .map(display_value)
            .unwrap_or_else(|| "-".to_string());
        println!("Pod {id}: {command} requested (status: {status})");
        Ok(())
    })
}

/// Body fields for the container_* pod commands
fn container_params(target: &ContainerTarget) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("host".to_string(), json!(target.host));
    params.insert("containers".to_string(), json!(target.containers.join(",")));
    params
}

/// Write each dump to `<target_dir>/<owner_id>/<pod_id>`, calling
/// `on_saved` as soon as a file is written
fn save_dumps(
    dumps: &[PodDump],
    target_dir: &Path,
    mut on_saved: impl FnMut(&Path),
) -> Result<Vec<PathBuf>> {
    let mut saved = Vec::with_capacity(dumps.len());

    for dump in dumps {
        let owner_id = display_value(&dump.owner.id);
        let owner_dir = target_dir.join(path_segment(&owner_id, "owner id")?);
        fs::create_dir_all(&owner_dir)
            .with_context(|| format!("creating directory {}", owner_dir.display()))?;

        let target_file = owner_dir.join(path_segment(&dump.pod_data.id, "pod id")?);
        fs::write(&target_file, to_sorted_json(dump)?)
            .with_context(|| format!("writing dump to {}", target_file.display()))?;
        on_saved(&target_file);
        saved.push(target_file);
    }

    Ok(saved)
}

/// A server-supplied id must stay a single plain file name
fn path_segment<'a>(id: &'a str, what: &str) -> Result<&'a Path> {
    let path = Path::new(id);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => bail!("refusing to use {what} '{id}' as a file name"),
    }
}

/// Pretty JSON with four-space indent and keys in sorted order
fn to_sorted_json<T: Serialize>(data: &T) -> Result<Vec<u8>> {
    // Round-trip through Value: its map keeps keys sorted
    let value = serde_json::to_value(data)?;
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump(owner: serde_json::Value, pod_id: &str) -> PodDump {
        serde_json::from_value(json!({
            "owner": {"id": owner, "username": "alice"},
            "pod_data": {"id": pod_id, "name": "web"},
            "k8s_pod": {"b": 1, "a": 2}
        }))
        .unwrap()
    }

    #[test]
    fn test_save_dumps_layout() {
        let dir = tempfile::tempdir().unwrap();
        let dumps = vec![dump(json!(7), "pod-a"), dump(json!(7), "pod-b"), dump(json!(9), "pod-c")];

        let mut reported = Vec::new();
        let saved = save_dumps(&dumps, dir.path(), |p| reported.push(p.to_path_buf())).unwrap();
        assert_eq!(reported, saved);
        assert_eq!(
            saved,
            vec![
                dir.path().join("7").join("pod-a"),
                dir.path().join("7").join("pod-b"),
                dir.path().join("9").join("pod-c"),
            ]
        );

        let content = fs::read_to_string(dir.path().join("9").join("pod-c")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["pod_data"]["id"], "pod-c");
    }

    #[test]
    fn test_save_dumps_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_dumps(&[], dir.path(), |_| {}).unwrap().is_empty());
    }

    #[test]
    fn test_save_dumps_rejects_escaping_ids() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("dumps");

        for (owner, pod_id) in [
            (json!(7), "../evil"),
            (json!(7), "a/b"),
            (json!(7), ".."),
            (json!(7), ""),
            (json!("../x"), "pod-a"),
            (json!("/etc"), "pod-a"),
        ] {
            let dumps = vec![dump(owner, pod_id)];
            assert!(save_dumps(&dumps, &target, |_| {}).is_err(), "{pod_id}");
        }
        assert!(!dir.path().join("evil").exists());
        assert!(!dir.path().join("x").exists());
    }

    #[test]
    fn test_save_dumps_reports_files_before_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dumps = vec![dump(json!(7), "pod-a"), dump(json!(7), "../pod-b")];

        let mut reported = Vec::new();
        let result = save_dumps(&dumps, dir.path(), |p| reported.push(p.to_path_buf()));
        assert!(result.is_err());
        assert_eq!(reported, vec![dir.path().join("7").join("pod-a")]);
    }

    #[test]
    fn test_container_params() {
        let target = ContainerTarget {
            host: "node1".to_string(),
            containers: vec!["nginx".to_string(), "php".to_string()],
        };
        assert_eq!(
            Value::Object(container_params(&target)),
            json!({"host": "node1", "containers": "nginx,php"})
        );
    }

    #[test]
    fn test_sorted_json() {
        let text = String::from_utf8(to_sorted_json(&dump(json!(1), "x")).unwrap()).unwrap();
        let k8s = text.find("\"k8s_pod\"").unwrap();
        let owner = text.find("\"owner\"").unwrap();
        let pod_data = text.find("\"pod_data\"").unwrap();
        assert!(k8s < owner && owner < pod_data);
        assert!(text.contains("\n    \"k8s_pod\""));
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
    }

    #[test]
    fn test_pod_row() {
        let pod: Pod = serde_json::from_value(json!({
            "id": "p-1",
            "name": "web",
            "owner": "alice",
            "containers": [{"name": "nginx", "image": "nginx", "kubes": 3}]
        }))
        .unwrap();
        let row = PodRow::from(&pod);
        assert_eq!(row.status, "-");
        assert_eq!(row.owner, "alice");
        assert_eq!(row.kubes, 3);
    }
}
