//! KuberDock API resource types
//!
//! Only the fields the CLI displays or needs are typed. Everything else the
//! server returns is kept in `extra` so that `get` prints the full object.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// A collection endpoint addressable by id and looked up by name
pub trait Resource: DeserializeOwned + Serialize {
    /// Human-readable kind, used in messages
    const KIND: &'static str;
    /// Collection path below `/api`, with a trailing slash
    const PATH: &'static str;

    fn id(&self) -> String;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Domain {
    const KIND: &'static str = "domain";
    const PATH: &'static str = "/domains/";

    fn id(&self) -> String {
        self.id.to_string()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pod {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_type: Option<u64>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pod {
    /// Owner as shown in tables: the server sends either a user name or an
    /// `{id, username}` object depending on the caller's role
    pub fn owner_name(&self) -> String {
        match &self.owner {
            Some(Value::String(name)) => name.clone(),
            Some(Value::Object(obj)) => obj
                .get("username")
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string(),
            _ => "-".to_string(),
        }
    }

    /// Total kubes over all containers
    pub fn kubes(&self) -> u64 {
        self.containers.iter().map(|c| c.kubes).sum()
    }
}

impl Resource for Pod {
    const KIND: &'static str = "pod";
    const PATH: &'static str = "/podapi/";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_kubes")]
    pub kubes: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_kubes() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredefinedApp {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for PredefinedApp {
    const KIND: &'static str = "predefined app";
    const PATH: &'static str = "/predefined-apps/";

    fn id(&self) -> String {
        self.id.to_string()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentDisk {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub in_use: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_type: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for PersistentDisk {
    const KIND: &'static str = "persistent disk";
    const PATH: &'static str = "/pstorage/";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSetting {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for SystemSetting {
    const KIND: &'static str = "system setting";
    const PATH: &'static str = "/settings/systemsettings/";

    fn id(&self) -> String {
        self.id.to_string()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One hit of a registry image search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSearchResult {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub star_count: Option<u64>,
    #[serde(default)]
    pub is_official: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A page of image search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSearchPage {
    pub results: Vec<ImageSearchResult>,
    pub page: u32,
    pub num_pages: Option<u32>,
}

/// Full server-side record of a pod, as produced by `pods dump`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodDump {
    pub owner: DumpOwner,
    pub pod_data: DumpPodData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpOwner {
    pub id: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpPodData {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Render a JSON scalar for a table cell
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
