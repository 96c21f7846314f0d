//! KuberDock REST API client
//!
//! Handles all HTTP communication with the KuberDock API. Every response is
//! wrapped in a `{"status": "OK", "data": ...}` envelope; error envelopes
//! carry the message in `data` and an error class in `type`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};

use crate::config::RuntimeContext;
use crate::error::ApiError;
use crate::models::{
    display_value, ImageSearchPage, ImageSearchResult, PersistentDisk, Pod, PodDump,
    PredefinedApp, Resource,
};

/// How requests authenticate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// Token sent as both the `token` and `token2` query parameters
    Token(String),
    /// HTTP basic authentication; only some endpoints accept it
    Basic { user: String, password: String },
    None,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub auth: Auth,
    pub timeout: u64,
    pub insecure: bool,
}

/// Response envelope shared by all endpoints
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Envelope {
    fn is_ok(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("ok"))
    }
}

/// KuberDock REST API client
pub struct KdClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl KdClient {
    /// Create a new client from runtime context
    pub fn new(ctx: &RuntimeContext) -> Result<Self> {
        Self::from_settings(ctx.client_settings()?)
    }

    pub fn from_settings(settings: ClientSettings) -> Result<Self> {
        let base_url = settings.base_url.trim_end_matches('/').to_string();

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(settings.timeout))
            .user_agent(format!("kdctl/{}", env!("CARGO_PKG_VERSION")));

        if settings.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().context("building HTTP client")?;

        Ok(Self {
            client,
            base_url,
            auth: settings.auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Build an authenticated request
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path);
        log::debug!("{} {}", method, url);

        let builder = self.client.request(method, &url);
        match &self.auth {
            // Older servers read `token`, newer ones `token2`
            Auth::Token(token) => Ok(builder.query(&[("token", token), ("token2", token)])),
            Auth::Basic { user, password } => Ok(builder.basic_auth(user, Some(password))),
            Auth::None => Err(ApiError::Unauthenticated.into()),
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Envelope> {
        let response = builder.send().await.context("sending request")?;
        let status = response.status();
        let url = response.url().clone();
        let body = response
            .text()
            .await
            .with_context(|| format!("reading response from {}", strip_query(&url)))?;

        parse_envelope(status, strip_query(&url), &body).map_err(Into::into)
    }

    async fn data(&self, builder: RequestBuilder) -> Result<Value> {
        Ok(self.send(builder).await?.data.unwrap_or(Value::Null))
    }

    async fn typed<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let data = self.data(builder).await?;
        serde_json::from_value(data).context("decoding response data")
    }

    // --- Generic resource operations ---

    /// List a resource collection
    pub async fn list<R: Resource>(&self) -> Result<Vec<R>> {
        self.typed(self.request(Method::GET, R::PATH)?).await
    }

    /// Get one resource by id
    pub async fn get<R: Resource>(&self, id: &str) -> Result<R> {
        let path = format!("{}{}", R::PATH, id);
        self.typed(self.request(Method::GET, &path)?).await
    }

    /// Create a resource, returning whatever the server reports back
    pub async fn create<R: Resource>(&self, body: &Value) -> Result<Value> {
        self.data(self.request(Method::POST, R::PATH)?.json(body))
            .await
    }

    /// Replace a resource's fields
    pub async fn update<R: Resource>(&self, id: &str, body: &Value) -> Result<Value> {
        let path = format!("{}{}", R::PATH, id);
        self.data(self.request(Method::PUT, &path)?.json(body))
            .await
    }

    /// Change selected fields of a resource
    pub async fn patch<R: Resource>(&self, id: &str, body: &Value) -> Result<Value> {
        let path = format!("{}{}", R::PATH, id);
        self.data(self.request(Method::PATCH, &path)?.json(body))
            .await
    }

    pub async fn delete<R: Resource>(&self, id: &str) -> Result<()> {
        let path = format!("{}{}", R::PATH, id);
        self.send(self.request(Method::DELETE, &path)?).await?;
        Ok(())
    }

    // --- Pods ---

    pub async fn list_pods(&self, owner: Option<&str>) -> Result<Vec<Pod>> {
        let mut builder = self.request(Method::GET, Pod::PATH)?;
        if let Some(owner) = owner {
            builder = builder.query(&[("owner", owner)]);
        }
        self.typed(builder).await
    }

    /// Send a command to a pod; `params` travel in the same body
    pub async fn pod_command(
        &self,
        id: &str,
        command: &str,
        mut params: Map<String, Value>,
    ) -> Result<Value> {
        params.insert("command".to_string(), json!(command));
        self.update::<Pod>(id, &Value::Object(params)).await
    }

    pub async fn dump_pod(&self, id: &str) -> Result<Value> {
        let path = format!("{}dump/{}", Pod::PATH, id);
        self.data(self.request(Method::GET, &path)?).await
    }

    /// Dump all pods, or those of one owner; a null payload means none
    pub async fn batch_dump(&self, owner: Option<&str>) -> Result<Vec<PodDump>> {
        let path = format!("{}dump", Pod::PATH);
        let mut builder = self.request(Method::GET, &path)?;
        if let Some(owner) = owner {
            builder = builder.query(&[("owner", owner)]);
        }
        let data = self.data(builder).await?;
        if data.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(data).context("decoding pod dumps")
    }

    // --- Images ---

    pub async fn search_images(
        &self,
        search_key: &str,
        page: u32,
        registry: Option<&str>,
    ) -> Result<ImageSearchPage> {
        let page_str = page.to_string();
        let mut query = vec![("searchkey", search_key), ("page", page_str.as_str())];
        if let Some(url) = registry {
            query.push(("url", url));
        }

        let builder = self.request(Method::GET, "/images/")?.query(&query);
        let envelope = self.send(builder).await?;

        let results: Vec<ImageSearchResult> =
            serde_json::from_value(envelope.data.unwrap_or_else(|| json!([])))
                .context("decoding image search results")?;
        let num_pages = envelope
            .extra
            .get("num_pages")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok());

        Ok(ImageSearchPage {
            results,
            page,
            num_pages,
        })
    }

    pub async fn image_info(&self, image: &str) -> Result<Value> {
        let builder = self
            .request(Method::POST, "/images/new")?
            .json(&json!({ "image": image }));
        self.data(builder).await
    }

    // --- Predefined apps ---

    /// List predefined apps; with `file_only` the server returns templates only
    pub async fn list_predefined_apps(&self, file_only: bool) -> Result<Value> {
        let mut builder = self.request(Method::GET, PredefinedApp::PATH)?;
        if file_only {
            builder = builder.query(&[("file-only", "true")]);
        }
        self.data(builder).await
    }

    pub async fn create_pod_from_app(&self, id: &str, plan: u32, values: &Value) -> Result<Value> {
        let path = format!("{}{}/create-pod/{}", PredefinedApp::PATH, id, plan);
        self.data(self.request(Method::POST, &path)?.json(values))
            .await
    }

    pub async fn validate_template(&self, template: &str) -> Result<Value> {
        let path = format!("{}validate-template", PredefinedApp::PATH);
        let builder = self
            .request(Method::POST, &path)?
            .json(&json!({ "template": template }));
        self.data(builder).await
    }

    // --- Persistent storage ---

    pub async fn list_disks(&self, free_only: bool) -> Result<Vec<PersistentDisk>> {
        let mut builder = self.request(Method::GET, PersistentDisk::PATH)?;
        if free_only {
            builder = builder.query(&[("free-only", "true")]);
        }
        self.typed(builder).await
    }

    // --- Authentication ---

    /// Exchange a user name and password for an API token
    pub async fn login(&self, user: &str, password: &str) -> Result<String> {
        let url = self.url("/auth/token2");
        log::debug!("POST {}", url);

        let builder = self
            .client
            .post(&url)
            .json(&json!({ "username": user, "password": password }));
        let envelope = self.send(builder).await?;

        envelope
            .extra
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::Envelope {
                    url,
                    reason: "no token in login response".to_string(),
                }
                .into()
            })
    }
}

fn strip_query(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Decode a response body into its envelope, turning error envelopes and
/// non-2xx statuses into `ApiError::Server`
fn parse_envelope(status: StatusCode, url: String, body: &str) -> Result<Envelope, ApiError> {
    let parsed: Option<Envelope> = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str(body).ok()
    };

    match parsed {
        Some(envelope) if status.is_success() && envelope.is_ok() => Ok(envelope),
        Some(envelope) if status.is_success() && envelope.status.is_none() => {
            Err(ApiError::Envelope {
                url,
                reason: "missing status field".to_string(),
            })
        }
        Some(envelope) => {
            let message = envelope
                .data
                .as_ref()
                .or_else(|| envelope.extra.get("message"))
                .map(display_value)
                .unwrap_or_else(|| default_reason(status));
            // Error envelopes sometimes arrive with HTTP 200
            let status = if status.is_success() {
                StatusCode::BAD_REQUEST
            } else {
                status
            };
            Err(ApiError::Server {
                status,
                kind: envelope.kind,
                message,
            })
        }
        None if status.is_success() && body.trim().is_empty() => Ok(Envelope {
            status: Some("OK".to_string()),
            data: None,
            kind: None,
            extra: Map::new(),
        }),
        None if status.is_success() => Err(ApiError::Envelope {
            url,
            reason: "response is not JSON".to_string(),
        }),
        None => Err(ApiError::Server {
            status,
            kind: None,
            message: if body.trim().is_empty() {
                default_reason(status)
            } else {
                body.trim().to_string()
            },
        }),
    }
}

fn default_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}
