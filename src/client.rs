//! REST client for the compliance backend.
//!
//! Every call is a single request/response. Failures are returned to the
//! caller as-is; nothing is retried here. A second call to an endpoint that
//! still has a request outstanding fails fast with [`ClientError::Busy`].

pub mod error;
pub mod guard;
pub mod models;

use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use error::{ClientError, Result};
pub use guard::InFlight;
pub use models::*;

pub const INVITE_HEADER: &str = "X-Invite-Token";
pub const ADMIN_HEADER: &str = "X-Admin-Key";

pub const GENERATE: &str = "/api/generate";
pub const GENERATE_WITH_FILE: &str = "/api/generate-with-file";
pub const OUTCOME_DOCUMENTATION: &str = "/api/generate-outcome-documentation";
pub const CHECKLIST: &str = "/api/generate-checklist";
pub const PROJECTS: &str = "/api/projects";
pub const DEMO_CONFIG: &str = "/api/demo-config";
pub const HEALTH: &str = "/api/health";
pub const OUTREACH_INVITE: &str = "/api/outreach/invite";
pub const OUTREACH_SHARE_SAMPLE: &str = "/api/outreach/share-sample";
pub const OUTREACH_SHARE: &str = "/api/outreach/share";

/// Which chat assistant to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assistant {
    Compliance,
    DocumentationHelper,
}

impl Assistant {
    pub fn path(self) -> &'static str {
        match self {
            Assistant::Compliance => "/api/chat/compliance-assistant",
            Assistant::DocumentationHelper => "/api/chat/documentation-helper",
        }
    }
}

/// Connection settings. Fixed for the lifetime of an [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub invite_token: Option<String>,
    pub admin_key: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            invite_token: None,
            admin_key: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    in_flight: InFlight,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            in_flight: InFlight::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether a request to `endpoint` is outstanding.
    pub fn is_busy(&self, endpoint: &str) -> bool {
        self.in_flight.is_busy(endpoint)
    }

    /// Public link for a stored report.
    pub fn share_url(&self, project_id: i64) -> String {
        format!("{}/share/{project_id}", self.config.base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    fn with_invite(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.invite_token {
            Some(token) => req.header(INVITE_HEADER, token),
            None => req,
        }
    }

    fn with_admin(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let key = self
            .config
            .admin_key
            .as_deref()
            .ok_or(ClientError::MissingAdminKey)?;
        Ok(req.header(ADMIN_HEADER, key))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        req: RequestBuilder,
    ) -> Result<T> {
        let _guard = self.in_flight.acquire(endpoint)?;
        info!("request: {endpoint}");
        let resp = req.send().await?;
        decode(endpoint, resp).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> Result<T> {
        debug!("{endpoint} body: {}", serde_json::to_string(body)?);
        let req = self.with_invite(self.http.post(self.url(endpoint)).json(body));
        self.send(endpoint, req).await
    }

    /// `POST /api/generate`
    pub async fn generate(&self, fields: &IntakeFields) -> Result<GeneratedReport> {
        self.post_json(GENERATE, fields).await
    }

    /// `POST /api/generate-with-file` (multipart)
    pub async fn generate_with_file(
        &self,
        fields: &IntakeFields,
        file: &MetadataFile,
    ) -> Result<GeneratedReport> {
        let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        let form = Form::new()
            .part("file", part)
            .text("system_name", fields.system_name.clone())
            .text("intended_purpose", fields.intended_purpose.clone())
            .text("use_case", fields.use_case.clone())
            .text("risk_notes", fields.risk_notes.clone())
            .text("free_text_notes", fields.free_text_notes.clone())
            .text("ephemeral", fields.ephemeral.to_string());
        debug!(
            "{GENERATE_WITH_FILE} file: {} ({} bytes)",
            file.file_name,
            file.bytes.len()
        );
        let req = self.with_invite(self.http.post(self.url(GENERATE_WITH_FILE)).multipart(form));
        self.send(GENERATE_WITH_FILE, req).await
    }

    /// `POST /api/generate-outcome-documentation`
    pub async fn generate_outcome_documentation(
        &self,
        req: &OutcomeDocumentationRequest,
    ) -> Result<DocumentationResponse> {
        self.post_json(OUTCOME_DOCUMENTATION, req).await
    }

    /// `POST /api/generate-checklist`
    pub async fn generate_checklist(
        &self,
        req: &OutcomeDocumentationRequest,
    ) -> Result<ChecklistResponse> {
        self.post_json(CHECKLIST, req).await
    }

    pub async fn chat(&self, assistant: Assistant, req: &ChatRequest) -> Result<ChatReply> {
        self.post_json(assistant.path(), req).await
    }

    /// `GET /api/projects/:id`
    pub async fn project(&self, id: i64) -> Result<Project> {
        let req = self.http.get(self.url(&format!("{PROJECTS}/{id}")));
        self.send(PROJECTS, req).await
    }

    /// `GET /api/demo-config`
    pub async fn demo_config(&self) -> Result<IntakeFields> {
        let req = self.http.get(self.url(DEMO_CONFIG));
        self.send(DEMO_CONFIG, req).await
    }

    pub async fn health(&self) -> Result<Health> {
        let req = self.http.get(self.url(HEALTH));
        self.send(HEALTH, req).await
    }

    /// Create an invite link (admin).
    pub async fn create_invite(&self, body: &InviteRequest) -> Result<InviteResponse> {
        let req = self.with_admin(self.http.post(self.url(OUTREACH_INVITE)).json(body))?;
        self.send(OUTREACH_INVITE, req).await
    }

    /// Create a public sample link (admin).
    pub async fn create_share_sample(
        &self,
        body: &ShareSampleRequest,
    ) -> Result<ShareSampleResponse> {
        let req = self.with_admin(self.http.post(self.url(OUTREACH_SHARE_SAMPLE)).json(body))?;
        self.send(OUTREACH_SHARE_SAMPLE, req).await
    }

    /// Open a public outreach link.
    pub async fn public_share(&self, token: &str) -> Result<PublicShare> {
        let req = self.http.get(self.url(&format!("{OUTREACH_SHARE}/{token}")));
        self.send(OUTREACH_SHARE, req).await
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, resp: Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        let message = error_message(&body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());
        warn!("{endpoint} failed: HTTP {} {message}", status.as_u16());
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }

    debug!("{endpoint} response: {} bytes", body.len());
    Ok(serde_json::from_str(&body)?)
}

/// Pull a human-readable message out of an error body: `detail`, then
/// `error`, then the raw text.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["detail", "error", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) => return Some(s.clone()),
                Some(other) if !other.is_null() => return Some(other.to_string()),
                _ => {}
            }
        }
    }
    Some(trimmed.to_string())
}
