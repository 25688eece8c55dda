use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::client::error::ClientError;

/// Price used for the token cost estimate shown next to a report.
pub const PRICE_PER_1K_TOKENS: f64 = 0.03;

/// Intake fields sent to the report generator. Also returned by the demo
/// config endpoint as a pre-fill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeFields {
    pub system_name: String,
    pub intended_purpose: String,
    pub use_case: String,
    pub risk_notes: String,
    pub free_text_notes: String,
    pub ephemeral: bool,
}

/// Model metadata file uploaded alongside the intake fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MetadataFile {
    /// Accepts `.json`, `.yaml` and `.yml` files only.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ClientError> {
        let file_name = file_name.into();
        let ext = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json" | "yaml" | "yml") => Ok(Self { file_name, bytes }),
            _ => Err(ClientError::Validation(format!(
                "{file_name}: please upload a .json, .yaml, or .yml file"
            ))),
        }
    }
}

/// A regulatory excerpt backing a statement in a report or chat reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub key: String,
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub excerpt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

impl Usage {
    /// Estimated cost in dollars, three decimals.
    pub fn cost(&self) -> Option<String> {
        self.total_tokens
            .map(|t| format!("{:.3}", t as f64 / 1000.0 * PRICE_PER_1K_TOKENS))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedReport {
    #[serde(default)]
    pub report: String,
    #[serde(default)]
    pub sources: Vec<Citation>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyAnswer {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDocumentationRequest {
    pub outcome: String,
    pub answers: BTreeMap<String, String>,
    /// Not used for generation; always sent empty.
    pub checklist: BTreeMap<String, bool>,
    #[serde(rename = "surveyHistory")]
    pub survey_history: Vec<SurveyAnswer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentationResponse {
    #[serde(default)]
    pub report: String,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChecklistResponse {
    #[serde(default)]
    pub checklist: Vec<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub context: Option<ChatContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub suggested_questions: Vec<String>,
}

/// A stored report, as returned by the share endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    pub id: i64,
    pub created_at: String,
    #[serde(default)]
    pub system_name: String,
    #[serde(default)]
    pub intended_purpose: String,
    #[serde(default)]
    pub use_case: String,
    #[serde(default)]
    pub report: String,
    #[serde(default)]
    pub sources: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Health {
    pub ok: bool,
    #[serde(default)]
    pub demo: bool,
    #[serde(default)]
    pub has_openai_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InviteRequest {
    pub max_uses: u32,
    pub days_valid: u32,
}

impl Default for InviteRequest {
    fn default() -> Self {
        Self {
            max_uses: 3,
            days_valid: 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InviteResponse {
    pub invite_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareSampleRequest {
    pub days_valid: u32,
}

impl Default for ShareSampleRequest {
    fn default() -> Self {
        Self { days_valid: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShareSampleResponse {
    pub share_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Evidence {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

/// Sample documentation shown on a public outreach link.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SharedDoc {
    pub model_name: String,
    pub version: String,
    pub generated_at: String,
    pub intended_purpose: String,
    pub deployment_context: String,
    pub data_sources: String,
    pub risk_management: String,
    pub human_oversight: String,
    pub performance_metrics: String,
    pub post_deployment_monitoring: String,
    pub evidence: Vec<Evidence>,
    /// Fraction in `[0, 1]`.
    pub completeness: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublicShare {
    pub title: String,
    pub doc: SharedDoc,
}
