use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::client::{ApiClient, Assistant, ChatContext, ChatRequest, Citation};
use crate::questionnaire::colorado::{self, outcome_title};

// ---------------------------------------------------------------------------
// Chat message helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub citations: Vec<Citation>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            citations: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            citations: Vec::new(),
        }
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }
}

impl std::fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.role.as_str(), self.content)
    }
}

// ---------------------------------------------------------------------------
// Suggestions and context
// ---------------------------------------------------------------------------

pub const APOLOGY: &str =
    "Sorry, I encountered an error. Please try again or rephrase your question.";

const DEVELOPER_SUGGESTIONS: [&str; 3] = [
    "What documentation must I provide to deployers?",
    "What are my notification obligations to the Attorney General?",
    "What is 'reasonable care' for developers?",
];

const DEPLOYER_SUGGESTIONS: [&str; 3] = [
    "How often must I conduct impact assessments?",
    "What is required in a risk management program?",
    "What are consumer notification requirements?",
];

const GENERAL_SUGGESTIONS: [&str; 3] = [
    "What is a 'consequential decision'?",
    "What is 'algorithmic discrimination'?",
    "When does SB 24-205 take effect?",
];

/// Opening suggestions for an outcome. Outcomes that include developer
/// duties get the developer set.
pub fn initial_suggestions(outcome: Option<&str>) -> Vec<String> {
    let set = match outcome {
        Some(colorado::HIGH_RISK_DEVELOPER) | Some(colorado::HIGH_RISK_BOTH) => {
            DEVELOPER_SUGGESTIONS
        }
        Some(colorado::HIGH_RISK_DEPLOYER) => DEPLOYER_SUGGESTIONS,
        _ => GENERAL_SUGGESTIONS,
    };
    set.iter().map(|s| s.to_string()).collect()
}

pub fn role_for(outcome: Option<&str>) -> &'static str {
    match outcome {
        Some(colorado::HIGH_RISK_DEVELOPER) => "developer",
        Some(colorado::HIGH_RISK_DEPLOYER) => "deployer",
        Some(colorado::HIGH_RISK_BOTH) => "both",
        _ => "unknown",
    }
}

pub fn context_for(outcome: Option<&str>, answers: BTreeMap<String, String>) -> ChatContext {
    ChatContext {
        outcome: outcome.map(str::to_string),
        role: Some(role_for(outcome).to_string()),
        answers,
    }
}

pub fn welcome(outcome: Option<&str>) -> String {
    format!(
        "Hi! I'm your Colorado AI Act compliance assistant. I can help you understand SB 24-205 requirements specific to your classification: **{}**.\n\nAsk me anything about your obligations!",
        outcome_title(outcome.unwrap_or_default())
    )
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Chatbot {
    assistant: Assistant,
    context: ChatContext,
    messages: Vec<ChatMessage>,
    suggestions: Vec<String>,
}

impl Chatbot {
    pub fn new(assistant: Assistant, context: ChatContext) -> Self {
        let outcome = context.outcome.as_deref();
        Self {
            assistant,
            messages: vec![ChatMessage::assistant(welcome(outcome))],
            suggestions: initial_suggestions(outcome),
            context,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Send one user message. Blank input is ignored and returns `None`;
    /// otherwise the appended assistant reply (or apology) is returned.
    pub async fn send(&mut self, client: &ApiClient, message: &str) -> Option<&ChatMessage> {
        if message.trim().is_empty() {
            return None;
        }

        info!("User input: \"{message}\"");
        self.messages.push(ChatMessage::user(message));

        let req = ChatRequest {
            message: message.to_string(),
            context: Some(self.context.clone()),
        };
        match client.chat(self.assistant, &req).await {
            Ok(reply) => {
                debug!(
                    "assistant replied with {} citation(s), {} suggestion(s)",
                    reply.citations.len(),
                    reply.suggested_questions.len()
                );
                self.messages
                    .push(ChatMessage::assistant(reply.message).with_citations(reply.citations));
                if !reply.suggested_questions.is_empty() {
                    self.suggestions = reply.suggested_questions;
                }
            }
            Err(e) => {
                warn!("chat request failed: {e}");
                self.messages
                    .push(ChatMessage::assistant(format!("{APOLOGY} ({e})")));
            }
        }
        self.messages.last()
    }

    /// Send the `index`th suggestion as if typed.
    pub async fn send_suggestion(
        &mut self,
        client: &ApiClient,
        index: usize,
    ) -> Option<&ChatMessage> {
        let question = self.suggestions.get(index)?.clone();
        self.send(client, &question).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::ClientConfig;

    #[test]
    fn test_suggestion_sets() {
        assert_eq!(initial_suggestions(Some("outcome7"))[0], DEVELOPER_SUGGESTIONS[0]);
        assert_eq!(initial_suggestions(Some("outcome9"))[0], DEVELOPER_SUGGESTIONS[0]);
        assert_eq!(initial_suggestions(Some("outcome8"))[0], DEPLOYER_SUGGESTIONS[0]);
        assert_eq!(initial_suggestions(None)[0], GENERAL_SUGGESTIONS[0]);
        assert_eq!(role_for(Some("outcome9")), "both");
    }

    #[test]
    fn test_welcome_names_outcome() {
        let bot = Chatbot::new(Assistant::Compliance, context_for(Some("outcome8"), BTreeMap::new()));
        assert_eq!(bot.messages().len(), 1);
        assert!(bot.messages()[0]
            .content
            .contains("**Deployer of High-Risk AI System**"));
        assert!(welcome(None).contains("**Unknown Classification**"));
        assert_eq!(
            ChatMessage::user("hi").to_string(),
            "[user]: hi"
        );
    }

    #[tokio::test]
    async fn test_send_appends_reply_and_suggestions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/compliance-assistant"))
            .and(body_partial_json(json!({
                "message": "What is an impact assessment?",
                "context": {"outcome": "outcome8", "role": "deployer"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "An impact assessment is ...",
                "citations": [{"key": "S1", "title": "SB 24-205", "source": "6-1-1703"}],
                "suggested_questions": ["How often?"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(ClientConfig::new(server.uri()));
        let mut bot = Chatbot::new(Assistant::Compliance, context_for(Some("outcome8"), BTreeMap::new()));

        assert!(bot.send(&client, "   ").await.is_none());
        assert_eq!(bot.messages().len(), 1);

        let reply = bot
            .send(&client, "What is an impact assessment?")
            .await
            .unwrap()
            .clone();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.citations.len(), 1);
        assert_eq!(bot.messages().len(), 3);
        assert_eq!(bot.suggestions(), &["How often?".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_appends_apology() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/documentation-helper"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "overloaded"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(ClientConfig::new(server.uri()));
        let mut bot = Chatbot::new(Assistant::DocumentationHelper, context_for(None, BTreeMap::new()));
        let before = bot.suggestions().to_vec();

        let reply = bot.send_suggestion(&client, 0).await.unwrap();
        assert!(reply.content.starts_with(APOLOGY));
        assert!(reply.content.ends_with("(HTTP 503: overloaded)"));
        assert_eq!(bot.messages()[1].role, Role::User);
        assert_eq!(bot.suggestions(), before.as_slice());
    }
}
