//! Post-classification documentation workflow.
//!
//! Each outcome carries its own set of free-text questions. Answers, the
//! generated checklist and its checked state are kept in the session file;
//! the generated markdown draft is not.

use std::collections::BTreeMap;

use log::{info, warn};
use thiserror::Error;

use crate::client::{ApiClient, ClientError, OutcomeDocumentationRequest, SurveyAnswer};
use crate::questionnaire::colorado::outcome_title;
use crate::questionnaire::AnswerHistory;
use crate::report::render_markdown;
use crate::session::{SessionError, SessionState, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocQuestion {
    pub id: &'static str,
    pub text: &'static str,
    pub note: Option<&'static str>,
}

const fn q(id: &'static str, text: &'static str) -> DocQuestion {
    DocQuestion { id, text, note: None }
}

const NO_STRICT_DOCUMENTATION: &str = "Your classification doesn't require strict documentation. Make sure to review the checklist to see the full compliance requirements.";

const NO_QUESTIONS: &[DocQuestion] = &[];

const EXEMPT_DEPLOYER: &[DocQuestion] = &[
    q("q1", "What is the exact step-by-step process a consumer should follow to ask about a decision made with the help of the AI system?"),
    q("q2", "Please provide the specific contact information (e.g., email address 'AI-inquiry@yourcompany.com', a link to a web form) that consumers should use for these inquiries."),
    q("q3", "Describe the internal procedure your team will follow to review a consumer's inquiry. Who is involved, and what information will they review?"),
    q("q4", "What information are you prepared to share with a consumer who questions a decision? This will help draft a template response that leverages the documentation provided by the system's developer."),
];

const DISCLOSURE_DUTY: &[DocQuestion] = &[
    q("q1", "For each of your consumer-facing AI systems, please provide its name and primary function."),
    q("q2", "Provide the exact text for your AI disclosure statement (e.g., 'You are interacting with an AI assistant.')."),
    q("q3", "Describe precisely where and when this disclosure will appear to the user (e.g., 'As the first message in the chat window before the user can type,' or 'In a persistent banner at the top of the interface')."),
    DocQuestion {
        id: "q4",
        text: "If you have determined that a disclosure is not needed for a particular system, provide the detailed justification. Why would a reasonable person find it obvious they are interacting with AI? If there is not obvious reason or you are choosing to add an explicit disclosure, please put N/A.",
        note: Some("If you answer anything except N/A, you don't need to answer the 2nd and 3rd questions."),
    },
];

const HIGH_RISK_DEVELOPER: &[DocQuestion] = &[
    q("q1", "Provide a statement describing the intended and reasonably foreseeable uses of the AI system. Also, list any known uses that would be harmful or inappropriate."),
    q("q2", "What is the specific purpose of the system, what are its intended benefits, and what are its intended outputs (e.g., a risk score, a classification)?"),
    q("q3", "Provide a high-level summary of the types and sources of data used to train the model."),
    q("q4", "Describe the system's known limitations. In what scenarios might its performance degrade, become unreliable, or pose a risk of algorithmic discrimination?"),
    q("q5", "Describe the technical methods and fairness metrics used to evaluate the system for algorithmic discrimination. What were the results of this evaluation?"),
    q("q6", "What specific steps (technical or procedural) were taken to mitigate any discrimination risks that were identified during testing?"),
    q("q7", "Describe your data governance measures. How did you assess the suitability of data sources and mitigate potential biases within them?"),
    q("q8", "Provide clear guidance for deployers on how the system should be used, how it should not be used, and how it should be monitored by a human to ensure fair outcomes."),
    q("q9", "Provide a list of the general categories of high-risk AI systems your company develops (e.g., 'employment screening systems,' 'credit assessment models')."),
    q("q10", "Provide the summary text for your public website, describing your company's overarching approach to managing the risks of algorithmic discrimination."),
];

const HIGH_RISK_DEPLOYER: &[DocQuestion] = &[
    q("q1", "Who is the designated executive accountable for your AI risk management program? Provide their name and title."),
    q("q2", "Describe your organization's core principles for the responsible deployment of AI."),
    q("q3", "Provide the summary text for your public website, describing the types of high-risk systems you deploy and your approach to managing their risks."),
    q("q4", "For your public statement, describe the nature, source, and extent of the data your high-risk systems collect and use."),
    q("q5", "State the specific purpose, intended use cases, and expected benefits of the AI system."),
    q("q6", "What are the specific, foreseeable risks of algorithmic discrimination you have identified for your customers, and what mitigation steps have you taken for each?"),
    q("q7", "List the categories of data the system uses as inputs and produces as outputs."),
    q("q8", "What metrics do you use to evaluate the system's performance, and what are its known limitations?"),
    q("q9", "Describe your plan for post-deployment monitoring and the safeguards in place for users."),
    q("q10", "Provide the exact text for the notice that will be shown to consumers before a consequential decision is made."),
    q("q11", "For an adverse decision, what is the process for generating and providing a consumer with the principal reason(s)?"),
    q("q12", "Provide the exact text explaining the consumer's right to appeal an adverse decision, including the step-by-step instructions they must follow."),
];

const HIGH_RISK_BOTH: &[DocQuestion] = &[
    q("q1", "Describe the process that ensures your deployment teams have full access to the technical limitations and risk assessments produced by your development teams. This will inform the governance section of your documentation."),
    q("q2", "How does your organization manage and resolve potential internal conflicts between development goals (e.g., model accuracy) and deployment responsibilities (e.g., fairness, consumer rights)?"),
];

/// Documentation requirements for one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeDocs {
    pub title: &'static str,
    pub questions: &'static [DocQuestion],
    /// Shown instead of questions when none are required.
    pub message: Option<&'static str>,
    pub additional_note: Option<&'static str>,
}

impl OutcomeDocs {
    pub fn has_questions(&self) -> bool {
        !self.questions.is_empty()
    }
}

pub fn outcome_docs(outcome_id: &str) -> Option<OutcomeDocs> {
    let (questions, message, additional_note) = match outcome_id {
        "outcome1" | "outcome3" | "outcome4" | "outcome6" => {
            (NO_QUESTIONS, Some(NO_STRICT_DOCUMENTATION), None)
        }
        "outcome2" => (EXEMPT_DEPLOYER, None, None),
        "outcome5" => (DISCLOSURE_DUTY, None, None),
        "outcome7" => (HIGH_RISK_DEVELOPER, None, None),
        "outcome8" => (HIGH_RISK_DEPLOYER, None, None),
        "outcome9" => (
            HIGH_RISK_BOTH,
            None,
            Some("Please answer all questions listed for both Developer (outcome7) and Deployer (outcome8) sections."),
        ),
        _ => return None,
    };
    Some(OutcomeDocs {
        title: outcome_title(outcome_id),
        questions,
        message,
        additional_note,
    })
}

#[derive(Error, Debug)]
pub enum DocsError {
    #[error("no classification in this session; finish the questionnaire first")]
    NoOutcome,

    #[error("no documentation requirements for outcome {0}")]
    UnknownOutcome(String),

    #[error("failed to generate documentation: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// `[{question, answer}]` as sent alongside documentation requests.
pub fn survey_history(history: &AnswerHistory) -> Vec<SurveyAnswer> {
    history
        .records()
        .iter()
        .map(|r| SurveyAnswer {
            question: r.question.clone(),
            answer: r.answer.label.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Edit,
    Preview,
}

/// Generated documentation as the user is editing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub markdown: String,
    pub mode: DraftMode,
}

impl Draft {
    pub fn preview_html(&self) -> String {
        render_markdown(&self.markdown)
    }
}

#[derive(Debug)]
pub struct DocumentationWorkflow {
    outcome: String,
    docs: OutcomeDocs,
    history: AnswerHistory,
    step: usize,
    pub answers: BTreeMap<String, String>,
    pub checklist_items: Vec<String>,
    pub checked: BTreeMap<usize, bool>,
    pub draft: Option<Draft>,
}

impl DocumentationWorkflow {
    /// Resume from saved session state. Needs a finished questionnaire.
    pub fn from_session(state: &SessionState) -> Result<Self, DocsError> {
        let outcome = state.risk_level.clone().ok_or(DocsError::NoOutcome)?;
        let docs =
            outcome_docs(&outcome).ok_or_else(|| DocsError::UnknownOutcome(outcome.clone()))?;
        Ok(Self {
            outcome,
            docs,
            history: state.survey_results.clone(),
            step: 0,
            answers: state.documentation_answers.clone(),
            checklist_items: state.documentation_checklist_items.clone(),
            checked: state.documentation_checklist.clone(),
            draft: None,
        })
    }

    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    pub fn docs(&self) -> &OutcomeDocs {
        &self.docs
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn current_question(&self) -> Option<&'static DocQuestion> {
        self.docs.questions.get(self.step)
    }

    pub fn step_label(&self) -> String {
        format!("Question {} of {}", self.step + 1, self.docs.questions.len())
    }

    pub fn is_last_question(&self) -> bool {
        self.step + 1 >= self.docs.questions.len()
    }

    pub fn answer(&mut self, text: impl Into<String>) {
        if let Some(q) = self.current_question() {
            self.answers.insert(q.id.to_string(), text.into());
        }
    }

    pub fn next(&mut self) {
        if !self.is_last_question() {
            self.step += 1;
        }
    }

    pub fn back(&mut self) {
        self.step = self.step.saturating_sub(1);
    }

    pub fn request(&self) -> OutcomeDocumentationRequest {
        OutcomeDocumentationRequest {
            outcome: self.outcome.clone(),
            answers: self.answers.clone(),
            checklist: BTreeMap::new(),
            survey_history: survey_history(&self.history),
        }
    }

    /// Request documentation and checklist together. Both must succeed
    /// before anything shown is replaced.
    pub async fn generate(&mut self, client: &ApiClient) -> Result<(), DocsError> {
        let req = self.request();
        info!(
            "generating documentation for {} ({} answer(s))",
            self.outcome,
            req.answers.len()
        );
        let (doc, checklist) = tokio::join!(
            client.generate_outcome_documentation(&req),
            client.generate_checklist(&req)
        );
        let doc = doc?;
        let checklist = checklist?;

        self.draft = Some(Draft {
            markdown: doc.report,
            mode: DraftMode::Edit,
        });
        self.checklist_items = checklist.checklist;
        self.checked.clear();
        Ok(())
    }

    /// Replace the draft text.
    pub fn edit(&mut self, markdown: impl Into<String>) {
        match &mut self.draft {
            Some(d) => d.markdown = markdown.into(),
            None => warn!("edit ignored: nothing generated yet"),
        }
    }

    pub fn set_mode(&mut self, mode: DraftMode) {
        if let Some(d) = &mut self.draft {
            d.mode = mode;
        }
    }

    pub fn toggle(&mut self, index: usize) -> bool {
        let entry = self.checked.entry(index).or_insert(false);
        *entry = !*entry;
        *entry
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(&index).copied().unwrap_or(false)
    }

    pub fn persist(&self, store: &SessionStore) -> Result<(), SessionError> {
        store.update(|s| {
            s.documentation_answers = self.answers.clone();
            s.documentation_checklist = self.checked.clone();
            s.documentation_checklist_items = self.checklist_items.clone();
        })?;
        Ok(())
    }

    /// Forget the whole session, questionnaire included.
    pub fn start_over(self, store: &SessionStore) -> Result<(), SessionError> {
        info!("documentation: starting over");
        store.clear()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::ClientConfig;
    use crate::questionnaire::{AnswerRecord, QuestionOption};

    fn state(outcome: &str) -> SessionState {
        let history = AnswerHistory::new().with(AnswerRecord {
            question_id: "q1".to_string(),
            question: "Do you do business in Colorado?".to_string(),
            answer: QuestionOption::to("Yes", "yes", "q2"),
        });
        SessionState {
            survey_results: history,
            risk_level: Some(outcome.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_question_counts_per_outcome() {
        let counts: Vec<(&str, usize)> = (1..=9)
            .map(|n| format!("outcome{n}"))
            .map(|id| {
                let docs = outcome_docs(&id).unwrap();
                (docs.title, docs.questions.len())
            })
            .collect();
        let lens: Vec<usize> = counts.iter().map(|(_, n)| *n).collect();
        assert_eq!(lens, vec![0, 4, 0, 0, 4, 0, 10, 12, 2]);

        assert!(outcome_docs("outcome3").unwrap().message.is_some());
        assert!(outcome_docs("outcome9").unwrap().additional_note.is_some());
        assert!(outcome_docs("outcome42").is_none());
    }

    #[test]
    fn test_requires_finished_questionnaire() {
        let err = DocumentationWorkflow::from_session(&SessionState::default()).unwrap_err();
        assert!(matches!(err, DocsError::NoOutcome));
    }

    #[test]
    fn test_stepper_and_answers() {
        let mut wf = DocumentationWorkflow::from_session(&state("outcome2")).unwrap();
        assert_eq!(wf.step_label(), "Question 1 of 4");
        wf.answer("Email us");
        wf.back();
        assert_eq!(wf.step(), 0);
        for _ in 0..10 {
            wf.next();
        }
        assert_eq!(wf.step(), 3);
        assert!(wf.is_last_question());
        wf.answer("Template reply");

        let req = wf.request();
        assert_eq!(req.answers["q1"], "Email us");
        assert_eq!(req.answers["q4"], "Template reply");
        assert!(req.checklist.is_empty());
        assert_eq!(req.survey_history[0].answer, "Yes");
    }

    #[tokio::test]
    async fn test_generate_fills_draft_and_resets_checks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate-outcome-documentation"))
            .and(body_partial_json(json!({
                "outcome": "outcome8",
                "surveyHistory": [{"question": "Do you do business in Colorado?", "answer": "Yes"}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"report": "# Deployer documentation"}))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate-checklist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "checklist": ["Adopt a risk management policy", "Complete an impact assessment"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(ClientConfig::new(server.uri()));
        let mut wf = DocumentationWorkflow::from_session(&state("outcome8")).unwrap();
        wf.checked.insert(0, true);
        wf.generate(&client).await.unwrap();

        let draft = wf.draft.clone().unwrap();
        assert_eq!(draft.mode, DraftMode::Edit);
        assert!(draft.preview_html().contains("<h1>Deployer documentation</h1>"));
        assert_eq!(wf.checklist_items.len(), 2);
        assert!(!wf.is_checked(0));

        wf.edit("# Edited");
        wf.set_mode(DraftMode::Preview);
        assert_eq!(wf.draft.as_ref().unwrap().markdown, "# Edited");
        assert!(wf.toggle(1));
        assert!(!wf.toggle(1));
    }

    #[tokio::test]
    async fn test_failed_generation_changes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate-outcome-documentation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"report": "# Doc"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate-checklist"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = ApiClient::new(ClientConfig::new(server.uri()));
        let mut wf = DocumentationWorkflow::from_session(&state("outcome7")).unwrap();
        let err = wf.generate(&client).await.unwrap_err();
        assert!(matches!(
            err,
            DocsError::Client(ClientError::Status { status: 502, .. })
        ));
        assert!(wf.draft.is_none());
    }

    #[tokio::test]
    async fn test_empty_checklist_replaces_previous_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate-outcome-documentation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"report": "# Doc"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate-checklist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"checklist": []})))
            .mount(&server)
            .await;

        let client = ApiClient::new(ClientConfig::new(server.uri()));
        let mut wf = DocumentationWorkflow::from_session(&state("outcome5")).unwrap();
        wf.checklist_items = vec!["Publish disclosure".to_string()];
        wf.toggle(0);
        wf.generate(&client).await.unwrap();

        assert!(wf.checklist_items.is_empty());
        assert!(!wf.is_checked(0));
    }

    #[test]
    fn test_persist_and_start_over() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&state("outcome5")).unwrap();

        let mut wf = DocumentationWorkflow::from_session(&store.load().unwrap()).unwrap();
        wf.answer("Chat assistant");
        wf.checklist_items = vec!["Publish disclosure".to_string()];
        wf.toggle(0);
        wf.persist(&store).unwrap();

        let saved = store.load().unwrap();
        assert_eq!(saved.documentation_answers["q1"], "Chat assistant");
        assert_eq!(saved.documentation_checklist.get(&0), Some(&true));
        assert_eq!(saved.risk_level.as_deref(), Some("outcome5"));

        let wf = DocumentationWorkflow::from_session(&saved).unwrap();
        assert!(wf.is_checked(0));
        wf.start_over(&store).unwrap();
        assert_eq!(store.load().unwrap(), SessionState::default());
    }
}
