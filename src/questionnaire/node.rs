use serde::{Deserialize, Serialize};

/// A single question in the applicability questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionNode {
    /// Unique identifier for this node (e.g. "q1", "q2a").
    pub id: String,
    /// The question shown to the user.
    pub prompt: String,
    /// Answers the user can pick from, in display order.
    pub options: Vec<QuestionOption>,
}

impl QuestionNode {
    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    /// Unique within its node.
    pub value: String,
    pub next: Next,
}

impl QuestionOption {
    pub fn to(label: impl Into<String>, value: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            next: Next::Literal(id.into()),
        }
    }

    pub fn computed(
        label: impl Into<String>,
        value: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            next: Next::Computed(rule.into()),
        }
    }
}

/// Where an option leads.
///
/// `Computed` names a rule in the [`RuleRegistry`](super::rules::RuleRegistry);
/// the rule decides the destination from the answers given so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Next {
    Literal(String),
    Computed(String),
}

/// Badge colour of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Red,
    Amber,
    Blue,
    Green,
}

impl Tone {
    pub fn hex(self) -> &'static str {
        match self {
            Tone::Red => "#ef4444",
            Tone::Amber => "#f59e0b",
            Tone::Blue => "#3b82f6",
            Tone::Green => "#22c55e",
        }
    }
}

/// Terminal classification. Reaching one ends the questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: String,
    pub title: String,
    /// One-line summary.
    pub description: String,
    /// What the classification means for the organisation.
    pub details: String,
    /// Why the act classifies it this way.
    pub reason: String,
    pub tone: Tone,
}
