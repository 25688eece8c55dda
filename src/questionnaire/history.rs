use serde::{Deserialize, Serialize};

use crate::questionnaire::node::QuestionOption;

/// One answered question. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: String,
    /// Question text as it was shown.
    pub question: String,
    pub answer: QuestionOption,
}

/// Ordered record of the path actually walked through the questionnaire.
///
/// Grows by one record per forward step and shrinks by one per backward
/// step; there is no other way to change it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerHistory {
    records: Vec<AnswerRecord>,
}

impl AnswerHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&AnswerRecord> {
        self.records.last()
    }

    /// Value chosen for `question_id`, if it was answered on this path.
    pub fn answer_value(&self, question_id: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.question_id == question_id)
            .map(|r| r.answer.value.as_str())
    }

    /// Returns a new history with `record` appended.
    pub fn with(&self, record: AnswerRecord) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// Returns the history without its last record, and that record.
    pub fn without_last(&self) -> Option<(Self, AnswerRecord)> {
        let mut records = self.records.clone();
        let last = records.pop()?;
        Some((Self { records }, last))
    }
}
