use std::collections::HashMap;
use std::fmt;

use crate::questionnaire::history::AnswerHistory;

/// A branching rule. Plain function pointers cannot capture state, so a rule
/// only ever sees the history it is handed.
pub type RuleFn = fn(&AnswerHistory) -> String;

/// Named branching rules referenced by `Next::Computed`.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, RuleFn>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, rule: RuleFn) -> &mut Self {
        self.rules.insert(id.into(), rule);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// Runs rule `id`, or `None` if no such rule is registered.
    pub fn evaluate(&self, id: &str, history: &AnswerHistory) -> Option<String> {
        self.rules.get(id).map(|rule| rule(history))
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.rules.keys().collect();
        ids.sort();
        f.debug_struct("RuleRegistry").field("rules", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_done(_: &AnswerHistory) -> String {
        "done".into()
    }

    #[test]
    fn test_evaluate_registered_and_missing() {
        let mut reg = RuleRegistry::new();
        reg.register("finish", always_done);
        assert!(reg.contains("finish"));
        assert_eq!(
            reg.evaluate("finish", &AnswerHistory::new()).as_deref(),
            Some("done")
        );
        assert_eq!(reg.evaluate("nope", &AnswerHistory::new()), None);
        assert!(format!("{reg:?}").contains("finish"));
    }
}
