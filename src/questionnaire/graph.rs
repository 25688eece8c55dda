use std::collections::{HashMap, HashSet};

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::questionnaire::history::{AnswerHistory, AnswerRecord};
use crate::questionnaire::node::{Next, Outcome, QuestionNode, QuestionOption};
use crate::questionnaire::rules::RuleRegistry;

/// Configuration problems. Any of these means the questionnaire data is
/// broken, not that the user did something wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("question not found: {0}")]
    NotFound(String),

    #[error("start node '{0}' is not a question")]
    MissingStart(String),

    #[error("question '{0}' has no options")]
    NoOptions(String),

    #[error("question '{node}' has duplicate option value '{value}'")]
    DuplicateOption { node: String, value: String },

    #[error("id '{0}' is used more than once")]
    DuplicateId(String),

    #[error("option '{node}/{value}' points to unknown id '{target}'")]
    DanglingReference {
        node: String,
        value: String,
        target: String,
    },

    #[error("option '{node}/{value}' uses unregistered rule '{rule}'")]
    UnknownRule {
        node: String,
        value: String,
        rule: String,
    },

    #[error("cycle in questionnaire: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("invalid questionnaire file: {0}")]
    Parse(String),
}

/// Where an id leads: another question or a terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Question(String),
    Outcome(String),
}

/// Serializable form of a questionnaire. Rules are referenced by name only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub start_node_id: String,
    pub questions: Vec<QuestionNode>,
    pub outcomes: Vec<Outcome>,
}

/// A validated questionnaire bound to its branching rules.
///
/// Only obtainable through [`QuestionGraph::load`], so every reference in a
/// `QuestionGraph` is known to resolve.
#[derive(Debug, Clone)]
pub struct QuestionGraph {
    nodes: HashMap<String, QuestionNode>,
    /// Question ids in configuration order.
    order: Vec<String>,
    outcomes: HashMap<String, Outcome>,
    start_node_id: String,
    rules: RuleRegistry,
    longest_path: usize,
}

impl QuestionGraph {
    /// Validate `config` against `rules` and build the graph.
    pub fn load(config: GraphConfig, rules: RuleRegistry) -> Result<Self, GraphError> {
        let mut nodes = HashMap::new();
        let mut order = Vec::new();
        for node in config.questions {
            if nodes.contains_key(&node.id) {
                return Err(GraphError::DuplicateId(node.id));
            }
            order.push(node.id.clone());
            nodes.insert(node.id.clone(), node);
        }

        let mut outcomes = HashMap::new();
        for outcome in config.outcomes {
            if nodes.contains_key(&outcome.id) || outcomes.contains_key(&outcome.id) {
                return Err(GraphError::DuplicateId(outcome.id));
            }
            outcomes.insert(outcome.id.clone(), outcome);
        }

        let mut graph = Self {
            nodes,
            order,
            outcomes,
            start_node_id: config.start_node_id,
            rules,
            longest_path: 0,
        };

        graph.check_static()?;
        graph.longest_path = graph.check_paths()?;
        debug!(
            "questionnaire loaded: {} questions, {} outcomes, longest path {}",
            graph.nodes.len(),
            graph.outcomes.len(),
            graph.longest_path
        );
        Ok(graph)
    }

    /// Parse a JSON [`GraphConfig`] and validate it.
    pub fn from_json(json: &str, rules: RuleRegistry) -> Result<Self, GraphError> {
        let config: GraphConfig =
            serde_json::from_str(json).map_err(|e| GraphError::Parse(e.to_string()))?;
        Self::load(config, rules)
    }

    pub fn start_node_id(&self) -> &str {
        &self.start_node_id
    }

    /// Look up a question. A miss is a configuration bug and is logged as such.
    pub fn current_node(&self, id: &str) -> Result<&QuestionNode, GraphError> {
        self.nodes.get(id).ok_or_else(|| {
            error!("questionnaire has no question '{id}'");
            GraphError::NotFound(id.to_string())
        })
    }

    pub fn outcome(&self, id: &str) -> Option<&Outcome> {
        self.outcomes.get(id)
    }

    /// Questions in configuration order.
    pub fn questions(&self) -> impl Iterator<Item = &QuestionNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn classify(&self, id: &str) -> Option<Destination> {
        if self.nodes.contains_key(id) {
            Some(Destination::Question(id.to_string()))
        } else if self.outcomes.contains_key(id) {
            Some(Destination::Outcome(id.to_string()))
        } else {
            None
        }
    }

    /// Destination id of `option` on `node` given the answers recorded
    /// before it.
    pub fn resolve_next(
        &self,
        node: &QuestionNode,
        option: &QuestionOption,
        history: &AnswerHistory,
    ) -> Result<String, GraphError> {
        match &option.next {
            Next::Literal(id) => Ok(id.clone()),
            Next::Computed(rule) => {
                self.rules
                    .evaluate(rule, history)
                    .ok_or_else(|| GraphError::UnknownRule {
                        node: node.id.clone(),
                        value: option.value.clone(),
                        rule: rule.clone(),
                    })
            }
        }
    }

    /// Maximum number of questions a user can be asked before an outcome.
    pub fn total_steps(&self) -> usize {
        self.longest_path
    }

    /// Checks that do not depend on answer history.
    fn check_static(&self) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&self.start_node_id) {
            return Err(GraphError::MissingStart(self.start_node_id.clone()));
        }

        for node in self.questions() {
            if node.options.is_empty() {
                return Err(GraphError::NoOptions(node.id.clone()));
            }
            let mut seen = HashSet::new();
            for option in &node.options {
                if !seen.insert(option.value.as_str()) {
                    return Err(GraphError::DuplicateOption {
                        node: node.id.clone(),
                        value: option.value.clone(),
                    });
                }
                match &option.next {
                    Next::Literal(target) if self.classify(target).is_none() => {
                        return Err(GraphError::DanglingReference {
                            node: node.id.clone(),
                            value: option.value.clone(),
                            target: target.clone(),
                        });
                    }
                    Next::Computed(rule) if !self.rules.contains(rule) => {
                        return Err(GraphError::UnknownRule {
                            node: node.id.clone(),
                            value: option.value.clone(),
                            rule: rule.clone(),
                        });
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Walk every path from the start, running rules against the history
    /// that actually reaches them. Returns the longest path length.
    fn check_paths(&self) -> Result<usize, GraphError> {
        let mut visited = HashSet::new();
        let mut path = vec![self.start_node_id.clone()];
        let longest = self.walk(
            &self.start_node_id,
            &AnswerHistory::new(),
            &mut path,
            &mut visited,
        )?;

        for id in &self.order {
            if !visited.contains(id) {
                warn!("question '{id}' is unreachable from '{}'", self.start_node_id);
            }
        }
        Ok(longest)
    }

    fn walk(
        &self,
        node_id: &str,
        history: &AnswerHistory,
        path: &mut Vec<String>,
        visited: &mut HashSet<String>,
    ) -> Result<usize, GraphError> {
        visited.insert(node_id.to_string());
        let node = self.current_node(node_id)?;
        let mut longest = 0;

        for option in &node.options {
            let target = self.resolve_next(node, option, history)?;

            match self.classify(&target) {
                None => {
                    return Err(GraphError::DanglingReference {
                        node: node.id.clone(),
                        value: option.value.clone(),
                        target,
                    })
                }
                Some(Destination::Outcome(_)) => {}
                Some(Destination::Question(next_id)) => {
                    if path.contains(&next_id) {
                        let mut cycle = path.clone();
                        cycle.push(next_id);
                        return Err(GraphError::Cycle { path: cycle });
                    }
                    let next_history = history.with(AnswerRecord {
                        question_id: node.id.clone(),
                        question: node.prompt.clone(),
                        answer: option.clone(),
                    });
                    path.push(next_id.clone());
                    let depth = self.walk(&next_id, &next_history, path, visited)?;
                    path.pop();
                    longest = longest.max(depth);
                }
            }
        }

        Ok(1 + longest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::node::Tone;

    fn outcome(id: &str) -> Outcome {
        Outcome {
            id: id.into(),
            title: id.to_uppercase(),
            description: String::new(),
            details: String::new(),
            reason: String::new(),
            tone: Tone::Blue,
        }
    }

    fn question(id: &str, options: Vec<QuestionOption>) -> QuestionNode {
        QuestionNode {
            id: id.into(),
            prompt: format!("{id}?"),
            options,
        }
    }

    fn config(questions: Vec<QuestionNode>) -> GraphConfig {
        GraphConfig {
            start_node_id: "a".into(),
            questions,
            outcomes: vec![outcome("done"), outcome("other")],
        }
    }

    fn pick_by_a(history: &AnswerHistory) -> String {
        match history.answer_value("a") {
            Some("yes") => "done".into(),
            _ => "other".into(),
        }
    }

    fn broken_rule(_: &AnswerHistory) -> String {
        "nowhere".into()
    }

    fn broken_after_no(history: &AnswerHistory) -> String {
        match history.answer_value("a") {
            Some("yes") => "done".into(),
            _ => "nowhere".into(),
        }
    }

    #[test]
    fn test_load_valid_graph() {
        let mut rules = RuleRegistry::new();
        rules.register("pick", pick_by_a);
        let graph = QuestionGraph::load(
            config(vec![
                question(
                    "a",
                    vec![
                        QuestionOption::to("Yes", "yes", "b"),
                        QuestionOption::to("No", "no", "done"),
                    ],
                ),
                question("b", vec![QuestionOption::computed("Go", "go", "pick")]),
            ]),
            rules,
        )
        .unwrap();

        assert_eq!(graph.total_steps(), 2);
        assert_eq!(graph.start_node_id(), "a");
        assert_eq!(
            graph.classify("done"),
            Some(Destination::Outcome("done".into()))
        );
        assert_eq!(graph.classify("b"), Some(Destination::Question("b".into())));
        assert!(matches!(
            graph.current_node("zzz"),
            Err(GraphError::NotFound(id)) if id == "zzz"
        ));
    }

    #[test]
    fn test_rejects_dangling_literal() {
        let err = QuestionGraph::load(
            config(vec![question("a", vec![QuestionOption::to("Y", "y", "ghost")])]),
            RuleRegistry::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingReference {
                node: "a".into(),
                value: "y".into(),
                target: "ghost".into()
            }
        );
    }

    #[test]
    fn test_rejects_empty_node_and_missing_start() {
        let err =
            QuestionGraph::load(config(vec![question("a", vec![])]), RuleRegistry::new())
                .unwrap_err();
        assert_eq!(err, GraphError::NoOptions("a".into()));

        let mut cfg = config(vec![question("a", vec![QuestionOption::to("Y", "y", "done")])]);
        cfg.start_node_id = "done".into();
        let err = QuestionGraph::load(cfg, RuleRegistry::new()).unwrap_err();
        assert_eq!(err, GraphError::MissingStart("done".into()));
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = QuestionGraph::load(
            config(vec![question(
                "a",
                vec![
                    QuestionOption::to("Y", "y", "done"),
                    QuestionOption::to("Also Y", "y", "other"),
                ],
            )]),
            RuleRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateOption { .. }));

        let err = QuestionGraph::load(
            config(vec![
                question("a", vec![QuestionOption::to("Y", "y", "done")]),
                question("done", vec![QuestionOption::to("Y", "y", "other")]),
            ]),
            RuleRegistry::new(),
        )
        .unwrap_err();
        assert_eq!(err, GraphError::DuplicateId("done".into()));
    }

    #[test]
    fn test_rejects_unregistered_rule_and_bad_rule_output() {
        let cfg = || config(vec![question("a", vec![QuestionOption::computed("Y", "y", "r")])]);

        let err = QuestionGraph::load(cfg(), RuleRegistry::new()).unwrap_err();
        assert!(matches!(err, GraphError::UnknownRule { rule, .. } if rule == "r"));

        let mut rules = RuleRegistry::new();
        rules.register("r", broken_rule);
        let err = QuestionGraph::load(cfg(), rules).unwrap_err();
        assert!(matches!(err, GraphError::DanglingReference { target, .. } if target == "nowhere"));
    }

    #[test]
    fn test_rule_checked_on_every_reachable_history() {
        let mut rules = RuleRegistry::new();
        rules.register("r", broken_after_no);
        let err = QuestionGraph::load(
            config(vec![
                question(
                    "a",
                    vec![
                        QuestionOption::to("Yes", "yes", "b"),
                        QuestionOption::to("No", "no", "b"),
                    ],
                ),
                question("b", vec![QuestionOption::computed("Go", "go", "r")]),
            ]),
            rules,
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingReference {
                node: "b".into(),
                value: "go".into(),
                target: "nowhere".into()
            }
        );
    }

    #[test]
    fn test_resolve_next_names_owning_node() {
        let mut rules = RuleRegistry::new();
        rules.register("pick", pick_by_a);
        let graph = QuestionGraph::load(
            config(vec![
                question("a", vec![QuestionOption::to("Yes", "yes", "b")]),
                question("b", vec![QuestionOption::computed("Go", "go", "pick")]),
            ]),
            rules,
        )
        .unwrap();
        let b = graph.current_node("b").unwrap();
        let stray = QuestionOption::computed("Skip", "skip", "missing");
        let err = graph
            .resolve_next(b, &stray, &AnswerHistory::new())
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownRule {
                node: "b".into(),
                value: "skip".into(),
                rule: "missing".into()
            }
        );
        assert!(err.to_string().contains("'b/skip'"));
    }

    #[test]
    fn test_rejects_cycle() {
        let err = QuestionGraph::load(
            config(vec![
                question("a", vec![QuestionOption::to("Y", "y", "b")]),
                question("b", vec![QuestionOption::to("Back", "back", "a")]),
            ]),
            RuleRegistry::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                path: vec!["a".into(), "b".into(), "a".into()]
            }
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "start_node_id": "a",
            "questions": [
                {"id": "a", "prompt": "A?", "options": [
                    {"label": "Yes", "value": "yes", "next": {"literal": "done"}},
                    {"label": "Ask", "value": "ask", "next": {"computed": "pick"}}
                ]}
            ],
            "outcomes": [
                {"id": "done", "title": "Done", "description": "", "details": "", "reason": "", "tone": "green"},
                {"id": "other", "title": "Other", "description": "", "details": "", "reason": "", "tone": "red"}
            ]
        }"#;
        let mut rules = RuleRegistry::new();
        rules.register("pick", pick_by_a);
        let graph = QuestionGraph::from_json(json, rules).unwrap();
        assert_eq!(graph.outcome("other").unwrap().tone, Tone::Red);

        let err = QuestionGraph::from_json("{", RuleRegistry::new()).unwrap_err();
        assert!(matches!(err, GraphError::Parse(_)));
    }
}
