pub mod colorado;
pub mod graph;
pub mod history;
pub mod node;
pub mod rules;

use log::{debug, info};
use thiserror::Error;

pub use graph::{Destination, GraphConfig, GraphError, QuestionGraph};
pub use history::{AnswerHistory, AnswerRecord};
pub use node::{Next, Outcome, QuestionNode, QuestionOption, Tone};
pub use rules::{RuleFn, RuleRegistry};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("no earlier answer to go back to")]
    EmptyHistory,

    #[error("questionnaire already finished at '{0}'; restart to answer again")]
    AtTerminal(String),

    #[error("question '{node}' has no option '{value}'")]
    UnknownOption { node: String, value: String },

    #[error("saved answers do not match the questionnaire at '{0}'")]
    Replay(String),
}

/// Result of answering a question.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub history: AnswerHistory,
    pub next_id: String,
    pub destination: Destination,
}

/// Result of stepping back.
#[derive(Debug, Clone, PartialEq)]
pub struct Retreat {
    pub history: AnswerHistory,
    pub previous_id: String,
    /// The option that was selected there, so it can be shown as selected again.
    pub previous_option: QuestionOption,
}

/// Record the answer `option` to question `node_id` and work out where it leads.
///
/// Rules see the history as it was before this answer.
pub fn advance(
    graph: &QuestionGraph,
    node_id: &str,
    history: &AnswerHistory,
    option: &QuestionOption,
) -> Result<Advance, EvalError> {
    let node = graph.current_node(node_id)?;
    if !node.options.contains(option) {
        return Err(EvalError::UnknownOption {
            node: node.id.clone(),
            value: option.value.clone(),
        });
    }

    let next_id = graph.resolve_next(node, option, history)?;
    let destination = graph
        .classify(&next_id)
        .ok_or_else(|| GraphError::NotFound(next_id.clone()))?;

    let history = history.with(AnswerRecord {
        question_id: node.id.clone(),
        question: node.prompt.clone(),
        answer: option.clone(),
    });

    Ok(Advance {
        history,
        next_id,
        destination,
    })
}

pub fn retreat(history: &AnswerHistory) -> Result<Retreat, EvalError> {
    let (history, last) = history.without_last().ok_or(EvalError::EmptyHistory)?;
    Ok(Retreat {
        history,
        previous_id: last.question_id,
        previous_option: last.answer,
    })
}

// ---------------------------------------------------------------------------
// Survey state machine
// ---------------------------------------------------------------------------

/// Where the user currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Question(String),
    Outcome(String),
}

/// One user's walk through a questionnaire.
#[derive(Debug, Clone)]
pub struct Survey<'g> {
    graph: &'g QuestionGraph,
    history: AnswerHistory,
    position: Position,
}

impl<'g> Survey<'g> {
    pub fn new(graph: &'g QuestionGraph) -> Self {
        Self {
            graph,
            history: AnswerHistory::new(),
            position: Position::Question(graph.start_node_id().to_string()),
        }
    }

    /// Rebuild a survey from saved answers by replaying them from the start.
    pub fn replay(graph: &'g QuestionGraph, saved: &AnswerHistory) -> Result<Self, EvalError> {
        let mut survey = Self::new(graph);
        for record in saved.records() {
            match &survey.position {
                Position::Question(id) if *id == record.question_id => {}
                _ => return Err(EvalError::Replay(record.question_id.clone())),
            }
            let option = survey
                .current_question()?
                .option(&record.answer.value)
                .cloned()
                .ok_or_else(|| EvalError::Replay(record.question_id.clone()))?;
            survey.choose(&option)?;
        }
        Ok(survey)
    }

    pub fn graph(&self) -> &'g QuestionGraph {
        self.graph
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn history(&self) -> &AnswerHistory {
        &self.history
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.position, Position::Outcome(_))
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    /// 1-based number of the question being shown.
    pub fn step_number(&self) -> usize {
        self.history.len() + 1
    }

    pub fn current_question(&self) -> Result<&'g QuestionNode, EvalError> {
        match &self.position {
            Position::Question(id) => Ok(self.graph.current_node(id)?),
            Position::Outcome(id) => Err(EvalError::AtTerminal(id.clone())),
        }
    }

    pub fn outcome(&self) -> Option<&'g Outcome> {
        match &self.position {
            Position::Outcome(id) => self.graph.outcome(id),
            Position::Question(_) => None,
        }
    }

    /// Answer the current question with the option whose value is `value`.
    pub fn select(&mut self, value: &str) -> Result<&Position, EvalError> {
        let node = self.current_question()?;
        let option = node
            .option(value)
            .cloned()
            .ok_or_else(|| EvalError::UnknownOption {
                node: node.id.clone(),
                value: value.to_string(),
            })?;
        self.choose(&option)
    }

    fn choose(&mut self, option: &QuestionOption) -> Result<&Position, EvalError> {
        let node_id = match &self.position {
            Position::Question(id) => id.clone(),
            Position::Outcome(id) => return Err(EvalError::AtTerminal(id.clone())),
        };

        let step = advance(self.graph, &node_id, &self.history, option)?;
        info!(
            "Transition: {} -> {} (answer: {})",
            node_id, step.next_id, option.value
        );

        self.history = step.history;
        self.position = match step.destination {
            Destination::Question(id) => Position::Question(id),
            Destination::Outcome(id) => {
                info!("Questionnaire finished at outcome: {id}");
                Position::Outcome(id)
            }
        };
        Ok(&self.position)
    }

    /// Step back one question. Returns the option that had been chosen there.
    pub fn back(&mut self) -> Result<QuestionOption, EvalError> {
        let step = retreat(&self.history)?;
        debug!("Back to {} (was: {})", step.previous_id, step.previous_option.value);
        self.history = step.history;
        self.position = Position::Question(step.previous_id);
        Ok(step.previous_option)
    }

    pub fn restart(&mut self) {
        info!("Questionnaire restarted");
        self.history = AnswerHistory::new();
        self.position = Position::Question(self.graph.start_node_id().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorado::{
        HIGH_RISK_BOTH, HIGH_RISK_DEPLOYER, HIGH_RISK_DEVELOPER, NOT_SUBJECT, START,
    };

    fn walk<'g>(graph: &'g QuestionGraph, answers: &[&str]) -> Survey<'g> {
        let mut survey = Survey::new(graph);
        for a in answers {
            survey.select(a).unwrap();
        }
        survey
    }

    #[test]
    fn test_no_business_in_colorado_ends_immediately() {
        let graph = colorado::graph().unwrap();
        let survey = walk(&graph, &["no"]);
        assert_eq!(survey.position(), &Position::Outcome(NOT_SUBJECT.into()));
        assert_eq!(survey.history().len(), 1);
        assert_eq!(
            survey.outcome().unwrap().title,
            "Not Subject to the Colorado AI Act"
        );
    }

    #[test]
    fn test_high_risk_roles_follow_earlier_answers() {
        let graph = colorado::graph().unwrap();

        // built it, does not use it: developer
        let dev = walk(
            &graph,
            &["yes", "yes", "no", "yes", "yes", "employment", "consequential_decision"],
        );
        assert_eq!(dev.position(), &Position::Outcome(HIGH_RISK_DEVELOPER.into()));

        // did not build it, uses it: deployer
        let dep = walk(&graph, &["yes", "no", "yes", "data", "housing", "none"]);
        assert_eq!(dep.position(), &Position::Outcome(HIGH_RISK_DEPLOYER.into()));

        // built it and uses it: both
        let both = walk(&graph, &["yes", "yes", "yes", "none", "insurance", "none"]);
        assert_eq!(both.position(), &Position::Outcome(HIGH_RISK_BOTH.into()));
    }

    #[test]
    fn test_advance_then_retreat_round_trip() {
        let graph = colorado::graph().unwrap();
        let mut survey = walk(&graph, &["yes", "no"]);
        let before_pos = survey.position().clone();
        let before_history = survey.history().clone();

        survey.select("yes").unwrap();
        assert_eq!(survey.position(), &Position::Question("q3".into()));

        let restored = survey.back().unwrap();
        assert_eq!(survey.position(), &before_pos);
        assert_eq!(survey.history(), &before_history);
        assert_eq!(restored.value, "yes");
        assert_eq!(restored, graph.current_node("q2b").unwrap().options[0]);
    }

    #[test]
    fn test_free_functions_round_trip() {
        let graph = colorado::graph().unwrap();
        let node = graph.current_node(START).unwrap();
        let option = node.option("yes").unwrap();

        let step = advance(&graph, START, &AnswerHistory::new(), option).unwrap();
        assert_eq!(step.next_id, "q2");
        assert_eq!(step.destination, Destination::Question("q2".into()));

        let back = retreat(&step.history).unwrap();
        assert!(back.history.is_empty());
        assert_eq!(back.previous_id, START);
        assert_eq!(&back.previous_option, option);

        assert_eq!(retreat(&back.history), Err(EvalError::EmptyHistory));
    }

    #[test]
    fn test_back_from_outcome_restores_last_question() {
        let graph = colorado::graph().unwrap();
        let mut survey = walk(&graph, &["no"]);
        let option = survey.back().unwrap();
        assert_eq!(survey.position(), &Position::Question(START.into()));
        assert_eq!(option.value, "no");
        assert!(!survey.can_go_back());
        assert_eq!(survey.back(), Err(EvalError::EmptyHistory));
    }

    #[test]
    fn test_outcome_blocks_advance_until_restart() {
        let graph = colorado::graph().unwrap();
        let mut survey = walk(&graph, &["no"]);
        assert!(survey.is_finished());
        assert_eq!(
            survey.select("yes").unwrap_err(),
            EvalError::AtTerminal(NOT_SUBJECT.into())
        );
        assert!(survey.current_question().is_err());

        survey.restart();
        assert_eq!(survey.position(), &Position::Question(START.into()));
        assert!(survey.history().is_empty());
        survey.select("yes").unwrap();
        assert_eq!(survey.position(), &Position::Question("q2".into()));
    }

    #[test]
    fn test_resolve_next_is_deterministic() {
        let graph = colorado::graph().unwrap();
        let survey = walk(&graph, &["yes", "yes", "no", "yes", "yes", "employment"]);
        let q8 = survey.current_question().unwrap();
        let option = q8.option("consequential_decision").unwrap();
        let first = graph.resolve_next(q8, option, survey.history()).unwrap();
        for _ in 0..10 {
            assert_eq!(graph.resolve_next(q8, option, survey.history()).unwrap(), first);
        }
        assert_eq!(first, HIGH_RISK_DEVELOPER);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let graph = colorado::graph().unwrap();
        let mut survey = Survey::new(&graph);
        assert_eq!(
            survey.select("maybe").unwrap_err(),
            EvalError::UnknownOption {
                node: START.into(),
                value: "maybe".into()
            }
        );

        let foreign = QuestionOption::to("Yes", "yes", "q3");
        assert!(matches!(
            advance(&graph, START, &AnswerHistory::new(), &foreign),
            Err(EvalError::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_replay_saved_history() {
        let graph = colorado::graph().unwrap();
        let original = walk(&graph, &["yes", "no", "yes", "all"]);
        let replayed = Survey::replay(&graph, original.history()).unwrap();
        assert_eq!(replayed.position(), original.position());
        assert_eq!(replayed.step_number(), 5);

        let mut tampered = AnswerHistory::new();
        tampered = tampered.with(AnswerRecord {
            question_id: "q5".into(),
            question: String::new(),
            answer: QuestionOption::to("Yes", "yes", "q6"),
        });
        assert_eq!(
            Survey::replay(&graph, &tampered).unwrap_err(),
            EvalError::Replay("q5".into())
        );
    }
}
