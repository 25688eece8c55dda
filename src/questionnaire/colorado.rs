//! Colorado AI Act (SB 24-205) applicability questionnaire.

use crate::questionnaire::graph::{GraphConfig, GraphError, QuestionGraph};
use crate::questionnaire::history::AnswerHistory;
use crate::questionnaire::node::{Outcome, QuestionNode, QuestionOption, Tone};
use crate::questionnaire::rules::RuleRegistry;

pub const START: &str = "q1";
pub const NOT_SUBJECT: &str = "outcome1";
pub const EXEMPT_DEPLOYER: &str = "outcome2";
pub const NOT_AN_AI_SYSTEM: &str = "outcome3";
pub const NOT_A_DEVELOPER: &str = "outcome4";
pub const DISCLOSURE_DUTY: &str = "outcome5";
pub const NOT_REGULATED: &str = "outcome6";
pub const HIGH_RISK_DEVELOPER: &str = "outcome7";
pub const HIGH_RISK_DEPLOYER: &str = "outcome8";
pub const HIGH_RISK_BOTH: &str = "outcome9";

/// Rule deciding which high-risk role applies from the q2a/q2b answers.
pub const HIGH_RISK_ROLE: &str = "high_risk_role";

/// Builders who do not use the system themselves are developers; users of a
/// third-party system are deployers; builders who also use it are both.
pub fn high_risk_role(history: &AnswerHistory) -> String {
    if history.answer_value("q2a") == Some("no") {
        return HIGH_RISK_DEVELOPER.into();
    }
    if history.answer_value("q2b") == Some("yes") {
        return HIGH_RISK_DEPLOYER.into();
    }
    HIGH_RISK_BOTH.into()
}

pub fn rules() -> RuleRegistry {
    let mut rules = RuleRegistry::new();
    rules.register(HIGH_RISK_ROLE, high_risk_role);
    rules
}

pub fn graph() -> Result<QuestionGraph, GraphError> {
    QuestionGraph::load(config(), rules())
}

pub fn config() -> GraphConfig {
    GraphConfig {
        start_node_id: START.into(),
        questions: questions(),
        outcomes: outcomes(),
    }
}

fn yes_no(id: &str, prompt: &str, yes: &str, no: &str) -> QuestionNode {
    QuestionNode {
        id: id.into(),
        prompt: prompt.into(),
        options: vec![
            QuestionOption::to("Yes", "yes", yes),
            QuestionOption::to("No", "no", no),
        ],
    }
}

fn questions() -> Vec<QuestionNode> {
    vec![
        yes_no(
            "q1",
            "Does your organization conduct business in the state of Colorado, such as offering products or services to Colorado residents?",
            "q2",
            NOT_SUBJECT,
        ),
        yes_no(
            "q2",
            "Did you or your organization build the AI system in question, or make deliberate, significant changes to an existing AI system?",
            "q2a",
            "q2b",
        ),
        yes_no(
            "q2a",
            "Does your organization also use this AI system to make, or help make, important decisions that have a significant effect on consumers (e.g., in areas like employment, housing, or lending)?",
            "q3",
            "q4",
        ),
        yes_no(
            "q2b",
            "Does your organization use an AI system to make, or help make, important decisions that have a significant effect on consumers (e.g., in areas like employment, housing, or lending)?",
            "q3",
            "q6",
        ),
        QuestionNode {
            id: "q3".into(),
            prompt: "(For Deployers): Select the criteria that your organization meets, or all of the above:".into(),
            options: vec![
                QuestionOption::to("Employs fewer than 50 full-time equivalent employees.", "employees", "q4"),
                QuestionOption::to("Does NOT use its own data to train the AI system.", "data", "q6"),
                QuestionOption::to("The AI system is used only for the intended purposes disclosed by the developer.", "purpose", "q6"),
                QuestionOption::to("You make information from the developer's impact assessment available to consumers.", "impact_assessment", "q6"),
                QuestionOption::to("None of the above", "none", "q6"),
                QuestionOption::to("All of the above", "all", EXEMPT_DEPLOYER),
            ],
        },
        yes_no(
            "q4",
            "Does your technology meet the definition of an \"Artificial Intelligence System\" – a machine-based system that infers from inputs how to generate outputs (like content, decisions, or predictions) that can influence physical or virtual environments?",
            "q5",
            NOT_AN_AI_SYSTEM,
        ),
        yes_no(
            "q5",
            "Did your organization create the AI system, or did you make an \"intentional and substantial modification\" to an existing AI system?",
            "q6",
            NOT_A_DEVELOPER,
        ),
        QuestionNode {
            id: "q6".into(),
            prompt: "In which areas is your AI system making, or is it a \"substantial factor\" in making, a \"consequential decision\" affecting a consumer?".into(),
            options: vec![
                QuestionOption::to("Employment or employment opportunity", "employment", "q8"),
                QuestionOption::to("Housing", "housing", "q8"),
                QuestionOption::to("Financial or lending service", "financial", "q8"),
                QuestionOption::to("Education enrollment or opportunity", "education", "q8"),
                QuestionOption::to("Healthcare services", "healthcare_services", "q8"),
                QuestionOption::to("Insurance", "insurance", "q8"),
                QuestionOption::to("An essential government service", "essential_government_service", "q8"),
                QuestionOption::to("Legal services", "legal_services", "q8"),
                QuestionOption::to("None of the above", "none", "q7"),
            ],
        },
        yes_no(
            "q7",
            "Is the AI system intended to interact directly with consumers?",
            DISCLOSURE_DUTY,
            NOT_REGULATED,
        ),
        QuestionNode {
            id: "q8".into(),
            prompt: "Which of the following categories does your AI system fall into? (If your AI system makes a \"consequential decision\" affecting a consumer, please select \"Consequential Decision\"):".into(),
            options: vec![
                QuestionOption::computed("Consequential Decision", "consequential_decision", HIGH_RISK_ROLE),
                QuestionOption::to("Performs ONLY a narrow procedural task.", "narrow_procedural_task", "q7"),
                QuestionOption::to("Detects decision-making patterns without replacing or influencing human assessment.", "detect_decision_making_patterns", "q7"),
                QuestionOption::to("Is a technology like a spam filter, firewall, spreadsheet, or calculator.", "simple_technology", "q7"),
                QuestionOption::computed("None of the above", "none", HIGH_RISK_ROLE),
            ],
        },
    ]
}

fn outcome(id: &str, tone: Tone, title: &str, description: &str, details: &str, reason: &str) -> Outcome {
    Outcome {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        details: details.into(),
        reason: reason.into(),
        tone,
    }
}

fn outcomes() -> Vec<Outcome> {
    vec![
        outcome(
            NOT_SUBJECT,
            Tone::Red,
            "Not Subject to the Colorado AI Act",
            "Your organization is likely not subject to this act.",
            "The Colorado AI Act applies to persons or entities \"doing business in this state.\" If your organization has no business nexus with Colorado, the Act's requirements do not apply.",
            "The Act's jurisdiction is established by the \"doing business in Colorado\" clause. Without this, there are no compliance obligations.",
        ),
        outcome(
            EXEMPT_DEPLOYER,
            Tone::Amber,
            "Exempt Deployer",
            "You are a small business deployer with reduced obligations.",
            "You are exempt from some of the Act's more burdensome requirements, such as the notice to consumers. However, you must still use reasonable care to protect consumers from algorithmic discrimination and make impact assessment information available to them.",
            "The Act provides a narrow exemption for deployers that meet four specific criteria related to size, data usage, and adherence to developer guidelines, aiming to reduce the compliance burden on small businesses.",
        ),
        outcome(
            NOT_AN_AI_SYSTEM,
            Tone::Amber,
            "Not an AI System Under CAIA",
            "Your technology does not meet the Act's definition.",
            "Your system is not subject to the requirements of the Colorado AI Act.",
            "The Act defines an AI system as one that infers from inputs to generate outputs that influence environments. If your technology does not perform this core function, it falls outside the scope of the legislation.",
        ),
        outcome(
            NOT_A_DEVELOPER,
            Tone::Blue,
            "Not a Developer Under CAIA",
            "Your role does not meet the Act's definition.",
            "You are not subject to the specific obligations for Developers under the Act. If you use a high-risk AI system, you may still have obligations as a Deployer.",
            "A \"Developer\" is defined as an entity that either creates an AI system or \"intentionally and substantially modifies\" one, creating a new risk of discrimination. Simply using a system without modifying it in this way does not make you a Developer.",
        ),
        outcome(
            DISCLOSURE_DUTY,
            Tone::Blue,
            "General AI System with Disclosure Duty",
            "Your system requires a basic consumer disclosure.",
            "You must disclose to any consumer interacting with the AI system that they are, in fact, interacting with an AI system. This is not required if it would be obvious to a reasonable person.",
            "The Act includes a broad transparency rule that applies to all consumer-facing AI, not just high-risk systems, to ensure consumers are aware of the nature of their interaction.",
        ),
        outcome(
            NOT_REGULATED,
            Tone::Green,
            "Not a Regulated System",
            "Your AI system is not currently regulated by CAIA.",
            "Your AI system is not considered \"high-risk\" and is not consumer-facing, so it is not subject to the Act's primary obligations or its general disclosure rule.",
            "The Act focuses its most stringent requirements on \"high-risk\" systems used for consequential decisions. It also has a general disclosure rule for consumer-facing AI. Systems that are neither high-risk nor consumer-facing fall outside these provisions.",
        ),
        outcome(
            HIGH_RISK_DEVELOPER,
            Tone::Green,
            "Developer of High-Risk AI System",
            "You have full compliance duties as a Developer.",
            "You must use reasonable care to protect consumers from known or reasonably foreseeable risks of algorithmic discrimination. You must provide deployers with a general statement on foreseeable uses and documentation covering the system's purpose, training data summaries, known limitations, performance evaluation, and risk mitigation measures. You must maintain a statement on your website summarizing the types of high-risk AI systems you've developed and how you manage discrimination risks. You must disclose to the Attorney General and all known deployers within 90 days if you discover the system has caused or is likely to cause algorithmic discrimination.",
            "Your AI system is classified as \"high-risk\" because it is a substantial factor in making a \"consequential decision\" and does not qualify for an exemption. The Act places specific obligations on the creators of these systems to ensure transparency and accountability down the supply chain.",
        ),
        outcome(
            HIGH_RISK_DEPLOYER,
            Tone::Green,
            "Deployer of High-Risk AI System",
            "You have full compliance duties as a Deployer.",
            "You must use reasonable care to protect consumers from known or reasonably foreseeable risks of algorithmic discrimination. You must implement and maintain a risk management policy and program, considering frameworks like the NIST AI Risk Management Framework. You must conduct and document an impact assessment for the system at least annually and within 90 days of any substantial modification. You must notify consumers before a consequential decision is made. If a decision is adverse, you must provide the reason(s) and an opportunity for the consumer to correct data and appeal the decision. You must maintain a statement on your website summarizing the types of high-risk systems you deploy and how you manage discrimination risks. You must disclose to the Attorney General within 90 days if you discover the system has caused algorithmic discrimination.",
            "Your use of the AI system classifies you as a \"Deployer\" of a \"high-risk\" system because it is a substantial factor in making a \"consequential decision.\" The Act places the most extensive obligations on Deployers as they are the entities directly impacting consumers.",
        ),
        outcome(
            HIGH_RISK_BOTH,
            Tone::Green,
            "Both Developer and Deployer of High-Risk AI System",
            "You must comply with the duties of both roles.",
            "You must fulfill all obligations related to both roles. This includes providing documentation about the system you developed and conducting impact assessments for how you deploy it, among all other duties.",
            "An entity that develops a high-risk AI system and also uses it to make consequential decisions about consumers is subject to the full set of requirements for both roles under the Act.",
        ),
    ]
}

/// Title for an outcome id, as shown by the chatbot and documentation views.
pub fn outcome_title(id: &str) -> &'static str {
    match id {
        NOT_SUBJECT => "Not Subject to the Colorado AI Act",
        EXEMPT_DEPLOYER => "Exempt Deployer",
        NOT_AN_AI_SYSTEM => "Not an AI System Under CAIA",
        NOT_A_DEVELOPER => "Not a Developer Under CAIA",
        DISCLOSURE_DUTY => "General AI System with Disclosure Duty",
        NOT_REGULATED => "Not a Regulated System",
        HIGH_RISK_DEVELOPER => "Developer of High-Risk AI System",
        HIGH_RISK_DEPLOYER => "Deployer of High-Risk AI System",
        HIGH_RISK_BOTH => "Both Developer and Deployer of High-Risk AI System",
        _ => "Unknown Classification",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::history::AnswerRecord;

    fn answered(pairs: &[(&str, &str)]) -> AnswerHistory {
        pairs.iter().fold(AnswerHistory::new(), |h, (q, v)| {
            h.with(AnswerRecord {
                question_id: (*q).into(),
                question: String::new(),
                answer: QuestionOption::to(*v, *v, "x"),
            })
        })
    }

    #[test]
    fn test_builtin_graph_validates() {
        let graph = graph().unwrap();
        assert_eq!(graph.start_node_id(), START);
        assert_eq!(graph.questions().count(), 10);
        // q1 q2 q2a q3 q4 q5 q6 q8 q7
        assert_eq!(graph.total_steps(), 9);
    }

    #[test]
    fn test_high_risk_role() {
        assert_eq!(high_risk_role(&answered(&[("q2a", "no")])), HIGH_RISK_DEVELOPER);
        assert_eq!(high_risk_role(&answered(&[("q2b", "yes")])), HIGH_RISK_DEPLOYER);
        assert_eq!(high_risk_role(&answered(&[("q2a", "yes")])), HIGH_RISK_BOTH);
        assert_eq!(high_risk_role(&AnswerHistory::new()), HIGH_RISK_BOTH);
    }

    #[test]
    fn test_outcome_titles_match_descriptors() {
        let graph = graph().unwrap();
        for o in outcomes() {
            assert_eq!(outcome_title(&o.id), graph.outcome(&o.id).unwrap().title);
        }
        assert_eq!(outcome_title("outcome42"), "Unknown Classification");
    }
}
