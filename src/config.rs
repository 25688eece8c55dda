use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::client::ClientConfig;
use crate::questionnaire::{colorado, QuestionGraph};
use crate::session::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "caia-check")]
#[command(about = "Colorado AI Act applicability check and compliance documentation")]
#[command(version)]
pub struct Cli {
    /// Backend origin
    #[arg(long, env = "CAIA_BASE_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Sent as X-Invite-Token on generation requests
    #[arg(long, env = "CAIA_INVITE_TOKEN")]
    pub invite_token: Option<String>,

    /// Required for outreach commands
    #[arg(long, env = "CAIA_ADMIN_KEY", hide_env_values = true)]
    pub admin_key: Option<String>,

    #[arg(long, env = "CAIA_SESSION_FILE", default_value = ".caia-session.json")]
    pub session_file: PathBuf,

    /// Where exported PDF/HTML files are written
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Questionnaire definition (JSON) to use instead of the built-in one
    #[arg(long)]
    pub graph: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the applicability questionnaire
    Survey,
    /// Fill in the intake form and generate a compliance report
    Wizard {
        /// Pre-fill the form from the backend's demo configuration
        #[arg(long)]
        demo: bool,
    },
    /// Answer documentation questions for the classified outcome
    Docs,
    /// Chat with the compliance assistant
    Chat {
        /// Use the documentation helper instead
        #[arg(long)]
        helper: bool,
    },
    /// Show a stored report
    Share { id: i64 },
    /// Show a publicly shared sample document
    PublicShare { token: String },
    /// Admin outreach tools
    #[command(subcommand)]
    Outreach(Outreach),
    /// Check backend health
    Health,
    /// Render a markdown file to PDF and HTML
    Render { file: PathBuf },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outreach {
    /// Create an invite link (3 uses, 14 days)
    Invite,
    /// Create a sample share link (30 days)
    ShareSample,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.base_url);
        config.invite_token = self.invite_token.clone().filter(|t| !t.is_empty());
        config.admin_key = self.admin_key.clone().filter(|k| !k.is_empty());
        config
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(&self.session_file)
    }

    /// Load and validate the questionnaire. Any configuration error is fatal.
    pub fn question_graph(&self) -> Result<QuestionGraph> {
        match &self.graph {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                QuestionGraph::from_json(&json, colorado::rules())
                    .with_context(|| format!("invalid questionnaire in {}", path.display()))
            }
            None => colorado::graph().context("built-in questionnaire is invalid"),
        }
    }
}
