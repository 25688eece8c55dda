use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use caia_check::cli::{self, Console};
use caia_check::client::ApiClient;
use caia_check::config::{Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging. Control verbosity with RUST_LOG env var:
    //   RUST_LOG=info   caia-check survey   # transitions + requests
    //   RUST_LOG=debug  caia-check survey   # + request payloads
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Cli::parse();
    let client = ApiClient::new(args.client_config());
    let store = args.session_store();
    info!(
        "backend: {}, session file: {}",
        client.config().base_url,
        store.path().display()
    );

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());

    match &args.command {
        Command::Survey => {
            let graph = args.question_graph()?;
            cli::run_survey(&mut console, &graph, &store)
        }
        Command::Wizard { demo } => {
            cli::run_wizard(&mut console, &client, &args.out_dir, *demo).await
        }
        Command::Docs => cli::run_docs(&mut console, &client, &store, &args.out_dir).await,
        Command::Chat { helper } => cli::run_chat(&mut console, &client, &store, *helper).await,
        Command::Share { id } => cli::show_project(&mut console, &client, *id).await,
        Command::PublicShare { token } => {
            cli::show_public_share(&mut console, &client, token).await
        }
        Command::Outreach(action) => cli::run_outreach(&mut console, &client, *action).await,
        Command::Health => cli::show_health(&mut console, &client).await,
        Command::Render { file } => cli::render_file(&mut console, file, &args.out_dir)
            .with_context(|| format!("failed to render {}", file.display())),
    }
}
