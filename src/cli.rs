//! Terminal front end for every subcommand.

use std::fmt::Display;
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::chat::{context_for, ChatMessage, Chatbot};
use crate::client::{ApiClient, Assistant, ClientError, InviteRequest, MetadataFile, ShareSampleRequest};
use crate::config::Outreach;
use crate::documentation::{DocsError, DocumentationWorkflow, DraftMode};
use crate::questionnaire::{Outcome, QuestionGraph, Survey};
use crate::report::pdf::{blocks, Block};
use crate::report::{self, PdfExporter};
use crate::session::SessionStore;
use crate::wizard::{Wizard, RESULT_STEP};

const RULE: &str = "========================================";

// ---------------------------------------------------------------------------
// Console I/O
// ---------------------------------------------------------------------------

/// Line-oriented prompt/response over any reader and writer.
pub struct Console<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn say(&mut self, text: impl Display) -> Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    /// Print `label` and read one trimmed line. `None` on end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{label}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Like `prompt`, but an empty answer keeps `current`.
    fn prompt_field(&mut self, label: &str, current: &str) -> Result<Option<String>> {
        let shown = if current.is_empty() {
            format!("{label}: ")
        } else {
            format!("{label} [{current}]: ")
        };
        Ok(self.prompt(&shown)?.map(|v| {
            if v.is_empty() {
                current.to_string()
            } else {
                v
            }
        }))
    }

    /// Read lines until a lone `.` or end of input.
    fn read_block(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 || line.trim_end() == "." {
                break;
            }
            text.push_str(&line);
        }
        Ok(text)
    }

    fn banner(&mut self, title: &str) -> Result<()> {
        self.say(format!("\n{RULE}\n   {title}\n{RULE}"))
    }

    /// Markdown flattened for the terminal.
    fn markdown(&mut self, md: &str) -> Result<()> {
        for block in blocks(md) {
            match block {
                Block::Heading(1, t) => self.say(format!("\n{}\n{}", t, "=".repeat(t.chars().count())))?,
                Block::Heading(_, t) => self.say(format!("\n{t}"))?,
                Block::Paragraph(t) => self.say(format!("{t}\n"))?,
                Block::Item(depth, t) => self.say(format!("{}- {t}", "  ".repeat(depth)))?,
                Block::Quote(t) => self.say(format!("  | {t}"))?,
                Block::Code(lines) => {
                    for l in lines {
                        self.say(format!("    {l}"))?;
                    }
                }
                Block::Row(cells) => self.say(cells.join(" | "))?,
                Block::Rule => self.say("----")?,
            }
        }
        Ok(())
    }
}

fn is_quit(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "q" | "quit" | "exit")
}

/// Read the post-round choice. Returns `true` to restart, `false` to quit.
fn prompt_restart<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<bool> {
    loop {
        let Some(input) = console.prompt("> ")? else {
            return Ok(false);
        };
        match input.to_lowercase().as_str() {
            "r" => return Ok(true),
            "q" => return Ok(false),
            _ => console.say("  Press [r] to restart or [q] to quit.")?,
        }
    }
}

// ---------------------------------------------------------------------------
// Questionnaire
// ---------------------------------------------------------------------------

/// How a questionnaire round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Finished { outcome_id: String },
    Quit,
}

fn play_round<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    survey: &mut Survey<'_>,
    store: &SessionStore,
) -> Result<RoundOutcome> {
    let total_steps = survey.graph().total_steps();

    loop {
        if let Some(outcome) = survey.outcome() {
            return Ok(RoundOutcome::Finished {
                outcome_id: outcome.id.clone(),
            });
        }
        let node = survey.current_question()?;

        console.say(format!(
            "\nQuestion {} of up to {}",
            survey.step_number(),
            total_steps
        ))?;
        console.say(&node.prompt)?;
        for (i, option) in node.options.iter().enumerate() {
            console.say(format!("  [{}] {}", i + 1, option.label))?;
        }
        if survey.can_go_back() {
            console.say("  [b] Back    [q] Quit")?;
        } else {
            console.say("  [q] Quit")?;
        }

        let Some(input) = console.prompt("> ")? else {
            return Ok(RoundOutcome::Quit);
        };
        if is_quit(&input) {
            return Ok(RoundOutcome::Quit);
        }
        if input.eq_ignore_ascii_case("b") {
            if survey.can_go_back() {
                survey.back()?;
                save_progress(store, survey)?;
            } else {
                console.say("(Already at the first question.)")?;
            }
            continue;
        }

        let choice = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| node.options.get(i));
        match choice {
            Some(option) => {
                info!("User input: \"{}\" -> {}", input, option.value);
                survey.select(&option.value)?;
                save_progress(store, survey)?;
            }
            None => console.say("(Choose one of the listed options.)")?,
        }
    }
}

fn save_progress(store: &SessionStore, survey: &Survey<'_>) -> Result<()> {
    let history = survey.history().clone();
    let risk_level = survey.outcome().map(|o| o.id.clone());
    store.update(|s| {
        s.survey_results = history;
        s.risk_level = risk_level;
    })?;
    Ok(())
}

fn show_outcome<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    outcome: Option<&Outcome>,
) -> Result<()> {
    match outcome {
        Some(o) => {
            console.banner(&o.title)?;
            console.say(format!("  {}\n", o.description))?;
            console.say(format!("  {}\n", o.details))?;
            console.say(format!("  Why: {}", o.reason))?;
            console.say(RULE)?;
            console.say("  Next: `caia-check docs` to prepare documentation.")?;
        }
        None => {
            console.say(format!("\n{RULE}"))?;
            console.say("  You left the questionnaire. Your answers are saved.")?;
        }
    }
    console.say(format!("{RULE}\n"))?;
    console.say("  [r] Restart    [q] Quit\n")
}

/// Run questionnaire rounds until the user quits. Saved answers are resumed.
pub fn run_survey<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    graph: &QuestionGraph,
    store: &SessionStore,
) -> Result<()> {
    let saved = store.load()?;
    let mut survey = if saved.survey_results.is_empty() {
        Survey::new(graph)
    } else {
        match Survey::replay(graph, &saved.survey_results) {
            Ok(s) => {
                info!("Resumed questionnaire with {} answer(s)", s.history().len());
                s
            }
            Err(e) => {
                warn!("Saved answers do not fit this questionnaire ({e}); starting over");
                store.clear()?;
                Survey::new(graph)
            }
        }
    };

    loop {
        console.banner("COLORADO AI ACT APPLICABILITY CHECK")?;
        console.say("Answer by number. Your progress is saved as you go.")?;

        let round = play_round(console, &mut survey, store)?;
        show_outcome(console, survey.outcome())?;
        if let RoundOutcome::Finished { outcome_id } = &round {
            info!("Questionnaire result: {outcome_id}");
        }

        if !prompt_restart(console)? {
            console.say("Goodbye!")?;
            break;
        }

        info!("User chose to restart");
        survey.restart();
        store.clear()?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Intake wizard
// ---------------------------------------------------------------------------

pub async fn run_wizard<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ApiClient,
    out_dir: &Path,
    demo: bool,
) -> Result<()> {
    let mut wizard = Wizard::new();
    if demo {
        match wizard.load_demo(client).await {
            Ok(()) => console.say("(Form pre-filled with demo data.)")?,
            Err(e) => console.say(format!("(Could not load demo data: {e})"))?,
        }
    }

    loop {
        console.say(format!("\n{}", wizard.step_label()))?;
        let keep_going = match wizard.step() {
            0 => general_step(console, &mut wizard)?,
            1 => model_meta_step(console, &mut wizard)?,
            2 => risk_step(console, &mut wizard)?,
            _ => result_step(console, &mut wizard, client, out_dir).await?,
        };
        if !keep_going {
            return Ok(());
        }
    }
}

fn general_step<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    wizard: &mut Wizard,
) -> Result<bool> {
    let form = &mut wizard.form;
    let fields: [(&str, &mut String); 3] = [
        ("AI System Name", &mut form.system_name),
        ("Intended Purpose", &mut form.intended_purpose),
        ("Use-Case Category", &mut form.use_case),
    ];
    for (label, value) in fields {
        let Some(v) = console.prompt_field(label, value)? else {
            return Ok(false);
        };
        *value = v;
    }
    let current = if form.ephemeral { "y" } else { "n" };
    let Some(v) = console.prompt_field("Don't store this run (ephemeral) y/n", current)? else {
        return Ok(false);
    };
    form.ephemeral = v.eq_ignore_ascii_case("y");

    if let Err(e) = wizard.next() {
        console.say(format!("(Please fill in: {})", e.fields().join(", ")))?;
    }
    Ok(true)
}

fn model_meta_step<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    wizard: &mut Wizard,
) -> Result<bool> {
    let current = wizard
        .file
        .as_ref()
        .map(|f| f.file_name.clone())
        .unwrap_or_default();
    let Some(path) = console.prompt_field("Model metadata file (.json/.yaml, '-' for none)", &current)? else {
        return Ok(false);
    };
    if path == "-" {
        wizard.file = None;
    } else if !path.is_empty() && path != current {
        match read_metadata(Path::new(&path)) {
            Ok(file) => wizard.file = Some(file),
            Err(e) => {
                console.say(format!("({e})"))?;
                return Ok(true);
            }
        }
    }

    let notes = wizard.form.free_text_notes.clone();
    let Some(v) = console.prompt_field("Free-text Notes (Optional)", &notes)? else {
        return Ok(false);
    };
    wizard.form.free_text_notes = v;
    step_or_back(console, wizard)
}

fn read_metadata(path: &Path) -> Result<MetadataFile> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(MetadataFile::new(name, bytes)?)
}

fn risk_step<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    wizard: &mut Wizard,
) -> Result<bool> {
    let notes = wizard.form.risk_notes.clone();
    let Some(v) = console.prompt_field("Known / Suspected Risks", &notes)? else {
        return Ok(false);
    };
    wizard.form.risk_notes = v;
    step_or_back(console, wizard)
}

fn step_or_back<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    wizard: &mut Wizard,
) -> Result<bool> {
    let Some(input) = console.prompt("[enter] Next    [b] Back    [q] Quit > ")? else {
        return Ok(false);
    };
    match input.to_lowercase().as_str() {
        "b" => {
            wizard.back();
        }
        "q" => return Ok(false),
        _ => {
            wizard.next()?;
        }
    }
    Ok(true)
}

async fn result_step<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    wizard: &mut Wizard,
    client: &ApiClient,
    out_dir: &Path,
) -> Result<bool> {
    debug_assert_eq!(wizard.step(), RESULT_STEP);
    if wizard.view.report.is_none() && wizard.view.error.is_none() {
        console.say("(Generating report...)")?;
        wizard.generate(client).await;
    }
    show_report(console, wizard, client)?;

    let Some(input) = console.prompt("[p] Export PDF    [g] Regenerate    [b] Back    [q] Quit > ")? else {
        return Ok(false);
    };
    match input.to_lowercase().as_str() {
        "p" => match wizard.view.full_markdown() {
            Some(md) => {
                let stem = report::file_stem(&wizard.form.system_name);
                export(console, out_dir, &stem, &wizard.form.system_name, &md)?;
            }
            None => console.say("(Nothing to export yet.)")?,
        },
        "g" => {
            console.say("(Generating report...)")?;
            wizard.generate(client).await;
        }
        "b" => {
            wizard.back();
        }
        "q" => return Ok(false),
        _ => {}
    }
    Ok(true)
}

fn show_report<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    wizard: &Wizard,
    client: &ApiClient,
) -> Result<()> {
    if let Some(md) = wizard.view.full_markdown() {
        console.markdown(&md)?;
    }
    if let Some(c) = &wizard.view.completeness {
        console.say(format!(
            "Completeness: {}% ({} of {} sections)",
            c.percent, c.complete, c.total
        ))?;
        for s in c.sections.iter().filter(|s| !s.good) {
            let state = if s.present { "thin" } else { "missing" };
            console.say(format!("  - {} ({state})", s.title))?;
        }
    }
    if let Some(tokens) = wizard.view.token_info() {
        console.say(tokens)?;
    }
    if let Some(link) = wizard.share_link(client) {
        console.say(format!("Share link: {link}"))?;
    }
    if let Some(e) = &wizard.view.error {
        console.say(format!("\n{e}"))?;
    }
    Ok(())
}

fn export<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    out_dir: &Path,
    stem: &str,
    title: &str,
    markdown: &str,
) -> Result<()> {
    match report::export(&PdfExporter::default(), out_dir, stem, title, markdown) {
        Ok(out) => console.say(format!(
            "Saved {} ({} page(s)) and {}",
            out.pdf.display(),
            out.pages,
            out.html.display()
        )),
        Err(e) => console.say(format!("(Failed to generate PDF: {e})")),
    }
}

// ---------------------------------------------------------------------------
// Documentation workflow
// ---------------------------------------------------------------------------

pub async fn run_docs<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ApiClient,
    store: &SessionStore,
    out_dir: &Path,
) -> Result<()> {
    let mut wf = match DocumentationWorkflow::from_session(&store.load()?) {
        Ok(wf) => wf,
        Err(e @ DocsError::NoOutcome) | Err(e @ DocsError::UnknownOutcome(_)) => {
            console.say(format!("({e}: run `caia-check survey`)"))?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let docs = *wf.docs();
    console.banner(docs.title)?;
    if let Some(msg) = docs.message {
        console.say(msg)?;
    }
    if let Some(note) = docs.additional_note {
        console.say(format!("Note: {note}"))?;
    }

    if docs.has_questions() && !answer_questions(console, &mut wf, store)? {
        return Ok(());
    }

    loop {
        console.say("(Generating documentation...)")?;
        match wf.generate(client).await {
            Ok(()) => break,
            Err(e) => {
                warn!("{e}");
                console.say(format!("{e}. Please try again."))?;
                let Some(input) = console.prompt("[enter] Retry    [q] Quit > ")? else {
                    return Ok(());
                };
                if is_quit(&input) {
                    return Ok(());
                }
            }
        }
    }
    wf.persist(store)?;
    documentation_result(console, wf, client, store, out_dir).await
}

/// Returns `false` if the user quit.
fn answer_questions<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    wf: &mut DocumentationWorkflow,
    store: &SessionStore,
) -> Result<bool> {
    loop {
        let Some(q) = wf.current_question() else {
            return Ok(true);
        };
        console.say(format!("\n{}\n{}", wf.step_label(), q.text))?;
        if let Some(note) = q.note {
            console.say(format!("Note: {note}"))?;
        }
        if let Some(a) = wf.answers.get(q.id) {
            console.say(format!("Current answer: {a}"))?;
        }
        console.say("(Type your answer, [n] next, [b] back, [g] generate, [q] quit)")?;

        let Some(input) = console.prompt("> ")? else {
            return Ok(false);
        };
        match input.to_lowercase().as_str() {
            "q" => return Ok(false),
            "g" => return Ok(true),
            "b" => wf.back(),
            "n" | "" => {
                if wf.is_last_question() {
                    return Ok(true);
                }
                wf.next();
            }
            _ => {
                wf.answer(input);
                wf.persist(store)?;
                if wf.is_last_question() {
                    return Ok(true);
                }
                wf.next();
            }
        }
    }
}

async fn documentation_result<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    mut wf: DocumentationWorkflow,
    client: &ApiClient,
    store: &SessionStore,
    out_dir: &Path,
) -> Result<()> {
    loop {
        if let Some(draft) = &wf.draft {
            match draft.mode {
                DraftMode::Edit => console.say(format!("\n{}", draft.markdown))?,
                DraftMode::Preview => console.markdown(&draft.markdown)?,
            }
        }
        if !wf.checklist_items.is_empty() {
            console.say("\nChecklist:")?;
            for (i, item) in wf.checklist_items.iter().enumerate() {
                let mark = if wf.is_checked(i) { "x" } else { " " };
                console.say(format!("  {}. [{mark}] {item}", i + 1))?;
            }
        }

        let Some(input) = console.prompt(
            "[e] Edit  [v] Preview  [c N] Toggle item  [p] Export PDF  [a] Ask assistant  [s] Start over  [q] Quit > ",
        )?
        else {
            return Ok(());
        };
        let mut parts = input.split_whitespace();
        match parts.next().unwrap_or_default().to_lowercase().as_str() {
            "e" => {
                console.say("(Enter the new markdown; finish with a line containing only '.')")?;
                let text = console.read_block()?;
                wf.edit(text);
                wf.set_mode(DraftMode::Edit);
            }
            "v" => wf.set_mode(DraftMode::Preview),
            "c" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(n) if n >= 1 && n <= wf.checklist_items.len() => {
                    wf.toggle(n - 1);
                    wf.persist(store)?;
                }
                _ => console.say("(Usage: c <item number>)")?,
            },
            "p" => {
                if let Some(draft) = &wf.draft {
                    let stem = report::documentation_file_stem(wf.outcome());
                    let title = wf.docs().title;
                    export(console, out_dir, &stem, title, &draft.markdown)?;
                }
            }
            "a" => {
                let context = context_for(Some(wf.outcome()), wf.answers.clone());
                let mut bot = Chatbot::new(Assistant::Compliance, context);
                chat_loop(console, &mut bot, client).await?;
            }
            "s" => {
                wf.start_over(store)?;
                console.say("Session cleared. Run `caia-check survey` to begin again.")?;
                return Ok(());
            }
            "q" => return Ok(()),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

fn print_message<R: BufRead, W: Write>(console: &mut Console<R, W>, m: &ChatMessage) -> Result<()> {
    console.say(format!("\n{m}"))?;
    for c in &m.citations {
        console.say(format!("    [{}] {} \u{2014} {}", c.key, c.title, c.source))?;
    }
    Ok(())
}

async fn chat_loop<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    bot: &mut Chatbot,
    client: &ApiClient,
) -> Result<()> {
    for m in bot.messages().to_vec() {
        print_message(console, &m)?;
    }
    loop {
        console.say("\nSuggested:")?;
        for (i, s) in bot.suggestions().to_vec().iter().enumerate() {
            console.say(format!("  [{}] {s}", i + 1))?;
        }
        let Some(input) = console.prompt("\n[You]: ")? else {
            return Ok(());
        };
        if is_quit(&input) {
            return Ok(());
        }
        let reply = match input.parse::<usize>() {
            Ok(n) if n >= 1 && n <= bot.suggestions().len() => {
                bot.send_suggestion(client, n - 1).await.cloned()
            }
            _ => bot.send(client, &input).await.cloned(),
        };
        match reply {
            Some(m) => print_message(console, &m)?,
            None => console.say("(Please say something.)")?,
        }
    }
}

pub async fn run_chat<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ApiClient,
    store: &SessionStore,
    helper: bool,
) -> Result<()> {
    let state = store.load()?;
    let assistant = if helper {
        Assistant::DocumentationHelper
    } else {
        Assistant::Compliance
    };
    let context = context_for(state.risk_level.as_deref(), state.documentation_answers);
    let mut bot = Chatbot::new(assistant, context);
    console.banner("AI COMPLIANCE ASSISTANT")?;
    chat_loop(console, &mut bot, client).await
}

// ---------------------------------------------------------------------------
// One-shot commands
// ---------------------------------------------------------------------------

pub async fn show_project<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ApiClient,
    id: i64,
) -> Result<()> {
    let project = client.project(id).await.context("failed to load report")?;
    console.banner(&project.system_name)?;
    console.say(format!("Created: {}", project.created_at))?;
    console.say(format!("Intended purpose: {}", project.intended_purpose))?;
    console.say(format!("Use case: {}", project.use_case))?;
    console.markdown(&project.report)?;
    console.markdown(&report::sources_markdown(&project.sources))
}

pub async fn show_public_share<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ApiClient,
    token: &str,
) -> Result<()> {
    let share = client
        .public_share(token)
        .await
        .context("failed to load shared document")?;
    let doc = &share.doc;
    console.banner(&share.title)?;
    let fields: Vec<(&str, &str)> = [
        ("Model", doc.model_name.as_str()),
        ("Version", doc.version.as_str()),
        ("Generated", doc.generated_at.as_str()),
        ("Intended purpose", doc.intended_purpose.as_str()),
        ("Deployment context", doc.deployment_context.as_str()),
        ("Data sources", doc.data_sources.as_str()),
        ("Risk management", doc.risk_management.as_str()),
        ("Human oversight", doc.human_oversight.as_str()),
        ("Performance metrics", doc.performance_metrics.as_str()),
        ("Post-deployment monitoring", doc.post_deployment_monitoring.as_str()),
    ]
    .into_iter()
    .filter(|(_, v)| !v.is_empty())
    .collect();
    for (k, v) in fields {
        console.say(format!("{k}: {v}"))?;
    }
    if let Some(c) = doc.completeness {
        console.say(format!("Completeness: {c}%"))?;
    }
    for e in &doc.evidence {
        console.say(format!("  - [{}] {} ({})", e.kind, e.name, e.id))?;
    }
    Ok(())
}

pub async fn run_outreach<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ApiClient,
    action: Outreach,
) -> Result<()> {
    let result = match action {
        Outreach::Invite => client
            .create_invite(&InviteRequest::default())
            .await
            .map(|r| format!("Invite link: {}", r.invite_url)),
        Outreach::ShareSample => client
            .create_share_sample(&ShareSampleRequest::default())
            .await
            .map(|r| format!("Share link: {}", r.share_url)),
    };
    match result {
        Ok(line) => console.say(line),
        Err(ClientError::MissingAdminKey) => {
            console.say("(Set --admin-key or CAIA_ADMIN_KEY to use outreach tools.)")
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn show_health<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ApiClient,
) -> Result<()> {
    let health = client.health().await.context("backend unreachable")?;
    console.say(format!(
        "ok: {}  demo: {}  openai key: {}",
        health.ok, health.demo, health.has_openai_key
    ))
}

pub fn render_file<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    file: &Path,
    out_dir: &Path,
) -> Result<()> {
    let markdown = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = report::file_stem(&name);
    export(console, out_dir, &stem, &name, &markdown)
}
