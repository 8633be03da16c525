//! Application run modes: logger init, single prompt, interactive loop.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::cli::Args;
use crate::core;
use crate::core::api::{AskSageApi, HttpClient};
use crate::core::config::Config;
use crate::core::credentials::Credentials;
use crate::core::session::{Session, SubmitState};

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const COMMANDS_HINT: &str = "/models, /model <id>, /settings, /quit";

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Quit,
    Models,
    Settings,
    SelectModel(&'a str),
    MissingModelId,
    Unknown(&'a str),
    Prompt(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if !line.starts_with('/') {
        return Command::Prompt(line);
    }
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match name {
        "/quit" | "/exit" => Command::Quit,
        "/models" => Command::Models,
        "/settings" => Command::Settings,
        "/model" if rest.is_empty() => Command::MissingModelId,
        "/model" => Command::SelectModel(rest),
        _ => Command::Unknown(name),
    }
}

/// Initialize env_logger. `RUST_LOG` wins over the -v/-q flags.
pub fn init_logger(args: &Args) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level()),
    )
    .try_init();
}

fn new_session(handle: Handle, config: Config) -> Session {
    let api: Arc<dyn AskSageApi> = Arc::new(HttpClient::new(config));
    let cache = core::cli::model_cache(Arc::clone(&api));
    Session::new(handle, api, cache, core::cli::credential_store())
}

fn wait_while(session: &mut Session, busy: impl Fn(&Session) -> bool) {
    while busy(&*session) {
        session.wait_event(POLL_INTERVAL);
    }
}

/// Load models (unless a model was given) and pick the selection.
fn prepare_models(session: &mut Session, model: Option<&str>) {
    match model {
        Some(m) => session.select_model(m),
        None => {
            session.load_models();
            wait_while(session, Session::is_loading_models);
        }
    }
}

/// Submit one prompt and block this thread until its completion is applied.
fn submit_and_wait(session: &mut Session, prompt: &str) -> Result<String, String> {
    session.submit(prompt).map_err(|e| e.to_string())?;
    wait_while(session, |s| s.submit_state() == SubmitState::Sending);
    match session.submit_state() {
        SubmitState::Succeeded => Ok(session.response_text().to_string()),
        _ => Err(session
            .error_message()
            .unwrap_or("Unable to retrieve completion.")
            .to_string()),
    }
}

fn prompt_once(
    handle: Handle,
    config: Config,
    model: Option<String>,
    prompt: String,
) -> Result<String, String> {
    let mut session = new_session(handle, config);
    if session.needs_settings() {
        return Err("no access token configured. Run `asksage config set` first.".to_string());
    }
    prepare_models(&mut session, model.as_deref());
    if session.selected_model().is_empty() {
        return Err(session
            .error_message()
            .unwrap_or("No models available.")
            .to_string());
    }
    log::info!("using model {}", session.selected_model());
    submit_and_wait(&mut session, &prompt)
}

/// Run single prompt mode: send the prompt, print the response to stdout.
pub async fn run_single_prompt(
    args: &Args,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let prompt_arg = args.prompt.clone().unwrap_or_default();
    let prompt = if prompt_arg == "-" {
        io::read_to_string(io::stdin())?
    } else {
        prompt_arg
    };
    let prompt = prompt.trim().to_string();
    if prompt.is_empty() {
        eprintln!("Error: empty prompt");
        std::process::exit(1);
    }

    let handle = Handle::current();
    let model = args.model.clone();
    let outcome =
        tokio::task::spawn_blocking(move || prompt_once(handle, config, model, prompt)).await?;

    match outcome {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(msg) => {
            eprintln!("Error: {}", msg);
            std::process::exit(1);
        }
    }
}

fn read_line(label: &str) -> io::Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Settings form: ask for account and token on stdin.
fn ask_settings(session: &mut Session) -> io::Result<bool> {
    println!("Settings");
    let Some(account) = read_line("Email: ")? else {
        return Ok(false);
    };
    let Some(token) = read_line("API Key: ")? else {
        return Ok(false);
    };
    if let Err(e) = session.save_settings(&Credentials::new(token, account)) {
        eprintln!("Error: {}", e);
        return Ok(false);
    }
    Ok(true)
}

fn show_models(session: &Session) {
    if session.models().is_empty() {
        println!("No models available.");
        return;
    }
    for id in session.models() {
        let marker = if id == session.selected_model() { "*" } else { " " };
        println!("{} {}", marker, id);
    }
}

fn interactive(handle: Handle, config: Config, model: Option<String>) -> io::Result<()> {
    let mut session = new_session(handle, config);

    if session.needs_settings() {
        if !ask_settings(&mut session)? {
            return Ok(());
        }
        wait_while(&mut session, Session::is_loading_models);
    } else {
        session.load_models();
        wait_while(&mut session, Session::is_loading_models);
    }
    if let Some(m) = model.as_deref() {
        session.select_model(m);
    }
    if let Some(err) = session.error_message() {
        eprintln!("Error: {}", err);
    }
    println!(
        "Model: {}  ({})",
        if session.selected_model().is_empty() {
            "—"
        } else {
            session.selected_model()
        },
        COMMANDS_HINT
    );

    while let Some(line) = read_line("> ")? {
        // Late completions (e.g. a superseded model load) are applied before each command.
        session.poll();
        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Models => show_models(&session),
            Command::Settings => {
                if ask_settings(&mut session)? {
                    wait_while(&mut session, Session::is_loading_models);
                    if let Some(err) = session.error_message() {
                        eprintln!("Error: {}", err);
                    }
                }
            }
            Command::SelectModel(id) => {
                session.select_model(id);
                println!("Model: {}", id);
            }
            Command::MissingModelId => eprintln!("Usage: /model <id>"),
            Command::Unknown(name) => eprintln!("Unknown command: {} ({})", name, COMMANDS_HINT),
            Command::Prompt(prompt) => match submit_and_wait(&mut session, prompt) {
                Ok(text) => println!("{}\n", text),
                Err(msg) => eprintln!("Error: {}", msg),
            },
        }
    }
    Ok(())
}

/// Launch the interactive loop in a blocking thread. Returns on panic or IO error.
pub async fn run_interactive(
    args: &Args,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = Handle::current();
    let model = args.model.clone();
    let join_result: Result<io::Result<()>, tokio::task::JoinError> =
        tokio::task::spawn_blocking(move || interactive(handle, config, model)).await;

    match join_result {
        Ok(io_result) => io_result?,
        Err(join_err) => {
            if let Ok(panic) = join_err.try_into_panic() {
                let msg = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    format!("{:?}", panic)
                };
                eprintln!("Interactive loop panic: {}", msg);
            }
            return Err(
                Box::new(io::Error::other("interactive thread panicked")) as Box<dyn std::error::Error>
            );
        }
    }
    Ok(())
}
