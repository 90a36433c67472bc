mod present;

use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use autowise_contracts::chat::{parse_command, Command as LineCommand, CHAT_HELP_COMMANDS};
use autowise_contracts::events::EventWriter;
use autowise_contracts::i18n::Language;
use autowise_contracts::request::{EngineType, ImageAttachment, Mode, VehicleType};
use autowise_contracts::results::StructuredResult;
use autowise_engine::photo::{load_attachment, DEFAULT_MAX_DIM};
use autowise_engine::{
    AssistError, AssistantEngine, CompletionClient, GeminiClient, QueryForm, ScriptedClient,
    Session, Settings,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use crate::present::{render_history, render_result, render_transcript};

#[derive(Debug, Parser)]
#[command(
    name = "autowise",
    version,
    about = "Automotive diagnosis and tuning assistant backed by Gemini"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
    /// Gemini model name (overrides GEMINI_MODEL).
    #[arg(long, global = true)]
    model: Option<String>,
    /// API base URL (overrides GEMINI_API_BASE).
    #[arg(long, global = true)]
    api_base: Option<String>,
    /// TOML secrets file holding GOOGLE_API_KEY.
    #[arg(long, global = true)]
    secrets: Option<PathBuf>,
    /// Append session events to this JSONL file.
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    /// Replay canned replies (separated by `---` lines) instead of calling the API.
    #[arg(long, global = true)]
    replay: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Diagnose a mechanical problem.
    Diagnose(AnalyzeArgs),
    /// Plan a tuning or modification build.
    Tune(AnalyzeArgs),
    /// Freeform chat with the assistant.
    Chat(ChatArgs),
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    description: Option<String>,
    #[arg(long, default_value = "car")]
    vehicle: VehicleType,
    #[arg(long, default_value = "petrol")]
    engine: EngineType,
    #[arg(long, default_value = "pl")]
    lang: Language,
    #[arg(long)]
    image: Option<PathBuf>,
    /// Keep reading refinements and commands from stdin.
    #[arg(long, short = 'i')]
    interactive: bool,
    /// Print results as JSON instead of formatted text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[arg(long, default_value = "pl")]
    lang: Language,
    #[arg(long)]
    image: Option<PathBuf>,
}

const EXIT_NO_RESULT: i32 = 2;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("autowise error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let client = build_client(&cli)?;
    let events = cli
        .events
        .as_ref()
        .map(|path| EventWriter::new(path, Uuid::new_v4().to_string()));
    match cli.command {
        CliCommand::Diagnose(args) => run_analysis(client, events, Mode::Diagnosis, args),
        CliCommand::Tune(args) => run_analysis(client, events, Mode::Tuning, args),
        CliCommand::Chat(args) => {
            run_chat(client, events, args)?;
            Ok(0)
        }
    }
}

fn build_client(cli: &Cli) -> Result<Arc<dyn CompletionClient>> {
    if let Some(path) = cli.replay.as_deref() {
        let client = ScriptedClient::from_replay_file(path)
            .with_context(|| format!("failed to read replay file {}", path.display()))?;
        return Ok(Arc::new(client));
    }

    let mut settings = Settings::load(cli.secrets.as_deref())?;
    if let Some(model) = non_empty(cli.model.as_deref()) {
        settings.model = model.to_string();
    }
    if let Some(api_base) = non_empty(cli.api_base.as_deref()) {
        settings.api_base = api_base.to_string();
    }
    Ok(Arc::new(GeminiClient::new(&settings)?))
}

fn run_analysis(
    client: Arc<dyn CompletionClient>,
    events: Option<EventWriter>,
    mode: Mode,
    args: AnalyzeArgs,
) -> Result<i32> {
    let image = args
        .image
        .as_deref()
        .map(load_image)
        .transpose()?;
    let form = QueryForm {
        mode,
        vehicle: args.vehicle,
        engine: args.engine,
        language: args.lang,
        image,
    };
    let mut engine = AssistantEngine::new(client, form.clone(), events)?;

    let description = args.description.unwrap_or_default();
    let mut code = 0;
    if !description.trim().is_empty() || form.image.is_some() {
        let language = form.language;
        let spinner = start_spinner(language.labels().analyzing);
        let outcome = engine.analyze(form, &description);
        spinner.finish_and_clear();
        let stored = show_outcome(outcome, language, args.json)?;
        warn_event_log(&mut engine);
        if !stored {
            code = EXIT_NO_RESULT;
        }
    } else if !args.interactive {
        eprintln!("{}", form.language.labels().empty_input);
        return Ok(1);
    }

    if args.interactive {
        analysis_loop(&mut engine, args.json)?;
        return Ok(0);
    }
    Ok(code)
}

fn analysis_loop(engine: &mut AssistantEngine, json: bool) -> Result<()> {
    println!("AutoWise ready. Type /help for commands.");
    let mut line = String::new();
    loop {
        let prompt = loop_prompt(engine.session());
        if !next_line(&prompt, &mut line)? {
            break;
        }

        match parse_command(&line) {
            LineCommand::Noop => continue,
            LineCommand::Quit => break,
            LineCommand::Help => println!("Commands: {}", CHAT_HELP_COMMANDS.join(" ")),
            LineCommand::Show => match engine.session().result() {
                Some(result) => {
                    let language = engine.session().form().language;
                    print_result(result, language, json)?;
                }
                None => println!("No result yet."),
            },
            LineCommand::History => print!("{}", render_history(engine.session().history())),
            LineCommand::Transcript => {
                print!("{}", render_transcript(engine.session().transcript()))
            }
            LineCommand::Text(text) => {
                if refinable(engine.session()) {
                    refine(engine, &text, json)?;
                } else {
                    new_query(engine, &text, json)?;
                }
            }
            LineCommand::NewQuery(text) => {
                new_query(engine, &text, json)?;
            }
            LineCommand::Refine(text) => {
                refine(engine, &text, json)?;
            }
            other => apply_form_command(engine, other),
        }
    }
    Ok(())
}

fn new_query(engine: &mut AssistantEngine, text: &str, json: bool) -> Result<bool> {
    let form = engine.session().form().clone();
    let language = form.language;
    let spinner = start_spinner(language.labels().analyzing);
    let outcome = engine.analyze(form, text);
    spinner.finish_and_clear();
    let stored = show_outcome(outcome, language, json);
    warn_event_log(engine);
    stored
}

fn refine(engine: &mut AssistantEngine, text: &str, json: bool) -> Result<bool> {
    let language = engine.session().form().language;
    let spinner = start_spinner(language.labels().analyzing);
    let outcome = engine.refine(text);
    spinner.finish_and_clear();
    let stored = show_outcome(outcome, language, json);
    warn_event_log(engine);
    stored
}

/// Plain text refines the stored result unless it was an off-topic refusal.
fn refinable(session: &Session) -> bool {
    session
        .result()
        .is_some_and(|result| !result.is_off_topic())
}

fn loop_prompt(session: &Session) -> String {
    if refinable(session) {
        format!("{}> ", session.form().language.labels().refine_prompt)
    } else {
        format!("{}> ", session.form().mode)
    }
}

fn warn_event_log(engine: &mut AssistantEngine) {
    if let Some(err) = engine.take_event_error() {
        eprintln!("warning: {err}");
    }
}

/// Prints a result or a recoverable error. Returns whether a result was stored.
fn show_outcome(
    outcome: Result<&StructuredResult, AssistError>,
    language: Language,
    json: bool,
) -> Result<bool> {
    match outcome {
        Ok(result) => {
            print_result(result, language, json)?;
            Ok(true)
        }
        Err(err) if err.is_fatal() => Err(err.into()),
        Err(AssistError::EmptyInput) => {
            eprintln!("{}", language.labels().empty_input);
            Ok(false)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            Ok(false)
        }
    }
}

fn print_result(result: &StructuredResult, language: Language, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print!("{}", render_result(result, language));
    }
    Ok(())
}

fn run_chat(
    client: Arc<dyn CompletionClient>,
    events: Option<EventWriter>,
    args: ChatArgs,
) -> Result<()> {
    let image = args
        .image
        .as_deref()
        .map(load_image)
        .transpose()?;
    let form = QueryForm {
        language: args.lang,
        image,
        ..QueryForm::default()
    };
    let mut engine = AssistantEngine::new(client, form, events)?;

    println!("AutoWise chat started. Type /help for commands.");
    let mut line = String::new();
    loop {
        if !next_line("you> ", &mut line)? {
            break;
        }

        match parse_command(&line) {
            LineCommand::Noop => continue,
            LineCommand::Quit => break,
            LineCommand::Help => println!(
                "Commands: /lang <pl|en|de> /image <path> /noimage /transcript /help /quit"
            ),
            LineCommand::Transcript => {
                print!("{}", render_transcript(engine.session().transcript()))
            }
            LineCommand::Text(text) => chat_turn(&mut engine, &text)?,
            command @ (LineCommand::ClearImage
            | LineCommand::SetLanguage(_)
            | LineCommand::SetImage(_)
            | LineCommand::Invalid { .. }
            | LineCommand::Unknown { .. }) => apply_form_command(&mut engine, command),
            _ => println!("That command is only available in diagnose/tune sessions."),
        }
    }
    Ok(())
}

fn chat_turn(engine: &mut AssistantEngine, text: &str) -> Result<()> {
    let language = engine.session().form().language;
    let image = engine.session().form().image.clone();
    let spinner = start_spinner(language.labels().analyzing);
    let outcome = engine
        .chat(text, image.as_ref(), language)
        .map(|turn| turn.text.clone());
    spinner.finish_and_clear();
    warn_event_log(engine);

    match outcome {
        Ok(reply) => {
            println!("autowise> {reply}");
            // A photo goes out with one message only.
            engine.form_mut().image = None;
            Ok(())
        }
        Err(err) if err.is_fatal() => Err(err.into()),
        Err(AssistError::EmptyInput) => {
            eprintln!("{}", language.labels().empty_input);
            Ok(())
        }
        Err(err) => {
            eprintln!("Error: {err}");
            Ok(())
        }
    }
}

fn apply_form_command(engine: &mut AssistantEngine, command: LineCommand) {
    match command {
        LineCommand::ClearImage => {
            engine.form_mut().image = None;
            println!("Image cleared");
        }
        LineCommand::SetMode(mode) => {
            engine.form_mut().mode = mode;
            println!("Mode set to {mode}");
        }
        LineCommand::SetLanguage(language) => {
            engine.form_mut().language = language;
            println!("Language set to {language}");
        }
        LineCommand::SetVehicle(vehicle) => {
            engine.form_mut().vehicle = vehicle;
            println!("Vehicle set to {vehicle}");
        }
        LineCommand::SetEngine(engine_type) => {
            engine.form_mut().engine = engine_type;
            println!("Engine set to {engine_type}");
        }
        LineCommand::SetImage(path) => match load_image(Path::new(&path)) {
            Ok(image) => {
                println!("Image attached: {}", image.label);
                engine.form_mut().image = Some(image);
            }
            Err(err) => println!("Image rejected: {err:#}"),
        },
        LineCommand::Invalid { command, reason } => println!("/{command}: {reason}"),
        LineCommand::Unknown { command, .. } => {
            println!("Unknown command /{command}. Type /help for commands.")
        }
        _ => {}
    }
}

fn load_image(path: &Path) -> Result<ImageAttachment> {
    load_attachment(path, DEFAULT_MAX_DIM)
        .with_context(|| format!("failed to load image {}", path.display()))
}

/// Reads one line into `line`; returns false at end of input.
fn next_line(prompt: &str, line: &mut String) -> Result<bool> {
    let stdin = io::stdin();
    loop {
        print!("{prompt}");
        io::stdout().flush()?;
        line.clear();
        match stdin.read_line(line) {
            Ok(0) => return Ok(false),
            Ok(_) => {
                let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed_len);
                return Ok(true);
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

fn start_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style.tick_chars("-\\|/ "));
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
