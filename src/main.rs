use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use intent_apparatus::config::{self, Config};
use intent_apparatus::engine::{InputBackend, MockBackend};
use intent_apparatus::intent::{IntentParser, format_examples};
use intent_apparatus::session::{Session, cleanup_old_sessions, list_sessions};
use intent_apparatus::{Apparatus, Submission};

#[cfg(feature = "native")]
use intent_apparatus::engine::NativeBackend;

/// Intent Apparatus - natural-language desktop automation
#[derive(Parser, Debug)]
#[command(
    name = "intent-apparatus",
    about = "Turn short natural-language commands into mouse, keyboard and screenshot actions",
    after_help = "ENVIRONMENT VARIABLES:\n\
        INTENT_APPARATUS_SCREENSHOT_AFTER_ACTION  Screenshot after mutating actions\n\
        INTENT_APPARATUS_SCROLL_COUNT             Default scroll notches\n\
        INTENT_APPARATUS_FAILSAFE                 Corner failsafe (true/false)\n\
        INTENT_APPARATUS_PAUSE_MS                 Pause after each input (ms)\n\
        INTENT_APPARATUS_SESSION_DIR              Base directory for sessions\n\
        INTENT_APPARATUS_MOCK_SCREEN              Mock screen size (WxH)\n\
        INTENT_APPARATUS_HISTORY_CAPACITY         History bound (0 = unbounded)\n\
        RUST_LOG                                  Log filter (overrides -v)"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use the in-memory mock backend instead of the real desktop
    #[arg(long, global = true)]
    mock: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Capture a screenshot after every successful mutating action
    #[arg(long, global = true)]
    screenshot_after_action: bool,

    /// Disable the screen-corner failsafe
    #[arg(long, global = true)]
    no_failsafe: bool,

    /// Scroll notches when a command omits the count
    #[arg(long, global = true, env = "INTENT_APPARATUS_SCROLL_COUNT")]
    scroll_count: Option<u32>,

    /// Pause after each input primitive (ms)
    #[arg(long, global = true, env = "INTENT_APPARATUS_PAUSE_MS")]
    pause_ms: Option<u64>,

    /// Output directory for screenshots (default: auto-generated in session dir)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Keep screenshots after completion (default: cleanup unless --output is specified)
    #[arg(long, short = 'k', global = true)]
    keep: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interpret and execute one command
    Run {
        /// Command text, e.g. click at 100, 200
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Interpret a command without executing it
    Parse {
        /// Command text, e.g. press ctrl+c
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Read commands from stdin, one per line
    Repl,

    /// List example commands
    Examples,

    /// Show the screen size reported by the backend
    Screen,

    /// List kept screenshot sessions, optionally pruning old ones first
    Sessions {
        /// Remove sessions last modified more than this many hours ago
        #[arg(long)]
        prune_hours: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    });

    let config = apply_overrides(config::get().clone(), &args);

    match &args.command {
        Some(Commands::Run { text }) => {
            let text = text.join(" ");
            let (mut apparatus, session) = build_apparatus(&args, &config, "run")?;

            let submission = apparatus.submit(&text);
            print_submission(&submission, args.json)?;
            let success = submission.result.success;

            finish_session(session, &args, submission.result.screenshot.is_some());
            if !success {
                std::process::exit(1);
            }
        }

        Some(Commands::Parse { text }) => {
            let parser = IntentParser::new().with_default_scroll_count(config.automation.default_scroll_count);
            let action = parser.interpret(&text.join(" "));
            if args.json {
                println!("{}", serde_json::to_string_pretty(&action)?);
            } else {
                println!("{}", action);
            }
        }

        Some(Commands::Repl) => {
            let (mut apparatus, session) = build_apparatus(&args, &config, "repl")?;
            repl(&mut apparatus, args.json)?;
            let screenshots = apparatus
                .history()
                .records()
                .iter()
                .any(|r| r.outcome.screenshot.is_some());
            finish_session(session, &args, screenshots);
        }

        Some(Commands::Examples) => {
            println!("{}", format_examples(usize::MAX));
        }

        Some(Commands::Screen) => {
            let mut backend = select_backend(&args, &config)?;
            let (width, height) = backend.screen_size()?;
            let (x, y) = backend.cursor_position()?;
            if args.json {
                let info = serde_json::json!({
                    "backend": backend.source_type(),
                    "width": width,
                    "height": height,
                    "cursor": [x, y],
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Screen size: {}x{} pixels", width, height);
                println!("  Cursor: ({}, {})", x, y);
                println!("  Backend: {}", backend.source_type());
            }
        }

        Some(Commands::Sessions { prune_hours }) => {
            let base_dir = &config.session.base_dir;
            if let Some(hours) = prune_hours {
                let max_age = Duration::from_secs(hours.saturating_mul(3600));
                let removed = cleanup_old_sessions(base_dir, max_age)?;
                if !args.json {
                    println!("Removed {} session(s) older than {}h", removed, hours);
                }
            }

            let mut listing = Vec::new();
            for dir in list_sessions(base_dir)? {
                // in_dir sessions are kept, so inspecting one never deletes it.
                let screenshots = Session::in_dir(&dir).list_screenshots()?.len();
                listing.push((dir, screenshots));
            }

            if args.json {
                let json: Vec<_> = listing
                    .iter()
                    .map(|(dir, screenshots)| {
                        serde_json::json!({ "dir": dir, "screenshots": screenshots })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else if listing.is_empty() {
                println!("No sessions under {}", base_dir);
            } else {
                for (dir, screenshots) in &listing {
                    println!("  {} ({} screenshots)", dir.display(), screenshots);
                }
            }
        }

        None => {
            println!("Intent Apparatus - natural-language desktop automation");
            println!();
            println!("Usage: intent-apparatus [OPTIONS] <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run       Interpret and execute one command");
            println!("  parse     Interpret a command without executing it");
            println!("  repl      Read commands from stdin, one per line");
            println!("  examples  List example commands");
            println!("  screen    Show the screen size reported by the backend");
            println!("  sessions  List kept screenshot sessions");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

/// Install a compact stderr subscriber; `RUST_LOG` wins over `default_level`
fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Command-line flags take precedence over the environment
fn apply_overrides(mut config: Config, args: &Args) -> Config {
    if args.screenshot_after_action {
        config.automation.screenshot_after_action = true;
    }
    if args.no_failsafe {
        config.automation.failsafe = false;
    }
    if let Some(count) = args.scroll_count {
        config.automation.default_scroll_count = count.max(1);
    }
    if let Some(pause_ms) = args.pause_ms {
        config.automation.pause_ms = pause_ms;
    }
    config
}

#[cfg(feature = "native")]
fn native_backend() -> Result<Option<Box<dyn InputBackend>>, Box<dyn Error>> {
    Ok(Some(Box::new(NativeBackend::new()?)))
}

#[cfg(not(feature = "native"))]
fn native_backend() -> Result<Option<Box<dyn InputBackend>>, Box<dyn Error>> {
    tracing::warn!("built without the `native` feature, falling back to the mock backend");
    Ok(None)
}

fn select_backend(args: &Args, config: &Config) -> Result<Box<dyn InputBackend>, Box<dyn Error>> {
    if !args.mock {
        if let Some(backend) = native_backend()? {
            return Ok(backend);
        }
    }
    Ok(Box::new(MockBackend::new(
        config.mock.screen_width,
        config.mock.screen_height,
    )))
}

/// Create session - if output specified, use that dir and keep by default
fn open_session(
    args: &Args,
    config: &Config,
    name: &str,
    backend: &mut dyn InputBackend,
) -> Result<Session, Box<dyn Error>> {
    let session = match &args.output {
        Some(dir) => Session::in_dir(dir),
        None => Session::with_name(&config.session.base_dir, name).keep(args.keep),
    };
    let screen_size = backend.screen_size().ok();
    let session = session.with_backend(backend.source_type(), screen_size);
    session.init()?;
    tracing::debug!(dir = %session.dir.display(), "session initialized");
    Ok(session)
}

fn build_apparatus(
    args: &Args,
    config: &Config,
    name: &str,
) -> Result<(Apparatus<Box<dyn InputBackend>>, Session), Box<dyn Error>> {
    let mut backend = select_backend(args, config)?;
    let session = open_session(args, config, name, backend.as_mut())?;
    let apparatus = Apparatus::from_config(backend, session.snapshot_config(), config);
    Ok((apparatus, session))
}

/// Keep session alive if needed (prevent Drop cleanup)
fn finish_session(session: Session, args: &Args, took_screenshots: bool) {
    if session.keep {
        if !args.json && took_screenshots {
            println!("\nSession: {}", session.dir.display());
        }
        std::mem::forget(session);
    } else if took_screenshots && !args.json {
        eprintln!("Screenshots were discarded; pass --keep or --output to preserve them.");
    }
}

fn print_submission(submission: &Submission, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string(submission)?);
        return Ok(());
    }

    let icon = if submission.result.success { "✅" } else { "❌" };
    println!("{} {}: {}", icon, submission.result.status(), submission.result.message);
    if let Some(path) = &submission.result.screenshot {
        println!("  Screenshot: {}", path.display());
    }
    Ok(())
}

fn repl(apparatus: &mut Apparatus<Box<dyn InputBackend>>, json: bool) -> Result<(), Box<dyn Error>> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    if !json {
        println!("Type a command, or: history, clear, examples, screen, quit");
    }

    loop {
        if !json {
            print!("> ");
            stdout.flush()?;
        }

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line.to_lowercase().as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "history" => println!("{}", apparatus.history().render(10)),
            "clear" => {
                apparatus.clear_history();
                println!("History cleared.");
            }
            "examples" | "help" => println!("{}", format_examples(usize::MAX)),
            "screen" => match apparatus.screen_info() {
                Ok(info) => println!("{}", info),
                Err(e) => println!("❌ {}", e),
            },
            _ => {
                let submission = apparatus.submit(line);
                print_submission(&submission, json)?;
            }
        }
    }

    Ok(())
}
