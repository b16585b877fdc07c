use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use typist::clipboard::read_clipboard_text;
use typist::config::TypistConfig;
use typist::hotkey::{key_for_char, HotkeyListener};
use typist::keyboard::find_first_unsupported_char;
use typist::mode::{ModeControl, RunMode};
use typist::model::{Action, Transcript, TranscriptConfig};
use typist::output::{self, ActionSink, OutputBackend, Recorder};
use typist::session::{Session, SessionStats};
use typist::sim;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputBackendArg {
    Auto,
    Wayland,
    X11,
}

impl OutputBackendArg {
    fn to_library(self) -> OutputBackend {
        match self {
            OutputBackendArg::Auto => OutputBackend::Auto,
            OutputBackendArg::Wayland => OutputBackend::Wayland,
            OutputBackendArg::X11 => OutputBackend::X11,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "typist")]
#[command(
    about = "Types the clipboard into the focused window with human-like rhythm and mistakes",
    long_about = None
)]
struct Cli {
    /// Output backend.
    ///
    /// - auto: choose a backend based on the runtime environment
    /// - wayland: force Wayland virtual keyboard
    /// - x11: force X11 (XTEST)
    #[arg(long, value_enum, default_value_t = OutputBackendArg::Auto)]
    backend: OutputBackendArg,

    /// Wayland seat name to attach the virtual keyboard to (e.g. seat0, seat1).
    #[arg(long, value_name = "NAME")]
    seat: Option<String>,

    /// Optional RNG seed (for debugging)
    #[arg(long)]
    seed: Option<u64>,

    /// Target typing speed in words per minute.
    #[arg(long, default_value_t = 120.0)]
    wpm: f64,

    /// Record the session instead of typing it and print the resulting text.
    #[arg(long)]
    dry_run: bool,

    /// Write every action performed to a JSON transcript.
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,

    /// Disable console typing trace output
    #[arg(long)]
    no_trace: bool,
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn write_output(path: &PathBuf, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn write_transcript(
    path: &PathBuf,
    cfg: &TypistConfig,
    text: &str,
    actions: &[Action],
) -> Result<()> {
    let transcript = Transcript {
        version: 1,
        config: TranscriptConfig {
            wpm: cfg.wpm,
            source_chars: text.chars().count(),
        },
        actions: actions.to_vec(),
    };
    let json =
        serde_json::to_string_pretty(&transcript).context("failed to serialize transcript")?;
    write_output(path, &json)
}

fn reject_untypable(text: &str) -> Result<()> {
    let Some((index, ch)) = find_first_unsupported_char(text) else {
        return Ok(());
    };

    let before = &text[..index];
    let line = before.matches('\n').count() + 1;
    let column = before.chars().rev().take_while(|c| *c != '\n').count() + 1;
    Err(anyhow!(
        "unsupported character {ch:?} (U+{:04X}) at line {line}, column {column}; \
         only US QWERTY characters can be typed",
        ch as u32
    ))
}

fn print_summary(stats: SessionStats, actions: &[Action]) {
    let counts = sim::stats(actions);
    eprintln!(
        "Typed: {} keys ({} backspaces), {} typos ({} fixed at once, {} fixed later, {} left in), ~{:.1} min",
        counts.chars + counts.backspaces,
        counts.backspaces,
        stats.typos,
        stats.fixed_immediately,
        stats.fixed_later,
        stats.left_uncorrected,
        (counts.total_wait_ms as f64) / 1000.0 / 60.0
    );
}

fn run_dry(cli: &Cli, cfg: TypistConfig, text: &str, control: Arc<ModeControl>) -> Result<()> {
    let mut session = Session::new(
        text,
        cfg.clone(),
        control,
        Recorder::dry(),
        rng_from_seed(cli.seed),
    )?
    .with_trace(!cli.no_trace);
    let stats = session.run()?;

    let actions = session.into_sink().into_actions();
    print_summary(stats, &actions);
    if let Some(path) = &cli.record {
        write_transcript(path, &cfg, text, &actions)?;
    }
    println!("{}", sim::simulate_visible_text(&actions));
    println!("Complete!");
    Ok(())
}

fn run_live(cli: &Cli, cfg: TypistConfig, text: &str, control: Arc<ModeControl>) -> Result<()> {
    let backend = cli.backend.to_library();
    let seat = cli.seat.as_deref();

    // Fail fast on unsupported environments/backends and text.
    output::preflight_backend(backend, seat)?;
    reject_untypable(text)?;

    let toggle = key_for_char(cfg.toggle_key)
        .ok_or_else(|| anyhow!("toggle key {:?} has no physical key", cfg.toggle_key))?;

    let sink: Box<dyn ActionSink> = output::open_sink(backend, seat, Arc::clone(&control))?;
    let listener = HotkeyListener::start(toggle, Arc::clone(&control))?;
    println!("Press {} to start/stop typing", cfg.toggle_key);

    let mut session = Session::new(
        text,
        cfg.clone(),
        control,
        Recorder::new(sink),
        rng_from_seed(cli.seed),
    )?
    .with_trace(!cli.no_trace);
    let result = session.run();
    listener.stop();
    let stats = result?;
    session.erase_toggle_keys()?;

    let actions = session.into_sink().into_actions();
    print_summary(stats, &actions);
    if let Some(path) = &cli.record {
        write_transcript(path, &cfg, text, &actions)?;
    }
    println!("Complete!");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let cfg = TypistConfig {
        wpm: cli.wpm,
        ..Default::default()
    };

    let Some(text) = read_clipboard_text() else {
        println!("No text in clipboard!");
        return Ok(());
    };

    println!("Loaded {} characters from clipboard", text.chars().count());
    println!("Speed: {} WPM", cfg.wpm);

    let control = Arc::new(if cli.dry_run {
        ModeControl::starting_in(RunMode::Typing)
    } else {
        ModeControl::new()
    });

    let ctrlc_control = Arc::clone(&control);
    ctrlc::set_handler(move || ctrlc_control.request_stop())
        .context("failed to install Ctrl-C handler")?;

    if cli.dry_run {
        run_dry(&cli, cfg, &text, control)
    } else {
        run_live(&cli, cfg, &text, control)
    }
}
