use std::io::{BufRead, Write as _};
use std::process::ExitCode;
use std::sync::mpsc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use attune::capture::{CaptureProvider, CaptureSink};
use attune::speech::{SpeechRequest, SynthesisProvider, Voice, resolve_voice};
use attune::{Engine, EngineConfig, Locale, Result, UiEffect, normalize, reference_bindings};

/// Attune - multimodal voice interaction engine for accessible intake flows
#[derive(Parser)]
#[command(name = "attune", version, about)]
struct Cli {
    /// Session locale (en, fr, es)
    #[arg(short, long, env = "ATTUNE_LOCALE")]
    locale: Option<Locale>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive console: type utterances, watch the state machine react
    Console,
    /// Fold text the way the command router sees it
    Normalize {
        /// Text to normalize
        text: Vec<String>,
    },
    /// Show how synthesis voices resolve for each supported locale
    Voices,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,attune=info",
        1 => "info,attune=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Command::Normalize { text }) => {
            println!("{}", normalize(&text.join(" ")));
            Ok(())
        }
        Some(Command::Voices) => {
            voices(&ConsoleSynth);
            Ok(())
        }
        Some(Command::Console) | None => console(cli.locale),
    }
}

/// Print the voice each locale would resolve to on this provider
fn voices(provider: &dyn SynthesisProvider) {
    let available = provider.voices();
    if available.is_empty() {
        println!("no synthesis voices available; output uses the platform default voice");
    }
    for locale in Locale::ALL {
        match resolve_voice(&available, locale) {
            Some(voice) => println!("{locale}: {} ({})", voice.id, voice.lang),
            None => println!(
                "{locale}: platform default (preferred: {})",
                locale.voice_preferences().join(", ")
            ),
        }
    }
}

/// Console capture: unsupported on a terminal, utterances arrive typed
struct ConsoleCapture;

impl CaptureProvider for ConsoleCapture {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self, _lang_tag: &str, _sink: CaptureSink) -> Result<()> {
        Err(attune::Error::CaptureUnsupported)
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Console synthesis: prints what would be spoken
struct ConsoleSynth;

impl SynthesisProvider for ConsoleSynth {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&mut self, request: &SpeechRequest) -> Result<()> {
        println!("[speaks] {}", request.text);
        Ok(())
    }

    fn cancel_all(&mut self) {}

    fn on_voices_available(&mut self, _listener: Box<dyn FnOnce() + Send>) {}
}

fn console(locale: Option<Locale>) -> anyhow::Result<()> {
    let mut config = EngineConfig::from_env()?;
    if let Some(locale) = locale {
        config.locale = locale;
    }

    let engine = Engine::new(&config, Box::new(ConsoleCapture), Box::new(ConsoleSynth));
    let state = engine.state();
    let (effects_tx, effects_rx) = mpsc::channel();
    engine.register_bindings(reference_bindings(&state, &engine.speech(), &effects_tx));

    println!("attune console - type an utterance, :state, or :quit");
    let stdin = std::io::stdin();
    loop {
        print!("{}> ", state.locale());
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "" => {}
            ":quit" | ":q" => break,
            ":state" => println!("{}", serde_json::to_string_pretty(&state.snapshot())?),
            ":clear" => state.clear_transcript(),
            _ => {
                let matched = engine.route(line);
                println!("matched {matched} binding(s)");
                while let Ok(effect) = effects_rx.try_recv() {
                    match effect {
                        UiEffect::ScrollUp => println!("[ui] scroll up"),
                        UiEffect::ScrollDown => println!("[ui] scroll down"),
                        UiEffect::FontScale(scale) => println!("[ui] font scale {scale}"),
                    }
                }
            }
        }
    }

    engine.stop_speaking();
    Ok(())
}
