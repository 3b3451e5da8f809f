//! Simulated Chatroom
//!
//! Runs a chat room session on the console. Human lines come from a script
//! file, from stdin in real time, or not at all.

use clap::Parser;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use chat_core::{
    ChatEngine, ConsoleSink, EngineConfig, EngineError, FanoutSink, JsonlSink, MessageTemplates,
};
use chat_events::{ParseTimeError, SimTime};

/// Command line arguments for the chat room
#[derive(Parser, Debug)]
#[command(name = "chatroom")]
#[command(about = "A simulated chat room full of bots")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Session length in simulated seconds
    #[arg(long, default_value_t = 300)]
    seconds: u64,

    /// Tuning file (TOML); defaults are used when absent
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Message template file (TOML)
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Append every session event to this JSONL file
    #[arg(long)]
    events_out: Option<PathBuf>,

    /// Human lines to replay, one `<seconds> <text>` per line
    #[arg(long, conflicts_with = "interactive")]
    script: Option<PathBuf>,

    /// Read human lines from stdin and run in real time
    #[arg(long)]
    interactive: bool,

    /// Print the effective tuning as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

/// Errors reading a human script.
#[derive(Debug, thiserror::Error)]
enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected `<seconds> <text>`")]
    MissingText { line: usize },
    #[error("line {line}: {source}")]
    Time {
        line: usize,
        #[source]
        source: ParseTimeError,
    },
}

/// One scripted human line
#[derive(Debug, Clone, PartialEq)]
struct ScriptLine {
    at: SimTime,
    text: String,
}

/// Parses a script. Blank lines and `#` comments are skipped; lines are
/// replayed in time order.
fn parse_script(content: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    let mut lines = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let (time, text) = raw
            .split_once(char::is_whitespace)
            .ok_or(ScriptError::MissingText { line })?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ScriptError::MissingText { line });
        }
        let at = time
            .parse::<SimTime>()
            .map_err(|source| ScriptError::Time { line, source })?;
        lines.push(ScriptLine {
            at,
            text: text.to_string(),
        });
    }
    lines.sort_by_key(|l| l.at);
    Ok(lines)
}

fn load_script(path: &Path) -> Result<Vec<ScriptLine>, ScriptError> {
    parse_script(&std::fs::read_to_string(path)?)
}

fn load_config(args: &Args) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    Ok(match &args.tuning {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    })
}

fn load_templates(args: &Args) -> Result<MessageTemplates, Box<dyn std::error::Error>> {
    Ok(match &args.templates {
        Some(path) => MessageTemplates::from_file(path)?,
        None => MessageTemplates::default(),
    })
}

fn submit(engine: &mut ChatEngine, text: &str) {
    match engine.submit_human_message(text) {
        Ok(_) => {}
        Err(EngineError::EmptyMessage) => {}
        Err(e) => tracing::warn!("Could not post human line: {}", e),
    }
}

/// Replays the script against simulated time, then runs out the clock.
fn run_batch(engine: &mut ChatEngine, script: &[ScriptLine], end: SimTime) {
    for line in script {
        if line.at > end {
            tracing::warn!("Script line at {} is past the end of the session", line.at);
            break;
        }
        engine.advance_to(line.at);
        submit(engine, &line.text);
    }
    engine.advance_to(end);
}

/// Advances the engine with the wall clock while stdin feeds human lines.
/// Ends on EOF, `/quit`, or when the session length is reached.
fn run_interactive(engine: &mut ChatEngine, end: SimTime) {
    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let frame = Duration::from_millis(100);
    let mut last = Instant::now();
    while engine.now() < end {
        std::thread::sleep(frame);
        let elapsed = last.elapsed().as_millis() as u64;
        last = Instant::now();
        engine.advance_by(elapsed);

        loop {
            match rx.try_recv() {
                Ok(line) if line.trim() == "/quit" => return,
                Ok(line) => submit(engine, &line),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return,
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }
    let templates = load_templates(&args)?;
    let script = match &args.script {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };

    println!("Simulated Chatroom");
    println!("==================");
    println!("Seed: {}", args.seed);
    println!("Length: {}s", args.seconds);
    if !script.is_empty() {
        println!("Script: {} human lines", script.len());
    }
    println!();

    let mut sink = FanoutSink::new().with(ConsoleSink::stdout().with_roster(true));
    if let Some(path) = &args.events_out {
        sink.push(Box::new(JsonlSink::new(path)?));
        tracing::info!("Writing events to {}", path.display());
    }

    let mut engine = ChatEngine::new(config, templates, args.seed, sink)?;
    engine.add_human()?;
    engine.start();

    let end = SimTime::from_secs(args.seconds);
    if args.interactive {
        run_interactive(&mut engine, end);
    } else {
        run_batch(&mut engine, &script, end);
    }
    engine.stop();

    println!();
    println!("Session ended at {}", engine.now());
    println!("{}", engine.stats());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = "# warmup\n\n12 hello everyone\n3.5 first\n1:05   later on  \n";
        let lines = parse_script(script).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].at, SimTime::from_millis(3_500));
        assert_eq!(lines[0].text, "first");
        assert_eq!(lines[1].text, "hello everyone");
        assert_eq!(lines[2].at, SimTime::from_secs(65));
        assert_eq!(lines[2].text, "later on");
    }

    #[test]
    fn test_parse_script_errors() {
        assert!(matches!(parse_script("12"), Err(ScriptError::MissingText { line: 1 })));
        assert!(matches!(
            parse_script("\nsoon hello"),
            Err(ScriptError::Time { line: 2, .. })
        ));
    }

    #[test]
    fn test_batch_run_reaches_end() {
        let mut engine = ChatEngine::with_defaults(7, chat_core::NullSink).unwrap();
        engine.add_human().unwrap();
        engine.start();
        let script = parse_script("2 hi all\n10 anyone there?").unwrap();
        run_batch(&mut engine, &script, SimTime::from_secs(30));
        assert_eq!(engine.now(), SimTime::from_secs(30));
        assert_eq!(engine.stats().ticks, 30);
    }
}
