//! quickid - generate and inspect sortable IDs
//!
//! This is the command-line entry point. It wires together:
//! - Configuration loading (named generators, wait strategy)
//! - Generators on their own or a shared timebase
//! - ID parsing for inspection

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use quickid_config::{load_config, Settings, TimebaseSettings, DEFAULT_SLEEP_INTERVAL_MICROS};
use quickid_core::{parse_id, ParsedId, QuickId, TimestampSource};
use quickid_util::{
    default_config_path, format_millis, is_mock_time_active, WaitStrategy, MOCK_TIME_ENV_VAR,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// quickid - Monotonic, lexicographically sortable IDs
#[derive(Parser, Debug)]
#[command(name = "quickid")]
#[command(about = "Generate and inspect monotonic sortable IDs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate IDs, one per line
    Generate(GenerateArgs),

    /// Decode IDs into time, system tag, and sequence
    Parse(ParseArgs),

    /// Load a configuration file and summarize it
    CheckConfig {
        /// Configuration file path (default: ~/.config/quickid/config.toml)
        #[arg(short, long, default_value_os_t = default_config_path())]
        config: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
struct GenerateArgs {
    /// Configuration file path (or set QUICKID_CONFIG env var)
    #[arg(short, long, env = "QUICKID_CONFIG")]
    config: Option<PathBuf>,

    /// Configured generator to use (default: the first one)
    #[arg(short, long, conflicts_with = "all")]
    generator: Option<String>,

    /// System tag to embed; skips the configuration file
    #[arg(short, long, conflicts_with_all = ["generator", "all"])]
    tag: Option<String>,

    /// Number of IDs to generate (per generator with --all)
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Override the configured wait strategy
    #[arg(long, value_enum)]
    wait: Option<WaitArg>,

    /// Round-robin over every configured generator
    #[arg(long)]
    all: bool,

    /// Print one JSON object per line
    #[arg(long)]
    json: bool,
}

#[derive(ClapArgs, Debug)]
struct ParseArgs {
    /// IDs to decode
    #[arg(required = true)]
    ids: Vec<String>,

    /// Print one JSON object per line
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum WaitArg {
    Spin,
    Yield,
    Sleep,
}

impl WaitArg {
    fn apply(self, current: WaitStrategy) -> WaitStrategy {
        match (self, current) {
            (WaitArg::Spin, _) => WaitStrategy::Spin,
            (WaitArg::Yield, _) => WaitStrategy::Yield,
            (WaitArg::Sleep, WaitStrategy::Sleep { .. }) => current,
            (WaitArg::Sleep, _) => WaitStrategy::Sleep {
                interval_micros: DEFAULT_SLEEP_INTERVAL_MICROS,
            },
        }
    }
}

/// One generated or decoded ID
#[derive(Serialize)]
struct IdRecord<'a> {
    id: &'a str,
    #[serde(flatten)]
    parsed: &'a ParsedId,
}

fn write_record(out: &mut impl Write, id: &str, parsed: &ParsedId, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, &IdRecord { id, parsed })?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", id)?;
        writeln!(out, "  time: {} ({})", parsed.time, format_millis(parsed.time))?;
        writeln!(out, "  sys:  {:?}", parsed.sys)?;
        writeln!(out, "  seq:  {}", parsed.seq)?;
    }
    Ok(())
}

fn emit<T: TimestampSource>(ids: &mut QuickId<T>, out: &mut impl Write, json: bool) -> Result<()> {
    let id = ids.get_id();
    if json {
        let parsed = parse_id(&id)?;
        write_record(out, &id, &parsed, true)
    } else {
        writeln!(out, "{}", id)?;
        Ok(())
    }
}

fn emit_rounds<T: TimestampSource>(
    generators: &mut [QuickId<T>],
    count: usize,
    out: &mut impl Write,
    json: bool,
) -> Result<()> {
    for _ in 0..count {
        for ids in generators.iter_mut() {
            emit(ids, out, json)?;
        }
    }
    Ok(())
}

fn load_settings(path: Option<&PathBuf>) -> Result<(PathBuf, Settings)> {
    let path = path.cloned().unwrap_or_else(default_config_path);
    let settings = load_config(&path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;

    info!(
        config_path = %path.display(),
        generator_count = settings.generators.len(),
        "Configuration loaded"
    );

    Ok((path, settings))
}

fn run_generate(args: &GenerateArgs, out: &mut impl Write) -> Result<()> {
    if let Some(tag) = &args.tag {
        let wait = args
            .wait
            .map(|w| w.apply(WaitStrategy::default()))
            .unwrap_or_default();
        let timebase = TimebaseSettings { wait, shared: false };
        debug!(system_tag = %tag, strategy = wait.name(), "Generating from command-line tag");

        let mut ids = QuickId::with_timebase(timebase.build(), tag.as_str());
        return emit_rounds(std::slice::from_mut(&mut ids), args.count, out, args.json);
    }

    let (path, mut settings) = load_settings(args.config.as_ref())?;
    if let Some(wait) = args.wait {
        settings.timebase.wait = wait.apply(settings.timebase.wait);
    }

    if settings.generators.is_empty() {
        bail!(
            "No generators configured in {}; pass --tag or add a [[generators]] entry",
            path.display()
        );
    }

    if args.all {
        if settings.timebase.shared {
            let (_shared, mut generators) = settings.build_shared()?;
            return emit_rounds(&mut generators, args.count, out, args.json);
        }

        let mut generators = settings
            .generators
            .iter()
            .map(|g| g.build(&settings.timebase))
            .collect::<quickid_util::Result<Vec<_>>>()?;
        return emit_rounds(&mut generators, args.count, out, args.json);
    }

    let generator = match &args.generator {
        Some(name) => settings
            .generator(name)
            .with_context(|| format!("No generator named '{}' in {}", name, path.display()))?,
        None => &settings.generators[0],
    };
    debug!(generator = %generator.name, "Generating from configured generator");

    let mut ids = generator.build(&settings.timebase)?;
    emit_rounds(std::slice::from_mut(&mut ids), args.count, out, args.json)
}

/// Decode every ID, reporting failures on `err`. Returns the failure count.
fn run_parse(args: &ParseArgs, out: &mut impl Write, err: &mut impl Write) -> Result<usize> {
    let mut failures = 0;
    for id in &args.ids {
        match parse_id(id) {
            Ok(parsed) => write_record(out, id, &parsed, args.json)?,
            Err(e) => {
                writeln!(err, "{}", e)?;
                failures += 1;
            }
        }
    }
    Ok(failures)
}

/// Which clock IDs are stamped from
fn clock_description() -> String {
    if is_mock_time_active() {
        format!("mock ({})", MOCK_TIME_ENV_VAR)
    } else {
        "system".to_string()
    }
}

fn run_check_config(config: &PathBuf, out: &mut impl Write) -> Result<()> {
    let (path, settings) = load_settings(Some(config))?;

    writeln!(out, "Configuration: {}", path.display())?;
    writeln!(out, "  Wait strategy: {}", settings.timebase.wait.name())?;
    writeln!(out, "  Shared timebase: {}", settings.timebase.shared)?;
    writeln!(out, "  Clock: {}", clock_description())?;
    writeln!(out, "  Generators: {}", settings.generators.len())?;
    for generator in &settings.generators {
        writeln!(out, "    - {} (tag {:?})", generator.name, generator.system_tag)?;
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    if is_mock_time_active() {
        warn!(env_var = MOCK_TIME_ENV_VAR, "Mock time active, IDs are not stamped with the real clock");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &args.command {
        Command::Generate(generate) => {
            run_generate(generate, &mut out)?;
        }
        Command::Parse(parse) => {
            let failures = run_parse(parse, &mut out, &mut io::stderr())?;
            if failures > 0 {
                return Ok(ExitCode::from(1));
            }
        }
        Command::CheckConfig { config } => {
            run_check_config(config, &mut out)?;
        }
    }

    out.flush()?;
    Ok(ExitCode::SUCCESS)
}
