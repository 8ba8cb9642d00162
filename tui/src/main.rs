//! Judge TUI Entry Point
//!
//! Usage:
//!   judge-tui [OPTIONS]
//!
//! Options:
//!   -p, --port <PATH>     Serial device (default: /dev/ttyACM0)
//!   -b, --baud <N>        Baud rate (default: 9600)
//!   --simulate            Use the built-in simulated device
//!   --headless            Emit JSON lines instead of drawing
//!   --art <STYLE>         auto | sprites | shapes
//!
//! Every flag can also be set through its `JUDGE_*` environment variable.

use std::fs::File;
use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use court_core::transport::SimulatorConnector;
use court_core::{ConfigOverrides, DriverSignal, FrameDriver, JudgeConfig, Renderer};
use judge_tui::{input, select_artwork, ArtStyle, HeadlessRenderer, TerminalRenderer};

/// Courtroom judge simulator driven by a serial-attached microcontroller
#[derive(Parser, Debug)]
#[command(name = "judge-tui", version, about)]
struct Args {
    /// Serial device path
    #[arg(short, long, env = "JUDGE_PORT")]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, env = "JUDGE_BAUD")]
    baud: Option<u32>,

    /// Milliseconds between polls
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Upper bound on one poll, in milliseconds
    #[arg(long)]
    poll_budget_ms: Option<u64>,

    /// Timed-out polls in a row before giving up (0 = never)
    #[arg(long)]
    stall_limit: Option<u32>,

    /// Frame rate cap
    #[arg(long)]
    fps: Option<u32>,

    /// Use the simulated device instead of a serial port
    #[arg(long, env = "JUDGE_SIMULATE")]
    simulate: bool,

    /// Seed for the simulated device (random if unset)
    #[arg(long, requires = "simulate")]
    seed: Option<u64>,

    /// How to draw the scale and gavel
    #[arg(long, value_enum, default_value_t = ArtStyle::Auto)]
    art: ArtStyle,

    /// Directory holding scale.txt and hammer.txt
    #[arg(long, env = "JUDGE_ASSETS", default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/assets"))]
    assets: PathBuf,

    /// Emit JSON lines on stdout instead of drawing
    #[arg(long)]
    headless: bool,

    /// Write logs to this file (TUI mode discards logs otherwise)
    #[arg(long, env = "JUDGE_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. "info" or "court_core=debug"
    #[arg(long, env = "JUDGE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port.clone(),
            baud_rate: self.baud,
            poll_interval_ms: self.poll_interval_ms,
            poll_budget_ms: self.poll_budget_ms,
            stall_limit: self.stall_limit,
            fps: self.fps,
        }
    }
}

/// Route logs away from the alternate screen
fn init_logging(args: &Args) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&args.log_level)
        .with_context(|| format!("invalid log filter '{}'", args.log_level))?;

    let (writer, ansi) = match (&args.log_file, args.headless) {
        (Some(path), _) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        (None, true) => (BoxMakeWriter::new(io::stderr), true),
        (None, false) => (BoxMakeWriter::new(io::sink), false),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(writer),
        )
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let mut config = JudgeConfig::from_env();
    args.overrides().apply(&mut config);
    config.validate()?;
    info!(?config, simulate = args.simulate, headless = args.headless, "Starting");

    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(input::forward_ctrl_c(tx.clone()));

    let result = if args.headless {
        run_session(&args, config, HeadlessRenderer::new(io::stdout()), rx).await
    } else {
        run_tui(&args, config, tx, rx).await
    };

    if let Err(e) = &result {
        error!(error = %e, "Exiting with error");
    }
    result
}

async fn run_tui(
    args: &Args,
    config: JudgeConfig,
    tx: mpsc::Sender<DriverSignal>,
    rx: mpsc::Receiver<DriverSignal>,
) -> anyhow::Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: judge-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("Run it interactively, or pass --headless for JSON output.");
        std::process::exit(1);
    }

    let artwork = select_artwork(args.art, &args.assets)?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;

    let keys = tokio::spawn(input::forward_keys(tx));
    let result = run_session(args, config, TerminalRenderer::new(terminal, artwork), rx).await;
    keys.abort();

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;

    result
}

async fn run_session<R: Renderer>(
    args: &Args,
    config: JudgeConfig,
    renderer: R,
    rx: mpsc::Receiver<DriverSignal>,
) -> anyhow::Result<()> {
    let serial = config.serial.clone();
    let mut driver = FrameDriver::new(config, renderer, rx);

    if args.simulate {
        let connector = SimulatorConnector::new(args.seed, serial.line_timeout);
        driver.run(&connector).await?;
    } else {
        run_serial(&mut driver, &serial).await?;
    }

    info!(frames = driver.frames(), polls = driver.polls(), "Session ended");
    Ok(())
}

#[cfg(unix)]
async fn run_serial<R: Renderer>(
    driver: &mut FrameDriver<R>,
    serial: &court_core::SerialConfig,
) -> anyhow::Result<()> {
    driver.run(serial).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn run_serial<R: Renderer>(
    _driver: &mut FrameDriver<R>,
    _serial: &court_core::SerialConfig,
) -> anyhow::Result<()> {
    anyhow::bail!("serial ports are only supported on unix; use --simulate")
}
