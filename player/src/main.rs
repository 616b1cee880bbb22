use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug, error, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use watch_core::WatchTimeObserver;

mod app;
mod commands;
mod config;
mod sim;
mod ui;

use app::App;

/// Track how far into a video you are, for YouTube, Vimeo and direct media links
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// URL to start tracking right away
    url: Option<String>,

    /// Settings file, defaults to the platform config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Position poll period in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Give up on a platform SDK after this many milliseconds
    #[arg(long)]
    sdk_timeout_ms: Option<u64>,

    /// Give up on a player that is not ready after this many milliseconds
    #[arg(long)]
    readiness_timeout_ms: Option<u64>,

    /// Length of the simulated videos in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Simulate a network where the SDK scripts never load
    #[arg(long)]
    offline: bool,

    /// More log output, repeat for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            let datetime = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            writeln!(
                buf,
                "[{} {} {}] {}",
                datetime,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn load_config(args: &Args) -> Result<config::PlayerConfig> {
    let mut config = config::load(args.config.as_deref())?;
    if let Some(ms) = args.poll_interval_ms {
        config.tracker.poll_interval_ms = ms;
    }
    if let Some(ms) = args.sdk_timeout_ms {
        config.tracker.sdk_load_timeout_ms = ms;
    }
    if let Some(ms) = args.readiness_timeout_ms {
        config.tracker.readiness_timeout_ms = ms;
    }
    if let Some(secs) = args.duration {
        config.simulation.duration_secs = secs;
    }
    if args.offline {
        config.simulation.offline = true;
    }
    config.simulation.validate()?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    info!("Application starting");

    let config = load_config(&args)?;
    debug!("Using {:?}", config);

    let backends = sim::backends(&config.simulation);
    let mut app = App::new(WatchTimeObserver::new(backends, config.tracker));
    let mut updates = app.observer.subscribe();
    let mut stdout = io::stdout();

    match &args.url {
        Some(url) => app.open_source(&mut stdout, url)?,
        None => ui::draw_prompt(&mut stdout)?,
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_done = false;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while !app.should_quit {
        tokio::select! {
            line = lines.next_line(), if !stdin_done => match line {
                Ok(Some(line)) => {
                    if let Err(e) = app.handle_input(&mut stdout, &line) {
                        ui::draw_error(&mut stdout, &format!("{:#}", e))?;
                    }
                }
                Ok(None) => {
                    debug!("Input closed, following the current source until interrupted");
                    stdin_done = true;
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    stdin_done = true;
                }
            },
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                app.on_snapshot(&mut stdout, &snapshot)?;
            }
            _ = &mut ctrl_c => {
                info!("Interrupted");
                app.should_quit = true;
            }
        }
    }

    info!("Shutting down application");
    app.shutdown();
    Ok(())
}
