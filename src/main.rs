use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use paraphrat::clipboard::SystemClipboard;
use paraphrat::event_source::KeyboardEventSource;
use paraphrat::panic_handler;
use paraphrat::service::HttpParaphraseService;
use paraphrat::settings;
use paraphrat::{App, run_app_with_event_source};

#[derive(Parser, Debug)]
#[command(version, about = "Terminal editor with AI paraphrasing", long_about = None)]
struct Args {
    /// Root URL of the paraphrasing service (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Path to the settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the log
    #[arg(long, default_value = "paraphrat.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("Failed to create log file {:?}", args.log_file))?,
    )?;

    panic_handler::initialize_panic_handler();

    info!("Starting paraphrat");

    let settings = settings::load_settings(args.config.as_deref()).with_base_url(args.base_url);
    info!("Using paraphrase service at {}", settings.base_url());
    let service = HttpParaphraseService::new(settings.base_url())
        .context("Failed to build HTTP client")?;

    let mut app = App::new(Arc::new(service), Box::new(SystemClipboard));
    app.set_theme(&settings.theme);

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_source = KeyboardEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down paraphrat");
    Ok(())
}
