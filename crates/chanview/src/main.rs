use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use chanview::app::App;
use chanview::config::Cli;
use chanview::fetch::Endpoints;
use chanview::fetch::Fetcher;
use chanview::fetch::FileFetcher;
use chanview::fetch::HttpFetcher;
use chanview::store::ImageBoard;
use chanview_core::crossterm_input::input_event_from_crossterm;
use chanview_core::view::ThreadViewOptions;
use clap::Parser;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::backend::CrosstermBackend;

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

fn init_logging(cli: &Cli) -> Result<()> {
    let path = cli.log_path();
    let file = File::create(&path).with_context(|| format!("create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let fetcher: Box<dyn Fetcher> = match &cli.offline {
        Some(dir) => Box::new(FileFetcher::new(dir)),
        None => Box::new(HttpFetcher::new(cli.timeout())?),
    };
    let store = ImageBoard::new(fetcher, Endpoints::new(cli.base_url.clone()));
    let mut app = App::new(
        store,
        ThreadViewOptions {
            overscroll: cli.overscroll_policy(),
            ..Default::default()
        },
    );
    tracing::info!(base = %cli.base_url, offline = cli.offline.is_some(), "starting");

    app.load_catalog().context("load board catalog")?;
    if let Some(board) = &cli.board
        && let Err(err) = app.select_board(board)
    {
        tracing::warn!(board = %board, error = %format!("{err:#}"), "cannot open startup board");
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    crossterm::execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let res = run(&mut terminal, &mut app);

    restore_terminal();
    terminal.show_cursor()?;
    if let Err(err) = &res {
        tracing::error!(error = %format!("{err:#}"), "exiting on error");
    }
    res
}

fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while !app.should_quit() {
        terminal.draw(|f| app.draw(f))?;

        if crossterm::event::poll(Duration::from_millis(100))?
            && let Some(ev) = input_event_from_crossterm(crossterm::event::read()?)
        {
            app.handle_event(ev);
        }
    }
    Ok(())
}
