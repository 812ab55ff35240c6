use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use loan_calculator::{
    app::App,
    client::LoanClient,
    config::{AppConfig, ConfigOverrides},
    logging, ui,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{io, path::PathBuf, time::Duration};
use tracing::{error, info};

const TICK: Duration = Duration::from_millis(100);

/// Terminal form that sizes a loan through the remote calculation service
/// and explains the formula behind the returned amount.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Base URL of the calculation service (the form posts to `<url>/calculate-loan`).
    #[arg(long)]
    backend_url: Option<String>,

    /// File that receives log output.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `info,loan_calculator=trace`.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            backend_url: self.backend_url,
            log_file: self.log_file,
            log_level: self.log_level,
        }
    }
}

fn main() -> Result<()> {
    let config = AppConfig::load(Cli::parse().overrides())?;
    logging::init(&config.logging)?;
    info!(backend = %config.backend_url, "starting loan calculator");

    let runtime = tokio::runtime::Runtime::new()?;
    let client = LoanClient::new(config.backend_url.as_str());
    let app = App::new(client, runtime.handle().clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = ?err, "calculator exited with an error");
        println!("{:?}", err)
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        app.poll_completed();
        terminal.draw(|f| ui::draw(f, &app))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                info!("quitting");
                return Ok(());
            }
        }
    }
}
