use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod app;
mod catalog;
mod cli;
mod config;
mod editor;
mod error;
mod models;
mod store;
mod tui;

use app::App;
use catalog::Catalog;
use cli::Command;
use config::Config;
use error::Result;
use store::SupabaseClient;
use tui::{draw, handle_key_event};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Only warnings and errors unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = cli::parse_args(&args)?;

    let config = Config::load().context("loading configuration")?;
    let catalog = build_catalog(&config).context("connecting to Supabase")?;

    if command != Command::Tui {
        return cli::run(command, &catalog, &mut io::stdout()).await;
    }

    let mut app = App::new(catalog).await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn build_catalog(config: &Config) -> Result<Catalog> {
    let (url, key) = config.credentials()?;
    let client = Arc::new(SupabaseClient::new(
        url,
        key.to_string(),
        config.storage_bucket.clone(),
    )?);
    Ok(Catalog::new(client.clone(), client).with_image_cache_seconds(config.image_cache_seconds))
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        app.tick_spinner();
        app.poll_save_result().await;

        // Poll with a timeout so background saves are picked up
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(key, app.input_mode()) {
                        if app.handle_action(action).await {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
