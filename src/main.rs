mod action;
mod app;
mod cms;
mod config;
mod error;
mod listing;
mod richtext;
mod tui;
mod types;
mod ui;

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::cms::{Cms, ContentSource};
use crate::config::{Config, SiteConfig};
use crate::error::BylineError;
use crate::tui::{Event, EventHandler};

/// Terminal reader for a blog hosted on a headless CMS.
#[derive(Debug, Parser)]
#[command(name = "byline", version, about)]
struct Cli {
    /// Content API root (overrides the config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Ref for reading unpublished content in preview mode
    #[arg(long)]
    preview_ref: Option<String>,

    /// Posts fetched per index page (overrides the config file)
    #[arg(long)]
    page_size: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let config = Config::load();

    let endpoint = cli.endpoint.or(config.api.endpoint).ok_or_else(|| {
        BylineError::Config(
            "no content API endpoint; set [api] endpoint in the config file or pass --endpoint"
                .to_string(),
        )
    })?;
    let token = config
        .api
        .token_env
        .as_ref()
        .and_then(|var| std::env::var(var).ok())
        .filter(|t| !t.is_empty());
    let page_size = cli.page_size.unwrap_or(config.api.page_size);
    let preview = cli
        .preview_ref
        .or_else(|| std::env::var("BYLINE_PREVIEW_REF").ok())
        .filter(|r| !r.is_empty());

    let source: Arc<dyn ContentSource> = Arc::new(Cms::new(endpoint, token, page_size));

    // Run the application
    let result = run(source, config.site, preview).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    source: Arc<dyn ContentSource>,
    site: SiteConfig,
    preview: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize terminal
    let mut terminal = tui::init()?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Create app state
    let mut app = App::new(source, site, preview, action_tx.clone());

    // Create event handler
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(render_rate);

    // Main loop
    loop {
        // Handle events and actions
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
