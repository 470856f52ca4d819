use color_eyre::Result;
use skysearch_tui::{
    api::{FlightApi, SkyScrapperClient},
    app::{Action, App},
    config::Config,
    events::{Event, EventHandler},
    logging,
    storage::Storage,
    terminal::{install_hooks, restore_terminal, setup_terminal},
    ui,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Config first: the log directory comes from it.
    let (config, notes) = Config::load();

    // Instrumentation and safety
    let _log_guard = logging::initialize_logging(&config.logging);
    for note in &notes {
        note.log();
    }
    install_hooks()?;

    let api: Arc<dyn FlightApi> = Arc::new(SkyScrapperClient::new(config.api.clone())?);

    // A broken storage file only costs persistence, not the session.
    let storage = match Storage::open(&config.storage.path) {
        Ok(storage) => Some(storage),
        Err(e) => {
            error!("Could not open {}: {}. Running without persistence.", config.storage.path, e);
            None
        }
    };

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut app = App::new(storage);
    let mut events = EventHandler::new(config.ui.tick_rate_ms);
    info!("Started with {} stored itineraries", app.store.results().len());

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        if let Some(event) = events.next().await {
            let action = match event {
                Event::Tick => {
                    app.on_tick();
                    None
                }
                Event::Input(key) => app.handle_key(key),
                Event::SearchFinished(result) => {
                    app.on_search_finished(result);
                    None
                }
                Event::AirportsLoaded { ticket, result } => {
                    app.on_airports_loaded(ticket, result);
                    None
                }
            };
            if let Some(action) = action {
                dispatch(action, api.clone(), events.tx.clone());
            }
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

/// Runs a request off the event loop and posts its outcome back.
fn dispatch(action: Action, api: Arc<dyn FlightApi>, tx: UnboundedSender<Event>) {
    tokio::spawn(async move {
        let event = match action {
            Action::Search(query) => Event::SearchFinished(api.search_flights(&query).await),
            Action::Lookup(ticket) => {
                let result = api.search_airport(&ticket.query).await;
                Event::AirportsLoaded { ticket, result }
            }
        };
        let _ = tx.send(event);
    });
}
