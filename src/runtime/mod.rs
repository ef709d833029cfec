use std::env;
use std::path::PathBuf;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::logging;
use crate::player::{MediaEvent, RodioElement};

mod event_loop;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    let _log_guard = match settings.log_dir() {
        Some(dir) => match logging::init(&dir, &settings.logging) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("mymusic: file logging disabled: {e}");
                None
            }
        },
        None => None,
    };

    let dir = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| {
        env::current_dir().unwrap_or_else(|_| PathBuf::from("Music"))
    });

    let mut app = startup::build_app(&settings, &dir);

    let (event_tx, event_rx) = mpsc::channel::<MediaEvent>();
    let mut media = RodioElement::spawn(event_tx);
    app.start(&mut media);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &mut media, &event_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.persist_prefs();
    media.shutdown();
    tracing::info!("shut down");

    run_result
}
