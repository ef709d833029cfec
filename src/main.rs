mod app;
mod config;
mod library;
mod logging;
mod player;
mod playlist;
mod runtime;
mod session;
mod store;
mod time_format;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
