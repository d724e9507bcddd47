//! Binary entry point: load settings, start logging, open the catalog and hand
//! the application context to the Ratatui event loop.
use book_catalog::{logging, open_catalog, run_app, App, Settings};

fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    logging::init(&settings)?;

    let conn = open_catalog(&settings.database_path)?;
    let mut app = App::new(conn, settings)?;
    run_app(&mut app)
}
