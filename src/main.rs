use eavpot::persist::Persistor;
use eavpot::query::Query;
use eavpot::settings::Settings;
use eavpot::Result;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_new(format!("eavpot={}", settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn run(settings: &Settings) -> Result<()> {
    let mut store = Persistor::from_settings(settings)?;
    info!(
        database = settings.database.as_deref().unwrap_or(":memory:"),
        prefix = %settings.prefix,
        "store opened"
    );
    let everything = Query::new();
    for pot in &settings.pots {
        store.prepare_pot(pot)?;
        let entities = store.count(pot, &everything)?;
        info!(pot = %pot, entities, "pot ready");
    }
    Ok(())
}

fn main() {
    let name = std::env::args().nth(1).unwrap_or_else(|| "eavpot".to_string());
    let settings = match Settings::load(&name) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    init_logging(&settings);
    if let Err(e) = run(&settings) {
        error!(%e, "bootstrap failed");
        std::process::exit(1);
    }
}
