use anyhow::Result;
use docsurface_config::Config;
use std::{env, io::stdout, path::PathBuf, process};

mod scenario;

use scenario::Scenario;

fn main() -> Result<()> {
    // Config is read before logging so its filter can take effect
    let config_path = Config::config_path();
    let (config, config_error) = match Config::load() {
        Ok(Some(config)) => (config, None),
        Ok(None) => (Config::default(), None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Initialize logging, RUST_LOG wins over the config file
    let mut logger = env_logger::Builder::new();
    logger.filter_level(log::LevelFilter::Info);
    if let Some(filter) = &config.log_filter {
        logger.parse_filters(filter);
    }
    logger.parse_default_env().init();

    log::info!("Config path: {}", config_path.display());
    if let Some(e) = config_error {
        log::warn!("Ignoring config file: {e}");
    }

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <scenario.toml>", args[0]);
        process::exit(1);
    }

    let scenario_path = config.resolve_scenario(&PathBuf::from(&args[1]));
    log::info!("Running scenario {}", scenario_path.display());

    let scenario = match Scenario::from_path(&scenario_path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    scenario::run(&scenario, config.surface, &mut stdout().lock())?;
    Ok(())
}
