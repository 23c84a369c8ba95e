use resto_core::config::non_blank;
use resto_core::ClientConfig;

use crate::cli::ConfigCommands;
use crate::commands::common::Session;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, session: &Session) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_config_show(session),
        ConfigCommands::Init {
            api_url,
            app_origin,
            probe_timeout_ms,
            force,
        } => run_config_init(session, api_url, app_origin, probe_timeout_ms, force),
    }
}

pub fn run_config_show(session: &Session) -> Result<(), CliError> {
    println!("# {}", session.config_path.display());
    println!("{}", serde_json::to_string_pretty(&session.config)?);
    Ok(())
}

pub fn run_config_init(
    session: &Session,
    api_url: Option<String>,
    app_origin: Option<String>,
    probe_timeout_ms: Option<u64>,
    force: bool,
) -> Result<(), CliError> {
    let path = &session.config_path;
    if path.exists() && !force {
        return Err(CliError::ConfigExists(path.display().to_string()));
    }

    let config = build_config(api_url, app_origin, probe_timeout_ms);
    config.save_to_path(path)?;
    println!("Wrote {}", path.display());
    println!("  api_base_url: {}", config.api_base_url);
    println!("  app_origin:   {}", config.app_origin);
    Ok(())
}

pub fn build_config(
    api_url: Option<String>,
    app_origin: Option<String>,
    probe_timeout_ms: Option<u64>,
) -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Some(url) = non_blank(api_url) {
        config.api_base_url = url;
    }
    if let Some(origin) = non_blank(app_origin) {
        config.app_origin = origin;
    }
    if let Some(timeout) = probe_timeout_ms {
        config.probe_timeout_ms = timeout;
    }
    config
}
