//! learnslot CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use learnslot_core::init_tracing;
use tracing::debug;

use learnslot_client::cli::{Cli, Command, ConfigAction};
use learnslot_client::commands::{self, App};
use learnslot_client::config::ClientConfig;
use learnslot_client::error::{ClientError, ClientResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_config(&cli);

    let tracing_config = cli.tracing_config(config.as_ref().is_ok_and(|c| c.debug));
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
    .map_err(ClientError::Config)
}

async fn run(cli: Cli, config: ClientResult<ClientConfig>) -> ClientResult<()> {
    let config = config?;
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    debug!(config = %config_path.display(), "Configuration loaded");

    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path, &config),
        };
    }

    config.validate().map_err(ClientError::Config)?;
    let app = App::new(config, cli.store.clone(), cli.output_format())?;

    match cli.command {
        Command::Suggest { prefs } => commands::suggest::suggest(&app, &prefs).await,
        Command::Book { select, title, dry_run, prefs } => {
            commands::suggest::book(&app, &select, title.as_deref(), dry_run, &prefs).await
        }
        Command::Plan => commands::plan::plan(&app).await,
        Command::Add { title, start, end, calendar } => {
            commands::events::add(&app, &title, start, end, &calendar).await
        }
        Command::Reschedule { id, select, title, dry_run, prefs } => {
            commands::events::reschedule(&app, &id, select, title.as_deref(), dry_run, &prefs)
                .await
        }
        Command::Remove { id } => commands::events::remove(&app, &id).await,
        Command::Watch { prefs } => commands::plan::watch(&app, &prefs).await,
        Command::Config { .. } => Ok(()),
    }
}
