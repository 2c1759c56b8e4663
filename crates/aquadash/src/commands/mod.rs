//! Command dispatch: routes parsed CLI commands to their handlers.

mod config_cmd;
mod control;
mod poll;
mod sites;
mod watch;

use std::sync::Arc;

use aquadash_config::Config;
use aquadash_core::{Dashboard, EngineConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, config: Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sites => sites::handle(&config, global),
        Command::Config(args) => config_cmd::handle(args, &config, global),
        Command::Watch(args) => watch::handle(args, config, global).await,
        Command::Poll(args) => poll::handle(args, config, global).await,
        Command::Control(args) => control::handle(args, config, global).await,
        Command::Completions(_) => Err(CliError::Internal(
            "completions are handled before dispatch".into(),
        )),
    }
}

/// Engine settings from `[polling]`, with `--timeout` applied.
fn engine_config(config: &Config, global: &GlobalOpts) -> EngineConfig {
    let mut engine = config.engine_config();
    if let Some(secs) = global.timeout {
        engine.timeout = std::time::Duration::from_secs(secs);
    }
    engine
}

/// Build the dashboard with `config` as its site catalog.
fn dashboard(config: Config, global: &GlobalOpts) -> Result<Dashboard, CliError> {
    let engine = engine_config(&config, global);
    Ok(Dashboard::new(engine, Arc::new(config))?)
}
