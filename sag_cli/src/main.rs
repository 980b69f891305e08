mod cli;
mod error_fmt;
mod logging;
mod meter;

use clap::Parser;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    // Pretty panics and reports; failure to install is not fatal.
    let _ = color_eyre::install();

    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        let code = exit_code_for_error(&e);
        tracing::error!(error = %e, code, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(code);
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = meter::load_config(&cli.config)?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| cfg.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    logging::init_tracing(cli.json, &level, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    let calibration = meter::resolve_calibration(&cfg, cli.calibration.as_deref())?;

    match cli.cmd {
        Commands::Run { duration_ms, stats } => {
            meter::run_meter(&cfg, calibration, duration_ms, stats, cli.json)
        }
        Commands::SelfCheck => meter::self_check(&cfg, &calibration, cli.json),
        Commands::Probe { samples } => meter::probe(&cfg, calibration, samples, cli.json),
    }
}
