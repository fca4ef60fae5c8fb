//! `ptk`: runs the synthetic perception pipeline from a TOML configuration.
mod cli;
mod config;
mod demo;

use clap::Parser;
use cli::{CliArgs, Commands, ConfigArgs, RunArgs};
use config::AppConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    match args.command {
        Commands::Run(run_args) => run(run_args),
        Commands::PrintConfig(config_args) => print_config(config_args),
    }
}

fn load_config(args: &ConfigArgs) -> anyhow::Result<AppConfig> {
    let config = AppConfig::load_or_default(args.config.as_deref())?;
    if let Some(path) = &args.config {
        log::debug!("Loaded configuration from {}", path.display());
    }
    Ok(config)
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;
    let ticks = args.ticks.unwrap_or(config.scheduler.ticks);

    let report = demo::run_demo(config, ticks)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        log::info!("Ran {} ticks", report.ticks);
        log::info!("{}", report.last_output.summary());
    }
    Ok(())
}

fn print_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    print!("{}", config.to_toml()?);
    Ok(())
}
