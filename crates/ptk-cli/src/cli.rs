use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ptk", version, about = "Perception toolkit pipeline runner")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the camera, preprocessing and segmentation pipeline and run it.
    Run(RunArgs),
    /// Print the effective configuration as TOML.
    PrintConfig(ConfigArgs),
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Number of scheduler ticks; overrides `scheduler.ticks`.
    #[arg(long)]
    pub ticks: Option<u64>,
    /// Print the last task output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_run_args() {
        let args = CliArgs::try_parse_from([
            "ptk",
            "run",
            "--config",
            "pipeline.toml",
            "--ticks",
            "12",
            "--json",
        ])
        .unwrap();
        let Commands::Run(run) = args.command else {
            panic!("expected the run command");
        };
        assert_eq!(run.config.config, Some(PathBuf::from("pipeline.toml")));
        assert_eq!(run.ticks, Some(12));
        assert!(run.json);
    }

    #[test]
    fn run_defaults() {
        let args = CliArgs::try_parse_from(["ptk", "run"]).unwrap();
        let Commands::Run(run) = args.command else {
            panic!("expected the run command");
        };
        assert!(run.config.config.is_none());
        assert!(run.ticks.is_none());
        assert!(!run.json);
    }

    #[test]
    fn parses_print_config() {
        let args = CliArgs::try_parse_from(["ptk", "print-config"]).unwrap();
        assert!(matches!(args.command, Commands::PrintConfig(_)));
    }

    #[rstest]
    #[case::negative_ticks(&["ptk", "run", "--ticks", "-1"])]
    #[case::ticks_not_a_number(&["ptk", "run", "--ticks", "many"])]
    #[case::missing_command(&["ptk"])]
    #[case::unknown_command(&["ptk", "train"])]
    fn rejects_bad_arguments(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
