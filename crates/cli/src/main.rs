//! mt - command-line client for Manta-style object storage

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;

use commands::ConnectionArgs;
use exit_code::ExitCode;
use output::OutputConfig;

/// Signed HTTP client for hierarchical object storage
#[derive(Parser, Debug)]
#[command(name = "mt", version, about, long_about = None)]
pub struct Cli {
    /// Output strict JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log requests and retries to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a directory
    Ls(commands::ls::LsArgs),

    /// Create a directory
    Mkdir(commands::mkdir::MkdirArgs),

    /// Remove an object or directory
    Rm(commands::rm::RmArgs),

    /// Download an object
    Get(commands::get::GetArgs),

    /// Upload a local file
    Put(commands::put::PutArgs),

    /// Show the metadata of an object or directory
    Info(commands::info::InfoArgs),

    /// Show or update the stored profile
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let code = commands::execute(cli.command, cli.connection, output_config).await;
    code.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["mt", "ls", "~~/stor", "--json", "--user", "bob"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.connection.user.as_deref(), Some("bob"));
        assert!(matches!(cli.command, Commands::Ls(_)));
    }

    #[test]
    fn test_config_set_takes_connection_flags() {
        let cli = Cli::try_parse_from(["mt", "config", "set", "--url", "https://m.example.com"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(commands::config::ConfigCommands::Set)
        ));
        assert_eq!(cli.connection.url.as_deref(), Some("https://m.example.com"));
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["mt"]).is_err());
    }
}
