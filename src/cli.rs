//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Datatables bridge - routes AJAX table requests to module transformers
#[derive(Parser, Debug)]
#[command(name = "datatables-bridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "DATATABLES_BRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "DATATABLES_BRIDGE_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "DATATABLES_BRIDGE_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "DATATABLES_BRIDGE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "DATATABLES_BRIDGE_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the server (default)
    Serve,

    /// Print the type name a module/transformer pair resolves to
    Resolve {
        /// Module route parameter
        module: String,
        /// Transformer route parameter
        transformer: String,
    },

    /// Load the configuration and list registered transformers
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["datatables-bridge"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_resolve_subcommand() {
        let cli =
            Cli::try_parse_from(["datatables-bridge", "resolve", "my_blog", "post_list"]).unwrap();
        match cli.command {
            Some(Command::Resolve { module, transformer }) => {
                assert_eq!(module, "my_blog");
                assert_eq!(transformer, "post_list");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
