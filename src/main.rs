//! Datatables Bridge - AJAX datatables endpoint for module transformers

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use datatables_bridge::{
    catalog::Catalog,
    cli::{Cli, Command},
    config::Config,
    gateway::Gateway,
    module::ModuleRegistry,
    resolver::NameResolver,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let mut cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command.take() {
        Some(Command::Resolve {
            module,
            transformer,
        }) => run_resolve(&cli, &module, &transformer),
        Some(Command::Check) => run_check(&cli),
        Some(Command::Serve) | None => run_server(cli).await,
    }
}

/// Load configuration and apply CLI overrides
fn load_config(cli: &Cli) -> Option<Config> {
    match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref host) = cli.host {
                config.server.host = host.clone();
            }
            Some(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            None
        }
    }
}

/// Print the resolved type name
fn run_resolve(cli: &Cli, module: &str, transformer: &str) -> ExitCode {
    let Some(config) = load_config(cli) else {
        return ExitCode::FAILURE;
    };

    let resolver = NameResolver::new(config.resolver);
    println!("{}", resolver.type_name(module, transformer));
    ExitCode::SUCCESS
}

/// Load the catalog and list what it registered
fn run_check(cli: &Cli) -> ExitCode {
    let Some(config) = load_config(cli) else {
        return ExitCode::FAILURE;
    };

    let catalog = match Catalog::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let modules = catalog.modules.all();
    if modules.is_empty() {
        println!("No modules configured.");
        return ExitCode::SUCCESS;
    }

    println!("Found {} module(s):\n", modules.len());
    for module in &modules {
        let state = if module.is_enabled() { "enabled" } else { "disabled" };
        println!("📦 {} ({state})", module.name);
    }

    println!("\nTransformers:");
    for name in catalog.types.transformer_names() {
        let rows = catalog.datasets.get(&name).len();
        println!("  ✅ {name} ({rows} rows)");
    }

    ExitCode::SUCCESS
}

/// Run the HTTP server
async fn run_server(cli: Cli) -> ExitCode {
    let Some(config) = load_config(&cli) else {
        return ExitCode::FAILURE;
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        modules = config.modules.len(),
        "Starting datatables bridge"
    );

    let gateway = match Gateway::new(config) {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to create gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = gateway.run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}
