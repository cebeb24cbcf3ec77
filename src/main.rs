mod aggregator;
mod catalog;
mod cli;
mod error;
mod exporter;
mod fmt;
mod header;
mod importer;
mod models;
mod policy;
mod settings;
mod tax;
mod vendor;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{CatalogCommands, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let filter = if cli.trace { "warn,diot=info" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let result = match cli.command {
        Commands::Init {
            catalog,
            export_dir,
        } => cli::init::run(catalog, export_dir),
        Commands::Process(args) => cli::process::run(args, cli.trace),
        Commands::Catalog { catalog, command } => match command {
            CatalogCommands::List => cli::catalog::list(catalog.as_deref()),
            CatalogCommands::Add {
                rfc,
                name,
                alias,
                third_party,
                operation,
            } => cli::catalog::add(
                catalog.as_deref(),
                &rfc,
                name.as_deref(),
                alias.as_deref(),
                third_party.as_deref(),
                operation.as_deref(),
            ),
            CatalogCommands::Find { name, rfc } => {
                cli::catalog::find(catalog.as_deref(), name.as_deref(), rfc.as_deref())
            }
        },
        Commands::Status => cli::status::run(),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "diot", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
