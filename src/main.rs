//! # Defensoría Bot CLI (`defbot`)
//!
//! The `defbot` binary runs the two HTTP services and offers a couple of
//! operational commands for poking at the record store without going
//! through the dialogue backend.
//!
//! ## Usage
//!
//! ```bash
//! defbot --config ./config/defbot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `defbot serve actions` | Start the action server for the dialogue backend |
//! | `defbot serve relay` | Start the chat relay for the browser widget |
//! | `defbot lookup <id>` | Run a case lookup directly and print the reply |
//! | `defbot store` | Show record store location, row count, and headers |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use defensoria_bot::config::load_config;
use defensoria_bot::lookup;
use defensoria_bot::store::CaseStore;
use defensoria_bot::{relay, server};

/// Top-level CLI definition.
#[derive(Parser)]
#[command(
    name = "defbot",
    about = "Defensoría Bot — action server and chat relay for the case-information bot",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). All settings have defaults, so
    /// a missing file only produces a warning.
    #[arg(long, global = true, default_value = "./config/defbot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start one of the HTTP services.
    Serve {
        #[command(subcommand)]
        service: ServeCommands,
    },

    /// Run a case lookup directly and print the resulting fragments.
    ///
    /// Useful for verifying a fresh record store export before pointing
    /// the backend at it.
    Lookup {
        /// Identification number, any formatting.
        identifier: String,
    },

    /// Show where the record store was loaded from and what it contains.
    Store,
}

#[derive(Subcommand)]
enum ServeCommands {
    /// Action server spoken by the dialogue backend.
    Actions,
    /// Chat relay spoken by the browser widget.
    Relay,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env).init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Serve {
            service: ServeCommands::Actions,
        } => server::run_action_server(&config).await,

        Commands::Serve {
            service: ServeCommands::Relay,
        } => relay::run_relay(&config).await,

        Commands::Lookup { identifier } => {
            let store = CaseStore::shared(config.store.path.as_deref());
            let reply = lookup::lookup(&store, &identifier);
            for fragment in &reply.fragments {
                println!("{}", fragment.text);
                for button in &fragment.buttons {
                    println!("  [{}] {}", button.title, button.payload);
                }
                println!();
            }
            println!("clear slot: {}", reply.clear_slot);
            Ok(())
        }

        Commands::Store => {
            let store = CaseStore::shared(config.store.path.as_deref());
            println!("path:    {}", store.path().display());
            println!("records: {}", store.len());
            if !store.is_empty() {
                println!("headers: {}", store.headers().join(", "));
            }
            Ok(())
        }
    }
}
