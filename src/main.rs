use mia_chat::{models, open_store, send_once, set_api_base, show_settings};
use mia_chat::logging::init_tracing;
use mia_chat::tui::RunOptions;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mia-chat", version, about = "Terminal client for the middleware chat API")]
struct Cli {
    /// Model provider whose catalog is offered
    #[arg(long, default_value = "openai")]
    provider: String,
    /// Use this API base URL for this run without saving it
    #[arg(long)]
    api_base: Option<String>,
    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Skip the TUI and run a subcommand directly
    #[arg(long)]
    no_tui: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the saved API base URL
    Settings,
    /// Save a new API base URL
    SetApiBase {
        url: String,
    },
    /// List the provider's models
    Models,
    /// Send one message and print the reply
    Send {
        /// Message text
        #[arg(default_value = "")]
        text: String,
        /// File to upload with the message
        #[arg(long)]
        file: Option<PathBuf>,
        /// Model id, defaults to the provider's first model
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(None);
    let mut store = open_store(cli.config);

    if cli.no_tui || cli.command.is_some() {
        match cli.command {
            Some(Commands::Settings) => show_settings(store.as_ref()),
            Some(Commands::SetApiBase { url }) => set_api_base(store.as_mut(), &url),
            Some(Commands::Models) => models(&cli.provider),
            Some(Commands::Send { text, file, model }) => {
                let options = RunOptions { store, provider: cli.provider, api_base_override: cli.api_base };
                let reply = send_once(
                    &options.api_base(),
                    &options.provider,
                    model.as_deref(),
                    &text,
                    file.as_deref(),
                )
                .await?;
                println!("{}", reply.content);
                if !reply.usage.is_empty() {
                    println!("\n{}", reply.usage);
                }
                Ok(())
            }
            None => {
                eprintln!("No subcommand given. Run without --no-tui to launch the TUI.");
                Ok(())
            }
        }
    } else {
        mia_chat::tui::run(RunOptions {
            store,
            provider: cli.provider,
            api_base_override: cli.api_base,
        })
        .await
    }
}
