pub mod logging;
pub mod tui;

pub use tui::{
    render_to_buffer, select_provider_models, usage_line, App, ApiClient, Message, PendingFile,
    Provider, Role,
};

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use tui::actions::read_attachment;
use tui::send::{begin_send, dispatch, finish_send, SendOutcome};
use tui::settings::{self, FileStore, KeyValueStore, MemoryStore, SaveOutcome};

/// Settings store at `config`, the platform default, or memory when neither exists.
pub fn open_store(config: Option<PathBuf>) -> Box<dyn KeyValueStore> {
    match config.map(FileStore::new).or_else(FileStore::default_location) {
        Some(store) => Box::new(store),
        None => Box::new(MemoryStore::default()),
    }
}

pub fn show_settings(store: &dyn KeyValueStore) -> Result<()> {
    println!("API base URL: {}", settings::load(store));
    Ok(())
}

pub fn set_api_base(store: &mut dyn KeyValueStore, url: &str) -> Result<()> {
    match settings::save(store, url)? {
        SaveOutcome::Reload => println!("API base URL set to {}", settings::load(store)),
        SaveOutcome::Ignored => println!("Empty URL ignored; settings unchanged."),
    }
    Ok(())
}

/// One line per catalog entry, disabled models marked.
pub fn format_models(provider: &str) -> String {
    select_provider_models(provider)
        .iter()
        .map(|m| {
            let mark = if m.disabled { "  (unavailable)" } else { "" };
            format!("{:<28} {}{mark}", m.id, m.label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn models(provider: &str) -> Result<()> {
    let listing = format_models(provider);
    if listing.is_empty() {
        bail!("No models known for provider \"{provider}\"");
    }
    println!("{listing}");
    Ok(())
}

/// Reply text and usage line of a one-shot send.
#[derive(Debug, PartialEq)]
pub struct Reply {
    pub content: String,
    pub usage: String,
}

/// Sends a single message outside the TUI, through the same send cycle.
pub async fn send_once(
    api_base: &str,
    provider: &str,
    model: Option<&str>,
    text: &str,
    file: Option<&Path>,
) -> Result<Reply> {
    let client = ApiClient::new(api_base);
    let mut app = App::new(provider, client.base());
    if let Some(id) = model {
        match app.models().iter().position(|m| m.id == id) {
            Some(index) if app.select_model(index) => {}
            _ => bail!("Model \"{id}\" is not an available {provider} model"),
        }
    }
    if let Some(path) = file {
        app.conversation.pending_file = Some(read_attachment(path).await?);
    }
    app.message_input = tui::TextInput::with_value(text);

    let Some(outgoing) = begin_send(&mut app) else {
        bail!("Nothing to send (empty message or no model selected)");
    };
    let uploaded = outgoing.is_upload();
    let result = dispatch(&client, outgoing).await;
    let failed = result.is_err();
    finish_send(&mut app, SendOutcome { uploaded, result });

    let content = app
        .conversation
        .last_assistant()
        .map(|m| m.content.clone())
        .unwrap_or_default();
    if failed {
        // the error bubble is the process error
        bail!(content);
    }
    Ok(Reply { content, usage: app.usage_line.clone() })
}
