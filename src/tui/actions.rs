// Named user actions and what applying them does to the app.

use std::path::PathBuf;

use crate::tui::input::TextInput;
use crate::tui::send::{begin_send, Outgoing};
use crate::tui::settings::{self, KeyValueStore, SaveOutcome};
use crate::tui::state::conversation::PendingFile;
use crate::tui::state::{App, Overlay};

#[derive(Debug)]
pub enum Action {
    Send,
    NewChat,
    OpenAttach,
    AttachPath(PathBuf),
    AttachFile(PendingFile),
    DetachFile,
    SelectModel(usize),
    SelectProvider(String),
    OpenSettings,
    SaveSettings(String),
    CloseOverlay,
    CopyLastReply,
    Quit,
}

/// Work the event loop has to carry out after an action was applied.
#[derive(Debug)]
pub enum Effect {
    None,
    Send(Outgoing),
    /// Settings changed: rebuild the client and the app against this base URL.
    Reload(String),
    LoadFile(PathBuf),
    Copy(String),
    Quit,
}

pub fn apply(app: &mut App, store: &mut dyn KeyValueStore, action: Action) -> Effect {
    match action {
        Action::Send => match begin_send(app) {
            Some(outgoing) => Effect::Send(outgoing),
            None => Effect::None,
        },
        Action::NewChat => {
            app.conversation.clear();
            app.usage_line.clear();
            app.scroll_to_bottom();
            app.status.clear();
            Effect::None
        }
        Action::OpenAttach => {
            if app.controls.upload_enabled {
                app.overlay = Some(Overlay::Attach(TextInput::new()));
            }
            Effect::None
        }
        Action::AttachPath(path) => {
            app.overlay = None;
            if path.as_os_str().is_empty() {
                return Effect::None;
            }
            Effect::LoadFile(path)
        }
        Action::AttachFile(file) => {
            app.status = format!("Attached {} ({} bytes)", file.name, file.bytes.len());
            app.conversation.pending_file = Some(file);
            Effect::None
        }
        Action::DetachFile => {
            if app.controls.upload_enabled {
                app.conversation.pending_file = None;
            }
            Effect::None
        }
        Action::SelectModel(index) => {
            app.select_model(index);
            Effect::None
        }
        Action::SelectProvider(name) => {
            app.select_provider(&name);
            Effect::None
        }
        Action::OpenSettings => {
            app.overlay = Some(Overlay::Settings(TextInput::with_value(&app.api_base)));
            Effect::None
        }
        Action::SaveSettings(value) => match settings::save(store, &value) {
            Ok(SaveOutcome::Reload) => {
                app.overlay = None;
                Effect::Reload(settings::normalize_base(&value))
            }
            Ok(SaveOutcome::Ignored) => Effect::None,
            Err(e) => {
                app.status = format!("Could not save settings: {e:#}");
                Effect::None
            }
        },
        Action::CloseOverlay => {
            app.overlay = None;
            Effect::None
        }
        Action::CopyLastReply => match app.conversation.last_assistant() {
            Some(msg) => Effect::Copy(msg.content.clone()),
            None => {
                app.status = "Nothing to copy yet".to_string();
                Effect::None
            }
        },
        Action::Quit => Effect::Quit,
    }
}

/// Reads a file chosen for upload.
pub async fn read_attachment(path: &std::path::Path) -> anyhow::Result<PendingFile> {
    use anyhow::Context;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(PendingFile::new(name, bytes))
}
