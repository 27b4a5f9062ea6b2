use crate::tui::api::{ApiClient, ApiError, ChatRequest, ChatResponse, CHAT_PATH, UPLOAD_PATH};
use crate::tui::state::conversation::{Message, PendingFile};
use crate::tui::state::{App, Controls};
use crate::tui::usage::usage_line;

pub const NO_RESPONSE: &str = "(No response)";

/// A request prepared by [`begin_send`], ready to go over the wire.
#[derive(Debug)]
pub enum Outgoing {
    Chat(ChatRequest),
    Upload {
        model: String,
        messages_json: String,
        file: PendingFile,
    },
}

impl Outgoing {
    pub fn is_upload(&self) -> bool {
        matches!(self, Outgoing::Upload { .. })
    }
}

/// Outcome of a dispatched request, handed back to the UI loop.
#[derive(Debug)]
pub struct SendOutcome {
    pub uploaded: bool,
    pub result: Result<ChatResponse, ApiError>,
}

/// Echoes the user's input into the conversation and enters the sending state.
///
/// Returns `None` without touching anything when a send is already running,
/// no model is selected, or there is neither text nor a pending file.
pub fn begin_send(app: &mut App) -> Option<Outgoing> {
    let conv = &app.conversation;
    if conv.sending {
        return None;
    }
    let model = conv.model.clone()?;
    let text = app.message_input.trimmed().to_string();
    if text.is_empty() && conv.pending_file.is_none() {
        return None;
    }

    if !text.is_empty() {
        app.conversation.push(Message::user(text));
    }
    let notice = app
        .conversation
        .pending_file
        .as_ref()
        .map(|file| Message::user(format!("📎 Attached file: {}", file.name)));
    if let Some(notice) = notice {
        app.conversation.push(notice);
    }
    app.message_input.clear();
    app.scroll_to_bottom();

    app.conversation.sending = true;
    app.controls = Controls::busy();

    let messages = app.conversation.messages.clone();
    let outgoing = match &app.conversation.pending_file {
        Some(file) => Outgoing::Upload {
            model,
            // a Vec of plain structs cannot fail to serialize
            messages_json: serde_json::to_string(&messages).unwrap_or_else(|_| "[]".into()),
            file: file.clone(),
        },
        None => Outgoing::Chat(ChatRequest::new(model, messages)),
    };
    tracing::info!(
        model = app.conversation.model.as_deref().unwrap_or_default(),
        messages = app.conversation.messages.len(),
        upload = outgoing.is_upload(),
        "sending chat request"
    );
    Some(outgoing)
}

/// Performs the single HTTP attempt for `outgoing`.
pub async fn dispatch(client: &ApiClient, outgoing: Outgoing) -> Result<ChatResponse, ApiError> {
    match outgoing {
        Outgoing::Chat(req) => client.post_json(CHAT_PATH, &req).await,
        Outgoing::Upload { model, messages_json, file } => {
            let fields = [("model", model), ("messages", messages_json)];
            client.post_multipart(UPLOAD_PATH, &fields, "file", &file).await
        }
    }
}

/// Runs [`dispatch`] on its own task. A panicking request still yields an outcome.
pub async fn dispatch_detached(client: ApiClient, outgoing: Outgoing) -> SendOutcome {
    let uploaded = outgoing.is_upload();
    let result = match tokio::spawn(async move { dispatch(&client, outgoing).await }).await {
        Ok(result) => result,
        Err(e) => Err(ApiError::Interrupted(e.to_string())),
    };
    SendOutcome { uploaded, result }
}

/// Records the reply (or the error) and leaves the sending state.
pub fn finish_send(app: &mut App, outcome: SendOutcome) {
    match outcome.result {
        Ok(resp) => {
            if outcome.uploaded {
                app.conversation.pending_file = None;
            }
            let content = resp
                .content
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| NO_RESPONSE.to_string());
            app.conversation.push(Message::assistant(content));
            app.usage_line = usage_line(&resp);
            tracing::info!(usage = %app.usage_line, "chat reply received");
        }
        Err(e) => {
            tracing::warn!(error = %e, "chat request failed");
            app.conversation.push(Message::assistant(format!("⚠️ Error: {e}")));
        }
    }
    app.scroll_to_bottom();

    app.conversation.sending = false;
    app.controls = Controls::idle();
}

/// Full send cycle on the caller's task. Returns false when the send was rejected.
pub async fn send_message(app: &mut App, client: &ApiClient) -> bool {
    let Some(outgoing) = begin_send(app) else {
        return false;
    };
    let outcome = dispatch_detached(client.clone(), outgoing).await;
    finish_send(app, outcome);
    true
}
