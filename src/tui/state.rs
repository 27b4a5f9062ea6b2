pub mod conversation;

use ratatui::widgets::ListState;

use crate::tui::input::TextInput;
use crate::tui::providers::{select_provider_models, ModelDescriptor, Provider};
use conversation::Conversation;

pub const SEND_LABEL: &str = "Send";
pub const SENDING_LABEL: &str = "Sending…";
/// Shown in place of the model label when the provider has no models.
pub const NO_MODEL_LABEL: &str = "Model";

// ── Focus ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Message,
    ModelList,
    ProviderList,
    Conversation,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Message => Focus::ModelList,
            Focus::ModelList => Focus::ProviderList,
            Focus::ProviderList => Focus::Conversation,
            Focus::Conversation => Focus::Message,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Message => Focus::Conversation,
            Focus::ModelList => Focus::Message,
            Focus::ProviderList => Focus::ModelList,
            Focus::Conversation => Focus::ProviderList,
        }
    }
}

/// Modal editors drawn on top of the chat screen.
#[derive(Debug)]
pub enum Overlay {
    Settings(TextInput),
    Attach(TextInput),
}

/// Visible state of the send and attach buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Controls {
    pub send_enabled: bool,
    pub upload_enabled: bool,
    pub send_label: &'static str,
}

impl Controls {
    pub fn idle() -> Self {
        Self { send_enabled: true, upload_enabled: true, send_label: SEND_LABEL }
    }

    pub fn busy() -> Self {
        Self { send_enabled: false, upload_enabled: false, send_label: SENDING_LABEL }
    }
}

// ── App state ─────────────────────────────────────────────────────────────────

pub struct App {
    pub conversation: Conversation,
    /// Base URL the current API client talks to.
    pub api_base: String,
    pub focus: Focus,
    pub message_input: TextInput,
    pub provider_list_state: ListState,
    pub model_list_state: ListState,
    pub model_label: String,
    pub usage_line: String,
    pub controls: Controls,
    pub overlay: Option<Overlay>,
    pub status: String,
    pub chat_scroll: u16,
    pub chat_scroll_manual: bool,
    /// Last computed max scroll of the conversation panel, updated every draw.
    pub conv_max_scroll: u16,
}

impl App {
    pub fn new(provider: &str, api_base: &str) -> Self {
        let mut provider_list_state = ListState::default();
        provider_list_state.select(Provider::all().iter().position(|p| p.name() == provider));
        let mut app = App {
            conversation: Conversation::new(provider),
            api_base: api_base.to_string(),
            focus: Focus::Message,
            message_input: TextInput::new(),
            provider_list_state,
            model_list_state: ListState::default(),
            model_label: NO_MODEL_LABEL.to_string(),
            usage_line: String::new(),
            controls: Controls::idle(),
            overlay: None,
            status: String::new(),
            chat_scroll: 0,
            chat_scroll_manual: false,
            conv_max_scroll: 0,
        };
        app.init_model_selector();
        app
    }

    pub fn models(&self) -> &'static [ModelDescriptor] {
        select_provider_models(&self.conversation.provider)
    }

    /// Points the selector at the first catalog entry of the current provider.
    pub fn init_model_selector(&mut self) {
        let first = self.models().first();
        self.conversation.model = first.map(|m| m.id.to_string());
        self.model_label = first.map_or(NO_MODEL_LABEL, |m| m.label).to_string();
        self.model_list_state.select(first.map(|_| 0));
    }

    /// Makes catalog entry `index` the active model. Disabled or unknown entries are refused.
    pub fn select_model(&mut self, index: usize) -> bool {
        match self.models().get(index) {
            Some(m) if !m.disabled => {
                self.conversation.model = Some(m.id.to_string());
                self.model_label = m.label.to_string();
                self.model_list_state.select(Some(index));
                true
            }
            _ => false,
        }
    }

    pub fn select_provider(&mut self, name: &str) {
        self.conversation.provider = name.to_string();
        self.provider_list_state
            .select(Provider::all().iter().position(|p| p.name() == name));
        self.init_model_selector();
    }

    /// Nearest enabled model index from the current selection, moving by `step`.
    pub fn neighbour_model(&self, step: isize) -> Option<usize> {
        let models = self.models();
        let mut i = self.model_list_state.selected()? as isize;
        loop {
            i += step;
            if i < 0 || i as usize >= models.len() {
                return None;
            }
            if !models[i as usize].disabled {
                return Some(i as usize);
            }
        }
    }

    /// Jump back to the newest message.
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll_manual = false;
        self.chat_scroll = 0;
    }

    pub fn file_badge(&self) -> Option<String> {
        self.conversation
            .pending_file
            .as_ref()
            .map(|f| format!("File: {}", f.name))
    }
}
