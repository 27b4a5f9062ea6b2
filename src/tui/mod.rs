pub mod actions;
pub mod api;
pub mod draw;
pub mod events;
pub mod input;
pub mod markdown;
pub mod providers;
pub mod send;
pub mod settings;
pub mod state;
pub mod usage;

pub use actions::{apply, Action, Effect};
pub use api::{ApiClient, ApiError, ChatResponse};
pub use draw::{message_lines, render_to_buffer};
pub use events::{key_action, run, RunOptions};
pub use input::{handle_text_input_key, TextInput};
pub use providers::{select_provider_models, ModelDescriptor, Provider};
pub use send::{begin_send, finish_send, send_message};
pub use settings::{FileStore, KeyValueStore, MemoryStore, SaveOutcome};
pub use state::conversation::{Message, PendingFile, Role};
pub use state::{App, Controls, Focus, Overlay};
pub use usage::usage_line;
